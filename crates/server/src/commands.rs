//! Command router
//!
//! Interprets chat text: slash-commands act on the bridge, anything else
//! is typed into the selected pane. Authorization happens before this
//! module is reached (see `webhook`).

use chatpane_protocol::{BotCommand, InlineKeyboardButton};
use tracing::{info, warn};

use crate::error::BridgeError;
use crate::state::Bridge;
use crate::telegram::{reply, reply_with, Keyboard, ParseMode};

/// Bot menu entries, also used for `/help`.
const MENU: &[(&str, &str)] = &[
    ("panes", "List WezTerm panes"),
    ("setpane", "Select the target pane: /setpane <id>"),
    ("status", "Show bridge status"),
    ("stop", "Interrupt Claude (sends Esc)"),
    ("clear", "Clear Claude's conversation"),
    ("resume", "Resume a previous Claude session"),
    ("mute", "Stop relaying Claude's replies"),
    ("unmute", "Resume relaying Claude's replies"),
    ("refresh", "Refresh this command menu"),
    ("help", "Show help"),
];

/// Assistant commands that open interactive pickers in the terminal and
/// cannot be driven from chat.
const BLOCKED_COMMANDS: &[&str] = &[
    "model",
    "config",
    "mcp",
    "permissions",
    "agents",
    "login",
    "logout",
    "hooks",
    "memory",
    "ide",
    "vim",
    "theme",
    "terminal-setup",
    "install-github-app",
    "add-dir",
    "doctor",
    "export",
    "bashes",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Panes,
    SetPane(Option<String>),
    Status,
    Stop,
    Clear,
    Resume,
    Mute,
    Unmute,
    Refresh,
    Blocked(String),
    Unknown(String),
}

impl Command {
    /// Parse a slash-command. Returns `None` for free text.
    pub fn parse(text: &str) -> Option<Command> {
        let rest = text.trim().strip_prefix('/')?;
        let (word, args) = match rest.split_once(char::is_whitespace) {
            Some((w, a)) => (w, a.trim()),
            None => (rest, ""),
        };
        // Group chats append the bot name: /status@my_bot
        let name = word.split('@').next().unwrap_or_default().to_lowercase();
        let arg = (!args.is_empty()).then(|| args.to_string());

        Some(match name.as_str() {
            "start" | "help" => Command::Help,
            "panes" => Command::Panes,
            "setpane" => Command::SetPane(arg),
            "status" => Command::Status,
            "stop" => Command::Stop,
            "clear" => Command::Clear,
            "resume" => Command::Resume,
            "mute" => Command::Mute,
            "unmute" => Command::Unmute,
            "refresh" => Command::Refresh,
            _ if is_blocked(&name) => Command::Blocked(name),
            _ => Command::Unknown(name),
        })
    }
}

fn is_blocked(name: &str) -> bool {
    BLOCKED_COMMANDS.iter().any(|b| name.starts_with(b))
}

/// A bare word like `model` is treated as a blocked command typed
/// without its slash.
fn is_blocked_free_text(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.contains(char::is_whitespace)
        && BLOCKED_COMMANDS.contains(&trimmed.to_lowercase().as_str())
}

pub fn bot_commands() -> Vec<BotCommand> {
    MENU.iter()
        .map(|(command, description)| BotCommand::new(command, description))
        .collect()
}

pub fn help_text() -> String {
    let mut out = String::from(
        "🤖 chatpane: Telegram ↔ Claude Code\n\nSend any text to type it into the selected WezTerm pane.\n\n",
    );
    for (command, description) in MENU {
        out.push_str(&format!("/{command} – {description}\n"));
    }
    out
}

/// Route one authorized chat message.
pub async fn handle_text(bridge: &mut Bridge, chat_id: i64, text: &str) {
    match Command::parse(text) {
        Some(command) => handle_command(bridge, chat_id, command).await,
        None => forward_text(bridge, chat_id, text).await,
    }
}

pub async fn handle_command(bridge: &mut Bridge, chat_id: i64, command: Command) {
    info!(
        component = "commands",
        event = "commands.received",
        chat_id,
        command = ?command,
    );
    let chat = bridge.chat.clone();
    let chat = &*chat;

    match command {
        Command::Help => reply(chat, chat_id, &help_text()).await,

        Command::Panes => {
            let (text, keyboard) = panes_reply(bridge).await;
            reply_with(chat, chat_id, &text, ParseMode::Plain, keyboard.as_ref()).await;
        }

        Command::SetPane(None) => reply(chat, chat_id, "Usage: /setpane <id>. See /panes.").await,

        Command::SetPane(Some(id)) => {
            let text = match bridge.registry.set_selected(&bridge.session, &id).await {
                Ok(pane) => {
                    let mut text = format!("✅ Connected to pane {}: {}", pane.id, pane.title);
                    if let Some(pinned) = bridge.registry.pinned() {
                        text.push_str(&format!(
                            "\n⚠️ CHATPANE_PANE pins pane {pinned}; it takes precedence."
                        ));
                    }
                    text
                }
                Err(e) => format!("❌ {e}"),
            };
            reply(chat, chat_id, &text).await;
        }

        Command::Status => {
            let text = status_text(bridge).await;
            reply(chat, chat_id, &text).await;
        }

        Command::Stop => {
            if bridge.registry.get_selected(&bridge.session).await.is_none() {
                reply(chat, chat_id, &format!("❌ {}", BridgeError::NoPaneSelected)).await;
                return;
            }
            let sent = bridge.dispatcher.send_escape(&bridge.session).await;
            bridge.typing.stop();
            bridge.session.clear_pending();
            let text = if sent {
                "⏹ Sent Esc to interrupt Claude."
            } else {
                "⚠️ Could not send Esc to the pane."
            };
            reply(chat, chat_id, text).await;
        }

        Command::Clear => forward_assistant_command(bridge, chat_id, "/clear").await,
        Command::Resume => forward_assistant_command(bridge, chat_id, "/resume").await,

        Command::Mute => {
            bridge.session.set_muted(true);
            reply(
                chat,
                chat_id,
                "🔇 Muted. Claude's replies won't be sent here. /unmute to resume.",
            )
            .await;
        }

        Command::Unmute => {
            bridge.session.set_muted(false);
            reply(chat, chat_id, "🔔 Unmuted. Claude's replies will be sent here.").await;
        }

        Command::Refresh => {
            let text = match chat.set_my_commands(&bot_commands()).await {
                Ok(()) => "🔄 Command menu refreshed.".to_string(),
                Err(e) => format!("⚠️ Failed to refresh commands: {e}"),
            };
            reply(chat, chat_id, &text).await;
        }

        Command::Blocked(name) => {
            reply(
                chat,
                chat_id,
                &format!("⚠️ /{name} requires interactive input in the terminal and is not supported from chat."),
            )
            .await;
        }

        Command::Unknown(name) => {
            reply(
                chat,
                chat_id,
                &format!("❓ Unknown command: /{name}. Send /help for the list."),
            )
            .await;
        }
    }
}

/// Send an assistant slash-command (e.g. `/clear`) into the pane.
async fn forward_assistant_command(bridge: &mut Bridge, chat_id: i64, literal: &str) {
    let text = match bridge.dispatcher.send_text(&bridge.session, literal).await {
        Ok(pane) => format!("✅ Sent {literal} to pane {}.", pane.id),
        Err(e) => format!("❌ {e}"),
    };
    reply(&*bridge.chat, chat_id, &text).await;
}

/// Type free text into the pane and wait for the completion hook.
async fn forward_text(bridge: &mut Bridge, chat_id: i64, text: &str) {
    let chat = bridge.chat.clone();

    if bridge.registry.get_selected(&bridge.session).await.is_none() {
        reply(&*chat, chat_id, &format!("❌ {}", BridgeError::NoPaneSelected)).await;
        return;
    }

    if is_blocked_free_text(text) {
        let name = text.trim().to_lowercase();
        reply(
            &*chat,
            chat_id,
            &format!("⚠️ {name} requires interactive input in the terminal and is not supported from chat."),
        )
        .await;
        return;
    }

    bridge.session.mark_pending();
    bridge.typing.start(chat_id);

    if let Err(e) = bridge.dispatcher.send_text(&bridge.session, text).await {
        warn!(
            component = "commands",
            event = "commands.forward_failed",
            chat_id,
            error = %e,
        );
        bridge.typing.stop();
        bridge.session.clear_pending();
        reply(&*chat, chat_id, &format!("❌ {e}")).await;
    }
}

async fn panes_reply(bridge: &Bridge) -> (String, Option<Keyboard>) {
    let panes = bridge.registry.list_panes().await;
    if panes.is_empty() {
        return (
            "No WezTerm panes found. Is WezTerm running?".to_string(),
            None,
        );
    }

    let selected = bridge
        .registry
        .get_selected(&bridge.session)
        .await
        .map(|p| p.id);

    let mut text = String::from("🪟 WezTerm panes:\n");
    let mut keyboard: Keyboard = Vec::new();
    for pane in &panes {
        let marker = if selected.as_deref() == Some(pane.id.as_str()) {
            " ✅"
        } else {
            ""
        };
        let cwd = pane
            .cwd
            .as_deref()
            .map(|c| format!(" ({c})"))
            .unwrap_or_default();
        text.push_str(&format!("• {}: {}{}{}\n", pane.id, pane.title, cwd, marker));
        keyboard.push(vec![InlineKeyboardButton {
            text: format!("{}: {}", pane.id, pane.title),
            callback_data: format!("/setpane {}", pane.id),
        }]);
    }
    text.push_str("\nTap a pane or send /setpane <id>.");
    (text, Some(keyboard))
}

async fn status_text(bridge: &Bridge) -> String {
    let wezterm = match bridge.registry.try_list_panes().await {
        Ok(panes) => format!("✅ reachable, {} pane(s)", panes.len()),
        Err(e) => format!("❌ {e}"),
    };
    let pane = match bridge.registry.get_selected(&bridge.session).await {
        Some(p) => format!("{} ({})", p.id, p.title),
        None => "none".to_string(),
    };
    let replies = if bridge.session.is_muted() {
        "🔇 muted"
    } else {
        "🔔 on"
    };
    let pending = match bridge.session.pending() {
        Some(marker) => format!("waiting for {}s", marker.age().as_secs()),
        None => "idle".to_string(),
    };

    let mut out = format!(
        "📊 Status\nWezTerm: {wezterm}\nPane: {pane}\nReplies: {replies}\nClaude: {pending}"
    );
    if let Some(pinned) = bridge.registry.pinned() {
        out.push_str(&format!("\nPinned pane: {pinned}"));
    }
    out
}
