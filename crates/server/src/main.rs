//! chatpane
//!
//! Relays a Telegram chat to a Claude Code session running in a WezTerm
//! pane, and the session's final replies back to the chat.

mod cmd_hook;
mod cmd_status;
mod commands;
mod config;
mod dispatch;
mod error;
mod hook_handler;
mod logging;
mod markup;
mod panes;
mod paths;
mod server;
mod session;
mod state;
mod store;
mod telegram;
mod terminal;
mod transcript;
mod typing;
mod webhook;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use crate::config::{default_bridge_url, Cli, Command, ServeArgs, ServeConfig};
use crate::state::Bridge;
use crate::store::FileStateStore;
use crate::telegram::{ChatApi, TelegramClient};
use crate::terminal::WezTermBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let state_dir = paths::resolve_state_dir(cli.state_dir.as_deref());

    match cli.command {
        Some(Command::Hook { bridge_url }) => {
            let logging = logging::init_logging(&paths::log_dir(&state_dir), logging::HOOK_LOG).ok();
            let url = bridge_url.unwrap_or_else(|| default_bridge_url(cli.port));
            if let Err(e) = cmd_hook::run(&state_dir, &url).await {
                error!(component = "hook", event = "hook.invalid_input", error = %e);
                eprintln!("chatpane hook: {e:#}");
                drop(logging);
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Status) => cmd_status::run(&state_dir, &default_bridge_url(cli.port)).await,
        None => serve(&cli.serve, cli.port, &state_dir).await,
    }
}

async fn serve(args: &ServeArgs, port: u16, state_dir: &Path) -> anyhow::Result<()> {
    paths::ensure_dirs(state_dir)?;
    let logging = logging::init_logging(&paths::log_dir(state_dir), logging::BRIDGE_LOG)?;

    let config = match ServeConfig::from_args(args, port) {
        Ok(config) => config,
        Err(e) => {
            error!(component = "config", event = "config.invalid", error = %e);
            eprintln!("chatpane: {e}");
            drop(logging);
            std::process::exit(1);
        }
    };

    info!(
        component = "server",
        event = "server.starting",
        run_id = %logging.run_id,
        pid = std::process::id(),
        state_dir = %state_dir.display(),
        pinned_pane = ?config.pinned_pane,
        allowed_chats = config.allowed_chats.len(),
    );

    let chat: Arc<dyn ChatApi> = Arc::new(TelegramClient::new(&config.bot_token, &config.api_base)?);
    match chat.set_my_commands(&commands::bot_commands()).await {
        Ok(()) => info!(component = "server", event = "server.commands_registered"),
        Err(e) => warn!(
            component = "server",
            event = "server.commands_register_failed",
            error = %e,
        ),
    }

    let bridge = Bridge::new(
        Arc::new(FileStateStore::new(state_dir)),
        Arc::new(WezTermBackend::new(config.wezterm_bin.clone())),
        chat,
        config.pinned_pane.clone(),
        config.allowed_chats.clone(),
    );
    let app = server::build_router(bridge.into_shared());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        component = "server",
        event = "server.listening",
        addr = %addr,
    );
    println!("chatpane listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
