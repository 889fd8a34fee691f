//! Command line and environment configuration.
//!
//! Every setting can come from a flag or its environment variable; flags win.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::warn;

use crate::paths::STATE_DIR_ENV;
use crate::telegram::DEFAULT_API_BASE;

pub const DEFAULT_PORT: u16 = 3007;

/// Fixed pane override. WezTerm sets `WEZTERM_PANE` in every pane it
/// spawns, so the bridge uses its own name instead.
pub const PANE_ENV: &str = "CHATPANE_PANE";

#[derive(Debug, Parser)]
#[command(name = "chatpane")]
#[command(about = "Relay a Telegram chat to a Claude Code session in a WezTerm pane")]
#[command(version)]
pub struct Cli {
    /// Directory holding chat, pane and pending marker files
    #[arg(long, global = true, env = STATE_DIR_ENV)]
    pub state_dir: Option<PathBuf>,

    /// Port the bridge listens on
    #[arg(long, global = true, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[command(flatten)]
    pub serve: ServeArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Claude Code Stop hook: read the hook event on stdin and forward the
    /// final assistant reply to the bridge
    Hook {
        /// Bridge base URL (defaults to http://127.0.0.1:<port>)
        #[arg(long, env = "CHATPANE_BRIDGE_URL")]
        bridge_url: Option<String>,
    },

    /// Show state files and whether the bridge answers
    Status,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Comma-separated chat ids allowed to use the bot
    #[arg(long, env = "ALLOWED_CHAT_IDS")]
    pub allowed_chat_ids: Option<String>,

    /// Pin the bridge to this pane id, ignoring /setpane
    #[arg(long, env = PANE_ENV)]
    pub pane: Option<String>,

    /// WezTerm executable
    #[arg(long, env = "WEZTERM_BIN", default_value = "wezterm")]
    pub wezterm_bin: String,

    /// Telegram Bot API base URL
    #[arg(long, env = "TELEGRAM_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TELEGRAM_BOT_TOKEN is not set")]
    MissingToken,
}

/// Validated settings for the bridge server.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub port: u16,
    pub bot_token: String,
    pub allowed_chats: HashSet<i64>,
    pub pinned_pane: Option<String>,
    pub wezterm_bin: String,
    pub api_base: String,
}

impl ServeConfig {
    pub fn from_args(args: &ServeArgs, port: u16) -> Result<Self, ConfigError> {
        let bot_token = args
            .bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?
            .to_string();

        let allowed_chats = args
            .allowed_chat_ids
            .as_deref()
            .map(parse_allow_list)
            .unwrap_or_default();
        if allowed_chats.is_empty() {
            warn!(
                component = "config",
                event = "config.allow_list_empty",
                "ALLOWED_CHAT_IDS is empty; every chat will be rejected"
            );
        }

        Ok(Self {
            port,
            bot_token,
            allowed_chats,
            pinned_pane: args
                .pane
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            wezterm_bin: args.wezterm_bin.clone(),
            api_base: args.api_base.trim_end_matches('/').to_string(),
        })
    }
}

/// Parse `"111, 222,abc"` into `{111, 222}`, warning about bad entries.
pub fn parse_allow_list(raw: &str) -> HashSet<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(
                    component = "config",
                    event = "config.bad_chat_id",
                    entry,
                    "Skipping non-numeric chat id"
                );
                None
            }
        })
        .collect()
}

pub fn default_bridge_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(token: Option<&str>) -> ServeArgs {
        ServeArgs {
            bot_token: token.map(str::to_string),
            allowed_chat_ids: Some("111,222".into()),
            pane: Some(" ".into()),
            wezterm_bin: "wezterm".into(),
            api_base: "https://api.telegram.org/".into(),
        }
    }

    #[test]
    fn allow_list_skips_bad_entries() {
        let ids = parse_allow_list("111, -222 ,abc,,333");
        assert_eq!(ids, HashSet::from([111, -222, 333]));
        assert!(parse_allow_list("").is_empty());
    }

    #[test]
    fn missing_or_blank_token_is_an_error() {
        assert_eq!(
            ServeConfig::from_args(&args(None), 3007).unwrap_err(),
            ConfigError::MissingToken
        );
        assert_eq!(
            ServeConfig::from_args(&args(Some("  ")), 3007).unwrap_err(),
            ConfigError::MissingToken
        );
    }

    #[test]
    fn builds_config_from_args() {
        let cfg = ServeConfig::from_args(&args(Some("123:abc")), 4000).unwrap();
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.bot_token, "123:abc");
        assert_eq!(cfg.allowed_chats, HashSet::from([111, 222]));
        assert_eq!(cfg.pinned_pane, None);
        assert_eq!(cfg.api_base, "https://api.telegram.org");
    }

    #[test]
    fn parses_subcommands_and_flags() {
        let cli = Cli::try_parse_from([
            "chatpane",
            "--port",
            "4100",
            "hook",
            "--bridge-url",
            "http://localhost:9",
        ])
        .unwrap();
        assert_eq!(cli.port, 4100);
        match cli.command {
            Some(Command::Hook { bridge_url }) => {
                assert_eq!(bridge_url.as_deref(), Some("http://localhost:9"))
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["chatpane", "--pane", "7", "--port", "3007"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.serve.pane.as_deref(), Some("7"));
    }

    #[test]
    fn wezterm_pane_env_does_not_pin() {
        std::env::set_var("WEZTERM_PANE", "0");
        std::env::remove_var(PANE_ENV);
        let cli = Cli::try_parse_from(["chatpane", "--bot-token", "123:abc"]).unwrap();
        let cfg = ServeConfig::from_args(&cli.serve, cli.port).unwrap();
        assert_eq!(cfg.pinned_pane, None);
    }

    #[test]
    fn default_bridge_url_uses_loopback() {
        assert_eq!(default_bridge_url(3007), "http://127.0.0.1:3007");
    }
}
