//! Error taxonomy for the bridge.
//!
//! `Display` strings double as the text shown to the chat user, so they
//! stay short and plain.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("No pane selected. Use /panes then /setpane <id>.")]
    NoPaneSelected,

    #[error("Pane {0} not found. Use /panes to list live panes.")]
    PaneNotFound(String),

    #[error("Pane {0} is gone. Select another with /setpane <id>.")]
    PaneGone(String),

    #[error("Failed to send to terminal: {0}")]
    DispatchFailed(String),

    #[error("Not authorized. Your chat id is {0}.")]
    Unauthorized(i64),

    #[error("No active chat configured")]
    NoChatConfigured,

    #[error("Telegram API error: {0}")]
    UpstreamApi(String),

    #[error("Failed to save state: {0}")]
    State(#[from] std::io::Error),
}

/// Failures of the terminal multiplexer CLI.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {code}: {stderr}")]
    Exit {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("unexpected pane listing: {0}")]
    Parse(#[from] serde_json::Error),
}
