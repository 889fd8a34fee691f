//! Terminal multiplexer backend.
//!
//! `TerminalBackend` is the narrow capability the bridge needs from the
//! multiplexer. `WezTermBackend` implements it by shelling out to
//! `wezterm cli`.

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::BackendError;

/// A live pane as reported by the multiplexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pane {
    pub id: String,
    pub title: String,
    pub cwd: Option<String>,
}

/// Keystrokes the bridge injects besides literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
}

impl Key {
    pub fn as_text(self) -> &'static str {
        match self {
            Key::Enter => "\r",
            Key::Escape => "\x1b",
        }
    }
}

#[async_trait]
pub trait TerminalBackend: Send + Sync {
    async fn list_panes(&self) -> Result<Vec<Pane>, BackendError>;

    /// Inject `text` as if typed (no bracketed paste).
    async fn send_text(&self, pane_id: &str, text: &str) -> Result<(), BackendError>;

    async fn send_key(&self, pane_id: &str, key: Key) -> Result<(), BackendError>;
}

pub struct WezTermBackend {
    program: String,
}

impl WezTermBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, BackendError> {
        debug!(
            component = "terminal",
            event = "terminal.exec",
            program = %self.program,
            subcommand = args.get(1).copied().unwrap_or_default(),
        );

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| BackendError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BackendError::Exit {
                program: self.program.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TerminalBackend for WezTermBackend {
    async fn list_panes(&self) -> Result<Vec<Pane>, BackendError> {
        let stdout = self.run(&["cli", "list", "--format", "json"]).await?;
        parse_pane_list(&stdout)
    }

    async fn send_text(&self, pane_id: &str, text: &str) -> Result<(), BackendError> {
        // Args go straight to execve, so quotes in `text` need no escaping;
        // `--` keeps a leading '-' from being read as a flag.
        self.run(&[
            "cli",
            "send-text",
            "--pane-id",
            pane_id,
            "--no-paste",
            "--",
            text,
        ])
        .await
        .map(|_| ())
    }

    async fn send_key(&self, pane_id: &str, key: Key) -> Result<(), BackendError> {
        self.send_text(pane_id, key.as_text()).await
    }
}

#[derive(Deserialize)]
struct WezTermPane {
    pane_id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    cwd: Option<String>,
}

/// Parse `wezterm cli list --format json` output.
pub fn parse_pane_list(json: &str) -> Result<Vec<Pane>, BackendError> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    let panes: Vec<WezTermPane> = serde_json::from_str(json)?;
    Ok(panes
        .into_iter()
        .map(|p| Pane {
            id: p.pane_id.to_string(),
            title: p.title,
            cwd: p.cwd.as_deref().and_then(cwd_path),
        })
        .collect())
}

/// WezTerm reports cwd as `file://host/path`; keep only the path.
fn cwd_path(raw: &str) -> Option<String> {
    let path = match raw.strip_prefix("file://") {
        Some(rest) => rest.find('/').map(|idx| &rest[idx..])?,
        None => raw,
    };
    (!path.is_empty()).then(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wezterm_listing() {
        let json = r#"[
            {"window_id":0,"tab_id":0,"pane_id":3,"workspace":"default","title":"claude","cwd":"file:///home/me/repo","is_active":true},
            {"window_id":0,"tab_id":1,"pane_id":7,"workspace":"default","title":"shell","cwd":""}
        ]"#;
        let panes = parse_pane_list(json).unwrap();
        assert_eq!(panes.len(), 2);
        assert_eq!(panes[0].id, "3");
        assert_eq!(panes[0].title, "claude");
        assert_eq!(panes[0].cwd.as_deref(), Some("/home/me/repo"));
        assert_eq!(panes[1].cwd, None);
    }

    #[test]
    fn cwd_url_host_is_dropped() {
        assert_eq!(cwd_path("file://devbox/srv/app").as_deref(), Some("/srv/app"));
        assert_eq!(cwd_path("/plain/path").as_deref(), Some("/plain/path"));
        assert_eq!(cwd_path("file://devbox"), None);
        assert_eq!(cwd_path(""), None);
    }

    #[test]
    fn empty_listing_is_no_panes() {
        assert!(parse_pane_list("").unwrap().is_empty());
        assert!(parse_pane_list("[]").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_json_listing() {
        assert!(matches!(
            parse_pane_list("no running server"),
            Err(BackendError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let backend = WezTermBackend::new("/nonexistent/wezterm-for-tests");
        let err = backend.list_panes().await.unwrap_err();
        assert!(matches!(err, BackendError::Spawn { .. }));
    }
}
