//! Central path resolution for chatpane state files.
//!
//! Resolved once at startup from: CLI `--state-dir` > `CHATPANE_STATE_DIR` env > `~/.chatpane`.
//! The bridge and the hook process must agree on this directory, since the
//! marker files inside it are their only shared state.

use std::io;
use std::path::{Path, PathBuf};

pub const STATE_DIR_ENV: &str = "CHATPANE_STATE_DIR";

/// Resolve the state directory.
///
/// Priority: `explicit` arg > `CHATPANE_STATE_DIR` env > `~/.chatpane` default.
/// Falls back to the system temp dir when no home directory is known.
pub fn resolve_state_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    if let Ok(env_val) = std::env::var(STATE_DIR_ENV) {
        if !env_val.trim().is_empty() {
            return PathBuf::from(env_val);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".chatpane")
}

pub fn log_dir(state_dir: &Path) -> PathBuf {
    state_dir.join("logs")
}

/// Create the state dir and its `logs/` subdirectory.
pub fn ensure_dirs(state_dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(state_dir)?;
    std::fs::create_dir_all(log_dir(state_dir))?;
    Ok(())
}

/// Expand a leading `~` or `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_state_dir_wins() {
        let dir = resolve_state_dir(Some(Path::new("/tmp/chatpane-explicit")));
        assert_eq!(dir, PathBuf::from("/tmp/chatpane-explicit"));
    }

    #[test]
    fn expands_home_prefix_only() {
        let home = dirs::home_dir().expect("home dir in test env");
        assert_eq!(expand_home("~/a/b.jsonl"), home.join("a/b.jsonl"));
        assert_eq!(expand_home("/abs/~/x"), PathBuf::from("/abs/~/x"));
        assert_eq!(expand_home("rel/path"), PathBuf::from("rel/path"));
    }

    #[test]
    fn ensure_dirs_creates_logs() {
        let tmp = tempfile::tempdir().unwrap();
        let state = tmp.path().join("state");
        ensure_dirs(&state).unwrap();
        assert!(log_dir(&state).is_dir());
    }
}
