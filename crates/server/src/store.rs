//! Flat-file key/value store shared with the hook process.
//!
//! One plain-text file per key. A missing or blank file means "unset".
//! There is no locking: the hook process runs once per assistant turn and
//! finishes quickly, and both sides tolerate reading a stale value.

use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Keys persisted across process restarts and shared across processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    ActiveChat,
    SelectedPane,
    Pending,
}

impl StateKey {
    pub fn file_name(self) -> &'static str {
        match self {
            StateKey::ActiveChat => "chat_id",
            StateKey::SelectedPane => "pane_id",
            StateKey::Pending => "pending",
        }
    }
}

pub trait StateStore: Send + Sync {
    fn get(&self, key: StateKey) -> Option<String>;
    fn set(&self, key: StateKey, value: &str) -> io::Result<()>;
    fn clear(&self, key: StateKey) -> io::Result<()>;
}

pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: StateKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl StateStore for FileStateStore {
    fn get(&self, key: StateKey) -> Option<String> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let value = content.trim();
                (!value.is_empty()).then(|| value.to_string())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(
                    component = "store",
                    event = "store.read_failed",
                    path = %path.display(),
                    error = %e,
                    "Failed to read state file, treating as unset"
                );
                None
            }
        }
    }

    fn set(&self, key: StateKey, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), value)
    }

    fn clear(&self, key: StateKey) -> io::Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
