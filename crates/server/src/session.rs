//! Session state
//!
//! The bridge's only mutable state: active chat, selected pane, pending
//! marker and mute flag. Chat, pane and pending live in the `StateStore`
//! so they survive restarts and are visible to the hook process; mute is
//! process memory only.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::store::{StateKey, StateStore};

/// After this long a pending marker is treated as absent.
pub const PENDING_TTL: Duration = Duration::from_secs(10 * 60);

/// A forwarded message still awaiting its completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMarker {
    pub created_at_ms: u64,
}

impl PendingMarker {
    pub fn age(&self) -> Duration {
        Duration::from_millis(now_ms().saturating_sub(self.created_at_ms))
    }

    pub fn is_stale(&self) -> bool {
        self.age() > PENDING_TTL
    }
}

pub struct SessionState {
    store: Arc<dyn StateStore>,
    muted: bool,
}

impl SessionState {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            muted: false,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub fn active_chat(&self) -> Option<i64> {
        self.store
            .get(StateKey::ActiveChat)
            .and_then(|v| v.parse().ok())
    }

    pub fn set_active_chat(&self, chat_id: i64) {
        if self.active_chat() == Some(chat_id) {
            return;
        }
        if let Err(e) = self.store.set(StateKey::ActiveChat, &chat_id.to_string()) {
            warn!(
                component = "session",
                event = "session.active_chat_persist_failed",
                chat_id,
                error = %e,
                "Failed to persist active chat"
            );
        }
    }

    /// Raw persisted selection. Use `PaneRegistry::get_selected` for a
    /// validated value.
    pub fn selected_pane(&self) -> Option<String> {
        self.store.get(StateKey::SelectedPane)
    }

    pub fn set_selected_pane(&self, pane_id: &str) -> std::io::Result<()> {
        self.store.set(StateKey::SelectedPane, pane_id)
    }

    pub fn clear_selected_pane(&self) {
        if let Err(e) = self.store.clear(StateKey::SelectedPane) {
            warn!(
                component = "session",
                event = "session.pane_clear_failed",
                error = %e,
                "Failed to clear selected pane"
            );
        }
    }

    pub fn mark_pending(&self) {
        if let Err(e) = self.store.set(StateKey::Pending, &now_ms().to_string()) {
            warn!(
                component = "session",
                event = "session.pending_persist_failed",
                error = %e,
                "Failed to write pending marker"
            );
        }
    }

    pub fn clear_pending(&self) {
        if let Err(e) = self.store.clear(StateKey::Pending) {
            warn!(
                component = "session",
                event = "session.pending_clear_failed",
                error = %e,
                "Failed to clear pending marker"
            );
        }
    }

    /// Current pending marker, if any and not expired. Stale or unreadable
    /// markers are removed as a side effect.
    pub fn pending(&self) -> Option<PendingMarker> {
        read_pending(self.store.as_ref())
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

/// Pending-marker read shared with the hook process, which has no
/// `SessionState` of its own.
pub fn read_pending(store: &dyn StateStore) -> Option<PendingMarker> {
    let raw = store.get(StateKey::Pending)?;
    let marker = raw.parse().ok().map(|created_at_ms| PendingMarker { created_at_ms });
    match marker {
        Some(m) if !m.is_stale() => Some(m),
        _ => {
            if let Err(e) = store.clear(StateKey::Pending) {
                warn!(
                    component = "session",
                    event = "session.stale_pending_clear_failed",
                    error = %e,
                    "Failed to remove stale pending marker"
                );
            }
            None
        }
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
