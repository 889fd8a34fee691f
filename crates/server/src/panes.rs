//! Pane registry
//!
//! Lists live panes and tracks the single selected pane. The selection is
//! validated on every read: a pane closed out-of-band clears the selection
//! instead of leaving the bridge typing into nothing.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{BackendError, BridgeError};
use crate::session::SessionState;
use crate::terminal::{Pane, TerminalBackend};

pub struct PaneRegistry {
    backend: Arc<dyn TerminalBackend>,
    /// Fixed pane from configuration; wins over the persisted selection.
    pinned: Option<String>,
}

impl PaneRegistry {
    pub fn new(backend: Arc<dyn TerminalBackend>, pinned: Option<String>) -> Self {
        Self {
            backend,
            pinned: pinned.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
        }
    }

    pub fn backend(&self) -> &Arc<dyn TerminalBackend> {
        &self.backend
    }

    pub fn pinned(&self) -> Option<&str> {
        self.pinned.as_deref()
    }

    /// Live panes, or empty when the multiplexer is unreachable. Never fails.
    pub async fn list_panes(&self) -> Vec<Pane> {
        match self.backend.list_panes().await {
            Ok(panes) => panes,
            Err(e) => {
                warn!(
                    component = "panes",
                    event = "panes.list_failed",
                    error = %e,
                    "Pane listing failed, treating as no panes"
                );
                Vec::new()
            }
        }
    }

    /// Same listing, but surfaces the failure (used by `/status`).
    pub async fn try_list_panes(&self) -> Result<Vec<Pane>, BackendError> {
        self.backend.list_panes().await
    }

    /// Persist `id` as the selection if it names a live pane.
    pub async fn set_selected(&self, session: &SessionState, id: &str) -> Result<Pane, BridgeError> {
        let id = id.trim();
        let pane = self
            .list_panes()
            .await
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| BridgeError::PaneNotFound(id.to_string()))?;

        session.set_selected_pane(&pane.id)?;
        info!(
            component = "panes",
            event = "panes.selected",
            pane_id = %pane.id,
            title = %pane.title,
        );
        Ok(pane)
    }

    /// The selected pane, confirmed against a fresh listing.
    ///
    /// A persisted selection that no longer exists is cleared. A pinned pane
    /// that is missing yields `None` but is left configured.
    pub async fn get_selected(&self, session: &SessionState) -> Option<Pane> {
        let wanted = match &self.pinned {
            Some(pinned) => pinned.clone(),
            None => session.selected_pane()?,
        };

        let found = self.list_panes().await.into_iter().find(|p| p.id == wanted);
        if found.is_none() && self.pinned.is_none() {
            info!(
                component = "panes",
                event = "panes.selection_stale",
                pane_id = %wanted,
                "Selected pane vanished, clearing selection"
            );
            session.clear_selected_pane();
        }
        found
    }
}
