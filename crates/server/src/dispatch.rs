//! Terminal dispatcher
//!
//! Turns a chat payload into keystrokes in the selected pane: the literal
//! text first, then a separate Enter. Some host shells drop an embedded
//! newline from `send-text`, so submission is always its own call.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::BridgeError;
use crate::panes::PaneRegistry;
use crate::session::SessionState;
use crate::terminal::{Key, Pane};

pub struct TerminalDispatcher {
    registry: Arc<PaneRegistry>,
}

impl TerminalDispatcher {
    pub fn new(registry: Arc<PaneRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve the selected pane and re-check it against a fresh listing
    /// right before use.
    async fn resolve(&self, session: &SessionState) -> Result<Pane, BridgeError> {
        let pane = self
            .registry
            .get_selected(session)
            .await
            .ok_or(BridgeError::NoPaneSelected)?;

        let still_live = self
            .registry
            .list_panes()
            .await
            .iter()
            .any(|p| p.id == pane.id);
        if !still_live {
            return Err(BridgeError::PaneGone(pane.id));
        }
        Ok(pane)
    }

    /// Type `payload` into the pane and submit it.
    pub async fn send_text(&self, session: &SessionState, payload: &str) -> Result<Pane, BridgeError> {
        let pane = self.resolve(session).await?;
        let backend = self.registry.backend();

        backend
            .send_text(&pane.id, payload)
            .await
            .map_err(|e| BridgeError::DispatchFailed(e.to_string()))?;
        backend
            .send_key(&pane.id, Key::Enter)
            .await
            .map_err(|e| BridgeError::DispatchFailed(e.to_string()))?;

        info!(
            component = "dispatch",
            event = "dispatch.sent",
            pane_id = %pane.id,
            bytes = payload.len(),
        );
        Ok(pane)
    }

    /// Best-effort interrupt of the running assistant turn.
    pub async fn send_escape(&self, session: &SessionState) -> bool {
        let pane = match self.resolve(session).await {
            Ok(pane) => pane,
            Err(e) => {
                warn!(
                    component = "dispatch",
                    event = "dispatch.escape_unresolved",
                    error = %e,
                );
                return false;
            }
        };

        match self.registry.backend().send_key(&pane.id, Key::Escape).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    component = "dispatch",
                    event = "dispatch.escape_failed",
                    pane_id = %pane.id,
                    error = %e,
                );
                false
            }
        }
    }
}
