//! Application state

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::dispatch::TerminalDispatcher;
use crate::panes::PaneRegistry;
use crate::session::SessionState;
use crate::store::StateStore;
use crate::telegram::ChatApi;
use crate::terminal::TerminalBackend;
use crate::typing::TypingIndicator;

/// The bridge's composition root. Request handlers lock it for the whole
/// request, so at most one request mutates state or types into the pane
/// at a time. Overlapping chat messages are not queued or rejected; they
/// are simply forwarded one after another.
pub struct Bridge {
    pub session: SessionState,
    pub registry: Arc<PaneRegistry>,
    pub dispatcher: TerminalDispatcher,
    pub chat: Arc<dyn ChatApi>,
    pub typing: TypingIndicator,
    allowed_chats: HashSet<i64>,
}

pub type SharedBridge = Arc<Mutex<Bridge>>;

impl Bridge {
    pub fn new(
        store: Arc<dyn StateStore>,
        backend: Arc<dyn TerminalBackend>,
        chat: Arc<dyn ChatApi>,
        pinned_pane: Option<String>,
        allowed_chats: HashSet<i64>,
    ) -> Self {
        let registry = Arc::new(PaneRegistry::new(backend, pinned_pane));
        Self {
            session: SessionState::new(store),
            dispatcher: TerminalDispatcher::new(registry.clone()),
            registry,
            typing: TypingIndicator::new(chat.clone()),
            chat,
            allowed_chats,
        }
    }

    pub fn into_shared(self) -> SharedBridge {
        Arc::new(Mutex::new(self))
    }

    /// Empty allow-list rejects everyone.
    pub fn is_authorized(&self, chat_id: i64) -> bool {
        self.allowed_chats.contains(&chat_id)
    }
}
