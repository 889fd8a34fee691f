//! Test doubles for the terminal backend and the chat API.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chatpane_protocol::BotCommand;

use crate::error::{BackendError, BridgeError};
use crate::session::SessionState;
use crate::store::FileStateStore;
use crate::telegram::{ChatApi, Keyboard, ParseMode};
use crate::terminal::{Key, Pane, TerminalBackend};

pub fn session_in(dir: &Path) -> SessionState {
    SessionState::new(Arc::new(FileStateStore::new(dir)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(String, String),
    Key(String, Key),
}

#[derive(Default)]
struct BackendState {
    panes: Vec<Pane>,
    sent: Vec<Sent>,
    fail_listing: bool,
    fail_sends: bool,
    /// Listings left before all panes disappear.
    vanish_after: Option<usize>,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<BackendState>,
}

fn panes_from(panes: &[(&str, &str)]) -> Vec<Pane> {
    panes
        .iter()
        .map(|(id, title)| Pane {
            id: id.to_string(),
            title: title.to_string(),
            cwd: None,
        })
        .collect()
}

impl FakeBackend {
    pub fn with_panes(panes: &[(&str, &str)]) -> Arc<Self> {
        let backend = Self::default();
        backend.set_panes(panes);
        Arc::new(backend)
    }

    pub fn set_panes(&self, panes: &[(&str, &str)]) {
        self.state.lock().unwrap().panes = panes_from(panes);
    }

    pub fn set_pane_list(&self, panes: Vec<Pane>) {
        self.state.lock().unwrap().panes = panes;
    }

    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }

    pub fn fail_sends(&self, fail: bool) {
        self.state.lock().unwrap().fail_sends = fail;
    }

    pub fn vanish_after_listings(&self, n: usize) {
        self.state.lock().unwrap().vanish_after = Some(n);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.state.lock().unwrap().sent.clone()
    }

    fn injected() -> BackendError {
        BackendError::Exit {
            program: "wezterm".into(),
            code: 1,
            stderr: "injected failure".into(),
        }
    }
}

#[async_trait]
impl TerminalBackend for FakeBackend {
    async fn list_panes(&self) -> Result<Vec<Pane>, BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(BackendError::Spawn {
                program: "wezterm".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no wezterm"),
            });
        }
        match state.vanish_after {
            Some(0) => {
                state.panes.clear();
            }
            Some(n) => state.vanish_after = Some(n - 1),
            None => {}
        }
        Ok(state.panes.clone())
    }

    async fn send_text(&self, pane_id: &str, text: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_sends {
            return Err(Self::injected());
        }
        state.sent.push(Sent::Text(pane_id.into(), text.into()));
        Ok(())
    }

    async fn send_key(&self, pane_id: &str, key: Key) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_sends {
            return Err(Self::injected());
        }
        state.sent.push(Sent::Key(pane_id.into(), key));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCall {
    Message {
        chat_id: i64,
        text: String,
        mode: ParseMode,
        keyboard: Option<Keyboard>,
    },
    Action {
        chat_id: i64,
        action: String,
    },
    Commands(Vec<BotCommand>),
    CallbackAnswer(String),
}

#[derive(Default)]
struct ChatState {
    calls: Vec<ChatCall>,
    reject_html: bool,
    fail_all: bool,
}

/// Records every outbound call instead of talking to Telegram.
#[derive(Default)]
pub struct RecordingChat {
    state: Mutex<ChatState>,
}

impl RecordingChat {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reject HTML sends the way Telegram rejects malformed entities.
    pub fn reject_html(&self, reject: bool) {
        self.state.lock().unwrap().reject_html = reject;
    }

    pub fn fail_all(&self, fail: bool) {
        self.state.lock().unwrap().fail_all = fail;
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn messages(&self) -> Vec<(i64, String, ParseMode)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ChatCall::Message {
                    chat_id, text, mode, ..
                } => Some((chat_id, text, mode)),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.messages().pop().map(|(_, text, _)| text)
    }

    pub fn actions(&self) -> Vec<(i64, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ChatCall::Action { chat_id, action } => Some((chat_id, action)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ChatCall) -> Result<(), BridgeError> {
        let mut state = self.state.lock().unwrap();
        let rejected_html = matches!(
            &call,
            ChatCall::Message { mode: ParseMode::Html, .. } if state.reject_html
        );
        let fail_all = state.fail_all;
        state.calls.push(call);
        if fail_all {
            return Err(BridgeError::UpstreamApi("Internal Server Error".into()));
        }
        if rejected_html {
            return Err(BridgeError::UpstreamApi(
                "Bad Request: can't parse entities: unclosed start tag".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatApi for RecordingChat {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        mode: ParseMode,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), BridgeError> {
        self.record(ChatCall::Message {
            chat_id,
            text: text.to_string(),
            mode,
            keyboard: keyboard.cloned(),
        })
    }

    async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), BridgeError> {
        self.record(ChatCall::Action {
            chat_id,
            action: action.to_string(),
        })
    }

    async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), BridgeError> {
        self.record(ChatCall::Commands(commands.to_vec()))
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), BridgeError> {
        self.record(ChatCall::CallbackAnswer(callback_query_id.to_string()))
    }
}
