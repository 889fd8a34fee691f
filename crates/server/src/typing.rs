//! Typing indicator loop.
//!
//! While a forwarded message awaits its completion callback, Telegram's
//! "typing…" status is refreshed every few seconds (it expires client-side
//! after ~5s). At most one loop runs at a time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::session::PENDING_TTL;
use crate::telegram::ChatApi;

pub const TYPING_INTERVAL: Duration = Duration::from_secs(5);

pub struct TypingIndicator {
    api: Arc<dyn ChatApi>,
    interval: Duration,
    max_duration: Duration,
    task: Option<JoinHandle<()>>,
}

impl TypingIndicator {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self::with_timing(api, TYPING_INTERVAL, PENDING_TTL)
    }

    pub fn with_timing(api: Arc<dyn ChatApi>, interval: Duration, max_duration: Duration) -> Self {
        Self {
            api,
            interval,
            max_duration,
            task: None,
        }
    }

    /// Start (or restart) the loop for `chat_id`.
    pub fn start(&mut self, chat_id: i64) {
        self.stop();

        let api = self.api.clone();
        let interval = self.interval;
        let max_duration = self.max_duration;
        self.task = Some(tokio::spawn(async move {
            let started = Instant::now();
            loop {
                if let Err(e) = api.send_chat_action(chat_id, "typing").await {
                    debug!(
                        component = "typing",
                        event = "typing.action_failed",
                        chat_id,
                        error = %e,
                    );
                }
                if started.elapsed() >= max_duration {
                    debug!(component = "typing", event = "typing.expired", chat_id);
                    break;
                }
                tokio::time::sleep(interval).await;
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for TypingIndicator {
    fn drop(&mut self) {
        self.stop();
    }
}
