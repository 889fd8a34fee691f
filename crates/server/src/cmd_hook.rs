//! `chatpane hook`: Claude Code Stop hook.
//!
//! Runs once per assistant turn with the hook envelope on stdin. Only turns
//! started from chat (fresh pending marker) are forwarded, and nothing here
//! may fail the assistant's turn: after input validation every outcome exits 0.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chatpane_protocol::{HookCallback, StopHookInput};
use tracing::{debug, info, warn};

use crate::paths::expand_home;
use crate::session::read_pending;
use crate::store::{FileStateStore, StateStore};
use crate::transcript::last_assistant_message;

const STOP_EVENT: &str = "Stop";
const POST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, PartialEq, Eq)]
pub enum HookOutcome {
    Skip(&'static str),
    Deliver(HookCallback),
}

pub async fn run(state_dir: &Path, bridge_url: &str) -> anyhow::Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("reading hook input from stdin")?;

    let store = FileStateStore::new(state_dir);
    match prepare(&input, &store)? {
        HookOutcome::Skip(reason) => {
            debug!(component = "hook", event = "hook.skipped", reason);
        }
        HookOutcome::Deliver(callback) => post_callback(bridge_url, &callback).await,
    }
    Ok(())
}

/// Decide what to forward. Errors mean the input itself was unusable.
pub fn prepare(input: &str, store: &dyn StateStore) -> anyhow::Result<HookOutcome> {
    let hook: StopHookInput = serde_json::from_str(input).context("parsing hook input")?;
    if hook.hook_event_name != STOP_EVENT {
        return Ok(HookOutcome::Skip("not a stop event"));
    }

    let transcript_path = hook
        .transcript_path
        .filter(|p| !p.trim().is_empty())
        .context("hook input has no transcript_path")?;
    let cwd = hook
        .cwd
        .filter(|c| !c.trim().is_empty())
        .context("hook input has no cwd")?;

    if read_pending(store).is_none() {
        return Ok(HookOutcome::Skip("no pending chat request"));
    }

    let message = match last_assistant_message(&expand_home(&transcript_path)) {
        Some(m) if !m.trim().is_empty() => m,
        _ => return Ok(HookOutcome::Skip("no assistant message")),
    };

    Ok(HookOutcome::Deliver(HookCallback {
        message,
        cwd,
        session_id: hook.session_id.unwrap_or_default(),
    }))
}

async fn post_callback(bridge_url: &str, callback: &HookCallback) {
    let url = format!("{}/hook", bridge_url.trim_end_matches('/'));
    let client = match reqwest::Client::builder().timeout(POST_TIMEOUT).build() {
        Ok(c) => c,
        Err(e) => {
            warn!(component = "hook", event = "hook.client_failed", error = %e);
            return;
        }
    };

    match client.post(&url).json(callback).send().await {
        Ok(resp) if resp.status().is_success() => {
            info!(
                component = "hook",
                event = "hook.posted",
                session_id = %callback.session_id,
                chars = callback.message.chars().count(),
            );
        }
        Ok(resp) => {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(
                component = "hook",
                event = "hook.rejected",
                url = %url,
                status = status.as_u16(),
                body = %body,
            );
        }
        Err(e) => {
            warn!(
                component = "hook",
                event = "hook.post_failed",
                url = %url,
                error = %e,
            );
        }
    }
}
