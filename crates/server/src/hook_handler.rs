//! HTTP handler for the completion hook.
//!
//! The Stop-hook process POSTs Claude's final reply here. The pending
//! marker and typing loop are always reset; delivery then depends on the
//! mute flag and on knowing which chat to send to.

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use chatpane_protocol::{HookCallback, HookReply};
use tracing::{info, warn};

use crate::error::BridgeError;
use crate::markup::{escape_literal, markdown_to_html};
use crate::state::{Bridge, SharedBridge};
use crate::telegram::send_html;

const SESSION_ID_DISPLAY_CHARS: usize = 8;

/// HTTP POST handler for `/hook`.
pub async fn hook_handler(
    State(state): State<SharedBridge>,
    body: Bytes,
) -> (StatusCode, Json<HookReply>) {
    let callback: HookCallback = match serde_json::from_slice(&body) {
        Ok(cb) => cb,
        Err(e) => {
            warn!(
                component = "hook",
                event = "hook.malformed",
                error = %e,
            );
            return (
                StatusCode::BAD_REQUEST,
                Json(HookReply::error(format!("invalid hook body: {e}"))),
            );
        }
    };

    let mut bridge = state.lock().await;
    let (status, reply) = deliver_completion(&mut bridge, &callback).await;
    (status, Json(reply))
}

pub async fn deliver_completion(bridge: &mut Bridge, callback: &HookCallback) -> (StatusCode, HookReply) {
    bridge.typing.stop();
    bridge.session.clear_pending();

    if bridge.session.is_muted() {
        info!(component = "hook", event = "hook.muted", session_id = %callback.session_id);
        return (StatusCode::OK, HookReply::muted());
    }

    if callback.message.trim().is_empty() {
        return (StatusCode::OK, HookReply::empty());
    }

    let Some(chat_id) = bridge.session.active_chat() else {
        warn!(component = "hook", event = "hook.no_chat");
        return (
            StatusCode::BAD_REQUEST,
            HookReply::error(BridgeError::NoChatConfigured.to_string()),
        );
    };

    let html = format!(
        "{}\n\n{}",
        header_html(&callback.cwd, &callback.session_id),
        markdown_to_html(&callback.message)
    );
    let plain = format!(
        "{}\n\n{}",
        header_plain(&callback.cwd, &callback.session_id),
        callback.message
    );

    match send_html(&*bridge.chat, chat_id, &html, &plain).await {
        Ok(()) => {
            info!(
                component = "hook",
                event = "hook.delivered",
                chat_id,
                session_id = %callback.session_id,
                chars = callback.message.chars().count(),
            );
            (StatusCode::OK, HookReply::ok())
        }
        Err(e) => {
            warn!(
                component = "hook",
                event = "hook.delivery_failed",
                chat_id,
                error = %e,
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HookReply::error(e.to_string()),
            )
        }
    }
}

fn short_session(session_id: &str) -> &str {
    match session_id.char_indices().nth(SESSION_ID_DISPLAY_CHARS) {
        Some((idx, _)) => &session_id[..idx],
        None => session_id,
    }
}

fn header_html(cwd: &str, session_id: &str) -> String {
    format!(
        "📁 <code>{}</code> · <code>{}</code>",
        escape_literal(cwd),
        escape_literal(short_session(session_id))
    )
}

fn header_plain(cwd: &str, session_id: &str) -> String {
    format!("📁 {} · {}", cwd, short_session(session_id))
}
