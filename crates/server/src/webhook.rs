//! Telegram webhook handling.
//!
//! Every update is authorized before anything else happens. Rejected chats
//! get a notice with their own chat id (so an operator can allow-list it)
//! and leave no trace in the session state.

use axum::{body::Bytes, extract::State, http::StatusCode};
use chatpane_protocol::{CallbackQuery, Message, Update};
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::error::BridgeError;
use crate::state::{Bridge, SharedBridge};
use crate::telegram::reply;

/// HTTP POST handler for the Telegram webhook.
///
/// Always `200 OK` once the body parses; malformed bodies get `500` so
/// Telegram retries per its own policy.
pub async fn webhook_handler(State(state): State<SharedBridge>, body: Bytes) -> (StatusCode, String) {
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            error!(
                component = "webhook",
                event = "webhook.malformed",
                error = %e,
                bytes = body.len(),
            );
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e}"));
        }
    };

    let mut bridge = state.lock().await;
    handle_update(&mut bridge, update).await;
    (StatusCode::OK, "OK".to_string())
}

pub async fn handle_update(bridge: &mut Bridge, update: Update) {
    if let Some(message) = update.message {
        handle_message(bridge, message).await;
    } else if let Some(query) = update.callback_query {
        handle_callback(bridge, query).await;
    } else {
        debug!(
            component = "webhook",
            event = "webhook.ignored",
            update_id = ?update.update_id,
        );
    }
}

async fn handle_message(bridge: &mut Bridge, message: Message) {
    let chat_id = message.chat.id;
    if !authorize(bridge, chat_id).await {
        return;
    }

    let Some(text) = message.text.filter(|t| !t.trim().is_empty()) else {
        debug!(
            component = "webhook",
            event = "webhook.non_text",
            chat_id,
            "Ignoring message without text"
        );
        return;
    };

    bridge.session.set_active_chat(chat_id);
    commands::handle_text(bridge, chat_id, &text).await;
}

async fn handle_callback(bridge: &mut Bridge, query: CallbackQuery) {
    let Some(chat_id) = query.chat_id() else {
        debug!(component = "webhook", event = "webhook.callback_without_chat");
        return;
    };
    if !authorize(bridge, chat_id).await {
        return;
    }

    // Answer before routing so the client spinner stops even if the
    // command is slow.
    if let Err(e) = bridge.chat.answer_callback_query(&query.id).await {
        warn!(
            component = "webhook",
            event = "webhook.callback_answer_failed",
            error = %e,
        );
    }
    let Some(data) = query.data.filter(|d| !d.trim().is_empty()) else {
        return;
    };

    bridge.session.set_active_chat(chat_id);
    commands::handle_text(bridge, chat_id, &data).await;
}

async fn authorize(bridge: &Bridge, chat_id: i64) -> bool {
    if bridge.is_authorized(chat_id) {
        return true;
    }
    info!(
        component = "webhook",
        event = "webhook.unauthorized",
        chat_id,
    );
    let notice = format!("⛔ {}", BridgeError::Unauthorized(chat_id));
    reply(&*bridge.chat, chat_id, &notice).await;
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_bridge::harness;
    use crate::store::StateKey;
    use crate::terminal::Key;
    use crate::test_support::{ChatCall, Sent};

    fn update(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn malformed_body_is_500() {
        let h = harness(&[111], &[]);
        let shared = h.bridge.into_shared();
        let (status, body) =
            webhook_handler(State(shared), Bytes::from_static(b"{not json")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Error"));
    }

    #[tokio::test]
    async fn handled_update_is_ok() {
        let h = harness(&[111], &[]);
        let chat = h.chat.clone();
        let shared = h.bridge.into_shared();
        let (status, body) = webhook_handler(
            State(shared),
            Bytes::from_static(br#"{"message":{"chat":{"id":111},"text":"/help"}}"#),
        )
        .await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "OK"));
        assert!(chat.last_text().unwrap().contains("/setpane"));
    }

    #[tokio::test]
    async fn unauthorized_chat_is_told_its_id_and_nothing_changes() {
        let mut h = harness(&[111], &[("3", "shell")]);
        h.bridge.session.set_selected_pane("3").unwrap();

        handle_update(
            &mut h.bridge,
            update(r#"{"message":{"chat":{"id":222},"text":"hello"}}"#),
        )
        .await;

        assert_eq!(
            h.chat.messages(),
            vec![(
                222,
                "⛔ Not authorized. Your chat id is 222.".to_string(),
                crate::telegram::ParseMode::Plain
            )]
        );
        assert!(h.backend.sent().is_empty());
        assert!(h.bridge.session.pending().is_none());
        assert!(h.bridge.session.store().get(StateKey::ActiveChat).is_none());
    }

    #[tokio::test]
    async fn empty_allow_list_rejects_well_formed_chat() {
        let mut h = harness(&[], &[("3", "shell")]);
        handle_update(
            &mut h.bridge,
            update(r#"{"message":{"chat":{"id":111},"text":"/panes"}}"#),
        )
        .await;

        assert!(h.chat.last_text().unwrap().contains("Not authorized"));
        assert!(h.bridge.session.active_chat().is_none());
    }

    #[tokio::test]
    async fn authorized_message_sets_active_chat() {
        let mut h = harness(&[111], &[]);
        handle_update(
            &mut h.bridge,
            update(r#"{"message":{"chat":{"id":111},"text":"/status"}}"#),
        )
        .await;
        assert_eq!(h.bridge.session.active_chat(), Some(111));
        assert!(h.dir.path().join("chat_id").exists());
    }

    #[tokio::test]
    async fn non_text_message_is_ignored() {
        let mut h = harness(&[111], &[]);
        handle_update(
            &mut h.bridge,
            update(r#"{"message":{"chat":{"id":111}}}"#),
        )
        .await;
        assert!(h.chat.calls().is_empty());
    }

    #[tokio::test]
    async fn callback_query_is_answered_and_routed() {
        let mut h = harness(&[111], &[("3", "shell")]);
        handle_update(
            &mut h.bridge,
            update(r#"{"callback_query":{"id":"cb-9","data":"/setpane 3","message":{"chat":{"id":111}}}}"#),
        )
        .await;

        assert_eq!(h.chat.calls()[0], ChatCall::CallbackAnswer("cb-9".into()));
        assert_eq!(h.bridge.session.selected_pane().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn unauthorized_callback_is_rejected_before_anything_else() {
        let mut h = harness(&[111], &[("3", "shell")]);
        handle_update(
            &mut h.bridge,
            update(r#"{"callback_query":{"id":"cb-1","data":"/setpane 3","message":{"chat":{"id":5}}}}"#),
        )
        .await;

        let calls = h.chat.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls.iter().any(|c| matches!(c, ChatCall::CallbackAnswer(_))));
        assert!(h.chat.last_text().unwrap().contains("chat id is 5"));
        assert_eq!(h.bridge.session.selected_pane(), None);
        assert!(h.bridge.session.active_chat().is_none());
    }

    // End-to-end: /panes, /setpane, then free text, through the webhook path.
    #[tokio::test]
    async fn panes_setpane_and_forward() {
        let mut h = harness(&[111], &[("3", "shell")]);

        handle_update(
            &mut h.bridge,
            update(r#"{"message":{"chat":{"id":111},"text":"/panes"}}"#),
        )
        .await;
        let listing = h.chat.last_text().unwrap();
        assert!(listing.contains("3: shell"));
        assert!(!listing.contains('✅'));

        handle_update(
            &mut h.bridge,
            update(r#"{"message":{"chat":{"id":111},"text":"/setpane 3"}}"#),
        )
        .await;
        assert!(h.chat.last_text().unwrap().contains("shell"));
        assert_eq!(
            std::fs::read_to_string(h.dir.path().join("pane_id")).unwrap(),
            "3"
        );

        handle_update(
            &mut h.bridge,
            update(r#"{"message":{"chat":{"id":111},"text":"hello"}}"#),
        )
        .await;
        assert_eq!(
            h.backend.sent(),
            vec![
                Sent::Text("3".into(), "hello".into()),
                Sent::Key("3".into(), Key::Enter)
            ]
        );
        assert!(h.dir.path().join("pending").exists());
        assert!(h.bridge.typing.is_active());
        h.bridge.typing.stop();
    }
}
