//! Telegram Bot API client.
//!
//! `ChatApi` is the outbound surface the bridge uses; `TelegramClient` is
//! the reqwest-backed implementation. Failures are returned as
//! `BridgeError::UpstreamApi` and never retried, except the HTML send,
//! which falls back once to plain text when Telegram cannot parse it.

use std::time::Duration;

use async_trait::async_trait;
use chatpane_protocol::{ApiResponse, BotCommand, InlineKeyboardButton};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::warn;

use crate::error::BridgeError;
use crate::markup::truncate_for_chat;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    Html,
}

pub type Keyboard = Vec<Vec<InlineKeyboardButton>>;

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        mode: ParseMode,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), BridgeError>;

    async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), BridgeError>;

    async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), BridgeError>;

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), BridgeError>;
}

pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, base: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, BridgeError> {
        let url = format!("{}/bot{}/{}", self.base, self.token, method);
        // `without_url` keeps the bot token out of error text and logs.
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| BridgeError::UpstreamApi(e.without_url().to_string()))?;

        let status = resp.status();
        let parsed: ApiResponse<T> = resp
            .json()
            .await
            .map_err(|e| BridgeError::UpstreamApi(format!("{status}: {}", e.without_url())))?;

        if !parsed.ok {
            return Err(BridgeError::UpstreamApi(
                parsed
                    .description
                    .unwrap_or_else(|| format!("{method} failed with {status}")),
            ));
        }
        parsed
            .result
            .ok_or_else(|| BridgeError::UpstreamApi(format!("{method} missing result")))
    }
}

#[async_trait]
impl ChatApi for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        mode: ParseMode,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), BridgeError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        if mode == ParseMode::Html {
            payload["parse_mode"] = json!("HTML");
        }
        if let Some(rows) = keyboard {
            payload["reply_markup"] = json!({ "inline_keyboard": rows });
        }
        self.call::<Value>("sendMessage", &payload).await.map(|_| ())
    }

    async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), BridgeError> {
        let payload = json!({ "chat_id": chat_id, "action": action });
        self.call::<Value>("sendChatAction", &payload).await.map(|_| ())
    }

    async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), BridgeError> {
        let payload = json!({ "commands": commands });
        self.call::<Value>("setMyCommands", &payload).await.map(|_| ())
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), BridgeError> {
        let payload = json!({ "callback_query_id": callback_query_id });
        self.call::<Value>("answerCallbackQuery", &payload)
            .await
            .map(|_| ())
    }
}

fn is_entity_parse_error(err: &BridgeError) -> bool {
    matches!(err, BridgeError::UpstreamApi(desc) if desc.to_lowercase().contains("parse entities"))
}

/// Send `html`; if Telegram rejects the markup, resend `plain` once
/// without a parse mode. Both are truncated to the chat ceiling.
pub async fn send_html(
    api: &dyn ChatApi,
    chat_id: i64,
    html: &str,
    plain: &str,
) -> Result<(), BridgeError> {
    let html = truncate_for_chat(html);
    match api.send_message(chat_id, &html, ParseMode::Html, None).await {
        Err(e) if is_entity_parse_error(&e) => {
            warn!(
                component = "telegram",
                event = "telegram.html_fallback",
                chat_id,
                error = %e,
                "HTML rejected, resending as plain text"
            );
            api.send_message(chat_id, &truncate_for_chat(plain), ParseMode::Plain, None)
                .await
        }
        other => other,
    }
}

/// Reply with plain text, logging instead of failing.
pub async fn reply(api: &dyn ChatApi, chat_id: i64, text: &str) {
    reply_with(api, chat_id, text, ParseMode::Plain, None).await;
}

pub async fn reply_with(
    api: &dyn ChatApi,
    chat_id: i64,
    text: &str,
    mode: ParseMode,
    keyboard: Option<&Keyboard>,
) {
    if let Err(e) = api
        .send_message(chat_id, &truncate_for_chat(text), mode, keyboard)
        .await
    {
        warn!(
            component = "telegram",
            event = "telegram.send_failed",
            chat_id,
            error = %e,
            "Failed to send chat reply"
        );
    }
}
