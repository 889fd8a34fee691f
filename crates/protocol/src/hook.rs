//! Completion-hook payloads
//!
//! `StopHookInput` is what Claude Code writes to the hook's stdin;
//! `HookCallback` is what the hook process POSTs to the bridge's `/hook`.

use serde::{Deserialize, Serialize};

/// Stdin envelope handed to a Claude Code hook command.
#[derive(Debug, Clone, Deserialize)]
pub struct StopHookInput {
    pub hook_event_name: String,
    #[serde(default)]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Body of `POST /hook`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookCallback {
    pub message: String,
    #[serde(default)]
    pub cwd: String,
    #[serde(rename = "sessionId", default)]
    pub session_id: String,
}

/// Reply body of `POST /hook`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookReply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HookReply {
    pub fn ok() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    pub fn muted() -> Self {
        Self {
            ok: true,
            muted: Some(true),
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self {
            ok: true,
            empty: Some(true),
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_uses_camel_case_session_id() {
        let cb: HookCallback =
            serde_json::from_str(r#"{"message":"hi","cwd":"/tmp","sessionId":"abc"}"#).unwrap();
        assert_eq!(cb.session_id, "abc");

        let json = serde_json::to_value(&cb).unwrap();
        assert_eq!(json["sessionId"], "abc");
    }

    #[test]
    fn reply_omits_unset_flags() {
        let json = serde_json::to_value(HookReply::muted()).unwrap();
        assert_eq!(json, serde_json::json!({"ok": true, "muted": true}));

        let json = serde_json::to_value(HookReply::ok()).unwrap();
        assert_eq!(json, serde_json::json!({"ok": true}));
    }

    #[test]
    fn stop_input_tolerates_extra_fields() {
        let input: StopHookInput = serde_json::from_str(
            r#"{"hook_event_name":"Stop","transcript_path":"~/t.jsonl","cwd":"/w","session_id":"s","stop_hook_active":false}"#,
        )
        .unwrap();
        assert_eq!(input.hook_event_name, "Stop");
        assert_eq!(input.transcript_path.as_deref(), Some("~/t.jsonl"));
    }
}
