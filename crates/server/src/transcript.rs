//! Transcript JSONL parser
//!
//! Finds the assistant's latest reply in a Claude Code transcript. Lines
//! are scanned from the end; the first record whose role is `assistant`
//! wins, and its text blocks are joined with newlines.

use std::path::Path;

use serde_json::Value;

/// Read `path` and return the latest assistant text, or `None` when the
/// file is unreadable or holds no assistant record.
pub fn last_assistant_message(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    last_assistant_message_in(&content)
}

pub fn last_assistant_message_in(content: &str) -> Option<String> {
    content
        .lines()
        .rev()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str::<Value>(l).ok())
        .find(|record| record_role(record) == Some("assistant"))
        .map(|record| extract_text(&record))
}

/// Role of a record: `message.role`, else top-level `role`, else `type`.
fn record_role(record: &Value) -> Option<&str> {
    record
        .get("message")
        .and_then(|m| m.get("role"))
        .or_else(|| record.get("role"))
        .or_else(|| record.get("type"))
        .and_then(|r| r.as_str())
}

/// Text of a record's content, which is either a string or an array of
/// typed blocks.
fn extract_text(record: &Value) -> String {
    let content = record
        .get("message")
        .and_then(|m| m.get("content"))
        .or_else(|| record.get("content"));

    match content {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}
