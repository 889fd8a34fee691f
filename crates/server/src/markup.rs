//! Markdown → Telegram HTML conversion.
//!
//! Handles the subset Claude actually emits in short replies: fenced code,
//! inline code, bold, italic, underline and strikethrough. Code is lifted
//! out into placeholders first so emphasis rules never touch it, then put
//! back at the end.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Telegram rejects messages over 4096 chars; keep headroom for the header.
pub const MAX_MESSAGE_CHARS: usize = 4000;

// NUL is stripped from the input, so these markers cannot collide with
// user text.
const PLACEHOLDER_OPEN: char = '\u{0}';
const PLACEHOLDER_CLOSE: char = '\u{0}';

static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:([A-Za-z0-9_+#.-]+)[ \t]*\n|\n?)(.*?)```").expect("valid regex"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").expect("valid regex"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:lt|gt|amp|quot|#[0-9]+|#[xX][0-9A-Fa-f]+);").expect("valid regex")
});
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\n]+?)\*").expect("valid regex"));
static UNDERLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__(.+?)__").expect("valid regex"));
static STRIKE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~(.+?)~~").expect("valid regex"));

/// Convert Markdown to Telegram's HTML parse mode.
pub fn markdown_to_html(input: &str) -> String {
    let text: String = input.chars().filter(|&c| c != PLACEHOLDER_OPEN).collect();
    let mut protected: Vec<String> = Vec::new();

    let text = FENCED_CODE.replace_all(&text, |caps: &Captures| {
        let lang = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let body = escape_literal(caps.get(2).map(|m| m.as_str()).unwrap_or_default());
        let body = body.strip_suffix('\n').unwrap_or(&body);
        let html = if lang.is_empty() {
            format!("<pre>{body}</pre>")
        } else {
            format!("<pre><code class=\"language-{lang}\">{body}</code></pre>")
        };
        stash(&mut protected, html)
    });

    let text = INLINE_CODE.replace_all(&text, |caps: &Captures| {
        let html = format!("<code>{}</code>", escape_literal(&caps[1]));
        stash(&mut protected, html)
    });

    let text = escape_html(&text);

    let text = BOLD.replace_all(&text, "<b>$1</b>");
    let text = ITALIC.replace_all(&text, "<i>$1</i>");
    let text = UNDERLINE.replace_all(&text, "<u>$1</u>");
    let text = STRIKE.replace_all(&text, "<s>$1</s>");

    let mut out = text.into_owned();
    for (idx, html) in protected.iter().enumerate().rev() {
        out = out.replace(&placeholder(idx), html);
    }
    out
}

fn placeholder(idx: usize) -> String {
    format!("{PLACEHOLDER_OPEN}CODE{idx}{PLACEHOLDER_CLOSE}")
}

fn stash(protected: &mut Vec<String>, html: String) -> String {
    protected.push(html);
    placeholder(protected.len() - 1)
}

/// Escape `&`, `<`, `>` exactly. Used for code, which must show its own
/// characters.
pub fn escape_literal(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape `&`, `<`, `>` in prose. An `&` that already starts an entity
/// Telegram understands is kept, so escaping is idempotent.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (idx, ch) in text.char_indices() {
        match ch {
            '&' if ENTITY.is_match(&text[idx..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Cut to the chat length ceiling on a char boundary. May split a tag.
pub fn truncate_for_chat(text: &str) -> String {
    match text.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
