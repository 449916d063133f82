//! Human-readable text rendering of [`Message`]s and feeds.
//!
//! The output is stable plain text suitable for terminals or logs. It is not
//! a canonical format; only the JSON form of a message is signed and hashed.

use serde_json::Value;
use thiserror::Error;

use crate::chain::message_id;
use crate::types::{Content, Message};
use crate::validation::ShapeError;

/// Errors returned by [`render_value`] for input that is not a message or feed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("invalid message: {0}")]
    Message(#[from] ShapeError),

    #[error("feed entry {index} is not a valid message: {source}")]
    FeedEntry { index: usize, source: ShapeError },
}

/// Render untrusted JSON: an array as a feed, anything else as one message.
///
/// Deciding on the top-level kind first means a bad feed entry is reported
/// as itself, with its position, rather than as "not a message".
pub fn render_value(value: Value) -> Result<String, RenderError> {
    match value {
        Value::Array(entries) => {
            let messages = entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| {
                    Message::try_from(entry).map_err(|source| RenderError::FeedEntry { index, source })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(render_feed(&messages))
        }
        other => Ok(render_message(&Message::try_from(other)?)),
    }
}

/// Render a single [`Message`] as indented plain text.
///
/// ```text
/// #2 did:key:z82T5XnCdYQswR8o…  at 1651976991718
/// previous: %Kc0vYv5v9H1xJ0Q8wZ7Yf0E2Yh9a0C6k3m1n5b7d9f0=.sha256
///
///   type: "post"
///   text: "wooo"
///
/// id: %o1wWZb0Pz8m1h2J3k4L5n6P7q8R9s0T1u2V3w4X5y6Z=.sha256
/// ```
pub fn render_message(message: &Message) -> String {
    let mut out = String::new();

    // header line
    out.push_str(&format!(
        "#{} {}  at {}\n",
        message.sequence,
        truncate(&message.author, 32),
        message.timestamp
    ));
    match &message.previous {
        Some(prev) => out.push_str(&format!("previous: {prev}\n")),
        None => out.push_str("previous: (first message)\n"),
    }

    // content
    out.push('\n');
    match &message.content {
        Content::Object(map) if map.is_empty() => out.push_str("  (empty content)\n"),
        Content::Object(map) => {
            for (k, v) in map {
                out.push_str(&format!("  {k}: {v}\n"));
            }
        }
        Content::Encrypted(s) => {
            out.push_str(&format!("  (encrypted, {} chars) {}\n", s.len(), truncate(s, 48)));
        }
    }

    // footer
    out.push('\n');
    match (&message.signature, message_id(message)) {
        (Some(_), Ok(id)) => out.push_str(&format!("id: {id}\n")),
        (None, _) => out.push_str("id: (unsigned)\n"),
        (Some(_), Err(e)) => out.push_str(&format!("id: (unavailable: {e})\n")),
    }

    out
}

/// Render a feed as a one-line-per-message summary.
///
/// ```text
/// Feed did:key:z82T5XnCdYQswR8o…  3 messages
/// ──────────────────────────────────────────
///   #1  1651976991718  {"type":"post","text":"first"}
///   #2  1651976991720  {"type":"post","text":"second"}
///   #3  1651976991725  (encrypted)
/// ```
pub fn render_feed(messages: &[Message]) -> String {
    let total = messages.len();
    let author = messages.first().map(|m| m.author.as_str()).unwrap_or("(empty)");
    let header = format!(
        "Feed {}  {} message{}",
        truncate(author, 32),
        total,
        if total == 1 { "" } else { "s" }
    );
    let rule = "─".repeat(header.chars().count());

    let mut out = format!("{header}\n{rule}\n");
    for m in messages {
        let summary = match &m.content {
            Content::Object(map) => {
                truncate(&serde_json::Value::Object(map.clone()).to_string(), 60)
            }
            Content::Encrypted(_) => "(encrypted)".to_string(),
        };
        out.push_str(&format!("  #{}  {}  {}\n", m.sequence, m.timestamp, summary));
    }
    out
}

// --- helpers -----------------------------------------------------------------

fn truncate(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

// --- tests -------------------------------------------------------------------
