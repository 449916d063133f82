use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{Content, FieldOrder, Message, HASH_ALGORITHM};

/// Field names in the order they are written, signed and hashed.
const SEQUENCE_FIRST: [&str; 7] = [
    "previous",
    "sequence",
    "author",
    "timestamp",
    "hash",
    "content",
    "signature",
];

/// The one permitted variation: `author` before `sequence`.
const AUTHOR_FIRST: [&str; 7] = [
    "previous",
    "author",
    "sequence",
    "timestamp",
    "hash",
    "content",
    "signature",
];

/// Errors returned when a message record is structurally invalid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("message must be a JSON object")]
    NotAnObject,

    #[error("message is missing required field {0:?}")]
    MissingField(&'static str),

    #[error("message has unexpected field {0:?}")]
    UnexpectedField(String),

    #[error("message must have exactly {expected} fields, got {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("message fields are out of order: [{0}]")]
    FieldOrder(String),

    #[error("previous must be null or a message id string")]
    InvalidPrevious,

    #[error("sequence must be a positive integer, got {0}")]
    InvalidSequence(String),

    #[error("author must be a non-empty string")]
    InvalidAuthor,

    #[error("timestamp must be a non-negative integer, got {0}")]
    InvalidTimestamp(String),

    #[error("hash must be \"sha256\", got {0:?}")]
    UnsupportedHash(String),

    #[error("content must be an object or an encrypted string")]
    InvalidContent,

    #[error("signature must be a string")]
    InvalidSignature,

    #[error("the first message must have sequence 1 and previous null (sequence {sequence})")]
    GenesisMismatch { sequence: u64 },
}

/// Check the structure of an untrusted JSON message record.
///
/// A record passes when:
///
/// - its fields are exactly `previous, sequence, author, timestamp, hash,
///   content`, in that order, with `sequence`/`author` allowed to swap, plus a
///   trailing `signature` if it is signed (7 fields in total);
/// - `previous` is `null` or a string, `sequence` a positive integer,
///   `author` a non-empty string and `timestamp` an integer;
/// - `hash` is `"sha256"`;
/// - `content` is an object or an encrypted string;
/// - `previous` is `null` exactly when `sequence` is 1.
///
/// Returns the first violation found, checking presence, then order, then
/// field types in wire order.
pub fn check_shape(value: &Value) -> Result<(), ShapeError> {
    parse_message(value).map(|_| ())
}

/// Structural checks that still apply to an already-typed [`Message`].
pub fn validate_shape(message: &Message) -> Result<(), ShapeError> {
    if message.sequence == 0 {
        return Err(ShapeError::InvalidSequence("0".into()));
    }
    if message.author.is_empty() {
        return Err(ShapeError::InvalidAuthor);
    }
    if message.hash != HASH_ALGORITHM {
        return Err(ShapeError::UnsupportedHash(message.hash.clone()));
    }
    if (message.sequence == 1) != message.previous.is_none() {
        return Err(ShapeError::GenesisMismatch {
            sequence: message.sequence,
        });
    }
    Ok(())
}

/// Build a [`Message`] from untrusted JSON, enforcing [`check_shape`].
pub(crate) fn parse_message(value: &Value) -> Result<Message, ShapeError> {
    let obj = value.as_object().ok_or(ShapeError::NotAnObject)?;
    let field_order = check_field_order(obj)?;

    let previous = match &obj["previous"] {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        _ => return Err(ShapeError::InvalidPrevious),
    };

    let sequence = obj["sequence"]
        .as_u64()
        .ok_or_else(|| ShapeError::InvalidSequence(obj["sequence"].to_string()))?;

    let author = match &obj["author"] {
        Value::String(s) => s.clone(),
        _ => return Err(ShapeError::InvalidAuthor),
    };

    let timestamp = obj["timestamp"]
        .as_u64()
        .ok_or_else(|| ShapeError::InvalidTimestamp(obj["timestamp"].to_string()))?;

    let hash = match &obj["hash"] {
        Value::String(s) => s.clone(),
        other => return Err(ShapeError::UnsupportedHash(other.to_string())),
    };

    let content = Content::from_value(obj["content"].clone()).ok_or(ShapeError::InvalidContent)?;

    let signature = match obj.get("signature") {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(ShapeError::InvalidSignature),
    };

    let message = Message {
        previous,
        sequence,
        author,
        timestamp,
        hash,
        content,
        signature,
        field_order,
    };
    validate_shape(&message)?;
    Ok(message)
}

fn check_field_order(obj: &Map<String, Value>) -> Result<FieldOrder, ShapeError> {
    let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
    let expected = if obj.contains_key("signature") { 7 } else { 6 };

    if keys == SEQUENCE_FIRST[..expected] {
        return Ok(FieldOrder::SequenceFirst);
    }
    if keys == AUTHOR_FIRST[..expected] {
        return Ok(FieldOrder::AuthorFirst);
    }

    // Work out the most useful description of what is wrong.
    if let Some(missing) = SEQUENCE_FIRST[..expected].iter().find(|f| !obj.contains_key(**f)) {
        return Err(ShapeError::MissingField(*missing));
    }
    if let Some(extra) = keys.iter().find(|k| !SEQUENCE_FIRST.contains(k)) {
        return Err(ShapeError::UnexpectedField((*extra).to_string()));
    }
    if keys.len() != expected {
        return Err(ShapeError::FieldCount {
            expected,
            found: keys.len(),
        });
    }
    Err(ShapeError::FieldOrder(keys.join(", ")))
}

// --- tests -------------------------------------------------------------------
