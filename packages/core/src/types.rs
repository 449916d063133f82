//! Core data types for the message chain.
//!
//! A [`Message`] is the unit of an author's feed. Its JSON form is also its
//! signed and hashed form, so the **order** of its fields is part of the wire
//! contract:
//!
//! | # | Field | JSON type |
//! |---|-------|-----------|
//! | 1 | `previous` | id string, or `null` for the first message |
//! | 2 | `sequence` | positive integer (may swap places with `author`) |
//! | 3 | `author` | `did:key` string (may swap places with `sequence`) |
//! | 4 | `timestamp` | integer, Unix milliseconds |
//! | 5 | `hash` | always `"sha256"` |
//! | 6 | `content` | object, or a string holding an encrypted payload |
//! | 7 | `signature` | base64 ECDSA signature; present only once signed |
//!
//! [`Message`] serialises its fields in exactly this order (with
//! `sequence`/`author` following [`Message::field_order`]) and deserialises
//! only through [`crate::validation`], so a record with missing, mistyped or
//! reordered fields never becomes a `Message`.

use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::validation::{self, ShapeError};

/// The only hash algorithm tag a message may carry.
pub const HASH_ALGORITHM: &str = "sha256";

/// The payload of a message.
///
/// Serialises untagged: an object is written as a JSON object, an encrypted
/// payload as a bare string. This layer never decrypts anything; a string is
/// simply passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// A structured payload, keys kept in insertion order.
    Object(Map<String, Value>),
    /// An opaque, already-encrypted payload.
    Encrypted(String),
}

impl Content {
    /// Accept an object or a string; anything else is not valid content.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Content::Object(map)),
            Value::String(s) => Some(Content::Encrypted(s)),
            _ => None,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, Content::Encrypted(_))
    }

    /// The object payload, if this content is not encrypted.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Content::Object(map) => Some(map),
            Content::Encrypted(_) => None,
        }
    }
}

impl From<Map<String, Value>> for Content {
    fn from(map: Map<String, Value>) -> Self {
        Content::Object(map)
    }
}

/// Which of the two accepted orders `sequence` and `author` appear in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOrder {
    /// `previous, sequence, author, ...`, which this crate writes.
    #[default]
    SequenceFirst,
    /// `previous, author, sequence, ...`, accepted from other writers.
    AuthorFirst,
}

/// A single entry in an author's append-only feed.
///
/// Messages are immutable once signed. Build new ones with
/// [`create_message`](crate::create_message); accept foreign ones with
/// `serde_json::from_str`, which runs the full shape check.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Id of the preceding message, `None` for the first message.
    pub previous: Option<String>,

    /// 1 for the first message, then one more than the predecessor.
    pub sequence: u64,

    /// `did:key` DID of the signer.
    pub author: String,

    /// Unix milliseconds; strictly increasing per author.
    pub timestamp: u64,

    /// Hash algorithm tag, [`HASH_ALGORITHM`].
    pub hash: String,

    pub content: Content,

    /// Base64 signature over the canonical form of the fields above.
    pub signature: Option<String>,

    /// Serialisation order of `sequence` and `author`. Not itself a field.
    pub field_order: FieldOrder,
}

impl Message {
    /// An unsigned record with fields in the default order.
    pub fn unsigned(
        previous: Option<String>,
        sequence: u64,
        author: impl Into<String>,
        timestamp: u64,
        content: Content,
    ) -> Self {
        Self {
            previous,
            sequence,
            author: author.into(),
            timestamp,
            hash: HASH_ALGORITHM.to_string(),
            content,
            signature: None,
            field_order: FieldOrder::default(),
        }
    }

    /// The author's DID.
    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// A copy of this message with the signature detached. Its canonical
    /// form is what the signature covers.
    pub fn without_signature(&self) -> Self {
        Self {
            signature: None,
            ..self.clone()
        }
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.signature.is_some() { 7 } else { 6 };
        let mut s = serializer.serialize_struct("Message", len)?;
        s.serialize_field("previous", &self.previous)?;
        match self.field_order {
            FieldOrder::SequenceFirst => {
                s.serialize_field("sequence", &self.sequence)?;
                s.serialize_field("author", &self.author)?;
            }
            FieldOrder::AuthorFirst => {
                s.serialize_field("author", &self.author)?;
                s.serialize_field("sequence", &self.sequence)?;
            }
        }
        s.serialize_field("timestamp", &self.timestamp)?;
        s.serialize_field("hash", &self.hash)?;
        s.serialize_field("content", &self.content)?;
        if let Some(signature) = &self.signature {
            s.serialize_field("signature", signature)?;
        }
        s.end()
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        validation::parse_message(&value).map_err(D::Error::custom)
    }
}

impl TryFrom<Value> for Message {
    type Error = ShapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        validation::parse_message(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content() -> Content {
        Content::from_value(json!({ "type": "post", "text": "ok" })).unwrap()
    }

    #[test]
    fn serialises_in_wire_order() {
        let msg = Message::unsigned(None, 1, "did:key:zAuthor", 42, content());
        let value = serde_json::to_value(&msg).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["previous", "sequence", "author", "timestamp", "hash", "content"]);
        assert_eq!(value["previous"], Value::Null);
    }

    #[test]
    fn author_first_order_is_kept() {
        let mut msg = Message::unsigned(None, 1, "did:key:zAuthor", 42, content());
        msg.field_order = FieldOrder::AuthorFirst;
        msg.signature = Some("c2ln".into());
        let value = serde_json::to_value(&msg).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["previous", "author", "sequence", "timestamp", "hash", "content", "signature"]
        );
    }

    #[test]
    fn json_round_trip_preserves_order_and_content() {
        let mut msg = Message::unsigned(Some("%abc=.sha256".into()), 2, "did:key:zAuthor", 42, content());
        msg.field_order = FieldOrder::AuthorFirst;
        msg.signature = Some("c2ln".into());
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn content_accepts_object_or_string_only() {
        assert!(Content::from_value(json!({})).is_some());
        assert!(Content::from_value(json!("ciphertext")).unwrap().is_encrypted());
        assert!(Content::from_value(json!(5)).is_none());
        assert!(Content::from_value(json!(["a"])).is_none());
        assert!(Content::from_value(Value::Null).is_none());
    }

    #[test]
    fn encrypted_content_serialises_as_string() {
        let msg = Message::unsigned(None, 1, "did:key:zAuthor", 42, Content::Encrypted("Ym94".into()));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["content"], json!("Ym94"));
    }

    #[test]
    fn without_signature_detaches_only_the_signature() {
        let mut msg = Message::unsigned(None, 1, "did:key:zAuthor", 42, content());
        msg.signature = Some("c2ln".into());
        let bare = msg.without_signature();
        assert!(!bare.is_signed());
        assert_eq!(bare.timestamp, msg.timestamp);
        assert_eq!(bare.content, msg.content);
    }
}
