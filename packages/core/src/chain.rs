//! Creating, identifying and validating chained messages.
//!
//! Each message is signed over the canonical form of its own fields (minus
//! `signature`) and points at its predecessor by message id:
//!
//! ```text
//! id = "%" + base64( sha256( canonical(message, signature included) ) ) + ".sha256"
//! ```
//!
//! Signatures are ECDSA P-256 / SHA-256 in 64-byte `r || s` form, base64
//! encoded with padding.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::canonical;
use crate::keys::{KeyPair, PublicKey, PublicKeyFromDidError};
use crate::timestamp::next_timestamp;
use crate::types::{Content, Message, HASH_ALGORITHM};
use crate::validation::{self, ShapeError};

/// Errors returned while creating, identifying or validating messages.
///
/// A well-formed message that simply fails verification is *not* an error;
/// [`validate_message`] reports it as `Ok(false)`.
#[derive(Debug, Error, PartialEq)]
pub enum ChainError {
    #[error("content must be an object or an encrypted string")]
    InvalidContent,

    #[error("invalid message shape: {0}")]
    InvalidShape(#[from] ShapeError),

    #[error("signature must be a base64 string: {0}")]
    SignatureInputError(String),

    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    #[error("cannot resolve author key: {0}")]
    Author(#[from] PublicKeyFromDidError),
}

/// Create and sign the next message of a feed.
///
/// With `previous = None` this is the first message (`sequence` 1,
/// `previous` null); otherwise it links to `previous` by id and continues its
/// sequence. The timestamp comes from the process-wide monotonic clock.
///
/// # Errors
///
/// - [`ChainError::InvalidShape`] if the resulting record is not a valid
///   message (e.g. the predecessor's sequence cannot be incremented).
/// - [`ChainError::Canonicalization`] if the record cannot be serialised.
pub fn create_message(
    keys: &KeyPair,
    previous: Option<&Message>,
    content: Content,
) -> Result<Message, ChainError> {
    let (previous_id, sequence) = match previous {
        Some(prev) => {
            let sequence = prev
                .sequence
                .checked_add(1)
                .ok_or_else(|| ShapeError::InvalidSequence(format!("{} + 1", prev.sequence)))?;
            (Some(message_id(prev)?), sequence)
        }
        None => (None, 1),
    };

    let mut message = Message::unsigned(previous_id, sequence, keys.did(), next_timestamp(), content);
    let record = serde_json::to_value(&message).map_err(|e| ChainError::Canonicalization(e.to_string()))?;
    validation::check_shape(&record)?;

    let payload = canonical_payload(&message)?;
    message.signature = Some(STANDARD.encode(keys.sign(&payload)));

    tracing::debug!(
        author = %message.author,
        sequence = message.sequence,
        timestamp = message.timestamp,
        "created message"
    );
    Ok(message)
}

/// Like [`create_message`], but takes arbitrary JSON content.
///
/// # Errors
///
/// [`ChainError::InvalidContent`] unless `content` is an object or a string.
pub fn create_message_from_value(
    keys: &KeyPair,
    previous: Option<&Message>,
    content: Value,
) -> Result<Message, ChainError> {
    let content = Content::from_value(content).ok_or(ChainError::InvalidContent)?;
    create_message(keys, previous, content)
}

/// Check a message's signature and its link to `previous`.
///
/// Returns `Ok(true)` only if both hold:
///
/// 1. `signature` verifies under `public_key` over the canonical form of the
///    message without its signature;
/// 2. with `previous = None`, the message is a first message (`previous`
///    null, `sequence` 1); otherwise `message.previous` equals
///    [`message_id`]`(previous)` and `message.sequence` is one more than
///    `previous.sequence`.
///
/// # Errors
///
/// Only for malformed input: [`ChainError::SignatureInputError`] if the
/// message is unsigned or its signature is not base64, and
/// [`ChainError::Canonicalization`] if a record cannot be serialised. A
/// message that is merely forged, tampered with or unlinked yields
/// `Ok(false)`.
pub fn validate_message(
    message: &Message,
    previous: Option<&Message>,
    public_key: &PublicKey,
) -> Result<bool, ChainError> {
    let signature = message
        .signature
        .as_deref()
        .ok_or_else(|| ChainError::SignatureInputError("message is not signed".into()))?;
    let signature = STANDARD
        .decode(signature)
        .map_err(|e| ChainError::SignatureInputError(e.to_string()))?;

    let payload = canonical_payload(message)?;
    if !public_key.verify(&payload, &signature) {
        tracing::debug!(sequence = message.sequence, "signature does not verify");
        return Ok(false);
    }

    let linked = match previous {
        None => message.previous.is_none() && message.sequence == 1,
        Some(prev) => {
            let expected_id = message_id(prev)?;
            message.previous.as_deref() == Some(expected_id.as_str())
                && prev.sequence.checked_add(1) == Some(message.sequence)
        }
    };
    if !linked {
        tracing::debug!(
            sequence = message.sequence,
            previous = ?message.previous,
            "message does not extend the given predecessor"
        );
    }
    Ok(linked)
}

/// [`validate_message`] against the key embedded in the message's own
/// `author` DID.
///
/// # Errors
///
/// Additionally [`ChainError::Author`] if `author` is not a `did:key` for a
/// P-256 public key.
pub fn validate_message_from_author(
    message: &Message,
    previous: Option<&Message>,
) -> Result<bool, ChainError> {
    let public_key = PublicKey::from_did(&message.author)?;
    validate_message(message, previous, &public_key)
}

/// The id of a message: a hash of its full canonical form, signature
/// included.
pub fn message_id(message: &Message) -> Result<String, ChainError> {
    let bytes = canonical::to_canonical_bytes(message).map_err(|e| ChainError::Canonicalization(e.to_string()))?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("%{}.{HASH_ALGORITHM}", STANDARD.encode(digest)))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// The canonical bytes a message's signature covers: every field except
/// `signature`, in the message's own field order.
fn canonical_payload(message: &Message) -> Result<Vec<u8>, ChainError> {
    canonical::to_canonical_bytes(&message.without_signature())
        .map_err(|e| ChainError::Canonicalization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
