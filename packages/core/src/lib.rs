//! Self-certifying identities and append-only signed message chains.
//!
//! An author is identified by a `did:key` DID derived from their public key.
//! Everything they publish goes into a feed: a sequence of signed messages
//! where every message names the id (a hash) of the one before it, so anyone
//! holding the author's DID can check both who wrote a message and where it
//! sits in the feed.
//!
//! This crate has **no I/O**. Transport, persistence and key storage belong to
//! the host; the library builds, identifies and validates messages.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`canonical`] | Deterministic JSON bytes used for signing and hashing |
//! | [`did`] | `did:key` encode/decode with multicodec prefix dispatch |
//! | [`keys`] | P-256 [`KeyPair`] generation, export, import and DID derivation |
//! | [`types`] | [`Message`], [`Content`], [`FieldOrder`] |
//! | [`validation`] | Structural checks via [`check_shape`] |
//! | [`chain`] | [`create_message`], [`validate_message`], [`message_id`] |
//! | [`feed`] | In-memory [`Feed`] and whole-feed verification |
//! | [`timestamp`] | Process-wide monotonic message timestamps |
//! | [`render`] | Human-readable text rendering of messages and feeds |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use sigchain::{create_message_from_value, validate_message, KeyPair};
//!
//! let keys = KeyPair::generate();
//! let first = create_message_from_value(&keys, None, serde_json::json!({ "type": "post", "text": "hi" }))?;
//! let second = create_message_from_value(&keys, Some(&first), serde_json::json!({ "type": "post", "text": "again" }))?;
//!
//! assert!(validate_message(&second, Some(&first), keys.public_key())?);
//! ```

pub mod canonical;
pub mod chain;
pub mod did;
pub mod feed;
pub mod keys;
pub mod render;
pub mod timestamp;
pub mod types;
pub mod validation;

pub use chain::{
    create_message, create_message_from_value, message_id, validate_message,
    validate_message_from_author, ChainError,
};
pub use did::{DidError, KeyAlgorithm};
pub use feed::{verify_feed, Feed, FeedError};
pub use keys::{public_key_to_did, ExportedKeys, KeyError, KeyPair, PublicKey, PublicKeyFromDidError};
pub use types::{Content, FieldOrder, Message};
pub use validation::{check_shape, ShapeError};
