use thiserror::Error;

use crate::chain::{create_message, validate_message, ChainError};
use crate::keys::{KeyPair, PublicKey};
use crate::types::{Content, Message};

/// Errors returned when a message cannot join a [`Feed`].
#[derive(Debug, Error, PartialEq)]
pub enum FeedError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("message {sequence} does not validate against the feed tip")]
    Rejected { sequence: u64 },

    #[error("message author {found} is not the feed author {expected}")]
    WrongAuthor { expected: String, found: String },
}

/// A local, in-memory, append-only sequence of one author's messages.
///
/// The feed is not a storage engine. Load messages from wherever you keep
/// them, append them here in order, and every append is checked against the
/// current tip. [`Feed::publish`] authors the next message directly.
#[derive(Debug, Clone)]
pub struct Feed {
    public_key: PublicKey,
    author: String,
    messages: Vec<Message>,
}

impl Feed {
    /// Create an empty feed for the author owning `public_key`.
    pub fn new(public_key: PublicKey) -> Self {
        let author = public_key.to_did();
        Self {
            public_key,
            author,
            messages: Vec::new(),
        }
    }

    /// Build a feed from messages in sequence order, validating each one.
    pub fn from_messages(
        public_key: PublicKey,
        messages: impl IntoIterator<Item = Message>,
    ) -> Result<Self, FeedError> {
        let mut feed = Self::new(public_key);
        for m in messages {
            feed.append(m)?;
        }
        Ok(feed)
    }

    /// Append a message received from elsewhere.
    ///
    /// The message must be by this feed's author and must validate against
    /// the current tip (or as a first message when the feed is empty).
    pub fn append(&mut self, message: Message) -> Result<(), FeedError> {
        if message.author != self.author {
            return Err(FeedError::WrongAuthor {
                expected: self.author.clone(),
                found: message.author,
            });
        }
        if !validate_message(&message, self.latest(), &self.public_key)? {
            tracing::warn!(sequence = message.sequence, author = %self.author, "rejected message");
            return Err(FeedError::Rejected {
                sequence: message.sequence,
            });
        }
        self.messages.push(message);
        Ok(())
    }

    /// Create, sign and append the next message.
    ///
    /// `keys` must belong to this feed's author.
    pub fn publish(&mut self, keys: &KeyPair, content: Content) -> Result<&Message, FeedError> {
        if keys.public_key() != &self.public_key {
            return Err(FeedError::WrongAuthor {
                expected: self.author.clone(),
                found: keys.did(),
            });
        }
        let message = create_message(keys, self.latest(), content)?;
        self.messages.push(message);
        Ok(&self.messages[self.messages.len() - 1])
    }

    /// The most recent message, if any.
    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The author's DID.
    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All messages, first to latest.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

/// Check a whole feed from its first message, in order.
///
/// Returns `Ok(false)` as soon as one message fails [`validate_message`]
/// against its predecessor; an empty slice is trivially valid.
pub fn verify_feed(messages: &[Message], public_key: &PublicKey) -> Result<bool, ChainError> {
    let mut previous = None;
    for m in messages {
        if !validate_message(m, previous, public_key)? {
            tracing::debug!(sequence = m.sequence, "feed breaks at message");
            return Ok(false);
        }
        previous = Some(m);
    }
    Ok(true)
}
