//! `did:key` encoding and decoding with multicodec magic-byte dispatch.
//!
//! A DID is derived by prefixing the raw public key with a short algorithm
//! tag and base58btc-encoding the result:
//!
//! ```text
//! did:key:z <base58btc( prefix ++ public_key_bytes )>
//! ```
//!
//! | Algorithm | Prefix bytes |
//! |-----------|--------------|
//! | RSA | `[0x00, 0xf5, 0x02]` |
//! | Ed25519 | `[0xed, 0x01]` |
//! | BLS12-381 | `[0xea, 0x01]` |
//!
//! Decoding checks the prefixes in the fixed order of [`KeyAlgorithm::ALL`].
//! No prefix is a prefix of another, so the first match is the only match.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Everything a `did:key` string starts with: the method plus the `z`
/// multibase tag for base58btc.
pub const DID_KEY_PREFIX: &str = "did:key:z";

/// Errors returned while encoding or decoding a `did:key`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DidError {
    #[error("malformed DID: {0}")]
    MalformedDid(String),

    #[error("unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// The key algorithms a `did:key` can be tagged with.
///
/// Displays and parses as the lowercase tag used on the wire
/// (`"rsa"`, `"ed25519"`, `"bls12-381"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Rsa,
    Ed25519,
    Bls12381,
}

impl KeyAlgorithm {
    /// Every algorithm, in the order prefixes are tried when decoding.
    pub const ALL: [KeyAlgorithm; 3] = [KeyAlgorithm::Rsa, KeyAlgorithm::Ed25519, KeyAlgorithm::Bls12381];

    /// The multicodec magic bytes identifying this algorithm.
    pub const fn prefix(self) -> &'static [u8] {
        match self {
            KeyAlgorithm::Rsa => &[0x00, 0xf5, 0x02],
            KeyAlgorithm::Ed25519 => &[0xed, 0x01],
            KeyAlgorithm::Bls12381 => &[0xea, 0x01],
        }
    }

    /// The lowercase wire tag, e.g. `"ed25519"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            KeyAlgorithm::Rsa => "rsa",
            KeyAlgorithm::Ed25519 => "ed25519",
            KeyAlgorithm::Bls12381 => "bls12-381",
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a [`KeyAlgorithm`] from its wire tag.
///
/// Returns [`DidError::UnsupportedAlgorithm`] for anything else.
impl FromStr for KeyAlgorithm {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyAlgorithm::ALL
            .into_iter()
            .find(|algo| algo.as_str() == s)
            .ok_or_else(|| DidError::UnsupportedAlgorithm(format!("unknown algorithm tag {s:?}")))
    }
}

/// Whether `buf` starts with `prefix`.
///
/// Compares only the leading `prefix.len()` bytes and returns `false` when
/// `buf` is shorter than the prefix.
pub fn has_prefix(buf: &[u8], prefix: &[u8]) -> bool {
    match buf.get(..prefix.len()) {
        Some(head) => head == prefix,
        None => false,
    }
}

/// Encode a raw public key as a `did:key` string.
pub fn encode(public_key: &[u8], algorithm: KeyAlgorithm) -> String {
    let prefix = algorithm.prefix();
    let mut prefixed = Vec::with_capacity(prefix.len() + public_key.len());
    prefixed.extend_from_slice(prefix);
    prefixed.extend_from_slice(public_key);
    format!("{DID_KEY_PREFIX}{}", bs58::encode(prefixed).into_string())
}

/// Like [`encode`], but takes the algorithm as its wire tag.
///
/// # Errors
///
/// [`DidError::UnsupportedAlgorithm`] if `tag` names no known algorithm.
pub fn encode_with_tag(public_key: &[u8], tag: &str) -> Result<String, DidError> {
    let algorithm: KeyAlgorithm = tag.parse()?;
    Ok(encode(public_key, algorithm))
}

/// Decode a `did:key` string back into its raw public key and algorithm.
///
/// # Errors
///
/// - [`DidError::MalformedDid`] if `did` does not start with `did:key:z` or
///   the remainder is not valid base58btc.
/// - [`DidError::UnsupportedAlgorithm`] if the decoded bytes carry no known
///   prefix.
pub fn decode(did: &str) -> Result<(Vec<u8>, KeyAlgorithm), DidError> {
    let encoded = did.strip_prefix(DID_KEY_PREFIX).ok_or_else(|| {
        DidError::MalformedDid(format!("expected a base58btc DID of the form `{DID_KEY_PREFIX}...`"))
    })?;

    let decoded = bs58::decode(encoded)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()
        .map_err(|e| DidError::MalformedDid(format!("base58 decode failed: {e}")))?;

    parse_magic_bytes(&decoded)
        .map(|(algorithm, key)| (key.to_vec(), algorithm))
        .ok_or_else(|| DidError::UnsupportedAlgorithm("no known multicodec prefix".into()))
}

/// Split a prefixed key buffer into its algorithm and unprefixed key bytes.
fn parse_magic_bytes(prefixed: &[u8]) -> Option<(KeyAlgorithm, &[u8])> {
    KeyAlgorithm::ALL
        .into_iter()
        .find(|algo| has_prefix(prefixed, algo.prefix()))
        .map(|algo| (algo, &prefixed[algo.prefix().len()..]))
}
