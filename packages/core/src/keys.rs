//! Signing keypairs: ECDSA P-256 keys and their `did:key` identity.
//!
//! Like the rest of this crate, key handling does no I/O. The host is
//! responsible for persisting the exported form and passing it back on
//! restart:
//!
//! ```text
//! First run:
//!   keys     = KeyPair::generate()
//!   exported = keys.export()?        // persist this, it contains the private key
//!   did      = keys.did()
//!
//! Subsequent runs:
//!   keys = KeyPair::import(&exported)?
//!   // same DID as before
//! ```
//!
//! # Key formats
//!
//! | Half | At-rest form |
//! |------|--------------|
//! | public | base64 (padded) of the 65-byte uncompressed SEC1 point |
//! | private | base64 (padded) of the PKCS#8 DER document |
//!
//! The exported private key is not encrypted. Protecting it is the caller's
//! job.
//!
//! # Algorithm label
//!
//! Signatures are ECDSA over P-256 with SHA-256, yet the DID derived from the
//! public key carries the Ed25519 multicodec prefix (see
//! [`DID_KEY_ALGORITHM`]). Other implementations of this chain format label
//! their keys the same way, so the label is kept as-is for interoperability.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::did::{self, DidError, KeyAlgorithm};

/// The algorithm tag written into DIDs derived from P-256 keys.
pub const DID_KEY_ALGORITHM: KeyAlgorithm = KeyAlgorithm::Ed25519;

/// Errors returned while exporting or importing key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("failed to import key: {0}")]
    ImportError(String),

    #[error("failed to export key: {0}")]
    ExportError(String),
}

/// The portable, at-rest representation of a [`KeyPair`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedKeys {
    /// Base64 of the raw (uncompressed SEC1) public key.
    pub public: String,
    /// Base64 of the PKCS#8 DER private key. **Keep this secret.**
    pub private: String,
}

/// An author's signing identity.
///
/// The stable public identity is the `did:key` DID returned by
/// [`KeyPair::did`], derived entirely from the public key.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generate a fresh P-256 keypair using OS randomness.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        tracing::debug!("generated new P-256 signing key");
        Self::from_signing_key(signing_key)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = PublicKey(VerifyingKey::from(&signing_key));
        Self {
            signing_key,
            public_key,
        }
    }

    /// Export both halves as base64 strings.
    ///
    /// # Errors
    ///
    /// [`KeyError::ExportError`] if PKCS#8 encoding fails.
    pub fn export(&self) -> Result<ExportedKeys, KeyError> {
        let der = self
            .signing_key
            .to_pkcs8_der()
            .map_err(|e| KeyError::ExportError(format!("PKCS#8 encoding failed: {e}")))?;
        Ok(ExportedKeys {
            public: self.public_key.to_base64(),
            private: STANDARD.encode(der.as_bytes()),
        })
    }

    /// Rebuild a keypair from its exported form.
    ///
    /// # Errors
    ///
    /// [`KeyError::ImportError`] if either half is not valid base64, the
    /// private half is not a PKCS#8 P-256 key, the public half is not a
    /// P-256 point, or the two halves do not belong together.
    pub fn import(exported: &ExportedKeys) -> Result<Self, KeyError> {
        let der = STANDARD
            .decode(&exported.private)
            .map_err(|e| KeyError::ImportError(format!("private key is not base64: {e}")))?;
        let signing_key = SigningKey::from_pkcs8_der(&der)
            .map_err(|e| KeyError::ImportError(format!("private key is not PKCS#8 P-256: {e}")))?;

        let public_key = PublicKey::from_base64(&exported.public)?;
        let keys = Self::from_signing_key(signing_key);
        if keys.public_key != public_key {
            return Err(KeyError::ImportError(
                "public key does not match private key".into(),
            ));
        }
        Ok(keys)
    }

    /// The public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The author's `did:key` DID.
    pub fn did(&self) -> String {
        self.public_key.to_did()
    }

    /// Sign `message` with ECDSA P-256 / SHA-256 and return the 64-byte
    /// `r || s` signature.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing_key.sign(message);
        signature.to_bytes().to_vec()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("did", &self.did())
            .finish_non_exhaustive()
    }
}

/// A P-256 verifying key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Parse a raw SEC1 point (compressed or uncompressed).
    pub fn from_raw(bytes: &[u8]) -> Result<Self, KeyError> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|e| KeyError::ImportError(format!("invalid P-256 public key: {e}")))
    }

    /// Parse the base64 form of a raw public key.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| KeyError::ImportError(format!("public key is not base64: {e}")))?;
        Self::from_raw(&bytes)
    }

    /// Resolve the public key embedded in a `did:key`.
    ///
    /// The algorithm tag is not consulted: every key this crate signs with is
    /// P-256, whatever its DID label says.
    pub fn from_did(did: &str) -> Result<Self, PublicKeyFromDidError> {
        let (bytes, _algorithm) = did::decode(did)?;
        Ok(Self::from_raw(&bytes)?)
    }

    /// The 65-byte uncompressed SEC1 encoding.
    pub fn to_raw(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_raw())
    }

    pub fn to_did(&self) -> String {
        did::encode(&self.to_raw(), DID_KEY_ALGORITHM)
    }

    /// Check a 64-byte `r || s` signature over `message`.
    ///
    /// Returns `false` for a signature of the wrong length as well as for one
    /// that does not verify.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        self.0.verify(message, &signature).is_ok()
    }
}

/// Errors returned by [`PublicKey::from_did`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PublicKeyFromDidError {
    #[error(transparent)]
    Did(#[from] DidError),
    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Encode a base64 raw public key as a `did:key`.
pub fn public_key_to_did(public_base64: &str) -> Result<String, KeyError> {
    let bytes = STANDARD
        .decode(public_base64)
        .map_err(|e| KeyError::ImportError(format!("public key is not base64: {e}")))?;
    Ok(did::encode(&bytes, DID_KEY_ALGORITHM))
}
