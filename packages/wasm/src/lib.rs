//! WebAssembly bindings for the sigchain library.
//!
//! Exposes identities and signed message feeds to JavaScript/TypeScript via
//! `wasm-bindgen`. Compile with `wasm-pack build` to produce an npm-ready
//! package that works in browsers, Node.js, and any other WASM host.
//!
//! Messages and feeds cross the boundary as JSON strings in their canonical
//! form, so they can be stored or sent as-is and parsed with `JSON.parse`.
//!
//! ## Identity API: [`Keys`], [`create_keys`], [`did_from_keys`], [`did_to_public_key`], [`public_key_to_did`]
//!
//! ```js
//! import init, { Keys, createMsg, isValidMsg } from './sigchain_wasm.js';
//! await init();
//!
//! const keys = new Keys();                        // fresh keypair
//! localStorage.setItem('keys', keys.toJson());    // host persists the keys
//! const again = Keys.fromJson(localStorage.getItem('keys'));
//! again.did;                                      // "did:key:z..."
//! ```
//!
//! ## Message API: [`create_msg`], [`is_valid_msg`], [`get_id`], [`verify_feed`], [`render`]
//!
//! ```js
//! const m1 = createMsg(keys, null, JSON.stringify({ type: 'post', text: 'hi' }));
//! const m2 = createMsg(keys, m1, JSON.stringify({ type: 'post', text: 'again' }));
//! isValidMsg(m2, m1, keys.publicKey);             // true
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sigchain::{ExportedKeys, KeyPair, Message, PublicKey};
use wasm_bindgen::prelude::*;

/// One-time initialisation called at the start of every exported function.
///
/// Installs the `console_error_panic_hook` when the feature is enabled so
/// that Rust panics are forwarded to the browser console as readable errors
/// rather than appearing as generic "unreachable" WASM traps.
fn setup() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// ── Identity API ──────────────────────────────────────────────────────────────

/// A P-256 signing identity.
///
/// Holds the private key in WASM memory. The host is responsible for
/// persisting [`toJson`](Keys::to_json) and restoring it via
/// [`fromJson`](Keys::from_json). The private half is secret; never transmit
/// it over the network.
#[wasm_bindgen]
pub struct Keys {
    inner: KeyPair,
}

#[wasm_bindgen]
impl Keys {
    /// Generate a fresh keypair using the host's random number source.
    #[wasm_bindgen(constructor)]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        setup();
        Self {
            inner: KeyPair::generate(),
        }
    }

    /// Restore keys from the JSON produced by [`toJson`](Keys::to_json):
    /// `{ "public": "<base64>", "private": "<base64 PKCS#8>" }`.
    ///
    /// Throws if either half does not decode or the halves do not match.
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(json: &str) -> Result<Keys, JsValue> {
        setup();
        let exported: ExportedKeys =
            serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("parse error: {e}")))?;
        let inner = KeyPair::import(&exported).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { inner })
    }

    /// Export both halves as a JSON string.
    ///
    /// **Keep this secret.**
    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> Result<String, JsValue> {
        let exported = self
            .inner
            .export()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        serde_json::to_string(&exported).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// The `did:key` DID of this identity. Share it freely.
    #[wasm_bindgen(getter)]
    pub fn did(&self) -> String {
        self.inner.did()
    }

    /// The public key as base64 of the uncompressed point.
    #[wasm_bindgen(getter, js_name = publicKey)]
    pub fn public_key(&self) -> String {
        self.inner.public_key().to_base64()
    }
}

/// Generate a keypair and return it with its DID as a JSON string:
///
/// ```json
/// { "did": "did:key:z...", "keys": { "public": "<base64>", "private": "<base64>" } }
/// ```
#[wasm_bindgen(js_name = createKeys)]
pub fn create_keys() -> Result<String, JsValue> {
    setup();
    let keys = KeyPair::generate();
    let exported = keys.export().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let obj = serde_json::json!({
        "did":  keys.did(),
        "keys": exported,
    });
    Ok(obj.to_string())
}

/// The DID for keys in their exported JSON form.
#[wasm_bindgen(js_name = getDidFromKeys)]
pub fn did_from_keys(keys: &str) -> Result<String, JsValue> {
    Ok(Keys::from_json(keys)?.did())
}

/// Decode a DID into its public key. Returns a JSON string:
///
/// ```json
/// { "publicKey": "<base64>", "type": "ed25519" }
/// ```
///
/// Throws on a malformed DID or an unknown multicodec prefix.
#[wasm_bindgen(js_name = didToPublicKey)]
pub fn did_to_public_key(did: &str) -> Result<String, JsValue> {
    setup();
    let (key, algorithm) = sigchain::did::decode(did).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let obj = serde_json::json!({
        "publicKey": STANDARD.encode(&key),
        "type":      algorithm.to_string(),
    });
    Ok(obj.to_string())
}

/// Derive the DID for a base64 public key.
#[wasm_bindgen(js_name = publicKeyToDid)]
pub fn public_key_to_did(public_key: &str) -> Result<String, JsValue> {
    setup();
    sigchain::public_key_to_did(public_key).map_err(|e| JsValue::from_str(&e.to_string()))
}

// ── Message API ───────────────────────────────────────────────────────────────

/// Create and sign a message and return it as a JSON string.
///
/// `prev` is the previous message's JSON, or `null` for the first message
/// of a feed. `content` must be a JSON object or a JSON string (encrypted
/// payload).
#[wasm_bindgen(js_name = createMsg)]
pub fn create_msg(keys: &Keys, prev: Option<String>, content: &str) -> Result<String, JsValue> {
    setup();
    let previous = prev.as_deref().map(parse_message).transpose()?;
    let content: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| JsValue::from_str(&format!("content parse error: {e}")))?;
    let msg = sigchain::create_message_from_value(&keys.inner, previous.as_ref(), content)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    sigchain::canonical::to_canonical_string(&msg).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Check a message's signature and its link to `prev`.
///
/// Returns `false` for a forged, tampered or unlinked message. Throws only
/// on malformed input.
#[wasm_bindgen(js_name = isValidMsg)]
pub fn is_valid_msg(msg: &str, prev: Option<String>, public_key: &str) -> Result<bool, JsValue> {
    setup();
    let msg = parse_message(msg)?;
    let previous = prev.as_deref().map(parse_message).transpose()?;
    let public_key = PublicKey::from_base64(public_key).map_err(|e| JsValue::from_str(&e.to_string()))?;
    sigchain::validate_message(&msg, previous.as_ref(), &public_key)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// The id of a signed message: `%<base64 sha256>.sha256`.
#[wasm_bindgen(js_name = getId)]
pub fn get_id(msg: &str) -> Result<String, JsValue> {
    setup();
    let msg = parse_message(msg)?;
    sigchain::message_id(&msg).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Verify a whole feed, given as a JSON array, from its first message.
#[wasm_bindgen(js_name = verifyFeed)]
pub fn verify_feed(feed: &str, public_key: &str) -> Result<bool, JsValue> {
    setup();
    let messages: Vec<Message> =
        serde_json::from_str(feed).map_err(|e| JsValue::from_str(&format!("parse error: {e}")))?;
    let public_key = PublicKey::from_base64(public_key).map_err(|e| JsValue::from_str(&e.to_string()))?;
    sigchain::verify_feed(&messages, &public_key).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Render a message or a feed as human-readable text.
///
/// A single message is rendered in full detail; an array is summarised one
/// line per message.
#[wasm_bindgen]
pub fn render(json: &str) -> Result<String, JsValue> {
    setup();

    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("parse error: {e}")))?;
    sigchain::render::render_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn parse_message(json: &str) -> Result<Message, JsValue> {
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("parse error: {e}")))
}

