//! wasm-bindgen-test integration tests for the sigchain WASM bindings.
//!
//! Run with:
//!   wasm-pack test packages/wasm --node
//!
//! These tests compile to WASM and execute in a Node.js process, verifying
//! the exported API surface works end-to-end in a JavaScript host.

use wasm_bindgen_test::*;

// Configure all tests in this file to run in Node.js (no browser required).
wasm_bindgen_test_configure!(run_in_node_experimental);

use sigchain_wasm::{
    create_keys, create_msg, did_from_keys, did_to_public_key, get_id, is_valid_msg,
    public_key_to_did, render, verify_feed, Keys,
};

const POST: &str = r#"{"type":"post","text":"hello"}"#;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

#[wasm_bindgen_test]
fn keys_new_produces_did_key() {
    let keys = Keys::new();
    assert!(keys.did().starts_with("did:key:z"), "got {}", keys.did());
}

#[wasm_bindgen_test]
fn keys_json_roundtrip_keeps_did() {
    let keys = Keys::new();
    let restored = Keys::from_json(&keys.to_json().unwrap()).unwrap();
    assert_eq!(keys.did(), restored.did());
    assert_eq!(keys.public_key(), restored.public_key());
}

#[wasm_bindgen_test]
fn keys_from_mismatched_halves_returns_err() {
    let a: serde_json::Value = serde_json::from_str(&Keys::new().to_json().unwrap()).unwrap();
    let b: serde_json::Value = serde_json::from_str(&Keys::new().to_json().unwrap()).unwrap();
    let mixed = serde_json::json!({ "public": a["public"], "private": b["private"] });
    assert!(Keys::from_json(&mixed.to_string()).is_err());
}

#[wasm_bindgen_test]
fn create_keys_returns_did_and_keys() {
    let created: serde_json::Value = serde_json::from_str(&create_keys().unwrap()).unwrap();
    let keys = created["keys"].to_string();
    assert_eq!(did_from_keys(&keys).unwrap(), created["did"].as_str().unwrap());
}

// ---------------------------------------------------------------------------
// DID conversion
// ---------------------------------------------------------------------------

#[wasm_bindgen_test]
fn did_and_public_key_convert_both_ways() {
    let keys = Keys::new();
    assert_eq!(public_key_to_did(&keys.public_key()).unwrap(), keys.did());

    let decoded: serde_json::Value =
        serde_json::from_str(&did_to_public_key(&keys.did()).unwrap()).unwrap();
    assert_eq!(decoded["publicKey"].as_str(), Some(keys.public_key().as_str()));
    assert_eq!(decoded["type"].as_str(), Some("ed25519"));
}

#[wasm_bindgen_test]
fn did_to_public_key_rejects_other_methods() {
    assert!(did_to_public_key("did:web:example.com").is_err());
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[wasm_bindgen_test]
fn create_and_validate_a_chain() {
    let keys = Keys::new();
    let m1 = create_msg(&keys, None, POST).unwrap();
    let m2 = create_msg(&keys, Some(m1.clone()), POST).unwrap();

    assert!(is_valid_msg(&m1, None, &keys.public_key()).unwrap());
    assert!(is_valid_msg(&m2, Some(m1.clone()), &keys.public_key()).unwrap());

    let parsed: serde_json::Value = serde_json::from_str(&m2).unwrap();
    assert_eq!(parsed["sequence"].as_u64(), Some(2));
    assert_eq!(parsed["previous"].as_str(), Some(get_id(&m1).unwrap().as_str()));
}

#[wasm_bindgen_test]
fn other_authors_key_does_not_validate() {
    let alice = Keys::new();
    let bob = Keys::new();
    let m1 = create_msg(&alice, None, POST).unwrap();
    assert!(!is_valid_msg(&m1, None, &bob.public_key()).unwrap());
}

#[wasm_bindgen_test]
fn create_msg_rejects_non_object_content() {
    let keys = Keys::new();
    assert!(create_msg(&keys, None, "[1, 2]").is_err());
    assert!(create_msg(&keys, None, "not json").is_err());
}

#[wasm_bindgen_test]
fn message_id_has_sha256_suffix() {
    let keys = Keys::new();
    let id = get_id(&create_msg(&keys, None, POST).unwrap()).unwrap();
    assert!(id.starts_with('%') && id.ends_with(".sha256"), "got {id}");
}

// ---------------------------------------------------------------------------
// Feeds and rendering
// ---------------------------------------------------------------------------

#[wasm_bindgen_test]
fn verify_feed_accepts_a_built_chain() {
    let keys = Keys::new();
    let m1 = create_msg(&keys, None, POST).unwrap();
    let m2 = create_msg(&keys, Some(m1.clone()), POST).unwrap();
    let feed = format!("[{m1},{m2}]");
    assert!(verify_feed(&feed, &keys.public_key()).unwrap());

    let reversed = format!("[{m2},{m1}]");
    assert!(!verify_feed(&reversed, &keys.public_key()).unwrap());
}

#[wasm_bindgen_test]
fn render_single_message_and_feed() {
    let keys = Keys::new();
    let m1 = create_msg(&keys, None, POST).unwrap();
    assert!(render(&m1).unwrap().contains("text: \"hello\""));
    assert!(render(&format!("[{m1}]")).unwrap().contains("1 message"));
    assert!(render("{}").is_err());

    let err = render(&format!("[{m1}, {{}}]")).unwrap_err();
    assert!(err.as_string().unwrap().contains("feed entry 1"), "got {err:?}");
}
