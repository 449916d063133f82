//! End-to-end scenarios for identities and message chains, exercised only
//! through the public API.
//!
//! | Test | Property |
//! |------|----------|
//! | `exported_identity_keeps_signing` | keys survive export/import with the same DID |
//! | `genesis_then_extension` | first message, then a linked second message |
//! | `verifier_needs_only_the_did` | a third party validates using the author DID |
//! | `json_transport_preserves_signatures` | messages survive being sent as JSON text |
//! | `foreign_shapes_rejected_on_receipt` | untrusted JSON is shape-checked on parse |
//! | `broken_chain_detected` | a valid message against the wrong predecessor |
//! | `webcrypto_feed_validates` | a feed signed by browser WebCrypto validates unchanged |

use sigchain::{
    create_message_from_value, did, message_id, validate_message, validate_message_from_author,
    verify_feed, Feed, KeyAlgorithm, KeyPair, Message, PublicKey,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn post(text: &str) -> serde_json::Value {
    json!({ "type": "post", "text": text })
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn exported_identity_keeps_signing() {
    let alice = KeyPair::generate();
    let exported = alice.export().unwrap();
    let restored = KeyPair::import(&exported).unwrap();
    assert_eq!(alice.did(), restored.did());

    let m1 = create_message_from_value(&alice, None, post("before restart")).unwrap();
    let m2 = create_message_from_value(&restored, Some(&m1), post("after restart")).unwrap();
    assert!(validate_message(&m2, Some(&m1), alice.public_key()).unwrap());
}

#[test]
fn genesis_then_extension() {
    let alice = KeyPair::generate();
    let m1 = create_message_from_value(&alice, None, post("ok")).unwrap();
    assert_eq!(m1.previous, None);
    assert_eq!(m1.sequence, 1);
    assert!(validate_message(&m1, None, alice.public_key()).unwrap());

    let m2 = create_message_from_value(&alice, Some(&m1), post("again")).unwrap();
    assert_eq!(m2.previous.as_deref(), Some(message_id(&m1).unwrap().as_str()));
    assert_eq!(m2.sequence, m1.sequence + 1);
    assert!(validate_message(&m2, Some(&m1), alice.public_key()).unwrap());
}

#[test]
fn verifier_needs_only_the_did() {
    let alice = KeyPair::generate();
    let msg = create_message_from_value(&alice, None, post("hello")).unwrap();

    let (raw, algorithm) = did::decode(msg.author()).unwrap();
    assert_eq!(algorithm, KeyAlgorithm::Ed25519);
    let public_key = PublicKey::from_raw(&raw).unwrap();

    assert!(validate_message(&msg, None, &public_key).unwrap());
    assert!(validate_message_from_author(&msg, None).unwrap());
}

#[test]
fn json_transport_preserves_signatures() {
    let alice = KeyPair::generate();
    let mut feed = Feed::new(alice.public_key().clone());
    for i in 0..3 {
        let content = json!({ "type": "post", "text": format!("#{i}"), "nested": { "b": 1, "a": [1, 2] } });
        feed.publish(&alice, sigchain::Content::from_value(content).unwrap()).unwrap();
    }

    let wire = serde_json::to_string(feed.messages()).unwrap();
    let received: Vec<Message> = serde_json::from_str(&wire).unwrap();
    assert_eq!(received, feed.messages());
    assert!(verify_feed(&received, alice.public_key()).unwrap());
}

#[test]
fn foreign_shapes_rejected_on_receipt() {
    let wire = r#"{
        "previous": null,
        "sequence": 1,
        "author": "did:key:zAuthor",
        "timestamp": 1651976991718,
        "content": { "type": "post" },
        "hash": "sha256",
        "signature": "c2ln"
    }"#;
    let err = serde_json::from_str::<Message>(wire).unwrap_err();
    assert!(err.to_string().contains("out of order"), "got: {err}");
}

#[test]
fn broken_chain_detected() {
    let alice = KeyPair::generate();
    let m1 = create_message_from_value(&alice, None, post("one")).unwrap();
    let m1_fork = create_message_from_value(&alice, None, post("one, again")).unwrap();
    let m2 = create_message_from_value(&alice, Some(&m1), post("two")).unwrap();

    assert!(validate_message(&m2, Some(&m1), alice.public_key()).unwrap());
    assert!(!validate_message(&m2, Some(&m1_fork), alice.public_key()).unwrap());
}

/// Two linked messages signed in Node with `crypto.subtle` (ECDSA P-256,
/// raw `r || s`) over `JSON.stringify(m, null, 2)`. The second uses the
/// author-first field order. WebCrypto does not normalise `s`; the first
/// signature has a high `s`.
const WEBCRYPTO_FEED: &str = include_str!("fixtures/webcrypto_feed.json");

#[test]
fn webcrypto_feed_validates() {
    let fixture: serde_json::Value = serde_json::from_str(WEBCRYPTO_FEED).unwrap();
    let public_key = PublicKey::from_base64(fixture["publicKey"].as_str().unwrap()).unwrap();
    let messages: Vec<Message> = serde_json::from_value(fixture["feed"].clone()).unwrap();
    let ids: Vec<&str> = fixture["ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|id| id.as_str().unwrap())
        .collect();

    assert_eq!(messages[0].author, public_key.to_did());
    for (message, id) in messages.iter().zip(&ids) {
        assert_eq!(message_id(message).unwrap(), *id);
    }
    assert!(validate_message(&messages[0], None, &public_key).unwrap());
    assert!(validate_message(&messages[1], Some(&messages[0]), &public_key).unwrap());
    assert!(validate_message_from_author(&messages[1], Some(&messages[0])).unwrap());
    assert!(verify_feed(&messages, &public_key).unwrap());

    // Re-serialising through this crate reproduces the signed bytes exactly.
    let rewritten: Vec<Message> =
        serde_json::from_str(&sigchain::canonical::to_canonical_string(&messages).unwrap()).unwrap();
    assert!(verify_feed(&rewritten, &public_key).unwrap());
}
