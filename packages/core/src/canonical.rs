//! Deterministic text encoding used for both signing and hashing.
//!
//! The canonical form is two-space indented JSON with object keys emitted in
//! **insertion order**, never sorted. For the value shapes a message can
//! hold (objects, arrays, strings, integers, booleans, `null`) the output is
//! byte-for-byte identical to JavaScript's `JSON.stringify(value, null, 2)`,
//! which is what lets signatures produced by other implementations of the
//! chain format verify here and vice versa.
//!
//! Key order is preserved because `serde_json` is built with its
//! `preserve_order` feature, so [`serde_json::Map`] keeps the order in which
//! the caller inserted keys.

use serde::Serialize;

/// Serialise `value` to its canonical string form.
///
/// # Errors
///
/// Returns the underlying [`serde_json::Error`] if `value` cannot be
/// represented as JSON (e.g. a map with non-string keys).
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Serialise `value` to its canonical UTF-8 bytes. These are the exact bytes
/// that are signed and hashed.
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_keep_insertion_order() {
        let mut map = serde_json::Map::new();
        map.insert("zeta".into(), json!(1));
        map.insert("alpha".into(), json!(2));
        let s = to_canonical_string(&map).unwrap();
        assert_eq!(s, "{\n  \"zeta\": 1,\n  \"alpha\": 2\n}");
    }

    #[test]
    fn matches_js_two_space_layout() {
        let value = json!({
            "previous": null,
            "sequence": 1,
            "content": { "type": "post", "tags": ["a", "b"], "empty": {} }
        });
        let expected = "{\n  \"previous\": null,\n  \"sequence\": 1,\n  \"content\": {\n    \"type\": \"post\",\n    \"tags\": [\n      \"a\",\n      \"b\"\n    ],\n    \"empty\": {}\n  }\n}";
        assert_eq!(to_canonical_string(&value).unwrap(), expected);
    }

    #[test]
    fn integers_stay_integers() {
        let s = to_canonical_string(&json!({ "timestamp": 1651976991718u64 })).unwrap();
        assert!(s.contains("1651976991718"));
        assert!(!s.contains('.'));
    }

    #[test]
    fn bytes_match_string() {
        let value = json!({ "a": "ü", "b": [1, 2] });
        assert_eq!(
            to_canonical_bytes(&value).unwrap(),
            to_canonical_string(&value).unwrap().into_bytes()
        );
    }
}
