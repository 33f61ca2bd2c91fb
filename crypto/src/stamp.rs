//! Canonical digests ("stamps") of structured values.
//!
//! A value is serialized to JSON, decoded into a generic tree, pruned of empty strings,
//! nulls, empty arrays and empty objects (recursively, so containers emptied by pruning
//! disappear too), re-encoded with sorted keys, prefixed with the domain-separation tag and
//! body length, and hashed with Blake2b-256. Optional fields therefore hash identically
//! whether they are absent, `null`, or empty.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::hash::blake2b_256_multi;
use crate::CryptoError;

/// Domain-separation tag prepended (with the decimal body length) before hashing.
pub const SIGNED_MESSAGE_TAG: &str = "\x19Tessera Signed Message:\n";

/// Normalized canonical encoding of `value` (without the tag).
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CryptoError> {
    let tree = serde_json::to_value(value).map_err(|e| CryptoError::Marshal(e.to_string()))?;
    let pruned = prune(tree).unwrap_or_else(|| Value::Object(Map::new()));
    serde_json::to_vec(&pruned).map_err(|e| CryptoError::Marshal(e.to_string()))
}

/// Compute the stamp of `value`.
pub fn stamp<T: Serialize + ?Sized>(value: &T) -> Result<[u8; 32], CryptoError> {
    let body = canonical_bytes(value)?;
    let prefix = format!("{SIGNED_MESSAGE_TAG}{}", body.len());
    Ok(blake2b_256_multi(&[prefix.as_bytes(), &body]))
}

fn prune(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(items) => {
            let kept: Vec<Value> = items.into_iter().filter_map(prune).collect();
            (!kept.is_empty()).then_some(Value::Array(kept))
        }
        Value::Object(fields) => {
            let kept: Map<String, Value> = fields
                .into_iter()
                .filter_map(|(k, v)| prune(v).map(|v| (k, v)))
                .collect();
            (!kept.is_empty()).then_some(Value::Object(kept))
        }
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct WithOptional {
        a: u64,
        memo: Option<String>,
        tags: Vec<String>,
    }

    #[derive(Serialize)]
    struct Bare {
        a: u64,
    }

    #[test]
    fn optional_representations_hash_equally() {
        let absent = Bare { a: 5 };
        let none = WithOptional { a: 5, memo: None, tags: vec![] };
        let empty = WithOptional { a: 5, memo: Some(String::new()), tags: vec![String::new()] };
        let h = stamp(&absent).unwrap();
        assert_eq!(stamp(&none).unwrap(), h);
        assert_eq!(stamp(&empty).unwrap(), h);
    }

    #[test]
    fn content_changes_digest() {
        assert_ne!(stamp(&Bare { a: 1 }).unwrap(), stamp(&Bare { a: 2 }).unwrap());
    }

    #[test]
    fn zero_numbers_and_false_survive_pruning() {
        let json = serde_json::json!({ "n": 0, "b": false, "gone": { "inner": [] } });
        let bytes = canonical_bytes(&json).unwrap();
        assert_eq!(bytes, br#"{"b":false,"n":0}"#.to_vec());
    }

    #[test]
    fn fully_empty_value_is_empty_object() {
        let bytes = canonical_bytes(&WithOptional { a: 0, memo: None, tags: vec![] }).unwrap();
        assert_eq!(bytes, br#"{"a":0}"#.to_vec());
        let bytes = canonical_bytes(&serde_json::json!({ "x": null })).unwrap();
        assert_eq!(bytes, b"{}".to_vec());
    }
}
