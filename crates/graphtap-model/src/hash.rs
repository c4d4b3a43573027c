//! Dedup key hashing
//!
//! Provides [`DedupKey`], a strongly-typed 32-byte Blake3 hash over a bounded
//! prefix of a payload's canonical JSON encoding.

use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::ModelError;

/// A 32-byte dedup key (Blake3)
///
/// Two payloads with the same canonical prefix produce the same key.
/// Immutable and cheap to clone (Copy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DedupKey([u8; 32]);

impl DedupKey {
    /// Create a key from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create key from byte slice
    ///
    /// # Errors
    /// Returns error if slice length is not exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        if bytes.len() != 32 {
            return Err(ModelError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Compute Blake3 hash of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        Self::new(*hash.as_bytes())
    }

    /// Compute the key of a payload from its first `prefix_bytes` canonical bytes
    ///
    /// Object keys are emitted in sorted order so the key does not depend on
    /// the order the host serialized fields in. Encoding stops as soon as the
    /// prefix is full.
    #[must_use]
    pub fn from_payload(payload: &Value, prefix_bytes: usize) -> Self {
        Self::compute(&canonical_prefix(payload, prefix_bytes))
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for DedupKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for DedupKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl serde::Serialize for DedupKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for DedupKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Canonical JSON encoding truncated to `limit` bytes
#[must_use]
pub fn canonical_prefix(value: &Value, limit: usize) -> Vec<u8> {
    let mut out = PrefixWriter {
        buf: Vec::with_capacity(limit.min(4096)),
        limit,
    };
    write_canonical(value, &mut out);
    out.buf
}

struct PrefixWriter {
    buf: Vec<u8>,
    limit: usize,
}

impl PrefixWriter {
    fn is_full(&self) -> bool {
        self.buf.len() >= self.limit
    }

    fn push(&mut self, bytes: &[u8]) {
        let room = self.limit.saturating_sub(self.buf.len());
        self.buf.extend_from_slice(&bytes[..bytes.len().min(room)]);
    }
}

fn write_canonical(value: &Value, out: &mut PrefixWriter) {
    if out.is_full() {
        return;
    }
    match value {
        Value::Object(map) => {
            out.push(b"{");
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, key) in keys.into_iter().enumerate() {
                if out.is_full() {
                    return;
                }
                if i > 0 {
                    out.push(b",");
                }
                out.push(&serde_json::to_vec(key).unwrap_or_default());
                out.push(b":");
                if let Some(child) = map.get(key) {
                    write_canonical(child, out);
                }
            }
            out.push(b"}");
        }
        Value::Array(items) => {
            out.push(b"[");
            for (i, item) in items.iter().enumerate() {
                if out.is_full() {
                    return;
                }
                if i > 0 {
                    out.push(b",");
                }
                write_canonical(item, out);
            }
            out.push(b"]");
        }
        scalar => out.push(&serde_json::to_vec(scalar).unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_from_slice_invalid_length() {
        let result = DedupKey::from_slice(&[1u8; 31]);
        assert!(matches!(
            result,
            Err(ModelError::InvalidKeyLength { expected: 32, actual: 31 })
        ));
    }

    #[test]
    fn key_display_and_parse() {
        let key = DedupKey::compute(b"payload");
        let parsed: DedupKey = key.to_string().parse().unwrap();
        assert_eq!(key, parsed);
        assert!(key.to_string().starts_with(&key.short()));
    }

    #[test]
    fn canonical_prefix_sorts_object_keys() {
        let a = json!({"b": 1, "a": {"y": true, "x": null}});
        let b = json!({"a": {"x": null, "y": true}, "b": 1});
        assert_eq!(canonical_prefix(&a, 1024), canonical_prefix(&b, 1024));
        assert_eq!(
            String::from_utf8(canonical_prefix(&a, 1024)).unwrap(),
            r#"{"a":{"x":null,"y":true},"b":1}"#
        );
    }

    #[test]
    fn canonical_prefix_respects_limit() {
        let value = json!({"included": [{"text": "a".repeat(500)}]});
        assert_eq!(canonical_prefix(&value, 64).len(), 64);
    }

    #[test]
    fn payloads_sharing_prefix_share_key() {
        let head = "x".repeat(100);
        let a = json!({"a": head, "z": 1});
        let b = json!({"a": head, "z": 2});
        assert_eq!(DedupKey::from_payload(&a, 50), DedupKey::from_payload(&b, 50));
        assert_ne!(DedupKey::from_payload(&a, 4096), DedupKey::from_payload(&b, 4096));
    }

    proptest::proptest! {
        #[test]
        fn prefix_never_exceeds_limit(text in ".{0,300}", limit in 0usize..256) {
            let value = json!({"t": text, "n": [1, 2, 3]});
            proptest::prop_assert!(canonical_prefix(&value, limit).len() <= limit);
        }

        #[test]
        fn prefix_is_prefix_of_full_encoding(text in "[a-z]{0,200}", limit in 0usize..128) {
            let value = json!({"t": text});
            let full = canonical_prefix(&value, usize::MAX);
            let prefix = canonical_prefix(&value, limit);
            proptest::prop_assert!(full.starts_with(&prefix));
        }
    }

    #[test]
    fn key_serde_roundtrip_is_hex_string() {
        let key = DedupKey::compute(b"test");
        let encoded = serde_json::to_string(&key).unwrap();
        assert_eq!(encoded.len(), 66);
        let decoded: DedupKey = serde_json::from_str(&encoded).unwrap();
        assert_eq!(key, decoded);
    }
}
