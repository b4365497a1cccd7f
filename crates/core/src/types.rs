//! Core types for txledger
//!
//! This module defines the foundational types:
//! - Transaction: the record stored in the ledger
//! - TxKey: the ledger key a record lives under

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Length of a derived key: hex of a 32-byte SHA-256 digest
pub const DERIVED_KEY_LEN: usize = 64;

/// Ledger key of a stored record
///
/// Keys produced by [`crate::codec::TxCodec`] are 64 lowercase hex
/// characters. Keys arriving from callers (read, delete, exists) are taken
/// as-is: an arbitrary string simply resolves to "not found".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxKey(String);

impl TxKey {
    /// Wrap a key string without validation
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Hex-encode a digest into a key
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the inner string
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether this key has the shape of a SHA-256 derived key
    pub fn is_derived(&self) -> bool {
        self.0.len() == DERIVED_KEY_LEN
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}

impl fmt::Display for TxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TxKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TxKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for TxKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TxKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A stored transaction record
///
/// `binding` is an opaque payload (in practice the concatenation of a
/// person-info hash and a certificate-info hash). `timestamp` is an opaque
/// signed value; the store never interprets it.
///
/// The serde field names match the canonical wire names so JSON output from
/// tools lines up with what is stored, but the canonical bytes themselves are
/// produced by [`crate::codec::TxCodec`], not by serde.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    /// Binding of identity attestation hashes
    #[serde(rename = "Binding")]
    pub binding: String,
    /// Recording timestamp
    #[serde(rename = "Timestamp")]
    pub timestamp: i64,
}

impl Transaction {
    /// Create a new transaction record
    pub fn new(binding: impl Into<String>, timestamp: i64) -> Self {
        Self {
            binding: binding.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_key_display_is_raw_string() {
        let key = TxKey::new("abc123");
        assert_eq!(key.to_string(), "abc123");
        assert_eq!(key.as_str(), "abc123");
    }

    #[test]
    fn test_tx_key_from_digest_is_lowercase_hex() {
        let key = TxKey::from_digest(&[0xAB, 0x01, 0xFF]);
        assert_eq!(key.as_str(), "ab01ff");
    }

    #[test]
    fn test_is_derived() {
        assert!(TxKey::from_digest(&[0u8; 32]).is_derived());
        assert!(!TxKey::new("abc").is_derived());
        assert!(!TxKey::new("AB".repeat(32)).is_derived());
        assert!(!TxKey::new("zz".repeat(32)).is_derived());
    }

    #[test]
    fn test_tx_key_ordering_is_lexicographic() {
        let mut keys = vec![TxKey::new("b1"), TxKey::new("0f"), TxKey::new("a0")];
        keys.sort();
        let ordered: Vec<&str> = keys.iter().map(TxKey::as_str).collect();
        assert_eq!(ordered, vec!["0f", "a0", "b1"]);
    }

    #[test]
    fn test_transaction_serde_names() {
        let tx = Transaction::new("b", 7);
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["Binding"], "b");
        assert_eq!(json["Timestamp"], 7);
    }
}
