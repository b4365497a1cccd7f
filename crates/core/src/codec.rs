//! Record codec: canonical serialization and key derivation
//!
//! A record's ledger key is derived from its content, so every node that
//! re-executes a create must produce the same bytes for the same record.
//! The canonical form is therefore written by hand instead of through a
//! serializer whose field order or escaping could drift.
//!
//! ## Canonical Form
//!
//! ```text
//! {"Binding":"<escaped>","Timestamp":<i64>}
//! ```
//!
//! - Fields in lexicographic order, no whitespace
//! - Strings escaped exactly as Go's `encoding/json` does, including the
//!   HTML-safe escapes for `<`, `>`, `&` and the escapes for U+2028/U+2029
//! - Timestamp in plain base-10
//!
//! ## Key Derivation
//!
//! `key = lowercase_hex(SHA256(canonical_bytes))`. [`derive_key`] is a pure
//! function; each call uses a fresh hasher.

use crate::error::DecodeError;
use crate::types::{Transaction, TxKey};
use serde::Deserialize;
use sha2::{Digest, Sha256};

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Wire field name of the binding
pub const FIELD_BINDING: &str = "Binding";
/// Wire field name of the timestamp
pub const FIELD_TIMESTAMP: &str = "Timestamp";

/// Mapping between a record and its stored bytes and key
///
/// The store is generic over this trait so the same create/read/delete
/// discipline applies to any record shape.
pub trait RecordCodec: Send + Sync {
    /// Logical record type
    type Record;

    /// Canonical bytes of a record. Total and deterministic.
    fn encode(&self, record: &Self::Record) -> Vec<u8>;

    /// Inverse of [`RecordCodec::encode`]
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the bytes are not a canonical encoding.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Record, DecodeError>;

    /// Ledger key for encoded bytes
    fn derive_key(&self, encoded: &[u8]) -> TxKey;

    /// Ledger key for a record
    fn key_of(&self, record: &Self::Record) -> TxKey {
        self.derive_key(&self.encode(record))
    }
}

/// Hex-encoded SHA-256 of `bytes`
pub fn derive_key(bytes: &[u8]) -> TxKey {
    TxKey::from_digest(&Sha256::digest(bytes))
}

/// Codec for [`Transaction`] records: canonical JSON, SHA-256 keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxCodec;

impl TxCodec {
    /// Create the codec
    pub fn new() -> Self {
        Self
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WireTransaction {
    #[serde(rename = "Binding")]
    binding: String,
    #[serde(rename = "Timestamp")]
    timestamp: i64,
}

impl RecordCodec for TxCodec {
    type Record = Transaction;

    fn encode(&self, tx: &Transaction) -> Vec<u8> {
        // 32 bytes covers the braces, both field names and separators
        let mut out = Vec::with_capacity(tx.binding.len() + 32 + 20);
        out.extend_from_slice(b"{\"");
        out.extend_from_slice(FIELD_BINDING.as_bytes());
        out.extend_from_slice(b"\":");
        write_json_string(&mut out, &tx.binding);
        out.extend_from_slice(b",\"");
        out.extend_from_slice(FIELD_TIMESTAMP.as_bytes());
        out.extend_from_slice(b"\":");
        out.extend_from_slice(tx.timestamp.to_string().as_bytes());
        out.push(b'}');
        out
    }

    fn decode(&self, bytes: &[u8]) -> Result<Transaction, DecodeError> {
        let wire: WireTransaction = serde_json::from_slice(bytes)
            .map_err(|e| DecodeError::new(format!("invalid transaction JSON: {}", e)))?;
        let tx = Transaction {
            binding: wire.binding,
            timestamp: wire.timestamp,
        };

        // Well-formed but non-canonical bytes would hash to a different key
        // than the one they are stored under.
        if self.encode(&tx) != bytes {
            return Err(DecodeError::new("transaction bytes are not in canonical form"));
        }
        Ok(tx)
    }

    fn derive_key(&self, encoded: &[u8]) -> TxKey {
        derive_key(encoded)
    }
}

/// Codec for opaque byte blobs whose key is their own hex encoding
///
/// No hashing: two blobs collide only if they are byte-identical, and the
/// key length grows with the blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlobCodec;

impl BlobCodec {
    /// Create the codec
    pub fn new() -> Self {
        Self
    }
}

impl RecordCodec for BlobCodec {
    type Record = Vec<u8>;

    fn encode(&self, blob: &Vec<u8>) -> Vec<u8> {
        blob.clone()
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
        Ok(bytes.to_vec())
    }

    fn derive_key(&self, encoded: &[u8]) -> TxKey {
        TxKey::from_digest(encoded)
    }
}

/// Append `s` as a JSON string literal using Go's escaping rules
fn write_json_string(out: &mut Vec<u8>, s: &str) {
    out.push(b'"');
    for c in s.chars() {
        match c {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\u{8}' => out.extend_from_slice(b"\\b"),
            '\u{c}' => out.extend_from_slice(b"\\f"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            '<' | '>' | '&' | '\u{2028}' | '\u{2029}' => write_unicode_escape(out, c),
            c if (c as u32) < 0x20 => write_unicode_escape(out, c),
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}

/// Four-digit lowercase escape; only called for BMP characters
fn write_unicode_escape(out: &mut Vec<u8>, c: char) {
    let cp = c as u32;
    out.extend_from_slice(b"\\u");
    for shift in [12u32, 8, 4, 0] {
        out.push(HEX_DIGITS[((cp >> shift) & 0xF) as usize]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode_str(binding: &str, timestamp: i64) -> String {
        String::from_utf8(TxCodec.encode(&Transaction::new(binding, timestamp))).unwrap()
    }

    /// Expected escape text for a code point, e.g. `esc("003c")`
    fn esc(hex: &str) -> String {
        format!("\\u{}", hex)
    }

    // ========== Serialization ==========

    #[test]
    fn test_encode_seed_transaction() {
        assert_eq!(
            encode_str("test_binding", 0),
            r#"{"Binding":"test_binding","Timestamp":0}"#
        );
    }

    #[test]
    fn test_encode_negative_and_extreme_timestamps() {
        assert_eq!(encode_str("", -1), r#"{"Binding":"","Timestamp":-1}"#);
        assert_eq!(
            encode_str("x", i64::MIN),
            r#"{"Binding":"x","Timestamp":-9223372036854775808}"#
        );
        assert_eq!(
            encode_str("x", i64::MAX),
            r#"{"Binding":"x","Timestamp":9223372036854775807}"#
        );
    }

    #[test]
    fn test_encode_short_escapes() {
        assert_eq!(
            encode_str("a\"b\\c\nd\re\tf\u{8}g\u{c}", 1),
            r#"{"Binding":"a\"b\\c\nd\re\tf\bg\f","Timestamp":1}"#
        );
    }

    #[test]
    fn test_encode_control_characters_use_lowercase_hex() {
        let expected = format!(
            "{{\"Binding\":\"{}{}{}\",\"Timestamp\":0}}",
            esc("0000"),
            esc("001f"),
            esc("001b")
        );
        assert_eq!(encode_str("\u{0}\u{1f}\u{1b}", 0), expected);
    }

    #[test]
    fn test_encode_html_safe_escapes() {
        let expected = format!(
            "{{\"Binding\":\"{}a{}{}\",\"Timestamp\":0}}",
            esc("003c"),
            esc("003e"),
            esc("0026")
        );
        assert_eq!(encode_str("<a>&", 0), expected);
    }

    #[test]
    fn test_encode_line_separators_escaped() {
        let expected = format!(
            "{{\"Binding\":\"{}{}\",\"Timestamp\":0}}",
            esc("2028"),
            esc("2029")
        );
        assert_eq!(encode_str("\u{2028}\u{2029}", 0), expected);
    }

    #[test]
    fn test_encode_non_ascii_is_raw_utf8() {
        let bytes = TxCodec.encode(&Transaction::new("é\u{7f}😀", 0));
        let expected = "{\"Binding\":\"é\u{7f}😀\",\"Timestamp\":0}";
        assert_eq!(bytes, expected.as_bytes());
    }

    // ========== Key Derivation ==========

    #[test]
    fn test_seed_key_matches_reference_digest() {
        let key = TxCodec.key_of(&Transaction::new("test_binding", 0));
        assert_eq!(
            key.as_str(),
            "5f25ee06fb80627997c99db48f9f4df703874da5abfa327367fc1f558811e6fc"
        );
        assert!(key.is_derived());
    }

    #[test]
    fn test_derive_key_empty_input() {
        assert_eq!(
            derive_key(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_derive_key_is_stateless() {
        // Interleaved derivations must not leak state into each other
        let a = derive_key(b"first");
        let b = derive_key(b"second");
        assert_eq!(derive_key(b"first"), a);
        assert_eq!(derive_key(b"second"), b);
        assert_ne!(a, b);
    }

    #[test]
    fn test_distinct_content_distinct_keys() {
        let base = TxCodec.key_of(&Transaction::new("b", 1));
        assert_ne!(base, TxCodec.key_of(&Transaction::new("b", 2)));
        assert_ne!(base, TxCodec.key_of(&Transaction::new("c", 1)));
    }

    // ========== Decoding ==========

    #[test]
    fn test_decode_canonical() {
        let tx = TxCodec
            .decode(br#"{"Binding":"test_binding","Timestamp":0}"#)
            .unwrap();
        assert_eq!(tx, Transaction::new("test_binding", 0));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(TxCodec.decode(b"not json").is_err());
        assert!(TxCodec.decode(b"").is_err());
        assert!(TxCodec.decode(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_decode_rejects_missing_and_unknown_fields() {
        assert!(TxCodec.decode(br#"{"Binding":"b"}"#).is_err());
        assert!(TxCodec.decode(br#"{"Timestamp":0}"#).is_err());
        assert!(TxCodec
            .decode(br#"{"Binding":"b","Timestamp":0,"Extra":1}"#)
            .is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_types() {
        assert!(TxCodec.decode(br#"{"Binding":1,"Timestamp":0}"#).is_err());
        assert!(TxCodec.decode(br#"{"Binding":"b","Timestamp":"0"}"#).is_err());
        assert!(TxCodec.decode(br#"{"Binding":"b","Timestamp":1.5}"#).is_err());
        assert!(TxCodec
            .decode(br#"{"Binding":"b","Timestamp":9223372036854775808}"#)
            .is_err());
    }

    #[test]
    fn test_decode_rejects_non_canonical_layout() {
        // Whitespace
        assert!(TxCodec.decode(br#"{"Binding": "b","Timestamp":0}"#).is_err());
        // Reordered fields
        assert!(TxCodec.decode(br#"{"Timestamp":0,"Binding":"b"}"#).is_err());
        // Escape the canonical writer would not produce
        assert!(TxCodec.decode(br#"{"Binding":"\/","Timestamp":0}"#).is_err());
        // Raw '<' where the canonical form escapes it
        assert!(TxCodec.decode(br#"{"Binding":"<","Timestamp":0}"#).is_err());
    }

    #[test]
    fn test_decode_error_mentions_reason() {
        let err = TxCodec.decode(br#"{"Binding": "b","Timestamp":0}"#).unwrap_err();
        assert!(err.reason.contains("canonical"));
    }

    // ========== Blob Codec ==========

    #[test]
    fn test_blob_key_is_hex_of_content() {
        let blob = vec![0xde, 0xad, 0xbe, 0xef];
        assert_eq!(BlobCodec.key_of(&blob).as_str(), "deadbeef");
        assert_eq!(BlobCodec.encode(&blob), blob);
        assert_eq!(BlobCodec.decode(&blob).unwrap(), blob);
    }

    // ========== Properties ==========

    proptest! {
        #[test]
        fn prop_round_trip(binding in any::<String>(), timestamp in any::<i64>()) {
            let tx = Transaction::new(binding, timestamp);
            let bytes = TxCodec.encode(&tx);
            prop_assert_eq!(TxCodec.decode(&bytes).unwrap(), tx);
        }

        #[test]
        fn prop_key_is_deterministic(binding in any::<String>(), timestamp in any::<i64>()) {
            let first = TxCodec.key_of(&Transaction::new(binding.clone(), timestamp));
            let second = TxCodec.key_of(&Transaction::new(binding, timestamp));
            prop_assert!(first.is_derived());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_encoding_is_plain_json(binding in any::<String>(), timestamp in any::<i64>()) {
            let bytes = TxCodec.encode(&Transaction::new(binding.clone(), timestamp));
            let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            prop_assert_eq!(value["Binding"].as_str(), Some(binding.as_str()));
            prop_assert_eq!(value["Timestamp"].as_i64(), Some(timestamp));
        }
    }
}
