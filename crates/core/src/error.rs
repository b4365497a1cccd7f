//! Error types for txledger
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every variant carries enough context (the offending key or the failing
//! ledger operation) for the caller to act on it. Nothing is retried or
//! masked inside the store.

use crate::types::TxKey;
use std::io;
use thiserror::Error;

/// Result type alias for txledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Codec-level failure: bytes are not a canonical record serialization
///
/// Carries no key; the store attaches one when it surfaces the failure
/// as [`Error::Decode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct DecodeError {
    /// Human-readable description of what was wrong with the bytes
    pub reason: String,
}

impl DecodeError {
    /// Create a decode error with the given reason
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Error types for txledger
#[derive(Debug, Error)]
pub enum Error {
    /// Create on a key whose content is already stored
    #[error("the transaction {0} already exists")]
    AlreadyExists(TxKey),

    /// Read or delete on a key that is not stored
    #[error("the transaction {0} does not exist")]
    NotFound(TxKey),

    /// Stored or scanned bytes are not a canonical record
    #[error("failed to decode transaction {key}: {source}")]
    Decode {
        /// Key the malformed bytes were stored under
        key: TxKey,
        /// What was wrong with them
        #[source]
        source: DecodeError,
    },

    /// Ledger collaborator failed (I/O, closed, corrupted)
    #[error("ledger unavailable during {op}: {reason}")]
    StoreUnavailable {
        /// Ledger operation that failed (get, put, delete, range_scan, ...)
        op: &'static str,
        /// Failure description from the collaborator
        reason: String,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Build a `StoreUnavailable` error for a ledger operation
    pub fn unavailable(op: &'static str, reason: impl Into<String>) -> Self {
        Error::StoreUnavailable {
            op,
            reason: reason.into(),
        }
    }

    /// Attach a key to a codec failure
    pub fn decode(key: impl Into<TxKey>, source: DecodeError) -> Self {
        Error::Decode {
            key: key.into(),
            source,
        }
    }

    /// The key this error refers to, if any
    pub fn key(&self) -> Option<&TxKey> {
        match self {
            Error::AlreadyExists(key) | Error::NotFound(key) => Some(key),
            Error::Decode { key, .. } => Some(key),
            Error::StoreUnavailable { .. } | Error::InvalidConfig(_) => None,
        }
    }

    /// Whether a caller-side retry could succeed
    ///
    /// Only collaborator failures are transient; every other kind is a
    /// definitive answer about the ledger's contents.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StoreUnavailable { .. })
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::unavailable("io", e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> TxKey {
        TxKey::new("ab".repeat(32))
    }

    #[test]
    fn test_error_display_already_exists() {
        let err = Error::AlreadyExists(key());
        let msg = err.to_string();
        assert!(msg.contains("already exists"));
        assert!(msg.contains(&"ab".repeat(32)));
    }

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound(TxKey::new("missing"));
        assert_eq!(err.to_string(), "the transaction missing does not exist");
    }

    #[test]
    fn test_error_display_decode() {
        let err = Error::decode(key(), DecodeError::new("unexpected field"));
        let msg = err.to_string();
        assert!(msg.contains("failed to decode"));
        assert!(msg.contains("unexpected field"));
    }

    #[test]
    fn test_error_display_store_unavailable() {
        let err = Error::unavailable("put", "disk full");
        let msg = err.to_string();
        assert!(msg.contains("put"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::StoreUnavailable { op: "io", .. }));
    }

    #[test]
    fn test_error_key_context() {
        assert_eq!(Error::AlreadyExists(key()).key(), Some(&key()));
        assert_eq!(Error::NotFound(key()).key(), Some(&key()));
        assert_eq!(
            Error::decode(key(), DecodeError::new("x")).key(),
            Some(&key())
        );
        assert!(Error::unavailable("get", "x").key().is_none());
    }

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(Error::unavailable("get", "timeout").is_retryable());
        assert!(!Error::AlreadyExists(key()).is_retryable());
        assert!(!Error::NotFound(key()).is_retryable());
        assert!(!Error::decode(key(), DecodeError::new("x")).is_retryable());
        assert!(!Error::InvalidConfig("x".into()).is_retryable());
    }

    #[test]
    fn test_decode_error_source_chain() {
        use std::error::Error as _;

        let err = Error::decode(key(), DecodeError::new("bad timestamp"));
        let source = err.source().expect("decode error has a source");
        assert_eq!(source.to_string(), "bad timestamp");
    }
}
