//! Core types and traits for txledger
//!
//! This crate defines the foundational types used throughout the system:
//! - Transaction: the stored record (binding + timestamp)
//! - TxKey: content-derived store key (hex SHA-256 of the canonical bytes)
//! - Codec: canonical serialization and key derivation (TxCodec, BlobCodec)
//! - Error: Error type hierarchy
//! - Traits: the ordered key-value ledger collaborator (Ledger, ScanCursor)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod traits;
pub mod types;

pub use codec::{derive_key, BlobCodec, RecordCodec, TxCodec};
pub use error::{DecodeError, Error, Result};
pub use traits::{Ledger, LedgerEntry, ScanCursor};
pub use types::{Transaction, TxKey};
