//! Ledger collaborator abstraction
//!
//! The record store does not own durability. It talks to an ordered
//! key-value ledger through the [`Ledger`] trait, which offers exactly four
//! primitives: get, put, delete and range scan. There is no native
//! uniqueness constraint; the store enforces existence itself.
//!
//! Thread safety: implementations must be safe to call concurrently from
//! multiple threads (requires Send + Sync). Atomicity across calls is the
//! implementation's concern, not the store's.

use std::sync::Arc;

use crate::error::Result;

/// One `(key, value)` pair produced by a range scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Ledger key
    pub key: String,
    /// Stored bytes
    pub value: Vec<u8>,
}

impl LedgerEntry {
    /// Create a new entry
    pub fn new(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Cursor over a range scan
///
/// Yields entries in ascending key order. A cursor holds collaborator
/// resources until [`ScanCursor::close`] is called; callers must close it on
/// every exit path. Closing twice is a no-op.
pub trait ScanCursor: Iterator<Item = Result<LedgerEntry>> + Send {
    /// Release the cursor
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the collaborator fails to release it.
    fn close(&mut self) -> Result<()>;
}

/// Ordered key-value ledger
///
/// # Range semantics
///
/// `range_scan(start, end)` covers `start <= key < end`. An empty string for
/// either bound leaves that side open, so `range_scan("", "")` covers the
/// whole namespace.
///
/// # Errors
///
/// Every method reports collaborator failure as `Error::StoreUnavailable`.
pub trait Ledger: Send + Sync {
    /// Get the value stored under `key`, or `None` if absent
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    fn delete(&self, key: &str) -> Result<()>;

    /// Open a cursor over `start <= key < end`
    fn range_scan(&self, start: &str, end: &str) -> Result<Box<dyn ScanCursor + '_>>;
}

impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }

    fn range_scan(&self, start: &str, end: &str) -> Result<Box<dyn ScanCursor + '_>> {
        (**self).range_scan(start, end)
    }
}

impl<L: Ledger + ?Sized> Ledger for &L {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }

    fn range_scan(&self, start: &str, end: &str) -> Result<Box<dyn ScanCursor + '_>> {
        (**self).range_scan(start, end)
    }
}
