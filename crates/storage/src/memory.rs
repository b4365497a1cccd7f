//! MemoryLedger: in-memory ordered ledger
//!
//! This module implements the Ledger trait using:
//! - `BTreeMap<String, Vec<u8>>` for ordered key storage
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for a monotonically increasing write version
//!
//! # Design Notes
//!
//! - **No version history**: each key stores only its latest value
//! - **Per-call atomicity only**: every get/put/delete is atomic on its own;
//!   nothing spans calls
//! - **Snapshot scans**: range scans copy the range under the read lock

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use txledger_core::{Error, Ledger, LedgerEntry, Result, ScanCursor};

use crate::cursor::{collect_range, SnapshotCursor};

/// In-memory ordered ledger
///
/// Thread-safe through `parking_lot::RwLock` and atomics. Intended for tests,
/// the CLI's `--cache` mode, and as the reference behaviour `FileLedger`
/// must match.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    /// Ordered map from key to stored bytes
    data: RwLock<BTreeMap<String, Vec<u8>>>,
    /// Number of successful puts and deletes so far
    version: AtomicU64,
    /// Range-scan cursors not yet closed
    open_cursors: Arc<AtomicUsize>,
}

impl MemoryLedger {
    /// Create a new empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger pre-populated with `entries`
    ///
    /// Bypasses the empty-key check; used to build corrupted fixtures.
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<u8>)>,
        K: Into<String>,
    {
        let data = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            data: RwLock::new(data),
            ..Self::default()
        }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the ledger holds no keys
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Number of mutations applied so far
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Number of range-scan cursors that have not been released
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Point-in-time copy of every entry, in key order
    pub fn entries(&self) -> Vec<LedgerEntry> {
        collect_range(&self.data.read(), "", "")
    }

    fn bump_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Ledger for MemoryLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        if key.is_empty() {
            return Err(Error::unavailable("put", "key must not be an empty string"));
        }
        self.data.write().insert(key.to_string(), value);
        let version = self.bump_version();
        trace!(key, version, "memory ledger put");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        if self.data.write().remove(key).is_some() {
            let version = self.bump_version();
            trace!(key, version, "memory ledger delete");
        }
        Ok(())
    }

    fn range_scan(&self, start: &str, end: &str) -> Result<Box<dyn ScanCursor + '_>> {
        let entries = collect_range(&self.data.read(), start, end);
        Ok(Box::new(SnapshotCursor::new(entries, &self.open_cursors)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(ledger: &MemoryLedger, start: &str, end: &str) -> Vec<String> {
        let mut cursor = ledger.range_scan(start, end).unwrap();
        let keys = cursor.by_ref().map(|e| e.unwrap().key).collect();
        cursor.close().unwrap();
        keys
    }

    #[test]
    fn test_get_put_delete() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.get("k").unwrap(), None);

        ledger.put("k", b"v1".to_vec()).unwrap();
        assert_eq!(ledger.get("k").unwrap(), Some(b"v1".to_vec()));

        ledger.put("k", b"v2".to_vec()).unwrap();
        assert_eq!(ledger.get("k").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(ledger.len(), 1);

        ledger.delete("k").unwrap();
        assert_eq!(ledger.get("k").unwrap(), None);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_delete_absent_is_ok() {
        let ledger = MemoryLedger::new();
        ledger.delete("missing").unwrap();
        assert_eq!(ledger.current_version(), 0);
    }

    #[test]
    fn test_empty_key_rejected() {
        let ledger = MemoryLedger::new();
        let err = ledger.put("", b"v".to_vec()).unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable { op: "put", .. }));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_version_counts_mutations() {
        let ledger = MemoryLedger::new();
        ledger.put("a", vec![]).unwrap();
        ledger.put("b", vec![]).unwrap();
        ledger.delete("a").unwrap();
        assert_eq!(ledger.current_version(), 3);
    }

    #[test]
    fn test_scan_is_ordered() {
        let ledger = MemoryLedger::new();
        for key in ["f0", "0a", "9c", "a1"] {
            ledger.put(key, key.as_bytes().to_vec()).unwrap();
        }
        assert_eq!(drain(&ledger, "", ""), vec!["0a", "9c", "a1", "f0"]);
        assert_eq!(drain(&ledger, "9c", "f0"), vec!["9c", "a1"]);
        assert_eq!(ledger.open_cursors(), 0);
    }

    #[test]
    fn test_scan_is_a_snapshot() {
        let ledger = MemoryLedger::new();
        ledger.put("a", vec![1]).unwrap();

        let mut cursor = ledger.range_scan("", "").unwrap();
        ledger.put("b", vec![2]).unwrap();
        ledger.delete("a").unwrap();

        let keys: Vec<String> = cursor.by_ref().map(|e| e.unwrap().key).collect();
        cursor.close().unwrap();
        assert_eq!(keys, vec!["a".to_string()]);
    }

    #[test]
    fn test_open_cursor_count() {
        let ledger = MemoryLedger::new();
        let mut first = ledger.range_scan("", "").unwrap();
        let second = ledger.range_scan("", "").unwrap();
        assert_eq!(ledger.open_cursors(), 2);

        first.close().unwrap();
        assert_eq!(ledger.open_cursors(), 1);
        drop(second);
        assert_eq!(ledger.open_cursors(), 0);
    }

    #[test]
    fn test_with_entries_allows_fixtures() {
        let ledger = MemoryLedger::with_entries(vec![("k", b"junk".to_vec())]);
        assert_eq!(ledger.get("k").unwrap(), Some(b"junk".to_vec()));
        assert_eq!(ledger.current_version(), 0);
    }

    #[test]
    fn test_concurrent_puts() {
        use std::thread;

        let ledger = Arc::new(MemoryLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    for i in 0..100 {
                        ledger.put(&format!("{t}-{i:03}"), vec![t as u8]).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ledger.len(), 800);
        assert_eq!(ledger.current_version(), 800);
    }
}
