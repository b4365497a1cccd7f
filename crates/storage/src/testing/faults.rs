//! Fault-injecting ledger wrapper
//!
//! `FaultyLedger` forwards to an inner ledger and fails selected operations
//! on demand, so error paths of code built on a ledger can be exercised
//! without real I/O failures. It also counts calls, which lets tests assert
//! that an operation did (or did not) reach the ledger.
//!
//! # Example
//!
//! ```ignore
//! use txledger_storage::testing::{FaultyLedger, LedgerOp};
//!
//! let ledger = FaultyLedger::new(MemoryLedger::new());
//! ledger.fail(LedgerOp::Put);
//! assert!(ledger.put("k", vec![]).is_err());
//! ledger.heal(LedgerOp::Put);
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use txledger_core::{Error, Ledger, LedgerEntry, Result, ScanCursor};

/// Ledger operation that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerOp {
    /// `Ledger::get`
    Get,
    /// `Ledger::put`
    Put,
    /// `Ledger::delete`
    Delete,
    /// `Ledger::range_scan` (opening the cursor)
    RangeScan,
    /// `ScanCursor::close`
    Close,
}

impl LedgerOp {
    fn name(self) -> &'static str {
        match self {
            LedgerOp::Get => "get",
            LedgerOp::Put => "put",
            LedgerOp::Delete => "delete",
            LedgerOp::RangeScan => "range_scan",
            LedgerOp::Close => "close",
        }
    }
}

/// Call counters
#[derive(Debug, Default)]
struct Counters {
    gets: AtomicUsize,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    scans: AtomicUsize,
    closes: AtomicUsize,
}

/// Ledger wrapper that injects failures and counts calls
#[derive(Debug)]
pub struct FaultyLedger<L> {
    inner: L,
    failing: Mutex<HashSet<LedgerOp>>,
    /// Cursors yield an error after this many entries
    scan_fail_after: Mutex<Option<usize>>,
    counters: Counters,
}

impl<L: Ledger> FaultyLedger<L> {
    /// Wrap `inner` with no faults armed
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
            scan_fail_after: Mutex::new(None),
            counters: Counters::default(),
        }
    }

    /// The wrapped ledger
    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Make every subsequent `op` fail
    pub fn fail(&self, op: LedgerOp) {
        self.failing.lock().insert(op);
    }

    /// Stop failing `op`
    pub fn heal(&self, op: LedgerOp) {
        self.failing.lock().remove(&op);
    }

    /// Make cursors opened from now on fail after yielding `entries` entries
    pub fn fail_scan_after(&self, entries: usize) {
        *self.scan_fail_after.lock() = Some(entries);
    }

    /// Number of `get` calls that reached this wrapper
    pub fn gets(&self) -> usize {
        self.counters.gets.load(Ordering::SeqCst)
    }

    /// Number of `put` calls
    pub fn puts(&self) -> usize {
        self.counters.puts.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls
    pub fn deletes(&self) -> usize {
        self.counters.deletes.load(Ordering::SeqCst)
    }

    /// Number of `range_scan` calls
    pub fn scans(&self) -> usize {
        self.counters.scans.load(Ordering::SeqCst)
    }

    /// Number of `close` calls on cursors from this wrapper
    pub fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    fn check(&self, op: LedgerOp) -> Result<()> {
        if self.failing.lock().contains(&op) {
            return Err(Error::unavailable(op.name(), "injected fault"));
        }
        Ok(())
    }
}

impl<L: Ledger> Ledger for FaultyLedger<L> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.counters.gets.fetch_add(1, Ordering::SeqCst);
        self.check(LedgerOp::Get)?;
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.counters.puts.fetch_add(1, Ordering::SeqCst);
        self.check(LedgerOp::Put)?;
        self.inner.put(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);
        self.check(LedgerOp::Delete)?;
        self.inner.delete(key)
    }

    fn range_scan(&self, start: &str, end: &str) -> Result<Box<dyn ScanCursor + '_>> {
        self.counters.scans.fetch_add(1, Ordering::SeqCst);
        self.check(LedgerOp::RangeScan)?;
        let inner = self.inner.range_scan(start, end)?;
        Ok(Box::new(FaultyCursor {
            inner,
            remaining: *self.scan_fail_after.lock(),
            fail_close: self.failing.lock().contains(&LedgerOp::Close),
            closes: &self.counters.closes,
        }))
    }
}

struct FaultyCursor<'a> {
    inner: Box<dyn ScanCursor + 'a>,
    remaining: Option<usize>,
    fail_close: bool,
    closes: &'a AtomicUsize,
}

impl Iterator for FaultyCursor<'_> {
    type Item = Result<LedgerEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.remaining {
            Some(0) => Some(Err(Error::unavailable("range_scan", "injected cursor fault"))),
            Some(ref mut n) => {
                *n -= 1;
                self.inner.next()
            }
            None => self.inner.next(),
        }
    }
}

impl ScanCursor for FaultyCursor<'_> {
    fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        // Release the inner cursor even when reporting a failure
        let inner = self.inner.close();
        if self.fail_close {
            return Err(Error::unavailable("close", "injected fault"));
        }
        inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLedger;

    #[test]
    fn test_passthrough_and_counters() {
        let ledger = FaultyLedger::new(MemoryLedger::new());
        ledger.put("k", b"v".to_vec()).unwrap();
        assert_eq!(ledger.get("k").unwrap(), Some(b"v".to_vec()));
        ledger.delete("k").unwrap();
        assert_eq!((ledger.puts(), ledger.gets(), ledger.deletes()), (1, 1, 1));
        assert!(ledger.inner().is_empty());
    }

    #[test]
    fn test_fail_and_heal() {
        let ledger = FaultyLedger::new(MemoryLedger::new());
        ledger.fail(LedgerOp::Put);
        let err = ledger.put("k", vec![]).unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable { op: "put", .. }));
        assert!(ledger.inner().is_empty());

        ledger.heal(LedgerOp::Put);
        ledger.put("k", vec![]).unwrap();
        assert_eq!(ledger.inner().len(), 1);
    }

    #[test]
    fn test_cursor_fails_after_n_entries() {
        let ledger = FaultyLedger::new(MemoryLedger::new());
        for key in ["a", "b", "c"] {
            ledger.put(key, vec![]).unwrap();
        }
        ledger.fail_scan_after(2);

        let mut cursor = ledger.range_scan("", "").unwrap();
        assert_eq!(cursor.next().unwrap().unwrap().key, "a");
        assert_eq!(cursor.next().unwrap().unwrap().key, "b");
        assert!(cursor.next().unwrap().is_err());
        cursor.close().unwrap();
        assert_eq!(ledger.closes(), 1);
        assert_eq!(ledger.inner().open_cursors(), 0);
    }

    #[test]
    fn test_close_fault_still_releases_inner() {
        let ledger = FaultyLedger::new(MemoryLedger::new());
        ledger.fail(LedgerOp::Close);
        let mut cursor = ledger.range_scan("", "").unwrap();
        assert!(cursor.close().is_err());
        assert_eq!(ledger.inner().open_cursors(), 0);
    }
}
