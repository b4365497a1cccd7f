//! Snapshot cursors for range scans
//!
//! A range scan copies the requested slice of the ordered map while holding
//! the read lock, then releases the lock and hands the copy to a cursor.
//! Writes after the scan opened are not visible through it.
//!
//! Each cursor holds a [`CursorTracker`] registered with its ledger. The
//! tracker is released on `close()` or, failing that, on drop, so the open
//! count never leaks even when a caller forgets to close.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::warn;
use txledger_core::{LedgerEntry, Result, ScanCursor};

/// Open-cursor registration; decrements the ledger's count when dropped
#[derive(Debug)]
pub struct CursorTracker {
    open: Arc<AtomicUsize>,
}

impl CursorTracker {
    /// Register a newly opened cursor with `open`
    pub fn register(open: &Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        Self {
            open: Arc::clone(open),
        }
    }
}

impl Drop for CursorTracker {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Cursor over a point-in-time copy of a key range
#[derive(Debug)]
pub struct SnapshotCursor {
    entries: std::vec::IntoIter<LedgerEntry>,
    tracker: Option<CursorTracker>,
}

impl SnapshotCursor {
    /// Create a cursor over `entries`, registering it with `open`
    pub fn new(entries: Vec<LedgerEntry>, open: &Arc<AtomicUsize>) -> Self {
        Self {
            entries: entries.into_iter(),
            tracker: Some(CursorTracker::register(open)),
        }
    }

    /// Whether `close()` has not been called yet
    pub fn is_open(&self) -> bool {
        self.tracker.is_some()
    }
}

impl Iterator for SnapshotCursor {
    type Item = Result<LedgerEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.tracker.is_none() {
            return None;
        }
        self.entries.next().map(Ok)
    }
}

impl ScanCursor for SnapshotCursor {
    fn close(&mut self) -> Result<()> {
        self.tracker = None;
        self.entries = Vec::new().into_iter();
        Ok(())
    }
}

impl Drop for SnapshotCursor {
    fn drop(&mut self) {
        if self.tracker.is_some() {
            warn!("range scan cursor dropped without close");
        }
    }
}

/// Copy `start <= key < end` out of `map`; empty bounds are open
pub fn collect_range(map: &BTreeMap<String, Vec<u8>>, start: &str, end: &str) -> Vec<LedgerEntry> {
    // BTreeMap::range panics on an inverted range
    if !start.is_empty() && !end.is_empty() && start >= end {
        return Vec::new();
    }
    let lower = if start.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Included(start)
    };
    let upper = if end.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Excluded(end)
    };
    map.range::<str, _>((lower, upper))
        .map(|(k, v)| LedgerEntry::new(k.clone(), v.clone()))
        .collect()
}
