//! Listing over a full-namespace range scan
//!
//! ## Cursor Lifetime
//!
//! A listing owns the ledger cursor through a guard that closes it on every
//! exit path: the scan runs out, an entry fails, or the caller drops the
//! listing early (including while unwinding). A close failure at that point
//! is logged; the records already produced stand.
//!
//! ## Malformed Entries
//!
//! [`ListPolicy::FailFast`] ends the listing at the first entry that does not
//! decode. [`ListPolicy::SkipMalformed`] drops such entries and reports their
//! keys instead. Collaborator errors end the listing under either policy.

use serde::{Deserialize, Serialize};
use tracing::warn;

use txledger_core::{Error, LedgerEntry, RecordCodec, Result, ScanCursor, TxKey};

/// What to do with an entry whose bytes fail to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListPolicy {
    /// Surface `Error::Decode` and stop
    #[default]
    FailFast,
    /// Skip the entry, log it, and report its key in [`Listing::skipped`]
    SkipMalformed,
}

impl ListPolicy {
    /// Config-file spelling of the policy
    pub fn as_str(&self) -> &'static str {
        match self {
            ListPolicy::FailFast => "fail-fast",
            ListPolicy::SkipMalformed => "skip-malformed",
        }
    }
}

/// Collected result of a policy-driven listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<R> {
    /// Decoded records with their keys, in ledger key order
    pub records: Vec<(TxKey, R)>,
    /// Keys of entries skipped under [`ListPolicy::SkipMalformed`]
    pub skipped: Vec<TxKey>,
}

impl<R> Listing<R> {
    /// Records without their keys
    pub fn into_records(self) -> Vec<R> {
        self.records.into_iter().map(|(_, record)| record).collect()
    }

    /// Whether any entry was skipped
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Closes the wrapped cursor exactly once, on release or drop
pub(crate) struct CursorGuard<'a> {
    cursor: Option<Box<dyn ScanCursor + 'a>>,
}

impl<'a> CursorGuard<'a> {
    pub(crate) fn new(cursor: Box<dyn ScanCursor + 'a>) -> Self {
        Self {
            cursor: Some(cursor),
        }
    }

    /// Next raw entry; `None` once exhausted or released
    pub(crate) fn next_entry(&mut self) -> Option<Result<LedgerEntry>> {
        let next = self.cursor.as_mut()?.next();
        if next.is_none() {
            self.release();
        }
        next
    }

    pub(crate) fn release(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            if let Err(e) = cursor.close() {
                warn!(target: "txledger::store", error = %e, "failed to close range scan cursor");
            }
        }
    }
}

impl Drop for CursorGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Lazy fail-fast listing of `(key, record)` pairs
///
/// Finite and non-restartable: after the first `None` or `Err`, every
/// further call returns `None`.
pub struct Entries<'a, C: RecordCodec> {
    guard: CursorGuard<'a>,
    codec: &'a C,
}

impl<'a, C: RecordCodec> Entries<'a, C> {
    pub(crate) fn new(cursor: Box<dyn ScanCursor + 'a>, codec: &'a C) -> Self {
        Self {
            guard: CursorGuard::new(cursor),
            codec,
        }
    }
}

impl<C: RecordCodec> Iterator for Entries<'_, C> {
    type Item = Result<(TxKey, C::Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.guard.next_entry()? {
            Ok(entry) => match self.codec.decode(&entry.value) {
                Ok(record) => Some(Ok((TxKey::new(entry.key), record))),
                Err(source) => {
                    self.guard.release();
                    Some(Err(Error::decode(entry.key, source)))
                }
            },
            Err(e) => {
                self.guard.release();
                Some(Err(e))
            }
        }
    }
}

/// Drain `guard` under `policy`
pub(crate) fn collect_with_policy<C: RecordCodec>(
    mut guard: CursorGuard<'_>,
    codec: &C,
    policy: ListPolicy,
) -> Result<Listing<C::Record>> {
    let mut listing = Listing {
        records: Vec::new(),
        skipped: Vec::new(),
    };
    while let Some(entry) = guard.next_entry() {
        let entry = entry?;
        match codec.decode(&entry.value) {
            Ok(record) => listing.records.push((TxKey::new(entry.key), record)),
            Err(source) => match policy {
                ListPolicy::FailFast => return Err(Error::decode(entry.key, source)),
                ListPolicy::SkipMalformed => {
                    warn!(
                        target: "txledger::store",
                        key = %entry.key,
                        reason = %source,
                        "skipping malformed ledger entry"
                    );
                    listing.skipped.push(TxKey::new(entry.key));
                }
            },
        }
    }
    Ok(listing)
}
