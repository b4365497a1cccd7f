//! RecordStore: content-addressed CRUD over a ledger
//!
//! ## Design
//!
//! RecordStore is a stateless facade over a `Ledger`. It holds no state
//! beyond the ledger handle and the codec; every record lives in the ledger.
//!
//! ## Key Discipline
//!
//! Keys are never chosen by the caller on create: they are derived from the
//! record's canonical bytes by the codec. Identical content therefore maps to
//! an identical key, and uniqueness reduces to "is this key present?".
//!
//! ## Existence Checks
//!
//! - `create` reads the derived key first and refuses to overwrite
//! - `delete` checks existence first and never issues a ledger delete for an
//!   absent key
//!
//! The check and the write are two ledger calls. The store takes no lock
//! between them; two concurrent creates of the same content are only
//! serialized if the ledger itself detects the conflict.
//!
//! ## Thread Safety
//!
//! RecordStore is `Send + Sync` whenever its ledger and codec are.

use tracing::{debug, info};

use txledger_core::{Error, Ledger, RecordCodec, Result, TxCodec, TxKey};

use crate::listing::{collect_with_policy, CursorGuard, Entries, ListPolicy, Listing};

/// Content-addressed record store
///
/// # Example
///
/// ```
/// use txledger_contract::RecordStore;
/// use txledger_core::Transaction;
/// use txledger_storage::MemoryLedger;
///
/// let store = RecordStore::new(MemoryLedger::new());
/// let key = store.create(&Transaction::new("b", 1)).unwrap();
/// assert_eq!(store.read(key.as_str()).unwrap(), Transaction::new("b", 1));
/// store.delete(key.as_str()).unwrap();
/// assert!(!store.exists(key.as_str()).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct RecordStore<L, C = TxCodec> {
    ledger: L,
    codec: C,
}

impl<L: Ledger> RecordStore<L, TxCodec> {
    /// Create a transaction store over `ledger`
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            codec: TxCodec,
        }
    }
}

impl<L: Ledger, C: RecordCodec> RecordStore<L, C> {
    /// Create a store over `ledger` using `codec`
    pub fn with_codec(ledger: L, codec: C) -> Self {
        Self { ledger, codec }
    }

    /// The underlying ledger
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The record codec
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Key `record` would be stored under; does not touch the ledger
    pub fn key_for(&self, record: &C::Record) -> TxKey {
        self.codec.key_of(record)
    }

    // ========== CRUD ==========

    /// Store a new record under its derived key
    ///
    /// Issues exactly one ledger write, and only when the key is absent.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists(key)` if a record with identical content is stored
    /// - `StoreUnavailable` if the ledger fails
    pub fn create(&self, record: &C::Record) -> Result<TxKey> {
        let bytes = self.codec.encode(record);
        let key = self.codec.derive_key(&bytes);

        if self.ledger.get(key.as_str())?.is_some() {
            debug!(target: "txledger::store", key = %key, "create rejected, key present");
            return Err(Error::AlreadyExists(key));
        }
        self.ledger.put(key.as_str(), bytes)?;
        debug!(target: "txledger::store", key = %key, "record created");
        Ok(key)
    }

    /// Load the record stored under `key`
    ///
    /// # Errors
    ///
    /// - `NotFound(key)` if nothing is stored under `key`
    /// - `Decode { key, .. }` if the stored bytes are not a canonical record
    /// - `StoreUnavailable` if the ledger fails
    pub fn read(&self, key: &str) -> Result<C::Record> {
        let bytes = self
            .ledger
            .get(key)?
            .ok_or_else(|| Error::NotFound(TxKey::new(key)))?;
        self.codec
            .decode(&bytes)
            .map_err(|source| Error::decode(key, source))
    }

    /// Remove the record stored under `key`
    ///
    /// # Errors
    ///
    /// - `NotFound(key)` if nothing is stored; no ledger delete is issued
    /// - `StoreUnavailable` if the ledger fails
    pub fn delete(&self, key: &str) -> Result<()> {
        if !self.exists(key)? {
            return Err(Error::NotFound(TxKey::new(key)));
        }
        self.ledger.delete(key)?;
        debug!(target: "txledger::store", key, "record deleted");
        Ok(())
    }

    /// Whether anything is stored under `key`
    ///
    /// # Errors
    ///
    /// Only `StoreUnavailable`, when the ledger fails.
    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.ledger.get(key)?.is_some())
    }

    // ========== Bootstrap ==========

    /// Write `records` without existence checks
    ///
    /// Bootstrap only: meant to run once against an empty ledger. Existing
    /// values under the same keys are overwritten (with identical bytes,
    /// since keys are content-derived).
    pub fn seed<'r, I>(&self, records: I) -> Result<Vec<TxKey>>
    where
        I: IntoIterator<Item = &'r C::Record>,
        C::Record: 'r,
    {
        let mut keys = Vec::new();
        for record in records {
            let bytes = self.codec.encode(record);
            let key = self.codec.derive_key(&bytes);
            self.ledger.put(key.as_str(), bytes)?;
            keys.push(key);
        }
        info!(target: "txledger::store", count = keys.len(), "seeded ledger");
        Ok(keys)
    }

    // ========== List Operations ==========

    /// Lazily list every record in ledger key order, fail-fast
    ///
    /// The first malformed entry yields `Err(Decode { key, .. })` and ends
    /// the sequence.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the scan cannot be opened.
    pub fn list_all(&self) -> Result<impl Iterator<Item = Result<C::Record>> + '_> {
        Ok(self
            .list_entries()?
            .map(|entry| entry.map(|(_, record)| record)))
    }

    /// Like [`RecordStore::list_all`], yielding each record with its key
    pub fn list_entries(&self) -> Result<Entries<'_, C>> {
        let cursor = self.ledger.range_scan("", "")?;
        Ok(Entries::new(cursor, &self.codec))
    }

    /// Collect every record under an explicit malformed-entry policy
    ///
    /// # Errors
    ///
    /// - `Decode { key, .. }` under `FailFast` for the first malformed entry
    /// - `StoreUnavailable` if the ledger fails, under either policy
    pub fn list_with_policy(&self, policy: ListPolicy) -> Result<Listing<C::Record>> {
        let cursor = self.ledger.range_scan("", "")?;
        collect_with_policy(CursorGuard::new(cursor), &self.codec, policy)
    }

    /// Every stored key in ledger order, without decoding values
    pub fn list_keys(&self) -> Result<Vec<TxKey>> {
        let mut guard = CursorGuard::new(self.ledger.range_scan("", "")?);
        let mut keys = Vec::new();
        while let Some(entry) = guard.next_entry() {
            keys.push(TxKey::new(entry?.key));
        }
        Ok(keys)
    }
}
