//! Transaction contract: the exposed operation surface
//!
//! `TxContract` is the transaction-specific face of [`RecordStore`]. Each
//! method is one unit of work against the ledger and emits a `tracing` event
//! naming the operation and, where there is one, the key.

use tracing::{debug, info_span};

use txledger_core::{Ledger, Result, Transaction, TxCodec, TxKey};

use crate::listing::{ListPolicy, Listing};
use crate::store::RecordStore;

/// Well-known transactions written by [`TxContract::init_ledger`]
pub fn seed_transactions() -> Vec<Transaction> {
    vec![Transaction::new("test_binding", 0)]
}

/// Transaction operations over a ledger
#[derive(Debug, Clone)]
pub struct TxContract<L> {
    store: RecordStore<L, TxCodec>,
}

impl<L: Ledger> TxContract<L> {
    /// Create a contract over `ledger`
    pub fn new(ledger: L) -> Self {
        Self {
            store: RecordStore::new(ledger),
        }
    }

    /// The record store backing this contract
    pub fn store(&self) -> &RecordStore<L, TxCodec> {
        &self.store
    }

    /// The underlying ledger
    pub fn ledger(&self) -> &L {
        self.store.ledger()
    }

    /// InitLedger: write the well-known transactions unconditionally
    pub fn init_ledger(&self) -> Result<Vec<TxKey>> {
        let _span = info_span!("init_ledger").entered();
        self.store.seed(&seed_transactions())
    }

    /// CreateTX: store a new transaction and return its key
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if an identical transaction is already stored.
    pub fn create_tx(&self, binding: impl Into<String>, timestamp: i64) -> Result<TxKey> {
        let tx = Transaction::new(binding, timestamp);
        let _span = info_span!("create_tx", timestamp).entered();
        self.store.create(&tx)
    }

    /// ReadTX: load the transaction stored under `key`
    pub fn read_tx(&self, key: &str) -> Result<Transaction> {
        let _span = info_span!("read_tx", key).entered();
        let tx = self.store.read(key)?;
        debug!(target: "txledger::contract", binding = %tx.binding, "transaction read");
        Ok(tx)
    }

    /// DeleteTX: remove the transaction stored under `key`
    pub fn delete_tx(&self, key: &str) -> Result<()> {
        let _span = info_span!("delete_tx", key).entered();
        self.store.delete(key)
    }

    /// TXExists: whether anything is stored under `key`
    pub fn tx_exists(&self, key: &str) -> Result<bool> {
        let _span = info_span!("tx_exists", key).entered();
        self.store.exists(key)
    }

    /// GetAllTXs: every transaction in key order
    ///
    /// Fail-fast: the first malformed entry aborts the call with
    /// `Error::Decode` and no records are returned.
    pub fn get_all_txs(&self) -> Result<Vec<Transaction>> {
        let _span = info_span!("get_all_txs").entered();
        let txs = self.store.list_all()?.collect::<Result<Vec<_>>>()?;
        debug!(target: "txledger::contract", count = txs.len(), "listed transactions");
        Ok(txs)
    }

    /// Every transaction with its key, under an explicit malformed-entry policy
    pub fn get_all_txs_with_policy(&self, policy: ListPolicy) -> Result<Listing<Transaction>> {
        let _span = info_span!("get_all_txs", policy = policy.as_str()).entered();
        self.store.list_with_policy(policy)
    }
}
