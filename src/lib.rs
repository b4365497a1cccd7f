//! txledger - content-addressed transaction store over an ordered key-value ledger
//!
//! Transactions are stored under the SHA-256 of their canonical JSON bytes,
//! so identical content always lands on the same key. The store refuses
//! duplicate creates and deletes of absent keys, and lists records in ledger
//! key order.
//!
//! # Quick Start
//!
//! ```
//! use txledger::contract::TxContract;
//! use txledger::storage::MemoryLedger;
//!
//! let contract = TxContract::new(MemoryLedger::new());
//! contract.init_ledger().unwrap();
//! let key = contract.create_tx("binding", 1).unwrap();
//! assert_eq!(contract.read_tx(key.as_str()).unwrap().binding, "binding");
//! assert_eq!(contract.get_all_txs().unwrap().len(), 2);
//! ```
//!
//! # Architecture
//!
//! - [`core`]: record types, the canonical codec, errors, and the `Ledger` trait
//! - [`storage`]: in-memory and log-backed file ledgers, plus test utilities
//! - [`contract`]: the record store facade, transaction contract, and config

pub use txledger_contract as contract;
pub use txledger_core as core;
pub use txledger_storage as storage;

pub use txledger_contract::{RecordStore, TxContract};
pub use txledger_core::{Error, Result, Transaction, TxKey};
