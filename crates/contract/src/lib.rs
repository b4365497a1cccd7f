//! Record store facade and transaction contract for txledger
//!
//! This crate layers content-addressed CRUD on top of any `Ledger`:
//! - RecordStore: create/read/delete/exists/list with existence checks
//!   before every mutation, generic over the record codec
//! - TxContract: the transaction operation surface (InitLedger, CreateTX,
//!   ReadTX, DeleteTX, TXExists, GetAllTXs)
//! - ListPolicy: explicit choice between fail-fast and skip-malformed listing
//! - LedgerConfig: `txledger.toml` configuration
//!
//! # Example
//!
//! ```
//! use txledger_contract::TxContract;
//! use txledger_storage::MemoryLedger;
//!
//! let contract = TxContract::new(MemoryLedger::new());
//! let key = contract.create_tx("test_binding", 0).unwrap();
//! assert!(contract.tx_exists(key.as_str()).unwrap());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod contract;
pub mod listing;
pub mod store;

pub use config::{LedgerConfig, CONFIG_FILE_NAME};
pub use contract::{seed_transactions, TxContract};
pub use listing::{Entries, ListPolicy, Listing};
pub use store::RecordStore;
