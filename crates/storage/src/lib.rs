//! Reference ledgers for txledger
//!
//! This crate implements the `Ledger` collaborator trait twice:
//! - MemoryLedger: BTreeMap-based ordered store with RwLock
//! - FileLedger: the same ordered map backed by an append-only log file
//!   with CRC32-framed entries, replayed on open
//!
//! Both hand out snapshot cursors for range scans and count the cursors that
//! are still open, so callers can verify every scan was released.
//!
//! The `testing` module provides a fault-injecting wrapper for exercising
//! error paths in code built on top of a ledger.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod encoding;
pub mod file;
pub mod memory;
pub mod testing;

pub use cursor::SnapshotCursor;
pub use file::{AppendFault, FileLedger, SyncMode, LOG_FILE_NAME};
pub use memory::MemoryLedger;
