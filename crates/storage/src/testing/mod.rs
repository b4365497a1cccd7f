//! Testing utilities for ledger consumers and ledger durability
//!
//! This module provides tools for testing code built on a ledger:
//!
//! - **Faults**: a wrapper that fails chosen ledger operations and counts calls
//! - **Corruption**: `FileLedger` log damage simulation for recovery testing
//!
//! # Example
//!
//! ```ignore
//! use txledger_storage::testing::{FaultyLedger, LedgerOp, LogCorruptionTester};
//!
//! // Exercise a collaborator failure
//! let ledger = FaultyLedger::new(MemoryLedger::new());
//! ledger.fail(LedgerOp::Get);
//!
//! // Test recovery from a torn log tail
//! let tester = LogCorruptionTester::new("path/to/db");
//! tester.truncate_tail(3)?;
//! ```

mod corruption;
mod faults;

pub use corruption::{LogCorruptionTester, TruncationResult};
pub use faults::{FaultyLedger, LedgerOp};
