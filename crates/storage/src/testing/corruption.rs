//! Ledger log corruption utilities
//!
//! Provides utilities for simulating damage to a `FileLedger` log to test
//! recovery on open.
//!
//! # Corruption Types
//!
//! - Truncation: removes bytes from the log tail (crash during append)
//! - Garbage: appends bytes that do not form a complete frame
//! - Partial frame: appends the first bytes of a valid put frame
//! - Bit flip: flips one byte at a fixed offset (storage degradation)
//!
//! # Example
//!
//! ```ignore
//! use txledger_storage::testing::LogCorruptionTester;
//!
//! let tester = LogCorruptionTester::new("path/to/db");
//! tester.truncate_tail(3)?;
//! // FileLedger::open should discard the torn frame
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::encoding::{encode_op, LogOp};
use crate::file::LOG_FILE_NAME;

/// Ledger log corruption test utilities
pub struct LogCorruptionTester {
    /// Ledger data directory
    dir: PathBuf,
}

impl LogCorruptionTester {
    /// Create a new corruption tester for a ledger directory
    pub fn new(dir: impl AsRef<Path>) -> Self {
        LogCorruptionTester {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the ledger log
    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }

    /// Current log size in bytes
    pub fn log_size(&self) -> std::io::Result<u64> {
        Ok(fs::metadata(self.log_path())?.len())
    }

    /// Truncate the log tail by removing bytes
    ///
    /// Removes nothing if the log is not longer than `bytes_to_remove`.
    pub fn truncate_tail(&self, bytes_to_remove: usize) -> std::io::Result<TruncationResult> {
        let original_size = self.log_size()?;
        if original_size <= bytes_to_remove as u64 {
            return Ok(TruncationResult {
                original_size,
                new_size: original_size,
                bytes_removed: 0,
            });
        }

        let new_size = original_size - bytes_to_remove as u64;
        let file = OpenOptions::new().write(true).open(self.log_path())?;
        file.set_len(new_size)?;

        Ok(TruncationResult {
            original_size,
            new_size,
            bytes_removed: bytes_to_remove,
        })
    }

    /// Append raw bytes to the log tail
    pub fn append_garbage(&self, garbage: &[u8]) -> std::io::Result<u64> {
        let mut file = OpenOptions::new().append(true).open(self.log_path())?;
        file.write_all(garbage)?;
        self.log_size()
    }

    /// Append all but the last `missing` bytes of a valid put frame
    ///
    /// Simulates a crash in the middle of an append.
    pub fn append_partial_put(&self, key: &str, value: &[u8], missing: usize) -> std::io::Result<u64> {
        let frame = encode_op(&LogOp::Put {
            key: key.to_string(),
            value: value.to_vec(),
        });
        let keep = frame.len().saturating_sub(missing.max(1));
        self.append_garbage(&frame[..keep])
    }

    /// XOR the byte at `offset` with 0xff
    pub fn flip_byte(&self, offset: u64) -> std::io::Result<()> {
        let path = self.log_path();
        let mut data = fs::read(&path)?;
        let Some(byte) = data.get_mut(offset as usize) else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("offset {} beyond log of {} bytes", offset, data.len()),
            ));
        };
        *byte ^= 0xff;
        fs::write(path, data)
    }
}

/// Result of log truncation
#[derive(Debug)]
pub struct TruncationResult {
    /// Original file size
    pub original_size: u64,
    /// New file size after truncation
    pub new_size: u64,
    /// Bytes removed
    pub bytes_removed: usize,
}
