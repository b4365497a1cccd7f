//! FileLedger: ordered ledger persisted as an append-only log
//!
//! The full key space lives in memory (same structure as `MemoryLedger`);
//! every mutation is appended to `ledger.log` before it is applied. Opening
//! a directory replays the log.
//!
//! ## Recovery
//!
//! - A torn final frame (crash mid-append) is truncated away with a warning.
//! - A complete frame that fails its CRC, or carries an unknown op, fails the
//!   open: the log is corrupt and silently dropping history would change
//!   which records exist.
//!
//! ## Failed Appends
//!
//! A mutation whose append fails (short write, failed sync) is not applied,
//! and the log is truncated back to the last frame boundary so later frames
//! never land behind a torn one. If that truncation itself fails the ledger
//! is poisoned: every further mutation is refused until it is reopened or
//! compacted, since compaction rewrites the log from acknowledged state.
//!
//! ## Compaction
//!
//! `compact()` rewrites the log to one put per live key, via a temporary
//! file and an atomic rename.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use txledger_core::{Error, Ledger, Result, ScanCursor};

use crate::cursor::{collect_range, SnapshotCursor};
use crate::encoding::{decode_op, encode_op, FrameError, LogOp};

/// Log file name inside the data directory
pub const LOG_FILE_NAME: &str = "ledger.log";

const COMPACT_FILE_NAME: &str = "ledger.log.compact";

/// When appended frames are forced to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// fsync after every append. Zero loss on crash.
    #[default]
    Always,
    /// Leave flushing to the OS. May lose recent writes on crash.
    None,
}

/// Failure injected into the next log append
///
/// Used to exercise the failed-append path without a full disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendFault {
    /// Write only the first `n` bytes of the frame, then fail
    ShortWrite(usize),
    /// Write the whole frame, then fail the sync
    SyncFailure,
}

/// Ordered ledger backed by an append-only log file
#[derive(Debug)]
pub struct FileLedger {
    dir: PathBuf,
    data: RwLock<BTreeMap<String, Vec<u8>>>,
    log: Mutex<File>,
    sync: SyncMode,
    version: AtomicU64,
    open_cursors: Arc<AtomicUsize>,
    /// Set when a failed append could not be rolled back
    poisoned: AtomicBool,
    append_fault: Mutex<Option<AppendFault>>,
}

impl FileLedger {
    /// Open (or create) a ledger in `dir` with fsync on every write
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the directory or log cannot be opened,
    /// or the log is corrupt.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(dir, SyncMode::Always)
    }

    /// Open (or create) a ledger in `dir` with the given sync mode
    pub fn open_with(dir: impl AsRef<Path>, sync: SyncMode) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            Error::unavailable(
                "open",
                format!("failed to create data directory '{}': {}", dir.display(), e),
            )
        })?;
        let path = dir.join(LOG_FILE_NAME);

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| {
                Error::unavailable(
                    "open",
                    format!("failed to open ledger log '{}': {}", path.display(), e),
                )
            })?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| Error::unavailable("open", format!("failed to read ledger log: {}", e)))?;

        let (data, applied, valid_len) = replay(&buf)?;
        if valid_len < buf.len() {
            warn!(
                path = %path.display(),
                discarded = buf.len() - valid_len,
                "truncating torn frame at ledger log tail"
            );
            file.set_len(valid_len as u64).map_err(|e| {
                Error::unavailable("open", format!("failed to truncate torn tail: {}", e))
            })?;
        }

        info!(path = %path.display(), keys = data.len(), frames = applied, "opened file ledger");
        Ok(Self {
            dir,
            data: RwLock::new(data),
            log: Mutex::new(file),
            sync,
            version: AtomicU64::new(applied),
            open_cursors: Arc::new(AtomicUsize::new(0)),
            poisoned: AtomicBool::new(false),
            append_fault: Mutex::new(None),
        })
    }

    /// Data directory this ledger lives in
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the log file
    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }

    /// Sync mode in effect
    pub fn sync_mode(&self) -> SyncMode {
        self.sync
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the ledger holds no keys
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Number of mutations applied, including those replayed on open
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Number of range-scan cursors that have not been released
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Whether a failed append left the log in a state that could not be
    /// repaired; a poisoned ledger refuses mutations until reopened or
    /// compacted
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::SeqCst)
    }

    /// Make the next append fail with `fault`
    pub fn fail_next_append(&self, fault: AppendFault) {
        *self.append_fault.lock() = Some(fault);
    }

    /// Rewrite the log so it holds exactly one put per live key
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the rewrite fails; the existing log is
    /// left untouched in that case.
    pub fn compact(&self) -> Result<()> {
        // Hold the write lock so no mutation lands in the old log mid-rewrite
        let data = self.data.write();
        let mut log = self.log.lock();

        let tmp_path = self.dir.join(COMPACT_FILE_NAME);
        let mut buf = Vec::new();
        for (key, value) in data.iter() {
            buf.extend(encode_op(&LogOp::Put {
                key: key.clone(),
                value: value.clone(),
            }));
        }
        let compact_err = |e: io::Error| Error::unavailable("compact", e.to_string());
        let new_log = write_compacted(&tmp_path, &buf).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            compact_err(e)
        })?;
        // The handle follows the inode through the rename
        fs::rename(&tmp_path, self.log_path()).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            compact_err(e)
        })?;
        *log = new_log;
        if self.poisoned.swap(false, Ordering::SeqCst) {
            info!("compaction rewrote a poisoned ledger log, mutations re-enabled");
        }
        debug!(keys = data.len(), bytes = buf.len(), "compacted ledger log");
        Ok(())
    }

    fn check_writable(&self, op_name: &'static str) -> Result<()> {
        if self.is_poisoned() {
            return Err(Error::unavailable(
                op_name,
                "ledger poisoned by an unrecoverable append failure, reopen to recover",
            ));
        }
        Ok(())
    }

    /// Append `op`; on failure the log is cut back to where it was
    fn append(&self, log: &mut File, op: &LogOp, op_name: &'static str) -> Result<()> {
        let frame = encode_op(op);
        let start = log
            .metadata()
            .map_err(|e| Error::unavailable(op_name, format!("failed to stat ledger log: {}", e)))?
            .len();

        let Err(e) = self.write_frame(log, &frame) else {
            return Ok(());
        };
        if let Err(rollback) = self.truncate_to(log, start) {
            self.poisoned.store(true, Ordering::SeqCst);
            warn!(
                error = %e,
                rollback_error = %rollback,
                offset = start,
                "failed to roll back ledger log after append failure, ledger poisoned"
            );
            return Err(Error::unavailable(
                op_name,
                format!("failed to append to ledger log: {}; rollback failed: {}", e, rollback),
            ));
        }
        warn!(error = %e, offset = start, "ledger append failed, log rolled back");
        Err(Error::unavailable(op_name, format!("failed to append to ledger log: {}", e)))
    }

    fn write_frame(&self, log: &mut File, frame: &[u8]) -> io::Result<()> {
        match self.append_fault.lock().take() {
            Some(AppendFault::ShortWrite(n)) => {
                log.write_all(&frame[..n.min(frame.len())])?;
                return Err(io::Error::new(io::ErrorKind::Other, "injected short write"));
            }
            Some(AppendFault::SyncFailure) => {
                log.write_all(frame)?;
                return Err(io::Error::new(io::ErrorKind::Other, "injected sync failure"));
            }
            None => {}
        }
        log.write_all(frame)?;
        if self.sync == SyncMode::Always {
            log.sync_data()?;
        }
        Ok(())
    }

    fn truncate_to(&self, log: &mut File, len: u64) -> io::Result<()> {
        log.set_len(len)?;
        if self.sync == SyncMode::Always {
            log.sync_data()?;
        }
        Ok(())
    }
}

/// Write `buf` to a fresh file at `path` and return an append handle to it
fn write_compacted(path: &Path, buf: &[u8]) -> io::Result<File> {
    {
        let mut tmp = File::create(path)?;
        tmp.write_all(buf)?;
        tmp.sync_all()?;
    }
    OpenOptions::new().read(true).append(true).open(path)
}

/// Apply every complete frame in `buf`
///
/// Returns the resulting map, the number of frames applied, and the length
/// of the valid prefix (shorter than `buf` only when the tail is torn).
fn replay(buf: &[u8]) -> Result<(BTreeMap<String, Vec<u8>>, u64, usize)> {
    let mut data = BTreeMap::new();
    let mut offset = 0usize;
    let mut applied = 0u64;
    while offset < buf.len() {
        match decode_op(&buf[offset..], offset as u64) {
            Ok((op, used)) => {
                match op {
                    LogOp::Put { key, value } => {
                        data.insert(key, value);
                    }
                    LogOp::Delete { key } => {
                        data.remove(&key);
                    }
                }
                offset += used;
                applied += 1;
            }
            Err(FrameError::Incomplete { .. }) => break,
            Err(e @ FrameError::Corrupt { .. }) => {
                return Err(Error::unavailable("open", format!("corrupt ledger log: {}", e)));
            }
        }
    }
    Ok((data, applied, offset))
}

impl Ledger for FileLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        if key.is_empty() {
            return Err(Error::unavailable("put", "key must not be an empty string"));
        }
        self.check_writable("put")?;
        let mut data = self.data.write();
        let mut log = self.log.lock();
        let op = LogOp::Put {
            key: key.to_string(),
            value,
        };
        self.append(&mut log, &op, "put")?;
        if let LogOp::Put { key, value } = op {
            data.insert(key, value);
        }
        self.version.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.check_writable("delete")?;
        let mut data = self.data.write();
        if !data.contains_key(key) {
            return Ok(());
        }
        let mut log = self.log.lock();
        self.append(
            &mut log,
            &LogOp::Delete {
                key: key.to_string(),
            },
            "delete",
        )?;
        data.remove(key);
        self.version.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn range_scan(&self, start: &str, end: &str) -> Result<Box<dyn ScanCursor + '_>> {
        let entries = collect_range(&self.data.read(), start, end);
        Ok(Box::new(SnapshotCursor::new(entries, &self.open_cursors)))
    }
}
