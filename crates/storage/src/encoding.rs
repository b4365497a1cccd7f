//! Ledger log frame encoding and decoding
//!
//! `FileLedger` persists every mutation as one frame in an append-only log.
//!
//! ## Frame Format
//!
//! ```text
//! [length: u32][op: u8][payload: bytes][crc32: u32]
//! ```
//!
//! - **length**: size of op + payload + crc (NOT including length itself)
//! - **op**: 1 = Put, 2 = Delete
//! - **payload**: Put = `[key_len: u32][key][value]`, Delete = `[key]`
//! - **crc32**: CRC32 over \[op\]\[payload\]
//!
//! All integers are little-endian. Keys are UTF-8.

use crc32fast::Hasher;
use thiserror::Error;

/// Op tag for a put frame
pub const OP_PUT: u8 = 1;
/// Op tag for a delete frame
pub const OP_DELETE: u8 = 2;

/// Smallest possible frame body: op(1) + crc(4)
const MIN_BODY_LEN: usize = 5;

/// One logged mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOp {
    /// Store `value` under `key`
    Put {
        /// Ledger key
        key: String,
        /// Stored bytes
        value: Vec<u8>,
    },
    /// Remove `key`
    Delete {
        /// Ledger key
        key: String,
    },
}

/// Frame decoding failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Buffer ends before the frame does (torn write at the tail)
    #[error("offset {offset}: incomplete frame (have {have} bytes, need {needed})")]
    Incomplete {
        /// File offset of the frame
        offset: u64,
        /// Bytes available from the offset
        have: usize,
        /// Bytes the frame requires
        needed: usize,
    },

    /// Frame is complete but its contents are invalid
    #[error("offset {offset}: {reason}")]
    Corrupt {
        /// File offset of the frame
        offset: u64,
        /// What was wrong
        reason: String,
    },
}

/// Encode a mutation as a log frame
pub fn encode_op(op: &LogOp) -> Vec<u8> {
    let (tag, payload) = match op {
        LogOp::Put { key, value } => {
            let mut payload = Vec::with_capacity(4 + key.len() + value.len());
            payload.extend_from_slice(&(key.len() as u32).to_le_bytes());
            payload.extend_from_slice(key.as_bytes());
            payload.extend_from_slice(value);
            (OP_PUT, payload)
        }
        LogOp::Delete { key } => (OP_DELETE, key.as_bytes().to_vec()),
    };

    let body_len = 1 + payload.len() + 4;
    let mut buf = Vec::with_capacity(4 + body_len);
    buf.extend_from_slice(&(body_len as u32).to_le_bytes());
    buf.push(tag);
    buf.extend_from_slice(&payload);

    let mut hasher = Hasher::new();
    hasher.update(&[tag]);
    hasher.update(&payload);
    buf.extend_from_slice(&hasher.finalize().to_le_bytes());
    buf
}

/// Decode one frame from the start of `buf`
///
/// Returns the mutation and the number of bytes consumed. `offset` is the
/// file position of `buf[0]`, used for error reporting only.
///
/// # Errors
///
/// - `Incomplete` when `buf` is shorter than the frame it starts
/// - `Corrupt` on CRC mismatch, unknown op, or malformed payload
pub fn decode_op(buf: &[u8], offset: u64) -> Result<(LogOp, usize), FrameError> {
    if buf.len() < 4 {
        return Err(FrameError::Incomplete {
            offset,
            have: buf.len(),
            needed: 4,
        });
    }
    let body_len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if body_len < MIN_BODY_LEN {
        return Err(FrameError::Corrupt {
            offset,
            reason: format!(
                "invalid frame length {} (minimum is {})",
                body_len, MIN_BODY_LEN
            ),
        });
    }
    let total = 4 + body_len;
    if buf.len() < total {
        return Err(FrameError::Incomplete {
            offset,
            have: buf.len(),
            needed: total,
        });
    }

    let tag = buf[4];
    let payload = &buf[5..total - 4];
    let stored_crc = u32::from_le_bytes([
        buf[total - 4],
        buf[total - 3],
        buf[total - 2],
        buf[total - 1],
    ]);
    let mut hasher = Hasher::new();
    hasher.update(&[tag]);
    hasher.update(payload);
    let computed_crc = hasher.finalize();
    if stored_crc != computed_crc {
        return Err(FrameError::Corrupt {
            offset,
            reason: format!(
                "CRC mismatch (stored {:08x}, computed {:08x})",
                stored_crc, computed_crc
            ),
        });
    }

    let corrupt = |reason: String| FrameError::Corrupt { offset, reason };
    let op = match tag {
        OP_PUT => {
            if payload.len() < 4 {
                return Err(corrupt("put frame too short for key length".into()));
            }
            let key_len =
                u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;
            let rest = &payload[4..];
            if rest.len() < key_len {
                return Err(corrupt(format!(
                    "put key length {} exceeds payload {}",
                    key_len,
                    rest.len()
                )));
            }
            let key = std::str::from_utf8(&rest[..key_len])
                .map_err(|e| corrupt(format!("key is not UTF-8: {}", e)))?;
            LogOp::Put {
                key: key.to_string(),
                value: rest[key_len..].to_vec(),
            }
        }
        OP_DELETE => {
            let key = std::str::from_utf8(payload)
                .map_err(|e| corrupt(format!("key is not UTF-8: {}", e)))?;
            LogOp::Delete {
                key: key.to_string(),
            }
        }
        other => return Err(corrupt(format!("unknown op tag {}", other))),
    };
    Ok((op, total))
}
