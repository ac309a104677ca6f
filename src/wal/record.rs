//! WAL record framing
//!
//! Record layout:
//! ```text
//! +--------+--------+--------+-------------------+
//! | CRC32  |  Type  |  Len   |      Payload      |
//! | 4 bytes| 1 byte |2 bytes |    Len bytes      |
//! +--------+--------+--------+-------------------+
//! ```
//!
//! - CRC32: IEEE checksum of the payload only, big-endian
//! - Type: position of this record within its transaction
//! - Len: payload length, big-endian

use crate::error::{KvError, Result};

/// Physical block size; records never cross a block boundary
pub const BLOCK_SIZE: usize = 32 * 1024;

/// Record header size in bytes
pub const HEADER_SIZE: usize = 4 + 1 + 2;

/// Largest payload a single record can carry
pub const MAX_PAYLOAD: usize = BLOCK_SIZE - HEADER_SIZE;

/// Where a record sits within its transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    /// The whole transaction
    Full = 1,
    /// First chunk of a split transaction
    First = 2,
    /// Interior chunk
    Middle = 3,
    /// Final chunk
    Last = 4,
}

impl TryFrom<u8> for RecordType {
    type Error = KvError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Full),
            2 => Ok(Self::First),
            3 => Ok(Self::Middle),
            4 => Ok(Self::Last),
            other => Err(KvError::format(format!("unknown log record type {}", other))),
        }
    }
}

/// Encode a record header for `payload`
pub fn encode_header(record_type: RecordType, payload: &[u8]) -> [u8; HEADER_SIZE] {
    debug_assert!(payload.len() <= MAX_PAYLOAD);
    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(&crc32fast::hash(payload).to_be_bytes());
    header[4] = record_type as u8;
    header[5..7].copy_from_slice(&(payload.len() as u16).to_be_bytes());
    header
}
