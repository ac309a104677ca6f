//! WAL Reader
//!
//! Reassembles transactions from the records of a log held in memory.

use tracing::warn;

use crate::error::{KvError, Result};
use crate::view::ByteView;

use super::record::{RecordType, BLOCK_SIZE, HEADER_SIZE};

/// Sequential reader over a whole log
#[derive(Debug, Clone)]
pub struct WalReader {
    data: ByteView,
    pos: usize,
    /// Start of the most recently attempted record
    record_start: usize,
}

impl WalReader {
    pub fn new(data: ByteView) -> Self {
        Self {
            data,
            pos: 0,
            record_start: 0,
        }
    }

    /// Offset of the next unread byte
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read the next complete transaction
    ///
    /// `Ok(None)` at the end of the log. A record that fails its checksum,
    /// a record type that is out of sequence, a truncated record or a log
    /// that ends inside a transaction is a [`KvError::Format`].
    pub fn next_transaction(&mut self) -> Result<Option<ByteView>> {
        let (record_type, payload) = match self.next_record()? {
            Some(record) => record,
            None => return Ok(None),
        };
        match record_type {
            RecordType::Full => return Ok(Some(payload)),
            RecordType::First => {}
            other => {
                return Err(KvError::format(format!(
                    "log record at offset {} starts a transaction with {:?}",
                    self.record_start, other
                )))
            }
        }

        let mut transaction = payload.to_vec();
        loop {
            let (record_type, payload) = self.next_record()?.ok_or_else(|| {
                KvError::format("log ends in the middle of a transaction")
            })?;
            match record_type {
                RecordType::Middle => transaction.extend_from_slice(&payload),
                RecordType::Last => {
                    transaction.extend_from_slice(&payload);
                    return Ok(Some(ByteView::from(transaction)));
                }
                other => {
                    return Err(KvError::format(format!(
                        "log record at offset {} continues a transaction with {:?}",
                        self.record_start, other
                    )))
                }
            }
        }
    }

    fn next_record(&mut self) -> Result<Option<(RecordType, ByteView)>> {
        let left = BLOCK_SIZE - self.pos % BLOCK_SIZE;
        if left < HEADER_SIZE {
            self.pos += left;
        }
        if self.pos + HEADER_SIZE > self.data.len() {
            return Ok(None);
        }

        self.record_start = self.pos;
        let header = &self.data[self.pos..self.pos + HEADER_SIZE];
        let checksum = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let type_byte = header[4];
        let length = u16::from_be_bytes([header[5], header[6]]) as usize;

        let block_left = BLOCK_SIZE - self.pos % BLOCK_SIZE;
        if HEADER_SIZE + length > block_left {
            return Err(KvError::format(format!(
                "log record at offset {} of {} bytes crosses a block boundary",
                self.pos, length
            )));
        }
        let payload = self
            .data
            .try_subrange_len((self.pos + HEADER_SIZE) as isize, length)
            .ok_or_else(|| {
                KvError::format(format!("log record at offset {} is truncated", self.pos))
            })?;
        let record_type = RecordType::try_from(type_byte)?;

        let actual = crc32fast::hash(&payload);
        if actual != checksum {
            return Err(KvError::format(format!(
                "log record at offset {}: checksum 0x{:08x} != computed 0x{:08x}",
                self.pos, checksum, actual
            )));
        }

        self.pos += HEADER_SIZE + length;
        Ok(Some((record_type, payload)))
    }

    /// Skip to the first block boundary after the last failed record
    fn resync(&mut self) {
        let next = (self.record_start / BLOCK_SIZE + 1) * BLOCK_SIZE;
        warn!(
            failed_at = self.record_start,
            resume_at = next,
            "skipping malformed log transaction"
        );
        self.pos = next.max(self.pos);
    }

    /// Every transaction in file order
    ///
    /// A malformed transaction is yielded as `Err`, after which reading
    /// resumes at the next block boundary.
    pub fn transactions(self) -> Transactions {
        Transactions { reader: self }
    }
}

/// Iterator returned by [`WalReader::transactions`]
#[derive(Debug, Clone)]
pub struct Transactions {
    reader: WalReader,
}

impl Iterator for Transactions {
    type Item = Result<ByteView>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.next_transaction() {
            Ok(Some(transaction)) => Some(Ok(transaction)),
            Ok(None) => None,
            Err(e) => {
                self.reader.resync();
                Some(Err(e))
            }
        }
    }
}
