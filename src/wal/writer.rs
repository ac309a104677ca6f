//! WAL Writer
//!
//! Splits each transaction into records that never cross a block
//! boundary and appends them to a [`WritableFile`].

use tracing::trace;

use crate::config::WalSyncStrategy;
use crate::error::Result;
use crate::fs::WritableFile;

use super::record::{encode_header, RecordType, BLOCK_SIZE, HEADER_SIZE};

const ZEROES: [u8; HEADER_SIZE] = [0; HEADER_SIZE];

/// Appends transactions to a log
///
/// `emit` takes `&mut self`; share a writer between threads behind a lock.
pub struct WalWriter<W: WritableFile> {
    file: W,
    /// Absolute offset of the next byte written
    position: u64,
    sync_strategy: WalSyncStrategy,
    /// Transactions emitted since the last sync
    uncommitted: usize,
}

impl<W: WritableFile> WalWriter<W> {
    /// Append to `file`, which already holds `position` bytes of log
    pub fn new(file: W, position: u64, sync_strategy: WalSyncStrategy) -> Self {
        Self {
            file,
            position,
            sync_strategy,
            uncommitted: 0,
        }
    }

    /// Append one transaction
    ///
    /// Returns the offset of its first record.
    pub fn emit(&mut self, transaction: &[u8]) -> Result<u64> {
        let mut left = self.block_left();
        if left < HEADER_SIZE {
            self.file.write_all(&ZEROES[..left])?;
            self.position += left as u64;
            left = BLOCK_SIZE;
        }
        let start = self.position;

        let mut rest = transaction;
        let mut split = false;
        while rest.len() + HEADER_SIZE > left {
            let (chunk, tail) = rest.split_at(left - HEADER_SIZE);
            let record_type = if split {
                RecordType::Middle
            } else {
                RecordType::First
            };
            self.write_record(record_type, chunk)?;
            rest = tail;
            split = true;
            left = BLOCK_SIZE;
        }
        let record_type = if split {
            RecordType::Last
        } else {
            RecordType::Full
        };
        self.write_record(record_type, rest)?;

        self.uncommitted += 1;
        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.uncommitted >= count,
        };
        if due {
            self.sync()?;
        }
        Ok(start)
    }

    fn write_record(&mut self, record_type: RecordType, payload: &[u8]) -> Result<()> {
        trace!(?record_type, len = payload.len(), offset = self.position, "log record");
        self.file.write_all(&encode_header(record_type, payload))?;
        self.file.write_all(payload)?;
        self.position += (HEADER_SIZE + payload.len()) as u64;
        Ok(())
    }

    fn block_left(&self) -> usize {
        BLOCK_SIZE - (self.position % BLOCK_SIZE as u64) as usize
    }

    /// Force everything emitted so far to durable storage
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Transactions emitted since the last sync
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    /// Current length of the log in bytes
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> W {
        self.file
    }
}
