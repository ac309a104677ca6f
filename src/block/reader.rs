//! Block Reader
//!
//! Decodes a finished block in place. Keys stored in full and all values
//! are zero-copy views into the block buffer; prefix-compressed keys are
//! rebuilt into a fresh buffer.

use std::cmp::Ordering;

use crate::codec::Decoder;
use crate::error::{KvError, Result};
use crate::kv::KeyValue;
use crate::view::ByteView;

use super::RESTART_ENTRY_SIZE;

/// A read-only view over an encoded data block
#[derive(Debug, Clone)]
pub struct DataBlock {
    /// Entry region (everything before the restart trailer)
    body: ByteView,
    /// Restart offsets, still encoded
    restarts: ByteView,
    num_restarts: usize,
}

impl DataBlock {
    /// Parse the restart trailer of `data`
    pub fn new(data: ByteView) -> Result<Self> {
        if data.len() < RESTART_ENTRY_SIZE {
            return Err(KvError::format(format!(
                "block of {} bytes is too short for a restart count",
                data.len()
            )));
        }
        let num_restarts = Decoder::new(data.subrange(-(RESTART_ENTRY_SIZE as isize)))
            .read_u32_be()? as usize;
        let trailer = num_restarts
            .checked_mul(RESTART_ENTRY_SIZE)
            .and_then(|n| n.checked_add(RESTART_ENTRY_SIZE))
            .filter(|&n| n <= data.len())
            .ok_or_else(|| {
                KvError::format(format!(
                    "block restart count {} exceeds block length {}",
                    num_restarts,
                    data.len()
                ))
            })?;

        let body_len = data.len() - trailer;
        Ok(Self {
            body: data.subrange_len(0, body_len),
            restarts: data.subrange_len(body_len as isize, num_restarts * RESTART_ENTRY_SIZE),
            num_restarts,
        })
    }

    pub fn num_restarts(&self) -> usize {
        self.num_restarts
    }

    /// Iterate every entry from the start of the block
    pub fn iter(&self) -> BlockIter {
        BlockIter::new(self.body.clone(), 0)
    }

    /// Iterate from the first entry whose key is `>= term` to the end
    ///
    /// `None` or an empty term starts at the first entry.
    pub fn find(&self, term: Option<&[u8]>) -> Result<BlockIter> {
        let term = match term {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(self.iter()),
        };

        // Rightmost restart whose key is strictly less than the term.
        let mut lo = 0;
        let mut hi = self.num_restarts;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.restart_key(mid)?.as_slice().cmp(term) {
                Ordering::Less => lo = mid + 1,
                _ => hi = mid,
            }
        }
        let start = match lo.checked_sub(1) {
            Some(idx) => self.restart_offset(idx)?,
            None => 0,
        };

        let mut iter = BlockIter::new(self.body.clone(), start);
        iter.seek(term)?;
        Ok(iter)
    }

    fn restart_offset(&self, idx: usize) -> Result<usize> {
        let offset = Decoder::at(self.restarts.clone(), idx * RESTART_ENTRY_SIZE)
            .read_u32_be()? as usize;
        if offset >= self.body.len() {
            return Err(KvError::format(format!(
                "restart offset {} outside block body of {} bytes",
                offset,
                self.body.len()
            )));
        }
        Ok(offset)
    }

    /// Decode just the key of restart `idx`
    fn restart_key(&self, idx: usize) -> Result<ByteView> {
        let mut dec = Decoder::at(self.body.clone(), self.restart_offset(idx)?);
        let prefix = dec.read_uint()?;
        if prefix != 0 {
            return Err(KvError::format(format!(
                "restart entry {} has non-zero prefix length {}",
                idx, prefix
            )));
        }
        dec.read_raw()
    }
}

/// Forward iterator over block entries
///
/// Yields `Err` at most once; iteration ends after an error.
#[derive(Debug, Clone)]
pub struct BlockIter {
    dec: Decoder,
    prev_key: ByteView,
    /// Entry already decoded by a seek
    pending: Option<KeyValue>,
    done: bool,
}

impl BlockIter {
    fn new(body: ByteView, start: usize) -> Self {
        Self {
            dec: Decoder::at(body, start),
            prev_key: ByteView::empty(),
            pending: None,
            done: false,
        }
    }

    /// An iterator that yields nothing
    pub fn empty() -> Self {
        let mut iter = Self::new(ByteView::empty(), 0);
        iter.done = true;
        iter
    }

    /// Skip entries whose key is `< term`
    fn seek(&mut self, term: &[u8]) -> Result<()> {
        while let Some(kv) = self.decode_next()? {
            if kv.key.as_slice() >= term {
                self.pending = Some(kv);
                return Ok(());
            }
        }
        Ok(())
    }

    fn decode_next(&mut self) -> Result<Option<KeyValue>> {
        if self.done || self.dec.is_empty() {
            self.done = true;
            return Ok(None);
        }
        let prefix = self.dec.read_uint()? as usize;
        let suffix = self.dec.read_raw()?;
        let value = self.dec.read_raw_or_nil()?;

        let key = if prefix == 0 {
            suffix
        } else {
            if prefix > self.prev_key.len() {
                return Err(KvError::format(format!(
                    "prefix length {} exceeds previous key length {}",
                    prefix,
                    self.prev_key.len()
                )));
            }
            let mut key = Vec::with_capacity(prefix + suffix.len());
            key.extend_from_slice(&self.prev_key[..prefix]);
            key.extend_from_slice(&suffix);
            ByteView::from(key)
        };
        self.prev_key = key.clone();
        Ok(Some(KeyValue::new(key, value)))
    }
}

impl Iterator for BlockIter {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(kv) = self.pending.take() {
            return Some(Ok(kv));
        }
        match self.decode_next() {
            Ok(Some(kv)) => Some(Ok(kv)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
