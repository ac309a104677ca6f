//! Random-access Tablet Reader
//!
//! Holds the whole tablet as one [`ByteView`]; blocks are decoded on
//! demand and never cached, so a `Tablet` is cheap to clone and share
//! between threads.

use std::sync::Arc;

use tracing::debug;

use crate::block::{BlockIter, DataBlock};
use crate::codec::Decoder;
use crate::config::ReaderOptions;
use crate::error::{KvError, Result};
use crate::kv::KeyValue;
use crate::merge::{KvIter, KvSource};
use crate::view::ByteView;

use super::format::{
    self, into_validation, BlockHeader, Footer, IndexRecord, DATA_INDEX_MAGIC, FOOTER_SIZE,
    HEADER_SIZE, META_INDEX_MAGIC,
};

/// An open, immutable tablet
#[derive(Debug, Clone)]
pub struct Tablet {
    data: ByteView,
    footer: Footer,
    index: Arc<[IndexRecord]>,
    opts: ReaderOptions,
}

impl Tablet {
    /// Validate header, footer and both index sections of `data`
    pub fn open(data: ByteView, opts: ReaderOptions) -> Result<Self> {
        if data.len() < HEADER_SIZE + FOOTER_SIZE {
            return Err(KvError::validation(format!(
                "tablet of {} bytes is too short",
                data.len()
            )));
        }
        format::check_header(&data[..HEADER_SIZE])?;
        let footer = Footer::decode(&data)?;

        let body_end = (data.len() - FOOTER_SIZE) as u64;
        let meta = section(&data, footer.meta_index_offset, footer.meta_index_length, body_end)?;
        format::decode_index(meta, META_INDEX_MAGIC)?;

        let index = section(&data, footer.data_index_offset, footer.data_index_length, body_end)?;
        let index = format::decode_index(index, DATA_INDEX_MAGIC)?;

        for record in &index {
            let end = record.offset.checked_add(record.length);
            if record.offset < HEADER_SIZE as u64
                || end.map_or(true, |end| end > footer.meta_index_offset)
            {
                return Err(KvError::validation(format!(
                    "index record [{}, +{}) outside data region",
                    record.offset, record.length
                )));
            }
        }

        debug!(
            bytes = data.len(),
            blocks = index.len(),
            "opened tablet"
        );

        Ok(Self {
            data,
            footer,
            index: index.into(),
            opts,
        })
    }

    /// Size of the tablet file in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.index.len()
    }

    pub fn index(&self) -> &[IndexRecord] {
        &self.index
    }

    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    /// Stored framing of block `i`
    pub fn block_header(&self, i: usize) -> Result<BlockHeader> {
        let mut dec = Decoder::new(self.stored_block(i)?);
        BlockHeader::decode(&mut dec)
    }

    /// Load, verify and decompress data block `i`
    pub fn block(&self, i: usize) -> Result<DataBlock> {
        let mut dec = Decoder::new(self.stored_block(i)?);
        let header = BlockHeader::decode(&mut dec)?;
        let payload = usize::try_from(header.length)
            .map_err(|_| KvError::validation("block length overflows usize"))
            .and_then(|len| dec.read_bytes(len).map_err(into_validation))?;
        let raw = format::decode_payload(&header, payload, &self.opts)?;
        DataBlock::new(raw).map_err(into_validation)
    }

    fn stored_block(&self, i: usize) -> Result<ByteView> {
        let record = self.index.get(i).ok_or_else(|| {
            KvError::validation(format!("block {} out of range ({} blocks)", i, self.index.len()))
        })?;
        self.data
            .try_subrange_len(record.offset as isize, record.length as usize)
            .ok_or_else(|| KvError::validation(format!("block {} truncated", i)))
    }

    /// Iterate every entry in key order
    pub fn iter(&self) -> Result<TabletIter> {
        self.find(None)
    }

    /// Iterate from the first key `>= term` to the end of the tablet
    ///
    /// The data index selects the last block whose first key is strictly
    /// less than `term`; every following block is read from its start.
    pub fn find(&self, term: Option<&[u8]>) -> Result<TabletIter> {
        if self.index.is_empty() {
            return Ok(TabletIter {
                tablet: self.clone(),
                next_block: 0,
                current: BlockIter::empty(),
                done: true,
            });
        }

        let start = match term {
            Some(t) if !t.is_empty() => self
                .index
                .partition_point(|r| r.first_key.as_slice() < t)
                .saturating_sub(1),
            _ => 0,
        };

        let current = self.block(start)?.find(term)?;
        Ok(TabletIter {
            tablet: self.clone(),
            next_block: start + 1,
            current,
            done: false,
        })
    }
}

fn section(data: &ByteView, offset: u64, length: u64, limit: u64) -> Result<ByteView> {
    match offset.checked_add(length) {
        Some(end) if end <= limit => Ok(data.subrange_len(offset as isize, length as usize)),
        _ => Err(KvError::validation(format!(
            "index section [{}, +{}) outside tablet body of {} bytes",
            offset, length, limit
        ))),
    }
}

impl KvSource for Tablet {
    fn find(&self, term: Option<&[u8]>) -> Result<KvIter> {
        Ok(Box::new(Tablet::find(self, term)?))
    }
}

/// Entries of a tablet, block after block
///
/// Yields `Err` at most once; iteration ends after an error.
#[derive(Debug, Clone)]
pub struct TabletIter {
    tablet: Tablet,
    next_block: usize,
    current: BlockIter,
    done: bool,
}

impl Iterator for TabletIter {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            match self.current.next() {
                Some(Ok(kv)) => return Some(Ok(kv)),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(into_validation(e)));
                }
                None => {}
            }
            if self.next_block >= self.tablet.block_count() {
                self.done = true;
                return None;
            }
            match self.tablet.block(self.next_block) {
                Ok(block) => {
                    self.current = block.iter();
                    self.next_block += 1;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
