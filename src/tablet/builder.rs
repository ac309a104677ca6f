//! Tablet Builder
//!
//! Streams sorted entries into a new tablet. The header is written
//! immediately; data blocks are written as they fill up; the index
//! sections and footer are written by [`TabletBuilder::finish`].

use std::io::Write;

use bytes::{BufMut, BytesMut};
use tracing::{debug, warn};

use crate::block::BlockBuilder;
use crate::config::TabletOptions;
use crate::error::Result;
use crate::kv::KeyValue;
use crate::view::ByteView;

use super::format::{
    self, Footer, IndexRecord, DATA_INDEX_MAGIC, HEADER_SIZE, META_INDEX_MAGIC,
};

/// What a finished tablet contains
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabletSummary {
    pub entry_count: u64,
    pub block_count: u64,
    pub first_key: Option<ByteView>,
    pub last_key: Option<ByteView>,
    /// Total bytes written, footer included
    pub file_size: u64,
}

/// Writer for a single tablet
pub struct TabletBuilder<W: Write> {
    writer: W,
    opts: TabletOptions,
    block: BlockBuilder,
    /// Bytes written so far
    offset: u64,
    /// Encoded data-index records
    index: BytesMut,
    /// Reused buffer for framing one stored block
    scratch: BytesMut,
    summary: TabletSummary,
}

impl<W: Write> TabletBuilder<W> {
    /// Validate `opts` and write the tablet header
    pub fn new(mut writer: W, opts: TabletOptions) -> Result<Self> {
        opts.validate()?;

        let mut header = BytesMut::with_capacity(HEADER_SIZE);
        format::write_header(&mut header);
        writer.write_all(&header)?;

        Ok(Self {
            writer,
            opts,
            block: BlockBuilder::new(opts.key_restart_interval),
            offset: HEADER_SIZE as u64,
            index: BytesMut::new(),
            scratch: BytesMut::new(),
            summary: TabletSummary::default(),
        })
    }

    /// Add an entry; `value == None` stores a tombstone
    ///
    /// Keys should be strictly increasing. A key that is not is logged
    /// and written anyway.
    pub fn add(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        if let Some(last) = &self.summary.last_key {
            if last.as_slice() >= key {
                warn!(
                    prev = ?last,
                    key = ?ByteView::copy_from_slice(key),
                    "writing non-increasing key to tablet"
                );
            }
        }

        self.block.append(key, value);

        let key = ByteView::copy_from_slice(key);
        if self.summary.first_key.is_none() {
            self.summary.first_key = Some(key.clone());
        }
        self.summary.last_key = Some(key);
        self.summary.entry_count += 1;

        if self.block.size() >= self.opts.block_size {
            self.flush_block()?;
        }
        Ok(())
    }

    fn flush_block(&mut self) -> Result<()> {
        if self.block.is_empty() {
            return Ok(());
        }
        let (first_key, raw) = self.block.finish();

        self.scratch.clear();
        format::encode_block(&mut self.scratch, &raw, self.opts.block_compression, 0)?;
        self.writer.write_all(&self.scratch)?;

        let record = IndexRecord {
            offset: self.offset,
            length: self.scratch.len() as u64,
            first_key,
        };
        record.encode(&mut self.index);

        debug!(
            offset = record.offset,
            raw_len = raw.len(),
            stored_len = record.length,
            "flushed tablet block"
        );

        self.offset += record.length;
        self.summary.block_count += 1;
        Ok(())
    }

    /// Flush the last block, write both index sections and the footer
    pub fn finish(mut self) -> Result<TabletSummary> {
        self.flush_block()?;

        let meta_index_offset = self.offset;
        let mut tail = BytesMut::with_capacity(self.index.len() + 64);
        tail.put_u32(META_INDEX_MAGIC);
        let meta_index_length = 4;

        let data_index_offset = meta_index_offset + meta_index_length;
        tail.put_u32(DATA_INDEX_MAGIC);
        tail.put_slice(&self.index);
        let data_index_length = self.index.len() as u64 + 4;

        Footer {
            meta_index_offset,
            meta_index_length,
            data_index_offset,
            data_index_length,
        }
        .encode(&mut tail);

        self.writer.write_all(&tail)?;
        self.writer.flush()?;

        self.summary.file_size = self.offset + tail.len() as u64;
        debug!(
            entries = self.summary.entry_count,
            blocks = self.summary.block_count,
            bytes = self.summary.file_size,
            "finished tablet"
        );
        Ok(self.summary)
    }
}

/// Write `records` (already in key order) as a complete tablet
pub fn write_tablet<W, I>(writer: W, records: I, opts: TabletOptions) -> Result<TabletSummary>
where
    W: Write,
    I: IntoIterator<Item = Result<KeyValue>>,
{
    let mut builder = TabletBuilder::new(writer, opts)?;
    for record in records {
        let kv = record?;
        builder.add(&kv.key, kv.value.as_deref())?;
    }
    builder.finish()
}
