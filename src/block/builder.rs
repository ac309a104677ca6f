//! Block Builder
//!
//! Accumulates sorted entries into one encoded block.

use bytes::{BufMut, BytesMut};

use crate::codec;
use crate::view::{common_prefix_len, ByteView};

use super::RESTART_ENTRY_SIZE;

/// Builds a single data block; reusable after [`finish`](Self::finish)
/// or [`reset`](Self::reset)
#[derive(Debug)]
pub struct BlockBuilder {
    /// Encoded entries
    body: BytesMut,
    /// Offsets of restart entries within `body`
    restarts: Vec<u32>,
    /// Entries between restart points
    restart_interval: usize,
    /// Entries appended since the last reset
    count: usize,
    last_key: Vec<u8>,
    first_key: Option<ByteView>,
}

impl BlockBuilder {
    /// Create a builder emitting a restart point every `restart_interval`
    /// entries (an interval of 0 is treated as 1)
    pub fn new(restart_interval: usize) -> Self {
        Self {
            body: BytesMut::new(),
            restarts: Vec::new(),
            restart_interval: restart_interval.max(1),
            count: 0,
            last_key: Vec::new(),
            first_key: None,
        }
    }

    /// Append an entry; `value == None` stores a tombstone
    ///
    /// Keys are expected in ascending order but this is not checked.
    /// Duplicates are kept in insertion order.
    pub fn append(&mut self, key: &[u8], value: Option<&[u8]>) {
        if self.first_key.is_none() {
            self.first_key = Some(ByteView::copy_from_slice(key));
        }

        let prefix = if self.count % self.restart_interval == 0 {
            self.restarts.push(self.body.len() as u32);
            0
        } else {
            common_prefix_len(&self.last_key, key)
        };

        codec::write_uint(&mut self.body, prefix as u64);
        codec::write_raw(&mut self.body, &key[prefix..]);
        match value {
            Some(v) => codec::write_raw(&mut self.body, v),
            None => codec::write_nil(&mut self.body),
        }

        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        self.count += 1;
    }

    /// Encoded size the block would have if finished now
    pub fn size(&self) -> usize {
        self.body.len() + RESTART_ENTRY_SIZE * self.restarts.len() + RESTART_ENTRY_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Entries appended since the last reset
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn first_key(&self) -> Option<&ByteView> {
        self.first_key.as_ref()
    }

    /// Append the restart trailer and return `(first_key, block)`
    ///
    /// The builder is left empty and ready for the next block.
    pub fn finish(&mut self) -> (ByteView, ByteView) {
        let mut out = std::mem::take(&mut self.body);
        out.reserve(RESTART_ENTRY_SIZE * (self.restarts.len() + 1));
        for offset in &self.restarts {
            out.put_u32(*offset);
        }
        out.put_u32(self.restarts.len() as u32);

        let first_key = self.first_key.take().unwrap_or_default();
        self.reset();
        (first_key, ByteView::from(out.freeze()))
    }

    pub fn reset(&mut self) {
        self.body.clear();
        self.restarts.clear();
        self.count = 0;
        self.last_key.clear();
        self.first_key = None;
    }
}
