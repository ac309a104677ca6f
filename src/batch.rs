//! Write batches
//!
//! A batch is the unit of atomic application and the payload of one
//! write-ahead log transaction. Its wire format is simply the
//! concatenation of `(raw key, raw value | nil)` pairs:
//!
//! ```text
//! ┌─────────┬───────────┬─────────┬───────────┬─────┐
//! │ raw key │ raw value │ raw key │    nil    │ ... │
//! └─────────┴───────────┴─────────┴───────────┴─────┘
//!   put("a", "1")         delete("b")
//! ```
//!
//! Order is significant: when a key appears more than once the last
//! operation wins on replay.

use bytes::BytesMut;

use crate::codec::{self, Decoder};
use crate::error::Result;
use crate::kv::KeyValue;
use crate::view::ByteView;

/// An ordered list of puts and deletes, already encoded
#[derive(Debug, Clone, Default)]
pub struct Batch {
    buf: BytesMut,
    count: usize,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) -> &mut Self {
        codec::write_raw(&mut self.buf, key);
        codec::write_raw(&mut self.buf, value);
        self.count += 1;
        self
    }

    pub fn delete(&mut self, key: &[u8]) -> &mut Self {
        codec::write_raw(&mut self.buf, key);
        codec::write_nil(&mut self.buf);
        self.count += 1;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encoded size in bytes
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Number of operations added since construction or `clear`
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.count = 0;
    }

    /// A copy of the wire bytes
    pub fn as_view(&self) -> ByteView {
        ByteView::copy_from_slice(&self.buf)
    }

    /// Wrap wire bytes read back from the log
    ///
    /// The operation count is not known until the batch is iterated.
    pub fn from_view(view: ByteView) -> BatchIter {
        BatchIter {
            dec: Decoder::new(view),
        }
    }

    /// Decode the operations in order
    pub fn iter(&self) -> BatchIter {
        Self::from_view(self.as_view())
    }
}

/// Decodes `(key, value-or-nil)` pairs from batch wire bytes
#[derive(Debug, Clone)]
pub struct BatchIter {
    dec: Decoder,
}

impl BatchIter {
    /// Decode everything, failing on the first malformed pair
    pub fn collect_all(self) -> Result<Vec<KeyValue>> {
        self.collect()
    }
}

impl Iterator for BatchIter {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.dec.is_empty() {
            return None;
        }
        let item = self.decode_pair();
        if item.is_err() {
            // Stop after the first error; the rest of the buffer is unreliable.
            self.dec = Decoder::new(ByteView::empty());
        }
        Some(item)
    }
}

impl BatchIter {
    fn decode_pair(&mut self) -> Result<KeyValue> {
        let key = self.dec.read_raw()?;
        let value = self.dec.read_raw_or_nil()?;
        Ok(KeyValue::new(key, value))
    }
}
