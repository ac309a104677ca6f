//! MemTable implementation

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::batch::Batch;
use crate::error::{KvError, Result};
use crate::kv::KeyValue;
use crate::merge::{KvIter, KvSource};
use crate::view::ByteView;

use super::MemTableEntry;

type Map = BTreeMap<ByteView, MemTableEntry>;

/// In-memory table for recent writes
#[derive(Debug, Default)]
pub struct MemTable {
    data: Mutex<Arc<Map>>,
    /// Sum of key (+ value) lengths ever written; never decreases
    approx_size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply every operation of `batch` in order
    ///
    /// The batch is decoded before anything is changed, so a malformed
    /// batch leaves the table untouched.
    pub fn apply(&self, batch: &Batch) -> Result<()> {
        self.apply_encoded(batch.as_view())
    }

    /// Apply batch wire bytes, as read back from the log
    pub fn apply_encoded(&self, encoded: ByteView) -> Result<()> {
        let ops = Batch::from_view(encoded).collect_all()?;
        self.insert_all(ops);
        Ok(())
    }

    /// Insert a single value
    pub fn put(&self, key: ByteView, value: ByteView) {
        self.insert_all([KeyValue::new(key, Some(value))]);
    }

    /// Insert a tombstone
    pub fn delete(&self, key: ByteView) {
        self.insert_all([KeyValue::tombstone(key)]);
    }

    /// Keys and values are copied out of their source buffer, so a
    /// surviving entry never keeps a whole batch (or log) alive.
    fn insert_all(&self, ops: impl IntoIterator<Item = KeyValue>) {
        let mut guard = self.data.lock();
        let map = Arc::make_mut(&mut *guard);
        for op in ops {
            self.approx_size.fetch_add(op.encoded_len(), Ordering::Relaxed);
            let value = op.value.as_ref().map(ByteView::detach);
            map.insert(op.key.detach(), MemTableEntry::from(value));
        }
    }

    /// Get the entry for `key`, tombstones included
    pub fn get(&self, key: &[u8]) -> Option<MemTableEntry> {
        self.snapshot().get(key).cloned()
    }

    /// Approximate size in bytes (monotonic upper bound)
    pub fn approx_size(&self) -> usize {
        self.approx_size.load(Ordering::Relaxed)
    }

    /// Number of distinct keys, tombstones included
    pub fn entry_count(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Check if should flush (size >= limit)
    pub fn should_flush(&self, size_limit: usize) -> bool {
        self.approx_size() >= size_limit
    }

    fn snapshot(&self) -> Arc<Map> {
        Arc::clone(&self.data.lock())
    }

    /// Iterate from the first key `>= term` (or the first key) in order
    ///
    /// The iterator sees the table as it was when `find` was called.
    pub fn find(&self, term: Option<&[u8]>) -> MemTableIter {
        let cursor = match term {
            Some(t) if !t.is_empty() => Bound::Included(ByteView::copy_from_slice(t)),
            _ => Bound::Unbounded,
        };
        MemTableIter {
            snapshot: self.snapshot(),
            cursor,
        }
    }

    /// Iterate every entry in order
    pub fn iter(&self) -> MemTableIter {
        self.find(None)
    }
}

impl KvSource for MemTable {
    fn find(&self, term: Option<&[u8]>) -> Result<KvIter> {
        Ok(Box::new(MemTable::find(self, term).map(Ok::<_, KvError>)))
    }
}

/// Snapshot iterator over MemTable entries
#[derive(Debug, Clone)]
pub struct MemTableIter {
    snapshot: Arc<Map>,
    /// Lower bound of the next entry
    cursor: Bound<ByteView>,
}

impl Iterator for MemTableIter {
    type Item = KeyValue;

    fn next(&mut self) -> Option<Self::Item> {
        let lower: Bound<&[u8]> = match &self.cursor {
            Bound::Included(k) => Bound::Included(k.as_slice()),
            Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
            Bound::Unbounded => Bound::Unbounded,
        };
        let (key, entry) = self
            .snapshot
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()?;
        let kv = KeyValue::new(key.clone(), entry.value().cloned());
        self.cursor = Bound::Excluded(key.clone());
        Some(kv)
    }
}
