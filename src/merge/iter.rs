//! Heap-based k-way merge

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::iter::FusedIterator;

use crate::error::{KvError, Result};
use crate::kv::KeyValue;
use crate::view::ByteView;

use super::KvIter;

/// Head of one cursor in the min-heap
struct HeapEntry {
    kv: KeyValue,
    /// Source position; larger is newer
    rank: usize,
}

impl Eq for HeapEntry {}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.kv.key == other.kv.key && self.rank == other.rank
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on key; on equal keys the newer source pops first.
        match other.kv.key.cmp(&self.kv.key) {
            Ordering::Equal => self.rank.cmp(&other.rank),
            ord => ord,
        }
    }
}

/// Forward merge iterator
///
/// Yields `Err` at most once; iteration ends after an error.
pub struct MergeIter {
    cursors: Vec<KvIter>,
    heap: BinaryHeap<HeapEntry>,
    last_key: Option<ByteView>,
    /// Error from advancing a cursor, reported on the next call
    pending: Option<KvError>,
    done: bool,
}

impl MergeIter {
    /// Merge `cursors`, ordered oldest first
    pub fn new(mut cursors: Vec<KvIter>) -> Result<Self> {
        let mut heap = BinaryHeap::with_capacity(cursors.len());
        for (rank, cursor) in cursors.iter_mut().enumerate() {
            if let Some(kv) = cursor.next() {
                heap.push(HeapEntry { kv: kv?, rank });
            }
        }
        Ok(Self {
            cursors,
            heap,
            last_key: None,
            pending: None,
            done: false,
        })
    }
}

impl Iterator for MergeIter {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if let Some(e) = self.pending.take() {
                self.done = true;
                return Some(Err(e));
            }
            let entry = match self.heap.pop() {
                Some(entry) => entry,
                None => {
                    self.done = true;
                    return None;
                }
            };

            // Advance the cursor that produced this entry
            match self.cursors[entry.rank].next() {
                Some(Ok(kv)) => self.heap.push(HeapEntry {
                    kv,
                    rank: entry.rank,
                }),
                Some(Err(e)) => self.pending = Some(e),
                None => {}
            }

            // Skip older copies of a key already returned
            if self.last_key.as_ref() == Some(&entry.kv.key) {
                continue;
            }
            self.last_key = Some(entry.kv.key.clone());
            return Some(Ok(entry.kv));
        }
    }
}

impl FusedIterator for MergeIter {}
