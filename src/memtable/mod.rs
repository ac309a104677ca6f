//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Apply batches atomically, last write wins
//! - Keep tombstones so they shadow older tablets in a merge
//! - Track an approximate size for the flush trigger
//! - Ordered iteration for tablet creation and reads
//!
//! ## Data Structure Choice
//! A `BTreeMap` behind an `Arc`, swapped under a mutex:
//! - Writers serialize on the mutex and mutate through `Arc::make_mut`
//! - Readers clone the `Arc` inside the lock and iterate lock-free, so an
//!   open iterator never sees later writes
//! - A write while iterators are open copies the map once

mod table;

pub use table::{MemTable, MemTableIter};

use crate::view::ByteView;

/// Entry stored in the MemTable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemTableEntry {
    /// A live value
    Value(ByteView),

    /// A tombstone (deleted key)
    Tombstone,
}

impl MemTableEntry {
    pub fn value(&self) -> Option<&ByteView> {
        match self {
            MemTableEntry::Value(v) => Some(v),
            MemTableEntry::Tombstone => None,
        }
    }
}

impl From<Option<ByteView>> for MemTableEntry {
    fn from(value: Option<ByteView>) -> Self {
        match value {
            Some(v) => MemTableEntry::Value(v),
            None => MemTableEntry::Tombstone,
        }
    }
}
