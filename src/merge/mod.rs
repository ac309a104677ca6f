//! Merged reads across the memtable and every tablet
//!
//! Each source is anything that can produce an ordered, seekable stream
//! of [`KeyValue`]s ([`KvSource`]). A [`MergeView`] holds the sources
//! oldest first; when two sources hold the same key the newer one wins
//! and the older entries are dropped without being returned.
//!
//! ```text
//!   tablet 0 (oldest)   a=1  c=1
//!   tablet 1            a=2       d=2
//!   memtable (newest)        c=<deleted>
//!   ─────────────────────────────────────
//!   merged              a=2  c=<deleted>  d=2
//! ```

mod iter;

use std::sync::Arc;

use crate::error::Result;
use crate::kv::KeyValue;
use crate::view::ByteView;

pub use iter::MergeIter;

/// Boxed iterator returned by [`KvSource::find`]
pub type KvIter = Box<dyn Iterator<Item = Result<KeyValue>> + Send>;

/// An ordered key/value source that can seek
pub trait KvSource: Send + Sync {
    /// Entries with key `>= term` in ascending key order (all entries
    /// for `None` or an empty term), tombstones included
    fn find(&self, term: Option<&[u8]>) -> Result<KvIter>;
}

/// An ordered list of sources, oldest first
#[derive(Clone, Default)]
pub struct MergeView {
    sources: Vec<Arc<dyn KvSource>>,
}

impl MergeView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a view over `sources`, oldest first
    pub fn with_sources(sources: Vec<Arc<dyn KvSource>>) -> Self {
        Self { sources }
    }

    /// Add a source newer than every existing one
    pub fn push(&mut self, source: Arc<dyn KvSource>) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Each distinct key `>= term` once, in ascending order, taken from
    /// the newest source that holds it. Tombstones are returned.
    pub fn find(&self, term: Option<&[u8]>) -> Result<MergeIter> {
        let mut cursors = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            cursors.push(source.find(term)?);
        }
        MergeIter::new(cursors)
    }

    /// The live value of `key`, or `None` if it is absent or deleted
    pub fn get(&self, key: &[u8]) -> Result<Option<ByteView>> {
        match self.find(Some(key))?.next() {
            Some(Ok(kv)) if kv.key.as_slice() == key => Ok(kv.value),
            Some(Err(e)) => Err(e),
            _ => Ok(None),
        }
    }
}

impl std::fmt::Debug for MergeView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeView")
            .field("sources", &self.sources.len())
            .finish()
    }
}
