//! Key/value records as they flow between components

use std::fmt;

use crate::view::ByteView;

/// One entry read from a block, tablet, memtable or merge
///
/// `value == None` is a tombstone: the key was deleted and must shadow
/// any older value for it.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: ByteView,
    pub value: Option<ByteView>,
}

impl KeyValue {
    pub fn new(key: ByteView, value: Option<ByteView>) -> Self {
        Self { key, value }
    }

    pub fn put(key: impl Into<ByteView>, value: impl Into<ByteView>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn tombstone(key: impl Into<ByteView>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.value.is_none()
    }

    /// Key and value lengths, as counted by the memtable size budget
    pub fn encoded_len(&self) -> usize {
        self.key.len() + self.value.as_ref().map_or(0, |v| v.len())
    }
}

impl fmt::Debug for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{:?} => {:?}", self.key, v),
            None => write!(f, "{:?} => <deleted>", self.key),
        }
    }
}
