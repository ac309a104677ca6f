//! Zero-copy byte ranges
//!
//! [`ByteView`] is a reference-counted view of a byte buffer. Creating a
//! view, cloning it, or taking a subrange never copies the underlying
//! bytes; [`ByteView::detach`] is the only way to get an independent copy.
//!
//! Ordering is unsigned lexicographic, so a view that is a prefix of a
//! longer one sorts first.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use bytes::Bytes;

/// A shared, immutable range of bytes
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteView {
    buf: Bytes,
}

impl ByteView {
    /// An empty view
    pub const fn empty() -> Self {
        Self { buf: Bytes::new() }
    }

    /// View over a static buffer
    pub const fn from_static(bytes: &'static [u8]) -> Self {
        Self {
            buf: Bytes::from_static(bytes),
        }
    }

    /// Copy `bytes` into a fresh buffer
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self {
            buf: Bytes::copy_from_slice(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Everything from `skip` to the end. A negative `skip` counts from the
    /// end: `subrange(-4)` is always the last four bytes.
    ///
    /// # Panics
    ///
    /// Panics if the range falls outside this view.
    pub fn subrange(&self, skip: isize) -> ByteView {
        if skip < 0 {
            return self.subrange_len(skip, skip.unsigned_abs());
        }
        let start = skip as usize;
        assert!(
            start <= self.len(),
            "subrange start {} out of range for view of length {}",
            start,
            self.len()
        );
        self.subrange_len(skip, self.len() - start)
    }

    /// `len` bytes starting at `skip` (negative `skip` counts from the end)
    ///
    /// # Panics
    ///
    /// Panics if the range falls outside this view.
    pub fn subrange_len(&self, skip: isize, len: usize) -> ByteView {
        match self.try_subrange_len(skip, len) {
            Some(view) => view,
            None => panic!(
                "subrange ({}, {}) out of range for view of length {}",
                skip,
                len,
                self.len()
            ),
        }
    }

    /// Checked form of [`subrange_len`](Self::subrange_len)
    pub fn try_subrange_len(&self, skip: isize, len: usize) -> Option<ByteView> {
        let start = if skip < 0 {
            self.len().checked_sub(skip.unsigned_abs())?
        } else {
            skip as usize
        };
        let end = start.checked_add(len)?;
        if end > self.len() {
            return None;
        }
        Some(ByteView {
            buf: self.buf.slice(start..end),
        })
    }

    /// Number of equal leading bytes
    pub fn common_prefix_len(&self, other: &[u8]) -> usize {
        common_prefix_len(&self.buf, other)
    }

    /// An owned copy that no longer shares the backing buffer
    pub fn detach(&self) -> ByteView {
        ByteView::copy_from_slice(&self.buf)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.buf.to_vec()
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf
    }
}

/// Number of equal leading bytes of two slices
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

// =============================================================================
// Conversions
// =============================================================================

impl Deref for ByteView {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl Borrow<[u8]> for ByteView {
    fn borrow(&self) -> &[u8] {
        &self.buf
    }
}

impl From<Bytes> for ByteView {
    fn from(buf: Bytes) -> Self {
        Self { buf }
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(v: Vec<u8>) -> Self {
        Self { buf: Bytes::from(v) }
    }
}

impl From<&'static [u8]> for ByteView {
    fn from(s: &'static [u8]) -> Self {
        Self::from_static(s)
    }
}

impl From<&'static str> for ByteView {
    fn from(s: &'static str) -> Self {
        Self::from_static(s.as_bytes())
    }
}

impl From<String> for ByteView {
    fn from(s: String) -> Self {
        Self::from(s.into_bytes())
    }
}

impl PartialEq<[u8]> for ByteView {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

impl PartialEq<&[u8]> for ByteView {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_slice() == *other
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for ByteView {
    fn eq(&self, other: &&[u8; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl PartialEq<Vec<u8>> for ByteView {
    fn eq(&self, other: &Vec<u8>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteView[")?;
        for (i, b) in self.buf.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        write!(f, "]")
    }
}

/// Lossy UTF-8 rendering, for logs and the CLI
impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.buf))
    }
}
