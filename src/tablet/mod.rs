//! Tablets: immutable sorted files
//!
//! File Format:
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Header: [magic: u32 BE][version: u8 = 1][reserved: 3 bytes] │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Block 0: [checksum: uint][type: uint][length: uint][payload] │
//! │ Block 1: ...                                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Meta index: [magic: u32 BE]  (no records)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Data index: [magic: u32 BE]                                 │
//! │   [offset: uint][length: uint][first key: raw] × blocks     │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Footer (40 bytes):                                          │
//! │   meta offset, meta length, data offset, data length        │
//! │   (each 0xcf + u64 BE), then [magic: u32 BE]                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A payload is a [`DataBlock`](crate::block::DataBlock), Snappy-compressed
//! when type bit 0 is set. The checksum is CRC32 (IEEE) of the payload as
//! stored.
//!
//! Two readers exist: [`Tablet`] for random access over a whole file and
//! [`StreamTablet`] for one front-to-back pass over a stream.

mod builder;
pub mod format;
mod reader;
mod stream;

pub use builder::{write_tablet, TabletBuilder, TabletSummary};
pub use format::{BlockHeader, Footer, IndexRecord};
pub use reader::{Tablet, TabletIter};
pub use stream::{StreamIter, StreamTablet};
