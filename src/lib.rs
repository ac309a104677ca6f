//! # tabletkv
//!
//! An embedded, ordered key-value storage engine with:
//! - Prefix-compressed, checksummed, optionally Snappy-compressed tablets
//! - A block-structured write-ahead log that survives torn writes
//! - Atomic write batches
//! - Merged reads across the memtable and every tablet, newest wins
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Database                            │
//! │            (Single Writer / Multi Reader)                   │
//! └───────────┬──────────────────────────────────┬──────────────┘
//!             │ apply(batch)                     │ get / find
//!             ▼                                  ▼
//!   ┌──────────────────┐                ┌─────────────────┐
//!   │ WAL (write.log)  │                │    MergeView    │
//!   └────────┬─────────┘                └───┬─────────┬───┘
//!            ▼                              │         │
//!   ┌──────────────────┐  flush             │         │
//!   │     MemTable     │◄───────────────────┘         │
//!   └────────┬─────────┘                              │
//!            │ TabletBuilder                          ▼
//!            ▼                              ┌─────────────────┐
//!   ┌──────────────────┐                    │     Tablets     │
//!   │  tablet_*.tab    │───────────────────►│ (stack.txt)     │
//!   └──────────────────┘                    └─────────────────┘
//! ```
//!
//! Everything on disk is built from [`ByteView`]s and the small
//! MessagePack subset in [`codec`].

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod view;
pub mod codec;
pub mod kv;
pub mod batch;
pub mod block;
pub mod tablet;
pub mod wal;
pub mod memtable;
pub mod merge;
pub mod fs;
pub mod storage;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use batch::Batch;
pub use config::{Config, ReaderOptions, TabletOptions, WalSyncStrategy};
pub use engine::{Database, Scan};
pub use error::{KvError, Result};
pub use fs::{DiskFileSystem, FileSystem, MemFileSystem};
pub use kv::KeyValue;
pub use memtable::MemTable;
pub use merge::{KvSource, MergeView};
pub use tablet::{StreamTablet, Tablet, TabletBuilder};
pub use view::ByteView;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of tabletkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
