//! Sorted data blocks with prefix-compressed keys
//!
//! Block Format:
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Entry 0: [prefix_len: uint][key suffix: raw][value: raw|nil] │ ← restart
//! │ Entry 1: [prefix_len: uint][key suffix: raw][value: raw|nil] │
//! │ ...                                                      │
//! ├──────────────────────────────────────────────────────────┤
//! │ Restart offsets: [u32 BE] × restart_count                │
//! ├──────────────────────────────────────────────────────────┤
//! │ Restart count: [u32 BE]                                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `key_restart_interval`-th entry is a restart point: it stores its
//! full key (`prefix_len == 0`) and its offset is listed in the trailer.
//! Other entries store only the bytes that differ from the previous key.
//! Seeks binary-search the restart keys, then scan forward linearly.

mod builder;
mod reader;

pub use builder::BlockBuilder;
pub use reader::{BlockIter, DataBlock};

/// Width of a restart offset and of the restart count
pub const RESTART_ENTRY_SIZE: usize = 4;
