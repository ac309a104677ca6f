//! Write-Ahead Log (WAL) Module
//!
//! Provides durability: every batch is appended here before it is
//! applied to the memtable, and the log is replayed on open.
//!
//! ## Responsibilities
//! - Split transactions into records that fit fixed-size blocks
//! - CRC32 checksums for corruption detection
//! - Crash recovery and replay, skipping unreadable transactions
//!
//! ## File Format
//! ```text
//! ┌──────────────────────── block 0 (32 KiB) ─────────────────────────┐
//! │ [CRC (4)][Type (1)][Len (2)][payload] [CRC][Type][Len][payload] … │
//! │                                        zero padding (< 7 bytes) → │
//! ├──────────────────────── block 1 (32 KiB) ─────────────────────────┤
//! │ …                                                                 │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A transaction that fits in the rest of the current block is written
//! as one `Full` record. Otherwise it becomes `First`, any number of
//! `Middle`, then `Last`, each chunk filling its block exactly. A block
//! with fewer than 7 bytes left is padded with zeroes.

mod reader;
mod record;
mod recovery;
mod writer;

pub use reader::{Transactions, WalReader};
pub use record::{encode_header, RecordType, BLOCK_SIZE, HEADER_SIZE, MAX_PAYLOAD};
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::WalWriter;
