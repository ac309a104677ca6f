//! MiniCodec: a small subset of the MessagePack wire format
//!
//! Only three kinds of values are ever written:
//!
//! ```text
//! nil          0xc0
//! raw bytes    0xa0|len (len < 32) | 0xda u16 len | 0xdb u32 len, then bytes
//! uint         0x00..=0x7f | 0xcc u8 | 0xcd u16 | 0xce u32 | 0xcf u64
//! ```
//!
//! Multi-byte lengths and integers are big-endian. `nil` in a value
//! position is the on-disk tombstone.

mod reader;
mod writer;

pub use reader::{read_uint_from, Decoder};
pub use writer::{write_nil, write_raw, write_raw_len, write_uint, write_uint64_fixed};

// =============================================================================
// Type Codes
// =============================================================================

pub const NIL: u8 = 0xc0;

pub const FIXRAW: u8 = 0xa0;
pub const FIXRAW_MASK: u8 = 0xe0;
pub const FIXRAW_MAX: usize = 31;
pub const RAW16: u8 = 0xda;
pub const RAW32: u8 = 0xdb;

pub const FIXINT_MAX: u64 = 0x7f;
pub const UINT8: u8 = 0xcc;
pub const UINT16: u8 = 0xcd;
pub const UINT32: u8 = 0xce;
pub const UINT64: u8 = 0xcf;

/// Encoded size of a [`write_uint64_fixed`] field
pub const UINT64_FIXED_SIZE: usize = 9;
