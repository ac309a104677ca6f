//! Tablet file framing: header, stored blocks, index sections, footer

use bytes::BufMut;

use crate::codec::{self, Decoder, UINT64_FIXED_SIZE};
use crate::config::ReaderOptions;
use crate::error::{KvError, Result};
use crate::view::ByteView;

pub const TABLET_MAGIC: u32 = 0x0b50_1e7e;
pub const META_INDEX_MAGIC: u32 = 0x0ea7_da7a;
pub const DATA_INDEX_MAGIC: u32 = 0xda7a_ba5e;

pub const VERSION: u8 = 1;

/// Magic (4) + version (1) + reserved (3)
pub const HEADER_SIZE: usize = 8;

/// Four fixed uint64 fields + trailing magic
pub const FOOTER_SIZE: usize = 4 * UINT64_FIXED_SIZE + 4;

/// Block type bit: payload is Snappy-compressed
pub const BLOCK_COMPRESSED: u64 = 0x1;
/// Block type bit: meta block (reserved, never written today)
pub const BLOCK_META: u64 = 0x2;

// =============================================================================
// Header
// =============================================================================

pub fn write_header<B: BufMut>(out: &mut B) {
    out.put_u32(TABLET_MAGIC);
    out.put_u8(VERSION);
    out.put_bytes(0, 3);
}

pub fn check_header(header: &[u8]) -> Result<()> {
    if header.len() < HEADER_SIZE {
        return Err(KvError::validation(format!(
            "tablet header truncated: {} bytes",
            header.len()
        )));
    }
    let magic = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    if magic != TABLET_MAGIC {
        return Err(KvError::validation(format!(
            "bad tablet header magic 0x{:08x}",
            magic
        )));
    }
    if header[4] < VERSION {
        return Err(KvError::validation(format!(
            "unsupported tablet version {}",
            header[4]
        )));
    }
    Ok(())
}

// =============================================================================
// Footer
// =============================================================================

/// Location of the two index sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub meta_index_offset: u64,
    pub meta_index_length: u64,
    pub data_index_offset: u64,
    pub data_index_length: u64,
}

impl Footer {
    pub fn encode<B: BufMut>(&self, out: &mut B) {
        codec::write_uint64_fixed(out, self.meta_index_offset);
        codec::write_uint64_fixed(out, self.meta_index_length);
        codec::write_uint64_fixed(out, self.data_index_offset);
        codec::write_uint64_fixed(out, self.data_index_length);
        out.put_u32(TABLET_MAGIC);
    }

    /// Decode the last [`FOOTER_SIZE`] bytes of `file`
    pub fn decode(file: &ByteView) -> Result<Self> {
        let tail = file
            .try_subrange_len(-(FOOTER_SIZE as isize), FOOTER_SIZE)
            .ok_or_else(|| {
                KvError::validation(format!("tablet of {} bytes has no footer", file.len()))
            })?;
        let mut dec = Decoder::new(tail);
        let footer = Self {
            meta_index_offset: dec.read_uint().map_err(into_validation)?,
            meta_index_length: dec.read_uint().map_err(into_validation)?,
            data_index_offset: dec.read_uint().map_err(into_validation)?,
            data_index_length: dec.read_uint().map_err(into_validation)?,
        };
        let magic = dec.read_u32_be().map_err(into_validation)?;
        if magic != TABLET_MAGIC || dec.position() != FOOTER_SIZE {
            return Err(KvError::validation(format!(
                "bad tablet footer magic 0x{:08x}",
                magic
            )));
        }
        Ok(footer)
    }
}

// =============================================================================
// Index
// =============================================================================

/// One data-index entry: where a stored block lives and its first key
///
/// `[offset, offset + length)` covers the block's framing and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub offset: u64,
    pub length: u64,
    pub first_key: ByteView,
}

impl IndexRecord {
    pub fn encode<B: BufMut>(&self, out: &mut B) {
        codec::write_uint(out, self.offset);
        codec::write_uint(out, self.length);
        codec::write_raw(out, &self.first_key);
    }
}

/// Decode an index section (magic followed by records)
pub fn decode_index(section: ByteView, magic: u32) -> Result<Vec<IndexRecord>> {
    let mut dec = Decoder::new(section);
    let found = dec.read_u32_be().map_err(into_validation)?;
    if found != magic {
        return Err(KvError::validation(format!(
            "unexpected index magic 0x{:08x} (wanted 0x{:08x})",
            found, magic
        )));
    }

    let mut records = Vec::new();
    while !dec.is_empty() {
        let record = IndexRecord {
            offset: dec.read_uint().map_err(into_validation)?,
            length: dec.read_uint().map_err(into_validation)?,
            first_key: dec.read_raw().map_err(into_validation)?,
        };
        records.push(record);
    }
    Ok(records)
}

// =============================================================================
// Stored Blocks
// =============================================================================

/// Framing that precedes every stored block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// CRC32 (IEEE) of the stored payload; 0 means "not recorded"
    pub checksum: u32,
    pub block_type: u64,
    pub length: u64,
}

impl BlockHeader {
    pub fn encode<B: BufMut>(&self, out: &mut B) {
        codec::write_uint(out, self.checksum as u64);
        codec::write_uint(out, self.block_type);
        codec::write_uint(out, self.length);
    }

    pub fn decode(dec: &mut Decoder) -> Result<Self> {
        let checksum = dec.read_uint().map_err(into_validation)?;
        let block_type = dec.read_uint().map_err(into_validation)?;
        let length = dec.read_uint().map_err(into_validation)?;
        let checksum = u32::try_from(checksum).map_err(|_| {
            KvError::validation(format!("block checksum {} exceeds 32 bits", checksum))
        })?;
        Ok(Self {
            checksum,
            block_type,
            length,
        })
    }

    pub fn is_compressed(&self) -> bool {
        self.block_type & BLOCK_COMPRESSED != 0
    }
}

/// Frame `raw` as a stored block, compressing it when that saves space
pub fn encode_block<B: BufMut>(out: &mut B, raw: &[u8], compression: bool, block_type: u64) -> Result<()> {
    let mut block_type = block_type;
    let compressed;
    let mut payload = raw;
    if compression {
        compressed = snap::raw::Encoder::new()
            .compress_vec(raw)
            .map_err(|e| KvError::validation(format!("snappy compression failed: {}", e)))?;
        if compressed.len() < raw.len() {
            payload = &compressed;
            block_type |= BLOCK_COMPRESSED;
        }
    }

    let header = BlockHeader {
        checksum: crc32fast::hash(payload),
        block_type,
        length: payload.len() as u64,
    };
    header.encode(out);
    out.put_slice(payload);
    Ok(())
}

/// Check and decompress a stored payload, producing the raw block bytes
pub fn decode_payload(header: &BlockHeader, payload: ByteView, opts: &ReaderOptions) -> Result<ByteView> {
    if opts.verify_checksums && header.checksum != 0 {
        let actual = crc32fast::hash(&payload);
        if actual != header.checksum {
            return Err(KvError::validation(format!(
                "bad block checksum: stored 0x{:08x}, computed 0x{:08x}",
                header.checksum, actual
            )));
        }
    }

    if header.block_type & !(BLOCK_COMPRESSED | BLOCK_META) != 0 {
        return Err(KvError::validation(format!(
            "unknown block type 0x{:x}",
            header.block_type
        )));
    }

    if !header.is_compressed() {
        return Ok(payload);
    }
    snap::raw::Decoder::new()
        .decompress_vec(&payload)
        .map(ByteView::from)
        .map_err(|e| KvError::validation(format!("corrupt compressed block: {}", e)))
}

/// Container-level decode failures are validation errors
pub(crate) fn into_validation(err: KvError) -> KvError {
    match err {
        KvError::Format(msg) => KvError::Validation(msg),
        other => other,
    }
}
