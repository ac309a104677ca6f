//! Decoding side of the codec
//!
//! [`Decoder`] walks a [`ByteView`] and hands out zero-copy subviews for
//! raw strings. Any unknown type tag or truncated field is a
//! [`KvError::Format`].

use std::io::Read;

use crate::error::{KvError, Result};
use crate::view::ByteView;

use super::{FIXINT_MAX, FIXRAW, FIXRAW_MASK, NIL, RAW16, RAW32, UINT16, UINT32, UINT64, UINT8};

/// Cursor over an encoded buffer
#[derive(Debug, Clone)]
pub struct Decoder {
    buf: ByteView,
    pos: usize,
}

impl Decoder {
    pub fn new(buf: ByteView) -> Self {
        Self { buf, pos: 0 }
    }

    /// Start decoding at `pos` instead of the beginning
    pub fn at(buf: ByteView, pos: usize) -> Self {
        Self { buf, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let b = self
            .peek_byte()
            .ok_or_else(|| KvError::format(format!("truncated buffer at offset {}", self.pos)))?;
        self.pos += 1;
        Ok(b)
    }

    /// Take the next `len` bytes as a subview
    pub fn read_bytes(&mut self, len: usize) -> Result<ByteView> {
        if len > self.remaining() {
            return Err(KvError::format(format!(
                "truncated buffer: need {} bytes at offset {}, have {}",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let view = self.buf.subrange_len(self.pos as isize, len);
        self.pos += len;
        Ok(view)
    }

    /// Plain 4-byte big-endian integer (no type tag)
    pub fn read_u32_be(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_be(&mut self, width: usize) -> Result<u64> {
        let b = self.read_bytes(width)?;
        Ok(b.iter().fold(0u64, |acc, &x| (acc << 8) | x as u64))
    }

    pub fn read_uint(&mut self) -> Result<u64> {
        let flag = self.read_u8()?;
        match flag {
            f if f as u64 <= FIXINT_MAX => Ok(f as u64),
            UINT8 => self.read_be(1),
            UINT16 => self.read_be(2),
            UINT32 => self.read_be(4),
            UINT64 => self.read_be(8),
            other => Err(KvError::format(format!(
                "unexpected uint type 0x{:02x} at offset {}",
                other,
                self.pos - 1
            ))),
        }
    }

    /// Length framing of a raw string
    pub fn read_raw_len(&mut self) -> Result<usize> {
        let flag = self.read_u8()?;
        self.raw_len_after(flag)
    }

    fn raw_len_after(&mut self, flag: u8) -> Result<usize> {
        match flag {
            f if f & FIXRAW_MASK == FIXRAW => Ok((f & !FIXRAW_MASK) as usize),
            RAW16 => Ok(self.read_be(2)? as usize),
            RAW32 => Ok(self.read_be(4)? as usize),
            other => Err(KvError::format(format!(
                "unexpected raw type 0x{:02x} at offset {}",
                other,
                self.pos - 1
            ))),
        }
    }

    pub fn read_raw(&mut self) -> Result<ByteView> {
        let len = self.read_raw_len()?;
        self.read_bytes(len)
    }

    /// A raw string, or `None` for nil
    pub fn read_raw_or_nil(&mut self) -> Result<Option<ByteView>> {
        let flag = self.read_u8()?;
        if flag == NIL {
            return Ok(None);
        }
        let len = self.raw_len_after(flag)?;
        self.read_bytes(len).map(Some)
    }
}

/// Decode one uint from a byte stream
///
/// End of stream in the middle of the field is a [`KvError::Format`].
pub fn read_uint_from<R: Read>(reader: &mut R) -> Result<u64> {
    let mut flag = [0u8; 1];
    read_exact(reader, &mut flag)?;
    let width = match flag[0] {
        f if f as u64 <= FIXINT_MAX => return Ok(f as u64),
        UINT8 => 1,
        UINT16 => 2,
        UINT32 => 4,
        UINT64 => 8,
        other => {
            return Err(KvError::format(format!(
                "unexpected uint type 0x{:02x} in stream",
                other
            )))
        }
    };
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf[..width])?;
    Ok(buf[..width]
        .iter()
        .fold(0u64, |acc, &x| (acc << 8) | x as u64))
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => KvError::format("truncated stream"),
        _ => KvError::Io(e),
    })
}
