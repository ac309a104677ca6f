//! Encoding side of the codec
//!
//! Every function appends to a [`BufMut`] sink and cannot fail.

use bytes::BufMut;

use super::{FIXINT_MAX, FIXRAW, FIXRAW_MAX, NIL, RAW16, RAW32, UINT16, UINT32, UINT64, UINT8};

/// Append `v` using the smallest integer class that holds it
pub fn write_uint<B: BufMut>(out: &mut B, v: u64) {
    if v <= FIXINT_MAX {
        out.put_u8(v as u8);
    } else if v <= u8::MAX as u64 {
        out.put_u8(UINT8);
        out.put_u8(v as u8);
    } else if v <= u16::MAX as u64 {
        out.put_u8(UINT16);
        out.put_u16(v as u16);
    } else if v <= u32::MAX as u64 {
        out.put_u8(UINT32);
        out.put_u32(v as u32);
    } else {
        write_uint64_fixed(out, v);
    }
}

/// Append `v` as a 64-bit field regardless of its magnitude (9 bytes)
pub fn write_uint64_fixed<B: BufMut>(out: &mut B, v: u64) {
    out.put_u8(UINT64);
    out.put_u64(v);
}

/// Append only the length framing of a raw string
pub fn write_raw_len<B: BufMut>(out: &mut B, len: usize) {
    if len <= FIXRAW_MAX {
        out.put_u8(FIXRAW | len as u8);
    } else if len <= u16::MAX as usize {
        out.put_u8(RAW16);
        out.put_u16(len as u16);
    } else {
        out.put_u8(RAW32);
        out.put_u32(len as u32);
    }
}

/// Append a framed raw string
pub fn write_raw<B: BufMut>(out: &mut B, bytes: &[u8]) {
    write_raw_len(out, bytes.len());
    out.put_slice(bytes);
}

pub fn write_nil<B: BufMut>(out: &mut B) {
    out.put_u8(NIL);
}
