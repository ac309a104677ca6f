//! Tests for the MessagePack subset codec
//!
//! These tests verify:
//! - Length-class selection for raw strings and unsigned integers
//! - Decoding of every class, including nil
//! - Format errors for unknown tags and truncated input
//! - Stream decoding of uints

use std::io::Cursor;

use tabletkv::codec::{self, read_uint_from, Decoder};
use tabletkv::{ByteView, KvError};

// =============================================================================
// Helper Functions
// =============================================================================

fn encode_uints(values: &[u64]) -> Vec<u8> {
    let mut out = Vec::new();
    for v in values {
        codec::write_uint(&mut out, *v);
    }
    out
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_uint_boundaries() {
    let cases: &[(u64, &[u8])] = &[
        (0x7f, &[0x7f]),
        (0x80, &[0xcc, 0x80]),
        (0xff, &[0xcc, 0xff]),
        (0xffff, &[0xcd, 0xff, 0xff]),
        (0xffff_ffff, &[0xce, 0xff, 0xff, 0xff, 0xff]),
        (0x1_0000_0000, &[0xcf, 0, 0, 0, 1, 0, 0, 0, 0]),
    ];
    for (value, expected) in cases {
        assert_eq!(encode_uints(&[*value]), expected.to_vec(), "value {:#x}", value);
    }
}

#[test]
fn test_raw_boundaries() {
    for (len, header) in [(31usize, vec![0xbfu8]), (32, vec![0xda, 0, 32]), (65535, vec![0xda, 0xff, 0xff])] {
        let mut out = Vec::new();
        codec::write_raw(&mut out, &vec![0u8; len]);
        assert_eq!(&out[..header.len()], header.as_slice());
        assert_eq!(out.len(), header.len() + len);
    }

    let mut out = Vec::new();
    codec::write_raw(&mut out, &vec![0u8; 65536]);
    assert_eq!(&out[..5], &[0xdb, 0, 1, 0, 0]);
}

#[test]
fn test_uint64_fixed_is_nine_bytes() {
    let mut out = Vec::new();
    codec::write_uint64_fixed(&mut out, 1);
    assert_eq!(out, vec![0xcf, 0, 0, 0, 0, 0, 0, 0, 1]);
    assert_eq!(out.len(), codec::UINT64_FIXED_SIZE);
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_all_uint_classes() {
    let values = [0u64, 1, 0x7f, 0x80, 0x1234, 0x12_3456, 0x1234_5678_9abc];
    let mut dec = Decoder::new(ByteView::from(encode_uints(&values)));
    for v in values {
        assert_eq!(dec.read_uint().unwrap(), v);
    }
    assert!(dec.is_empty());
}

#[test]
fn test_decode_raw_is_zero_copy() {
    let mut out = Vec::new();
    codec::write_raw(&mut out, b"payload");
    let buf = ByteView::from(out);
    let raw = Decoder::new(buf.clone()).read_raw().unwrap();
    assert_eq!(raw, b"payload".as_slice());
    assert_eq!(raw.as_slice().as_ptr() as usize, buf.as_slice().as_ptr() as usize + 1);
}

#[test]
fn test_decode_nil_value() {
    let mut out = Vec::new();
    codec::write_nil(&mut out);
    codec::write_raw(&mut out, b"");
    let mut dec = Decoder::new(ByteView::from(out));
    assert_eq!(dec.read_raw_or_nil().unwrap(), None);
    assert_eq!(dec.read_raw_or_nil().unwrap(), Some(ByteView::empty()));
}

#[test]
fn test_nil_is_not_a_raw() {
    let mut dec = Decoder::new(ByteView::from_static(&[0xc0]));
    assert!(matches!(dec.read_raw(), Err(KvError::Format(_))));
}

#[test]
fn test_unknown_tags() {
    for tag in [0x80u8, 0x90, 0xc2, 0xd0, 0xff] {
        let mut dec = Decoder::new(ByteView::from(vec![tag, 0, 0, 0, 0]));
        assert!(matches!(dec.read_uint(), Err(KvError::Format(_))), "tag {:#x}", tag);
    }
}

#[test]
fn test_empty_input() {
    let mut dec = Decoder::new(ByteView::empty());
    assert!(matches!(dec.read_uint(), Err(KvError::Format(_))));
    assert!(matches!(dec.read_raw_or_nil(), Err(KvError::Format(_))));
}

// =============================================================================
// Stream Decoding Tests
// =============================================================================

#[test]
fn test_read_uint_from_stream() {
    let bytes = encode_uints(&[5, 300, 70_000]);
    let mut cursor = Cursor::new(bytes);
    assert_eq!(read_uint_from(&mut cursor).unwrap(), 5);
    assert_eq!(read_uint_from(&mut cursor).unwrap(), 300);
    assert_eq!(read_uint_from(&mut cursor).unwrap(), 70_000);
    assert!(matches!(read_uint_from(&mut cursor), Err(KvError::Format(_))));
}

#[test]
fn test_read_uint_from_truncated_stream() {
    let mut cursor = Cursor::new(vec![0xcd, 0x01]);
    assert!(matches!(read_uint_from(&mut cursor), Err(KvError::Format(_))));
}
