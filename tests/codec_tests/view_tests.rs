//! Tests for ByteView
//!
//! These tests verify:
//! - Subranges share the backing buffer and honor negative offsets
//! - Byte-wise unsigned ordering with prefixes sorting first
//! - Common prefix length symmetry and bounds

use proptest::prelude::*;
use tabletkv::view::common_prefix_len;
use tabletkv::ByteView;

// =============================================================================
// Subrange Tests
// =============================================================================

#[test]
fn test_subrange_positive_and_negative() {
    let view = ByteView::from_static(b"hello world");

    assert_eq!(view.subrange(6), b"world".as_slice());
    assert_eq!(view.subrange(-5), b"world".as_slice());
    assert_eq!(view.subrange_len(0, 5), b"hello".as_slice());
    assert_eq!(view.subrange_len(-5, 3), b"wor".as_slice());
    assert_eq!(view.subrange(11).len(), 0);
}

#[test]
fn test_subrange_does_not_copy() {
    let view = ByteView::from(b"abcdef".to_vec());
    let sub = view.subrange_len(2, 2);

    let base = view.as_slice().as_ptr() as usize;
    assert_eq!(sub.as_slice().as_ptr() as usize, base + 2);

    let detached = sub.detach();
    assert_eq!(detached, sub);
    assert_ne!(detached.as_slice().as_ptr(), sub.as_slice().as_ptr());
}

#[test]
fn test_try_subrange_out_of_range() {
    let view = ByteView::from_static(b"abc");
    assert!(view.try_subrange_len(2, 2).is_none());
    assert!(view.try_subrange_len(-4, 1).is_none());
    assert!(view.try_subrange_len(3, 0).is_some());
}

#[test]
#[should_panic]
fn test_subrange_panics_past_end() {
    ByteView::from_static(b"abc").subrange(4);
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_ordering_is_unsigned_bytewise() {
    let low = ByteView::from_static(&[0x01]);
    let high = ByteView::from_static(&[0xff]);
    assert!(low < high);

    let short = ByteView::from_static(b"ab");
    let long = ByteView::from_static(b"abc");
    assert!(short < long);
    assert!(ByteView::empty() < short);
}

#[test]
fn test_common_prefix_len() {
    let a = ByteView::from_static(b"apple");
    assert_eq!(a.common_prefix_len(b"apply"), 4);
    assert_eq!(a.common_prefix_len(b"banana"), 0);
    assert_eq!(a.common_prefix_len(b"app"), 3);
    assert_eq!(a.common_prefix_len(b""), 0);
}

proptest! {
    #[test]
    fn prop_common_prefix_symmetric_and_bounded(
        a in proptest::collection::vec(any::<u8>(), 0..32),
        b in proptest::collection::vec(any::<u8>(), 0..32),
    ) {
        let ab = common_prefix_len(&a, &b);
        prop_assert_eq!(ab, common_prefix_len(&b, &a));
        prop_assert!(ab <= a.len().min(b.len()));
        prop_assert_eq!(&a[..ab], &b[..ab]);
    }

    #[test]
    fn prop_ordering_matches_slices(
        a in proptest::collection::vec(any::<u8>(), 0..16),
        b in proptest::collection::vec(any::<u8>(), 0..16),
    ) {
        let va = ByteView::from(a.clone());
        let vb = ByteView::from(b.clone());
        prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
    }
}
