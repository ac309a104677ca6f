//! Tests for MergeView over real sources
//!
//! These tests verify:
//! - The newest source wins for a key held by several sources
//! - Tombstones shadow older values and are surfaced by find
//! - Seeking applies to every source
//! - Errors from a source end the merge
//! - The merge agrees with a model map for random inputs

use std::collections::BTreeMap;
use std::sync::Arc;

use proptest::prelude::*;
use tabletkv::merge::KvIter;
use tabletkv::tablet::write_tablet;
use tabletkv::{
    ByteView, KeyValue, KvError, KvSource, MemTable, MergeView, ReaderOptions, Tablet,
    TabletOptions,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn tablet(records: Vec<KeyValue>) -> Arc<dyn KvSource> {
    let mut out = Vec::new();
    let opts = TabletOptions::default().block_size(64).key_restart_interval(2);
    write_tablet(&mut out, records.into_iter().map(Ok), opts).unwrap();
    Arc::new(Tablet::open(ByteView::from(out), ReaderOptions::default()).unwrap())
}

fn memtable(ops: &[(&str, Option<&str>)]) -> Arc<dyn KvSource> {
    let table = MemTable::new();
    for (k, v) in ops {
        let key = ByteView::copy_from_slice(k.as_bytes());
        match v {
            Some(v) => table.put(key, ByteView::copy_from_slice(v.as_bytes())),
            None => table.delete(key),
        }
    }
    Arc::new(table)
}

fn collect(view: &MergeView, term: Option<&[u8]>) -> Vec<KeyValue> {
    view.find(term).unwrap().map(|r| r.unwrap()).collect()
}

/// A source that yields its entries and then fails
struct FailingSource {
    entries: Vec<KeyValue>,
}

impl KvSource for FailingSource {
    fn find(&self, term: Option<&[u8]>) -> tabletkv::Result<KvIter> {
        let term = term.unwrap_or_default().to_vec();
        let entries: Vec<_> = self
            .entries
            .iter()
            .filter(|kv| kv.key.as_slice() >= term.as_slice())
            .cloned()
            .map(Ok)
            .chain(std::iter::once(Err(KvError::Validation("disk gone".to_string()))))
            .collect();
        Ok(Box::new(entries.into_iter()))
    }
}

// =============================================================================
// Layering Tests
// =============================================================================

#[test]
fn test_memtable_over_two_tablets() {
    let oldest = tablet(vec![
        KeyValue::put("apple", "t1"),
        KeyValue::put("banana", "t1"),
        KeyValue::put("cherry", "t1"),
    ]);
    let middle = tablet(vec![
        KeyValue::put("banana", "t2"),
        KeyValue::tombstone("cherry"),
        KeyValue::put("date", "t2"),
    ]);
    let newest = memtable(&[("apple", Some("mem")), ("date", None), ("elder", Some("mem"))]);

    let view = MergeView::with_sources(vec![oldest, middle, newest]);
    assert_eq!(view.len(), 3);
    assert_eq!(
        collect(&view, None),
        vec![
            KeyValue::put("apple", "mem"),
            KeyValue::put("banana", "t2"),
            KeyValue::tombstone("cherry"),
            KeyValue::tombstone("date"),
            KeyValue::put("elder", "mem"),
        ]
    );

    assert_eq!(view.get(b"apple").unwrap(), Some(ByteView::from_static(b"mem")));
    assert_eq!(view.get(b"banana").unwrap(), Some(ByteView::from_static(b"t2")));
    assert_eq!(view.get(b"cherry").unwrap(), None);
    assert_eq!(view.get(b"date").unwrap(), None);
    assert_eq!(view.get(b"fig").unwrap(), None);
}

#[test]
fn test_source_order_decides_winner() {
    let a = tablet(vec![KeyValue::put("k", "a")]);
    let b = tablet(vec![KeyValue::put("k", "b")]);

    let view = MergeView::with_sources(vec![Arc::clone(&a), Arc::clone(&b)]);
    assert_eq!(view.get(b"k").unwrap(), Some(ByteView::from_static(b"b")));

    let view = MergeView::with_sources(vec![b, a]);
    assert_eq!(view.get(b"k").unwrap(), Some(ByteView::from_static(b"a")));
}

#[test]
fn test_find_seeks_every_source() {
    let t = tablet((0..50).map(|i| KeyValue::put(format!("k{:02}", i * 2), "t")).collect());
    let m = memtable(&[("k01", Some("m")), ("k41", Some("m")), ("k42", None)]);
    let view = MergeView::with_sources(vec![t, m]);

    let keys: Vec<String> = collect(&view, Some(b"k40".as_slice()))
        .into_iter()
        .map(|kv| kv.key.to_string())
        .collect();
    let mut expected = vec!["k40".to_string(), "k41".to_string(), "k42".to_string()];
    expected.extend((44..100).step_by(2).map(|i| format!("k{:02}", i)));
    assert_eq!(keys, expected);
}

#[test]
fn test_empty_view() {
    let view = MergeView::new();
    assert!(view.is_empty());
    assert!(collect(&view, None).is_empty());
    assert_eq!(view.get(b"x").unwrap(), None);
}

#[test]
fn test_source_error_ends_merge() {
    let good = tablet(vec![KeyValue::put("a", "1"), KeyValue::put("z", "26")]);
    let bad: Arc<dyn KvSource> = Arc::new(FailingSource {
        entries: vec![KeyValue::put("b", "2")],
    });
    let view = MergeView::with_sources(vec![good, bad]);

    let results: Vec<_> = view.find(None).unwrap().collect();
    assert!(results.iter().any(|r| matches!(r, Err(KvError::Validation(_)))));
    assert!(results.last().unwrap().is_err());
    // The failing source was never exhausted, so "z" is not reached
    assert!(!results
        .iter()
        .any(|r| matches!(r, Ok(kv) if kv.key.as_slice() == b"z")));
}

// =============================================================================
// Model Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_merge_matches_model(
        layers in proptest::collection::vec(
            proptest::collection::btree_map(
                proptest::collection::vec(0u8..8, 1..4),
                proptest::option::of(proptest::collection::vec(any::<u8>(), 0..4)),
                0..20,
            ),
            1..5,
        ),
        term in proptest::option::of(proptest::collection::vec(0u8..8, 1..4)),
    ) {
        let mut model: BTreeMap<Vec<u8>, Option<Vec<u8>>> = BTreeMap::new();
        let mut sources: Vec<Arc<dyn KvSource>> = Vec::new();
        for layer in &layers {
            let records: Vec<KeyValue> = layer
                .iter()
                .map(|(k, v)| KeyValue::new(ByteView::from(k.clone()), v.clone().map(ByteView::from)))
                .collect();
            sources.push(tablet(records));
            for (k, v) in layer {
                model.insert(k.clone(), v.clone());
            }
        }

        let view = MergeView::with_sources(sources);
        let merged: Vec<(Vec<u8>, Option<Vec<u8>>)> = view
            .find(term.as_deref())
            .unwrap()
            .map(|r| {
                let kv = r.unwrap();
                (kv.key.to_vec(), kv.value.map(|v| v.to_vec()))
            })
            .collect();
        let expected: Vec<(Vec<u8>, Option<Vec<u8>>)> = model
            .into_iter()
            .filter(|(k, _)| term.as_ref().map_or(true, |t| k >= t))
            .collect();
        prop_assert_eq!(merged, expected);
    }
}
