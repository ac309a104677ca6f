//! Tests for WalReader
//!
//! These tests verify:
//! - Transactions of any size survive a write/read cycle
//! - Zero-length transactions are preserved
//! - Checksum failures, bad sequencing and torn tails are format errors
//! - After an error, reading resumes at the next block boundary

use proptest::prelude::*;
use tabletkv::wal::{encode_header, RecordType, WalReader, WalWriter, BLOCK_SIZE, HEADER_SIZE};
use tabletkv::{ByteView, KvError, WalSyncStrategy};

// =============================================================================
// Helper Functions
// =============================================================================

fn write_log(transactions: &[Vec<u8>]) -> Vec<u8> {
    let mut writer = WalWriter::new(Vec::new(), 0, WalSyncStrategy::EveryNEntries { count: 64 });
    for tx in transactions {
        writer.emit(tx).unwrap();
    }
    writer.into_inner()
}

fn read_results(log: Vec<u8>) -> Vec<tabletkv::Result<Vec<u8>>> {
    WalReader::new(ByteView::from(log))
        .transactions()
        .map(|r| r.map(|t| t.to_vec()))
        .collect()
}

fn record(record_type: RecordType, payload: &[u8]) -> Vec<u8> {
    let mut out = encode_header(record_type, payload).to_vec();
    out.extend_from_slice(payload);
    out
}

/// Small transaction, then one that exactly fills the rest of block 0,
/// then a small one at the start of block 1
fn three_transactions() -> Vec<Vec<u8>> {
    let first = b"alpha-0001".to_vec();
    let filler = vec![0x5a; BLOCK_SIZE - (HEADER_SIZE + first.len()) - HEADER_SIZE];
    vec![first, filler, b"charlie".to_vec()]
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_empty_log() {
    assert!(read_results(Vec::new()).is_empty());
}

#[test]
fn test_zero_length_transactions() {
    let txs = vec![Vec::new(), b"x".to_vec(), Vec::new(), Vec::new()];
    let log = write_log(&txs);
    assert_eq!(log.len(), 4 * HEADER_SIZE + 1);
    let read: Vec<Vec<u8>> = read_results(log).into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(read, txs);
}

#[test]
fn test_block_filling_layout() {
    let txs = three_transactions();
    let log = write_log(&txs);
    assert_eq!(log.len(), BLOCK_SIZE + HEADER_SIZE + 7);
    assert_eq!(log[BLOCK_SIZE + 4], RecordType::Full as u8);
}

#[test]
fn test_position_tracks_consumed_bytes() {
    let log = write_log(&[b"ab".to_vec(), b"cde".to_vec()]);
    let total = log.len();
    let mut reader = WalReader::new(ByteView::from(log));
    reader.next_transaction().unwrap().unwrap();
    assert_eq!(reader.position(), HEADER_SIZE + 2);
    reader.next_transaction().unwrap().unwrap();
    assert_eq!(reader.position(), total);
    assert!(reader.next_transaction().unwrap().is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_roundtrip_any_sizes(sizes in proptest::collection::vec(0usize..3 * BLOCK_SIZE, 0..6)) {
        let txs: Vec<Vec<u8>> = sizes
            .iter()
            .enumerate()
            .map(|(n, &len)| (0..len).map(|i| (i * 31 + n) as u8).collect())
            .collect();
        let read: Vec<Vec<u8>> = read_results(write_log(&txs))
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        prop_assert_eq!(read, txs);
    }
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_flipped_checksum_skips_to_next_block() {
    let txs = three_transactions();
    let mut log = write_log(&txs);
    log[0] ^= 0xff;

    let results = read_results(log);
    assert_eq!(results.len(), 2);
    assert!(matches!(results[0], Err(KvError::Format(_))));
    // The filler shares block 0 with the bad record and is lost
    assert_eq!(results[1].as_ref().unwrap(), &txs[2]);
}

#[test]
fn test_corrupt_payload_in_middle_of_log() {
    let txs = three_transactions();
    let mut log = write_log(&txs);
    log[HEADER_SIZE + txs[0].len() + HEADER_SIZE + 100] ^= 0x01;

    let results = read_results(log);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap(), &txs[0]);
    assert!(matches!(results[1], Err(KvError::Format(_))));
    assert_eq!(results[2].as_ref().unwrap(), &txs[2]);
}

#[test]
fn test_leading_middle_record_is_error() {
    let mut log = record(RecordType::Middle, b"orphan");
    log.resize(BLOCK_SIZE, 0);
    log.extend(record(RecordType::Full, b"ok"));

    let results = read_results(log);
    assert_eq!(results.len(), 2);
    assert!(matches!(results[0], Err(KvError::Format(_))));
    assert_eq!(results[1].as_ref().unwrap(), b"ok");
}

#[test]
fn test_first_followed_by_full_is_error() {
    let mut log = record(RecordType::First, b"part");
    log.extend(record(RecordType::Full, b"whole"));
    let results = read_results(log);
    assert!(matches!(results[0], Err(KvError::Format(_))));
}

#[test]
fn test_unknown_record_type() {
    let mut log = record(RecordType::Full, b"abc");
    log[4] = 9;
    let results = read_results(log);
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(KvError::Format(_))));
}

#[test]
fn test_torn_tail_is_error_after_good_transactions() {
    let mut log = write_log(&[b"first".to_vec(), b"second".to_vec(), b"third".to_vec()]);
    log.truncate(log.len() - 2);

    let results = read_results(log);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap(), b"first");
    assert_eq!(results[1].as_ref().unwrap(), b"second");
    assert!(matches!(results[2], Err(KvError::Format(_))));
}

#[test]
fn test_log_ending_inside_transaction() {
    let mut log = write_log(&[vec![7u8; BLOCK_SIZE + 10]]);
    log.truncate(BLOCK_SIZE);
    let mut reader = WalReader::new(ByteView::from(log));
    assert!(matches!(reader.next_transaction(), Err(KvError::Format(_))));
}

#[test]
fn test_partial_header_at_end_is_clean_eof() {
    let mut log = write_log(&[b"only".to_vec()]);
    log.extend_from_slice(&[0xab; HEADER_SIZE - 1]);
    let results = read_results(log);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_ref().unwrap(), b"only");
}
