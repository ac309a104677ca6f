//! Tests for WalRecovery
//!
//! These tests verify:
//! - Replay feeds every readable transaction in order
//! - Corrupted transactions are counted and skipped
//! - An apply failure aborts replay
//! - Logs written to disk replay after reopening

use tabletkv::wal::{WalRecovery, WalWriter, BLOCK_SIZE, HEADER_SIZE};
use tabletkv::{ByteView, DiskFileSystem, FileSystem, KvError, WalSyncStrategy};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write_log(transactions: &[&[u8]]) -> Vec<u8> {
    let mut writer = WalWriter::new(Vec::new(), 0, WalSyncStrategy::EveryWrite);
    for tx in transactions {
        writer.emit(tx).unwrap();
    }
    writer.into_inner()
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_replay_in_order() {
    let log = write_log(&[b"one", b"two", b"three"]);
    let len = log.len() as u64;

    let mut seen = Vec::new();
    let result = WalRecovery::replay(ByteView::from(log), |tx| {
        seen.push(tx.to_vec());
        Ok(())
    })
    .unwrap();

    assert_eq!(seen, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    assert_eq!(result.transactions_recovered, 3);
    assert_eq!(result.transactions_corrupted, 0);
    assert_eq!(result.log_length, len);
}

#[test]
fn test_replay_empty_log() {
    let result = WalRecovery::replay(ByteView::empty(), |_| Ok(())).unwrap();
    assert_eq!(result.transactions_recovered, 0);
    assert_eq!(result.log_length, 0);
}

#[test]
fn test_replay_skips_corruption() {
    let filler = vec![1u8; BLOCK_SIZE - 2 * HEADER_SIZE - 3];
    let mut log = write_log(&[b"bad".as_slice(), filler.as_slice(), b"good".as_slice()]);
    log[HEADER_SIZE] ^= 0xff; // first payload byte

    let (txs, result) = WalRecovery::recover(ByteView::from(log));
    assert_eq!(txs, vec![ByteView::from_static(b"good")]);
    assert_eq!(result.transactions_recovered, 1);
    assert_eq!(result.transactions_corrupted, 1);
}

#[test]
fn test_apply_error_aborts_replay() {
    let log = write_log(&[b"a", b"b", b"c"]);
    let mut applied = 0;
    let err = WalRecovery::replay(ByteView::from(log), |_| {
        applied += 1;
        if applied == 2 {
            return Err(KvError::Config("refused".to_string()));
        }
        Ok(())
    })
    .unwrap_err();
    assert!(matches!(err, KvError::Config(_)));
    assert_eq!(applied, 2);
}

#[test]
fn test_verify_counts_without_applying() {
    let mut log = write_log(&[b"x", b"y"]);
    log.truncate(log.len() - 1);
    let result = WalRecovery::verify(ByteView::from(log));
    assert_eq!(result.transactions_recovered, 1);
    assert_eq!(result.transactions_corrupted, 1);
}

#[test]
fn test_recover_from_disk() {
    let dir = setup_temp_dir();
    let path = dir.path().join("write.log");
    let fs = DiskFileSystem::new();

    {
        let mut writer =
            WalWriter::new(fs.create(&path).unwrap(), 0, WalSyncStrategy::EveryNEntries { count: 10 });
        for i in 0..100u32 {
            writer.emit(&i.to_be_bytes()).unwrap();
        }
        writer.sync().unwrap();
    }

    let (txs, result) = WalRecovery::recover(fs.read(&path).unwrap());
    assert_eq!(result.transactions_recovered, 100);
    for (i, tx) in txs.iter().enumerate() {
        assert_eq!(tx.as_slice(), &(i as u32).to_be_bytes()[..]);
    }
}
