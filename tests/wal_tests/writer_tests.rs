//! Tests for WalWriter
//!
//! These tests verify:
//! - Returned offsets and log length bookkeeping
//! - Sync strategies (every write vs. every N transactions)
//! - Resuming a log at a non-zero position keeps block alignment
//! - Writing through the file-system capability

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tabletkv::fs::WritableFile;
use tabletkv::wal::{RecordType, WalReader, WalWriter, BLOCK_SIZE, HEADER_SIZE};
use tabletkv::{ByteView, DiskFileSystem, FileSystem, WalSyncStrategy};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// In-memory file that counts syncs
#[derive(Default)]
struct CountingFile {
    data: Vec<u8>,
    syncs: Arc<AtomicUsize>,
}

impl Write for CountingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WritableFile for CountingFile {
    fn sync(&mut self) -> tabletkv::Result<()> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn read_back(log: Vec<u8>) -> Vec<Vec<u8>> {
    WalReader::new(ByteView::from(log))
        .transactions()
        .map(|t| t.unwrap().to_vec())
        .collect()
}

// =============================================================================
// Offset Tests
// =============================================================================

#[test]
fn test_emit_returns_record_offsets() {
    let mut writer = WalWriter::new(Vec::new(), 0, WalSyncStrategy::EveryWrite);
    assert_eq!(writer.emit(b"hello").unwrap(), 0);
    assert_eq!(writer.emit(b"world!").unwrap(), (HEADER_SIZE + 5) as u64);
    assert_eq!(writer.position(), (2 * HEADER_SIZE + 11) as u64);
    assert_eq!(writer.into_inner().len(), 2 * HEADER_SIZE + 11);
}

#[test]
fn test_offset_after_padding_is_next_block() {
    let mut writer = WalWriter::new(Vec::new(), 0, WalSyncStrategy::EveryWrite);
    writer.emit(&vec![9u8; BLOCK_SIZE - HEADER_SIZE - 3]).unwrap();
    assert_eq!(writer.position(), (BLOCK_SIZE - 3) as u64);
    assert_eq!(writer.emit(b"next").unwrap(), BLOCK_SIZE as u64);
}

#[test]
fn test_large_transaction_spans_blocks() {
    let payload: Vec<u8> = (0..3 * BLOCK_SIZE + 100).map(|i| (i % 251) as u8).collect();
    let mut writer = WalWriter::new(Vec::new(), 0, WalSyncStrategy::EveryWrite);
    writer.emit(&payload).unwrap();
    writer.emit(b"tail").unwrap();
    let log = writer.into_inner();

    assert_eq!(log[4], RecordType::First as u8);
    assert_eq!(log[BLOCK_SIZE + 4], RecordType::Middle as u8);
    assert_eq!(log[2 * BLOCK_SIZE + 4], RecordType::Middle as u8);
    assert_eq!(log[3 * BLOCK_SIZE + 4], RecordType::Last as u8);
    assert_eq!(read_back(log), vec![payload, b"tail".to_vec()]);
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_sync_every_write() {
    let file = CountingFile::default();
    let syncs = Arc::clone(&file.syncs);
    let mut writer = WalWriter::new(file, 0, WalSyncStrategy::EveryWrite);
    for _ in 0..5 {
        writer.emit(b"entry").unwrap();
    }
    assert_eq!(syncs.load(Ordering::SeqCst), 5);
    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_sync_every_n_entries() {
    let file = CountingFile::default();
    let syncs = Arc::clone(&file.syncs);
    let mut writer = WalWriter::new(file, 0, WalSyncStrategy::EveryNEntries { count: 3 });
    for _ in 0..7 {
        writer.emit(b"entry").unwrap();
    }
    assert_eq!(syncs.load(Ordering::SeqCst), 2);
    assert_eq!(writer.uncommitted_count(), 1);

    writer.sync().unwrap();
    assert_eq!(syncs.load(Ordering::SeqCst), 3);
    assert_eq!(writer.uncommitted_count(), 0);
}

// =============================================================================
// Resume Tests
// =============================================================================

#[test]
fn test_resume_at_existing_position() {
    let mut writer = WalWriter::new(Vec::new(), 0, WalSyncStrategy::EveryWrite);
    writer.emit(&vec![1u8; BLOCK_SIZE - HEADER_SIZE - 3]).unwrap();
    let position = writer.position();
    let log = writer.into_inner();

    // A new writer over the same bytes pads the 3-byte block tail
    let mut writer = WalWriter::new(log, position, WalSyncStrategy::EveryWrite);
    writer.emit(b"after restart").unwrap();
    let log = writer.into_inner();
    assert_eq!(&log[BLOCK_SIZE - 3..BLOCK_SIZE], &[0, 0, 0]);

    let txs = read_back(log);
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[1], b"after restart".to_vec());
}

#[test]
fn test_write_through_disk_file_system() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("write.log");
    let fs = DiskFileSystem::new();

    let mut writer = WalWriter::new(fs.create(&path).unwrap(), 0, WalSyncStrategy::EveryWrite);
    writer.emit(b"one").unwrap();
    writer.emit(b"two").unwrap();
    writer.emit(b"three").unwrap();
    drop(writer);

    let txs = read_back(fs.read(&path).unwrap().to_vec());
    assert_eq!(txs, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
}
