//! Engine Module
//!
//! The database that coordinates all components.
//!
//! ## Responsibilities
//! - Log every batch before applying it to the memtable
//! - Answer reads through a merge of the memtable and all tablets
//! - Flush the memtable to a tablet when it is full
//! - Replay the log on startup
//! - Compact the tablet stack on request
//! - Receive whole tablets from a byte stream

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::batch::Batch;
use crate::config::Config;
use crate::error::{KvError, Result};
use crate::fs::{FileSystem, WritableFile};
use crate::kv::KeyValue;
use crate::memtable::MemTable;
use crate::merge::{KvSource, MergeIter, MergeView};
use crate::storage::TabletStack;
use crate::tablet::{StreamTablet, TabletSummary};
use crate::view::ByteView;
use crate::wal::{WalRecovery, WalWriter};

/// An open database
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (apply/put/delete/flush/compact): Serialized by `write_lock`
///   - Must acquire: write_lock → WAL → memtable → stack
///
/// - **Reads** (get/find): Never take `write_lock`
///   - Snapshot the memtable `Arc`, then the tablet list, then merge
///   - An open iterator does not see later writes
pub struct Database {
    /// Database configuration
    config: Config,

    /// File-system capability every file goes through
    fs: Arc<dyn FileSystem>,

    /// Path of the write-ahead log
    log_path: PathBuf,

    /// Write-ahead log for durability (exclusive access needed)
    wal: Mutex<WalWriter<Box<dyn WritableFile>>>,

    /// Active memtable; replaced wholesale by a flush
    memtable: RwLock<Arc<MemTable>>,

    /// Tablets on disk, oldest first
    stack: TabletStack,

    /// Serializes write operations
    write_lock: Mutex<()>,
}

impl Database {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "write.log";

    /// Open or create a database with the given config
    ///
    /// On startup:
    /// 1. Open/create data directory
    /// 2. Load the tablet stack
    /// 3. Replay the log into a memtable
    /// 4. Flush replayed data to a tablet and start a fresh log
    pub fn open(config: Config, fs: Arc<dyn FileSystem>) -> Result<Self> {
        config.validate()?;

        // Step 1: Data directory
        let data_dir = config.data_dir.clone();
        if !fs.exists(&data_dir) {
            if !config.create_if_missing {
                return Err(KvError::Config(format!(
                    "database directory {} does not exist",
                    data_dir.display()
                )));
            }
            fs.create_dir_all(&data_dir)?;
        }

        // Step 2: Tablets
        let stack = TabletStack::open(Arc::clone(&fs), &data_dir, config.reader)?;

        // Step 3: Replay the log
        let log_path = data_dir.join(Self::WAL_FILENAME);
        let memtable = MemTable::new();
        if fs.exists(&log_path) {
            let log = fs.read(&log_path)?;
            WalRecovery::replay(log, |transaction| memtable.apply_encoded(transaction))?;
        }

        // Step 4: Make replayed data durable in a tablet, then truncate.
        // Appending after a torn tail would hide new records behind it.
        if !memtable.is_empty() {
            info!(entries = memtable.entry_count(), "flushing replayed entries to tablet");
            let (name, _) = stack.write(memtable.iter().map(Ok), config.tablet)?;
            stack.push(&name)?;
        }
        let wal = WalWriter::new(fs.create(&log_path)?, 0, config.wal_sync_strategy);

        info!(dir = %data_dir.display(), tablets = stack.len(), "database open");

        Ok(Self {
            config,
            fs,
            log_path,
            wal: Mutex::new(wal),
            memtable: RwLock::new(Arc::new(MemTable::new())),
            stack,
            write_lock: Mutex::new(()),
        })
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Apply a batch atomically
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Write to WAL (durability)
    /// 3. Apply to MemTable
    /// 4. Flush if the memtable reached its size limit
    pub fn apply(&self, batch: &Batch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let _write_guard = self.write_lock.lock();

        let encoded = batch.as_view();
        self.wal.lock().emit(&encoded)?;

        let memtable = self.current_memtable();
        memtable.apply_encoded(encoded)?;

        if memtable.should_flush(self.config.memtable_size_limit) {
            self.flush_internal()?;
        }
        Ok(())
    }

    /// Put a key-value pair
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut batch = Batch::new();
        batch.put(key, value);
        self.apply(&batch)
    }

    /// Delete a key
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let mut batch = Batch::new();
        batch.delete(key);
        self.apply(&batch)
    }

    /// Flush memtable to a new tablet (public API)
    ///
    /// Returns `None` when there was nothing to flush.
    pub fn flush(&self) -> Result<Option<TabletSummary>> {
        let _write_guard = self.write_lock.lock();
        self.flush_internal()
    }

    /// Internal flush implementation (called with write lock held)
    fn flush_internal(&self) -> Result<Option<TabletSummary>> {
        let memtable = self.current_memtable();
        if memtable.is_empty() {
            return Ok(None);
        }

        // Step 1: Write and stack the tablet
        let (name, summary) = self
            .stack
            .write(memtable.iter().map(Ok), self.config.tablet)?;
        self.stack.push(&name)?;

        // Step 2: Swap in an empty memtable
        *self.memtable.write() = Arc::new(MemTable::new());

        // Step 3: Truncate WAL (entries are now durable in the tablet)
        *self.wal.lock() = WalWriter::new(
            self.fs.create(&self.log_path)?,
            0,
            self.config.wal_sync_strategy,
        );

        info!(%name, entries = summary.entry_count, bytes = summary.file_size, "flushed memtable");
        Ok(Some(summary))
    }

    /// Merge every tablet into one, dropping tombstones
    ///
    /// The memtable is not touched. Returns `None` when there are no
    /// tablets.
    pub fn compact(&self) -> Result<Option<TabletSummary>> {
        let _write_guard = self.write_lock.lock();

        let tablets = self.stack.tablets();
        if tablets.is_empty() {
            return Ok(None);
        }
        let before = tablets.len();
        let view = MergeView::with_sources(
            tablets
                .into_iter()
                .map(|t| Arc::new(t) as Arc<dyn KvSource>)
                .collect(),
        );
        let live = view
            .find(None)?
            .filter(|r| !matches!(r, Ok(kv) if kv.is_deleted()));
        let (name, summary) = self.stack.write(live, self.config.tablet)?;
        self.stack.replace_all(&name)?;

        info!(%name, merged = before, entries = summary.entry_count, "compacted tablets");
        Ok(Some(summary))
    }

    /// Add an existing tablet file in the data directory as the newest
    pub fn push_tablet(&self, name: &str) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.stack.push(name)
    }

    /// Receive a complete tablet from `reader` and make it the newest
    ///
    /// The stream is copied byte for byte into a new tablet file while
    /// `on_entries` is handed the entries of each verified data block.
    /// A bad header, checksum or footer pushes nothing and removes the
    /// partial file. Returns the new tablet's file name.
    pub fn push_tablet_stream<R, F>(&self, reader: R, on_entries: F) -> Result<String>
    where
        R: Read,
        F: FnMut(Vec<KeyValue>),
    {
        let _write_guard = self.write_lock.lock();

        let (name, mut file) = self.stack.create_file()?;
        let copied = StreamTablet::new(reader, self.config.reader)
            .copy_to(&mut file, on_entries)
            .and_then(|bytes| {
                file.sync()?;
                Ok(bytes)
            });
        drop(file);

        match copied.and_then(|bytes| self.stack.push(&name).map(|_| bytes)) {
            Ok(bytes) => {
                info!(%name, bytes, "pushed streamed tablet");
                Ok(name)
            }
            Err(e) => {
                let path = self.stack.data_dir().join(&name);
                if let Err(cleanup) = self.fs.remove(&path) {
                    warn!(%name, error = %cleanup, "failed to remove rejected tablet");
                }
                Err(e)
            }
        }
    }

    /// Remove the newest tablet from the stack (its file is kept)
    pub fn pop_tablet(&self) -> Result<Option<String>> {
        let _write_guard = self.write_lock.lock();
        self.stack.pop()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a value by key; `None` if absent or deleted
    pub fn get(&self, key: &[u8]) -> Result<Option<ByteView>> {
        self.view().get(key)
    }

    /// Live entries with key `>= term`, in order
    pub fn find(&self, term: Option<&[u8]>) -> Result<Scan> {
        Ok(Scan {
            inner: self.view().find(term)?,
            prefix: None,
        })
    }

    /// Live entries whose key starts with `prefix`, in order
    pub fn find_by_prefix(&self, prefix: &[u8]) -> Result<Scan> {
        Ok(Scan {
            inner: self.view().find(Some(prefix))?,
            prefix: Some(ByteView::copy_from_slice(prefix)),
        })
    }

    /// Snapshot of every source, oldest first, memtable last
    fn view(&self) -> MergeView {
        // Memtable before tablets: a concurrent flush pushes its tablet
        // before swapping the memtable, so nothing can be missed.
        let memtable: Arc<dyn KvSource> = self.current_memtable();
        let mut view = MergeView::with_sources(
            self.stack
                .tablets()
                .into_iter()
                .map(|t| Arc::new(t) as Arc<dyn KvSource>)
                .collect(),
        );
        view.push(memtable);
        debug!(sources = view.len(), "merged read");
        view
    }

    fn current_memtable(&self) -> Arc<MemTable> {
        Arc::clone(&self.memtable.read())
    }

    /// Close the database gracefully
    ///
    /// Flushes any pending data and syncs to disk
    pub fn close(self) -> Result<()> {
        self.flush()?;
        self.wal.lock().sync()?;
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the approximate memtable size
    pub fn memtable_size(&self) -> usize {
        self.current_memtable().approx_size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.current_memtable().entry_count()
    }

    /// Get the number of tablets
    pub fn tablet_count(&self) -> usize {
        self.stack.len()
    }

    /// Tablet file names, oldest first
    pub fn tablet_names(&self) -> Vec<String> {
        self.stack.names()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Iterator over the live entries of a [`Database`]
///
/// Tombstones are skipped. A prefix scan stops at the first key outside
/// the prefix.
pub struct Scan {
    inner: MergeIter,
    prefix: Option<ByteView>,
}

impl Iterator for Scan {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let kv = match self.inner.next()? {
                Ok(kv) => kv,
                Err(e) => return Some(Err(e)),
            };
            if let Some(prefix) = &self.prefix {
                if !kv.key.starts_with(prefix) {
                    return None;
                }
            }
            if !kv.is_deleted() {
                return Some(Ok(kv));
            }
        }
    }
}
