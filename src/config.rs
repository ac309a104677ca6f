//! Configuration for tabletkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{KvError, Result};

// =============================================================================
// Tablet Options
// =============================================================================

/// Options used when writing a tablet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabletOptions {
    /// Target size of an uncompressed data block (bytes). A block is
    /// flushed once its encoded size reaches this budget.
    pub block_size: usize,

    /// Snappy-compress blocks (kept only when it saves space)
    pub block_compression: bool,

    /// Number of entries between restart points inside a block
    pub key_restart_interval: usize,
}

impl Default for TabletOptions {
    fn default() -> Self {
        Self {
            block_size: 32 * 1024,
            block_compression: true,
            key_restart_interval: 128,
        }
    }
}

impl TabletOptions {
    /// Set the block size (in bytes)
    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    /// Enable or disable block compression
    pub fn block_compression(mut self, enabled: bool) -> Self {
        self.block_compression = enabled;
        self
    }

    /// Set the key restart interval (entries per restart point)
    pub fn key_restart_interval(mut self, interval: usize) -> Self {
        self.key_restart_interval = interval;
        self
    }

    /// Reject options no builder can honor
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(KvError::Config("block_size must be > 0".to_string()));
        }
        if self.key_restart_interval == 0 {
            return Err(KvError::Config(
                "key_restart_interval must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Options used when reading a tablet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Recompute each block's CRC32 and compare against the stored one
    pub verify_checksums: bool,
}

impl ReaderOptions {
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }
}

// =============================================================================
// Database Configuration
// =============================================================================

/// Main configuration for a database instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── write.log        (write-ahead log)
    ///     ├── stack.txt        (tablet stack, oldest first)
    ///     └── tablet_*.tab     (tablet files)
    pub data_dir: PathBuf,

    /// Create `data_dir` when it does not exist
    pub create_if_missing: bool,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Max approximate size of memtable before flush (in bytes)
    pub memtable_size_limit: usize,

    // -------------------------------------------------------------------------
    // Tablet Configuration
    // -------------------------------------------------------------------------
    /// Options for tablets written by flush and compaction
    pub tablet: TabletOptions,

    /// Options for tablets opened by the database
    pub reader: ReaderOptions,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./tabletkv_data"),
            create_if_missing: true,
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            memtable_size_limit: 4 * 1024 * 1024, // 4 MB
            tablet: TabletOptions::default(),
            reader: ReaderOptions::default(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        self.tablet.validate()?;
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(KvError::Config(
                "wal sync entry count must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Create the data directory on open if missing
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the memtable size limit (in bytes)
    pub fn memtable_size_limit(mut self, size: usize) -> Self {
        self.config.memtable_size_limit = size;
        self
    }

    /// Set the options used for new tablets
    pub fn tablet_options(mut self, options: TabletOptions) -> Self {
        self.config.tablet = options;
        self
    }

    /// Verify block checksums when reading tablets
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.config.reader.verify_checksums = verify;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
