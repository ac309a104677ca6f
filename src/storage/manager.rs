//! Tablet Stack
//!
//! Tracks which tablets make up the database and in what order.
//!
//! ## Responsibilities
//! - Load the stack file and open every tablet it names on startup
//! - Write new tablet files with fresh names
//! - Push, pop and replace tablets, rewriting the stack file each time
//!
//! The stack file lists one tablet file name per line, oldest first.
//! It is rewritten through a temporary file and a rename.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::{ReaderOptions, TabletOptions};
use crate::error::{KvError, Result};
use crate::fs::{FileSystem, WritableFile};
use crate::kv::KeyValue;
use crate::tablet::{write_tablet, Tablet, TabletSummary};

/// File name of the tablet stack inside the data directory
pub const STACK_FILENAME: &str = "stack.txt";
const STACK_TMP_FILENAME: &str = "stack.txt.tmp";

/// A tablet and the file it was loaded from
#[derive(Debug, Clone)]
pub struct StackEntry {
    pub name: String,
    pub tablet: Tablet,
}

/// The ordered set of open tablets
///
/// ## Concurrency:
/// - `tablets`: Protected by RwLock (readers take a cheap snapshot)
/// - `next_tablet_id`: Atomic counter (lock-free)
pub struct TabletStack {
    fs: Arc<dyn FileSystem>,

    /// Directory holding the stack file and tablets
    data_dir: PathBuf,

    reader_opts: ReaderOptions,

    /// Open tablets, ordered oldest → newest
    tablets: RwLock<Vec<StackEntry>>,

    /// Next ID for naming new tablets
    next_tablet_id: AtomicU64,
}

impl TabletStack {
    /// Open the stack stored in `data_dir`
    ///
    /// A missing stack file means an empty stack.
    pub fn open(fs: Arc<dyn FileSystem>, data_dir: &Path, reader_opts: ReaderOptions) -> Result<Self> {
        let stack_path = data_dir.join(STACK_FILENAME);
        let names: Vec<String> = if fs.exists(&stack_path) {
            let contents = fs.read(&stack_path)?;
            String::from_utf8_lossy(&contents)
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            Vec::new()
        };

        let mut tablets = Vec::with_capacity(names.len());
        for name in names {
            let tablet = open_tablet(fs.as_ref(), &data_dir.join(&name), reader_opts)?;
            tablets.push(StackEntry { name, tablet });
        }

        // Never reuse the name of a file already in the directory.
        let max_id = fs
            .list(data_dir)?
            .iter()
            .filter_map(|p| Self::parse_tablet_id(p))
            .max()
            .unwrap_or(0);

        info!(tablets = tablets.len(), dir = %data_dir.display(), "opened tablet stack");

        Ok(Self {
            fs,
            data_dir: data_dir.to_path_buf(),
            reader_opts,
            tablets: RwLock::new(tablets),
            next_tablet_id: AtomicU64::new(max_id + 1),
        })
    }

    /// Write `records` to a new tablet file and return its name
    ///
    /// The tablet is synced but not added to the stack.
    pub fn write<I>(&self, records: I, opts: TabletOptions) -> Result<(String, TabletSummary)>
    where
        I: IntoIterator<Item = Result<KeyValue>>,
    {
        let (name, mut file) = self.create_file()?;
        let summary = write_tablet(&mut file, records, opts)?;
        file.sync()?;
        debug!(%name, entries = summary.entry_count, bytes = summary.file_size, "wrote tablet");
        Ok((name, summary))
    }

    /// Create an empty file under a fresh tablet name
    ///
    /// Nothing is added to the stack; see [`TabletStack::push`].
    pub fn create_file(&self) -> Result<(String, Box<dyn WritableFile>)> {
        let id = self.next_tablet_id.fetch_add(1, Ordering::SeqCst);
        let name = Self::tablet_name(id);
        let file = self.fs.create(&self.data_dir.join(&name))?;
        Ok((name, file))
    }

    /// Open tablet `name` and make it the newest
    pub fn push(&self, name: &str) -> Result<()> {
        let tablet = open_tablet(self.fs.as_ref(), &self.data_dir.join(name), self.reader_opts)?;
        let mut tablets = self.tablets.write();
        tablets.push(StackEntry {
            name: name.to_string(),
            tablet,
        });
        self.persist(&tablets)
    }

    /// Remove the newest tablet from the stack, returning its name
    ///
    /// The file itself is left in place.
    pub fn pop(&self) -> Result<Option<String>> {
        let mut tablets = self.tablets.write();
        let popped = match tablets.pop() {
            Some(entry) => entry,
            None => return Ok(None),
        };
        self.persist(&tablets)?;
        Ok(Some(popped.name))
    }

    /// Replace the whole stack with tablet `name` and delete the old files
    pub fn replace_all(&self, name: &str) -> Result<()> {
        let tablet = open_tablet(self.fs.as_ref(), &self.data_dir.join(name), self.reader_opts)?;
        let mut tablets = self.tablets.write();
        let old = std::mem::replace(
            &mut *tablets,
            vec![StackEntry {
                name: name.to_string(),
                tablet,
            }],
        );
        self.persist(&tablets)?;
        drop(tablets);

        for entry in old {
            if entry.name != name {
                self.fs.remove(&self.data_dir.join(&entry.name))?;
            }
        }
        Ok(())
    }

    /// The open tablets, oldest first
    pub fn tablets(&self) -> Vec<Tablet> {
        self.tablets.read().iter().map(|e| e.tablet.clone()).collect()
    }

    /// File names of the open tablets, oldest first
    pub fn names(&self) -> Vec<String> {
        self.tablets.read().iter().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tablets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tablets.read().is_empty()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn persist(&self, tablets: &[StackEntry]) -> Result<()> {
        let mut contents = String::new();
        for entry in tablets {
            contents.push_str(&entry.name);
            contents.push('\n');
        }
        let tmp = self.data_dir.join(STACK_TMP_FILENAME);
        let mut file = self.fs.create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync()?;
        drop(file);
        self.fs.rename(&tmp, &self.data_dir.join(STACK_FILENAME))
    }

    /// "tablet_000042.tab"
    fn tablet_name(id: u64) -> String {
        format!("tablet_{:06}.tab", id)
    }

    /// "tablet_000042.tab" → Some(42)
    fn parse_tablet_id(path: &Path) -> Option<u64> {
        let name = path.file_stem()?.to_string_lossy();
        let id_str = name.strip_prefix("tablet_")?;
        id_str.parse().ok()
    }
}

fn open_tablet(fs: &dyn FileSystem, path: &Path, opts: ReaderOptions) -> Result<Tablet> {
    let data = fs.read(path)?;
    Tablet::open(data, opts).map_err(|e| match e {
        KvError::Validation(msg) => {
            KvError::Validation(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}
