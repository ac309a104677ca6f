//! File-system capability
//!
//! Durable components never touch `std::fs` directly: the database is
//! handed a [`FileSystem`] when it is opened and passes it down. Two
//! implementations exist:
//!
//! - [`DiskFileSystem`]: plain files via `std::fs`
//! - [`MemFileSystem`]: shared in-memory buffers, for tests and tools

mod disk;
mod mem;

use std::fmt::Debug;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::view::ByteView;

pub use disk::DiskFileSystem;
pub use mem::MemFileSystem;

/// A file opened for writing
pub trait WritableFile: Write + Send {
    /// Flush buffered bytes and make them durable
    fn sync(&mut self) -> Result<()>;
}

/// The file operations the engine needs
pub trait FileSystem: Debug + Send + Sync {
    /// Create `path`, truncating any existing file
    fn create(&self, path: &Path) -> Result<Box<dyn WritableFile>>;

    /// Whole contents of `path`
    fn read(&self, path: &Path) -> Result<ByteView>;

    fn exists(&self, path: &Path) -> bool;

    fn remove(&self, path: &Path) -> Result<()>;

    /// Atomically replace `to` with `from`
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Files directly inside `dir`, sorted
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

impl WritableFile for Vec<u8> {
    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}

impl WritableFile for Box<dyn WritableFile> {
    fn sync(&mut self) -> Result<()> {
        (**self).sync()
    }
}

impl WritableFile for std::fs::File {
    fn sync(&mut self) -> Result<()> {
        self.sync_data()?;
        Ok(())
    }
}
