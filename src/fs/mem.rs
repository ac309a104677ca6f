//! In-memory file system
//!
//! Every handle shares the same buffers, so a file written through one
//! handle is visible to any later [`FileSystem::read`]. Clones of a
//! `MemFileSystem` share state too.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{KvError, Result};
use crate::view::ByteView;

use super::{FileSystem, WritableFile};

type Buffer = Arc<Mutex<Vec<u8>>>;

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, Buffer>,
    dirs: BTreeSet<PathBuf>,
}

/// Files held in memory
#[derive(Debug, Clone, Default)]
pub struct MemFileSystem {
    state: Arc<RwLock<State>>,
}

impl MemFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite part of a file in place, to simulate corruption
    pub fn corrupt(&self, path: &Path, offset: usize, bytes: &[u8]) -> Result<()> {
        let buf = self.buffer(path)?;
        let mut data = buf.lock();
        let end = offset + bytes.len();
        if end > data.len() {
            return Err(KvError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is only {} bytes", path.display(), data.len()),
            )));
        }
        data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    fn buffer(&self, path: &Path) -> Result<Buffer> {
        self.state
            .read()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }
}

fn not_found(path: &Path) -> KvError {
    KvError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} not found", path.display()),
    ))
}

struct MemFile {
    buf: Buffer,
}

impl Write for MemFile {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WritableFile for MemFile {
    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}

impl FileSystem for MemFileSystem {
    fn create(&self, path: &Path) -> Result<Box<dyn WritableFile>> {
        let buf = Buffer::default();
        self.state
            .write()
            .files
            .insert(path.to_path_buf(), buf.clone());
        Ok(Box::new(MemFile { buf }))
    }

    fn read(&self, path: &Path) -> Result<ByteView> {
        let buf = self.buffer(path)?;
        let data = buf.lock();
        Ok(ByteView::copy_from_slice(&data))
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.read();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        match self.state.write().files.remove(path) {
            Some(_) => Ok(()),
            None => Err(not_found(path)),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut state = self.state.write();
        let buf = state.files.remove(from).ok_or_else(|| not_found(from))?;
        state.files.insert(to.to_path_buf(), buf);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.state.write();
        for dir in path.ancestors() {
            if !dir.as_os_str().is_empty() {
                state.dirs.insert(dir.to_path_buf());
            }
        }
        Ok(())
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state.read();
        if !state.dirs.contains(dir) {
            return Err(not_found(dir));
        }
        Ok(state
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }
}
