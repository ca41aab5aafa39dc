// Local store: the small set of file operations the client needs.
// `FileStore` talks to the real filesystem; `MemoryStore` keeps files in a
// map so the client can be exercised without touching disk.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::StoreError;

/// File operations used by `BinClient` and the bin-list helpers.
pub trait Store {
    /// Read a file that must carry a `.json` extension. The extension is
    /// checked before the file is touched.
    fn read_json(&self, path: &Path) -> Result<Vec<u8>, StoreError>;

    /// Read a file as raw bytes, whatever its name.
    fn read_plain(&self, path: &Path) -> Result<Vec<u8>, StoreError>;

    /// Replace the whole file, creating it if needed.
    fn write(&self, path: &Path, content: &[u8]) -> Result<(), StoreError>;

    /// Append to the end of the file, creating it if needed.
    fn append(&self, path: &Path, content: &[u8]) -> Result<(), StoreError>;
}

/// Returns true when `path` ends in a `.json` extension (any ASCII case).
pub fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn check_json(path: &Path) -> Result<(), StoreError> {
    if is_json_path(path) {
        Ok(())
    } else {
        Err(StoreError::NotJson { path: path.to_path_buf() })
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Store backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStore;

impl FileStore {
    pub fn new() -> Self {
        FileStore
    }
}

impl Store for FileStore {
    fn read_json(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        check_json(path)?;
        self.read_plain(path)
    }

    fn read_plain(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        std::fs::read(path).map_err(io_error(path))
    }

    fn write(&self, path: &Path, content: &[u8]) -> Result<(), StoreError> {
        std::fs::write(path, content).map_err(io_error(path))
    }

    fn append(&self, path: &Path, content: &[u8]) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_error(path))?;
        file.write_all(content).map_err(io_error(path))?;
        file.flush().map_err(io_error(path))
    }
}

/// In-memory store. Missing files behave like `NotFound` on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper to seed a file.
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.lock().insert(path.into(), content.into());
        self
    }

    /// Current content of `path`, if it exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.lock().get(path.as_ref()).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Store for MemoryStore {
    fn read_json(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        check_json(path)?;
        self.read_plain(path)
    }

    fn read_plain(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        self.lock()
            .get(path)
            .cloned()
            .ok_or_else(|| io_error(path)(io::Error::from(io::ErrorKind::NotFound)))
    }

    fn write(&self, path: &Path, content: &[u8]) -> Result<(), StoreError> {
        self.lock().insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    fn append(&self, path: &Path, content: &[u8]) -> Result<(), StoreError> {
        self.lock()
            .entry(path.to_path_buf())
            .or_default()
            .extend_from_slice(content);
        Ok(())
    }
}
