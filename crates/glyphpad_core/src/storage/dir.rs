//! Filesystem-directory backend.
//!
//! # Responsibility
//! - Map storage keys onto plain files under a root directory.
//! - Tolerate absent files on read/delete and create parents on write.
//!
//! # Invariants
//! - A key's path never escapes the root (enforced by key validation).
//! - `list` returns file base names only; subdirectories are skipped.

use crate::storage::{validate_key, StorageBackend, StorageResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Backend rooted at one directory; each key is a relative file path.
#[derive(Debug, Clone)]
pub struct DirectoryBackend {
    root: PathBuf,
}

impl DirectoryBackend {
    /// Creates a backend over `root`. The directory itself is created
    /// lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the backing root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl StorageBackend for DirectoryBackend {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> StorageResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn list(&self, namespace: &str) -> StorageResult<Vec<String>> {
        validate_key(namespace)?;
        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.root.join(namespace))? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Non-UTF-8 file names cannot have been written through this
            // backend; skip them instead of failing the whole scan.
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}
