//! In-memory backend for tests and unrooted stores.
//!
//! # Responsibility
//! - Provide the substitutable fake for everything `DirectoryBackend` does.
//! - Expose inspection helpers so tests can assert on persisted bytes.
//!
//! # Invariants
//! - Key semantics match `DirectoryBackend`: namespaces are slash-separated
//!   prefixes and `list` returns base names one level below the namespace.

use crate::storage::{validate_key, StorageBackend, StorageResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Backend over a process-local key/value map.
///
/// The mutex exists only because backends are shared `Arc` handles; the
/// core itself serializes access per spec'd single-owner discipline.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the bytes stored under `key`, for test assertions.
    pub fn snapshot(&self, key: &str) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .expect("memory backend mutex poisoned")
            .get(key)
            .cloned()
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("memory backend mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self
            .entries
            .lock()
            .expect("memory backend mutex poisoned")
            .get(key)
            .cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        self.entries
            .lock()
            .expect("memory backend mutex poisoned")
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.entries
            .lock()
            .expect("memory backend mutex poisoned")
            .remove(key);
        Ok(())
    }

    fn list(&self, namespace: &str) -> StorageResult<Vec<String>> {
        validate_key(namespace)?;
        let prefix = format!("{namespace}/");
        Ok(self
            .entries
            .lock()
            .expect("memory backend mutex poisoned")
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }
}
