//! Persistence backend contracts and implementations.
//!
//! # Responsibility
//! - Define the key/byte-value contract the controller and store persist
//!   through.
//! - Keep filesystem details behind the backend boundary so tests can
//!   substitute an in-memory fake.
//!
//! # Invariants
//! - `delete` of an absent key succeeds; absence is never an error.
//! - Keys are relative slash-separated paths; `..` and absolute segments
//!   are rejected before any I/O.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod dir;
mod memory;

pub use dir::DirectoryBackend;
pub use memory::MemoryBackend;

pub type StorageResult<T> = Result<T, StorageError>;

/// Transport-level persistence error.
#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    InvalidKey(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::InvalidKey(key) => write!(f, "invalid storage key: `{key}`"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::InvalidKey(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Key/byte-value store the core persists through.
///
/// Injected as `Arc<dyn StorageBackend>` at construction time; the core
/// never reaches for an implicit global namespace.
pub trait StorageBackend: Send + Sync {
    /// Reads the bytes stored under `key`. `Ok(None)` when absent.
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
    /// Writes `bytes` under `key`, replacing any previous value.
    fn write(&self, key: &str, bytes: &[u8]) -> StorageResult<()>;
    /// Removes the value under `key`. Succeeds when the key is absent.
    fn delete(&self, key: &str) -> StorageResult<()>;
    /// Lists the base names of all entries directly under `namespace`,
    /// in unspecified order.
    fn list(&self, namespace: &str) -> StorageResult<Vec<String>>;
}

/// Rejects empty, absolute, and traversal-shaped keys.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && key.split('/').all(|segment| {
            !segment.is_empty() && segment != "." && segment != ".."
        });
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
