//! Core document logic for Glyphpad.
//! This crate is the single source of truth for scene, autosave, and
//! background-fetch invariants; presentation layers only render its
//! published state.

pub mod fetch;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;

pub use fetch::{
    FetchCompletion, FetchDelivery, FetchError, FetchOutcome, FetchToken, NullFetcher,
    ResourceFetcher,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::scene::{Element, ElementId, Scene, SceneDecodeError};
pub use service::document::{
    DocumentController, DocumentEvent, DocumentId, ResourceState, SubscriptionId,
};
pub use service::store::{DocumentStore, StoreError};
pub use storage::{
    DirectoryBackend, MemoryBackend, StorageBackend, StorageError, StorageResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
