//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `glyphpad_core` wiring against
//!   a real directory backend.
//! - Keep output deterministic for quick local sanity checks.

use glyphpad_core::{
    default_log_level, init_logging, DirectoryBackend, DocumentStore, NullFetcher,
};
use std::sync::Arc;

fn main() {
    let log_dir = std::env::temp_dir().join("glyphpad-logs");
    if let Err(message) = init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        eprintln!("logging unavailable: {message}");
    }

    println!("glyphpad_core version={}", glyphpad_core::core_version());

    let Some(root) = std::env::args().nth(1) else {
        return;
    };
    // The namespace lives directly under the backend root; documents are
    // the files inside it.
    let backend = Arc::new(DirectoryBackend::new(&root));
    let mut store = DocumentStore::from_namespace("documents", backend, Arc::new(NullFetcher));
    println!("store={} documents={}", store.name(), store.len());
    for id in store.documents() {
        let name = store.name_of(id).unwrap_or_default();
        let elements = store
            .document(id)
            .map(|document| document.elements().len())
            .unwrap_or(0);
        println!("document name={name} id={id} elements={elements}");
    }
}
