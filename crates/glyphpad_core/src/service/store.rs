//! Document collection store: identity-keyed controllers with display names.
//!
//! # Responsibility
//! - Exclusively own registered controllers for their store lifetime.
//! - Keep the identity->controller and identity->name maps in sync through
//!   store operations only.
//! - Persist the identity->name mapping on every membership change and
//!   hydrate membership from a directory-like namespace.
//!
//! # Invariants
//! - Display names are unique within one store; `add` guarantees this by
//!   suffixing and `rename` rejects collisions outright.
//! - Removing a document deletes its persisted bytes (best effort) and its
//!   membership entry before returning; readers never observe partial state.
//! - Hydration failures degrade to an empty store, never a construction
//!   failure.

use crate::fetch::ResourceFetcher;
use crate::service::document::{DocumentController, DocumentId};
use crate::storage::StorageBackend;
use log::{error, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_DOCUMENT_NAME: &str = "Untitled";

/// Store operation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The target name is already held by a different document.
    NameConflict(String),
    /// The target name cannot form a storage key (empty, `.`, `..`, or
    /// slash-containing), so accepting it would corrupt or lose the
    /// document's persisted form.
    InvalidName(String),
    /// The document id is not registered in this store.
    UnknownDocument(DocumentId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameConflict(name) => write!(f, "document name already in use: `{name}`"),
            Self::InvalidName(name) => write!(f, "document name is not storable: `{name}`"),
            Self::UnknownDocument(id) => write!(f, "document not registered: {id}"),
        }
    }
}

impl Error for StoreError {}

/// Named registry of document controllers keyed by identity.
pub struct DocumentStore {
    name: String,
    namespace_root: Option<String>,
    documents: BTreeMap<DocumentId, DocumentController>,
    names: BTreeMap<DocumentId, String>,
    backend: Arc<dyn StorageBackend>,
    fetcher: Arc<dyn ResourceFetcher>,
}

impl DocumentStore {
    /// Creates an unrooted store, reloading membership from the persisted
    /// identity->name mapping. Each remembered document hydrates from its
    /// identity-derived default key.
    pub fn new(
        name: impl Into<String>,
        backend: Arc<dyn StorageBackend>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Self {
        let name = name.into();
        let mut store = Self {
            name,
            namespace_root: None,
            documents: BTreeMap::new(),
            names: BTreeMap::new(),
            backend,
            fetcher,
        };
        for (id, document_name) in store.load_mapping() {
            let controller =
                DocumentController::with_id(id, store.backend.clone(), store.fetcher.clone());
            store.documents.insert(id, controller);
            store.names.insert(id, document_name);
        }
        store
    }

    /// Creates a store over a directory-like namespace, named after the
    /// root's last path segment.
    ///
    /// Every entry under the root becomes a registered document rooted at
    /// `root/<entry>`. An unreadable root is logged and yields an empty
    /// store instead of a construction failure.
    pub fn from_namespace(
        root: impl Into<String>,
        backend: Arc<dyn StorageBackend>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Self {
        let root = root.into();
        let name = root.rsplit('/').next().unwrap_or(&root).to_string();
        let mut store = Self {
            name,
            namespace_root: Some(root.clone()),
            documents: BTreeMap::new(),
            names: BTreeMap::new(),
            backend,
            fetcher,
        };
        match store.backend.list(&root) {
            Ok(entries) => {
                for entry in entries {
                    let controller = DocumentController::at_location(
                        format!("{root}/{entry}"),
                        store.backend.clone(),
                        store.fetcher.clone(),
                    );
                    store.names.insert(controller.id(), entry);
                    store.documents.insert(controller.id(), controller);
                }
            }
            Err(err) => {
                error!(
                    "event=store_hydrate module=store status=error root={root} detail={err}"
                );
            }
        }
        store
    }

    /// Returns the store's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the namespace root, when this store is directory-backed.
    pub fn namespace_root(&self) -> Option<&str> {
        self.namespace_root.as_deref()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Returns the display name for a registered document.
    ///
    /// A document adopted without a name is lazily registered under a
    /// unique "Untitled" placeholder first. `None` only for unknown ids.
    pub fn name_of(&mut self, id: DocumentId) -> Option<String> {
        if !self.documents.contains_key(&id) {
            return None;
        }
        if let Some(existing) = self.names.get(&id) {
            return Some(existing.clone());
        }
        let placeholder = self.unique_name(DEFAULT_DOCUMENT_NAME);
        self.names.insert(id, placeholder.clone());
        self.save_mapping();
        Some(placeholder)
    }

    /// Renames a registered document.
    ///
    /// A name held by a different document rejects the rename and leaves
    /// both the prior name and the persisted location untouched. In a
    /// rooted store a successful rename moves the persisted bytes to
    /// `root/<new_name>` and deletes the old file.
    ///
    /// # Errors
    /// - `StoreError::UnknownDocument` when `id` is not registered.
    /// - `StoreError::InvalidName` when `new_name` cannot form a single
    ///   storage key under the namespace root.
    /// - `StoreError::NameConflict` when `new_name` belongs to another
    ///   registered document.
    pub fn rename(&mut self, id: DocumentId, new_name: &str) -> Result<(), StoreError> {
        if !self.documents.contains_key(&id) {
            return Err(StoreError::UnknownDocument(id));
        }
        // Checked before any persistence is touched: an unstorable name
        // would otherwise delete the old file after a swallowed save.
        if !is_storable_name(new_name) {
            return Err(StoreError::InvalidName(new_name.to_string()));
        }
        let held_elsewhere = self
            .names
            .iter()
            .any(|(other, name)| *other != id && name == new_name);
        if held_elsewhere {
            return Err(StoreError::NameConflict(new_name.to_string()));
        }
        if self.names.get(&id).is_some_and(|name| name == new_name) {
            return Ok(());
        }

        if let Some(root) = self.namespace_root.clone() {
            let controller = self
                .documents
                .get_mut(&id)
                .expect("membership checked above");
            let old_key = controller.storage_key();
            // set_location saves the scene at the new key immediately, so
            // delete the old file only after the new one exists.
            controller.set_location(format!("{root}/{new_name}"));
            if let Err(err) = self.backend.delete(&old_key) {
                warn!("event=rename module=store status=error key={old_key} detail={err}");
            }
        }
        self.names.insert(id, new_name.to_string());
        self.save_mapping();
        Ok(())
    }

    /// Creates and registers a new document under a name made unique by
    /// suffixing ("Untitled", "Untitled 2", ...). Returns its identity.
    ///
    /// # Errors
    /// - `StoreError::InvalidName` when `name` cannot form a single storage
    ///   key; a nested name would never be seen by namespace hydration.
    pub fn add(&mut self, name: &str) -> Result<DocumentId, StoreError> {
        if !is_storable_name(name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        let unique = self.unique_name(name);
        let controller = match &self.namespace_root {
            Some(root) => DocumentController::at_location(
                format!("{root}/{unique}"),
                self.backend.clone(),
                self.fetcher.clone(),
            ),
            None => DocumentController::new(self.backend.clone(), self.fetcher.clone()),
        };
        // Persist the empty scene right away so namespace hydration sees
        // documents that were added but never edited.
        controller.save();
        let id = controller.id();
        self.documents.insert(id, controller);
        self.names.insert(id, unique);
        self.save_mapping();
        Ok(id)
    }

    /// Creates and registers a new document under the default name.
    pub fn add_untitled(&mut self) -> DocumentId {
        self.add(DEFAULT_DOCUMENT_NAME)
            .expect("default document name is storable")
    }

    /// Registers an externally constructed controller without a name.
    ///
    /// The display name is assigned lazily by the first `name_of` call.
    pub fn adopt(&mut self, controller: DocumentController) -> DocumentId {
        let id = controller.id();
        self.documents.insert(id, controller);
        id
    }

    /// Removes a document: best-effort delete of its persisted bytes, then
    /// the membership entry, then the mapping write. Unknown ids are a
    /// no-op.
    pub fn remove(&mut self, id: DocumentId) {
        let Some(controller) = self.documents.remove(&id) else {
            return;
        };
        let key = controller.storage_key();
        if let Err(err) = self.backend.delete(&key) {
            warn!("event=remove module=store status=error key={key} detail={err}");
        }
        self.names.remove(&id);
        self.save_mapping();
    }

    /// Returns registered ids ordered by display name (case-sensitive
    /// lexicographic ascending; ties broken by id for determinism).
    pub fn documents(&self) -> Vec<DocumentId> {
        let mut ids: Vec<DocumentId> = self.documents.keys().copied().collect();
        ids.sort_by(|a, b| {
            let name_a = self.names.get(a).map(String::as_str).unwrap_or("");
            let name_b = self.names.get(b).map(String::as_str).unwrap_or("");
            name_a.cmp(name_b).then_with(|| a.cmp(b))
        });
        ids
    }

    /// Borrows a registered controller.
    pub fn document(&self, id: DocumentId) -> Option<&DocumentController> {
        self.documents.get(&id)
    }

    /// Mutably borrows a registered controller.
    pub fn document_mut(&mut self, id: DocumentId) -> Option<&mut DocumentController> {
        self.documents.get_mut(&id)
    }

    fn unique_name(&self, base: &str) -> String {
        let taken = |candidate: &str| self.names.values().any(|name| name == candidate);
        if !taken(base) {
            return base.to_string();
        }
        let mut counter = 2;
        loop {
            let candidate = format!("{base} {counter}");
            if !taken(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    fn mapping_key(&self) -> String {
        format!("store.{}", self.name)
    }

    /// Reads the persisted identity->name mapping; any failure degrades to
    /// an empty mapping.
    fn load_mapping(&self) -> BTreeMap<DocumentId, String> {
        let key = self.mapping_key();
        let bytes = match self.backend.read(&key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return BTreeMap::new(),
            Err(err) => {
                warn!("event=mapping_read module=store status=error key={key} detail={err}");
                return BTreeMap::new();
            }
        };
        let raw: BTreeMap<String, String> = match serde_json::from_slice(&bytes) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("event=mapping_decode module=store status=error key={key} detail={err}");
                return BTreeMap::new();
            }
        };
        raw.into_iter()
            .filter_map(|(id, name)| match Uuid::parse_str(&id) {
                Ok(id) => Some((id, name)),
                Err(err) => {
                    warn!(
                        "event=mapping_decode module=store status=skipped id={id} detail={err}"
                    );
                    None
                }
            })
            .collect()
    }

    /// Serializes the identity->name mapping under the store-scoped key.
    /// Write failures are logged and swallowed.
    fn save_mapping(&self) {
        let raw: BTreeMap<String, String> = self
            .names
            .iter()
            .map(|(id, name)| (id.to_string(), name.clone()))
            .collect();
        let bytes = serde_json::to_vec(&raw).expect("string map serialization is infallible");
        let key = self.mapping_key();
        if let Err(err) = self.backend.write(&key, &bytes) {
            warn!("event=mapping_write module=store status=error key={key} detail={err}");
        }
    }
}

/// A display name is storable when it forms exactly one key segment under
/// the namespace root. Suffixed variants ("name 2") inherit storability.
fn is_storable_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}
