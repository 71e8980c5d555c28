use glyphpad_core::{
    DocumentController, DocumentStore, MemoryBackend, NullFetcher, StorageBackend, StoreError,
};
use std::sync::Arc;

fn memory_store(name: &str) -> (DocumentStore, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let store = DocumentStore::new(name, backend.clone(), Arc::new(NullFetcher));
    (store, backend)
}

#[test]
fn add_suffixes_names_until_unique() {
    let (mut store, _backend) = memory_store("scratch");

    let first = store.add_untitled();
    let second = store.add_untitled();
    let third = store.add_untitled();

    assert_eq!(store.name_of(first).unwrap(), "Untitled");
    assert_eq!(store.name_of(second).unwrap(), "Untitled 2");
    assert_eq!(store.name_of(third).unwrap(), "Untitled 3");
    assert_eq!(store.len(), 3);
}

#[test]
fn documents_are_ordered_by_display_name() {
    let (mut store, _backend) = memory_store("scratch");

    let zebra = store.add("Zebra").unwrap();
    let apple = store.add("Apple").unwrap();
    let mango = store.add("Mango").unwrap();

    assert_eq!(store.documents(), vec![apple, mango, zebra]);
}

#[test]
fn ordering_is_case_sensitive_lexicographic() {
    let (mut store, _backend) = memory_store("scratch");

    let lower = store.add("apple").unwrap();
    let upper = store.add("Banana").unwrap();

    // Uppercase sorts before lowercase in a case-sensitive ordering.
    assert_eq!(store.documents(), vec![upper, lower]);
}

#[test]
fn rename_to_a_free_name_updates_the_mapping() {
    let (mut store, _backend) = memory_store("scratch");
    let id = store.add_untitled();

    store.rename(id, "Sketch").unwrap();

    assert_eq!(store.name_of(id).unwrap(), "Sketch");
}

#[test]
fn rename_rejects_a_name_held_by_another_document() {
    let (mut store, _backend) = memory_store("scratch");
    let first = store.add("Sketch").unwrap();
    let second = store.add("Doodle").unwrap();

    let result = store.rename(second, "Sketch");

    assert_eq!(result, Err(StoreError::NameConflict("Sketch".to_string())));
    // Loser keeps its prior name; no silent duplicate display names.
    assert_eq!(store.name_of(second).unwrap(), "Doodle");
    assert_eq!(store.name_of(first).unwrap(), "Sketch");
}

#[test]
fn rename_to_the_current_name_is_a_noop() {
    let (mut store, _backend) = memory_store("scratch");
    let id = store.add("Sketch").unwrap();

    store.rename(id, "Sketch").unwrap();

    assert_eq!(store.name_of(id).unwrap(), "Sketch");
}

#[test]
fn rename_of_an_unknown_document_fails() {
    let (mut store, _backend) = memory_store("scratch");

    let ghost = uuid::Uuid::new_v4();

    assert_eq!(
        store.rename(ghost, "Sketch"),
        Err(StoreError::UnknownDocument(ghost))
    );
}

#[test]
fn add_rejects_names_that_do_not_form_a_key_segment() {
    let (mut store, _backend) = memory_store("scratch");

    for bad in ["", ".", "..", "a/b"] {
        assert_eq!(
            store.add(bad),
            Err(StoreError::InvalidName(bad.to_string()))
        );
    }

    assert!(store.is_empty());
}

#[test]
fn rename_rejects_names_that_do_not_form_a_key_segment() {
    let (mut store, _backend) = memory_store("scratch");
    let id = store.add("Sketch").unwrap();

    for bad in ["", "..", "a/b"] {
        assert_eq!(
            store.rename(id, bad),
            Err(StoreError::InvalidName(bad.to_string()))
        );
    }

    assert_eq!(store.name_of(id).unwrap(), "Sketch");
}

#[test]
fn remove_drops_membership_and_persisted_bytes() {
    let (mut store, backend) = memory_store("scratch");
    let id = store.add("Sketch").unwrap();
    let key = store.document(id).unwrap().storage_key();
    store.document_mut(id).unwrap().add_element("⭐️", 1, 2, 40);
    assert!(backend.snapshot(&key).is_some());

    store.remove(id);

    assert!(store.documents().is_empty());
    assert!(store.document(id).is_none());
    assert!(backend.snapshot(&key).is_none());
}

#[test]
fn remove_of_an_unknown_document_is_a_noop() {
    let (mut store, _backend) = memory_store("scratch");
    let id = store.add("Sketch").unwrap();

    store.remove(uuid::Uuid::new_v4());

    assert_eq!(store.documents(), vec![id]);
}

#[test]
fn adopted_controllers_get_a_lazy_placeholder_name() {
    let (mut store, backend) = memory_store("scratch");
    store.add_untitled();
    let adopted = DocumentController::new(backend.clone(), Arc::new(NullFetcher));
    let id = store.adopt(adopted);

    // First lookup registers; placeholder respects name uniqueness.
    assert_eq!(store.name_of(id).unwrap(), "Untitled 2");
    assert_eq!(store.name_of(id).unwrap(), "Untitled 2");
}

#[test]
fn membership_changes_persist_the_name_mapping() {
    let (mut store, backend) = memory_store("scratch");
    let id = store.add("Sketch").unwrap();

    let mapping: serde_json::Value =
        serde_json::from_slice(&backend.snapshot("store.scratch").unwrap()).unwrap();
    assert_eq!(mapping[id.to_string()], "Sketch");

    store.remove(id);
    let mapping: serde_json::Value =
        serde_json::from_slice(&backend.snapshot("store.scratch").unwrap()).unwrap();
    assert!(mapping.as_object().unwrap().is_empty());
}

#[test]
fn an_unrooted_store_reloads_membership_and_content() {
    let backend = Arc::new(MemoryBackend::new());
    let (sketch, doodle) = {
        let mut store = DocumentStore::new("scratch", backend.clone(), Arc::new(NullFetcher));
        let sketch = store.add("Sketch").unwrap();
        let doodle = store.add("Doodle").unwrap();
        store
            .document_mut(sketch)
            .unwrap()
            .add_element("🍎", 10, 20, 40);
        (sketch, doodle)
    };

    let mut reloaded = DocumentStore::new("scratch", backend, Arc::new(NullFetcher));

    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.name_of(sketch).unwrap(), "Sketch");
    assert_eq!(reloaded.name_of(doodle).unwrap(), "Doodle");
    let elements = reloaded.document(sketch).unwrap().elements();
    assert_eq!(elements.len(), 1);
    assert_eq!((elements[0].x, elements[0].y, elements[0].size), (10, 20, 40));
}

#[test]
fn a_corrupt_name_mapping_degrades_to_an_empty_store() {
    let backend = Arc::new(MemoryBackend::new());
    backend.write("store.scratch", b"not a json map").unwrap();

    let store = DocumentStore::new("scratch", backend, Arc::new(NullFetcher));

    assert!(store.is_empty());
}
