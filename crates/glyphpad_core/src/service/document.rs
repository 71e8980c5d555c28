//! Document controller: one owned scene plus its autosave and fetch loop.
//!
//! # Responsibility
//! - Apply mutation intents to the owned scene and republish after every
//!   committed change.
//! - Re-serialize the scene to the persistence backend on every mutation.
//! - Supervise the single in-flight, cancellable background-resource fetch.
//!
//! # Invariants
//! - All mutating methods take `&mut self`; the caller serializes access
//!   (single logical owner, no internal locking).
//! - At most one fetch token is current; completions with a superseded
//!   token are discarded without publishing.
//! - Autosave failures are logged and swallowed; the in-memory scene stays
//!   authoritative for the session.

use crate::fetch::{FetchCompletion, FetchDelivery, FetchToken, ResourceFetcher};
use crate::model::scene::{Element, ElementId, Scene, SceneDecodeError};
use crate::storage::StorageBackend;
use log::{debug, warn};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use uuid::Uuid;

/// Stable identity of one document. Assigned at creation, never changed.
pub type DocumentId = Uuid;

/// Handle returned by `subscribe`, used to unsubscribe.
pub type SubscriptionId = u64;

/// Change notification published synchronously after a committed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    /// Scene content changed (elements or background reference).
    SceneChanged,
    /// Background resource state transitioned.
    ResourceChanged,
}

/// Lifecycle of the background resource for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// No background, or a fresh request is about to start.
    Empty,
    /// A fetch with this token is in flight.
    Fetching(FetchToken),
    /// The fetched payload, opaque to the core.
    Ready(Vec<u8>),
    /// The last fetch failed; rendered as "no background", never an error.
    Failed,
}

struct Subscriber {
    id: SubscriptionId,
    callback: Box<dyn FnMut(DocumentEvent)>,
}

/// Owning, mutating, autosaving, fetch-managing wrapper around one scene.
pub struct DocumentController {
    id: DocumentId,
    scene: Scene,
    location: Option<String>,
    resource_state: ResourceState,
    backend: Arc<dyn StorageBackend>,
    fetcher: Arc<dyn ResourceFetcher>,
    subscribers: Vec<Subscriber>,
    next_subscription: SubscriptionId,
    next_token: FetchToken,
    current_token: Option<FetchToken>,
    completion_tx: Sender<FetchCompletion>,
    completions: Receiver<FetchCompletion>,
}

impl DocumentController {
    /// Creates a controller with a fresh identity, hydrated from its
    /// identity-derived default key.
    pub fn new(backend: Arc<dyn StorageBackend>, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self::with_id(Uuid::new_v4(), backend, fetcher)
    }

    /// Creates a controller with a caller-provided identity.
    ///
    /// Used when reloading a persisted store, where identities already
    /// exist externally.
    pub fn with_id(
        id: DocumentId,
        backend: Arc<dyn StorageBackend>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Self {
        Self::build(id, None, backend, fetcher)
    }

    /// Creates a controller that reads and autosaves at `location` instead
    /// of the identity-derived default key.
    pub fn at_location(
        location: impl Into<String>,
        backend: Arc<dyn StorageBackend>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Self {
        Self::build(Uuid::new_v4(), Some(location.into()), backend, fetcher)
    }

    fn build(
        id: DocumentId,
        location: Option<String>,
        backend: Arc<dyn StorageBackend>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Self {
        let (completion_tx, completions) = channel();
        let mut controller = Self {
            id,
            scene: Scene::new(),
            location,
            resource_state: ResourceState::Empty,
            backend,
            fetcher,
            subscribers: Vec::new(),
            next_subscription: 0,
            next_token: 0,
            current_token: None,
            completion_tx,
            completions,
        };
        controller.scene = controller.hydrate();
        if controller.scene.background().is_some() {
            controller.restart_fetch();
        }
        controller
    }

    /// Reads the persisted scene; absence and decode failure both fall back
    /// to an empty scene.
    fn hydrate(&self) -> Scene {
        let key = self.storage_key();
        match self.backend.read(&key) {
            Ok(Some(bytes)) => Scene::decode(&bytes).unwrap_or_else(|err: SceneDecodeError| {
                warn!("event=scene_decode module=document status=error key={key} detail={err}");
                Scene::new()
            }),
            Ok(None) => Scene::new(),
            Err(err) => {
                warn!("event=scene_read module=document status=error key={key} detail={err}");
                Scene::new()
            }
        }
    }

    /// Returns this document's stable identity.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Returns the explicit autosave location, when one is set.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Returns the key autosave currently writes to.
    pub fn storage_key(&self) -> String {
        match &self.location {
            Some(location) => location.clone(),
            None => default_key(self.id),
        }
    }

    /// Retargets autosave and immediately saves the current state there,
    /// so in-memory edits survive a mid-session location change.
    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = Some(location.into());
        self.save();
    }

    /// Returns the placed elements in insertion order.
    pub fn elements(&self) -> &[Element] {
        self.scene.elements()
    }

    /// Returns the scene's background URL, if any.
    pub fn background_url(&self) -> Option<&str> {
        self.scene.background()
    }

    /// Returns the current background-resource state.
    pub fn resource_state(&self) -> &ResourceState {
        &self.resource_state
    }

    /// Returns the fetched background payload when one is ready.
    pub fn background_payload(&self) -> Option<&[u8]> {
        match &self.resource_state {
            ResourceState::Ready(payload) => Some(payload),
            _ => None,
        }
    }

    /// Registers a listener invoked synchronously after each committed
    /// mutation. Returns the handle to pass to `unsubscribe`.
    pub fn subscribe(&mut self, callback: Box<dyn FnMut(DocumentEvent)>) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push(Subscriber { id, callback });
        id
    }

    /// Removes a listener. Unknown handles are ignored.
    pub fn unsubscribe(&mut self, subscription: SubscriptionId) {
        self.subscribers
            .retain(|subscriber| subscriber.id != subscription);
    }

    /// Places a new element and returns its id.
    pub fn add_element(
        &mut self,
        text: impl Into<String>,
        x: i64,
        y: i64,
        size: i64,
    ) -> ElementId {
        let id = self.scene.add_element(text, x, y, size);
        self.commit();
        id
    }

    /// Moves an element by the given offset. No-op when the id is absent
    /// (it may have been placed by a scene this controller never saw).
    pub fn move_element(&mut self, id: ElementId, dx: i64, dy: i64) {
        if self.scene.move_element(id, dx, dy) {
            self.commit();
        }
    }

    /// Rescales an element. No-op when the id is absent.
    pub fn resize_element(&mut self, id: ElementId, scale: f64) {
        if self.scene.resize_element(id, scale) {
            self.commit();
        }
    }

    /// Replaces the background URL and restarts the fetch protocol, even
    /// when the URL is unchanged (callers may want a forced refresh).
    pub fn set_background(&mut self, url: Option<&str>) {
        self.scene.set_background(url.map(str::to_string));
        self.commit();
        self.restart_fetch();
    }

    /// Applies any fetch completions that have arrived.
    ///
    /// The embedder's event loop pumps this from the owner thread; results
    /// tagged with a superseded token are discarded here.
    pub fn poll_background(&mut self) {
        while let Ok(completion) = self.completions.try_recv() {
            self.apply_completion(completion);
        }
    }

    fn apply_completion(&mut self, completion: FetchCompletion) {
        if self.current_token != Some(completion.token) {
            debug!(
                "event=fetch_stale module=document status=discarded id={} token={}",
                self.id, completion.token
            );
            return;
        }
        self.current_token = None;
        match completion.outcome {
            Ok(payload) => {
                self.resource_state = ResourceState::Ready(payload);
            }
            Err(err) => {
                warn!(
                    "event=fetch module=document status=error id={} detail={err}",
                    self.id
                );
                self.resource_state = ResourceState::Failed;
            }
        }
        self.publish(DocumentEvent::ResourceChanged);
    }

    /// Clears the shown resource, supersedes any outstanding request, and
    /// issues a fresh fetch when a background URL is present.
    fn restart_fetch(&mut self) {
        // Clearing first gives subscribers an immediate "loading" signal.
        self.resource_state = ResourceState::Empty;
        if let Some(stale) = self.current_token.take() {
            // Best effort; token comparison is the real cancellation.
            self.fetcher.cancel(stale);
        }
        self.publish(DocumentEvent::ResourceChanged);

        let Some(url) = self.scene.background().map(str::to_string) else {
            return;
        };
        let token = self.next_token;
        self.next_token += 1;
        self.current_token = Some(token);
        self.resource_state = ResourceState::Fetching(token);
        self.publish(DocumentEvent::ResourceChanged);
        self.fetcher
            .fetch(&url, FetchDelivery::new(token, self.completion_tx.clone()));
    }

    /// Publishes a scene change and re-serializes to the backend.
    fn commit(&mut self) {
        self.publish(DocumentEvent::SceneChanged);
        self.save();
    }

    /// Writes the current scene to the backend now.
    ///
    /// Mutations call this automatically; the store calls it when
    /// registering a fresh document so its persisted form exists before
    /// the first edit. Failures are logged and swallowed.
    pub fn save(&self) {
        let key = self.storage_key();
        if let Err(err) = self.backend.write(&key, &self.scene.encode()) {
            warn!("event=autosave module=document status=error key={key} detail={err}");
        }
    }

    fn publish(&mut self, event: DocumentEvent) {
        for subscriber in &mut self.subscribers {
            (subscriber.callback)(event);
        }
    }
}

/// Identity-derived default storage key for an unrooted document.
pub(crate) fn default_key(id: DocumentId) -> String {
    format!("document.{id}")
}
