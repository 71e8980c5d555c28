//! Background-resource fetch contract.
//!
//! # Responsibility
//! - Define the collaborator interface the controller drives for background
//!   payloads ("fetch this URL, deliver bytes or failure, maybe cancel").
//! - Carry completions back to the controller's owner thread.
//!
//! # Invariants
//! - Tokens are minted by the controller and strictly increase; completion
//!   handling compares tokens, so `cancel` being a no-op is always safe.
//! - A `FetchDelivery` is single-use; late or duplicate sends after the
//!   controller is gone are silently dropped.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::Sender;

/// Generation token identifying one fetch request.
///
/// Compared at completion time; a stale token means the result must be
/// discarded. This is the source of truth for cancellation, since the
/// transport may not support interrupting in-flight I/O.
pub type FetchToken = u64;

/// Transport or decode failure for one fetch.
///
/// Carries a reason for logging only; fetch failures are never surfaced
/// to callers as error values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub reason: String,
}

impl FetchError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "fetch failed: {}", self.reason)
    }
}

impl Error for FetchError {}

/// Result of one fetch: opaque payload bytes or failure.
pub type FetchOutcome = Result<Vec<u8>, FetchError>;

/// Completion envelope delivered back to the issuing controller.
#[derive(Debug)]
pub struct FetchCompletion {
    pub token: FetchToken,
    pub outcome: FetchOutcome,
}

/// Single-use completion handle handed to a fetcher per request.
///
/// Bound to the minted token so fetchers cannot mis-tag results.
#[derive(Debug)]
pub struct FetchDelivery {
    token: FetchToken,
    sender: Sender<FetchCompletion>,
}

impl FetchDelivery {
    pub(crate) fn new(token: FetchToken, sender: Sender<FetchCompletion>) -> Self {
        Self { token, sender }
    }

    /// Returns the token this delivery is bound to.
    pub fn token(&self) -> FetchToken {
        self.token
    }

    /// Delivers a successful payload.
    pub fn succeed(self, payload: Vec<u8>) {
        self.complete(Ok(payload));
    }

    /// Delivers a failure with a loggable reason.
    pub fn fail(self, reason: impl Into<String>) {
        self.complete(Err(FetchError::new(reason)));
    }

    /// Delivers an already-built outcome.
    pub fn complete(self, outcome: FetchOutcome) {
        // The receiver disappears when the controller is dropped; a dangling
        // late completion is not an error.
        let _ = self.sender.send(FetchCompletion {
            token: self.token,
            outcome,
        });
    }
}

/// Asynchronous background-resource fetch collaborator.
///
/// Implementations may resolve the delivery synchronously (tests), from a
/// worker thread, or not at all (`NullFetcher`); the controller only relies
/// on token comparison, never on timing.
pub trait ResourceFetcher: Send + Sync {
    /// Starts fetching `url`; the outcome goes through `delivery`.
    fn fetch(&self, url: &str, delivery: FetchDelivery);

    /// Best-effort cancellation of an earlier request. Default no-op.
    fn cancel(&self, token: FetchToken) {
        let _ = token;
    }
}

/// Fetcher that never delivers. For embedders with no resource transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFetcher;

impl ResourceFetcher for NullFetcher {
    fn fetch(&self, _url: &str, _delivery: FetchDelivery) {}
}
