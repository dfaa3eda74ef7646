//! Session model and lifecycle helpers.

use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use crate::gateway::MutationGateway;
use crate::models::sub_resource::SubResource;
use crate::Result;

/// Lifecycle state for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session serving requests.
    Open,
    /// Close in progress; sub-resources are being torn down.
    Closing,
    /// Session fully closed; no sub-resources remain attached.
    Closed,
}

const STATE_OPEN: u8 = 0;
const STATE_CLOSING: u8 = 1;
const STATE_CLOSED: u8 = 2;

fn state_from_raw(raw: u8) -> SessionState {
    match raw {
        STATE_OPEN => SessionState::Open,
        STATE_CLOSING => SessionState::Closing,
        _ => SessionState::Closed,
    }
}

/// Server-side session entity observed by the watchdog.
///
/// The request path is the single writer of the activity timestamp; the
/// watchdog reads state and timestamps lock-free and performs every write
/// through the session's [`MutationGateway`] via [`Session::access`].
pub struct Session {
    id: String,
    state: AtomicU8,
    last_request_millis: AtomicI64,
    max_inactive_interval: Option<i64>,
    sub_resources: RwLock<Vec<Arc<SubResource>>>,
    gateway: MutationGateway,
}

impl Session {
    /// Create a new open session whose last request is `now_millis`.
    ///
    /// `max_inactive_interval` is in seconds; `None` means the session
    /// never times out by idle policy. Must be called within a tokio
    /// runtime: the session's mutation gateway spawns its worker task here.
    #[must_use]
    pub fn new(max_inactive_interval: Option<i64>, now_millis: i64) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4().to_string(),
            state: AtomicU8::new(STATE_OPEN),
            last_request_millis: AtomicI64::new(now_millis),
            max_inactive_interval,
            sub_resources: RwLock::new(Vec::new()),
            gateway: MutationGateway::spawn(),
        })
    }

    /// Opaque session identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        state_from_raw(self.state.load(Ordering::SeqCst))
    }

    /// Whether the session is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Configured max-inactive interval in seconds, if any.
    #[must_use]
    pub fn max_inactive_interval(&self) -> Option<i64> {
        self.max_inactive_interval
    }

    /// Timestamp of the most recent completed request, in epoch milliseconds.
    #[must_use]
    pub fn last_request_millis(&self) -> i64 {
        self.last_request_millis.load(Ordering::SeqCst)
    }

    /// Record a completed request. The timestamp only moves forward.
    pub fn mark_request(&self, now_millis: i64) {
        self.last_request_millis
            .fetch_max(now_millis, Ordering::SeqCst);
    }

    /// Attach a sub-resource to this session.
    pub fn attach(&self, resource: Arc<SubResource>) {
        self.sub_resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(resource);
    }

    /// Detach a sub-resource by id.
    ///
    /// Only call from inside a gateway mutation, and only for resources
    /// already marked closing.
    pub fn detach(&self, resource_id: &str) {
        self.sub_resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|resource| resource.id() != resource_id);
    }

    /// Snapshot of the currently attached sub-resources.
    #[must_use]
    pub fn sub_resources(&self) -> Vec<Arc<SubResource>> {
        self.sub_resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of currently attached sub-resources.
    #[must_use]
    pub fn sub_resource_count(&self) -> usize {
        self.sub_resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run `mutation` with exclusive access to this session's mutable state.
    ///
    /// Mutations are serialized against all other mutations submitted for
    /// this session and the call returns without waiting for completion.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Gateway` if the session's gateway has already
    /// shut down (the session is gone).
    pub fn access(&self, mutation: impl FnOnce() + Send + 'static) -> Result<()> {
        self.gateway.submit(mutation)
    }

    /// Submit a close of the whole session through the gateway.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Gateway` if the gateway has already shut down.
    pub fn request_close(self: Arc<Self>) -> Result<()> {
        let session = Arc::clone(&self);
        self.access(move || session.close())
    }

    /// Close the session: cascade a close to every attached sub-resource,
    /// detach them all, mark the session closed, and shut the gateway down.
    ///
    /// Idempotent; a second close is a no-op. By the time the state reads
    /// `Closed`, zero sub-resources remain attached.
    pub fn close(&self) {
        if self
            .state
            .compare_exchange(
                STATE_OPEN,
                STATE_CLOSING,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return;
        }
        let drained = std::mem::take(
            &mut *self
                .sub_resources
                .write()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for resource in &drained {
            resource.close();
        }
        self.state.store(STATE_CLOSED, Ordering::SeqCst);
        self.gateway.shutdown();
    }
}
