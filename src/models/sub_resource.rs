//! Sub-resource model: per-connection state owned by a session.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use uuid::Uuid;

/// A per-connection resource attached to a session (a view, a window, a
/// live connection). Kept alive by client heartbeats; closed by the reaper
/// once the heartbeats stop.
///
/// The closing flag and heartbeat timestamp are atomics: the request path
/// is the single writer, the watchdog reads them lock-free, and a stale
/// read costs at most one polling interval of delayed reclaim.
#[derive(Debug)]
pub struct SubResource {
    id: String,
    closing: AtomicBool,
    last_heartbeat_millis: AtomicI64,
}

impl SubResource {
    /// Create a resource whose first heartbeat is `now_millis`.
    #[must_use]
    pub fn new(now_millis: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            closing: AtomicBool::new(false),
            last_heartbeat_millis: AtomicI64::new(now_millis),
        }
    }

    /// Opaque identifier, unique within the owning session.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Record a completed heartbeat. The timestamp only moves forward.
    pub fn mark_heartbeat(&self, now_millis: i64) {
        self.last_heartbeat_millis
            .fetch_max(now_millis, Ordering::SeqCst);
    }

    /// Timestamp of the most recent heartbeat, in epoch milliseconds.
    #[must_use]
    pub fn last_heartbeat_millis(&self) -> i64 {
        self.last_heartbeat_millis.load(Ordering::SeqCst)
    }

    /// Whether a close has been requested for this resource.
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    /// Request this resource be closed. Irreversible; the resource stays
    /// attached to its session until the reaper detaches it.
    pub fn close(&self) {
        self.closing.store(true, Ordering::SeqCst);
    }
}
