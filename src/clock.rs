//! Pure time-remaining computations for sessions and sub-resources.
//!
//! Every function here is deterministic given its inputs: the caller
//! supplies `now_millis` explicitly, so there is no hidden clock state.
//! The watchdog samples [`now_millis`] once per tick and threads the value
//! through all checks for that tick.

use crate::config::TimeoutPolicy;
use crate::models::session::Session;
use crate::models::sub_resource::SubResource;

/// Grace multiplier applied to the heartbeat interval when deriving the
/// sub-resource timeout. Permits three missed heartbeats before a
/// sub-resource is considered gone.
pub const HEARTBEAT_GRACE_MULTIPLIER: f64 = 3.1;

/// Whether the session still has time left before its idle timeout.
///
/// Always true when idle closing is disabled by policy or the session has
/// no max-inactive interval (absent or negative means the session never
/// times out by session policy).
#[must_use]
pub fn session_time_remaining(session: &Session, policy: &TimeoutPolicy, now_millis: i64) -> bool {
    if !policy.session_idle_close_enabled {
        return true;
    }
    let Some(max_inactive) = session.max_inactive_interval() else {
        return true;
    };
    if max_inactive < 0 {
        return true;
    }
    now_millis - session.last_request_millis() < max_inactive * 1000
}

/// Whether the sub-resource is still active.
///
/// A resource already marked closing is never active, regardless of
/// heartbeat recency. A non-positive heartbeat interval means heartbeat
/// timeouts are disabled and the resource never expires.
#[must_use]
#[allow(clippy::cast_precision_loss)] // elapsed millis are far below 2^52
pub fn sub_resource_time_remaining(
    resource: &SubResource,
    policy: &TimeoutPolicy,
    now_millis: i64,
) -> bool {
    if resource.is_closing() {
        return false;
    }
    let timeout_seconds = policy.heartbeat_interval_seconds * HEARTBEAT_GRACE_MULTIPLIER;
    if timeout_seconds <= 0.0 {
        return true;
    }
    ((now_millis - resource.last_heartbeat_millis()) as f64) < timeout_seconds * 1000.0
}

/// Activity capability for anything the reaper may close on inactivity.
///
/// Keeps the reaper free of resource-kind branching: any resource type
/// that can report its own liveness can be reaped.
pub trait ActivityBound {
    /// Whether the resource is still considered active at `now_millis`.
    fn is_active(&self, policy: &TimeoutPolicy, now_millis: i64) -> bool;
}

impl ActivityBound for SubResource {
    fn is_active(&self, policy: &TimeoutPolicy, now_millis: i64) -> bool {
        sub_resource_time_remaining(self, policy, now_millis)
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
