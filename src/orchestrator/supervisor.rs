//! Process-wide watchdog spawning.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::TimeoutPolicy;
use crate::models::session::Session;
use crate::orchestrator::watchdog::SessionWatchdog;

/// Spawns exactly one watchdog per session-creation event.
///
/// Fire-and-forget: no watchdog handle is retained, because watchdog
/// lifetime is bounded by session lifetime and the loop terminates on its
/// own. The supervisor keeps only a parent cancellation token so that
/// [`shutdown`](Self::shutdown) can stop all outstanding watchdogs when
/// the server goes down.
pub struct WatchdogSupervisor {
    policy: TimeoutPolicy,
    shutdown: CancellationToken,
}

impl WatchdogSupervisor {
    /// Construct a supervisor applying `policy` to every spawned watchdog.
    #[must_use]
    pub fn new(policy: TimeoutPolicy) -> Self {
        Self {
            policy,
            shutdown: CancellationToken::new(),
        }
    }

    /// Session-creation hook: start exactly one watchdog for `session`.
    ///
    /// The hosting framework calls this once per newly created session.
    /// Returns immediately; the watchdog is not tracked afterwards.
    pub fn on_session_created(&self, session: &Arc<Session>) {
        let watchdog = SessionWatchdog::new(
            Arc::clone(session),
            self.policy.clone(),
            self.shutdown.child_token(),
        );
        drop(watchdog.spawn());
        info!(session_id = %session.id(), "session watchdog started");
    }

    /// Cancel every watchdog started by this supervisor.
    pub fn shutdown(&self) {
        info!("cancelling all session watchdogs");
        self.shutdown.cancel();
    }
}
