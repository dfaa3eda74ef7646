//! Per-session polling loop that reclaims idle session state.
//!
//! One watchdog task per open session. Each tick either closes an expired
//! session, reaps inactive sub-resources, or does nothing; the loop exits
//! once the session is no longer open or the cancellation token fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use crate::clock;
use crate::config::TimeoutPolicy;
use crate::models::session::Session;
use crate::orchestrator::reaper;
use crate::Result;

/// Background watchdog bound to exactly one session.
///
/// Call [`spawn`](Self::spawn) to start the polling task.
pub struct SessionWatchdog {
    session: Arc<Session>,
    policy: TimeoutPolicy,
    cancel: CancellationToken,
}

impl SessionWatchdog {
    /// Construct a watchdog (does not start polling yet).
    #[must_use]
    pub fn new(session: Arc<Session>, policy: TimeoutPolicy, cancel: CancellationToken) -> Self {
        Self {
            session,
            policy,
            cancel,
        }
    }

    /// Spawn the polling task.
    ///
    /// Fire-and-forget: the task exits on its own once the session leaves
    /// the open state or the token is cancelled; nobody needs to join it.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        let span = info_span!("session_watchdog", session_id = %self.session.id());
        tokio::spawn(Self::run(self.session, self.policy, self.cancel).instrument(span))
    }

    async fn run(session: Arc<Session>, policy: TimeoutPolicy, cancel: CancellationToken) {
        let interval = policy.polling_interval();

        // The first check is delayed one full interval to avoid false
        // positives right after session creation.
        if Self::sleep_or_cancelled(interval, &cancel).await {
            debug!("watchdog cancelled");
            return;
        }

        while session.is_open() {
            if let Err(err) = Self::tick(&session, &policy) {
                // Never fatal: the open-check above terminates the loop
                // once the session is gone.
                warn!(%err, "watchdog tick failed");
            }
            if Self::sleep_or_cancelled(interval, &cancel).await {
                debug!("watchdog cancelled");
                return;
            }
        }
        debug!("session no longer open, watchdog exiting");
    }

    /// One polling pass over the session.
    fn tick(session: &Arc<Session>, policy: &TimeoutPolicy) -> Result<()> {
        let now = clock::now_millis();
        if !clock::session_time_remaining(session, policy, now) {
            // Cleanup usually runs at the end of each request, but a client
            // can vanish in a way that produces no further requests; close
            // the session here instead. The close cascades to every
            // sub-resource, so no reaping is needed this tick.
            debug!("session idle past max-inactive interval, requesting close");
            Arc::clone(session).request_close()?;
        } else if policy.always_check_sub_resource_timeouts {
            reaper::close_inactive(session, policy, now)?;
            reaper::remove_closed(session)?;
            if session.sub_resource_count() == 0 {
                debug!("no sub-resources remain, requesting session close");
                Arc::clone(session).request_close()?;
            }
        }
        Ok(())
    }

    /// Sleep one polling interval; true when cancelled mid-sleep.
    async fn sleep_or_cancelled(interval: Duration, cancel: &CancellationToken) -> bool {
        tokio::select! {
            () = cancel.cancelled() => true,
            () = tokio::time::sleep(interval) => false,
        }
    }
}
