//! Unit tests for the watchdog supervisor.
//!
//! Validates fire-and-forget spawning, independence of per-session
//! watchdogs, and the shutdown hook cancelling outstanding loops.

use std::sync::Arc;
use std::time::Duration;

use session_reaper::clock;
use session_reaper::config::TimeoutPolicy;
use session_reaper::models::session::Session;
use session_reaper::models::sub_resource::SubResource;
use session_reaper::orchestrator::supervisor::WatchdogSupervisor;

async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    for _ in 0..300 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {what}");
}

#[tokio::test]
async fn spawned_watchdog_reclaims_the_session() {
    let supervisor = WatchdogSupervisor::new(TimeoutPolicy {
        polling_interval_millis: 100,
        always_check_sub_resource_timeouts: true,
        session_idle_close_enabled: true,
        heartbeat_interval_seconds: 300.0,
    });

    // No sub-resources and checks enabled: reclaimed on the first tick.
    let session = Session::new(None, clock::now_millis());
    supervisor.on_session_created(&session);

    wait_until("supervised session reclaimed", || !session.is_open()).await;
}

#[tokio::test]
async fn sessions_are_reclaimed_independently() {
    let supervisor = WatchdogSupervisor::new(TimeoutPolicy {
        polling_interval_millis: 100,
        always_check_sub_resource_timeouts: true,
        session_idle_close_enabled: true,
        // Heartbeat timeouts disabled: attached resources never expire.
        heartbeat_interval_seconds: 0.0,
    });

    let now = clock::now_millis();
    let doomed = Session::new(None, now);
    let backed = Session::new(None, now);
    backed.attach(Arc::new(SubResource::new(now)));

    supervisor.on_session_created(&doomed);
    supervisor.on_session_created(&backed);

    wait_until("empty session reclaimed", || !doomed.is_open()).await;
    // The session with a live sub-resource stays open.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(backed.is_open());
    assert_eq!(backed.sub_resource_count(), 1);
}

#[tokio::test]
async fn shutdown_cancels_outstanding_watchdogs() {
    let supervisor = WatchdogSupervisor::new(TimeoutPolicy {
        polling_interval_millis: 200,
        always_check_sub_resource_timeouts: true,
        session_idle_close_enabled: true,
        heartbeat_interval_seconds: 300.0,
    });

    // Would be reclaimed on the first tick, but shutdown lands during the
    // initial grace sleep.
    let session = Session::new(None, clock::now_millis());
    supervisor.on_session_created(&session);
    supervisor.shutdown();

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(session.is_open(), "cancelled watchdog must take no action");
}

#[tokio::test]
async fn watchdogs_spawned_after_shutdown_are_cancelled_too() {
    let supervisor = WatchdogSupervisor::new(TimeoutPolicy {
        polling_interval_millis: 100,
        always_check_sub_resource_timeouts: true,
        session_idle_close_enabled: true,
        heartbeat_interval_seconds: 300.0,
    });
    supervisor.shutdown();

    let session = Session::new(None, clock::now_millis());
    supervisor.on_session_created(&session);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(session.is_open());
}
