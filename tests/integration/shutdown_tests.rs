//! Integration tests for supervisor shutdown semantics.
//!
//! Validates that shutdown cancels every outstanding watchdog without
//! reverting or losing mutations that were already submitted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use session_reaper::clock;
use session_reaper::config::TimeoutPolicy;
use session_reaper::models::session::Session;
use session_reaper::models::sub_resource::SubResource;
use session_reaper::orchestrator::supervisor::WatchdogSupervisor;

use super::test_helpers::{init_logging, wait_until};

#[tokio::test]
async fn shutdown_stops_every_watchdog() {
    init_logging();
    // Aggressive reclaim policy, but shutdown lands within the initial
    // grace sleep of every watchdog.
    let supervisor = WatchdogSupervisor::new(TimeoutPolicy {
        polling_interval_millis: 300,
        always_check_sub_resource_timeouts: true,
        session_idle_close_enabled: true,
        heartbeat_interval_seconds: 0.1,
    });

    let now = clock::now_millis();
    let sessions: Vec<_> = (0..3)
        .map(|_| {
            let session = Session::new(None, now);
            session.attach(Arc::new(SubResource::new(now)));
            supervisor.on_session_created(&session);
            session
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(100)).await;
    supervisor.shutdown();

    // Long past the heartbeat timeout nothing has been reclaimed.
    tokio::time::sleep(Duration::from_millis(800)).await;
    for session in &sessions {
        assert!(session.is_open());
        assert_eq!(session.sub_resource_count(), 1);
        assert!(!session.sub_resources()[0].is_closing());
    }
}

#[tokio::test]
async fn mutations_submitted_before_close_still_apply() {
    init_logging();
    let session = Session::new(None, clock::now_millis());
    let applied = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&applied);
    session
        .access(move || flag.store(true, Ordering::SeqCst))
        .expect("gateway open");
    // Close immediately: the queued mutation must still run to completion.
    session.close();

    wait_until("queued mutation applied after close", || {
        applied.load(Ordering::SeqCst)
    })
    .await;
}
