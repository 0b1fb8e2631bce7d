// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shutdown specs: draining, cancellation, and forced termination.

use crate::prelude::*;
use similar_asserts::assert_eq;
use std::time::Instant;

const STUBBORN: &str = r#"
fleet: { name: stubborn }
agents:
  - name: stubborn
    command: 'trap "" TERM; sleep 30'
"#;

#[tokio::test]
async fn stop_escalates_to_forced_kill_after_timeouts() {
    let mut fleet = Fleet::new(STUBBORN);
    let job = fleet.manager.trigger("stubborn", None, None).unwrap();
    // Let the shell install its trap.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let started = Instant::now();
    let stop = StopOptions::default()
        .timeout(Duration::from_millis(1000))
        .cancel_on_timeout(true)
        .cancel_timeout(Duration::from_millis(500));
    fleet.manager.stop(stop).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(1500), "stopped too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "stopped too late: {elapsed:?}");
    assert_eq!(fleet.manager.state(), FleetLifecycle::Stopped);

    let FleetEvent::JobCancelled { job: cancelled, termination_type } =
        fleet.wait_for("job:cancelled").await
    else {
        unreachable!()
    };
    assert_eq!(termination_type, TerminationType::Forced);
    assert_eq!(cancelled.id, job.id);
    let stored = fleet.manager.store().unwrap().get_job(&job.id).unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Cancelled);
    assert_eq!(stored.termination_type, Some(TerminationType::Forced));
    fleet.wait_for("stopped").await;
}

#[tokio::test]
async fn schedules_do_not_fire_after_stop() {
    let mut fleet = Fleet::new(
        r#"
fleet: { name: after-stop }
agents:
  - name: a
    command: "true"
    schedules:
      every5: { type: interval, interval: 5s }
"#,
    );
    fleet.manager.stop(StopOptions::default()).await.unwrap();
    fleet.take_events();

    assert!(fleet.tick_n(2, Duration::from_secs(5)).is_empty());
    let events: Vec<_> = fleet.take_events().iter().map(FleetEvent::name).collect();
    assert!(!events.contains(&"job:created"), "got {events:?}");
    let store = fleet.manager.store().unwrap();
    assert!(store.list_jobs(&JobFilter::new()).unwrap().is_empty());
}

#[tokio::test]
async fn stop_without_running_jobs_is_immediate() {
    let mut fleet = Fleet::new(STUBBORN);
    let started = Instant::now();
    fleet.manager.stop(StopOptions::default()).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    fleet.wait_for("stopped").await;
}
