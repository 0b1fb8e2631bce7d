// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduling specs: interval cadence and single-flight skips.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn interval_agent_fires_once_in_five_one_second_ticks() {
    let mut fleet = Fleet::new(
        r#"
fleet: { name: cadence }
agents:
  - name: a
    command: "true"
    schedules:
      every5: { type: interval, interval: 5s }
"#,
    );
    let start = fleet.clock.now();
    fleet.take_events();

    fleet.tick_n(5, Duration::from_secs(1));

    let triggered: Vec<_> = fleet
        .take_events()
        .into_iter()
        .filter(|e| e.name() == "schedule:triggered")
        .collect();
    assert_eq!(
        triggered,
        vec![FleetEvent::ScheduleTriggered {
            agent_name: "a".to_string(),
            schedule_name: "every5".to_string(),
        }]
    );
    let info = fleet.manager.get_agent("a").unwrap();
    assert_eq!(info.schedules[0].next_run_at, Some(start + chrono_secs(10)));

    fleet.manager.stop(StopOptions::default()).await.unwrap();
}

#[tokio::test]
async fn due_schedule_of_running_agent_is_skipped() {
    let mut fleet = Fleet::new(
        r#"
fleet: { name: busy }
agents:
  - name: a
    command: "sleep 30"
    schedules:
      every5: { type: interval, interval: 5s }
"#,
    );
    fleet.tick_n(1, Duration::from_secs(5));
    fleet.wait_for("job:created").await;

    fleet.tick_n(1, Duration::from_secs(5));
    let skipped = fleet.wait_for("schedule:skipped").await;
    assert_eq!(
        skipped,
        FleetEvent::ScheduleSkipped {
            agent_name: "a".to_string(),
            schedule_name: "every5".to_string(),
            reason: "agent busy".to_string(),
        }
    );

    let store = fleet.manager.store().unwrap();
    assert_eq!(store.list_jobs(&JobFilter::new().agent("a")).unwrap().len(), 1);
    assert_eq!(
        store.read_fleet_state().unwrap().agent("a").unwrap().status,
        fleet_core::AgentStatus::Running
    );

    let stop = StopOptions::default().timeout(Duration::ZERO).cancel_timeout(Duration::ZERO);
    fleet.manager.stop(stop).await.unwrap();
}

fn chrono_secs(n: i64) -> chrono::Duration {
    chrono::Duration::seconds(n)
}
