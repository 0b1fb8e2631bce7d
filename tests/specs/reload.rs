// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hot reload specs.

use crate::prelude::*;
use similar_asserts::assert_eq;

const BEFORE: &str = r#"
fleet: { name: reload }
agents:
  - name: keep
    command: "true"
  - name: old
    command: "true"
"#;

const AFTER: &str = r#"
fleet: { name: reload }
agents:
  - name: keep
    command: "true"
  - name: new
    command: "true"
    schedules:
      hourly: { type: interval, interval: 1h }
"#;

#[tokio::test]
async fn reload_reports_one_added_and_one_removed_agent() {
    let mut fleet = Fleet::new(BEFORE);
    fleet.take_events();
    fleet.rewrite(AFTER);

    fleet.manager.reload().unwrap();

    let FleetEvent::ConfigReloaded { agent_count, changes } = fleet.wait_for("config:reloaded").await
    else {
        unreachable!()
    };
    assert_eq!(agent_count, 2);
    assert_eq!(
        changes,
        vec![
            ConfigChange::new(ChangeType::Removed, ChangeCategory::Agent, "old"),
            ConfigChange::new(ChangeType::Added, ChangeCategory::Agent, "new"),
        ]
    );

    let state = fleet.manager.store().unwrap().read_fleet_state().unwrap();
    let agents: Vec<_> = state.agents.keys().map(String::as_str).collect();
    assert_eq!(agents, vec!["keep", "new"]);
    assert!(state.agent("new").unwrap().next_trigger_at.is_some());
}

#[tokio::test]
async fn invalid_definition_leaves_fleet_untouched() {
    let mut fleet = Fleet::new(BEFORE);
    fleet.take_events();
    fleet.rewrite(
        r#"
fleet: { name: reload }
agents:
  - name: "Not Valid"
    command: "true"
"#,
    );

    assert!(matches!(fleet.manager.reload(), Err(FleetError::Config(_))));
    assert_eq!(fleet.wait_for("error").await.name(), "error");
    let config = fleet.manager.config().unwrap();
    assert!(config.agent("old").is_some());
    let state = fleet.manager.store().unwrap().read_fleet_state().unwrap();
    assert!(state.agent("old").is_some());
}
