// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::load_config_with;
use std::collections::HashMap;
use tempfile::TempDir;

fn config(yaml: &str) -> ResolvedConfig {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("fleet.yaml"), yaml).unwrap();
    let mut config = load_config_with(dir.path(), &HashMap::<String, String>::new()).unwrap();
    // Different temp dirs would otherwise make every agent look changed.
    for agent in config.agents.values_mut() {
        agent.config_path = "fleet.yaml".into();
        agent.working_directory = ".".into();
    }
    config
}

fn change(t: ChangeType, c: ChangeCategory, name: &str) -> ConfigChange {
    ConfigChange::new(t, c, name)
}

#[test]
fn identical_configs_have_no_changes() {
    let yaml = "agents:\n  - name: a\n    schedules:\n      s:\n        type: interval\n        interval: 5s\n";
    assert!(diff_configs(&config(yaml), &config(yaml)).is_empty());
}

#[test]
fn added_and_removed_agents_are_single_entries() {
    let old = config("agents:\n  - name: a\n  - name: gone\n    schedules:\n      s:\n        type: manual\n");
    let new = config("agents:\n  - name: a\n  - name: fresh\n    schedules:\n      s:\n        type: manual\n");
    similar_asserts::assert_eq!(
        diff_configs(&old, &new),
        vec![
            change(ChangeType::Removed, ChangeCategory::Agent, "gone"),
            change(ChangeType::Added, ChangeCategory::Agent, "fresh"),
        ]
    );
}

#[test]
fn schedule_changes_are_named_agent_slash_schedule() {
    let old = config(
        "agents:\n  - name: a\n    schedules:\n      keep:\n        type: manual\n      tweak:\n        type: interval\n        interval: 5s\n      drop:\n        type: manual\n",
    );
    let new = config(
        "agents:\n  - name: a\n    schedules:\n      keep:\n        type: manual\n      tweak:\n        type: interval\n        interval: 10s\n      new:\n        type: manual\n",
    );
    similar_asserts::assert_eq!(
        diff_configs(&old, &new),
        vec![
            change(ChangeType::Changed, ChangeCategory::Agent, "a"),
            change(ChangeType::Changed, ChangeCategory::Schedule, "a/tweak"),
            change(ChangeType::Removed, ChangeCategory::Schedule, "a/drop"),
            change(ChangeType::Added, ChangeCategory::Schedule, "a/new"),
        ]
    );
}

#[test]
fn non_schedule_field_change_marks_agent_changed() {
    let old = config("agents:\n  - name: a\n    model: haiku\n");
    let new = config("agents:\n  - name: a\n    model: opus\n");
    assert_eq!(diff_configs(&old, &new), vec![change(ChangeType::Changed, ChangeCategory::Agent, "a")]);
}
