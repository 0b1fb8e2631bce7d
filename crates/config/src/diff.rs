// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structural diff between two configuration revisions.

use crate::resolved::ResolvedConfig;
use fleet_core::{ChangeCategory, ChangeType, ConfigChange};

/// Compute added, removed, and changed agents and schedules.
///
/// Added and removed agents are one entry each; their schedules are implied.
/// A retained agent whose resolved configuration differs in any field is
/// reported once as a changed agent, and its schedules are compared
/// individually under the name `agent/schedule`.
pub fn diff_configs(old: &ResolvedConfig, new: &ResolvedConfig) -> Vec<ConfigChange> {
    let mut changes = Vec::new();

    for (name, old_agent) in &old.agents {
        match new.agents.get(name) {
            None => {
                changes.push(ConfigChange::new(ChangeType::Removed, ChangeCategory::Agent, name));
            }
            Some(new_agent) => {
                if old_agent != new_agent {
                    changes.push(ConfigChange::new(ChangeType::Changed, ChangeCategory::Agent, name));
                }
                for (schedule, old_schedule) in &old_agent.schedules {
                    let change = match new_agent.schedules.get(schedule) {
                        None => Some(ChangeType::Removed),
                        Some(new_schedule) if new_schedule != old_schedule => Some(ChangeType::Changed),
                        Some(_) => None,
                    };
                    if let Some(change) = change {
                        changes.push(ConfigChange::new(
                            change,
                            ChangeCategory::Schedule,
                            format!("{name}/{schedule}"),
                        ));
                    }
                }
                for schedule in new_agent.schedules.keys() {
                    if !old_agent.schedules.contains_key(schedule) {
                        changes.push(ConfigChange::new(
                            ChangeType::Added,
                            ChangeCategory::Schedule,
                            format!("{name}/{schedule}"),
                        ));
                    }
                }
            }
        }
    }

    for name in new.agents.keys() {
        if !old.agents.contains_key(name) {
            changes.push(ConfigChange::new(ChangeType::Added, ChangeCategory::Agent, name));
        }
    }

    changes
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
