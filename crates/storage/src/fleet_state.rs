// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet-wide state file (`state.yaml`).
//!
//! All mutation is read-modify-write under a single writer lock, so two
//! updates to the same agent can never lose each other's fields.

use crate::atomic::{read_yaml, write_yaml};
use crate::error::StateError;
use chrono::{DateTime, Utc};
use fleet_core::{AgentState, AgentStateUpdate};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Fleet metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reload_at: Option<DateTime<Utc>>,
}

/// Snapshot of fleet-wide status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetState {
    #[serde(default)]
    pub fleet: FleetMeta,
    #[serde(default)]
    pub agents: BTreeMap<String, AgentState>,
}

impl FleetState {
    pub fn agent(&self, name: &str) -> Option<&AgentState> {
        self.agents.get(name)
    }
}

/// Result of reconciling the stored agent set with a configured one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

pub struct FleetStateStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FleetStateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path, write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current state; an absent file is the initial empty state.
    pub fn read(&self) -> Result<FleetState, StateError> {
        Ok(read_yaml(&self.path)?.unwrap_or_default())
    }

    pub fn write(&self, state: &FleetState) -> Result<(), StateError> {
        let _guard = self.write_lock.lock();
        write_yaml(&self.path, state)
    }

    /// Read-modify-write the whole file under the writer lock.
    ///
    /// The file is only rewritten when `f` actually changed the state.
    pub fn modify<R>(&self, f: impl FnOnce(&mut FleetState) -> R) -> Result<R, StateError> {
        let _guard = self.write_lock.lock();
        let before = self.read()?;
        let mut state = before.clone();
        let result = f(&mut state);
        if state != before || !self.path.exists() {
            write_yaml(&self.path, &state)?;
        }
        Ok(result)
    }

    /// Apply a partial update to one agent, creating its entry if needed.
    pub fn update_agent(&self, name: &str, update: &AgentStateUpdate) -> Result<AgentState, StateError> {
        self.modify(|state| {
            let entry = state.agents.entry(name.to_string()).or_default();
            entry.apply(update);
            entry.clone()
        })
    }

    /// Like [`Self::update_agent`], but leaves unknown agents absent.
    pub fn patch_agent(
        &self,
        name: &str,
        update: &AgentStateUpdate,
    ) -> Result<Option<AgentState>, StateError> {
        self.modify(|state| {
            state.agents.get_mut(name).map(|entry| {
                entry.apply(update);
                entry.clone()
            })
        })
    }

    pub fn remove_agent(&self, name: &str) -> Result<Option<AgentState>, StateError> {
        self.modify(|state| state.agents.remove(name))
    }

    /// Add entries for configured agents that are missing and drop the rest.
    pub fn reconcile<'a>(
        &self,
        configured: impl IntoIterator<Item = &'a str>,
    ) -> Result<Reconciled, StateError> {
        let configured: Vec<&str> = configured.into_iter().collect();
        self.modify(|state| {
            let mut result = Reconciled::default();
            for name in &configured {
                if !state.agents.contains_key(*name) {
                    state.agents.insert(name.to_string(), AgentState::default());
                    result.added.push(name.to_string());
                }
            }
            state.agents.retain(|name, _| {
                let keep = configured.contains(&name.as_str());
                if !keep {
                    result.removed.push(name.clone());
                }
                keep
            });
            result
        })
    }
}

#[cfg(test)]
#[path = "fleet_state_tests.rs"]
mod tests;
