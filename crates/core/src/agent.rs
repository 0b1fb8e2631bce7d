// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted per-agent status.
//!
//! One [`AgentState`] exists per configured agent, keyed by agent name in
//! the fleet state file. The job runner owns the status transitions; the
//! scheduler owns the `next_*` fields. Writers never replace a whole entry:
//! they submit an [`AgentStateUpdate`] that touches only the fields it sets.

use crate::job::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse agent status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Running,
    Error,
}

crate::simple_display! {
    AgentStatus {
        Idle => "idle",
        Running => "running",
        Error => "error",
    }
}

/// Persisted state for a single agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_job: Option<JobId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_job: Option<JobId>,
    /// Name of the schedule expected to fire next
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_trigger_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AgentState {
    pub fn is_running(&self) -> bool {
        self.status == AgentStatus::Running
    }

    /// Apply a partial update in place. Fields the update leaves unset are untouched.
    pub fn apply(&mut self, update: &AgentStateUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(ref v) = update.current_job {
            self.current_job = v.clone();
        }
        if let Some(ref v) = update.last_job {
            self.last_job = v.clone();
        }
        if let Some(ref v) = update.next_schedule {
            self.next_schedule = v.clone();
        }
        if let Some(v) = update.next_trigger_at {
            self.next_trigger_at = v;
        }
        if let Some(v) = update.last_run_at {
            self.last_run_at = v;
        }
        if let Some(ref v) = update.container_id {
            self.container_id = v.clone();
        }
        if let Some(ref v) = update.error_message {
            self.error_message = v.clone();
        }
    }
}

/// Partial update to an [`AgentState`].
///
/// `None` leaves a field alone; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentStateUpdate {
    pub status: Option<AgentStatus>,
    pub current_job: Option<Option<JobId>>,
    pub last_job: Option<Option<JobId>>,
    pub next_schedule: Option<Option<String>>,
    pub next_trigger_at: Option<Option<DateTime<Utc>>>,
    pub last_run_at: Option<Option<DateTime<Utc>>>,
    pub container_id: Option<Option<String>>,
    pub error_message: Option<Option<String>>,
}

impl AgentStateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    crate::setters! {
        option {
            status: AgentStatus,
            current_job: Option<JobId>,
            last_job: Option<JobId>,
            next_schedule: Option<String>,
            next_trigger_at: Option<DateTime<Utc>>,
            last_run_at: Option<DateTime<Utc>>,
            container_id: Option<String>,
            error_message: Option<String>,
        }
    }

    /// Transition to running with the given job.
    pub fn started(job_id: &JobId, now: DateTime<Utc>) -> Self {
        Self::new()
            .status(AgentStatus::Running)
            .current_job(Some(job_id.clone()))
            .last_run_at(Some(now))
            .error_message(None)
    }

    /// Transition out of running once a job reaches a terminal state.
    pub fn finished(job_id: &JobId, error: Option<String>) -> Self {
        let status = if error.is_some() { AgentStatus::Error } else { AgentStatus::Idle };
        Self::new()
            .status(status)
            .current_job(None)
            .last_job(Some(job_id.clone()))
            .container_id(None)
            .error_message(error)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
