// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only views returned by the fleet manager's status queries.

use crate::scheduler::ScheduleState;
use chrono::{DateTime, Utc};
use fleet_config::ResolvedAgent;
use fleet_core::{AgentState, AgentStatus, JobId};
use serde::Serialize;
use std::path::PathBuf;

/// Fleet manager lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FleetLifecycle {
    #[default]
    Uninitialized,
    Initialized,
    Running,
    Stopping,
    Stopped,
}

fleet_core::simple_display! {
    FleetLifecycle {
        Uninitialized => "uninitialized",
        Initialized => "initialized",
        Running => "running",
        Stopping => "stopping",
        Stopped => "stopped",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentCounts {
    pub total: usize,
    pub idle: usize,
    pub running: usize,
    pub error: usize,
}

impl AgentCounts {
    pub(crate) fn tally<'a>(states: impl IntoIterator<Item = &'a AgentState>) -> Self {
        let mut counts = Self::default();
        for state in states {
            counts.total += 1;
            match state.status {
                AgentStatus::Idle => counts.idle += 1,
                AgentStatus::Running => counts.running += 1,
                AgentStatus::Error => counts.error += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub tick_interval_ms: u64,
    pub tick_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tick_at: Option<DateTime<Utc>>,
}

/// Snapshot answered by `get_fleet_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetStatus {
    pub state: FleetLifecycle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reload_at: Option<DateTime<Utc>>,
    pub agents: AgentCounts,
    pub running_jobs: usize,
    pub scheduler: SchedulerStatus,
}

/// One agent's configuration joined with its persisted state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentInfo {
    pub name: String,
    pub qualified_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fleet_path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub working_directory: PathBuf,
    pub containerized: bool,
    pub status: AgentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_job: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_job: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_trigger_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub schedules: Vec<ScheduleState>,
}

impl AgentInfo {
    pub(crate) fn new(agent: &ResolvedAgent, state: AgentState, schedules: &[ScheduleState]) -> Self {
        Self {
            name: agent.name.clone(),
            qualified_name: agent.qualified_name.clone(),
            fleet_path: agent.fleet_path.clone(),
            description: agent.description.clone(),
            working_directory: agent.working_directory.clone(),
            containerized: agent.is_containerized(),
            status: state.status,
            current_job: state.current_job,
            last_job: state.last_job,
            last_run_at: state.last_run_at,
            next_schedule: state.next_schedule,
            next_trigger_at: state.next_trigger_at,
            container_id: state.container_id,
            error_message: state.error_message,
            schedules: schedules.to_vec(),
        }
    }
}
