// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event methods: name, log summary, job accessors

use super::FleetEvent;
use crate::job::JobMetadata;

impl FleetEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FleetEvent::Initialized => "initialized",
            FleetEvent::Started => "started",
            FleetEvent::Stopped => "stopped",
            FleetEvent::Error { .. } => "error",
            FleetEvent::ConfigReloaded { .. } => "config:reloaded",
            FleetEvent::ScheduleTriggered { .. } => "schedule:triggered",
            FleetEvent::ScheduleSkipped { .. } => "schedule:skipped",
            FleetEvent::JobCreated { .. } => "job:created",
            FleetEvent::JobCompleted { .. } => "job:completed",
            FleetEvent::JobFailed { .. } => "job:failed",
            FleetEvent::JobCancelled { .. } => "job:cancelled",
        }
    }

    /// The job this event concerns, for job events.
    pub fn job(&self) -> Option<&JobMetadata> {
        match self {
            FleetEvent::JobCreated { job }
            | FleetEvent::JobCompleted { job, .. }
            | FleetEvent::JobFailed { job, .. }
            | FleetEvent::JobCancelled { job, .. } => Some(job),
            _ => None,
        }
    }

    /// The agent this event concerns, if any.
    pub fn agent_name(&self) -> Option<&str> {
        match self {
            FleetEvent::ScheduleTriggered { agent_name, .. }
            | FleetEvent::ScheduleSkipped { agent_name, .. } => Some(agent_name),
            _ => self.job().map(|job| job.agent.as_str()),
        }
    }

    /// One-line summary for log output.
    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            FleetEvent::Initialized | FleetEvent::Started | FleetEvent::Stopped => t.to_string(),
            FleetEvent::Error { message } => format!("{t} message={message}"),
            FleetEvent::ConfigReloaded { agent_count, changes } => {
                format!("{t} agents={agent_count} changes={}", changes.len())
            }
            FleetEvent::ScheduleTriggered { agent_name, schedule_name } => {
                format!("{t} agent={agent_name} schedule={schedule_name}")
            }
            FleetEvent::ScheduleSkipped { agent_name, schedule_name, reason } => {
                format!("{t} agent={agent_name} schedule={schedule_name} reason={reason}")
            }
            FleetEvent::JobCreated { job } => {
                format!("{t} id={} agent={} schedule={}", job.id, job.agent, job.schedule)
            }
            FleetEvent::JobCompleted { job, duration_seconds } => {
                format!("{t} id={} agent={} duration={duration_seconds:.1}s", job.id, job.agent)
            }
            FleetEvent::JobFailed { job, error } => {
                format!("{t} id={} agent={} error={error}", job.id, job.agent)
            }
            FleetEvent::JobCancelled { job, termination_type } => {
                format!("{t} id={} agent={} termination={termination_type}", job.id, job.agent)
            }
        }
    }
}
