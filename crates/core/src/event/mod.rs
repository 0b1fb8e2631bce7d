// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events emitted by the fleet manager to its subscribers.

mod methods;

use crate::job::{JobMetadata, TerminationType};
use serde::{Deserialize, Serialize};

/// Kind of structural change between two configuration revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
    Changed,
}

crate::simple_display! {
    ChangeType {
        Added => "added",
        Removed => "removed",
        Changed => "changed",
    }
}

/// What a configuration change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCategory {
    Agent,
    Schedule,
}

crate::simple_display! {
    ChangeCategory {
        Agent => "agent",
        Schedule => "schedule",
    }
}

/// One entry in a reload diff.
///
/// Schedule changes are named `agent/schedule`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigChange {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub category: ChangeCategory,
    pub name: String,
}

impl ConfigChange {
    pub fn new(change_type: ChangeType, category: ChangeCategory, name: impl Into<String>) -> Self {
        Self { change_type, category, name: name.into() }
    }
}

/// Fleet lifecycle, scheduling, and job events.
///
/// Serializes with `{"type": "event:name", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FleetEvent {
    #[serde(rename = "initialized")]
    Initialized,

    #[serde(rename = "started")]
    Started,

    #[serde(rename = "stopped")]
    Stopped,

    #[serde(rename = "error")]
    Error { message: String },

    #[serde(rename = "config:reloaded")]
    ConfigReloaded {
        #[serde(rename = "agentCount")]
        agent_count: usize,
        changes: Vec<ConfigChange>,
    },

    #[serde(rename = "schedule:triggered")]
    ScheduleTriggered {
        #[serde(rename = "agentName")]
        agent_name: String,
        #[serde(rename = "scheduleName")]
        schedule_name: String,
    },

    #[serde(rename = "schedule:skipped")]
    ScheduleSkipped {
        #[serde(rename = "agentName")]
        agent_name: String,
        #[serde(rename = "scheduleName")]
        schedule_name: String,
        reason: String,
    },

    #[serde(rename = "job:created")]
    JobCreated { job: Box<JobMetadata> },

    #[serde(rename = "job:completed")]
    JobCompleted {
        job: Box<JobMetadata>,
        #[serde(rename = "durationSeconds")]
        duration_seconds: f64,
    },

    #[serde(rename = "job:failed")]
    JobFailed { job: Box<JobMetadata>, error: String },

    #[serde(rename = "job:cancelled")]
    JobCancelled {
        job: Box<JobMetadata>,
        #[serde(rename = "terminationType")]
        termination_type: TerminationType,
    },
}

/// Reason recorded when a due schedule is dropped because its agent is running.
pub const SKIP_AGENT_BUSY: &str = "agent busy";

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
