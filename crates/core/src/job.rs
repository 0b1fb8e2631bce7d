// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier, lifecycle status, and persisted metadata.

use crate::clock::Clock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

crate::define_id! {
    /// Unique identifier for a job instance.
    ///
    /// Formatted as `job-YYYYMMDD-HHMMSS-mmm-cccccccc-xxxxxx`: timestamp to
    /// the millisecond, a per-process sequence number in hex, then a random
    /// tail. Lexical order follows generation order within a process.
    pub struct JobId("job-");
}

/// Per-process generation counter; breaks ties between ids with the same timestamp.
static JOB_SEQUENCE: AtomicU32 = AtomicU32::new(0);

impl JobId {
    /// Allocate a new id stamped with the clock's current time.
    pub fn generate(clock: &impl Clock) -> Self {
        Self::generate_at(clock.now())
    }

    pub fn generate_at(now: DateTime<Utc>) -> Self {
        Self::from_string(format!(
            "{}{}-{:08x}-{}",
            Self::PREFIX,
            now.format("%Y%m%d-%H%M%S-%3f"),
            JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            crate::id::random_suffix(6)
        ))
    }
}

/// Schedule name recorded on jobs created by an explicit trigger.
pub const MANUAL_TRIGGER: &str = "manual";

/// Job lifecycle: `pending → running → {completed | failed | cancelled}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// How a cancelled job's execution unit went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationType {
    /// Exited within the grace window after a terminate request
    Graceful,
    /// Killed after the grace window elapsed
    Forced,
}

crate::simple_display! {
    TerminationType {
        Graceful => "graceful",
        Forced => "forced",
    }
}

/// Persisted record for one job (`jobs/<id>.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMetadata {
    pub id: JobId,
    pub agent: String,
    #[serde(default)]
    pub status: JobStatus,
    /// Originating schedule name, or `"manual"`
    pub schedule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_type: Option<TerminationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl JobMetadata {
    /// A fresh pending job for `agent` triggered by `schedule`.
    pub fn new(
        id: JobId,
        agent: impl Into<String>,
        schedule: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            agent: agent.into(),
            status: JobStatus::Pending,
            schedule: schedule.into(),
            prompt: None,
            created_at,
            started_at: None,
            ended_at: None,
            container_id: None,
            exit_code: None,
            error: None,
            termination_type: None,
            session_id: None,
        }
    }

    pub fn with_prompt(mut self, prompt: Option<String>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_manual(&self) -> bool {
        self.schedule == MANUAL_TRIGGER
    }

    /// Wall-clock seconds from start (or creation) to end, if ended.
    pub fn duration_seconds(&self) -> Option<f64> {
        let end = self.ended_at?;
        let start = self.started_at.unwrap_or(self.created_at);
        Some((end - start).num_milliseconds().max(0) as f64 / 1000.0)
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, update: &JobUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(v) = update.started_at {
            self.started_at = Some(v);
        }
        if let Some(v) = update.ended_at {
            self.ended_at = Some(v);
        }
        if let Some(ref v) = update.container_id {
            self.container_id = v.clone();
        }
        if let Some(v) = update.exit_code {
            self.exit_code = Some(v);
        }
        if let Some(ref v) = update.error {
            self.error = Some(v.clone());
        }
        if let Some(v) = update.termination_type {
            self.termination_type = Some(v);
        }
        if let Some(ref v) = update.session_id {
            self.session_id = Some(v.clone());
        }
    }
}

crate::builder! {
    pub struct JobMetadataBuilder => JobMetadata {
        into {
            id: JobId = "job-20260101-000000-test00",
            agent: String = "worker",
            schedule: String = "hourly",
        }
        set {
            status: JobStatus = JobStatus::Pending,
            created_at: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH,
        }
        option {
            prompt: String = None,
            started_at: DateTime<Utc> = None,
            ended_at: DateTime<Utc> = None,
            container_id: String = None,
            exit_code: i32 = None,
            error: String = None,
            termination_type: TerminationType = None,
            session_id: String = None,
        }
    }
}

/// Partial update to a [`JobMetadata`].
///
/// Every field is "set if present"; job records only accumulate facts.
/// `container_id` is the exception and can be cleared with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub container_id: Option<Option<String>>,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
    pub termination_type: Option<TerminationType>,
    pub session_id: Option<String>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    crate::setters! {
        option {
            status: JobStatus,
            started_at: DateTime<Utc>,
            ended_at: DateTime<Utc>,
            container_id: Option<String>,
            exit_code: i32,
            error: String,
            termination_type: TerminationType,
            session_id: String,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
