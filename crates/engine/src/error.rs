// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types

use crate::manager::FleetLifecycle;
use fleet_config::ConfigError;
use fleet_core::JobId;
use fleet_storage::StateError;
use thiserror::Error;

/// Failures launching or recording a job.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to record output after {attempts} attempts: {source}")]
    OutputAppend {
        attempts: u32,
        #[source]
        source: StateError,
    },

    #[error("agent {0} already has a running job")]
    AgentBusy(String),

    #[error(transparent)]
    State(#[from] StateError),
}

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("initialization failed: {0}")]
    Initialization(#[source] Box<FleetError>),

    #[error("cannot {operation} while {state}")]
    InvalidState { operation: &'static str, state: FleetLifecycle },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("{} job(s) still running after shutdown timeout", running.len())]
    ShutdownTimeout { running: Vec<JobId> },

    #[error("unknown agent: {0}")]
    AgentNotFound(String),

    #[error("agent {agent} has no schedule {schedule}")]
    ScheduleNotFound { agent: String, schedule: String },

    #[error("unknown job: {0}")]
    JobNotFound(JobId),

    #[error("agent {0} already has a running job")]
    AgentBusy(String),

    #[error(transparent)]
    Runner(RunnerError),
}

impl From<RunnerError> for FleetError {
    fn from(e: RunnerError) -> Self {
        match e {
            RunnerError::AgentBusy(agent) => FleetError::AgentBusy(agent),
            RunnerError::State(e) => FleetError::State(e),
            other => FleetError::Runner(other),
        }
    }
}
