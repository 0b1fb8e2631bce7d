// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-storage: durable state for the fleet.
//!
//! Everything lives under one state directory (see [`StateDir`]). Whole
//! documents are replaced atomically; job output is append-only.

mod atomic;
mod channel_sessions;
mod dir;
mod error;
mod fleet_state;
mod jobs;
mod output;
mod session_check;
mod sessions;

pub use atomic::{read_yaml, write_atomic, write_yaml};
pub use channel_sessions::{ChannelSession, ChannelSessions, SessionManager};
pub use dir::{file_safe, StateDir};
pub use error::StateError;
pub use fleet_state::{FleetMeta, FleetState, FleetStateStore, Reconciled};
pub use jobs::{JobFilter, JobStore, NewJob};
pub use output::{JobOutputStore, ReadOptions};
pub use session_check::{
    classify_session_error, encode_project_path, is_session_expired_error,
    is_token_expired_error, validate_session, validate_session_with_file_check,
    ContainerSessionCheck, LocalSessionCheck, SessionArtifactCheck, SessionFault,
};
pub use sessions::SessionStore;

use chrono::{DateTime, Utc};
use fleet_core::{AgentState, AgentStateUpdate, JobId, JobMetadata, JobOutputRecord, JobUpdate};

/// All persistent state for one fleet.
pub struct StateStore {
    dir: StateDir,
    fleet: FleetStateStore,
    jobs: JobStore,
    output: JobOutputStore,
    sessions: SessionStore,
}

impl StateStore {
    /// Open (creating if needed) the state directory at `root`.
    pub fn open(root: impl Into<std::path::PathBuf>) -> Result<Self, StateError> {
        let dir = StateDir::init(root)?;
        Ok(Self {
            fleet: FleetStateStore::new(dir.state_file()),
            jobs: JobStore::new(dir.clone()),
            output: JobOutputStore::new(dir.clone()),
            sessions: SessionStore::new(dir.clone()),
            dir,
        })
    }

    pub fn dir(&self) -> &StateDir {
        &self.dir
    }

    pub fn fleet(&self) -> &FleetStateStore {
        &self.fleet
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn read_fleet_state(&self) -> Result<FleetState, StateError> {
        self.fleet.read()
    }

    pub fn write_fleet_state(&self, state: &FleetState) -> Result<(), StateError> {
        self.fleet.write(state)
    }

    pub fn update_agent_state(
        &self,
        name: &str,
        update: &AgentStateUpdate,
    ) -> Result<AgentState, StateError> {
        self.fleet.update_agent(name, update)
    }

    /// Update an existing agent entry; unknown agents stay absent.
    pub fn patch_agent_state(
        &self,
        name: &str,
        update: &AgentStateUpdate,
    ) -> Result<Option<AgentState>, StateError> {
        self.fleet.patch_agent(name, update)
    }

    pub fn remove_agent_state(&self, name: &str) -> Result<Option<AgentState>, StateError> {
        self.fleet.remove_agent(name)
    }

    pub fn create_job(&self, new: NewJob, now: DateTime<Utc>) -> Result<JobMetadata, StateError> {
        self.jobs.create(new, now)
    }

    pub fn update_job(&self, id: &JobId, update: &JobUpdate) -> Result<JobMetadata, StateError> {
        self.jobs.update(id, update)
    }

    pub fn get_job(&self, id: &JobId) -> Result<Option<JobMetadata>, StateError> {
        self.jobs.get(id)
    }

    pub fn delete_job(&self, id: &JobId) -> Result<bool, StateError> {
        self.jobs.delete(id)
    }

    pub fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobMetadata>, StateError> {
        self.jobs.list(filter)
    }

    pub fn append_job_output(&self, id: &JobId, record: &JobOutputRecord) -> Result<(), StateError> {
        self.output.append(id, record)
    }

    pub fn append_job_output_batch(
        &self,
        id: &JobId,
        records: &[JobOutputRecord],
    ) -> Result<(), StateError> {
        self.output.append_batch(id, records)
    }

    pub fn read_job_output(
        &self,
        id: &JobId,
        options: ReadOptions,
    ) -> Result<Vec<JobOutputRecord>, StateError> {
        self.output.read(id, options)
    }

    pub fn read_job_output_all(&self, id: &JobId) -> Result<Vec<JobOutputRecord>, StateError> {
        self.output.read_all(id)
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
