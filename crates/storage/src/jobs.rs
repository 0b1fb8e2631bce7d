// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job metadata files (`jobs/<id>.yaml`).

use crate::atomic::{read_yaml, remove_file, write_yaml};
use crate::dir::StateDir;
use crate::error::StateError;
use chrono::{DateTime, Utc};
use fleet_core::{JobId, JobMetadata, JobStatus, JobUpdate};
use parking_lot::Mutex;

/// Filter for [`JobStore::list`].
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub agent: Option<String>,
    pub status: Option<JobStatus>,
    pub limit: Option<usize>,
}

impl JobFilter {
    pub fn new() -> Self {
        Self::default()
    }

    fleet_core::setters! {
        option {
            agent: String,
            status: JobStatus,
            limit: usize,
        }
    }

    fn matches(&self, job: &JobMetadata) -> bool {
        self.agent.as_ref().is_none_or(|a| *a == job.agent)
            && self.status.is_none_or(|s| s == job.status)
    }
}

/// What a new job is for.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub agent: String,
    pub schedule: String,
    pub prompt: Option<String>,
}

pub struct JobStore {
    dir: StateDir,
    write_lock: Mutex<()>,
}

impl JobStore {
    pub fn new(dir: StateDir) -> Self {
        Self { dir, write_lock: Mutex::new(()) }
    }

    /// Allocate an id and persist a pending record.
    pub fn create(&self, new: NewJob, now: DateTime<Utc>) -> Result<JobMetadata, StateError> {
        let _guard = self.write_lock.lock();
        let mut id = JobId::generate_at(now);
        while self.dir.job_file(&id).exists() {
            id = JobId::generate_at(now);
        }
        let job = JobMetadata::new(id, new.agent, new.schedule, now).with_prompt(new.prompt);
        write_yaml(&self.dir.job_file(&job.id), &job)?;
        tracing::debug!(job_id = %job.id, agent = %job.agent, "created job");
        Ok(job)
    }

    /// Apply a partial update, returning the new record.
    pub fn update(&self, id: &JobId, update: &JobUpdate) -> Result<JobMetadata, StateError> {
        let _guard = self.write_lock.lock();
        let path = self.dir.job_file(id);
        let mut job: JobMetadata =
            read_yaml(&path)?.ok_or_else(|| StateError::JobNotFound(id.clone()))?;
        job.apply(update);
        write_yaml(&path, &job)?;
        Ok(job)
    }

    pub fn get(&self, id: &JobId) -> Result<Option<JobMetadata>, StateError> {
        read_yaml(&self.dir.job_file(id))
    }

    /// Delete a job's metadata and output. Returns whether the job existed.
    pub fn delete(&self, id: &JobId) -> Result<bool, StateError> {
        let _guard = self.write_lock.lock();
        let existed = remove_file(&self.dir.job_file(id))?;
        remove_file(&self.dir.job_output_file(id))?;
        Ok(existed)
    }

    /// Jobs matching `filter`, newest first.
    ///
    /// Unreadable records are skipped with a warning.
    pub fn list(&self, filter: &JobFilter) -> Result<Vec<JobMetadata>, StateError> {
        let jobs_dir = self.dir.jobs_dir();
        let entries = match std::fs::read_dir(&jobs_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StateError::Read { path: jobs_dir, source }),
        };

        let mut jobs = Vec::new();
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            let is_job = path.extension().is_some_and(|e| e == "yaml")
                && path.file_name().is_some_and(|n| n.to_string_lossy().starts_with(JobId::PREFIX));
            if !is_job {
                continue;
            }
            match read_yaml::<JobMetadata>(&path) {
                Ok(Some(job)) if filter.matches(&job) => jobs.push(job),
                Ok(_) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable job"),
            }
        }

        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            jobs.truncate(limit);
        }
        Ok(jobs)
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
