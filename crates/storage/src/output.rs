// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only job output logs (`jobs/<id>.jsonl`).
//!
//! One JSON record per line. Appends are the only mutation; each call
//! writes its complete lines with a single `write_all` under the store
//! lock, so records from concurrent appenders never interleave.

use crate::dir::StateDir;
use crate::error::StateError;
use fleet_core::{JobId, JobOutputRecord};
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::Write;

/// Bounds for [`JobOutputStore::read`]. Applied as: skip `since`, keep the
/// last `tail`, then keep the first `limit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Record offset to start from
    pub since: Option<usize>,
    pub tail: Option<usize>,
    pub limit: Option<usize>,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    fleet_core::setters! {
        option {
            since: usize,
            tail: usize,
            limit: usize,
        }
    }
}

pub struct JobOutputStore {
    dir: StateDir,
    append_lock: Mutex<()>,
}

impl JobOutputStore {
    pub fn new(dir: StateDir) -> Self {
        Self { dir, append_lock: Mutex::new(()) }
    }

    pub fn append(&self, id: &JobId, record: &JobOutputRecord) -> Result<(), StateError> {
        self.append_batch(id, std::slice::from_ref(record))
    }

    pub fn append_batch(&self, id: &JobId, records: &[JobOutputRecord]) -> Result<(), StateError> {
        if records.is_empty() {
            return Ok(());
        }
        let path = self.dir.job_output_file(id);
        let mut buf = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buf, record)
                .map_err(|e| StateError::Serialize { path: path.clone(), message: e.to_string() })?;
            buf.push(b'\n');
        }

        let _guard = self.append_lock.lock();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| file.write_all(&buf))
            .map_err(|source| StateError::Write { path, source })
    }

    pub fn read(&self, id: &JobId, options: ReadOptions) -> Result<Vec<JobOutputRecord>, StateError> {
        let mut records = self.read_all(id)?;
        if let Some(since) = options.since {
            records.drain(..since.min(records.len()));
        }
        if let Some(tail) = options.tail {
            let skip = records.len().saturating_sub(tail);
            records.drain(..skip);
        }
        if let Some(limit) = options.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    /// Every well-formed record in append order.
    ///
    /// Malformed lines (e.g. a final line cut short by a crash) are skipped.
    pub fn read_all(&self, id: &JobId) -> Result<Vec<JobOutputRecord>, StateError> {
        let path = self.dir.job_output_file(id);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StateError::Read { path, source }),
        };
        let mut records = Vec::new();
        for (n, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    job_id = %id,
                    line = n + 1,
                    error = %e,
                    "skipping malformed output record"
                ),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
