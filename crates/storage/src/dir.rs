// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State directory layout.
//!
//! ```text
//! <root>/
//!   state.yaml            fleet state
//!   jobs/<job id>.yaml    job metadata
//!   jobs/<job id>.jsonl   job output
//!   sessions/<key>.yaml   session records
//!   logs/                 daemon logs
//! ```

use crate::error::StateError;
use fleet_core::JobId;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    /// Create the directory tree if absent and check it is writable.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self, StateError> {
        let dir = Self { root: root.into() };
        for path in [dir.root.clone(), dir.jobs_dir(), dir.sessions_dir(), dir.logs_dir()] {
            if path.exists() && !path.is_dir() {
                return Err(StateError::DirectoryInvalid {
                    path,
                    reason: "exists and is not a directory".to_string(),
                });
            }
            std::fs::create_dir_all(&path).map_err(|e| StateError::DirectoryInvalid {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        }
        dir.check_writable()?;
        tracing::debug!(root = %dir.root.display(), "state directory ready");
        Ok(dir)
    }

    fn check_writable(&self) -> Result<(), StateError> {
        let marker = self.root.join(format!(".write-check-{}", fleet_core::id::random_suffix(6)));
        std::fs::write(&marker, b"")
            .and_then(|_| std::fs::remove_file(&marker))
            .map_err(|e| StateError::DirectoryInvalid {
                path: self.root.clone(),
                reason: format!("not writable: {e}"),
            })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join("state.yaml")
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.root.join("jobs")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn job_file(&self, id: &JobId) -> PathBuf {
        self.jobs_dir().join(format!("{id}.yaml"))
    }

    pub fn job_output_file(&self, id: &JobId) -> PathBuf {
        self.jobs_dir().join(format!("{id}.jsonl"))
    }

    /// Session record path; `key` is reduced to a file-safe name.
    pub fn session_file(&self, key: &str) -> PathBuf {
        self.sessions_dir().join(format!("{}.yaml", file_safe(key)))
    }
}

/// Replace anything outside `[A-Za-z0-9_-]` with `_`.
pub fn file_safe(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
#[path = "dir_tests.rs"]
mod tests;
