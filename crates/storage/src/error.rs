// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State store errors

use fleet_core::JobId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from state store operations.
///
/// A missing file is never an error on read; it yields the initial value.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state directory {} is not usable: {reason}", path.display())]
    DirectoryInvalid { path: PathBuf, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt state file {}: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {}: {message}", path.display())]
    Serialize { path: PathBuf, message: String },

    #[error("job not found: {0}")]
    JobNotFound(JobId),
}
