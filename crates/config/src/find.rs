// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet definition file discovery

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Candidate file names, in discovery order.
pub const CONFIG_CANDIDATES: &[&str] = &["fleet.yaml", "fleet.yml"];

/// Locate the root fleet definition.
///
/// A file path is used as-is. A directory is searched for each candidate
/// name, then each ancestor directory in turn.
pub fn find_config(start: &Path) -> Result<PathBuf, ConfigError> {
    if start.is_file() {
        return Ok(start.to_path_buf());
    }
    if !start.exists() {
        return Err(ConfigError::NotFound { path: start.to_path_buf() });
    }

    let mut dir = Some(start);
    while let Some(current) = dir {
        for name in CONFIG_CANDIDATES {
            let candidate = current.join(name);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "found fleet config");
                return Ok(candidate);
            }
        }
        dir = current.parent();
    }

    Err(ConfigError::NotFound { path: start.to_path_buf() })
}

#[cfg(test)]
#[path = "find_tests.rs"]
mod tests;
