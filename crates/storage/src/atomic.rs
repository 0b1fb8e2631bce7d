// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic file replacement and YAML file helpers.
//!
//! Writers serialize into a uniquely named temp file next to the target and
//! rename it over the target. Readers see either the old or the new file,
//! never a partial one, and a crash mid-write leaves the old file intact.

use crate::error::StateError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn tmp_path(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, fleet_core::id::random_suffix(8)))
}

/// Replace `path` with `bytes` atomically.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StateError> {
    let tmp = tmp_path(path);
    let result = File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&tmp, path));
    if let Err(source) = result {
        let _ = fs::remove_file(&tmp);
        return Err(StateError::Write { path: path.to_path_buf(), source });
    }
    Ok(())
}

/// Serialize `value` as YAML and replace `path` atomically.
pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), StateError> {
    let yaml = serde_yml::to_string(value)
        .map_err(|e| StateError::Serialize { path: path.to_path_buf(), message: e.to_string() })?;
    write_atomic(path, yaml.as_bytes())
}

/// Read a YAML file; `Ok(None)` if it does not exist.
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StateError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(StateError::Read { path: path.to_path_buf(), source }),
    };
    serde_yml::from_str(&content)
        .map(Some)
        .map_err(|e| StateError::Corrupt { path: path.to_path_buf(), message: e.to_string() })
}

/// Remove a file; `Ok(false)` if it did not exist.
pub fn remove_file(path: &Path) -> Result<bool, StateError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(StateError::Write { path: path.to_path_buf(), source }),
    }
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
