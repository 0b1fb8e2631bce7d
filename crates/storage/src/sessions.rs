// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-key session records (`sessions/<key>.yaml`).

use crate::atomic::{read_yaml, remove_file, write_yaml};
use crate::dir::StateDir;
use crate::error::StateError;
use chrono::{DateTime, Utc};
use fleet_core::SessionInfo;
use parking_lot::Mutex;

pub struct SessionStore {
    dir: StateDir,
    write_lock: Mutex<()>,
}

impl SessionStore {
    pub fn new(dir: StateDir) -> Self {
        Self { dir, write_lock: Mutex::new(()) }
    }

    pub fn get(&self, key: &str) -> Result<Option<SessionInfo>, StateError> {
        read_yaml(&self.dir.session_file(key))
    }

    pub fn put(&self, key: &str, info: &SessionInfo) -> Result<(), StateError> {
        let _guard = self.write_lock.lock();
        write_yaml(&self.dir.session_file(key), info)
    }

    /// Mark the session as used. Returns the updated record, or `None` if
    /// there is no session under `key`.
    pub fn touch(&self, key: &str, now: DateTime<Utc>) -> Result<Option<SessionInfo>, StateError> {
        let _guard = self.write_lock.lock();
        let path = self.dir.session_file(key);
        let Some(mut info) = read_yaml::<SessionInfo>(&path)? else {
            return Ok(None);
        };
        info.touch(now);
        write_yaml(&path, &info)?;
        Ok(Some(info))
    }

    pub fn clear(&self, key: &str) -> Result<bool, StateError> {
        let _guard = self.write_lock.lock();
        remove_file(&self.dir.session_file(key))
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
