// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-channel session manager for chat integrations.
//!
//! Chat adapters map each channel to one runtime session. The contract is
//! [`SessionManager`]; [`ChannelSessions`] is the file-backed implementation
//! keeping one YAML file per (platform, agent) under `sessions/`.

use crate::atomic::{read_yaml, write_yaml};
use crate::dir::StateDir;
use crate::error::StateError;
use crate::session_check::validate_session;
use fleet_core::{Clock, SessionInfo, SessionMode};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Session handed to a chat adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSession {
    pub session_id: String,
    /// No prior session could be reused
    pub is_new: bool,
}

/// Session bookkeeping used by chat integrations.
pub trait SessionManager: Send + Sync {
    /// Reuse the channel's session if still valid, otherwise start a new one.
    fn get_or_create(&self, channel_id: &str) -> Result<ChannelSession, StateError>;
    /// Record activity on the channel's session.
    fn touch(&self, channel_id: &str) -> Result<(), StateError>;
    /// The channel's session if it is still valid.
    fn get(&self, channel_id: &str) -> Result<Option<SessionInfo>, StateError>;
    /// Adopt a session id reported by the runtime.
    fn set(&self, channel_id: &str, session_id: &str) -> Result<(), StateError>;
    fn clear(&self, channel_id: &str) -> Result<bool, StateError>;
    /// Drop expired sessions, returning how many were removed.
    fn cleanup_expired(&self) -> Result<usize, StateError>;
    /// Count of sessions that are still valid.
    fn active_count(&self) -> Result<usize, StateError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ChannelFile {
    #[serde(default)]
    channels: BTreeMap<String, SessionInfo>,
}

/// File-backed [`SessionManager`] for one (platform, agent) pair.
pub struct ChannelSessions<C: Clock> {
    platform: String,
    agent: String,
    path: PathBuf,
    max_age: Duration,
    clock: C,
    lock: Mutex<()>,
}

impl<C: Clock> ChannelSessions<C> {
    pub fn new(dir: &StateDir, platform: &str, agent: &str, max_age: Duration, clock: C) -> Self {
        Self {
            platform: platform.to_string(),
            agent: agent.to_string(),
            path: dir.session_file(&format!("{platform}-{agent}")),
            max_age,
            clock,
            lock: Mutex::new(()),
        }
    }

    fn new_session_id(&self) -> String {
        format!("{}-{}-{}", self.platform, self.agent, fleet_core::id::random_suffix(12))
    }

    fn is_valid(&self, info: &SessionInfo) -> bool {
        validate_session(info, self.max_age, self.clock.now()).is_ok()
    }

    fn load(&self) -> Result<ChannelFile, StateError> {
        Ok(read_yaml(&self.path)?.unwrap_or_default())
    }

    /// Read-modify-write under the lock.
    fn modify<R>(&self, f: impl FnOnce(&mut ChannelFile) -> R) -> Result<R, StateError> {
        let _guard = self.lock.lock();
        let mut file = self.load()?;
        let result = f(&mut file);
        write_yaml(&self.path, &file)?;
        Ok(result)
    }
}

impl<C: Clock> SessionManager for ChannelSessions<C> {
    fn get_or_create(&self, channel_id: &str) -> Result<ChannelSession, StateError> {
        let now = self.clock.now();
        self.modify(|file| {
            if let Some(info) = file.channels.get(channel_id).filter(|i| self.is_valid(i)) {
                return ChannelSession { session_id: info.session_id.clone(), is_new: false };
            }
            let info = SessionInfo::new(self.new_session_id(), SessionMode::Chat, now);
            let session = ChannelSession { session_id: info.session_id.clone(), is_new: true };
            tracing::debug!(
                platform = %self.platform,
                agent = %self.agent,
                channel = channel_id,
                session_id = %session.session_id,
                "started channel session"
            );
            file.channels.insert(channel_id.to_string(), info);
            session
        })
    }

    fn touch(&self, channel_id: &str) -> Result<(), StateError> {
        let now = self.clock.now();
        self.modify(|file| {
            if let Some(info) = file.channels.get_mut(channel_id) {
                info.touch(now);
            }
        })
    }

    fn get(&self, channel_id: &str) -> Result<Option<SessionInfo>, StateError> {
        let file = self.load()?;
        Ok(file.channels.get(channel_id).filter(|i| self.is_valid(i)).cloned())
    }

    fn set(&self, channel_id: &str, session_id: &str) -> Result<(), StateError> {
        let now = self.clock.now();
        self.modify(|file| {
            let info = file
                .channels
                .entry(channel_id.to_string())
                .or_insert_with(|| SessionInfo::new(session_id, SessionMode::Chat, now));
            info.session_id = session_id.to_string();
            info.last_used_at = now;
        })
    }

    fn clear(&self, channel_id: &str) -> Result<bool, StateError> {
        self.modify(|file| file.channels.remove(channel_id).is_some())
    }

    fn cleanup_expired(&self) -> Result<usize, StateError> {
        let removed = self.modify(|file| {
            let before = file.channels.len();
            file.channels.retain(|_, info| self.is_valid(info));
            before - file.channels.len()
        })?;
        if removed > 0 {
            tracing::info!(platform = %self.platform, agent = %self.agent, removed, "expired channel sessions");
        }
        Ok(removed)
    }

    fn active_count(&self) -> Result<usize, StateError> {
        let file = self.load()?;
        Ok(file.channels.values().filter(|i| self.is_valid(i)).count())
    }
}

#[cfg(test)]
#[path = "channel_sessions_tests.rs"]
mod tests;
