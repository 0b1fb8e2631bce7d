// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime session records.
//!
//! A session is the execution runtime's conversation handle (e.g. the id
//! passed back via `--resume`). Records are keyed by a logical conversation
//! key: an agent's default session, or a chat channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a session is used for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Scheduled or manually triggered jobs
    #[default]
    Autonomous,
    /// A chat channel conversation
    Chat,
}

crate::simple_display! {
    SessionMode {
        Autonomous => "autonomous",
        Chat => "chat",
    }
}

/// Persisted session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    #[serde(default)]
    pub job_count: u32,
    #[serde(default)]
    pub mode: SessionMode,
}

impl SessionInfo {
    pub fn new(session_id: impl Into<String>, mode: SessionMode, now: DateTime<Utc>) -> Self {
        Self { session_id: session_id.into(), created_at: now, last_used_at: now, job_count: 0, mode }
    }

    /// Record another use of this session.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_used_at = now;
        self.job_count = self.job_count.saturating_add(1);
    }

    /// Time since the session was last used.
    pub fn idle_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_used_at
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
