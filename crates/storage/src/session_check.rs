// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session validity checks.
//!
//! A stale or vanished session is never a failure for callers: it means
//! "start a fresh session". [`SessionFault`] says why a recorded session
//! cannot be resumed.

use chrono::{DateTime, Utc};
use fleet_core::SessionInfo;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Why a recorded session cannot be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFault {
    /// Unused for longer than the allowed age
    Expired,
    /// The runtime no longer has the session artifact
    Missing,
    /// The runtime rejected its credentials
    TokenExpired,
}

fleet_core::simple_display! {
    SessionFault {
        Expired => "session expired",
        Missing => "session not found",
        TokenExpired => "token expired",
    }
}

/// Check the recorded freshness of a session.
pub fn validate_session(
    info: &SessionInfo,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Result<(), SessionFault> {
    if info.session_id.is_empty() {
        return Err(SessionFault::Missing);
    }
    let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
    if info.idle_for(now) > max_age {
        return Err(SessionFault::Expired);
    }
    Ok(())
}

/// Whether the execution runtime still holds a session.
pub trait SessionArtifactCheck {
    fn exists(&self, session_id: &str) -> bool;
}

/// Check for the local runtime CLI, which keeps one transcript file per
/// session under `<projects>/<encoded working dir>/<session id>.jsonl`.
#[derive(Debug, Clone)]
pub struct LocalSessionCheck {
    project_dir: PathBuf,
}

impl LocalSessionCheck {
    /// Check rooted at `~/.claude/projects`. `None` without a home directory.
    pub fn for_working_dir(working_dir: &Path) -> Option<Self> {
        let projects = dirs::home_dir()?.join(".claude").join("projects");
        Some(Self::with_projects_dir(&projects, working_dir))
    }

    pub fn with_projects_dir(projects: &Path, working_dir: &Path) -> Self {
        Self { project_dir: projects.join(encode_project_path(working_dir)) }
    }

    pub fn session_file(&self, session_id: &str) -> PathBuf {
        self.project_dir.join(format!("{session_id}.jsonl"))
    }
}

impl SessionArtifactCheck for LocalSessionCheck {
    fn exists(&self, session_id: &str) -> bool {
        self.session_file(session_id).is_file()
    }
}

/// Container runtimes keep sessions inside the container; assume present
/// and let the runtime report otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerSessionCheck;

impl SessionArtifactCheck for ContainerSessionCheck {
    fn exists(&self, _session_id: &str) -> bool {
        true
    }
}

/// [`validate_session`] plus a check that the runtime still has the artifact.
pub fn validate_session_with_file_check(
    info: &SessionInfo,
    max_age: Duration,
    now: DateTime<Utc>,
    artifacts: &dyn SessionArtifactCheck,
) -> Result<(), SessionFault> {
    validate_session(info, max_age, now)?;
    if !artifacts.exists(&info.session_id) {
        return Err(SessionFault::Missing);
    }
    Ok(())
}

/// Runtime project directory name for a working directory: path separators
/// and dots become dashes.
pub fn encode_project_path(working_dir: &Path) -> String {
    working_dir
        .to_string_lossy()
        .chars()
        .map(|c| if c == '/' || c == '\\' || c == '.' { '-' } else { c })
        .collect()
}

const SESSION_EXPIRED_MARKERS: &[&str] = &[
    "no conversation found",
    "session not found",
    "session expired",
    "invalid session",
];

const TOKEN_EXPIRED_MARKERS: &[&str] = &[
    "oauth token has expired",
    "token expired",
    "token has expired",
    "invalid api key",
    "authentication_error",
];

/// Does runtime error output say the resumed session is gone?
pub fn is_session_expired_error(text: &str) -> bool {
    contains_any(text, SESSION_EXPIRED_MARKERS)
}

/// Does runtime error output say the credentials expired?
pub fn is_token_expired_error(text: &str) -> bool {
    contains_any(text, TOKEN_EXPIRED_MARKERS)
}

/// Classify runtime error output, if it names a session fault.
pub fn classify_session_error(text: &str) -> Option<SessionFault> {
    if is_token_expired_error(text) {
        Some(SessionFault::TokenExpired)
    } else if is_session_expired_error(text) {
        Some(SessionFault::Expired)
    } else {
        None
    }
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    let text = text.to_ascii_lowercase();
    markers.iter().any(|m| text.contains(m))
}

#[cfg(test)]
#[path = "session_check_tests.rs"]
mod tests;
