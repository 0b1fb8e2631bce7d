// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

#[test]
fn init_creates_layout() {
    let tmp = TempDir::new().unwrap();
    let dir = StateDir::init(tmp.path().join(".fleet")).unwrap();
    assert!(dir.jobs_dir().is_dir());
    assert!(dir.sessions_dir().is_dir());
    assert!(dir.logs_dir().is_dir());
    assert_eq!(dir.state_file(), tmp.path().join(".fleet/state.yaml"));
}

#[test]
fn init_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    StateDir::init(tmp.path()).unwrap();
    StateDir::init(tmp.path()).unwrap();
    let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with(".write-check"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn init_rejects_file_in_place_of_directory() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("state");
    std::fs::write(&root, "not a dir").unwrap();
    let err = StateDir::init(&root).unwrap_err();
    assert!(matches!(err, StateError::DirectoryInvalid { .. }), "got {err:?}");
}

#[test]
fn job_paths_use_the_full_id() {
    let tmp = TempDir::new().unwrap();
    let dir = StateDir::init(tmp.path()).unwrap();
    let id = JobId::from_string("job-20260101-000000-abc123");
    assert!(dir.job_file(&id).ends_with("jobs/job-20260101-000000-abc123.yaml"));
    assert!(dir.job_output_file(&id).ends_with("jobs/job-20260101-000000-abc123.jsonl"));
}

#[yare::parameterized(
    plain   = { "reviewer", "reviewer" },
    colon   = { "agent:reviewer", "agent_reviewer" },
    slashes = { "discord/reviewer/123", "discord_reviewer_123" },
    dots    = { "../etc", "___etc" },
)]
fn session_keys_are_file_safe(key: &str, expected: &str) {
    assert_eq!(file_safe(key), expected);
}
