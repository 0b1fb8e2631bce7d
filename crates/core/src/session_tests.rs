// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_session_starts_unused() {
    let now = Utc::now();
    let info = SessionInfo::new("s-1", SessionMode::Chat, now);
    assert_eq!(info.created_at, now);
    assert_eq!(info.last_used_at, now);
    assert_eq!(info.job_count, 0);
}

#[test]
fn touch_bumps_usage() {
    let t0 = DateTime::<Utc>::UNIX_EPOCH;
    let mut info = SessionInfo::new("s-1", SessionMode::Autonomous, t0);
    let later = t0 + chrono::Duration::minutes(5);
    info.touch(later);

    assert_eq!(info.job_count, 1);
    assert_eq!(info.last_used_at, later);
    assert_eq!(info.created_at, t0);
    assert_eq!(info.idle_for(later + chrono::Duration::minutes(1)).num_minutes(), 1);
}

#[test]
fn yaml_defaults_mode_and_count() {
    let yaml = "session_id: abc\ncreated_at: 2026-01-01T00:00:00Z\nlast_used_at: 2026-01-01T00:00:00Z\n";
    let info: SessionInfo = serde_yml::from_str(yaml).unwrap();
    assert_eq!(info.mode, SessionMode::Autonomous);
    assert_eq!(info.job_count, 0);
}
