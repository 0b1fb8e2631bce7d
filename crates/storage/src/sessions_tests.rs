// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fleet_core::{Clock, FakeClock, SessionMode};
use std::time::Duration;
use tempfile::TempDir;

fn setup() -> (TempDir, SessionStore) {
    let tmp = TempDir::new().unwrap();
    let dir = StateDir::init(tmp.path()).unwrap();
    (tmp, SessionStore::new(dir))
}

#[test]
fn put_then_get() {
    let (_tmp, store) = setup();
    let info = SessionInfo::new("abc", SessionMode::Autonomous, FakeClock::new().now());
    store.put("agent:reviewer", &info).unwrap();
    assert_eq!(store.get("agent:reviewer").unwrap(), Some(info));
    assert!(store.get("agent:other").unwrap().is_none());
}

#[test]
fn key_is_stored_file_safe() {
    let (tmp, store) = setup();
    let info = SessionInfo::new("abc", SessionMode::Chat, FakeClock::new().now());
    store.put("discord/../x", &info).unwrap();
    assert!(tmp.path().join("sessions/discord____x.yaml").exists());
}

#[test]
fn touch_bumps_usage() {
    let (_tmp, store) = setup();
    let clock = FakeClock::new();
    store.put("k", &SessionInfo::new("abc", SessionMode::Autonomous, clock.now())).unwrap();
    clock.advance(Duration::from_secs(60));

    let touched = store.touch("k", clock.now()).unwrap().unwrap();
    assert_eq!(touched.job_count, 1);
    assert_eq!(touched.last_used_at, clock.now());
    assert_eq!(store.get("k").unwrap(), Some(touched));
}

#[test]
fn touch_missing_is_none() {
    let (_tmp, store) = setup();
    assert!(store.touch("k", FakeClock::new().now()).unwrap().is_none());
}

#[test]
fn clear_removes_record() {
    let (_tmp, store) = setup();
    store.put("k", &SessionInfo::new("abc", SessionMode::Autonomous, FakeClock::new().now())).unwrap();
    assert!(store.clear("k").unwrap());
    assert!(!store.clear("k").unwrap());
    assert!(store.get("k").unwrap().is_none());
}
