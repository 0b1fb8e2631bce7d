// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use tempfile::TempDir;

#[test]
fn lock_is_exclusive_and_records_pid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state/fleetd.lock");

    let held = acquire_lock(&path).unwrap();
    let pid = std::fs::read_to_string(&path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());

    assert!(matches!(acquire_lock(&path), Err(LifecycleError::LockFailed(_))));
    // A failed attempt leaves the holder's pid in place.
    assert_eq!(std::fs::read_to_string(&path).unwrap(), pid);

    drop(held);
    acquire_lock(&path).unwrap();
}

#[test]
#[serial]
fn load_derives_paths_from_the_definition() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("fleet.yaml"), "fleet: { name: demo }\n").unwrap();
    std::env::set_var("FLEET_CONFIG", dir.path());
    std::env::remove_var("FLEET_STATE_DIR");
    std::env::set_var("FLEET_DRAIN_TIMEOUT_MS", "1500");

    let config = Config::load().unwrap();
    assert_eq!(config.config_path, dir.path().join("fleet.yaml"));
    assert_eq!(config.state_dir, dir.path().join(".fleet"));
    assert_eq!(config.lock_path, dir.path().join(".fleet/fleetd.lock"));
    assert_eq!(config.log_dir, dir.path().join(".fleet/logs"));

    let stop = config.stop_options();
    assert_eq!(stop.timeout, Duration::from_millis(1500));
    assert!(stop.cancel_on_timeout);
    let options = config.manager_options();
    assert_eq!(options.state_dir, Some(dir.path().join(".fleet")));

    std::env::remove_var("FLEET_CONFIG");
    std::env::remove_var("FLEET_DRAIN_TIMEOUT_MS");
}

#[test]
#[serial]
fn load_fails_without_a_definition() {
    let dir = TempDir::new().unwrap();
    std::env::set_var("FLEET_CONFIG", dir.path().join("missing.yaml"));
    assert!(matches!(Config::load(), Err(LifecycleError::Config(ConfigError::NotFound { .. }))));
    std::env::remove_var("FLEET_CONFIG");
}
