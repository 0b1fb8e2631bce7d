// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use fleet_engine::{DEFAULT_CANCEL_TIMEOUT, DEFAULT_STOP_TIMEOUT, DEFAULT_TICK_INTERVAL};
use std::path::PathBuf;
use std::time::Duration;

/// Default log filter when `FLEET_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.is_empty())
}

fn millis(var: &str) -> Option<Duration> {
    non_empty(var).and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

/// Fleet definition file or directory: `FLEET_CONFIG` > current directory
pub fn config_path() -> PathBuf {
    non_empty("FLEET_CONFIG").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
}

/// State directory override. Unset means `<config dir>/.fleet`.
pub fn state_dir() -> Option<PathBuf> {
    non_empty("FLEET_STATE_DIR").map(PathBuf::from)
}

/// Scheduler tick interval (`FLEET_TICK_MS`, default 1s)
pub fn tick_interval() -> Duration {
    millis("FLEET_TICK_MS").filter(|d| !d.is_zero()).unwrap_or(DEFAULT_TICK_INTERVAL)
}

/// How long shutdown waits for jobs before cancelling (`FLEET_DRAIN_TIMEOUT_MS`, default 30s)
pub fn drain_timeout() -> Duration {
    millis("FLEET_DRAIN_TIMEOUT_MS").unwrap_or(DEFAULT_STOP_TIMEOUT)
}

/// Grace window for cancellations (`FLEET_CANCEL_TIMEOUT_MS`, default 10s)
pub fn cancel_timeout() -> Duration {
    millis("FLEET_CANCEL_TIMEOUT_MS").unwrap_or(DEFAULT_CANCEL_TIMEOUT)
}

/// `tracing` filter directive (`FLEET_LOG`)
pub fn log_filter() -> String {
    non_empty("FLEET_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
