// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine unit tests.

use fleet_config::ResolvedConfig;
use std::path::Path;
use tempfile::TempDir;

/// Write `yaml` as `fleet.yaml` in `dir`.
pub(crate) fn write_fleet(dir: &Path, yaml: &str) {
    std::fs::write(dir.join("fleet.yaml"), yaml).unwrap();
}

/// Resolve a fleet document written to a fresh temp directory.
pub(crate) fn resolve_yaml(yaml: &str) -> (TempDir, ResolvedConfig) {
    let dir = TempDir::new().unwrap();
    write_fleet(dir.path(), yaml);
    let config = fleet_config::load_config(dir.path()).unwrap();
    (dir, config)
}
