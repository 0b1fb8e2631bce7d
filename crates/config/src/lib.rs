// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-config: fleet definition loading, composition, and validation
//!
//! Resolution is a pure transform over the definition files and the
//! environment: find the root document, interpolate `${VAR}` placeholders,
//! expand sub-fleet references, merge defaults into agents, and validate.

mod compose;
mod diff;
mod error;
mod find;
mod interpolate;
mod merge;
mod resolve;
mod resolved;
mod schedule;
mod schema;
mod validate;

pub use diff::diff_configs;
pub use error::{ConfigError, SchemaIssue};
pub use find::{find_config, CONFIG_CANDIDATES};
pub use interpolate::{interpolate_str, interpolate_value, ProcessEnv, VarSource};
pub use merge::{merge_agent_config, merge_values};
pub use resolved::{
    ChatBinding, DockerConfig, Hook, HooksConfig, Invocation, ResolvedAgent, ResolvedConfig,
    ResolvedFleet, RuntimeOptions, SessionConfig, DEFAULT_HOOK_TIMEOUT, DEFAULT_RUNTIME,
    DEFAULT_SESSION_MAX_AGE,
};
pub use schedule::{CronExpr, Schedule, ScheduleKind};
pub use schema::{FleetDocument, WebConfig, FORMAT_VERSION};
pub use validate::{is_valid_agent_name, is_valid_fleet_name};

use std::path::Path;

/// Load and resolve the fleet rooted at `path` using the process environment.
pub fn load_config(path: &Path) -> Result<ResolvedConfig, ConfigError> {
    load_config_with(path, &ProcessEnv)
}

/// Load and resolve the fleet rooted at `path`, reading variables from `vars`.
pub fn load_config_with(path: &Path, vars: &impl VarSource) -> Result<ResolvedConfig, ConfigError> {
    let root = find_config(path)?;
    let nodes = compose::compose(&root, vars)?;
    let config = resolve::resolve(nodes, vars)?;
    tracing::info!(
        path = %config.config_path.display(),
        fleet = %config.name,
        agents = config.agents.len(),
        sub_fleets = config.fleets.len(),
        "loaded fleet config"
    );
    Ok(config)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
