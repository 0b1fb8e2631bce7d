// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The flattened, validated result of configuration resolution.

use crate::schedule::Schedule;
use crate::schema::WebConfig;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime CLI used when an agent declares neither `runtime` nor `command`.
pub const DEFAULT_RUNTIME: &str = "claude";

/// Default per-hook timeout.
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default maximum idle time before a session starts fresh.
pub const DEFAULT_SESSION_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// A composed fleet: every agent from the root document and all sub-fleets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    /// Root definition file
    pub config_path: PathBuf,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<WebConfig>,
    /// Sub-fleets in resolution order (root excluded)
    pub fleets: Vec<ResolvedFleet>,
    /// Agents keyed by name, in definition order
    pub agents: IndexMap<String, ResolvedAgent>,
}

impl ResolvedConfig {
    pub fn agent(&self, name: &str) -> Option<&ResolvedAgent> {
        self.agents.get(name)
    }

    pub fn agent_names(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(String::as_str)
    }
}

/// One composed sub-fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFleet {
    pub name: String,
    /// Sub-fleet names from the root down to and including this one
    pub fleet_path: Vec<String>,
    pub config_path: PathBuf,
}

/// A fully resolved agent. Immutable; a reload produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAgent {
    pub name: String,
    /// Sub-fleet names from the root to the defining fleet (root excluded)
    pub fleet_path: Vec<String>,
    /// `sub.agent`, or just `agent` for root agents
    pub qualified_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Document the agent was defined in
    pub config_path: PathBuf,
    pub working_directory: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub invocation: Invocation,
    pub env: IndexMap<String, String>,
    pub schedules: IndexMap<String, Schedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerConfig>,
    pub chat: IndexMap<String, ChatBinding>,
    pub hooks: HooksConfig,
    pub session: SessionConfig,
}

impl ResolvedAgent {
    pub fn schedule(&self, name: &str) -> Option<&Schedule> {
        self.schedules.get(name)
    }

    pub fn is_containerized(&self) -> bool {
        self.docker.is_some()
    }
}

/// How a job's execution unit is launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Invocation {
    /// `sh -c <command>` with the prompt in `FLEET_PROMPT`
    Command { command: String },
    /// Agent runtime CLI invoked with the prompt
    Runtime(RuntimeOptions),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeOptions {
    pub program: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_mode: Option<String>,
    pub allowed_tools: Vec<String>,
    pub denied_tools: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<u32>,
}

/// Container isolation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DockerConfig {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    pub mounts: Vec<String>,
    pub env: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatBinding {
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HooksConfig {
    pub after_run: Vec<Hook>,
    pub on_error: Vec<Hook>,
}

impl HooksConfig {
    pub fn is_empty(&self) -> bool {
        self.after_run.is_empty() && self.on_error.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hook {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub run: String,
    pub timeout: Duration,
}

impl Hook {
    /// Name for logs: the explicit name, else the command.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.run)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
    pub max_age: Duration,
    pub resume: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_age: DEFAULT_SESSION_MAX_AGE, resume: true }
    }
}
