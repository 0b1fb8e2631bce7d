// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet definition document schema.
//!
//! These are the shapes as written in YAML. Agents stay untyped until
//! defaults have been merged into them, then deserialize into [`AgentDef`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yml::Value;

/// Supported document format version.
pub const FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    FORMAT_VERSION
}

/// One fleet definition document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub fleet: FleetMeta,
    /// Agent fields applied beneath every agent in this fleet and its sub-fleets
    #[serde(default)]
    pub defaults: Option<Value>,
    #[serde(default)]
    pub web: Option<WebConfig>,
    #[serde(default)]
    pub fleets: Vec<FleetRef>,
    #[serde(default)]
    pub agents: Vec<AgentEntry>,
}

/// Fleet identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Dashboard options. Consumed by external collaborators only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

fn default_web_host() -> String {
    "127.0.0.1".to_string()
}

fn default_web_port() -> u16 {
    3232
}

/// Reference to a nested fleet document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetRef {
    pub path: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// An `agents[]` entry: a reference to an agent file, or an inline definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AgentEntry {
    Reference(AgentRef),
    Inline(Value),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentRef {
    pub path: String,
    /// Deep-merged on top of the referenced file
    #[serde(default)]
    pub overrides: Option<Value>,
}

/// A fully merged agent, prior to path and schedule resolution.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    /// Shell command run instead of the runtime CLI
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub permission_mode: Option<String>,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    #[serde(default)]
    pub denied_tools: Vec<String>,
    #[serde(default)]
    pub max_turns: Option<u32>,
    #[serde(default)]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub schedules: IndexMap<String, ScheduleDef>,
    #[serde(default)]
    pub docker: Option<DockerDef>,
    #[serde(default)]
    pub chat: IndexMap<String, ChatDef>,
    #[serde(default)]
    pub hooks: HooksDef,
    #[serde(default)]
    pub session: SessionDef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    Interval,
    Cron,
    Manual,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleDef {
    #[serde(rename = "type")]
    pub kind: ScheduleType,
    /// Duration string for interval schedules (`5m`, `1h30m`)
    #[serde(default)]
    pub interval: Option<String>,
    /// Cron expression for cron schedules
    #[serde(default)]
    pub expression: Option<String>,
    /// Overrides the agent prompt for jobs from this schedule
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DockerDef {
    /// Isolation is on when the block is present unless this is `false`
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub memory: Option<String>,
    /// `host:container[:ro]` bind mounts
    #[serde(default)]
    pub mounts: Vec<String>,
    #[serde(default)]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub workdir: Option<String>,
}

/// Chat platform binding (keyed by platform name).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatDef {
    #[serde(default)]
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HooksDef {
    #[serde(default)]
    pub after_run: Vec<HookDef>,
    #[serde(default)]
    pub on_error: Vec<HookDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookDef {
    pub run: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionDef {
    /// Sessions idle longer than this start fresh
    #[serde(default)]
    pub max_age: Option<String>,
    #[serde(default)]
    pub resume: Option<bool>,
}
