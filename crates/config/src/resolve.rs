// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent resolution: merge defaults, type-check, and resolve paths and schedules.

use crate::compose::{canonical, read_document, resolve_path, FleetNode};
use crate::error::ConfigError;
use crate::interpolate::VarSource;
use crate::merge::{merge_agent_config, merge_values};
use crate::resolved::{
    ChatBinding, DockerConfig, Hook, HooksConfig, Invocation, ResolvedAgent, ResolvedConfig,
    ResolvedFleet, RuntimeOptions, SessionConfig, DEFAULT_HOOK_TIMEOUT, DEFAULT_RUNTIME,
};
use crate::schedule::{CronExpr, Schedule, ScheduleKind};
use crate::schema::{AgentDef, AgentEntry, HookDef, ScheduleDef, ScheduleType};
use crate::validate::{is_valid_agent_name, Issues};
use fleet_core::parse_duration;
use indexmap::IndexMap;
use serde_yml::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Flatten composed fleet nodes into a single validated configuration.
pub fn resolve(nodes: Vec<FleetNode>, vars: &impl VarSource) -> Result<ResolvedConfig, ConfigError> {
    let mut issues = Issues::new();
    let mut agents: IndexMap<String, ResolvedAgent> = IndexMap::new();

    for node in &nodes {
        if let Some(Value::Mapping(defaults)) = &node.doc.defaults {
            for key in ["name", "path"] {
                if defaults.contains_key(key) {
                    issues.push(
                        format!("{}: defaults.{}", node.path.display(), key),
                        "not allowed in defaults",
                    );
                }
            }
        }

        for (index, entry) in node.doc.agents.iter().enumerate() {
            let (value, defined_in) = match entry {
                AgentEntry::Inline(value) => (value.clone(), node.path.clone()),
                AgentEntry::Reference(reference) => {
                    let path = canonical(&resolve_path(node.dir(), &reference.path))?;
                    let value = read_document(&path, vars)?;
                    let value = match &reference.overrides {
                        Some(overrides) => merge_values(&value, overrides),
                        None => value,
                    };
                    (value, path)
                }
            };

            let merged = merge_agent_config(&node.defaults, &value);
            let def: AgentDef = match serde_yml::from_value(merged) {
                Ok(def) => def,
                Err(e) => {
                    issues.push(format!("{}: agents[{}]", node.path.display(), index), e.to_string());
                    continue;
                }
            };

            let agent = resolve_agent(def, node, &defined_in, &mut issues);
            if let Some(existing) = agents.get(&agent.name) {
                return Err(ConfigError::FleetNameCollision {
                    kind: "agent",
                    name: agent.name.clone(),
                    first: existing.config_path.display().to_string(),
                    second: agent.config_path.display().to_string(),
                });
            }
            agents.insert(agent.name.clone(), agent);
        }
    }

    let mut nodes = nodes.into_iter();
    let Some(root) = nodes.next() else {
        return Err(ConfigError::SchemaValidation { issues: Vec::new() });
    };
    let fleets = nodes
        .map(|node| ResolvedFleet { name: node.name, fleet_path: node.fleet_path, config_path: node.path })
        .collect();

    issues.finish(ResolvedConfig {
        config_path: root.path,
        name: root.name,
        description: root.doc.fleet.description,
        web: root.doc.web,
        fleets,
        agents,
    })
}

fn resolve_agent(
    def: AgentDef,
    node: &FleetNode,
    defined_in: &Path,
    issues: &mut Issues,
) -> ResolvedAgent {
    let location = format!("{}: agents[{}]", defined_in.display(), def.name);
    if !is_valid_agent_name(&def.name) {
        issues.push(&location, format!("invalid agent name '{}'", def.name));
    }

    let doc_dir = defined_in.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let working_directory = match &def.working_directory {
        Some(dir) => resolve_path(&doc_dir, dir),
        None => doc_dir,
    };

    let invocation = match (def.command, def.runtime) {
        (Some(_), Some(_)) => {
            issues.push(&location, "`command` and `runtime` are mutually exclusive");
            Invocation::Command { command: String::new() }
        }
        (Some(command), None) => Invocation::Command { command },
        (None, runtime) => Invocation::Runtime(RuntimeOptions {
            program: runtime.unwrap_or_else(|| DEFAULT_RUNTIME.to_string()),
            model: def.model,
            permission_mode: def.permission_mode,
            allowed_tools: def.allowed_tools,
            denied_tools: def.denied_tools,
            max_turns: def.max_turns,
        }),
    };

    let mut schedules = IndexMap::new();
    for (name, schedule) in def.schedules {
        let at = format!("{location}.schedules.{name}");
        if let Some(resolved) = resolve_schedule(&name, schedule, &at, issues) {
            schedules.insert(name, resolved);
        }
    }

    let docker = def.docker.filter(|d| d.enabled != Some(false)).map(|d| {
        let image = d.image.unwrap_or_default();
        if image.trim().is_empty() {
            issues.push(format!("{location}.docker.image"), "container image must not be empty");
        }
        DockerConfig {
            image,
            network: d.network,
            memory: d.memory,
            mounts: d.mounts,
            env: d.env,
            workdir: d.workdir,
        }
    });

    let chat = def
        .chat
        .into_iter()
        .map(|(platform, chat)| (platform, ChatBinding { channels: chat.channels }))
        .collect();

    let hooks = HooksConfig {
        after_run: resolve_hooks(def.hooks.after_run, &format!("{location}.hooks.after_run"), issues),
        on_error: resolve_hooks(def.hooks.on_error, &format!("{location}.hooks.on_error"), issues),
    };

    let mut session = SessionConfig::default();
    if let Some(max_age) = def.session.max_age {
        match parse_positive(&max_age) {
            Ok(d) => session.max_age = d,
            Err(e) => issues.push(format!("{location}.session.max_age"), e),
        }
    }
    if let Some(resume) = def.session.resume {
        session.resume = resume;
    }

    let qualified_name = if node.fleet_path.is_empty() {
        def.name.clone()
    } else {
        format!("{}.{}", node.fleet_path.join("."), def.name)
    };

    ResolvedAgent {
        name: def.name,
        fleet_path: node.fleet_path.clone(),
        qualified_name,
        description: def.description,
        config_path: defined_in.to_path_buf(),
        working_directory,
        prompt: def.prompt,
        invocation,
        env: def.env,
        schedules,
        docker,
        chat,
        hooks,
        session,
    }
}

fn resolve_schedule(
    name: &str,
    def: ScheduleDef,
    location: &str,
    issues: &mut Issues,
) -> Option<Schedule> {
    if !is_valid_agent_name(name) {
        issues.push(location, format!("invalid schedule name '{name}'"));
    }
    let kind = match def.kind {
        ScheduleType::Interval => match def.interval.as_deref() {
            None => {
                issues.push(location, "interval schedules require `interval`");
                return None;
            }
            Some(raw) => match parse_positive(raw) {
                Ok(every) => ScheduleKind::Interval { every },
                Err(e) => {
                    issues.push(format!("{location}.interval"), e);
                    return None;
                }
            },
        },
        ScheduleType::Cron => match def.expression.as_deref() {
            None => {
                issues.push(location, "cron schedules require `expression`");
                return None;
            }
            Some(raw) => match CronExpr::parse(raw) {
                Ok(expression) => ScheduleKind::Cron { expression },
                Err(e) => {
                    issues.push(format!("{location}.expression"), format!("invalid cron expression '{raw}': {e}"));
                    return None;
                }
            },
        },
        ScheduleType::Manual => ScheduleKind::Manual,
    };
    Some(Schedule {
        name: name.to_string(),
        kind,
        prompt: def.prompt,
        enabled: def.enabled.unwrap_or(true),
    })
}

fn resolve_hooks(defs: Vec<HookDef>, location: &str, issues: &mut Issues) -> Vec<Hook> {
    defs.into_iter()
        .enumerate()
        .map(|(i, def)| {
            let timeout = match def.timeout.as_deref().map(parse_positive) {
                None => DEFAULT_HOOK_TIMEOUT,
                Some(Ok(d)) => d,
                Some(Err(e)) => {
                    issues.push(format!("{location}[{i}].timeout"), e);
                    DEFAULT_HOOK_TIMEOUT
                }
            };
            Hook { name: def.name, run: def.run, timeout }
        })
        .collect()
}

fn parse_positive(raw: &str) -> Result<Duration, String> {
    let d = parse_duration(raw)?;
    if d.is_zero() {
        return Err(format!("duration '{raw}' must be greater than zero"));
    }
    Ok(d)
}
