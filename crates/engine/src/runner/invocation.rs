// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command lines for a job's execution unit.

use fleet_config::{DockerConfig, Invocation, ResolvedAgent, RuntimeOptions};
use fleet_core::JobMetadata;
use indexmap::IndexMap;
use std::path::PathBuf;

/// Container name for a job; also recorded as the job's container id.
pub fn container_name(job: &JobMetadata) -> String {
    format!("fleet-{}", job.id)
}

/// A fully built process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Environment for the spawned process (on top of the daemon's own)
    pub env: Vec<(String, String)>,
    pub cwd: PathBuf,
    /// Set when the unit runs in a container
    pub container: Option<String>,
}

/// Build the invocation for `job`.
///
/// `resume` is a runtime session id to continue, already validated.
pub fn build_command(
    agent: &ResolvedAgent,
    job: &JobMetadata,
    prompt: Option<&str>,
    resume: Option<&str>,
) -> CommandSpec {
    let mut env = job_env(agent, job);
    let (program, args) = match &agent.invocation {
        Invocation::Command { command } => {
            if let Some(prompt) = prompt {
                env.push(("FLEET_PROMPT".to_string(), prompt.to_string()));
            }
            ("sh".to_string(), vec!["-c".to_string(), command.clone()])
        }
        Invocation::Runtime(runtime) => (runtime.program.clone(), runtime_args(runtime, prompt, resume)),
    };

    match &agent.docker {
        None => CommandSpec { program, args, env, cwd: agent.working_directory.clone(), container: None },
        Some(docker) => {
            let name = container_name(job);
            // Values travel in the docker CLI's environment, never its argv.
            let mut merged: IndexMap<String, String> = env.into_iter().collect();
            merged.extend(docker.env.iter().map(|(k, v)| (k.clone(), v.clone())));
            let args = docker_args(docker, &name, merged.keys(), program, args);
            CommandSpec {
                program: "docker".to_string(),
                args,
                env: merged.into_iter().collect(),
                cwd: agent.working_directory.clone(),
                container: Some(name),
            }
        }
    }
}

/// `FLEET_*` job context followed by the agent's own env.
fn job_env(agent: &ResolvedAgent, job: &JobMetadata) -> Vec<(String, String)> {
    let mut env = vec![
        ("FLEET_JOB_ID".to_string(), job.id.to_string()),
        ("FLEET_AGENT".to_string(), agent.name.clone()),
        ("FLEET_SCHEDULE".to_string(), job.schedule.clone()),
    ];
    env.extend(agent.env.iter().map(|(k, v)| (k.clone(), v.clone())));
    env
}

fn runtime_args(runtime: &RuntimeOptions, prompt: Option<&str>, resume: Option<&str>) -> Vec<String> {
    let mut args = vec!["--print".to_string()];
    args.push(prompt.unwrap_or_default().to_string());
    args.extend(["--output-format".to_string(), "stream-json".to_string(), "--verbose".to_string()]);
    if let Some(model) = &runtime.model {
        args.extend(["--model".to_string(), model.clone()]);
    }
    if let Some(mode) = &runtime.permission_mode {
        args.extend(["--permission-mode".to_string(), mode.clone()]);
    }
    if !runtime.allowed_tools.is_empty() {
        args.extend(["--allowedTools".to_string(), runtime.allowed_tools.join(",")]);
    }
    if !runtime.denied_tools.is_empty() {
        args.extend(["--disallowedTools".to_string(), runtime.denied_tools.join(",")]);
    }
    if let Some(turns) = runtime.max_turns {
        args.extend(["--max-turns".to_string(), turns.to_string()]);
    }
    if let Some(session) = resume {
        args.extend(["--resume".to_string(), session.to_string()]);
    }
    args
}

fn docker_args<'a>(
    docker: &DockerConfig,
    name: &str,
    env_keys: impl IntoIterator<Item = &'a String>,
    program: String,
    inner: Vec<String>,
) -> Vec<String> {
    let mut args = vec!["run".to_string(), "--rm".to_string(), "--name".to_string(), name.to_string()];
    if let Some(network) = &docker.network {
        args.extend(["--network".to_string(), network.clone()]);
    }
    if let Some(memory) = &docker.memory {
        args.extend(["--memory".to_string(), memory.clone()]);
    }
    for mount in &docker.mounts {
        args.extend(["-v".to_string(), mount.clone()]);
    }
    for key in env_keys {
        args.extend(["-e".to_string(), key.clone()]);
    }
    if let Some(workdir) = &docker.workdir {
        args.extend(["-w".to_string(), workdir.clone()]);
    }
    args.push(docker.image.clone());
    args.push(program);
    args.extend(inner);
    args
}

#[cfg(test)]
#[path = "invocation_tests.rs"]
mod tests;
