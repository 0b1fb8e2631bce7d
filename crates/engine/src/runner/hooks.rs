// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-job hooks.
//!
//! Hooks never affect the job they follow: failures and timeouts are
//! logged and reported back only for inspection.

use fleet_config::Hook;
use fleet_core::JobMetadata;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookResult {
    Succeeded,
    Failed { exit_code: i32, stderr: String },
    TimedOut,
    SpawnFailed(String),
}

/// Environment describing the finished job.
pub fn hook_env(job: &JobMetadata) -> Vec<(String, String)> {
    let mut env = vec![
        ("FLEET_JOB_ID".to_string(), job.id.to_string()),
        ("FLEET_AGENT".to_string(), job.agent.clone()),
        ("FLEET_SCHEDULE".to_string(), job.schedule.clone()),
        ("FLEET_JOB_STATUS".to_string(), job.status.to_string()),
    ];
    if let Some(code) = job.exit_code {
        env.push(("FLEET_EXIT_CODE".to_string(), code.to_string()));
    }
    if let Some(error) = &job.error {
        env.push(("FLEET_JOB_ERROR".to_string(), error.clone()));
    }
    if let Some(duration) = job.duration_seconds() {
        env.push(("FLEET_DURATION_SECONDS".to_string(), format!("{duration:.3}")));
    }
    env
}

/// Run `hooks` in order with the job's context.
pub async fn run_hooks(hooks: &[Hook], job: &JobMetadata, cwd: &Path) -> Vec<HookResult> {
    let env = hook_env(job);
    let mut results = Vec::with_capacity(hooks.len());
    for hook in hooks {
        let result = run_hook(hook, &env, cwd).await;
        match &result {
            HookResult::Succeeded => {
                tracing::debug!(job_id = %job.id, hook = hook.label(), "hook succeeded")
            }
            HookResult::Failed { exit_code, stderr } => tracing::warn!(
                job_id = %job.id,
                hook = hook.label(),
                exit_code,
                stderr = %stderr,
                "hook failed"
            ),
            HookResult::TimedOut => tracing::warn!(
                job_id = %job.id,
                hook = hook.label(),
                timeout_ms = hook.timeout.as_millis() as u64,
                "hook timed out"
            ),
            HookResult::SpawnFailed(e) => {
                tracing::warn!(job_id = %job.id, hook = hook.label(), error = %e, "hook spawn failed")
            }
        }
        results.push(result);
    }
    results
}

async fn run_hook(hook: &Hook, env: &[(String, String)], cwd: &Path) -> HookResult {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(&hook.run)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match tokio::time::timeout(hook.timeout, cmd.output()).await {
        Err(_) => HookResult::TimedOut,
        Ok(Err(e)) => HookResult::SpawnFailed(e.to_string()),
        Ok(Ok(output)) if output.status.success() => HookResult::Succeeded,
        Ok(Ok(output)) => HookResult::Failed {
            exit_code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        },
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
