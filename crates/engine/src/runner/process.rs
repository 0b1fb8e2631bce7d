// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawning and signalling execution units.
//!
//! Local units run as the leader of their own process group so a signal
//! reaches every descendant. Container units are signalled through the
//! docker CLI by container name.

use super::invocation::CommandSpec;
use crate::error::RunnerError;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// How hard to stop an execution unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// SIGTERM / `docker kill --signal TERM`
    Graceful,
    /// SIGKILL / `docker kill`
    Forced,
}

/// A spawned execution unit.
pub struct Execution {
    pub child: Child,
    pgid: Option<Pid>,
    container: Option<String>,
}

impl Execution {
    pub fn spawn(spec: &CommandSpec) -> Result<Self, RunnerError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|source| RunnerError::Spawn { program: spec.program.clone(), source })?;
        let pgid = child.id().and_then(|pid| i32::try_from(pid).ok()).map(Pid::from_raw);
        Ok(Self { child, pgid, container: spec.container.clone() })
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    /// Send a stop request. Errors are logged; the caller decides from the
    /// unit's exit whether it worked.
    pub async fn terminate(&mut self, how: Termination) {
        if let Some(name) = &self.container {
            let mut args = vec!["kill"];
            if how == Termination::Graceful {
                args.extend(["--signal", "TERM"]);
            }
            args.push(name);
            match Command::new("docker").args(&args).output().await {
                Ok(out) if out.status.success() => {}
                Ok(out) => tracing::warn!(
                    container = %name,
                    stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                    "docker kill failed"
                ),
                Err(e) => tracing::warn!(container = %name, error = %e, "failed to exec docker kill"),
            }
            if how == Termination::Graceful {
                return;
            }
        }

        let signal = match how {
            Termination::Graceful => Signal::SIGTERM,
            Termination::Forced => Signal::SIGKILL,
        };
        match self.pgid {
            Some(pgid) => {
                if let Err(e) = killpg(pgid, signal) {
                    tracing::debug!(pgid = pgid.as_raw(), %signal, error = %e, "killpg failed");
                }
            }
            None => {
                if how == Termination::Forced {
                    let _ = self.child.start_kill();
                }
            }
        }
    }
}

/// Describe an exit status for job error messages.
pub fn describe_exit(status: std::process::ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match (status.code(), status.signal()) {
        (Some(code), _) => format!("exited with code {code}"),
        (None, Some(signal)) => format!("terminated by signal {signal}"),
        (None, None) => "exited abnormally".to_string(),
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
