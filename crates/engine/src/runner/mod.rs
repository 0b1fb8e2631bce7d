// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job execution.
//!
//! A job moves `pending -> running -> completed | failed | cancelled`.
//! [`JobRunner::start`] creates the record and spawns the execution unit;
//! a per-job supervisor task streams output, waits for exit or
//! cancellation, and records the terminal state. At most one job per
//! agent is live at a time.

mod hooks;
mod invocation;
mod process;
mod stream;

pub use hooks::{hook_env, run_hooks, HookResult};
pub use invocation::{build_command, container_name, CommandSpec};
pub use process::{describe_exit, Execution, Termination};
pub use stream::StreamSummary;
use stream::append_with_retry;

use crate::error::RunnerError;
use crate::events::EventBus;
use fleet_config::{Invocation, ResolvedAgent};
use fleet_core::{
    AgentStateUpdate, Clock, FleetEvent, JobId, JobMetadata, JobOutputRecord, JobStatus, JobUpdate,
    OutputSource, SessionInfo, SessionMode, TerminationType,
};
use fleet_storage::{
    is_session_expired_error, validate_session, validate_session_with_file_check,
    ContainerSessionCheck, LocalSessionCheck, NewJob, StateStore,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

/// How long to wait for a unit to die after a forced kill.
const KILL_CONFIRM_TIMEOUT: Duration = Duration::from_secs(5);
/// How long to wait for output to drain after the unit exits.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Session store key for an agent's default session.
pub fn session_key(agent: &str) -> String {
    format!("agent-{agent}")
}

/// A request to run one job.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub agent: ResolvedAgent,
    /// Originating schedule name, or `manual`
    pub schedule: String,
    pub prompt: Option<String>,
}

struct LiveJob {
    job_id: Option<JobId>,
    cancel: CancellationToken,
    grace: Arc<Mutex<Duration>>,
}

struct Inner<C: Clock> {
    store: Arc<StateStore>,
    events: EventBus,
    clock: C,
    /// Keyed by agent name
    live: Mutex<HashMap<String, LiveJob>>,
    finished: Notify,
}

impl<C: Clock> Inner<C> {
    fn release(&self, agent: &str) {
        self.live.lock().remove(agent);
        self.finished.notify_waiters();
    }
}

pub struct JobRunner<C: Clock> {
    inner: Arc<Inner<C>>,
}

impl<C: Clock> Clone for JobRunner<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

/// How the supervisor's wait ended.
enum Exit {
    Exited(std::io::Result<std::process::ExitStatus>),
    Cancelled(TerminationType),
    OutputFailed,
}

impl<C: Clock> JobRunner<C> {
    pub fn new(store: Arc<StateStore>, events: EventBus, clock: C) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                events,
                clock,
                live: Mutex::new(HashMap::new()),
                finished: Notify::new(),
            }),
        }
    }

    /// Whether `agent` has a live job in this process.
    pub fn is_busy(&self, agent: &str) -> bool {
        self.inner.live.lock().contains_key(agent)
    }

    pub fn running_jobs(&self) -> Vec<JobId> {
        self.inner.live.lock().values().filter_map(|j| j.job_id.clone()).collect()
    }

    pub fn running_count(&self) -> usize {
        self.inner.live.lock().len()
    }

    /// Create a job and launch its execution unit.
    ///
    /// Returns the job record as of launch. A unit that cannot be spawned,
    /// or whose start cannot be recorded, yields a `failed` job rather than
    /// an error; errors here mean the agent was busy or the job could not
    /// be created.
    pub fn start(&self, request: JobRequest) -> Result<JobMetadata, RunnerError> {
        let JobRequest { agent, schedule, prompt } = request;
        let cancel = CancellationToken::new();
        let grace = Arc::new(Mutex::new(Duration::ZERO));
        {
            let mut live = self.inner.live.lock();
            if live.contains_key(&agent.name) {
                return Err(RunnerError::AgentBusy(agent.name.clone()));
            }
            live.insert(
                agent.name.clone(),
                LiveJob { job_id: None, cancel: cancel.clone(), grace: Arc::clone(&grace) },
            );
        }

        match self.launch(agent, schedule, prompt, cancel, grace) {
            Ok(job) => Ok(job),
            Err((agent, e)) => {
                self.inner.release(&agent);
                Err(e)
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn launch(
        &self,
        agent: ResolvedAgent,
        schedule: String,
        prompt: Option<String>,
        cancel: CancellationToken,
        grace: Arc<Mutex<Duration>>,
    ) -> Result<JobMetadata, (String, RunnerError)> {
        let store = &self.inner.store;
        let now = self.inner.clock.now();
        let new = NewJob { agent: agent.name.clone(), schedule, prompt: prompt.clone() };
        let job = store.create_job(new, now).map_err(|e| (agent.name.clone(), e.into()))?;
        if let Some(entry) = self.inner.live.lock().get_mut(&agent.name) {
            entry.job_id = Some(job.id.clone());
        }
        tracing::info!(job_id = %job.id, agent = %agent.name, schedule = %job.schedule, "job created");
        self.inner.events.emit(FleetEvent::JobCreated { job: Box::new(job.clone()) });

        let resume = self.resume_session(&agent);
        let spec = build_command(&agent, &job, prompt.as_deref(), resume.as_deref());
        let execution = match Execution::spawn(&spec) {
            Ok(execution) => execution,
            Err(e) => {
                tracing::error!(job_id = %job.id, agent = %agent.name, error = %e, "job spawn failed");
                let failed = self.fail_unstarted(&agent, job, e.to_string());
                return Ok(failed);
            }
        };

        let update = JobUpdate::new()
            .status(JobStatus::Running)
            .started_at(now)
            .container_id(execution.container().map(str::to_string));
        let job = match store.update_job(&job.id, &update) {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(
                    job_id = %job.id,
                    agent = %agent.name,
                    error = %e,
                    "failed to record job start"
                );
                let error = format!("failed to record job start: {e}");
                return Ok(self.abandon(&agent, job, execution, error));
            }
        };
        let agent_update = AgentStateUpdate::started(&job.id, now)
            .container_id(execution.container().map(str::to_string));
        if let Err(e) = store.update_agent_state(&agent.name, &agent_update) {
            tracing::warn!(agent = %agent.name, error = %e, "failed to record agent start");
        }
        tracing::info!(
            job_id = %job.id,
            agent = %agent.name,
            program = %spec.program,
            container = spec.container.as_deref().unwrap_or("-"),
            "job started"
        );

        let inner = Arc::clone(&self.inner);
        let started = job.clone();
        tokio::spawn(async move {
            supervise(inner, agent, started, execution, cancel, grace).await;
        });
        Ok(job)
    }

    /// Kill a unit that was spawned but never supervised, then fail its job.
    fn abandon(
        &self,
        agent: &ResolvedAgent,
        job: JobMetadata,
        mut execution: Execution,
        error: String,
    ) -> JobMetadata {
        let job_id = job.id.clone();
        tokio::spawn(async move {
            stop_unit(&mut execution, Duration::ZERO).await;
            tracing::info!(job_id = %job_id, "abandoned execution unit killed");
        });
        self.fail_unstarted(agent, job, error)
    }

    /// Record a job whose unit never started.
    fn fail_unstarted(&self, agent: &ResolvedAgent, job: JobMetadata, error: String) -> JobMetadata {
        let inner = &self.inner;
        let now = inner.clock.now();
        let update = JobUpdate::new().status(JobStatus::Failed).ended_at(now).error(error.clone());
        let job = match inner.store.update_job(&job.id, &update) {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "failed to record spawn failure");
                let mut job = job;
                job.apply(&update);
                job
            }
        };
        let agent_update =
            AgentStateUpdate::finished(&job.id, Some(error.clone())).last_run_at(Some(now));
        if let Err(e) = inner.store.patch_agent_state(&agent.name, &agent_update) {
            tracing::warn!(agent = %agent.name, error = %e, "failed to record agent failure");
        }
        inner.release(&agent.name);
        inner.events.emit(FleetEvent::JobFailed { job: Box::new(job.clone()), error });

        if !agent.hooks.is_empty() {
            let agent = agent.clone();
            let finished = job.clone();
            tokio::spawn(async move { run_finish_hooks(&agent, &finished).await });
        }
        job
    }

    /// Request cancellation of a live job with `grace` before a forced kill.
    ///
    /// Returns false if the job is not live here (unknown or already
    /// terminal); cancelling twice is harmless.
    pub fn cancel(&self, id: &JobId, grace: Duration) -> bool {
        let live = self.inner.live.lock();
        let Some(entry) = live.values().find(|j| j.job_id.as_ref() == Some(id)) else {
            return false;
        };
        if !entry.cancel.is_cancelled() {
            *entry.grace.lock() = grace;
            tracing::info!(job_id = %id, grace_ms = grace.as_millis() as u64, "cancelling job");
            entry.cancel.cancel();
        }
        true
    }

    /// Cancel every live job. Returns the ids asked to stop.
    pub fn cancel_all(&self, grace: Duration) -> Vec<JobId> {
        let ids = self.running_jobs();
        for id in &ids {
            self.cancel(id, grace);
        }
        ids
    }

    /// Wait until no job is live, up to `timeout`. Returns whether that
    /// happened in time.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.inner.finished.notified();
            if self.inner.live.lock().is_empty() {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.inner.live.lock().is_empty();
            }
        }
    }

    /// Previously recorded session for the agent, if it can be resumed.
    fn resume_session(&self, agent: &ResolvedAgent) -> Option<String> {
        if !agent.session.resume || !matches!(agent.invocation, Invocation::Runtime(_)) {
            return None;
        }
        let key = session_key(&agent.name);
        let sessions = self.inner.store.sessions();
        let info = match sessions.get(&key) {
            Ok(info) => info?,
            Err(e) => {
                tracing::warn!(agent = %agent.name, error = %e, "unreadable session record");
                return None;
            }
        };
        let now = self.inner.clock.now();
        let max_age = agent.session.max_age;
        let verdict = if agent.is_containerized() {
            validate_session_with_file_check(&info, max_age, now, &ContainerSessionCheck)
        } else {
            match LocalSessionCheck::for_working_dir(&agent.working_directory) {
                Some(artifacts) => validate_session_with_file_check(&info, max_age, now, &artifacts),
                None => validate_session(&info, max_age, now),
            }
        };
        match verdict {
            Ok(()) => Some(info.session_id),
            Err(fault) => {
                tracing::info!(agent = %agent.name, %fault, "starting a fresh session");
                if let Err(e) = sessions.clear(&key) {
                    tracing::warn!(agent = %agent.name, error = %e, "failed to clear session");
                }
                None
            }
        }
    }
}

async fn supervise<C: Clock>(
    inner: Arc<Inner<C>>,
    agent: ResolvedAgent,
    job: JobMetadata,
    mut execution: Execution,
    cancel: CancellationToken,
    grace: Arc<Mutex<Duration>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    if let Some(stdout) = execution.child.stdout.take() {
        tokio::spawn(stream::pump(stdout, OutputSource::Stdout, inner.clock.clone(), tx.clone()));
    }
    if let Some(stderr) = execution.child.stderr.take() {
        tokio::spawn(stream::pump(stderr, OutputSource::Stderr, inner.clock.clone(), tx.clone()));
    }
    drop(tx);
    let output_failed = CancellationToken::new();
    let writer = tokio::spawn(stream::write_output(
        Arc::clone(&inner.store),
        job.id.clone(),
        rx,
        output_failed.clone(),
    ));

    let exit = tokio::select! {
        status = execution.child.wait() => Exit::Exited(status),
        _ = cancel.cancelled() => {
            let grace = *grace.lock();
            Exit::Cancelled(stop_unit(&mut execution, grace).await)
        }
        _ = output_failed.cancelled() => {
            stop_unit(&mut execution, Duration::ZERO).await;
            Exit::OutputFailed
        }
    };

    let summary = match tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, writer).await {
        Ok(Ok(Ok(summary))) => Ok(summary),
        Ok(Ok(Err(e))) => Err(e.to_string()),
        Ok(Err(join)) => Err(format!("output writer panicked: {join}")),
        Err(_) => {
            tracing::warn!(job_id = %job.id, "output did not drain after exit");
            Ok(StreamSummary::default())
        }
    };

    finish(&inner, &agent, job, exit, summary).await;
}

/// Graceful stop, escalating to a forced kill after `grace`.
async fn stop_unit(execution: &mut Execution, grace: Duration) -> TerminationType {
    if !grace.is_zero() {
        execution.terminate(Termination::Graceful).await;
        if tokio::time::timeout(grace, execution.child.wait()).await.is_ok() {
            return TerminationType::Graceful;
        }
    }
    execution.terminate(Termination::Forced).await;
    if tokio::time::timeout(KILL_CONFIRM_TIMEOUT, execution.child.wait()).await.is_err() {
        tracing::error!("execution unit survived a forced kill");
    }
    TerminationType::Forced
}

async fn finish<C: Clock>(
    inner: &Inner<C>,
    agent: &ResolvedAgent,
    job: JobMetadata,
    exit: Exit,
    summary: Result<StreamSummary, String>,
) {
    let now = inner.clock.now();
    let (summary, output_error) = match summary {
        Ok(summary) => (summary, None),
        Err(e) => (StreamSummary::default(), Some(e)),
    };

    let mut update = JobUpdate::new().ended_at(now).container_id(None);
    let mut error = None;
    let mut termination = None;
    match exit {
        Exit::Cancelled(how) => {
            update = update.status(JobStatus::Cancelled).termination_type(how);
            termination = Some(how);
        }
        Exit::OutputFailed => {
            error = output_error.clone().or_else(|| Some("failed to record output".to_string()));
        }
        Exit::Exited(Ok(status)) => {
            if let Some(code) = status.code() {
                update = update.exit_code(code);
            }
            if !status.success() {
                error = Some(describe_exit(status));
            } else if let Some(e) = &output_error {
                error = Some(e.clone());
            }
        }
        Exit::Exited(Err(e)) => error = Some(format!("failed to wait for job: {e}")),
    }
    if termination.is_none() {
        update = match &error {
            Some(e) => update.status(JobStatus::Failed).error(e.clone()),
            None => update.status(JobStatus::Completed),
        };
    }
    if let Some(session) = &summary.session_id {
        update = update.session_id(session.clone());
    }

    let summary_line = match (&termination, &error) {
        (Some(how), _) => format!("job cancelled ({how})"),
        (None, Some(e)) => format!("job failed: {e}"),
        (None, None) => "job completed".to_string(),
    };
    if let Err(e) =
        append_with_retry(&inner.store, &job.id, &[JobOutputRecord::system(now, summary_line)]).await
    {
        tracing::warn!(job_id = %job.id, error = %e, "failed to record job summary");
    }

    let job = match inner.store.update_job(&job.id, &update) {
        Ok(job) => job,
        Err(e) => {
            tracing::error!(job_id = %job.id, error = %e, "failed to record job result");
            inner.events.emit(FleetEvent::Error { message: e.to_string() });
            let mut job = job;
            job.apply(&update);
            job
        }
    };
    let agent_update = AgentStateUpdate::finished(&job.id, error.clone());
    if let Err(e) = inner.store.patch_agent_state(&agent.name, &agent_update) {
        tracing::warn!(agent = %agent.name, error = %e, "failed to record agent finish");
    }
    record_session(inner, agent, &summary, error.as_deref());
    inner.release(&agent.name);

    match (termination, &error) {
        (Some(termination_type), _) => {
            tracing::info!(job_id = %job.id, agent = %agent.name, %termination_type, "job cancelled");
            inner.events.emit(FleetEvent::JobCancelled { job: Box::new(job.clone()), termination_type });
        }
        (None, Some(e)) => {
            tracing::warn!(job_id = %job.id, agent = %agent.name, error = %e, "job failed");
            inner.events.emit(FleetEvent::JobFailed { job: Box::new(job.clone()), error: e.clone() });
        }
        (None, None) => {
            let duration_seconds = job.duration_seconds().unwrap_or_default();
            tracing::info!(
                job_id = %job.id,
                agent = %agent.name,
                duration = %fleet_core::format_elapsed_ms((duration_seconds * 1000.0) as u64),
                "job completed"
            );
            inner.events.emit(FleetEvent::JobCompleted { job: Box::new(job.clone()), duration_seconds });
        }
    }

    run_finish_hooks(agent, &job).await;
}

/// Remember or drop the agent's runtime session after a job.
fn record_session<C: Clock>(
    inner: &Inner<C>,
    agent: &ResolvedAgent,
    summary: &StreamSummary,
    error: Option<&str>,
) {
    let sessions = inner.store.sessions();
    let key = session_key(&agent.name);
    let stale = summary.stderr_tail.iter().any(|l| is_session_expired_error(l))
        || error.is_some_and(is_session_expired_error);
    let result = match &summary.session_id {
        _ if stale => sessions.clear(&key).map(|_| ()),
        None => Ok(()),
        Some(id) => {
            let now = inner.clock.now();
            match sessions.get(&key) {
                Ok(Some(mut info)) if info.session_id == *id => {
                    info.touch(now);
                    sessions.put(&key, &info)
                }
                Ok(_) => {
                    let mut info = SessionInfo::new(id.clone(), SessionMode::Autonomous, now);
                    info.touch(now);
                    sessions.put(&key, &info)
                }
                Err(e) => Err(e),
            }
        }
    };
    if let Err(e) = result {
        tracing::warn!(agent = %agent.name, error = %e, "failed to record session");
    }
}

async fn run_finish_hooks(agent: &ResolvedAgent, job: &JobMetadata) {
    if job.status == JobStatus::Failed {
        run_hooks(&agent.hooks.on_error, job, &agent.working_directory).await;
    }
    run_hooks(&agent.hooks.after_run, job, &agent.working_directory).await;
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
