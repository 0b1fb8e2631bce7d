// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet manager: the composition root.
//!
//! Owns the active configuration, the state store, the scheduler, and the
//! job runner, and drives them through
//! `uninitialized -> initialized -> running -> stopping -> stopped`.

mod status;

pub use status::{AgentCounts, AgentInfo, FleetLifecycle, FleetStatus, SchedulerStatus};

use crate::error::{FleetError, RunnerError};
use crate::events::{EventBus, EventReceiver, EventSink};
use crate::runner::{JobRequest, JobRunner};
use crate::scheduler::{Scheduler, TickOutcome};
use fleet_config::{diff_configs, ResolvedConfig};
use fleet_core::{
    AgentStatus, Clock, ConfigChange, FleetEvent, JobId, JobMetadata, JobStatus, JobUpdate,
    SystemClock, MANUAL_TRIGGER, SKIP_AGENT_BUSY,
};
use fleet_storage::{FleetState, JobFilter, StateStore};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_CANCEL_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra time `stop` allows for forced kills to be confirmed.
const KILL_CONFIRM_BUDGET: Duration = Duration::from_secs(5);

/// Error recorded on jobs that were live when the previous process exited.
pub const INTERRUPTED_BY_RESTART: &str = "interrupted by restart";

/// State directory used when none is configured: `<config dir>/.fleet`.
pub fn default_state_dir(config_path: &Path) -> PathBuf {
    config_path.parent().unwrap_or(Path::new(".")).join(".fleet")
}

#[derive(Debug, Clone)]
pub struct FleetManagerOptions {
    /// Definition file, or a directory to search upward from
    pub config_path: PathBuf,
    /// Defaults to [`default_state_dir`] of the resolved definition file
    pub state_dir: Option<PathBuf>,
    pub tick_interval: Duration,
    /// Grace window for `cancel_job`
    pub cancel_timeout: Duration,
}

impl FleetManagerOptions {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            state_dir: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
            cancel_timeout: DEFAULT_CANCEL_TIMEOUT,
        }
    }

    fleet_core::setters! {
        set {
            tick_interval: Duration,
            cancel_timeout: Duration,
        }
        option {
            state_dir: PathBuf,
        }
    }
}

/// How `stop` drains running jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopOptions {
    /// How long to let jobs finish on their own
    pub timeout: Duration,
    pub cancel_on_timeout: bool,
    /// Grace window for cancellations issued after `timeout`
    pub cancel_timeout: Duration,
}

impl Default for StopOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_STOP_TIMEOUT,
            cancel_on_timeout: true,
            cancel_timeout: DEFAULT_CANCEL_TIMEOUT,
        }
    }
}

impl StopOptions {
    fleet_core::setters! {
        set {
            timeout: Duration,
            cancel_on_timeout: bool,
            cancel_timeout: Duration,
        }
    }
}

/// Store and runner, present once initialized.
struct Runtime<C: Clock> {
    store: Arc<StateStore>,
    runner: JobRunner<C>,
}

impl<C: Clock> Clone for Runtime<C> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), runner: self.runner.clone() }
    }
}

struct Inner<C: Clock> {
    options: FleetManagerOptions,
    clock: C,
    events: EventBus,
    lifecycle: Mutex<FleetLifecycle>,
    config: RwLock<Option<Arc<ResolvedConfig>>>,
    runtime: RwLock<Option<Runtime<C>>>,
    scheduler: Mutex<Scheduler>,
    tick_loop: Mutex<Option<CancellationToken>>,
}

pub struct FleetManager<C: Clock = SystemClock> {
    inner: Arc<Inner<C>>,
}

impl<C: Clock> Clone for FleetManager<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl FleetManager<SystemClock> {
    pub fn new(options: FleetManagerOptions) -> Self {
        Self::with_clock(options, SystemClock)
    }
}

impl<C: Clock> FleetManager<C> {
    pub fn with_clock(options: FleetManagerOptions, clock: C) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                clock,
                events: EventBus::new(),
                lifecycle: Mutex::new(FleetLifecycle::Uninitialized),
                config: RwLock::new(None),
                runtime: RwLock::new(None),
                scheduler: Mutex::new(Scheduler::new()),
                tick_loop: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> FleetLifecycle {
        *self.inner.lifecycle.lock()
    }

    pub fn config(&self) -> Option<Arc<ResolvedConfig>> {
        self.inner.config.read().clone()
    }

    pub fn store(&self) -> Option<Arc<StateStore>> {
        self.inner.runtime.read().as_ref().map(|rt| Arc::clone(&rt.store))
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.inner.events.subscribe()
    }

    pub fn register_sink(&self, sink: Arc<dyn EventSink>) -> tokio::task::JoinHandle<()> {
        self.inner.events.register_sink(sink)
    }

    fn runtime(&self, operation: &'static str) -> Result<Runtime<C>, FleetError> {
        self.inner
            .runtime
            .read()
            .clone()
            .ok_or_else(|| FleetError::InvalidState { operation, state: self.state() })
    }

    fn active_config(&self, operation: &'static str) -> Result<Arc<ResolvedConfig>, FleetError> {
        self.config().ok_or_else(|| FleetError::InvalidState { operation, state: self.state() })
    }

    /// Load configuration, open the state directory, and reconcile state.
    ///
    /// On failure the manager stays uninitialized.
    pub fn initialize(&self) -> Result<(), FleetError> {
        let state = self.state();
        if state != FleetLifecycle::Uninitialized {
            return Err(FleetError::InvalidState { operation: "initialize", state });
        }
        if let Err(e) = self.try_initialize() {
            tracing::error!(error = %e, "fleet initialization failed");
            return Err(FleetError::Initialization(Box::new(e)));
        }
        *self.inner.lifecycle.lock() = FleetLifecycle::Initialized;
        self.inner.events.emit(FleetEvent::Initialized);
        Ok(())
    }

    fn try_initialize(&self) -> Result<(), FleetError> {
        let now = self.inner.clock.now();
        let config = fleet_config::load_config(&self.inner.options.config_path)?;
        let state_dir = match &self.inner.options.state_dir {
            Some(dir) => dir.clone(),
            None => default_state_dir(&config.config_path),
        };
        let store = Arc::new(StateStore::open(&state_dir)?);

        let reconciled = store.fleet().reconcile(config.agent_names())?;
        recover_interrupted(&store, now)?;

        let mut scheduler = Scheduler::new();
        scheduler.reseed(&config, now);
        record_next_triggers(&store, &scheduler)?;

        tracing::info!(
            fleet = %config.name,
            state_dir = %state_dir.display(),
            agents = config.agents.len(),
            added = reconciled.added.len(),
            removed = reconciled.removed.len(),
            "fleet initialized"
        );
        let runner = JobRunner::new(Arc::clone(&store), self.inner.events.clone(), self.inner.clock.clone());
        *self.inner.scheduler.lock() = scheduler;
        *self.inner.config.write() = Some(Arc::new(config));
        *self.inner.runtime.write() = Some(Runtime { store, runner });
        Ok(())
    }

    /// Start the tick loop. Valid from `initialized` or `stopped`.
    pub fn start(&self) -> Result<(), FleetError> {
        let mut lifecycle = self.inner.lifecycle.lock();
        let state = *lifecycle;
        if !matches!(state, FleetLifecycle::Initialized | FleetLifecycle::Stopped) {
            return Err(FleetError::InvalidState { operation: "start", state });
        }
        // The lifecycle lock is held, so read the runtime directly.
        let invalid = || FleetError::InvalidState { operation: "start", state };
        let rt = self.inner.runtime.read().clone().ok_or_else(invalid)?;
        let now = self.inner.clock.now();
        rt.store.fleet().modify(|s| s.fleet.started_at = Some(now))?;
        if state == FleetLifecycle::Stopped {
            let config = self.inner.config.read().clone().ok_or_else(invalid)?;
            let mut scheduler = self.inner.scheduler.lock();
            scheduler.reseed(&config, now);
            record_next_triggers(&rt.store, &scheduler)?;
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let manager = self.clone();
        let period = self.inner.options.tick_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        manager.tick();
                    }
                }
            }
            tracing::debug!("tick loop exited");
        });
        if let Some(previous) = self.inner.tick_loop.lock().replace(token) {
            previous.cancel();
        }

        *lifecycle = FleetLifecycle::Running;
        drop(lifecycle);
        tracing::info!(tick_ms = period.as_millis() as u64, "fleet started");
        self.inner.events.emit(FleetEvent::Started);
        Ok(())
    }

    /// Evaluate every schedule once and launch due jobs.
    ///
    /// Called by the tick loop; public so hosts and tests can drive the
    /// scheduler directly. Does nothing unless the fleet is running.
    pub fn tick(&self) -> Vec<TickOutcome> {
        if self.state() != FleetLifecycle::Running {
            return Vec::new();
        }
        let (Ok(rt), Ok(config)) = (self.runtime("tick"), self.active_config("tick")) else {
            return Vec::new();
        };
        let now = self.inner.clock.now();
        let state = match rt.store.read_fleet_state() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "tick could not read fleet state");
                FleetState::default()
            }
        };

        let outcomes = {
            let mut scheduler = self.inner.scheduler.lock();
            let outcomes = scheduler.tick(now, |agent| {
                rt.runner.is_busy(agent) || state.agent(agent).is_some_and(|a| a.is_running())
            });
            if let Err(e) = record_next_triggers(&rt.store, &scheduler) {
                tracing::warn!(error = %e, "failed to record next triggers");
            }
            outcomes
        };

        for outcome in &outcomes {
            match outcome {
                TickOutcome::Triggered { agent, schedule, prompt } => {
                    let Some(resolved) = config.agent(agent) else { continue };
                    tracing::info!(agent = %agent, schedule = %schedule, "schedule triggered");
                    self.inner.events.emit(FleetEvent::ScheduleTriggered {
                        agent_name: agent.clone(),
                        schedule_name: schedule.clone(),
                    });
                    let request = JobRequest {
                        agent: resolved.clone(),
                        schedule: schedule.clone(),
                        prompt: prompt.clone().or_else(|| resolved.prompt.clone()),
                    };
                    match rt.runner.start(request) {
                        Ok(_) => {}
                        Err(RunnerError::AgentBusy(_)) => self.skipped(agent, schedule, SKIP_AGENT_BUSY),
                        Err(e) => {
                            tracing::error!(agent = %agent, schedule = %schedule, error = %e, "failed to start job");
                            self.inner.events.emit(FleetEvent::Error { message: e.to_string() });
                        }
                    }
                }
                TickOutcome::Skipped { agent, schedule, reason } => self.skipped(agent, schedule, reason),
            }
        }
        outcomes
    }

    fn skipped(&self, agent: &str, schedule: &str, reason: &str) {
        tracing::info!(agent, schedule, reason, "schedule skipped");
        self.inner.events.emit(FleetEvent::ScheduleSkipped {
            agent_name: agent.to_string(),
            schedule_name: schedule.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Stop scheduling and drain running jobs.
    ///
    /// Waits `timeout` for jobs to finish, then (if `cancel_on_timeout`)
    /// cancels the rest with `cancel_timeout` of grace. Fails with
    /// [`FleetError::ShutdownTimeout`] if any job is still live after that.
    /// The manager ends `stopped` either way.
    pub async fn stop(&self, options: StopOptions) -> Result<(), FleetError> {
        {
            let mut lifecycle = self.inner.lifecycle.lock();
            let state = *lifecycle;
            if !matches!(state, FleetLifecycle::Initialized | FleetLifecycle::Running) {
                return Err(FleetError::InvalidState { operation: "stop", state });
            }
            *lifecycle = FleetLifecycle::Stopping;
        }
        if let Some(token) = self.inner.tick_loop.lock().take() {
            token.cancel();
        }
        let rt = self.runtime("stop")?;
        let runner = &rt.runner;

        tracing::info!(
            running = runner.running_count(),
            timeout_ms = options.timeout.as_millis() as u64,
            "stopping fleet"
        );
        let result = if runner.wait_idle(options.timeout).await {
            Ok(())
        } else if options.cancel_on_timeout {
            let cancelled = runner.cancel_all(options.cancel_timeout);
            tracing::warn!(jobs = cancelled.len(), "cancelling jobs still running at stop timeout");
            if runner.wait_idle(options.cancel_timeout + KILL_CONFIRM_BUDGET).await {
                Ok(())
            } else {
                Err(FleetError::ShutdownTimeout { running: runner.running_jobs() })
            }
        } else {
            Err(FleetError::ShutdownTimeout { running: runner.running_jobs() })
        };

        *self.inner.lifecycle.lock() = FleetLifecycle::Stopped;
        match &result {
            Ok(()) => {
                tracing::info!("fleet stopped");
                self.inner.events.emit(FleetEvent::Stopped);
            }
            Err(e) => {
                tracing::error!(error = %e, "fleet stop incomplete");
                self.inner.events.emit(FleetEvent::Error { message: e.to_string() });
            }
        }
        result
    }

    /// Re-resolve the definition and swap it in.
    ///
    /// A definition that fails to resolve leaves the active one untouched.
    /// Running jobs of removed agents finish under their own lifecycle.
    pub fn reload(&self) -> Result<Vec<ConfigChange>, FleetError> {
        let rt = self.runtime("reload")?;
        let old = self.active_config("reload")?;
        let new = match fleet_config::load_config(&self.inner.options.config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "reload failed, keeping current configuration");
                self.inner.events.emit(FleetEvent::Error { message: format!("reload failed: {e}") });
                return Err(e.into());
            }
        };

        let now = self.inner.clock.now();
        let changes = diff_configs(&old, &new);
        rt.store.fleet().reconcile(new.agent_names())?;
        let new = Arc::new(new);
        *self.inner.config.write() = Some(Arc::clone(&new));
        {
            let mut scheduler = self.inner.scheduler.lock();
            scheduler.reseed(&new, now);
            record_next_triggers(&rt.store, &scheduler)?;
        }
        rt.store.fleet().modify(|s| s.fleet.last_reload_at = Some(now))?;

        tracing::info!(agents = new.agents.len(), changes = changes.len(), "configuration reloaded");
        self.inner.events.emit(FleetEvent::ConfigReloaded {
            agent_count: new.agents.len(),
            changes: changes.clone(),
        });
        Ok(changes)
    }

    pub fn get_fleet_status(&self) -> Result<FleetStatus, FleetError> {
        let state = self.state();
        let config = self.config();
        let rt = self.inner.runtime.read().clone();
        let fleet = match &rt {
            Some(rt) => rt.store.read_fleet_state()?,
            None => FleetState::default(),
        };
        let scheduler = {
            let scheduler = self.inner.scheduler.lock();
            SchedulerStatus {
                tick_interval_ms: self.inner.options.tick_interval.as_millis() as u64,
                tick_count: scheduler.tick_count(),
                last_tick_at: scheduler.last_tick_at(),
            }
        };
        let now = self.inner.clock.now();
        let started_at = fleet.fleet.started_at.filter(|_| state == FleetLifecycle::Running);
        Ok(FleetStatus {
            state,
            name: config.as_ref().map(|c| c.name.clone()),
            config_path: config.as_ref().map(|c| c.config_path.clone()),
            started_at,
            uptime_seconds: started_at.map(|at| (now - at).num_seconds().max(0)),
            last_reload_at: fleet.fleet.last_reload_at,
            agents: AgentCounts::tally(fleet.agents.values()),
            running_jobs: rt.as_ref().map_or(0, |rt| rt.runner.running_count()),
            scheduler,
        })
    }

    /// Every configured agent, in definition order.
    pub fn get_agent_info(&self) -> Result<Vec<AgentInfo>, FleetError> {
        let rt = self.runtime("query agents")?;
        let config = self.active_config("query agents")?;
        let mut fleet = rt.store.read_fleet_state()?;
        let scheduler = self.inner.scheduler.lock();
        Ok(config
            .agents
            .values()
            .map(|agent| {
                let state = fleet.agents.remove(&agent.name).unwrap_or_default();
                AgentInfo::new(agent, state, scheduler.schedules(&agent.name))
            })
            .collect())
    }

    pub fn get_agent(&self, name: &str) -> Result<AgentInfo, FleetError> {
        let rt = self.runtime("query agents")?;
        let config = self.active_config("query agents")?;
        let agent = config.agent(name).ok_or_else(|| FleetError::AgentNotFound(name.to_string()))?;
        let state = rt.store.read_fleet_state()?.agents.remove(name).unwrap_or_default();
        let scheduler = self.inner.scheduler.lock();
        Ok(AgentInfo::new(agent, state, scheduler.schedules(name)))
    }

    /// Run an agent now, outside its schedules.
    ///
    /// With `schedule`, the job is recorded against that schedule and uses
    /// its prompt; otherwise it is recorded as `manual`. An explicit
    /// `prompt` overrides both.
    pub fn trigger(
        &self,
        agent: &str,
        schedule: Option<&str>,
        prompt: Option<String>,
    ) -> Result<JobMetadata, FleetError> {
        let state = self.state();
        if matches!(state, FleetLifecycle::Uninitialized | FleetLifecycle::Stopping) {
            return Err(FleetError::InvalidState { operation: "trigger", state });
        }
        let rt = self.runtime("trigger")?;
        let config = self.active_config("trigger")?;
        let resolved = config.agent(agent).ok_or_else(|| FleetError::AgentNotFound(agent.to_string()))?;
        let (schedule_name, schedule_prompt) = match schedule {
            Some(name) => {
                let s = resolved.schedule(name).ok_or_else(|| FleetError::ScheduleNotFound {
                    agent: agent.to_string(),
                    schedule: name.to_string(),
                })?;
                (name, s.prompt.clone())
            }
            None => (MANUAL_TRIGGER, None),
        };

        let running = rt.store.read_fleet_state()?.agent(agent).is_some_and(|a| a.is_running());
        if running || rt.runner.is_busy(agent) {
            self.skipped(agent, schedule_name, SKIP_AGENT_BUSY);
            return Err(FleetError::AgentBusy(agent.to_string()));
        }

        tracing::info!(agent, schedule = schedule_name, "manual trigger");
        let request = JobRequest {
            agent: resolved.clone(),
            schedule: schedule_name.to_string(),
            prompt: prompt.or(schedule_prompt).or_else(|| resolved.prompt.clone()),
        };
        rt.runner.start(request).map_err(|e| {
            if let RunnerError::AgentBusy(_) = e {
                self.skipped(agent, schedule_name, SKIP_AGENT_BUSY);
            }
            FleetError::from(e)
        })
    }

    /// Cancel a job with the configured grace window.
    ///
    /// Returns false if the job already reached a terminal state.
    pub fn cancel_job(&self, id: &JobId) -> Result<bool, FleetError> {
        let rt = self.runtime("cancel")?;
        let job = rt.store.get_job(id)?.ok_or_else(|| FleetError::JobNotFound(id.clone()))?;
        if job.is_terminal() {
            return Ok(false);
        }
        Ok(rt.runner.cancel(id, self.inner.options.cancel_timeout))
    }
}

/// Fail jobs left non-terminal by a previous process and free their agents.
fn recover_interrupted(store: &StateStore, now: chrono::DateTime<chrono::Utc>) -> Result<(), FleetError> {
    for status in [JobStatus::Running, JobStatus::Pending] {
        for job in store.list_jobs(&JobFilter::new().status(status))? {
            let update = JobUpdate::new()
                .status(JobStatus::Failed)
                .ended_at(now)
                .error(INTERRUPTED_BY_RESTART)
                .container_id(None);
            store.update_job(&job.id, &update)?;
            tracing::warn!(job_id = %job.id, agent = %job.agent, "marked interrupted job failed");
        }
    }
    store.fleet().modify(|state| {
        for (name, agent) in state.agents.iter_mut().filter(|(_, a)| a.is_running()) {
            tracing::info!(agent = %name, "resetting agent left running by previous process");
            agent.status = AgentStatus::Idle;
            if let Some(job) = agent.current_job.take() {
                agent.last_job = Some(job);
            }
            agent.container_id = None;
        }
    })?;
    Ok(())
}

/// Mirror each agent's soonest schedule into its persisted state.
/// Store each agent's next due schedule. Unchanged state is not rewritten.
fn record_next_triggers(store: &StateStore, scheduler: &Scheduler) -> Result<(), FleetError> {
    store.fleet().modify(|state| {
        for (name, agent) in state.agents.iter_mut() {
            let next = scheduler.next_due(name);
            agent.next_schedule = next.map(|(schedule, _)| schedule.to_string());
            agent.next_trigger_at = next.map(|(_, at)| at);
        }
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
