// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-engine: scheduling, job execution, and the fleet manager

mod error;
mod events;
mod manager;
mod runner;
mod scheduler;

#[cfg(test)]
mod test_helpers;

pub use error::{FleetError, RunnerError};
pub use events::{EventBus, EventReceiver, EventSink};
pub use manager::{
    default_state_dir, AgentCounts, AgentInfo, FleetLifecycle, FleetManager, FleetManagerOptions,
    FleetStatus, SchedulerStatus, StopOptions, DEFAULT_CANCEL_TIMEOUT, DEFAULT_STOP_TIMEOUT,
    DEFAULT_TICK_INTERVAL, INTERRUPTED_BY_RESTART,
};
pub use runner::{
    build_command, container_name, describe_exit, hook_env, run_hooks, session_key, CommandSpec,
    Execution, HookResult, JobRequest, JobRunner, StreamSummary, Termination,
};
pub use scheduler::{ScheduleState, Scheduler, TickOutcome};
