// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-core: shared vocabulary for the fleet orchestration engine

pub mod macros;

pub mod agent;
pub mod clock;
pub mod event;
pub mod id;
pub mod job;
pub mod output;
pub mod session;
pub mod time_fmt;

pub use agent::{AgentState, AgentStateUpdate, AgentStatus};
pub use clock::{Clock, FakeClock, SystemClock};
pub use event::{ChangeCategory, ChangeType, ConfigChange, FleetEvent, SKIP_AGENT_BUSY};
pub use id::short;
#[cfg(any(test, feature = "test-support"))]
pub use job::JobMetadataBuilder;
pub use job::{JobId, JobMetadata, JobStatus, JobUpdate, TerminationType, MANUAL_TRIGGER};
pub use output::{JobOutputRecord, OutputKind, OutputSource};
pub use session::{SessionInfo, SessionMode};
pub use time_fmt::{format_elapsed, format_elapsed_ms, parse_duration};
