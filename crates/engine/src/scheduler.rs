// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule evaluation.
//!
//! The scheduler is a pure state machine over wall-clock instants: the
//! caller supplies `now` and a busy predicate, and gets back the trigger
//! decisions for one tick. It never spawns work itself.

use chrono::{DateTime, Utc};
use fleet_config::{ResolvedConfig, Schedule};
use fleet_core::SKIP_AGENT_BUSY;
use indexmap::IndexMap;
use serde::Serialize;

/// Runtime view of one schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleState {
    pub schedule: Schedule,
    /// `None` for manual or disabled schedules
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_triggered_at: Option<DateTime<Utc>>,
}

impl ScheduleState {
    fn new(schedule: Schedule, now: DateTime<Utc>) -> Self {
        let next_run_at = if schedule.is_timed() { schedule.kind.first_run(now) } else { None };
        Self { schedule, next_run_at, last_triggered_at: None }
    }

    pub fn name(&self) -> &str {
        &self.schedule.name
    }

    fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.schedule.is_timed() && self.next_run_at.is_some_and(|at| now >= at)
    }
}

/// Decision for one due schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Triggered { agent: String, schedule: String, prompt: Option<String> },
    Skipped { agent: String, schedule: String, reason: &'static str },
}

impl TickOutcome {
    pub fn agent(&self) -> &str {
        match self {
            TickOutcome::Triggered { agent, .. } | TickOutcome::Skipped { agent, .. } => agent,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    agents: IndexMap<String, Vec<ScheduleState>>,
    last_tick_at: Option<DateTime<Utc>>,
    tick_count: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every agent's schedule set from `config`.
    ///
    /// Removed agents are dropped; new and retained agents get fresh
    /// schedule states with `next_run_at` computed from `now`.
    pub fn reseed(&mut self, config: &ResolvedConfig, now: DateTime<Utc>) {
        self.agents = config
            .agents
            .values()
            .map(|agent| {
                let states = agent
                    .schedules
                    .values()
                    .map(|s| ScheduleState::new(s.clone(), now))
                    .collect();
                (agent.name.clone(), states)
            })
            .collect();
        tracing::debug!(agents = self.agents.len(), "scheduler seeded");
    }

    /// Evaluate every schedule at `now`.
    ///
    /// `is_busy` reports whether an agent already has a running job. An
    /// agent triggered earlier in the same tick counts as busy, so two
    /// schedules of one agent coming due together yield one trigger and
    /// one skip. Every due schedule advances past `now` either way.
    pub fn tick(&mut self, now: DateTime<Utc>, is_busy: impl Fn(&str) -> bool) -> Vec<TickOutcome> {
        let mut outcomes = Vec::new();
        for (agent, states) in &mut self.agents {
            let mut busy = is_busy(agent);
            for state in states.iter_mut().filter(|s| s.is_due(now)) {
                let due = state.next_run_at.unwrap_or(now);
                state.next_run_at = state.schedule.kind.next_run(due, now);
                if busy {
                    outcomes.push(TickOutcome::Skipped {
                        agent: agent.clone(),
                        schedule: state.schedule.name.clone(),
                        reason: SKIP_AGENT_BUSY,
                    });
                    continue;
                }
                busy = true;
                state.last_triggered_at = Some(now);
                outcomes.push(TickOutcome::Triggered {
                    agent: agent.clone(),
                    schedule: state.schedule.name.clone(),
                    prompt: state.schedule.prompt.clone(),
                });
            }
        }
        self.last_tick_at = Some(now);
        self.tick_count += 1;
        outcomes
    }

    pub fn schedules(&self, agent: &str) -> &[ScheduleState] {
        self.agents.get(agent).map(Vec::as_slice).unwrap_or_default()
    }

    /// The agent's soonest upcoming schedule.
    pub fn next_due(&self, agent: &str) -> Option<(&str, DateTime<Utc>)> {
        self.schedules(agent)
            .iter()
            .filter_map(|s| s.next_run_at.map(|at| (s.name(), at)))
            .min_by_key(|(_, at)| *at)
    }

    pub fn last_tick_at(&self) -> Option<DateTime<Utc>> {
        self.last_tick_at
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
