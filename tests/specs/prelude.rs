// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for scenario specs.

pub use fleet_core::{
    ChangeCategory, ChangeType, Clock, ConfigChange, FakeClock, FleetEvent, JobStatus,
    TerminationType,
};
pub use fleet_engine::{
    EventReceiver, FleetError, FleetLifecycle, FleetManager, FleetManagerOptions, StopOptions,
    TickOutcome,
};
pub use fleet_storage::JobFilter;
pub use std::time::Duration;

use tempfile::TempDir;

/// A fleet definition in a temp directory with a manager over it.
///
/// The fleet is started with an hour-long tick interval, so ticks are driven
/// by hand against a [`FakeClock`]. Job processes are real.
pub struct Fleet {
    pub dir: TempDir,
    pub clock: FakeClock,
    pub manager: FleetManager<FakeClock>,
    pub events: EventReceiver,
}

impl Fleet {
    pub fn new(yaml: &str) -> Self {
        let dir = TempDir::new().unwrap();
        write_definition(&dir, yaml);
        let clock = FakeClock::new();
        let options =
            FleetManagerOptions::new(dir.path()).tick_interval(Duration::from_secs(3600));
        let manager = FleetManager::with_clock(options, clock.clone());
        let events = manager.subscribe();
        manager.initialize().unwrap();
        manager.start().unwrap();
        Self { dir, clock, manager, events }
    }

    pub fn rewrite(&self, yaml: &str) {
        write_definition(&self.dir, yaml);
    }

    /// Advance the clock by `step` and tick, `n` times.
    pub fn tick_n(&self, n: usize, step: Duration) -> Vec<TickOutcome> {
        let mut outcomes = Vec::new();
        for _ in 0..n {
            self.clock.advance(step);
            outcomes.extend(self.manager.tick());
        }
        outcomes
    }

    /// Events emitted so far and not yet taken.
    pub fn take_events(&mut self) -> Vec<FleetEvent> {
        std::iter::from_fn(|| self.events.try_recv().ok()).collect()
    }

    /// Wait for the next event called `name`, discarding others.
    pub async fn wait_for(&mut self, name: &str) -> FleetEvent {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(15), self.events.recv())
                .await
                .unwrap_or_else(|_| panic!("timed out waiting for {name}"))
                .unwrap();
            if event.name() == name {
                return event;
            }
        }
    }
}

fn write_definition(dir: &TempDir, yaml: &str) {
    std::fs::write(dir.path().join("fleet.yaml"), yaml).unwrap();
}
