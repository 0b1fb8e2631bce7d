// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event sink that writes every fleet event to the daemon log.

use async_trait::async_trait;
use fleet_core::FleetEvent;
use fleet_engine::EventSink;

pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn handle(&self, event: FleetEvent) {
        let summary = event.log_summary();
        match event {
            FleetEvent::Error { .. } | FleetEvent::JobFailed { .. } => {
                tracing::warn!(target: "fleetd::events", "{summary}")
            }
            _ => tracing::info!(target: "fleetd::events", "{summary}"),
        }
    }
}
