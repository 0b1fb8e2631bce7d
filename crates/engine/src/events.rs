// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process event fan-out.
//!
//! Every subscriber owns an unbounded queue, so a slow consumer never
//! delays emission or other consumers. Sinks are adapters registered at
//! wiring time; each gets a dedicated forwarding task.

use async_trait::async_trait;
use fleet_core::FleetEvent;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A consumer of fleet events (web bridge, chat platform, ...).
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn handle(&self, event: FleetEvent);
}

pub type EventReceiver = mpsc::UnboundedReceiver<FleetEvent>;

#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<FleetEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every live subscriber, in emission order.
    pub fn emit(&self, event: FleetEvent) {
        tracing::debug!(event = event.name(), "{}", event.log_summary());
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscribe(&self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Forward every subsequent event to `sink`. Must be called within a
    /// tokio runtime.
    pub fn register_sink(&self, sink: Arc<dyn EventSink>) -> tokio::task::JoinHandle<()> {
        let mut rx = self.subscribe();
        tracing::info!(sink = sink.name(), "registered event sink");
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                sink.handle(event).await;
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
