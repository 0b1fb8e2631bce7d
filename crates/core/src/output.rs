// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured job output records (one JSON line each).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an output record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSource {
    Stdout,
    Stderr,
    /// Emitted by the runner itself (lifecycle notes, hook results)
    System,
}

crate::simple_display! {
    OutputSource {
        Stdout => "stdout",
        Stderr => "stderr",
        System => "system",
    }
}

/// What an output record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Plain text line
    Text,
    /// A line that parsed as a JSON object (runtime stream events)
    Json,
    Error,
}

crate::simple_display! {
    OutputKind {
        Text => "text",
        Json => "json",
        Error => "error",
    }
}

/// One record in a job's append-only output log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutputRecord {
    pub ts: DateTime<Utc>,
    pub source: OutputSource,
    pub kind: OutputKind,
    pub content: String,
}

impl JobOutputRecord {
    pub fn new(
        ts: DateTime<Utc>,
        source: OutputSource,
        kind: OutputKind,
        content: impl Into<String>,
    ) -> Self {
        Self { ts, source, kind, content: content.into() }
    }

    /// Classify a raw line from an execution unit's stream.
    pub fn from_line(ts: DateTime<Utc>, source: OutputSource, line: &str) -> Self {
        let trimmed = line.trim_start();
        let kind = if trimmed.starts_with('{')
            && serde_json::from_str::<serde_json::Value>(trimmed).is_ok_and(|v| v.is_object())
        {
            OutputKind::Json
        } else {
            OutputKind::Text
        };
        Self::new(ts, source, kind, line)
    }

    pub fn system(ts: DateTime<Utc>, content: impl Into<String>) -> Self {
        Self::new(ts, OutputSource::System, OutputKind::Text, content)
    }

    /// Extract a runtime session id from a JSON record, if present.
    pub fn session_id(&self) -> Option<String> {
        if self.kind != OutputKind::Json {
            return None;
        }
        let value: serde_json::Value = serde_json::from_str(&self.content).ok()?;
        value.get("session_id")?.as_str().filter(|s| !s.is_empty()).map(str::to_string)
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
