// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolved schedule kinds and occurrence computation.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A parsed cron expression.
///
/// Five-field expressions (minute precision) get a leading seconds field of
/// `0`; six- and seven-field expressions are taken as written. Occurrences
/// are computed in UTC.
#[derive(Clone)]
pub struct CronExpr {
    source: String,
    schedule: cron::Schedule,
}

impl CronExpr {
    pub fn parse(expression: &str) -> Result<Self, String> {
        let trimmed = expression.trim();
        let fields = trimmed.split_whitespace().count();
        let normalized = match fields {
            5 => format!("0 {}", trimmed),
            6 | 7 => trimmed.to_string(),
            n => return Err(format!("expected 5, 6, or 7 fields, found {}", n)),
        };
        let schedule = cron::Schedule::from_str(&normalized).map_err(|e| e.to_string())?;
        Ok(Self { source: trimmed.to_string(), schedule })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// First occurrence strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }
}

impl PartialEq for CronExpr {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for CronExpr {}

impl fmt::Debug for CronExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronExpr").field(&self.source).finish()
    }
}

impl fmt::Display for CronExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for CronExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// When a schedule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleKind {
    Interval {
        #[serde(with = "duration_secs")]
        every: Duration,
    },
    Cron {
        expression: CronExpr,
    },
    /// Fires only through an explicit trigger
    Manual,
}

impl ScheduleKind {
    pub fn is_manual(&self) -> bool {
        matches!(self, ScheduleKind::Manual)
    }

    /// First due time for a schedule seen for the first time at `now`.
    pub fn first_run(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ScheduleKind::Interval { every } => add(now, *every),
            ScheduleKind::Cron { expression } => expression.next_after(now),
            ScheduleKind::Manual => None,
        }
    }

    /// Next due time after a trigger that was due at `due` and fired at `now`.
    ///
    /// Intervals advance from `due` by whole periods until past `now`, so
    /// a late tick neither drifts the cadence nor backfills missed runs.
    pub fn next_run(&self, due: DateTime<Utc>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ScheduleKind::Interval { every } => {
                let period = chrono::Duration::from_std(*every).ok()?;
                if period <= chrono::Duration::zero() {
                    return None;
                }
                let behind = (now - due).num_milliseconds().max(0);
                let periods = behind / period.num_milliseconds().max(1) + 1;
                Some(due + period * i32::try_from(periods).ok()?)
            }
            ScheduleKind::Cron { expression } => expression.next_after(now),
            ScheduleKind::Manual => None,
        }
    }
}

fn add(at: DateTime<Utc>, d: Duration) -> Option<DateTime<Utc>> {
    at.checked_add_signed(chrono::Duration::from_std(d).ok()?)
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(d.as_secs())
    }
}

/// A resolved, named schedule belonging to one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub name: String,
    #[serde(flatten)]
    pub kind: ScheduleKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub enabled: bool,
}

impl Schedule {
    /// Whether the scheduler should evaluate this schedule on ticks.
    pub fn is_timed(&self) -> bool {
        self.enabled && !self.kind.is_manual()
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
