// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single field-level problem found while validating a fleet definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// Where the problem is, e.g. `fleet.yaml: agents[reviewer].schedules.hourly`
    pub location: String,
    pub message: String,
}

impl SchemaIssue {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self { location: location.into(), message: message.into() }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

fn format_issues(issues: &[SchemaIssue]) -> String {
    issues.iter().map(|i| format!("\n  - {}", i)).collect()
}

fn format_cycle(cycle: &[PathBuf]) -> String {
    cycle.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(" -> ")
}

/// Errors from loading and resolving fleet configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no fleet configuration found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {}: {message}", path.display())]
    YamlSyntax { path: PathBuf, message: String },

    #[error("invalid fleet configuration ({} issue(s)):{}", issues.len(), format_issues(issues))]
    SchemaValidation { issues: Vec<SchemaIssue> },

    #[error("fleet reference cycle: {}", format_cycle(cycle))]
    FleetCycle { cycle: Vec<PathBuf> },

    #[error("{kind} name '{name}' is defined by both {first} and {second}")]
    FleetNameCollision { kind: &'static str, name: String, first: String, second: String },

    #[error(
        "invalid fleet name '{name}' in {}: use lowercase letters, digits, and hyphens",
        path.display()
    )]
    InvalidFleetName { name: String, path: PathBuf },

    #[error("undefined variable ${{{name}}} at {location}")]
    UndefinedVariable { name: String, location: String },
}

impl ConfigError {
    /// Issues carried by a schema validation failure (empty for other kinds).
    pub fn issues(&self) -> &[SchemaIssue] {
        match self {
            ConfigError::SchemaValidation { issues } => issues,
            _ => &[],
        }
    }
}
