// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Name grammars and issue collection.

use crate::error::{ConfigError, SchemaIssue};
use regex::Regex;
use std::sync::LazyLock;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static FLEET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static AGENT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("constant regex pattern is valid")
});

/// Fleet names: lowercase letters and digits, hyphen-separated.
pub fn is_valid_fleet_name(name: &str) -> bool {
    FLEET_NAME.is_match(name)
}

/// Agent and schedule names: alphanumeric start, then alphanumerics, `_`, `-`.
pub fn is_valid_agent_name(name: &str) -> bool {
    AGENT_NAME.is_match(name)
}

/// Accumulates every issue found during resolution.
#[derive(Debug, Default)]
pub struct Issues {
    issues: Vec<SchemaIssue>,
}

impl Issues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.issues.push(SchemaIssue::new(location, message));
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// `Ok(value)` if nothing was recorded, otherwise a schema validation error.
    pub fn finish<T>(self, value: T) -> Result<T, ConfigError> {
        if self.issues.is_empty() {
            Ok(value)
        } else {
            Err(ConfigError::SchemaValidation { issues: self.issues })
        }
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
