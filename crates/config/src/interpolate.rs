// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable interpolation
//!
//! `${VAR}` must be bound; `${VAR:-default}` falls back to `default` when
//! `VAR` is unset. Substitution runs over every string scalar of a document
//! (mapping keys are left alone) and either succeeds for the whole document
//! or fails without returning anything.

use crate::error::ConfigError;
use regex::Regex;
use serde_yml::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
        .expect("constant regex pattern is valid")
});

/// Source of variable values.
pub trait VarSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VarSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl VarSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Substitute placeholders in a single string.
///
/// `location` names the string's position for error messages.
pub fn interpolate_str(
    input: &str,
    vars: &impl VarSource,
    location: &str,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for caps in VAR_PATTERN.captures_iter(input) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&input[last..whole.start()]);
        let value = match (vars.var(name.as_str()), caps.get(2)) {
            (Some(v), _) => v,
            (None, Some(default)) => default.as_str().to_string(),
            (None, None) => {
                return Err(ConfigError::UndefinedVariable {
                    name: name.as_str().to_string(),
                    location: location.to_string(),
                });
            }
        };
        out.push_str(&value);
        last = whole.end();
    }
    out.push_str(&input[last..]);
    Ok(out)
}

/// Substitute placeholders in every string scalar of a document.
pub fn interpolate_value(
    value: &Value,
    vars: &impl VarSource,
    location: &str,
) -> Result<Value, ConfigError> {
    match value {
        Value::String(s) => Ok(Value::String(interpolate_str(s, vars, location)?)),
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| interpolate_value(item, vars, &format!("{location}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        Value::Mapping(map) => {
            let mut out = serde_yml::Mapping::with_capacity(map.len());
            for (key, item) in map {
                let child = match key.as_str() {
                    Some(k) if location.is_empty() => k.to_string(),
                    Some(k) => format!("{location}.{k}"),
                    None => location.to_string(),
                };
                out.insert(key.clone(), interpolate_value(item, vars, &child)?);
            }
            Ok(Value::Mapping(out))
        }
        Value::Tagged(tagged) => {
            let mut tagged = (**tagged).clone();
            tagged.value = interpolate_value(&tagged.value, vars, location)?;
            Ok(Value::Tagged(Box::new(tagged)))
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
#[path = "interpolate_tests.rs"]
mod tests;
