// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered configuration merge.
//!
//! Layers are applied from least to most specific:
//! - mappings merge field by field, recursively
//! - sequences are replaced wholesale by the nearest layer that sets them
//! - scalars take the nearest layer's value
//! - an explicit `null` does not override

use serde_yml::{Mapping, Value};

/// Merge `overlay` on top of `base`, returning the combined value.
pub fn merge_values(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            Value::Mapping(merge_mappings(base_map, overlay_map))
        }
        (_, Value::Null) => base.clone(),
        (_, overlay) => overlay.clone(),
    }
}

fn merge_mappings(base: &Mapping, overlay: &Mapping) -> Mapping {
    let mut out = base.clone();
    for (key, value) in overlay {
        let merged = match out.get(key) {
            Some(existing) => merge_values(existing, value),
            None => value.clone(),
        };
        out.insert(key.clone(), merged);
    }
    out
}

/// Apply a chain of defaults (root fleet first) and then the agent's own fields.
pub fn merge_agent_config(defaults: &[Value], agent: &Value) -> Value {
    let base = defaults.iter().fold(Value::Null, |acc, layer| merge_values(&acc, layer));
    merge_values(&base, agent)
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
