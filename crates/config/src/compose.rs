// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet composition graph.
//!
//! Sub-fleet references form a directed graph keyed by canonical file path.
//! The graph is walked depth-first with an explicit stack; the chain of
//! documents currently being expanded is tracked so a reference back into
//! it is reported as a cycle instead of recursing forever.

use crate::error::{ConfigError, SchemaIssue};
use crate::interpolate::{interpolate_value, VarSource};
use crate::schema::{FleetDocument, FORMAT_VERSION};
use crate::validate::is_valid_fleet_name;
use serde_yml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One document in the composed fleet tree.
#[derive(Debug, Clone)]
pub struct FleetNode {
    /// Effective fleet name
    pub name: String,
    /// Sub-fleet names from the root (root excluded)
    pub fleet_path: Vec<String>,
    /// Canonical path of the document
    pub path: PathBuf,
    pub doc: FleetDocument,
    /// `defaults` blocks from the root down to this document
    pub defaults: Vec<Value>,
}

impl FleetNode {
    pub fn is_root(&self) -> bool {
        self.fleet_path.is_empty()
    }

    /// Directory relative paths in this document resolve against.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }
}

/// Resolve `path` as written in a document located in `base_dir`.
pub fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Canonicalize a referenced file, mapping a missing file to `NotFound`.
pub fn canonical(path: &Path) -> Result<PathBuf, ConfigError> {
    std::fs::canonicalize(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::NotFound { path: path.to_path_buf() },
        _ => ConfigError::Read { path: path.to_path_buf(), source: e },
    })
}

/// Read, parse, and interpolate one YAML document.
pub fn read_document(path: &Path, vars: &impl VarSource) -> Result<Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::NotFound { path: path.to_path_buf() },
        _ => ConfigError::Read { path: path.to_path_buf(), source: e },
    })?;
    let value: Value = serde_yml::from_str(&content)
        .map_err(|e| ConfigError::YamlSyntax { path: path.to_path_buf(), message: e.to_string() })?;
    let value = match value {
        Value::Null => Value::Mapping(serde_yml::Mapping::new()),
        other => other,
    };
    interpolate_value(&value, vars, "").map_err(|e| match e {
        ConfigError::UndefinedVariable { name, location } => ConfigError::UndefinedVariable {
            name,
            location: format!("{}: {}", path.display(), location),
        },
        other => other,
    })
}

/// Load and type-check one fleet document.
pub fn load_fleet_document(
    path: &Path,
    vars: &impl VarSource,
) -> Result<FleetDocument, ConfigError> {
    let value = read_document(path, vars)?;
    let doc: FleetDocument = serde_yml::from_value(value).map_err(|e| {
        ConfigError::SchemaValidation {
            issues: vec![SchemaIssue::new(path.display().to_string(), e.to_string())],
        }
    })?;
    if doc.version != FORMAT_VERSION {
        return Err(ConfigError::SchemaValidation {
            issues: vec![SchemaIssue::new(
                format!("{}: version", path.display()),
                format!("unsupported version {} (expected {})", doc.version, FORMAT_VERSION),
            )],
        });
    }
    Ok(doc)
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

struct Frame {
    node: usize,
    next_ref: usize,
    /// Effective names of sub-fleets already expanded under this node
    children: HashMap<String, PathBuf>,
}

impl Frame {
    fn new(node: usize) -> Self {
        Self { node, next_ref: 0, children: HashMap::new() }
    }
}

/// Expand the root document and every transitively referenced sub-fleet.
///
/// Nodes are returned in depth-first pre-order, root first.
pub fn compose(root: &Path, vars: &impl VarSource) -> Result<Vec<FleetNode>, ConfigError> {
    let root_path = canonical(root)?;
    let root_doc = load_fleet_document(&root_path, vars)?;
    let root_name = root_doc.fleet.name.clone().unwrap_or_else(|| file_stem(&root_path));
    if root_doc.fleet.name.is_some() && !is_valid_fleet_name(&root_name) {
        return Err(ConfigError::InvalidFleetName { name: root_name, path: root_path });
    }

    let mut nodes = vec![FleetNode {
        name: root_name,
        fleet_path: Vec::new(),
        defaults: root_doc.defaults.iter().cloned().collect(),
        path: root_path.clone(),
        doc: root_doc,
    }];
    let mut stack = vec![Frame::new(0)];
    let mut active = vec![root_path];

    while let Some(top) = stack.len().checked_sub(1) {
        let parent = stack[top].node;
        let Some(reference) = nodes[parent].doc.fleets.get(stack[top].next_ref).cloned() else {
            stack.pop();
            active.pop();
            continue;
        };
        stack[top].next_ref += 1;

        let target = canonical(&resolve_path(nodes[parent].dir(), &reference.path))?;
        if let Some(pos) = active.iter().position(|p| *p == target) {
            let mut cycle = active[pos..].to_vec();
            cycle.push(target);
            return Err(ConfigError::FleetCycle { cycle });
        }

        let doc = load_fleet_document(&target, vars)?;
        let name = reference
            .name
            .clone()
            .or_else(|| doc.fleet.name.clone())
            .unwrap_or_else(|| file_stem(&target));
        if !is_valid_fleet_name(&name) {
            return Err(ConfigError::InvalidFleetName { name, path: target });
        }
        if let Some(first) = stack[top].children.insert(name.clone(), target.clone()) {
            return Err(ConfigError::FleetNameCollision {
                kind: "fleet",
                name,
                first: first.display().to_string(),
                second: target.display().to_string(),
            });
        }
        if doc.web.is_some() {
            tracing::warn!(
                fleet = %name,
                path = %target.display(),
                "ignoring web settings in sub-fleet; only the root fleet's web block applies"
            );
        }

        let mut fleet_path = nodes[parent].fleet_path.clone();
        fleet_path.push(name.clone());
        let mut defaults = nodes[parent].defaults.clone();
        defaults.extend(doc.defaults.iter().cloned());

        tracing::debug!(fleet = %name, path = %target.display(), "composed sub-fleet");
        nodes.push(FleetNode { name, fleet_path, path: target.clone(), doc, defaults });
        stack.push(Frame::new(nodes.len() - 1));
        active.push(target);
    }

    Ok(nodes)
}

#[cfg(test)]
#[path = "compose_tests.rs"]
mod tests;
