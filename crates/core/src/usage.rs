//! Accumulated usage across scanned workflows.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Model filenames and node types referenced by a set of workflows.
///
/// Rebuilt from scratch on every audit; merging two sets is a union.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageSet {
    /// Basenames of referenced model files.
    pub models: BTreeSet<String>,
    /// Node type identifiers appearing in any workflow.
    pub node_types: BTreeSet<String>,
    /// Node type -> model filenames referenced by nodes of that type.
    pub dependencies: BTreeMap<String, BTreeSet<String>>,
    /// Workflow files parsed successfully.
    pub workflows_scanned: usize,
    /// Workflow files that could not be read or parsed.
    pub workflows_skipped: usize,
}

impl UsageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_node_type(&mut self, node_type: &str) {
        if !node_type.is_empty() {
            self.node_types.insert(node_type.to_string());
        }
    }

    /// Record a model reference, attributing it to `node_type` when known.
    pub fn record_model(&mut self, node_type: Option<&str>, model: &str) {
        if model.is_empty() {
            return;
        }
        self.models.insert(model.to_string());
        if let Some(node_type) = node_type.filter(|t| !t.is_empty()) {
            self.dependencies
                .entry(node_type.to_string())
                .or_default()
                .insert(model.to_string());
        }
    }

    pub fn merge(&mut self, other: UsageSet) {
        self.models.extend(other.models);
        self.node_types.extend(other.node_types);
        for (node_type, models) in other.dependencies {
            self.dependencies.entry(node_type).or_default().extend(models);
        }
        self.workflows_scanned += other.workflows_scanned;
        self.workflows_skipped += other.workflows_skipped;
    }
}
