//! Saved workflow parsing and directory scanning.
//!
//! Two on-disk shapes are understood:
//!
//! - the UI format, with a `nodes` collection (list, or keyed object) whose
//!   entries carry a `type`;
//! - the API export format, where the top-level object maps node ids to
//!   entries carrying a `class_type`.
//!
//! Anything else is tolerated and simply contributes nothing. Unreadable
//! or malformed files are skipped and counted, never surfaced.

use std::path::Path;

use serde_json::Value;
use walkdir::WalkDir;

use crate::error::CoreError;
use crate::extract::ModelExtractor;
use crate::usage::UsageSet;

/// File suffix of saved workflows.
pub const WORKFLOW_SUFFIX: &str = ".json";

/// A node entry borrowed from a parsed workflow document.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowNode<'a> {
    /// `type` (UI format) or `class_type` (API format), when present and non-empty.
    pub node_type: Option<&'a str>,
    /// The whole node object.
    pub value: &'a Value,
}

/// Node entries of a workflow document.
pub fn workflow_nodes(doc: &Value) -> Vec<WorkflowNode<'_>> {
    let Some(obj) = doc.as_object() else {
        return Vec::new();
    };

    let entries: Vec<&Value> = match obj.get("nodes") {
        Some(Value::Array(nodes)) => nodes.iter().collect(),
        Some(Value::Object(nodes)) => nodes.values().collect(),
        Some(_) => Vec::new(),
        // API format: every value with a `class_type` is a node.
        None => obj
            .values()
            .filter(|v| v.get("class_type").is_some_and(Value::is_string))
            .collect(),
    };

    entries
        .into_iter()
        .filter(|v| v.is_object())
        .map(|value| WorkflowNode {
            node_type: node_type_of(value),
            value,
        })
        .collect()
}

fn node_type_of(node: &Value) -> Option<&str> {
    ["type", "class_type"]
        .into_iter()
        .filter_map(|key| node.get(key).and_then(Value::as_str))
        .find(|t| !t.is_empty())
}

/// Record the node types and model references of one parsed document.
pub fn scan_document(doc: &Value, extractor: &ModelExtractor<'_>, usage: &mut UsageSet) {
    for node in workflow_nodes(doc) {
        if let Some(node_type) = node.node_type {
            usage.record_node_type(node_type);
        }
        for model in extractor.extract_node(node.node_type, node.value) {
            usage.record_model(node.node_type, &model);
        }
    }
}

/// Read and parse one workflow file.
pub fn try_read_workflow(path: &Path) -> Result<Value, CoreError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Read, parse and scan one workflow file.
///
/// Returns `false` (and counts the file as skipped) when it cannot be read
/// or is not valid JSON.
pub fn scan_workflow_file(
    path: &Path,
    extractor: &ModelExtractor<'_>,
    usage: &mut UsageSet,
) -> bool {
    match try_read_workflow(path) {
        Ok(doc) => {
            scan_document(&doc, extractor, usage);
            usage.workflows_scanned += 1;
            true
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable workflow");
            usage.workflows_skipped += 1;
            false
        }
    }
}

/// Recursively scan every `*.json` file under `dir`.
pub fn scan_workflows_dir(dir: &Path, extractor: &ModelExtractor<'_>) -> UsageSet {
    let mut usage = UsageSet::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unwalkable workflow entry");
                continue;
            }
        };
        let is_workflow = entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(WORKFLOW_SUFFIX));
        if is_workflow {
            scan_workflow_file(entry.path(), extractor, &mut usage);
        }
    }

    tracing::info!(
        dir = %dir.display(),
        scanned = usage.workflows_scanned,
        skipped = usage.workflows_skipped,
        node_types = usage.node_types.len(),
        models = usage.models.len(),
        strategy = %extractor.strategy(),
        "Workflow scan complete"
    );

    usage
}
