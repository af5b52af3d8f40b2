//! Audit orchestration: resolve, scan, inventory, compare.

use crate::analysis::{analyze, UsageAnalysis};
use crate::config::AuditConfig;
use crate::error::CoreError;
use crate::extract::ModelExtractor;
use crate::inventory::{scan_custom_nodes, scan_models};
use crate::registry::NodeRegistry;
use crate::report::render_text;
use crate::workflow::scan_workflows_dir;

/// Run a full audit.
///
/// The only surfaced failure is a missing workflows directory. Everything
/// else (unreadable files, malformed JSON, missing model or custom node
/// directories) degrades to a partial result.
pub fn run_audit(config: &AuditConfig) -> Result<UsageAnalysis, CoreError> {
    let workflows_dir = config.resolved_workflows_dir();
    if !workflows_dir.exists() {
        return Err(CoreError::WorkflowDirNotFound(workflows_dir));
    }

    tracing::info!(
        root = %config.root().display(),
        workflows_dir = %workflows_dir.display(),
        strategy = %config.strategy,
        "Starting usage audit"
    );

    let custom_nodes = scan_custom_nodes(&config.custom_nodes_dir());
    let registry = build_registry(config);

    let extractor = ModelExtractor::new(config.strategy, &registry);
    let usage = scan_workflows_dir(&workflows_dir, &extractor);

    let models = scan_models(&config.model_dirs());

    let analysis = analyze(&workflows_dir, usage, &models, &custom_nodes, &registry);

    tracing::info!(
        used_models = analysis.used_models.len(),
        unused_models = analysis.unused_models.len(),
        missing_models = analysis.missing_models.len(),
        unused_custom_nodes = analysis.unused_custom_nodes.len(),
        "Usage audit complete"
    );

    Ok(analysis)
}

/// Run an audit and render it as text; a missing workflows directory
/// renders as its one-line message.
pub fn run_report(config: &AuditConfig) -> String {
    match run_audit(config) {
        Ok(analysis) => render_text(&analysis),
        Err(e) => e.to_string(),
    }
}

/// Registry from `object_info` (when configured) backed by a source scan
/// of the installed custom nodes.
pub fn build_registry(config: &AuditConfig) -> NodeRegistry {
    let scanned = NodeRegistry::scan_node_sources(&config.custom_nodes_dir());
    match config.resolved_object_info() {
        Some(path) => NodeRegistry::load_object_info(&path).merge(scanned),
        None => scanned,
    }
}
