//! Report rendering.
//!
//! The text layout is fixed: a banner, the scanned directory, then one
//! section per used/unused category with `  name (path)` lines sorted by
//! name. Missing models and the node -> model dependency graph follow.

use std::path::Path;

use crate::analysis::UsageAnalysis;
use crate::error::CoreError;

pub const REPORT_TITLE: &str = "===== ComfyUI Global Usage Report =====";

const USED_MODELS: &str = "---- Used Models ----";
const UNUSED_MODELS: &str = "---- Unused Models ----";
const USED_CUSTOM_NODES: &str = "---- Used Custom Nodes ----";
const UNUSED_CUSTOM_NODES: &str = "---- Unused Custom Nodes ----";
const MISSING_MODELS: &str = "---- Missing Models ----";
const MODEL_DEPENDENCIES: &str = "---- Model Dependencies ----";

/// Render the analysis as the fixed-format text report.
pub fn render_text(analysis: &UsageAnalysis) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("{REPORT_TITLE}\n"));
    lines.push(format!(
        "Scanned Workflows Directory: {}\n",
        analysis.workflows_dir.display()
    ));

    lines.push(USED_MODELS.to_string());
    lines.extend(
        analysis
            .used_models
            .iter()
            .map(|(name, path)| entry_line(name, Some(path.as_path()))),
    );

    lines.push(format!("\n{UNUSED_MODELS}"));
    lines.extend(
        analysis
            .unused_models
            .iter()
            .map(|(name, path)| entry_line(name, Some(path.as_path()))),
    );

    lines.push(format!("\n{USED_CUSTOM_NODES}"));
    lines.extend(
        analysis
            .used_custom_nodes
            .iter()
            .map(|(name, path)| entry_line(name, path.as_deref())),
    );

    lines.push(format!("\n{UNUSED_CUSTOM_NODES}"));
    lines.extend(
        analysis
            .unused_custom_nodes
            .iter()
            .map(|(name, path)| entry_line(name, Some(path.as_path()))),
    );

    lines.push(format!("\n{MISSING_MODELS}"));
    lines.extend(analysis.missing_models.iter().map(|name| format!("  {name}")));

    lines.push(format!("\n{MODEL_DEPENDENCIES}"));
    lines.extend(analysis.dependencies.iter().map(|(node_type, models)| {
        let models: Vec<&str> = models.iter().map(String::as_str).collect();
        format!("  {node_type}: {}", models.join(", "))
    }));

    lines.join("\n")
}

/// Render the analysis as pretty-printed JSON.
pub fn render_json(analysis: &UsageAnalysis) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(analysis)?)
}

/// `  name (path)`; an unknown path renders as `()`.
fn entry_line(name: &str, path: Option<&Path>) -> String {
    let path = path.map(|p| p.display().to_string()).unwrap_or_default();
    format!("  {name} ({path})")
}
