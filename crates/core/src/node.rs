//! The usage checker as a ComfyUI node definition.
//!
//! ComfyUI nodes describe themselves with an input schema, return type
//! declarations, a category and the name of the callable to invoke. This
//! module keeps that contract as data so it can be exported in the same
//! shape `object_info` uses, and provides the callable itself.

use std::path::PathBuf;

use serde_json::{json, Value};

use crate::audit::run_report;
use crate::config::{AuditConfig, DEFAULT_WORKFLOWS_DIR};

/// Node type identifier.
pub const NODE_NAME: &str = "ComfyUIUsageChecker";
/// Human-readable node title.
pub const DISPLAY_NAME: &str = "ComfyUI Usage Checker";
pub const CATEGORY: &str = "utils";
/// Name of the callable the host invokes.
pub const FUNCTION: &str = "run";
pub const RETURN_TYPES: &[&str] = &["STRING"];
pub const RETURN_NAMES: &[&str] = &["report"];

/// The single declared input.
pub const WORKFLOWS_DIR_INPUT: &str = "workflows_dir";

/// Node wrapper around an audit configuration.
///
/// Every field of the base configuration except the workflows directory is
/// fixed at construction; the directory is supplied per call.
#[derive(Debug, Clone, Default)]
pub struct UsageCheckerNode {
    base: AuditConfig,
}

impl UsageCheckerNode {
    pub fn new(base: AuditConfig) -> Self {
        Self { base }
    }

    /// Declared inputs, in `INPUT_TYPES` shape.
    pub fn input_types() -> Value {
        json!({
            "required": {
                WORKFLOWS_DIR_INPUT: ["STRING", {"default": DEFAULT_WORKFLOWS_DIR}]
            }
        })
    }

    /// Full node definition in `object_info` entry shape.
    pub fn definition() -> Value {
        json!({
            "name": NODE_NAME,
            "display_name": DISPLAY_NAME,
            "category": CATEGORY,
            "function": FUNCTION,
            "input": Self::input_types(),
            "output": RETURN_TYPES,
            "output_name": RETURN_NAMES,
            "output_node": false,
        })
    }

    /// Audit `workflows_dir` (relative to the install root unless absolute)
    /// and return the text report as a one-element tuple.
    pub fn run(&self, workflows_dir: &str) -> (String,) {
        let mut config = self.base.clone();
        if !workflows_dir.trim().is_empty() {
            config.workflows_dir = PathBuf::from(workflows_dir);
        }
        (run_report(&config),)
    }
}
