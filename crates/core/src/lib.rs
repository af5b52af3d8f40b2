//! Core logic for the ComfyUI usage audit.
//!
//! Scans saved workflows for model and node-type references, inventories
//! what is installed under a ComfyUI root, and reports what is used and
//! what is not. No CLI concerns live here; the `comfy-usage` binary is a
//! thin wrapper around [`audit`].

pub mod analysis;
pub mod audit;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod inventory;
pub mod model_files;
pub mod node;
pub mod paths;
pub mod registry;
pub mod report;
pub mod types;
pub mod usage;
pub mod workflow;
