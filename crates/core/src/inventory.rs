//! Inventories of what is installed under a ComfyUI root.
//!
//! Missing directories are not an error: they produce empty inventories.

use std::path::Path;

use walkdir::WalkDir;

use crate::model_files::has_model_extension;
use crate::paths::absolutize;
use crate::types::{CustomNodeInventory, ModelInventory};

/// Source suffix marking a directory as a Python package.
const PYTHON_SUFFIX: &str = ".py";

/// Walk every model directory and collect files with a model extension.
///
/// Keys are bare filenames. When a filename occurs more than once the first
/// occurrence (directories in the given order, entries sorted by name) wins.
pub fn scan_models<P: AsRef<Path>>(roots: &[P]) -> ModelInventory {
    let mut inventory = ModelInventory::new();

    for root in roots {
        let root = root.as_ref();
        if !root.is_dir() {
            tracing::debug!(dir = %root.display(), "Model directory missing, skipping");
            continue;
        }

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unwalkable model entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if has_model_extension(name) {
                inventory
                    .entry(name.to_string())
                    .or_insert_with(|| absolutize(entry.path()));
            }
        }
    }

    tracing::info!(models = inventory.len(), "Model inventory built");
    inventory
}

/// Collect every directory under `root` (at any depth) that directly
/// contains a `.py` entry.
///
/// Keys are folder names; the first folder with a given name wins.
/// Symlinked plugin folders are followed.
pub fn scan_custom_nodes(root: &Path) -> CustomNodeInventory {
    let mut inventory = CustomNodeInventory::new();

    if !root.is_dir() {
        tracing::debug!(dir = %root.display(), "Custom nodes directory missing, skipping");
        return inventory;
    }

    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unwalkable custom node entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if contains_python_source(entry.path()) {
            inventory
                .entry(name.to_string())
                .or_insert_with(|| absolutize(entry.path()));
        }
    }

    tracing::info!(custom_nodes = inventory.len(), "Custom node inventory built");
    inventory
}

fn contains_python_source(dir: &Path) -> bool {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(Result::ok).any(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(PYTHON_SUFFIX))
        }),
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Cannot list directory");
            false
        }
    }
}
