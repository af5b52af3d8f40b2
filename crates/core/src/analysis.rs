//! Cross-referencing usage against installed inventories.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::registry::NodeRegistry;
use crate::types::{CustomNodeInventory, ModelInventory, Timestamp};
use crate::usage::UsageSet;

/// Result of one audit: what is used, what is not, and what is missing.
#[derive(Debug, Clone, Serialize)]
pub struct UsageAnalysis {
    /// Workflows directory that was scanned.
    pub workflows_dir: PathBuf,
    pub generated_at: Timestamp,
    pub workflows_scanned: usize,
    pub workflows_skipped: usize,
    /// Installed models referenced by at least one workflow.
    pub used_models: ModelInventory,
    /// Installed models no workflow references.
    pub unused_models: ModelInventory,
    /// Referenced models that are not installed.
    pub missing_models: BTreeSet<String>,
    /// Every node type used, with its custom node folder when one is known.
    pub used_custom_nodes: BTreeMap<String, Option<PathBuf>>,
    /// Custom node folders none of whose node types are used.
    pub unused_custom_nodes: CustomNodeInventory,
    /// Node type -> referenced model filenames.
    pub dependencies: BTreeMap<String, BTreeSet<String>>,
}

/// Compute used / unused / missing sets.
///
/// A used node type resolves to the custom node folder of the same name, or
/// failing that to the folder the registry says provides it. A folder is
/// unused when its name is not a used node type and none of the node types
/// the registry attributes to it are used, and it does not sit inside a
/// folder that is in use.
pub fn analyze(
    workflows_dir: &Path,
    usage: UsageSet,
    models: &ModelInventory,
    custom_nodes: &CustomNodeInventory,
    registry: &NodeRegistry,
) -> UsageAnalysis {
    let (used_models, unused_models): (ModelInventory, ModelInventory) = models
        .iter()
        .map(|(name, path)| (name.clone(), path.clone()))
        .partition(|(name, _)| usage.models.contains(name));

    let missing_models = usage
        .models
        .iter()
        .filter(|name| !models.contains_key(*name))
        .cloned()
        .collect();

    let used_custom_nodes: BTreeMap<String, Option<PathBuf>> = usage
        .node_types
        .iter()
        .map(|node_type| {
            let path = custom_nodes
                .get(node_type)
                .or_else(|| {
                    registry
                        .package_of(node_type)
                        .and_then(|pkg| custom_nodes.get(pkg))
                })
                .cloned();
            (node_type.clone(), path)
        })
        .collect();

    let used_folders: BTreeSet<&PathBuf> = used_custom_nodes.values().flatten().collect();

    let unused_custom_nodes = custom_nodes
        .iter()
        .filter(|(folder, path)| {
            !usage.node_types.contains(*folder)
                && !registry
                    .node_types_of(folder)
                    .any(|t| usage.node_types.contains(t))
                && !used_folders.iter().any(|used| path.starts_with(used))
        })
        .map(|(folder, path)| (folder.clone(), path.clone()))
        .collect();

    UsageAnalysis {
        workflows_dir: workflows_dir.to_path_buf(),
        generated_at: chrono::Utc::now(),
        workflows_scanned: usage.workflows_scanned,
        workflows_skipped: usage.workflows_skipped,
        used_models,
        unused_models,
        missing_models,
        used_custom_nodes,
        unused_custom_nodes,
        dependencies: usage.dependencies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegisteredNode;

    fn inventory(entries: &[(&str, &str)]) -> BTreeMap<String, PathBuf> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), PathBuf::from(v)))
            .collect()
    }

    fn usage(models: &[&str], node_types: &[&str]) -> UsageSet {
        let mut usage = UsageSet::new();
        for m in models {
            usage.record_model(None, m);
        }
        for t in node_types {
            usage.record_node_type(t);
        }
        usage
    }

    #[test]
    fn models_split_into_used_unused_and_missing() {
        let models = inventory(&[
            ("a.safetensors", "/m/a.safetensors"),
            ("b.ckpt", "/m/b.ckpt"),
        ]);
        let analysis = analyze(
            Path::new("/w"),
            usage(&["a.safetensors", "gone.pt"], &[]),
            &models,
            &CustomNodeInventory::new(),
            &NodeRegistry::new(),
        );

        assert_eq!(
            analysis.used_models.keys().collect::<Vec<_>>(),
            ["a.safetensors"]
        );
        assert_eq!(analysis.unused_models.keys().collect::<Vec<_>>(), ["b.ckpt"]);
        assert_eq!(
            analysis.missing_models.iter().collect::<Vec<_>>(),
            ["gone.pt"]
        );
    }

    #[test]
    fn used_node_types_always_listed() {
        let nodes = inventory(&[("MyNode", "/c/MyNode")]);
        let analysis = analyze(
            Path::new("/w"),
            usage(&[], &["MyNode", "KSampler"]),
            &ModelInventory::new(),
            &nodes,
            &NodeRegistry::new(),
        );

        assert_eq!(
            analysis.used_custom_nodes["MyNode"],
            Some(PathBuf::from("/c/MyNode"))
        );
        assert_eq!(analysis.used_custom_nodes["KSampler"], None);
        assert!(analysis.unused_custom_nodes.is_empty());
    }

    #[test]
    fn folder_name_matching_only_without_registry() {
        let nodes = inventory(&[("ComfyUI-Impact-Pack", "/c/impact")]);
        let analysis = analyze(
            Path::new("/w"),
            usage(&[], &["FaceDetailer"]),
            &ModelInventory::new(),
            &nodes,
            &NodeRegistry::new(),
        );

        assert_eq!(analysis.used_custom_nodes["FaceDetailer"], None);
        assert!(analysis
            .unused_custom_nodes
            .contains_key("ComfyUI-Impact-Pack"));
    }

    #[test]
    fn registry_maps_node_types_to_folders() {
        let nodes = inventory(&[
            ("ComfyUI-Impact-Pack", "/c/impact"),
            ("unused-pack", "/c/unused"),
        ]);
        let mut registry = NodeRegistry::new();
        registry.insert(
            "FaceDetailer",
            RegisteredNode {
                package: Some("ComfyUI-Impact-Pack".into()),
                inputs: Vec::new(),
            },
        );

        let analysis = analyze(
            Path::new("/w"),
            usage(&[], &["FaceDetailer"]),
            &ModelInventory::new(),
            &nodes,
            &registry,
        );

        assert_eq!(
            analysis.used_custom_nodes["FaceDetailer"],
            Some(PathBuf::from("/c/impact"))
        );
        assert_eq!(
            analysis.unused_custom_nodes.keys().collect::<Vec<_>>(),
            ["unused-pack"]
        );
    }

    #[test]
    fn folders_nested_in_a_used_plugin_are_not_unused() {
        let nodes = inventory(&[
            ("ComfyUI-Pack", "/c/ComfyUI-Pack"),
            ("py", "/c/ComfyUI-Pack/py"),
            ("Other-Pack", "/c/Other-Pack"),
        ]);
        let mut registry = NodeRegistry::new();
        registry.insert(
            "PackNode",
            RegisteredNode {
                package: Some("ComfyUI-Pack".into()),
                inputs: Vec::new(),
            },
        );

        let analysis = analyze(
            Path::new("/w"),
            usage(&[], &["PackNode"]),
            &ModelInventory::new(),
            &nodes,
            &registry,
        );

        assert_eq!(
            analysis.unused_custom_nodes.keys().collect::<Vec<_>>(),
            ["Other-Pack"]
        );
    }
}
