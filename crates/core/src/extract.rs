//! Model reference extraction from workflow nodes.
//!
//! Three strategies of increasing aggressiveness:
//!
//! - [`ExtractionStrategy::Extensions`]: any string leaf ending in a model
//!   extension.
//! - [`ExtractionStrategy::Embeddings`]: the above, plus `embedding:NAME`
//!   tags inside prompt text.
//! - [`ExtractionStrategy::Schema`]: the above, plus values of inputs the
//!   node registry declares as model-like, even without an extension.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::embedding::extract_embeddings;
use crate::error::CoreError;
use crate::model_files::{has_model_extension, model_basename};
use crate::registry::NodeRegistry;

/// Combo value meaning "no model selected".
const NONE_OPTION: &str = "none";

/// How aggressively string values are treated as model references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    Extensions,
    #[default]
    Embeddings,
    Schema,
}

impl ExtractionStrategy {
    pub const ALL: [ExtractionStrategy; 3] = [Self::Extensions, Self::Embeddings, Self::Schema];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extensions => "extensions",
            Self::Embeddings => "embeddings",
            Self::Schema => "schema",
        }
    }

    fn scans_embeddings(&self) -> bool {
        matches!(self, Self::Embeddings | Self::Schema)
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == wanted)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown extraction strategy: '{s}'. Valid strategies: extensions, embeddings, schema"
                ))
            })
    }
}

/// Extracts model filenames from workflow nodes.
#[derive(Debug, Clone, Copy)]
pub struct ModelExtractor<'a> {
    strategy: ExtractionStrategy,
    registry: &'a NodeRegistry,
}

impl<'a> ModelExtractor<'a> {
    pub fn new(strategy: ExtractionStrategy, registry: &'a NodeRegistry) -> Self {
        Self { strategy, registry }
    }

    pub fn strategy(&self) -> ExtractionStrategy {
        self.strategy
    }

    /// Model filenames referenced anywhere inside `node`.
    pub fn extract_node(&self, node_type: Option<&str>, node: &Value) -> BTreeSet<String> {
        let mut found = extract_models(node, self.strategy);
        if self.strategy == ExtractionStrategy::Schema {
            if let Some(node_type) = node_type {
                self.extract_by_schema(node_type, node, &mut found);
            }
        }
        found
    }

    fn extract_by_schema(&self, node_type: &str, node: &Value, found: &mut BTreeSet<String>) {
        let Some(registered) = self.registry.get(node_type) else {
            return;
        };

        let model_inputs: Vec<_> = registered.model_inputs().collect();
        if model_inputs.is_empty() {
            return;
        }

        // Keyed inputs (API format) can be matched by name directly.
        if let Some(inputs) = node.get("inputs").and_then(Value::as_object) {
            for input in &model_inputs {
                if let Some(value) = inputs.get(&input.name).and_then(Value::as_str) {
                    insert_reference(found, value);
                }
            }
        }

        // Positional widget values (UI format) are matched by combo membership.
        let options: HashSet<&str> = model_inputs
            .iter()
            .flat_map(|input| input.options())
            .map(String::as_str)
            .collect();
        if !options.is_empty() {
            visit_strings(node, &mut |s| {
                if options.contains(s) {
                    insert_reference(found, s);
                }
            });
        }
    }
}

/// Model filenames found in `value` without consulting any registry.
pub fn extract_models(value: &Value, strategy: ExtractionStrategy) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    visit_strings(value, &mut |s| {
        if has_model_extension(s) {
            found.insert(model_basename(s).to_string());
        }
        if strategy.scans_embeddings() {
            found.extend(extract_embeddings(s));
        }
    });
    found
}

fn insert_reference(found: &mut BTreeSet<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(NONE_OPTION) {
        return;
    }
    let base = model_basename(value);
    if !base.is_empty() {
        found.insert(base.to_string());
    }
}

/// Call `f` on every string leaf of `value`, depth first.
pub fn visit_strings<'v>(value: &'v Value, f: &mut impl FnMut(&'v str)) {
    match value {
        Value::String(s) => f(s),
        Value::Array(items) => {
            for item in items {
                visit_strings(item, f);
            }
        }
        Value::Object(map) => {
            for v in map.values() {
                visit_strings(v, f);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    // -- ExtractionStrategy ---------------------------------------------------

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!(
            "Schema".parse::<ExtractionStrategy>().unwrap(),
            ExtractionStrategy::Schema
        );
        assert_eq!(
            " extensions ".parse::<ExtractionStrategy>().unwrap(),
            ExtractionStrategy::Extensions
        );
    }

    #[test]
    fn unknown_strategy_rejected() {
        assert!("regex".parse::<ExtractionStrategy>().is_err());
    }

    #[test]
    fn default_strategy_is_embeddings() {
        assert_eq!(ExtractionStrategy::default(), ExtractionStrategy::Embeddings);
    }

    // -- extract_models -------------------------------------------------------

    #[test]
    fn nested_leaves_are_visited() {
        let node = json!({
            "widgets_values": ["SDXL/base.safetensors", 7, true],
            "properties": {"models": [{"name": "vae.PT"}]},
            "title": "Loader"
        });
        let found = extract_models(&node, ExtractionStrategy::Extensions);
        assert_eq!(names(&found), ["base.safetensors", "vae.PT"]);
    }

    #[test]
    fn extensions_strategy_ignores_embedding_tags() {
        let node = json!({"widgets_values": ["embedding:easyneg, ugly"]});
        assert!(extract_models(&node, ExtractionStrategy::Extensions).is_empty());
    }

    #[test]
    fn embeddings_strategy_finds_tags() {
        let node = json!({"widgets_values": ["embedding:easyneg, ugly"]});
        let found = extract_models(&node, ExtractionStrategy::Embeddings);
        assert_eq!(names(&found), ["easyneg.pt"]);
    }

    // -- ModelExtractor (schema) ----------------------------------------------

    fn schema_registry() -> NodeRegistry {
        NodeRegistry::from_object_info(&json!({
            "UpscaleModelLoader": {
                "input": {"required": {
                    "model_name": [["4x-UltraSharp", "RealESRGAN_x4.pth", "None"]]
                }},
                "python_module": "comfy_extras.nodes_upscale_model"
            },
            "CustomLoader": {
                "input": {"required": {"lora_path": ["STRING", {}]}},
                "python_module": "custom_nodes.my-pack"
            }
        }))
    }

    #[test]
    fn schema_matches_combo_values_without_extension() {
        let registry = schema_registry();
        let extractor = ModelExtractor::new(ExtractionStrategy::Schema, &registry);
        let node = json!({"type": "UpscaleModelLoader", "widgets_values": ["4x-UltraSharp"]});
        let found = extractor.extract_node(Some("UpscaleModelLoader"), &node);
        assert_eq!(names(&found), ["4x-UltraSharp"]);
    }

    #[test]
    fn schema_ignores_resampling_method_combos() {
        let registry = NodeRegistry::from_object_info(&json!({
            "ImageScale": {
                "input": {"required": {
                    "upscale_method": [["nearest-exact", "bilinear", "bislerp"]],
                    "crop": [["disabled", "center"]]
                }},
                "python_module": "nodes"
            },
            "LatentUpscale": {
                "input": {"required": {
                    "upscale_method": [["nearest-exact", "bilinear", "bislerp"]]
                }},
                "python_module": "nodes"
            }
        }));
        let extractor = ModelExtractor::new(ExtractionStrategy::Schema, &registry);

        let scale = json!({
            "type": "ImageScale",
            "widgets_values": ["nearest-exact", 512, 512, "disabled"]
        });
        let latent = json!({
            "class_type": "LatentUpscale",
            "inputs": {"upscale_method": "bislerp"}
        });

        assert!(extractor.extract_node(Some("ImageScale"), &scale).is_empty());
        assert!(extractor.extract_node(Some("LatentUpscale"), &latent).is_empty());
    }

    #[test]
    fn schema_matches_named_inputs() {
        let registry = schema_registry();
        let extractor = ModelExtractor::new(ExtractionStrategy::Schema, &registry);
        let node = json!({
            "class_type": "CustomLoader",
            "inputs": {"lora_path": "styles/inkwash"}
        });
        let found = extractor.extract_node(Some("CustomLoader"), &node);
        assert_eq!(names(&found), ["inkwash"]);
    }

    #[test]
    fn schema_skips_none_option() {
        let registry = schema_registry();
        let extractor = ModelExtractor::new(ExtractionStrategy::Schema, &registry);
        let node = json!({"widgets_values": ["None"]});
        assert!(extractor
            .extract_node(Some("UpscaleModelLoader"), &node)
            .is_empty());
    }

    #[test]
    fn non_schema_strategy_ignores_registry() {
        let registry = schema_registry();
        let extractor = ModelExtractor::new(ExtractionStrategy::Embeddings, &registry);
        let node = json!({"widgets_values": ["4x-UltraSharp"]});
        assert!(extractor
            .extract_node(Some("UpscaleModelLoader"), &node)
            .is_empty());
    }

    #[test]
    fn unknown_node_type_falls_back_to_extensions() {
        let registry = schema_registry();
        let extractor = ModelExtractor::new(ExtractionStrategy::Schema, &registry);
        let node = json!({"widgets_values": ["x.ckpt", "4x-UltraSharp"]});
        let found = extractor.extract_node(Some("Unknown"), &node);
        assert_eq!(names(&found), ["x.ckpt"]);
    }
}
