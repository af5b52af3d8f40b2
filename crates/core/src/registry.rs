//! Node registry: which node types exist, who provides them, and what
//! inputs they declare.
//!
//! Two sources feed the registry:
//!
//! - an `object_info` dump exported from a running ComfyUI, which carries
//!   the full input schema of every node type plus its `python_module`;
//! - a source scan of each custom node folder for `NODE_CLASS_MAPPINGS`
//!   keys, which only yields node type -> folder ownership.
//!
//! Both are best effort. Malformed entries and unreadable files are skipped.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use walkdir::WalkDir;

use crate::error::CoreError;
use crate::model_files::has_model_extension;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Substrings of input names or declared type names that suggest the input
/// holds a model filename.
pub const MODEL_KEYWORDS: &[&str] = &[
    "ckpt",
    "checkpoint",
    "lora",
    "vae",
    "unet",
    "model",
    "clip_name",
    "controlnet",
    "control_net",
    "upscale",
    "embedding",
    "gguf",
    "ipadapter",
    "style_model",
    "gligen",
    "diffusion",
];

/// Declared type of a free-text widget.
const STRING_TYPE: &str = "STRING";

/// Declared type used by newer ComfyUI versions for combo widgets whose
/// options live in the input's option dict.
const COMBO_TYPE: &str = "COMBO";

/// Extension of Python source files.
const PYTHON_EXTENSION: &str = "py";

/// Module path prefix of node types provided by custom nodes.
const CUSTOM_NODES_MODULE: &str = "custom_nodes";

/// `NODE_CLASS_MAPPINGS = {...}` and `NODE_CLASS_MAPPINGS.update({...})`.
static MAPPING_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"NODE_CLASS_MAPPINGS\s*(?:=|\.update\(\s*)\s*\{([^}]*)\}").expect("valid regex")
});

/// A quoted key followed by a colon inside a mapping literal.
static MAPPING_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"'\n]+)["']\s*:"#).expect("valid regex"));

/// `NODE_CLASS_MAPPINGS["Key"] = Class`.
static MAPPING_ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"NODE_CLASS_MAPPINGS\[\s*["']([^"'\n]+)["']\s*\]\s*="#).expect("valid regex")
});

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Declared type of a node input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Drop-down widget; the options are the allowed values.
    Combo(Vec<String>),
    /// Named type such as `STRING`, `INT` or a connection type like `MODEL`.
    Named(String),
}

/// One declared input of a node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputSpec {
    pub name: String,
    pub kind: InputKind,
}

impl InputSpec {
    /// Whether this input plausibly holds a model filename.
    ///
    /// A combo qualifies when it offers model files; its name only counts
    /// when the option list is empty. Otherwise the declared type name or,
    /// for `STRING` widgets, the input name must contain a model keyword.
    pub fn is_model_like(&self) -> bool {
        let name_hint = contains_model_keyword(&self.name);
        match &self.kind {
            InputKind::Combo(options) if options.is_empty() => name_hint,
            InputKind::Combo(options) => options.iter().any(|o| has_model_extension(o)),
            InputKind::Named(type_name) => {
                contains_model_keyword(type_name) || (name_hint && type_name == STRING_TYPE)
            }
        }
    }

    /// Combo options, or an empty slice for non-combo inputs.
    pub fn options(&self) -> &[String] {
        match &self.kind {
            InputKind::Combo(options) => options,
            InputKind::Named(_) => &[],
        }
    }
}

/// A node type known to the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegisteredNode {
    /// Custom node folder providing this type; `None` for built-ins or
    /// when unknown.
    pub package: Option<String>,
    /// Declared inputs (empty when only known from a source scan).
    pub inputs: Vec<InputSpec>,
}

impl RegisteredNode {
    /// Inputs that plausibly hold model filenames.
    pub fn model_inputs(&self) -> impl Iterator<Item = &InputSpec> {
        self.inputs.iter().filter(|i| i.is_model_like())
    }
}

/// Node type -> registration details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeRegistry {
    nodes: BTreeMap<String, RegisteredNode>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a parsed `object_info` document.
    ///
    /// Entries that are not objects are skipped; inputs whose declaration
    /// cannot be understood are dropped individually.
    pub fn from_object_info(value: &Value) -> Self {
        let mut registry = Self::new();
        let Some(entries) = value.as_object() else {
            tracing::warn!("object_info is not a JSON object, ignoring");
            return registry;
        };

        for (node_type, info) in entries {
            let Some(info) = info.as_object() else {
                tracing::debug!(node_type = %node_type, "Skipping malformed object_info entry");
                continue;
            };

            let package = info
                .get("python_module")
                .and_then(Value::as_str)
                .and_then(package_from_module);

            let mut inputs = Vec::new();
            if let Some(input) = info.get("input") {
                for section in ["required", "optional"] {
                    if let Some(decls) = input.get(section).and_then(Value::as_object) {
                        inputs.extend(
                            decls
                                .iter()
                                .filter_map(|(name, decl)| parse_input_decl(name, decl)),
                        );
                    }
                }
            }

            registry
                .nodes
                .insert(node_type.clone(), RegisteredNode { package, inputs });
        }

        registry
    }

    /// Read and parse an `object_info` JSON file.
    pub fn try_load_object_info(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)?;
        Ok(Self::from_object_info(&value))
    }

    /// Like [`Self::try_load_object_info`] but degrades to an empty registry.
    pub fn load_object_info(path: &Path) -> Self {
        match Self::try_load_object_info(path) {
            Ok(registry) => {
                tracing::info!(
                    path = %path.display(),
                    node_types = registry.len(),
                    "Loaded object_info"
                );
                registry
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not load object_info -- continuing without schemas"
                );
                Self::new()
            }
        }
    }

    /// Scan every `.py` file under `custom_nodes_dir` for
    /// `NODE_CLASS_MAPPINGS` keys.
    ///
    /// Types are credited to the top-level plugin folder the file lives in,
    /// however deep the mapping is declared; a single-file plugin is named
    /// after its file stem. When two plugins register the same type, the one
    /// sorting first wins.
    pub fn scan_node_sources(custom_nodes_dir: &Path) -> Self {
        let mut registry = Self::new();
        if !custom_nodes_dir.is_dir() {
            tracing::debug!(dir = %custom_nodes_dir.display(), "No custom nodes directory to scan");
            return registry;
        }

        let walker = WalkDir::new(custom_nodes_dir)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker.into_iter().filter_map(Result::ok) {
            let path = entry.path();
            let is_source = entry.file_type().is_file()
                && path.extension().is_some_and(|ext| ext == PYTHON_EXTENSION);
            if !is_source {
                continue;
            }
            let Some(package) = plugin_folder(custom_nodes_dir, path) else {
                continue;
            };
            let Ok(text) = std::fs::read_to_string(path) else {
                tracing::debug!(path = %path.display(), "Skipping unreadable source file");
                continue;
            };
            for node_type in registered_node_types(&text) {
                registry
                    .nodes
                    .entry(node_type)
                    .or_insert_with(|| RegisteredNode {
                        package: Some(package.clone()),
                        inputs: Vec::new(),
                    });
            }
        }

        registry
    }

    /// Combine with a lower-priority registry.
    ///
    /// Entries already present keep their schema; a missing package is
    /// filled from `fallback`. Entries only in `fallback` are added.
    pub fn merge(mut self, fallback: NodeRegistry) -> Self {
        for (node_type, node) in fallback.nodes {
            match self.nodes.get_mut(&node_type) {
                Some(existing) => {
                    if existing.package.is_none() {
                        existing.package = node.package;
                    }
                }
                None => {
                    self.nodes.insert(node_type, node);
                }
            }
        }
        self
    }

    pub fn insert(&mut self, node_type: impl Into<String>, node: RegisteredNode) {
        self.nodes.insert(node_type.into(), node);
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl NodeRegistry {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, node_type: &str) -> Option<&RegisteredNode> {
        self.nodes.get(node_type)
    }

    /// Custom node folder providing `node_type`, if known.
    pub fn package_of(&self, node_type: &str) -> Option<&str> {
        self.nodes.get(node_type)?.package.as_deref()
    }

    /// Node types registered by the given custom node folder.
    pub fn node_types_of<'a>(&'a self, folder: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.nodes
            .iter()
            .filter(move |(_, node)| node.package.as_deref() == Some(folder))
            .map(|(node_type, _)| node_type.as_str())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn contains_model_keyword(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    MODEL_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Parse one `name: [TYPE, {options}]` input declaration.
fn parse_input_decl(name: &str, decl: &Value) -> Option<InputSpec> {
    let decl = decl.as_array()?;
    let kind = match decl.first()? {
        Value::Array(options) => InputKind::Combo(string_items(options)),
        Value::String(t) if t == COMBO_TYPE => {
            let options = decl
                .get(1)
                .and_then(|o| o.get("options"))
                .and_then(Value::as_array)
                .map(|o| string_items(o))
                .unwrap_or_default();
            InputKind::Combo(options)
        }
        Value::String(t) => InputKind::Named(t.clone()),
        _ => return None,
    };
    Some(InputSpec {
        name: name.to_string(),
        kind,
    })
}

/// Top-level plugin folder under `custom_nodes_dir` holding `path`.
fn plugin_folder(custom_nodes_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(custom_nodes_dir).ok()?;
    let first = relative.components().next()?.as_os_str().to_str()?;
    let folder = first.strip_suffix(".py").unwrap_or(first);
    (!folder.is_empty()).then(|| folder.to_string())
}

fn string_items(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Custom node folder named by a `python_module` value.
///
/// Handles the dotted form (`custom_nodes.ComfyUI-Impact-Pack.modules`)
/// and the path form used for single-file custom nodes
/// (`/opt/ComfyUI/custom_nodes/my_node.py`). Built-in modules yield `None`.
pub fn package_from_module(module: &str) -> Option<String> {
    if module.contains(['/', '\\']) {
        let mut parts = module.split(['/', '\\']).skip_while(|p| *p != CUSTOM_NODES_MODULE);
        parts.next()?;
        let folder = parts.next()?;
        let folder = folder.strip_suffix(".py").unwrap_or(folder);
        return (!folder.is_empty()).then(|| folder.to_string());
    }

    let rest = module.strip_prefix(CUSTOM_NODES_MODULE)?.strip_prefix('.')?;
    rest.split('.')
        .next()
        .filter(|f| !f.is_empty())
        .map(str::to_string)
}

/// Node type keys registered through `NODE_CLASS_MAPPINGS` in Python source.
pub fn registered_node_types(source: &str) -> Vec<String> {
    let mut found: Vec<String> = MAPPING_BLOCK_RE
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .flat_map(|block| {
            MAPPING_KEY_RE
                .captures_iter(block.as_str())
                .filter_map(|k| k.get(1).map(|m| m.as_str().to_string()))
                .collect::<Vec<_>>()
        })
        .chain(
            MAPPING_ASSIGN_RE
                .captures_iter(source)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string())),
        )
        .collect();
    found.sort();
    found.dedup();
    found
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
