use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::extract::ExtractionStrategy;
use crate::paths::{absolutize, resolve_against};

/// Workflows directory used when none is configured, relative to the root.
pub const DEFAULT_WORKFLOWS_DIR: &str = "user/default/workflows";

/// Models directory, relative to the root.
pub const MODELS_DIR: &str = "models";

/// Custom nodes directory, relative to the root.
pub const CUSTOM_NODES_DIR: &str = "custom_nodes";

/// Audit configuration.
///
/// Relative paths are resolved against `comfy_root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConfig {
    /// ComfyUI install root (the directory holding `models/` and `custom_nodes/`).
    pub comfy_root: PathBuf,
    /// Directory of saved workflows.
    pub workflows_dir: PathBuf,
    /// Additional model directories, e.g. shared model stores.
    pub extra_model_dirs: Vec<PathBuf>,
    pub strategy: ExtractionStrategy,
    /// Optional `object_info` dump used for node ownership and input schemas.
    pub object_info: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

impl AuditConfig {
    pub fn new(comfy_root: impl Into<PathBuf>) -> Self {
        Self {
            comfy_root: comfy_root.into(),
            workflows_dir: PathBuf::from(DEFAULT_WORKFLOWS_DIR),
            extra_model_dirs: Vec::new(),
            strategy: ExtractionStrategy::default(),
            object_info: None,
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default                  |
    /// |-----------------------|--------------------------|
    /// | `COMFYUI_ROOT`        | `.`                      |
    /// | `WORKFLOWS_DIR`       | `user/default/workflows` |
    /// | `EXTRACTION_STRATEGY` | `embeddings`             |
    /// | `OBJECT_INFO_PATH`    | unset                    |
    /// | `EXTRA_MODEL_DIRS`    | unset (comma separated)  |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`] but reads variables through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let comfy_root = var("COMFYUI_ROOT").unwrap_or_else(|| ".".into());

        let workflows_dir = var("WORKFLOWS_DIR").unwrap_or_else(|| DEFAULT_WORKFLOWS_DIR.into());

        let strategy = match var("EXTRACTION_STRATEGY") {
            Some(s) => s.parse::<ExtractionStrategy>()?,
            None => ExtractionStrategy::default(),
        };

        let object_info = var("OBJECT_INFO_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let extra_model_dirs = var("EXTRA_MODEL_DIRS")
            .map(|v| parse_dir_list(&v))
            .unwrap_or_default();

        Ok(Self {
            comfy_root: PathBuf::from(comfy_root),
            workflows_dir: PathBuf::from(workflows_dir),
            extra_model_dirs,
            strategy,
            object_info,
        })
    }

    /// Absolute install root.
    pub fn root(&self) -> PathBuf {
        absolutize(&self.comfy_root)
    }

    pub fn resolved_workflows_dir(&self) -> PathBuf {
        self.resolve(&self.workflows_dir)
    }

    pub fn custom_nodes_dir(&self) -> PathBuf {
        self.root().join(CUSTOM_NODES_DIR)
    }

    /// `models/` under the root followed by every extra model directory.
    pub fn model_dirs(&self) -> Vec<PathBuf> {
        std::iter::once(self.root().join(MODELS_DIR))
            .chain(self.extra_model_dirs.iter().map(|d| self.resolve(d)))
            .collect()
    }

    pub fn resolved_object_info(&self) -> Option<PathBuf> {
        self.object_info.as_deref().map(|p| self.resolve(p))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        resolve_against(&self.root(), path)
    }
}

/// Split a comma-separated directory list, dropping blanks.
pub fn parse_dir_list(value: &str) -> Vec<PathBuf> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}
