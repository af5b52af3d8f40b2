//! Command-line arguments.
//!
//! Audit options start from [`AuditConfig::from_env`], so a `.env` file next
//! to the install works the same as explicit flags. Flags win.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use comfy_usage_core::config::AuditConfig;
use comfy_usage_core::error::CoreError;
use comfy_usage_core::extract::ExtractionStrategy;

#[derive(Debug, Parser)]
#[command(
    name = "comfy-usage",
    about = "Report which models and custom nodes your ComfyUI workflows actually use",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan workflows and print the usage report.
    Report(ReportArgs),
    /// Print the usage checker's node definition as JSON.
    Describe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// ComfyUI install root (holds `models/` and `custom_nodes/`)
    /// [env: COMFYUI_ROOT, default: .].
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Workflows directory, relative to the root unless absolute
    /// [env: WORKFLOWS_DIR, default: user/default/workflows].
    #[arg(long)]
    pub workflows_dir: Option<PathBuf>,

    /// How aggressively values are treated as model references: extensions,
    /// embeddings or schema [env: EXTRACTION_STRATEGY, default: embeddings].
    #[arg(long)]
    pub strategy: Option<ExtractionStrategy>,

    /// `object_info` JSON dump exported from a running ComfyUI
    /// [env: OBJECT_INFO_PATH].
    #[arg(long)]
    pub object_info: Option<PathBuf>,

    /// Additional model directory; repeatable or comma separated. Replaces
    /// the env list when given [env: EXTRA_MODEL_DIRS].
    #[arg(long = "extra-model-dir", value_delimiter = ',')]
    pub extra_model_dirs: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl ReportArgs {
    /// Environment configuration with these flags applied on top.
    ///
    /// An invalid `EXTRACTION_STRATEGY` is an error even when `--strategy`
    /// is given.
    pub fn to_config(&self) -> Result<AuditConfig, CoreError> {
        let mut config = AuditConfig::from_env()?;

        if let Some(root) = &self.root {
            config.comfy_root = root.clone();
        }
        if let Some(workflows_dir) = &self.workflows_dir {
            config.workflows_dir = workflows_dir.clone();
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(object_info) = &self.object_info {
            config.object_info = Some(object_info.clone());
        }
        if !self.extra_model_dirs.is_empty() {
            config.extra_model_dirs = self.extra_model_dirs.clone();
        }
        Ok(config)
    }
}
