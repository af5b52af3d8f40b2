//! `comfy-usage` -- ComfyUI workflow usage report.
//!
//! Scans saved workflows, cross-references the models and node types they
//! use against what is installed, and prints used / unused models and
//! custom nodes.
//!
//! # Environment variables
//!
//! | Variable              | Required | Default                  | Description                          |
//! |-----------------------|----------|--------------------------|--------------------------------------|
//! | `COMFYUI_ROOT`        | no       | `.`                      | ComfyUI install root                 |
//! | `WORKFLOWS_DIR`       | no       | `user/default/workflows` | Workflows directory                  |
//! | `EXTRACTION_STRATEGY` | no       | `embeddings`             | `extensions`, `embeddings`, `schema` |
//! | `OBJECT_INFO_PATH`    | no       | --                       | Exported `object_info` JSON          |
//! | `EXTRA_MODEL_DIRS`    | no       | --                       | Comma-separated model directories    |
//! | `RUST_LOG`            | no       | `comfy_usage=info,comfy_usage_core=info` | Log filter           |

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use comfy_usage::args::Cli;
use comfy_usage::commands;

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comfy_usage=info,comfy_usage_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let stdout = std::io::stdout();
    let outcome = commands::run(&cli.command, &mut stdout.lock())?;
    Ok(outcome.into())
}
