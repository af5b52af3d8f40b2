//! Sub-command execution.
//!
//! Output goes to the supplied writer so tests can capture it; logs go to
//! stderr through `tracing`.

use std::io::Write;
use std::process::ExitCode;

use comfy_usage_core::audit::run_audit;
use comfy_usage_core::error::CoreError;
use comfy_usage_core::node::UsageCheckerNode;
use comfy_usage_core::report::{render_json, render_text};

use crate::args::{Command, OutputFormat, ReportArgs};

/// How a command finished, short of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The workflows directory does not exist; only the message was printed.
    WorkflowDirMissing,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Completed => ExitCode::SUCCESS,
            Outcome::WorkflowDirMissing => ExitCode::FAILURE,
        }
    }
}

pub fn run(command: &Command, out: &mut impl Write) -> anyhow::Result<Outcome> {
    match command {
        Command::Report(args) => report(args, out),
        Command::Describe => {
            let definition = serde_json::to_string_pretty(&UsageCheckerNode::definition())?;
            writeln!(out, "{definition}")?;
            Ok(Outcome::Completed)
        }
    }
}

fn report(args: &ReportArgs, out: &mut impl Write) -> anyhow::Result<Outcome> {
    let config = args.to_config()?;

    let analysis = match run_audit(&config) {
        Ok(analysis) => analysis,
        Err(e @ CoreError::WorkflowDirNotFound(_)) => {
            tracing::error!(error = %e, "Nothing to scan");
            writeln!(out, "{e}")?;
            return Ok(Outcome::WorkflowDirMissing);
        }
        Err(e) => return Err(e.into()),
    };

    let rendered = match args.format {
        OutputFormat::Text => render_text(&analysis),
        OutputFormat::Json => render_json(&analysis)?,
    };
    writeln!(out, "{rendered}")?;

    Ok(Outcome::Completed)
}
