//! Integration tests for argument parsing and command output.

use std::fs;
use std::path::PathBuf;

use clap::Parser;

use comfy_usage::args::{Cli, Command, OutputFormat};
use comfy_usage::commands::{self, Outcome};
use comfy_usage_core::extract::ExtractionStrategy;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("comfy-usage").chain(args.iter().copied()))
        .expect("arguments should parse")
}

fn run_to_string(cli: &Cli) -> (Outcome, String) {
    let mut out = Vec::new();
    let code = commands::run(&cli.command, &mut out).expect("command should not error");
    (code, String::from_utf8(out).expect("output should be utf-8"))
}

// ---------------------------------------------------------------------------
// Test: argument parsing
// ---------------------------------------------------------------------------

/// Report flags override the environment configuration field by field.
#[test]
fn report_flags_map_onto_audit_config() {
    let cli = parse(&[
        "report",
        "--root",
        "/opt/ComfyUI",
        "--workflows-dir",
        "flows",
        "--strategy",
        "schema",
        "--extra-model-dir",
        "/mnt/a,/mnt/b",
        "--extra-model-dir",
        "/mnt/c",
        "--format",
        "json",
    ]);

    let Command::Report(args) = &cli.command else {
        panic!("expected report command");
    };
    assert_eq!(args.format, OutputFormat::Json);

    let config = args.to_config().unwrap();
    assert_eq!(config.strategy, ExtractionStrategy::Schema);
    assert_eq!(
        config.extra_model_dirs,
        [PathBuf::from("/mnt/a"), PathBuf::from("/mnt/b"), PathBuf::from("/mnt/c")]
    );
    assert_eq!(
        config.resolved_workflows_dir(),
        PathBuf::from("/opt/ComfyUI/flows")
    );
}

/// An unknown `--strategy` value fails argument parsing.
#[test]
fn unknown_strategy_is_rejected() {
    let result = Cli::try_parse_from(["comfy-usage", "report", "--strategy", "guess"]);
    assert!(result.is_err());
}

/// Flags left out keep whatever the environment configured.
#[test]
fn omitted_flags_are_left_unset() {
    let cli = parse(&["report"]);
    let Command::Report(args) = &cli.command else {
        panic!("expected report command");
    };
    assert!(args.root.is_none());
    assert!(args.workflows_dir.is_none());
    assert!(args.strategy.is_none());
    assert!(args.extra_model_dirs.is_empty());
}

// ---------------------------------------------------------------------------
// Test: command output
// ---------------------------------------------------------------------------

/// `describe` prints the node contract as JSON.
#[test]
fn describe_prints_node_definition() {
    let (code, out) = run_to_string(&parse(&["describe"]));
    assert_eq!(code, Outcome::Completed);

    let def: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(def["name"], "ComfyUIUsageChecker");
    assert_eq!(def["output_name"][0], "report");
}

/// A missing workflows directory prints one line and exits non-zero.
#[test]
fn missing_workflows_dir_prints_message_and_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().to_str().unwrap();

    let (code, out) = run_to_string(&parse(&["report", "--root", root, "--workflows-dir", "none"]));

    assert_eq!(code, Outcome::WorkflowDirMissing);
    assert!(out.starts_with("Workflow dir not found: "));
    assert_eq!(out.lines().count(), 1);
}

/// The text report lists used models and their dependencies.
#[test]
fn text_report_printed_for_existing_install() {
    let tmp = tempfile::tempdir().unwrap();
    let flows = tmp.path().join("user/default/workflows");
    fs::create_dir_all(&flows).unwrap();
    fs::create_dir_all(tmp.path().join("models/loras")).unwrap();
    fs::write(tmp.path().join("models/loras/ink.safetensors"), b"").unwrap();
    fs::write(
        flows.join("a.json"),
        r#"{"nodes": [{"type": "LoraLoader", "widgets_values": ["ink.safetensors", 1.0]}]}"#,
    )
    .unwrap();

    let root = tmp.path().to_str().unwrap();
    let (code, out) = run_to_string(&parse(&["report", "--root", root]));

    assert_eq!(code, Outcome::Completed);
    assert!(out.starts_with("===== ComfyUI Global Usage Report ====="));
    assert!(out.contains("---- Used Models ----\n  ink.safetensors ("));
    assert!(out.contains("  LoraLoader: ink.safetensors"));
}

/// `--format json` emits a parseable analysis.
#[test]
fn json_report_is_valid_json() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("user/default/workflows")).unwrap();

    let root = tmp.path().to_str().unwrap();
    let (code, out) = run_to_string(&parse(&["report", "--root", root, "--format", "json"]));

    assert_eq!(code, Outcome::Completed);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["workflows_scanned"], 0);
    assert!(parsed["used_models"].as_object().unwrap().is_empty());
}
