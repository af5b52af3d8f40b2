//! Embedding tag extraction from prompt text.
//!
//! Prompts reference textual-inversion embeddings inline as
//! `embedding:NAME` or `<embedding:NAME>`, optionally weighted as
//! `(embedding:NAME:1.2)`. The name may omit its file extension, in which
//! case ComfyUI resolves it to a `.pt` file.

use std::sync::LazyLock;

use regex::Regex;

use crate::model_files::{has_model_extension, model_basename, DEFAULT_EMBEDDING_EXTENSION};

/// Regex pattern matching an embedding tag and capturing its name.
///
/// The name ends at whitespace, a comma, a closing `>` or `)`, or a `:`
/// that introduces a weight.
pub const EMBEDDING_TAG_PATTERN: &str = r"<?embedding:([^\s,>):]+)";

static EMBEDDING_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMBEDDING_TAG_PATTERN).expect("valid regex"));

/// Extract normalized embedding filenames from a prompt string.
///
/// Returns names in order of appearance; duplicates are kept so callers
/// can decide how to collect them.
pub fn extract_embeddings(text: &str) -> Vec<String> {
    EMBEDDING_TAG_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| normalize_embedding_name(m.as_str()))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Strip any directory part and append `.pt` when no model extension is present.
pub fn normalize_embedding_name(name: &str) -> String {
    let base = model_basename(name.trim());
    if base.is_empty() || has_model_extension(base) {
        base.to_string()
    } else {
        format!("{base}{DEFAULT_EMBEDDING_EXTENSION}")
    }
}
