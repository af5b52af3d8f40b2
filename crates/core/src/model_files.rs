//! Model file recognition.
//!
//! A string is treated as a model reference when it ends in one of the
//! known weight-file extensions. Matching is case-insensitive because
//! workflows saved on different platforms disagree about casing.

/// Weight-file extensions recognised as models.
pub const MODEL_EXTENSIONS: &[&str] = &[
    ".safetensors",
    ".ckpt",
    ".pt",
    ".bin",
    ".pth",
    ".onnx",
    ".gguf",
];

/// Extension appended to embedding names that carry none.
pub const DEFAULT_EMBEDDING_EXTENSION: &str = ".pt";

/// Whether `value` ends with a model extension (case-insensitive).
pub fn has_model_extension(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    MODEL_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Final path component of a model reference.
///
/// Both `/` and `\` are treated as separators: a workflow saved on Windows
/// references `SD1.5\model.safetensors` even when audited on Linux.
pub fn model_basename(value: &str) -> &str {
    value
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(value)
}
