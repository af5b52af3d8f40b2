//! Lexical path helpers.
//!
//! Paths are normalized without touching the filesystem so that a missing
//! directory still renders as a clean path in the report.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components lexically.
///
/// `..` at the root is dropped; leading `..` of a relative path is kept.
/// An empty result becomes `.`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Make `path` absolute against the current directory, then normalize it.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize(path);
    }
    match std::env::current_dir() {
        Ok(cwd) => normalize(&cwd.join(path)),
        Err(e) => {
            tracing::debug!(error = %e, "Current directory unavailable, keeping relative path");
            normalize(path)
        }
    }
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}
