//! `comfy-usage` library crate.
//!
//! Re-exports the argument and command modules for integration testing.
//! The binary entrypoint lives in `main.rs`.

pub mod args;
pub mod commands;
