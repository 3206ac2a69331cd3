//! Shared utilities for revkeep.
//!
//! This crate provides the small pieces every other revkeep crate leans on:
//! - Path utilities (config directory, absolute and normalized paths)
//! - Logging setup with tracing

pub mod log;
pub mod path;

pub use path::{absolute, config_dir, normalize};
