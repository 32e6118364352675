//! Common types and utilities for the baler bundler.
//!
//! This crate provides foundational types used across all baler crates:
//! - Source spans (`Span`)
//! - Line/column conversion (`LineMap`, `Location`)
//! - Diagnostics (`Diagnostic`, `Log`)
//! - Source map generation (VLQ encoding, `SourceMapGenerator`)

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Line/column conversion for diagnostics and source maps
pub mod position;
pub use position::{LineMap, Location};

// Diagnostics accumulated while scanning and linking
pub mod log;
pub use log::{Diagnostic, Log, Severity};

// Source map generation
pub mod source_map;
