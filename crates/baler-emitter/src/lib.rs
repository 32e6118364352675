//! Chunk emission for the baler bundler.
//!
//! The only parallel stage of the pipeline: each chunk prints its sources
//! concurrently, then assembly concatenates the buffers in deterministic
//! order and stitches the per-file source-map batches into one document.

pub mod emit_chunk;
pub mod printer;
pub mod transform;

pub use emit_chunk::{EmitOptions, OutputFile, OutputFormat, SourceMapMode, emit_chunk};
pub use printer::{PrintOptions, PrintResult, print_stmts};
