//! Bundling orchestration: scan entry points into a `Bundle`, then compile
//! the bundle into output files.

pub mod bundle;
pub mod compile;
pub mod options;
pub mod runtime;

pub use bundle::{Bundle, scan};
pub use compile::compile;
pub use options::{BundleOptions, Format};

pub use baler_emitter::{OutputFile, SourceMapMode};
