//! JavaScript parser, AST and symbol tables for the baler bundler.
//!
//! This crate provides:
//! - The tagged-sum AST (`ast`)
//! - Symbol storage with union-find merging (`symbols`)
//! - The recursive-descent parser (`parser`, `expr`)
//! - The bind pass building scopes, parts and import/export tables (`bind`)

pub mod ast;
pub mod bind;
mod expr;
pub mod parser;
pub mod symbols;

pub use parser::{ParseOptions, parse_module};
