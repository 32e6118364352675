//! Filesystem abstraction and import path resolution.
//!
//! Paths are `/`-separated absolute strings throughout the bundler; the
//! helpers here are pure string manipulation so resolution behaves the same
//! on every platform and in tests.

pub mod fs;
pub mod path;
pub mod resolver;

pub use fs::{FileSystem, MockFileSystem, OsFileSystem};
pub use resolver::{Loader, Resolved, Resolver};
