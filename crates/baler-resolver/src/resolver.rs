//! Import specifier resolution.
//!
//! Relative and absolute specifiers resolve against the importing file's
//! directory with extension probing. Bare specifiers (package names) are not
//! resolved here: the scan records them as resolution failures and continues.

use rustc_hash::FxHashMap;

use crate::fs::FileSystem;
use crate::path;

/// The reserved specifier that maps to the runtime module (source index 0).
pub const RUNTIME_PATH: &str = "<runtime>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    Js,
    Jsx,
    Ts,
    Tsx,
    Json,
    Text,
    Base64,
    DataUrl,
}

impl Loader {
    /// The default extension table; `BundleOptions` may override entries.
    #[must_use]
    pub fn default_extension_map() -> FxHashMap<String, Loader> {
        let mut map = FxHashMap::default();
        map.insert(".js".to_string(), Loader::Js);
        map.insert(".mjs".to_string(), Loader::Js);
        map.insert(".cjs".to_string(), Loader::Js);
        map.insert(".jsx".to_string(), Loader::Jsx);
        map.insert(".ts".to_string(), Loader::Ts);
        map.insert(".tsx".to_string(), Loader::Tsx);
        map.insert(".json".to_string(), Loader::Json);
        map.insert(".txt".to_string(), Loader::Text);
        map
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Absolute path of the target file.
    Path(String),
    /// The runtime sentinel.
    Runtime,
    /// Nothing matched.
    Missing,
}

/// Probing order for extension-less relative imports.
const PROBE_EXTENSIONS: &[&str] = &[".js", ".jsx", ".ts", ".tsx", ".json"];

pub struct Resolver<'fs> {
    fs: &'fs dyn FileSystem,
}

impl<'fs> Resolver<'fs> {
    #[must_use]
    pub fn new(fs: &'fs dyn FileSystem) -> Self {
        Resolver { fs }
    }

    /// Resolve `specifier` as imported from `containing_path`.
    pub fn resolve(&self, containing_path: &str, specifier: &str) -> Resolved {
        if specifier == RUNTIME_PATH {
            return Resolved::Runtime;
        }
        if !specifier.starts_with("./")
            && !specifier.starts_with("../")
            && !specifier.starts_with('/')
        {
            // Bare specifier: no package resolution in this bundler.
            return Resolved::Missing;
        }

        let joined = path::join(path::dir(containing_path), specifier);
        if self.fs.exists(&joined) {
            return Resolved::Path(joined);
        }
        for ext in PROBE_EXTENSIONS {
            let probe = format!("{joined}{ext}");
            if self.fs.exists(&probe) {
                return Resolved::Path(probe);
            }
        }
        let index = format!("{joined}/index.js");
        if self.fs.exists(&index) {
            return Resolved::Path(index);
        }
        tracing::debug!(containing_path, specifier, "import path did not resolve");
        Resolved::Missing
    }
}
