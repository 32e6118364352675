//! Bundle-wide options.

use rustc_hash::FxHashMap;

use baler_emitter::{OutputFormat, SourceMapMode};
use baler_resolver::Loader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Defaults to IIFE when bundling.
    #[default]
    None,
    Iife,
    CommonJs,
    EsModule,
}

impl Format {
    #[must_use]
    pub fn resolve(self, is_bundling: bool) -> OutputFormat {
        match self {
            Format::None => {
                if is_bundling {
                    OutputFormat::Iife
                } else {
                    OutputFormat::CommonJs
                }
            }
            Format::Iife => OutputFormat::Iife,
            Format::CommonJs => OutputFormat::CommonJs,
            Format::EsModule => OutputFormat::EsModule,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BundleOptions {
    pub is_bundling: bool,
    pub tree_shaking: bool,
    pub output_format: Format,
    /// Variable receiving the IIFE's value.
    pub module_name: Option<String>,
    pub minify_identifiers: bool,
    pub remove_whitespace: bool,
    pub mangle_syntax: bool,
    pub extension_to_loader: FxHashMap<String, Loader>,
    /// Output path for the single-entry case.
    pub abs_output_file: Option<String>,
    /// Output directory joined with derived chunk names otherwise.
    pub abs_output_dir: Option<String>,
    pub source_map: SourceMapMode,
    /// Overrides source-map `sources` entries.
    pub source_file: Option<String>,
    /// Skip printing runtime parts so snapshots stay small.
    pub omit_runtime_for_tests: bool,
}

impl Default for BundleOptions {
    fn default() -> Self {
        BundleOptions {
            is_bundling: true,
            tree_shaking: true,
            output_format: Format::None,
            module_name: None,
            minify_identifiers: false,
            remove_whitespace: false,
            mangle_syntax: false,
            extension_to_loader: Loader::default_extension_map(),
            abs_output_file: None,
            abs_output_dir: None,
            source_map: SourceMapMode::None,
            source_file: None,
            omit_runtime_for_tests: false,
        }
    }
}

impl BundleOptions {
    /// Loader-table extensions in a stable order, for chunk naming.
    #[must_use]
    pub fn known_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.extension_to_loader.keys().cloned().collect();
        extensions.sort_unstable();
        extensions
    }
}
