//! CLI arguments for the `baler` binary.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use baler_bundler::{BundleOptions, Format, SourceMapMode};
use baler_resolver::Loader;

#[derive(Parser, Debug)]
#[command(name = "baler", version, about = "A JavaScript and TypeScript bundler")]
pub struct CliArgs {
    /// Entry point files.
    #[arg(required = true)]
    pub entries: Vec<PathBuf>,

    /// Bundle the transitive dependency closure into the output.
    #[arg(long)]
    pub bundle: bool,

    /// Write the output to a single file.
    #[arg(short = 'o', long)]
    pub outfile: Option<PathBuf>,

    /// Write one output per entry point into this directory.
    #[arg(long)]
    pub outdir: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, ignore_case = true)]
    pub format: Option<FormatArg>,

    /// Variable name receiving the IIFE's value.
    #[arg(long = "global-name")]
    pub global_name: Option<String>,

    /// Shorthand for --minify-identifiers --minify-whitespace --minify-syntax.
    #[arg(long)]
    pub minify: bool,

    /// Rename identifiers to the shortest available names.
    #[arg(long = "minify-identifiers")]
    pub minify_identifiers: bool,

    /// Remove whitespace from the output.
    #[arg(long = "minify-whitespace")]
    pub minify_whitespace: bool,

    /// Merge adjacent declarations and similar syntax rewrites.
    #[arg(long = "minify-syntax")]
    pub minify_syntax: bool,

    /// Source map emission: inline, external, or linked (default).
    #[arg(long, value_enum, num_args = 0..=1, default_missing_value = "linked", ignore_case = true)]
    pub sourcemap: Option<SourceMapArg>,

    /// Override the source file name recorded in source maps.
    #[arg(long = "source-file")]
    pub source_file: Option<String>,

    /// Enable or disable tree shaking (default: on when bundling).
    #[arg(long = "tree-shaking")]
    pub tree_shaking: Option<bool>,

    /// Extra loader mappings, e.g. --loader .svg=text.
    #[arg(long = "loader", value_name = "EXT=KIND")]
    pub loaders: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    Iife,
    Cjs,
    Esm,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SourceMapArg {
    Inline,
    Linked,
    External,
}

fn parse_loader(spec: &str) -> Option<(String, Loader)> {
    let (ext, kind) = spec.split_once('=')?;
    let ext = if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    };
    let loader = match kind {
        "js" => Loader::Js,
        "jsx" => Loader::Jsx,
        "ts" => Loader::Ts,
        "tsx" => Loader::Tsx,
        "json" => Loader::Json,
        "text" => Loader::Text,
        "base64" => Loader::Base64,
        "dataurl" => Loader::DataUrl,
        _ => return None,
    };
    Some((ext, loader))
}

impl CliArgs {
    /// Translate CLI flags into bundle options.
    pub fn to_bundle_options(&self) -> anyhow::Result<BundleOptions> {
        let mut options = BundleOptions {
            is_bundling: self.bundle,
            ..BundleOptions::default()
        };

        options.tree_shaking = self.tree_shaking.unwrap_or(self.bundle);
        options.output_format = match self.format {
            None => Format::None,
            Some(FormatArg::Iife) => Format::Iife,
            Some(FormatArg::Cjs) => Format::CommonJs,
            Some(FormatArg::Esm) => Format::EsModule,
        };
        options.module_name = self.global_name.clone();
        options.minify_identifiers = self.minify || self.minify_identifiers;
        options.remove_whitespace = self.minify || self.minify_whitespace;
        options.mangle_syntax = self.minify || self.minify_syntax;
        options.source_map = match self.sourcemap {
            None => SourceMapMode::None,
            Some(SourceMapArg::Inline) => SourceMapMode::Inline,
            Some(SourceMapArg::Linked) => SourceMapMode::LinkedWithComment,
            Some(SourceMapArg::External) => SourceMapMode::ExternalWithoutComment,
        };
        options.source_file = self.source_file.clone();

        for spec in &self.loaders {
            let (ext, loader) = parse_loader(spec)
                .ok_or_else(|| anyhow::anyhow!("Invalid loader mapping: {spec}"))?;
            options.extension_to_loader.insert(ext, loader);
        }

        options.abs_output_file = match &self.outfile {
            Some(path) => Some(absolute_path(path)?),
            None => None,
        };
        options.abs_output_dir = match &self.outdir {
            Some(path) => Some(absolute_path(path)?),
            None => None,
        };
        if options.abs_output_file.is_none() && options.abs_output_dir.is_none() {
            anyhow::bail!("Either --outfile or --outdir is required");
        }
        Ok(options)
    }
}

/// Absolute, `/`-separated form of a possibly relative path.
pub fn absolute_path(path: &std::path::Path) -> anyhow::Result<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(absolute.to_string_lossy().replace('\\', "/"))
}
