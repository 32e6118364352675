//! Compile a scanned bundle into output files.
//!
//! Each user entry point is linked independently: there is no code splitting
//! across user entry points, so a module shared by two entries is emitted
//! into both outputs. Within one link, dynamic imports promote additional
//! entry points and the entry-bits chunking applies.

use rayon::prelude::*;
use rustc_hash::FxHashSet;

use baler_common::Log;
use baler_emitter::{EmitOptions, OutputFile, emit_chunk};
use baler_linker::chunk::Chunk;
use baler_linker::graph::FileGraph;
use baler_linker::{LinkOptions, link};
use baler_resolver::path;

use crate::bundle::Bundle;
use crate::options::BundleOptions;

pub fn compile(bundle: &Bundle, options: &BundleOptions, log: &mut Log) -> Vec<OutputFile> {
    let _span = tracing::info_span!("compile", entries = bundle.entry_points.len()).entered();

    let input_paths: FxHashSet<&str> = bundle
        .sources
        .iter()
        .map(|s| s.abs_path.as_str())
        .collect();
    let single_entry = bundle.entry_points.len() == 1;

    let mut outputs: Vec<OutputFile> = Vec::new();
    for &entry in &bundle.entry_points {
        let mut graph = FileGraph::new(&bundle.sources, &bundle.files, vec![entry]);

        let link_options = LinkOptions {
            is_bundling: options.is_bundling,
            tree_shaking: options.tree_shaking,
            minify_identifiers: options.minify_identifiers,
            include_entry_namespace: options.module_name.is_some(),
            known_extensions: options.known_extensions(),
        };
        let result = link(&mut graph, &link_options, log);

        let emit_options = EmitOptions {
            is_bundling: options.is_bundling,
            remove_whitespace: options.remove_whitespace,
            mangle_syntax: options.mangle_syntax,
            output_format: options.output_format.resolve(options.is_bundling),
            module_name: options.module_name.clone(),
            source_map: options.source_map,
            source_file: options.source_file.clone(),
            omit_runtime: options.omit_runtime_for_tests,
        };

        // One task per chunk; each chunk prints its sources in parallel too.
        let jobs: Vec<(&Chunk, String)> = result
            .chunks
            .iter()
            .map(|chunk| {
                let js_path = chunk_output_path(&graph, options, single_entry, entry, chunk);
                (chunk, js_path)
            })
            .collect();
        let emitted: Vec<OutputFile> = jobs
            .par_iter()
            .map(|(chunk, js_path)| emit_chunk(&graph, chunk, &result.renamer, &emit_options, js_path))
            .collect();

        for output in emitted {
            if input_paths.contains(output.js_abs_path.as_str()) {
                log.add_error(
                    "",
                    None,
                    format!(
                        "Refusing to overwrite input file: {}",
                        output.js_abs_path
                    ),
                );
            }
            outputs.push(output);
        }
    }
    outputs
}

/// The absolute output path of one chunk.
///
/// A single user entry with `abs_output_file` keeps that exact path for the
/// entry chunk; everything else joins the output directory (or the output
/// file's directory, or the entry's directory) with the derived chunk name.
fn chunk_output_path(
    graph: &FileGraph,
    options: &BundleOptions,
    single_entry: bool,
    entry: u32,
    chunk: &Chunk,
) -> String {
    let is_user_entry_chunk = chunk.entry_bits.test(0) && chunk.entry_bits.ones().count() == 1;
    if single_entry && is_user_entry_chunk {
        if let Some(file) = &options.abs_output_file {
            return file.clone();
        }
    }
    let dir = options
        .abs_output_dir
        .clone()
        .or_else(|| options.abs_output_file.as_deref().map(|f| path::dir(f).to_string()))
        .unwrap_or_else(|| path::dir(&graph.sources[entry as usize].abs_path).to_string());
    path::join(&dir, &chunk.name)
}
