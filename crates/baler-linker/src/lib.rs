//! The linker: the pipeline stage between per-file parsing and per-chunk
//! printing.
//!
//! Passes run strictly in order on the main thread, each reading the
//! previous passes' results out of the `FileGraph`:
//!
//! 1. `classify` - CommonJS marking, dynamic entry promotion
//! 2. `export_star` - flattened re-export tables with ambiguity marks
//! 3. `namespace` - synthetic namespace-export parts
//! 4. `bind_imports` - named import resolution, symbol merging
//! 5. `reach` - tree-shaking by entry-point reachability
//! 6. `chunk` - grouping live parts into chunks
//! 7. `rename` - bundle-wide renaming or minification
//!
//! Emission (the only parallel stage) lives in `baler-emitter`.

pub mod bind_imports;
pub mod chunk;
pub mod classify;
pub mod export_star;
pub mod graph;
pub mod namespace;
pub mod reach;
pub mod rename;

use baler_common::Log;

pub use chunk::{Chunk, ChunkOptions};
pub use graph::{EntryBits, EntryPointKind, File, FileGraph, FileMeta, PartRef, Source};
pub use rename::{RenameOptions, Renamer};

#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    pub is_bundling: bool,
    pub tree_shaking: bool,
    pub minify_identifiers: bool,
    /// Keep user entries' namespace-export parts alive (needed when an IIFE
    /// module name returns the entry's exports object).
    pub include_entry_namespace: bool,
    /// Extensions stripped when deriving chunk names (the loader table's
    /// keys).
    pub known_extensions: Vec<String>,
}

pub struct LinkResult {
    pub chunks: Vec<Chunk>,
    pub renamer: Renamer,
}

/// Run every linker stage over the graph. Recoverable problems are logged
/// and linking continues so one run reports the full set of diagnostics.
pub fn link(graph: &mut FileGraph, options: &LinkOptions, log: &mut Log) -> LinkResult {
    let chunks = if options.is_bundling {
        classify::classify(graph);
        export_star::resolve_export_stars(graph);
        namespace::synthesize_namespace_exports(graph);
        bind_imports::bind_imports(graph, log);
        reach::mark_reachable(
            graph,
            reach::ReachOptions {
                tree_shaking: options.tree_shaking,
                include_entry_namespace: options.include_entry_namespace,
            },
        );
        chunk::compute_chunks(
            graph,
            &ChunkOptions {
                known_extensions: options.known_extensions.clone(),
            },
        )
    } else {
        single_file_chunks(graph, options)
    };

    let renamer = rename::assign_names(
        graph,
        RenameOptions {
            minify_identifiers: options.minify_identifiers,
            is_bundling: options.is_bundling,
        },
    );

    // Flatten symbol links so printer tasks can read the table concurrently.
    graph.symbols.follow_all();

    LinkResult { chunks, renamer }
}

/// Pass-through mode: one chunk per entry point containing only that file's
/// parts. Used when bundling is off.
fn single_file_chunks(graph: &mut FileGraph, options: &LinkOptions) -> Vec<Chunk> {
    let entry_count = graph.entry_points.len();
    let entries = graph.entry_points.clone();

    let mut chunks = Vec::with_capacity(entries.len());
    for (ordinal, &entry) in entries.iter().enumerate() {
        let mut bits = EntryBits::new(entry_count);
        bits.set(ordinal);
        graph.meta[entry as usize].entry_bits = bits.clone();
        graph.meta[entry as usize].distance_from_entry = 0;

        let part_count = u32::try_from(graph.files[entry as usize].module.parts.len()).unwrap_or(0);
        for p in 0..part_count {
            graph.meta[entry as usize].part_meta[p as usize].entry_bits = bits.clone();
        }

        let mut parts = rustc_hash::FxHashMap::default();
        parts.insert(entry, (0..part_count).collect());
        let base = chunk::base_name_without_known_extension(
            &graph.sources[entry as usize].abs_path,
            &options.known_extensions,
        );
        chunks.push(Chunk {
            entry_bits: bits,
            name: format!("{base}.js"),
            hashbang: graph.files[entry as usize].module.hashbang.clone(),
            parts,
            file_order: vec![entry],
        });
    }
    chunks
}
