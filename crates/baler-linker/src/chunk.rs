//! Chunk planning: grouping live parts by entry-bit signature and deriving
//! a deterministic within-chunk file order.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use baler_parser::ast::ImportKind;

use crate::graph::{EntryBits, FileGraph, RUNTIME_SOURCE_INDEX};

#[derive(Debug, Clone)]
pub struct Chunk {
    pub entry_bits: EntryBits,
    /// Derived file name, e.g. `entry.js` or `main-lazy.js`.
    pub name: String,
    pub hashbang: Option<String>,
    /// Source index -> part indices in this chunk, in part order.
    pub parts: FxHashMap<u32, Vec<u32>>,
    /// Source emission order: runtime first, then dependency-first DFS over
    /// the distance/path sort.
    pub file_order: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct ChunkOptions {
    /// Extensions the name derivation strips (the loader table's keys).
    pub known_extensions: Vec<String>,
}

pub fn compute_chunks(graph: &FileGraph, options: &ChunkOptions) -> Vec<Chunk> {
    let _span = tracing::info_span!("link_compute_chunks").entered();

    // Group key: the part's entry bits. IndexMap keeps first-encounter order
    // so chunk output order is deterministic.
    let mut chunks: IndexMap<EntryBits, Chunk> = IndexMap::new();

    for source in 0..graph.file_count() {
        let meta = &graph.meta[source];
        for (part_index, part_meta) in meta.part_meta.iter().enumerate() {
            if part_meta.entry_bits.is_all_zero() {
                continue;
            }
            let chunk = chunks
                .entry(part_meta.entry_bits.clone())
                .or_insert_with(|| new_chunk(graph, options, &part_meta.entry_bits));
            chunk
                .parts
                .entry(source as u32)
                .or_default()
                .push(u32::try_from(part_index).unwrap_or(u32::MAX));
        }
    }

    let mut chunks: Vec<Chunk> = chunks.into_values().collect();
    for chunk in &mut chunks {
        chunk.file_order = compute_file_order(graph, chunk);
    }
    chunks
}

fn new_chunk(graph: &FileGraph, options: &ChunkOptions, bits: &EntryBits) -> Chunk {
    // Name: entry-point base names for every set bit, deduped in ordinal
    // order, joined with "-".
    let mut names: Vec<String> = Vec::new();
    let mut single_entry: Option<u32> = None;
    let mut set_count = 0usize;
    for ordinal in bits.ones() {
        let entry = graph.entry_points[ordinal];
        set_count += 1;
        single_entry = Some(entry);
        let base = base_name_without_known_extension(
            &graph.sources[entry as usize].abs_path,
            &options.known_extensions,
        );
        if !names.contains(&base) {
            names.push(base);
        }
    }
    let name = format!("{}.js", names.join("-"));

    let hashbang = if set_count == 1 {
        single_entry.and_then(|entry| graph.files[entry as usize].module.hashbang.clone())
    } else {
        None
    };

    Chunk {
        entry_bits: bits.clone(),
        name,
        hashbang,
        parts: FxHashMap::default(),
        file_order: Vec::new(),
    }
}

pub(crate) fn base_name_without_known_extension(path: &str, known: &[String]) -> String {
    let base = match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    };
    if let Some(dot) = base.rfind('.') {
        if dot > 0 {
            let ext = &base[dot..];
            if known.iter().any(|k| k == ext) {
                return base[..dot].to_string();
            }
        }
    }
    base.to_string()
}

fn compute_file_order(graph: &FileGraph, chunk: &Chunk) -> Vec<u32> {
    // Sort key: (distance from entry, absolute path).
    let mut sorted: Vec<u32> = chunk.parts.keys().copied().collect();
    sorted.sort_by(|&a, &b| {
        let da = graph.meta[a as usize].distance_from_entry;
        let db = graph.meta[b as usize].distance_from_entry;
        da.cmp(&db)
            .then_with(|| graph.sources[a as usize].abs_path.cmp(&graph.sources[b as usize].abs_path))
    });

    let mut visited: FxHashSet<u32> = FxHashSet::default();
    let mut order: Vec<u32> = Vec::new();

    // The runtime always prints first.
    if chunk.parts.contains_key(&RUNTIME_SOURCE_INDEX) {
        visited.insert(RUNTIME_SOURCE_INDEX);
        order.push(RUNTIME_SOURCE_INDEX);
    }

    for source in sorted {
        visit(graph, chunk, source, &mut visited, &mut order);
    }
    order
}

fn visit(
    graph: &FileGraph,
    chunk: &Chunk,
    source: u32,
    visited: &mut FxHashSet<u32>,
    order: &mut Vec<u32>,
) {
    if !visited.insert(source) {
        return;
    }
    // Dependencies come first: statement imports always, require targets
    // only when they live in this very chunk.
    let module = &graph.files[source as usize].module;
    for record in &module.import_records {
        let Some(target) = graph.resolve_import(source, &record.path) else {
            continue;
        };
        let in_chunk = chunk.parts.contains_key(&target);
        match record.kind {
            ImportKind::Stmt if in_chunk => {
                visit(graph, chunk, target, visited, order);
            }
            ImportKind::Require
                if graph.meta[target as usize].entry_bits == chunk.entry_bits =>
            {
                visit(graph, chunk, target, visited, order);
            }
            _ => {}
        }
    }
    order.push(source);
}
