//! Tree-shaking by transitive reachability from entry points.
//!
//! Every file and part gets an `EntryBits` sized to the final entry-point
//! count. Inclusion recurses across statement imports (file level), require
//! records, part-local dependencies and non-local dependencies, pulling in
//! runtime helpers on demand. A part is live iff its bits are non-zero.

use baler_parser::ast::ImportKind;

use crate::graph::{
    EntryBits, FileGraph, HELPER_COMMONJS, HELPER_TO_MODULE, PartRef, RUNTIME_SOURCE_INDEX,
};

#[derive(Debug, Clone, Copy)]
pub struct ReachOptions {
    pub tree_shaking: bool,
    /// Keep user entry points' namespace-export parts alive even when
    /// nothing imports them (an IIFE with a module name returns the entry's
    /// exports object).
    pub include_entry_namespace: bool,
}

pub fn mark_reachable(graph: &mut FileGraph, options: ReachOptions) {
    let _span = tracing::info_span!("link_reachability", entries = graph.entry_points.len()).entered();

    let entry_count = graph.entry_points.len();
    for meta in &mut graph.meta {
        meta.entry_bits = EntryBits::new(entry_count);
        for part in &mut meta.part_meta {
            part.entry_bits = EntryBits::new(entry_count);
        }
    }

    let entries = graph.entry_points.clone();
    for (ordinal, &entry) in entries.iter().enumerate() {
        include_file(graph, options, entry, ordinal, 0);
    }

    if options.include_entry_namespace {
        for (ordinal, &entry) in entries.iter().enumerate() {
            let meta = &graph.meta[entry as usize];
            if meta.entry_point_kind != crate::graph::EntryPointKind::User || meta.is_commonjs {
                continue;
            }
            let namespace_part = graph.files[entry as usize].module.parts.len() - 1;
            include_part(
                graph,
                options,
                entry,
                u32::try_from(namespace_part).unwrap_or(0),
                ordinal,
                0,
            );
        }
    }
}

fn include_file(
    graph: &mut FileGraph,
    options: ReachOptions,
    source: u32,
    ordinal: usize,
    distance: u32,
) {
    {
        let meta = &mut graph.meta[source as usize];
        if distance < meta.distance_from_entry {
            meta.distance_from_entry = distance;
        }
        if meta.entry_bits.test(ordinal) {
            return;
        }
        meta.entry_bits.set(ordinal);
    }

    let is_runtime = source == RUNTIME_SOURCE_INDEX;
    let part_count = graph.files[source as usize].module.parts.len();

    for part_index in 0..part_count {
        let (include, records) = {
            let part = &graph.files[source as usize].module.parts[part_index];
            let include = !part.can_be_removed_if_unused()
                || (!part.force_tree_shaking() && !options.tree_shaking && !is_runtime);
            let records: Vec<(ImportKind, String)> = part
                .import_records
                .iter()
                .map(|&ri| {
                    let record =
                        &graph.files[source as usize].module.import_records[ri as usize];
                    (record.kind, record.path.clone())
                })
                .collect();
            (include, records)
        };

        for (kind, path) in records {
            match kind {
                ImportKind::Stmt => match graph.resolve_import(source, &path) {
                    Some(target) => {
                        include_file(graph, options, target, ordinal, distance + 1);
                        if graph.meta[target as usize].is_commonjs {
                            include_runtime_helper(graph, options, HELPER_TO_MODULE, ordinal, distance);
                        }
                    }
                    None => {
                        include_runtime_helper(graph, options, HELPER_TO_MODULE, ordinal, distance);
                    }
                },
                ImportKind::Dynamic => {
                    // The target is its own entry point; this file only needs
                    // the interop helper to wrap what the wrapper returns.
                    include_runtime_helper(graph, options, HELPER_TO_MODULE, ordinal, distance);
                }
                ImportKind::Require => {}
            }
        }

        if include {
            include_part(graph, options, source, part_index as u32, ordinal, distance);
        }
    }

    if graph.meta[source as usize].is_commonjs {
        include_runtime_helper(graph, options, HELPER_COMMONJS, ordinal, distance);
    }
}

fn include_part(
    graph: &mut FileGraph,
    options: ReachOptions,
    source: u32,
    part_index: u32,
    ordinal: usize,
    distance: u32,
) {
    {
        let part_meta = &mut graph.meta[source as usize].part_meta[part_index as usize];
        if part_meta.entry_bits.test(ordinal) {
            return;
        }
        part_meta.entry_bits.set(ordinal);
    }

    // `require()` forces file-level inclusion of its target.
    let require_paths: Vec<String> = {
        let part = &graph.files[source as usize].module.parts[part_index as usize];
        part.import_records
            .iter()
            .filter_map(|&ri| {
                let record = &graph.files[source as usize].module.import_records[ri as usize];
                (record.kind == ImportKind::Require).then(|| record.path.clone())
            })
            .collect()
    };
    for path in require_paths {
        if let Some(target) = graph.resolve_import(source, &path) {
            include_file(graph, options, target, ordinal, distance + 1);
        }
    }

    let local_deps: Vec<u32> = graph.files[source as usize].module.parts[part_index as usize]
        .local_dependencies
        .clone();
    for dep in local_deps {
        include_part(graph, options, source, dep, ordinal, distance);
    }

    let non_local: Vec<PartRef> = graph.meta[source as usize].part_meta[part_index as usize]
        .non_local_dependencies
        .clone();
    for dep in non_local {
        include_part(graph, options, dep.source, dep.part, ordinal, distance);
    }
}

fn include_runtime_helper(
    graph: &mut FileGraph,
    options: ReachOptions,
    name: &str,
    ordinal: usize,
    distance: u32,
) {
    if let Some((_, parts)) = graph.runtime_export(name) {
        for part in parts {
            include_part(graph, options, RUNTIME_SOURCE_INDEX, part, ordinal, distance);
        }
    }
}
