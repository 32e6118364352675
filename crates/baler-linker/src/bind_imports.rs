//! Named import binding.
//!
//! Each named import is chased through re-export chains until it lands on a
//! concrete export, a CommonJS or external module, or fails. Successful
//! matches merge the importing symbol into the exporting one and wire
//! non-local part dependencies; CommonJS and external matches tag the symbol
//! with a namespace alias so references print as property accesses. A
//! tortoise cursor advancing at half speed detects re-export cycles.

use smallvec::SmallVec;

use baler_parser::symbols::{NamespaceAlias, SymbolRef};

use baler_common::Span;

use crate::graph::{FileGraph, PartRef};

/// Where one advance step landed.
enum Step {
    /// Matched an export in `source`; the cursor may continue if the matched
    /// symbol is itself an import.
    Found {
        source: u32,
        symbol: SymbolRef,
        parts: SmallVec<[u32; 1]>,
    },
    CommonJs,
    External,
    NoMatch,
    Ambiguous,
}

pub fn bind_imports(graph: &mut FileGraph, log: &mut baler_common::Log) {
    let _span = tracing::info_span!("link_bind_imports").entered();

    for source in 0..graph.file_count() {
        // Deterministic order: sorted by inner symbol index.
        let mut import_refs: Vec<SymbolRef> = graph.files[source]
            .module
            .named_imports
            .keys()
            .copied()
            .collect();
        import_refs.sort_unstable();

        for import_ref in import_refs {
            chase_import(graph, log, source as u32, import_ref);
        }
    }
}

/// One step of the import chase from the import `cursor_ref` in
/// `cursor_source`.
fn advance(graph: &FileGraph, cursor_source: u32, cursor_ref: SymbolRef) -> Step {
    let file = &graph.files[cursor_source as usize];
    let import = &file.module.named_imports[&cursor_ref];
    let path = &file.module.import_records[import.record as usize].path;

    let Some(target) = file.resolve_import(path) else {
        return Step::External;
    };
    if graph.meta[target as usize].is_commonjs {
        return Step::CommonJs;
    }

    let target_file = &graph.files[target as usize];
    if let Some(export) = target_file.module.named_exports.get(&import.alias) {
        return Step::Found {
            source: target,
            symbol: export.symbol,
            parts: export.part_indices.clone(),
        };
    }
    if let Some(entry) = graph.meta[target as usize]
        .resolved_export_stars
        .get(&import.alias)
    {
        if entry.is_ambiguous {
            return Step::Ambiguous;
        }
        return Step::Found {
            source: entry.source,
            symbol: entry.symbol,
            parts: entry.part_indices.clone(),
        };
    }
    Step::NoMatch
}

/// The next cursor position, when the chase continues.
fn next_cursor(graph: &FileGraph, source: u32, r: SymbolRef) -> Option<(u32, SymbolRef)> {
    match advance(graph, source, r) {
        Step::Found { source: target, symbol, .. } => {
            if graph.files[target as usize]
                .module
                .named_imports
                .contains_key(&symbol)
            {
                Some((target, symbol))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn chase_import(graph: &mut FileGraph, log: &mut baler_common::Log, source: u32, import_ref: SymbolRef) {
    let original = (source, import_ref);
    let mut cursor = original;
    let mut tortoise = original;
    let mut counter: u32 = 0;

    loop {
        counter += 1;
        let step = advance(graph, cursor.0, cursor.1);
        match step {
            Step::External | Step::CommonJs => {
                apply_namespace_alias(graph, original, cursor);
                return;
            }
            Step::NoMatch => {
                let (alias, loc) = import_info(graph, cursor);
                let file = graph.sources[cursor.0 as usize].pretty_path.clone();
                log.add_error(
                    file,
                    Some(Span::at(loc)),
                    format!("No matching export for import \"{alias}\""),
                );
                return;
            }
            Step::Ambiguous => {
                let (alias, loc) = import_info(graph, cursor);
                let file = graph.sources[cursor.0 as usize].pretty_path.clone();
                log.add_error(
                    file,
                    Some(Span::at(loc)),
                    format!("Ambiguous import \"{alias}\" has multiple matching exports"),
                );
                return;
            }
            Step::Found { source: target, symbol, parts } => {
                let continues = graph.files[target as usize]
                    .module
                    .named_imports
                    .contains_key(&symbol);
                if !continues {
                    finish_match(graph, original, target, symbol, &parts);
                    return;
                }
                cursor = (target, symbol);
            }
        }

        // Floyd cycle detection: the tortoise moves every other iteration.
        if counter % 2 == 0 {
            if let Some(next) = next_cursor(graph, tortoise.0, tortoise.1) {
                tortoise = next;
            }
        }
        if tortoise == cursor {
            let (alias, loc) = import_info(graph, original);
            let file = graph.sources[original.0 as usize].pretty_path.clone();
            log.add_error(
                file,
                Some(Span::at(loc)),
                format!("Detected cycle while resolving import \"{alias}\""),
            );
            return;
        }
    }
}

fn import_info(graph: &FileGraph, cursor: (u32, SymbolRef)) -> (String, u32) {
    let import = &graph.files[cursor.0 as usize].module.named_imports[&cursor.1];
    (import.alias.clone(), import.alias_loc)
}

/// CommonJS / external termination: references to the import become
/// `<namespace>.<alias>` property accesses. Namespace imports (`alias "*"`)
/// are left alone; their symbol is the namespace object itself, declared by
/// the rewritten import statement.
fn apply_namespace_alias(graph: &mut FileGraph, original: (u32, SymbolRef), cursor: (u32, SymbolRef)) {
    let (namespace_ref, alias) = {
        let import = &graph.files[cursor.0 as usize].module.named_imports[&cursor.1];
        (import.namespace_ref, import.alias.clone())
    };
    if alias != "*" {
        let root = graph.symbols.follow(cursor.1);
        graph.symbols.get_mut(root).namespace_alias = Some(NamespaceAlias {
            namespace_ref,
            alias,
        });
    }
    if original != cursor {
        graph.symbols.merge(original.1, cursor.1);
    }
}

/// Successful termination: merge the import into the export and make every
/// part using the import depend on every part defining the export.
fn finish_match(
    graph: &mut FileGraph,
    original: (u32, SymbolRef),
    target: u32,
    symbol: SymbolRef,
    defining_parts: &SmallVec<[u32; 1]>,
) {
    graph.symbols.merge(original.1, symbol);

    let using_parts: SmallVec<[u32; 1]> = graph.files[original.0 as usize]
        .module
        .named_imports[&original.1]
        .part_indices
        .clone();
    for &part in &using_parts {
        let meta = &mut graph.meta[original.0 as usize].part_meta[part as usize];
        for &defining in defining_parts {
            let dep = PartRef { source: target, part: defining };
            if !meta.non_local_dependencies.contains(&dep) {
                meta.non_local_dependencies.push(dep);
            }
        }
    }
}
