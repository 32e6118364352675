//! Flattening of `export * from` chains.
//!
//! For every file, walk its export-star targets depth-first and record where
//! each re-exported alias actually lives. Local exports shadow re-exports;
//! the same alias arriving from two different origin modules is marked
//! ambiguous and excluded from namespace objects and import matching.
//! CommonJS intermediates are skipped: their exports are not statically
//! enumerable.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::graph::{ExportStarEntry, FileGraph};

pub fn resolve_export_stars(graph: &mut FileGraph) {
    let _span = tracing::info_span!("link_export_stars").entered();

    for home in 0..graph.file_count() {
        if graph.files[home].module.export_stars.is_empty() {
            continue;
        }
        let mut visited = FxHashSet::default();
        visited.insert(home as u32);
        let mut result = FxHashMap::default();
        add_exports(graph, home as u32, home as u32, &mut visited, &mut result);
        graph.meta[home].resolved_export_stars = result;
    }
}

fn add_exports(
    graph: &FileGraph,
    home: u32,
    source: u32,
    visited: &mut FxHashSet<u32>,
    out: &mut FxHashMap<String, ExportStarEntry>,
) {
    let records: Vec<u32> = graph.files[source as usize].module.export_stars.clone();
    for record in records {
        let path = &graph.files[source as usize].module.import_records[record as usize].path;
        let Some(target) = graph.resolve_import(source, path) else {
            continue;
        };
        if !visited.insert(target) {
            continue;
        }
        // Re-exports through a CommonJS module contribute nothing.
        if graph.meta[target as usize].is_commonjs {
            continue;
        }

        let home_exports = &graph.files[home as usize].module.named_exports;
        for (alias, export) in &graph.files[target as usize].module.named_exports {
            if home_exports.contains_key(alias) {
                continue; // a local export shadows the re-export
            }
            match out.get_mut(alias) {
                None => {
                    out.insert(
                        alias.clone(),
                        ExportStarEntry {
                            source: target,
                            symbol: export.symbol,
                            part_indices: export.part_indices.clone(),
                            is_ambiguous: false,
                        },
                    );
                }
                Some(existing) => {
                    if existing.source != target {
                        existing.is_ambiguous = true;
                    }
                }
            }
        }

        add_exports(graph, home, target, visited, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::graph::{File, Source};
    use baler_common::Log;
    use baler_parser::{ParseOptions, parse_module};
    use rustc_hash::FxHashMap;

    fn file(index: u32, path: &str, contents: &str, resolved: &[(&str, u32)]) -> (Source, File) {
        let mut log = Log::new();
        let module = parse_module(index, path, contents, &ParseOptions::default(), &mut log);
        assert!(!log.has_errors());
        let source = Source {
            index,
            abs_path: path.to_string(),
            pretty_path: path.to_string(),
            contents: contents.to_string(),
        };
        let resolved_imports: FxHashMap<String, u32> = resolved
            .iter()
            .map(|(p, t)| ((*p).to_string(), *t))
            .collect();
        (source, File { module, resolved_imports })
    }

    #[test]
    fn star_exports_flatten_through_chains() {
        let (s0, f0) = file(0, "/<runtime>", "", &[]);
        let (s1, f1) = file(1, "/entry.js", "export * from './mid';", &[("./mid", 2)]);
        let (s2, f2) = file(2, "/mid.js", "export * from './leaf';", &[("./leaf", 3)]);
        let (s3, f3) = file(3, "/leaf.js", "export const deep = 1;", &[]);
        let mut graph = FileGraph::new(&[s0, s1, s2, s3], &[f0, f1, f2, f3], vec![1]);
        resolve_export_stars(&mut graph);

        let entry = graph.meta[1].resolved_export_stars.get("deep").expect("deep");
        assert_eq!(entry.source, 3);
        assert!(!entry.is_ambiguous);
    }

    #[test]
    fn conflicting_origins_are_marked_ambiguous() {
        let (s0, f0) = file(0, "/<runtime>", "", &[]);
        let (s1, f1) = file(
            1,
            "/entry.js",
            "export * from './a';\nexport * from './b';",
            &[("./a", 2), ("./b", 3)],
        );
        let (s2, f2) = file(2, "/a.js", "export const x = 1;", &[]);
        let (s3, f3) = file(3, "/b.js", "export const x = 2;", &[]);
        let mut graph = FileGraph::new(&[s0, s1, s2, s3], &[f0, f1, f2, f3], vec![1]);
        resolve_export_stars(&mut graph);

        let entry = graph.meta[1].resolved_export_stars.get("x").expect("x");
        assert!(entry.is_ambiguous);
    }

    #[test]
    fn local_export_shadows_reexport() {
        let (s0, f0) = file(0, "/<runtime>", "", &[]);
        let (s1, f1) = file(
            1,
            "/entry.js",
            "export const x = 0;\nexport * from './a';",
            &[("./a", 2)],
        );
        let (s2, f2) = file(2, "/a.js", "export const x = 1;\nexport const y = 2;", &[]);
        let mut graph = FileGraph::new(&[s0, s1, s2], &[f0, f1, f2], vec![1]);
        resolve_export_stars(&mut graph);

        assert!(!graph.meta[1].resolved_export_stars.contains_key("x"));
        assert!(graph.meta[1].resolved_export_stars.contains_key("y"));
    }

    #[test]
    fn commonjs_intermediates_contribute_nothing() {
        let (s0, f0) = file(0, "/<runtime>", "", &[]);
        let (s1, f1) = file(
            1,
            "/entry.js",
            "const dep = require('./cjs');\nexport * from './cjs';",
            &[("./cjs", 2)],
        );
        let (s2, f2) = file(2, "/cjs.js", "module.exports = { x: 1 };", &[]);
        let mut graph = FileGraph::new(&[s0, s1, s2], &[f0, f1, f2], vec![1]);
        classify(&mut graph);
        resolve_export_stars(&mut graph);

        assert!(graph.meta[1].resolved_export_stars.is_empty());
    }

    #[test]
    fn cycles_terminate() {
        let (s0, f0) = file(0, "/<runtime>", "", &[]);
        let (s1, f1) = file(
            1,
            "/a.js",
            "export * from './b';\nexport const a = 1;",
            &[("./b", 2)],
        );
        let (s2, f2) = file(
            2,
            "/b.js",
            "export * from './a';\nexport const b = 2;",
            &[("./a", 1)],
        );
        let mut graph = FileGraph::new(&[s0, s1, s2], &[f0, f1, f2], vec![1]);
        resolve_export_stars(&mut graph);

        assert!(graph.meta[1].resolved_export_stars.contains_key("b"));
        assert!(graph.meta[2].resolved_export_stars.contains_key("a"));
    }
}
