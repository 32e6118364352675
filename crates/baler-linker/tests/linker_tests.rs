//! Whole-linker tests over small in-memory module graphs.

use baler_common::Log;
use baler_linker::graph::{File, FileGraph, Source};
use baler_linker::{LinkOptions, link};
use baler_parser::{ParseOptions, parse_module};
use baler_resolver::{FileSystem, MockFileSystem, Resolved, Resolver};

const RUNTIME: &str = r#"
export var __commonJS = (callback, module) => () => {
  if (!module) {
    module = { exports: {} };
    callback(module.exports, module);
  }
  return module.exports;
};
export var __toModule = (module) => {
  if (module && module.__esModule) {
    return module;
  }
  var result = { default: module };
  for (var key in module) {
    result[key] = module[key];
  }
  return result;
};
export var __export = (target, all) => {
  for (var name in all) {
    Object.defineProperty(target, name, { get: all[name], enumerable: true });
  }
};
"#;

/// Parse a fixture into a graph the way the scan stage would: the runtime at
/// index 0, imports resolved with the real resolver over a mock filesystem.
fn build_graph(fixture: &[(&str, &str)], entries: &[&str], log: &mut Log) -> FileGraph {
    let fs = MockFileSystem::new(fixture);
    let resolver = Resolver::new(&fs);
    let options = ParseOptions::default();

    let mut paths: Vec<String> = vec!["<runtime>".to_string()];
    paths.extend(fixture.iter().map(|(p, _)| (*p).to_string()));

    let mut sources = Vec::new();
    let mut files = Vec::new();
    for (index, path) in paths.iter().enumerate() {
        let contents = if index == 0 {
            RUNTIME.to_string()
        } else {
            fs.read_file(path).expect("fixture file")
        };
        let module = parse_module(index as u32, path, &contents, &options, log);
        let mut file = File {
            module,
            resolved_imports: Default::default(),
        };
        for record in &file.module.import_records {
            match resolver.resolve(path, &record.path) {
                Resolved::Path(target) => {
                    if let Some(target_index) = paths.iter().position(|p| *p == target) {
                        file.resolved_imports
                            .insert(record.path.clone(), target_index as u32);
                    }
                }
                Resolved::Runtime => {
                    file.resolved_imports.insert(record.path.clone(), 0);
                }
                Resolved::Missing => {}
            }
        }
        sources.push(Source {
            index: index as u32,
            abs_path: path.clone(),
            pretty_path: path.clone(),
            contents,
        });
        files.push(file);
    }

    let entry_indices: Vec<u32> = entries
        .iter()
        .map(|e| paths.iter().position(|p| p == e).expect("entry in fixture") as u32)
        .collect();
    FileGraph::new(&sources, &files, entry_indices)
}

fn default_link_options() -> LinkOptions {
    LinkOptions {
        is_bundling: true,
        tree_shaking: true,
        minify_identifiers: false,
        include_entry_namespace: false,
        known_extensions: vec![".js".to_string()],
    }
}

#[test]
fn tree_shaking_drops_unused_export() {
    let mut log = Log::new();
    let mut graph = build_graph(
        &[
            (
                "/entry.js",
                "import { used } from './lib';\nconsole.log(used());\n",
            ),
            (
                "/lib.js",
                "export function used() { return 1 }\nexport function unused() { return 2 }\n",
            ),
        ],
        &["/entry.js"],
        &mut log,
    );
    link(&mut graph, &default_link_options(), &mut log);
    assert!(!log.has_errors());

    let lib_meta = &graph.meta[2];
    // Part 0 defines `used`, part 1 defines `unused`.
    assert!(!lib_meta.part_meta[0].entry_bits.is_all_zero());
    assert!(lib_meta.part_meta[1].entry_bits.is_all_zero());
}

#[test]
fn live_parts_have_live_dependencies_with_superset_bits() {
    let mut log = Log::new();
    let mut graph = build_graph(
        &[
            (
                "/entry.js",
                "import { a } from './a';\nimport('./lazy');\nconsole.log(a);\n",
            ),
            ("/a.js", "export const a = shared();\nexport function shared() { return 1 }\n"),
            ("/lazy.js", "import { a } from './a';\nconsole.log('lazy', a);\n"),
        ],
        &["/entry.js"],
        &mut log,
    );
    link(&mut graph, &default_link_options(), &mut log);
    assert!(!log.has_errors());

    for source in 0..graph.file_count() {
        for (part_index, part_meta) in graph.meta[source].part_meta.iter().enumerate() {
            if part_meta.entry_bits.is_all_zero() {
                continue;
            }
            for dep in &part_meta.non_local_dependencies {
                let dep_bits =
                    &graph.meta[dep.source as usize].part_meta[dep.part as usize].entry_bits;
                assert!(
                    part_meta.entry_bits.is_subset_of(dep_bits),
                    "part ({source}, {part_index}) depends on ({}, {}) with smaller bits",
                    dep.source,
                    dep.part
                );
            }
            let local_deps =
                &graph.files[source].module.parts[part_index].local_dependencies;
            for &dep in local_deps {
                let dep_bits = &graph.meta[source].part_meta[dep as usize].entry_bits;
                assert!(part_meta.entry_bits.is_subset_of(dep_bits));
            }
        }
    }
}

#[test]
fn chunks_partition_live_parts_by_signature() {
    let mut log = Log::new();
    let mut graph = build_graph(
        &[
            ("/entry.js", "import { a } from './a';\nimport('./lazy');\nconsole.log(a);\n"),
            ("/a.js", "export const a = 1;\n"),
            ("/lazy.js", "import { a } from './a';\nconsole.log('lazy', a);\n"),
        ],
        &["/entry.js"],
        &mut log,
    );
    let result = link(&mut graph, &default_link_options(), &mut log);
    assert!(!log.has_errors());

    let mut seen = std::collections::HashSet::new();
    let mut chunk_part_count = 0usize;
    for chunk in &result.chunks {
        for (&source, parts) in &chunk.parts {
            for &part in parts {
                assert!(seen.insert((source, part)), "part in two chunks");
                chunk_part_count += 1;
                let bits = &graph.meta[source as usize].part_meta[part as usize].entry_bits;
                assert_eq!(bits, &chunk.entry_bits);
            }
        }
    }
    let live_count: usize = graph
        .meta
        .iter()
        .map(|m| {
            m.part_meta
                .iter()
                .filter(|p| !p.entry_bits.is_all_zero())
                .count()
        })
        .sum();
    assert_eq!(chunk_part_count, live_count);
}

#[test]
fn import_cycle_is_reported_once_per_alias() {
    let mut log = Log::new();
    let mut graph = build_graph(
        &[(
            "/entry.js",
            "export { a as b } from './entry';\nexport { b as c } from './entry';\nexport { c as a } from './entry';\n",
        )],
        &["/entry.js"],
        &mut log,
    );
    link(&mut graph, &default_link_options(), &mut log);

    let cycle_msgs: Vec<&str> = log
        .msgs()
        .iter()
        .filter(|m| m.text.starts_with("Detected cycle while resolving import"))
        .map(|m| m.text.as_str())
        .collect();
    assert_eq!(cycle_msgs.len(), 3);
    assert!(cycle_msgs.contains(&"Detected cycle while resolving import \"a\""));
}

#[test]
fn ambiguous_reexport_is_reported() {
    let mut log = Log::new();
    let mut graph = build_graph(
        &[
            ("/main.js", "import { x } from './entry';\nconsole.log(x);\n"),
            ("/entry.js", "export * from './a';\nexport * from './b';\n"),
            ("/a.js", "export const x = 1;\n"),
            ("/b.js", "export const x = 2;\n"),
        ],
        &["/main.js"],
        &mut log,
    );
    link(&mut graph, &default_link_options(), &mut log);

    assert!(log.msgs().iter().any(|m| m.text == "Ambiguous import \"x\" has multiple matching exports"));

    // The entry's namespace object must omit the ambiguous alias.
    let entry_star = graph.meta[2].resolved_export_stars.get("x").expect("entry");
    assert!(entry_star.is_ambiguous);
}

#[test]
fn missing_export_is_reported() {
    let mut log = Log::new();
    let mut graph = build_graph(
        &[
            ("/entry.js", "import { nope } from './lib';\nconsole.log(nope);\n"),
            ("/lib.js", "export const yes = 1;\n"),
        ],
        &["/entry.js"],
        &mut log,
    );
    link(&mut graph, &default_link_options(), &mut log);

    assert!(
        log.msgs()
            .iter()
            .any(|m| m.text == "No matching export for import \"nope\"")
    );
}

#[test]
fn symbol_following_is_idempotent_after_link() {
    let mut log = Log::new();
    let mut graph = build_graph(
        &[
            ("/entry.js", "import { v } from './mid';\nconsole.log(v);\n"),
            ("/mid.js", "export { v } from './leaf';\n"),
            ("/leaf.js", "export const v = 42;\n"),
        ],
        &["/entry.js"],
        &mut log,
    );
    link(&mut graph, &default_link_options(), &mut log);
    assert!(!log.has_errors());

    for source in 0..graph.file_count() {
        let count = graph.symbols.file_symbols(source as u32).len();
        for inner in 0..count {
            let r = baler_parser::symbols::SymbolRef::new(source as u32, inner as u32);
            let once = graph.symbols.resolve(r);
            assert_eq!(graph.symbols.resolve(once), once);
        }
    }

    // The import chain collapsed onto the leaf's symbol.
    let entry_import = graph.files[1]
        .module
        .named_imports
        .keys()
        .copied()
        .next()
        .expect("entry import");
    let root = graph.symbols.resolve(entry_import);
    assert_eq!(root.source, 3);
}

#[test]
fn renamer_keeps_top_level_names_unique() {
    let mut log = Log::new();
    let mut graph = build_graph(
        &[
            ("/entry.js", "import { fn } from './a';\nimport { g } from './b';\nconsole.log(fn(), g());\n"),
            ("/a.js", "export function fn() { return 1 }\n"),
            ("/b.js", "function fn() { return 2 }\nexport function g() { return fn() }\n"),
        ],
        &["/entry.js"],
        &mut log,
    );
    let result = link(&mut graph, &default_link_options(), &mut log);
    assert!(!log.has_errors());

    let a_fn = graph.files[2].module.module_scope[0].1;
    let b_fn = graph.files[3].module.module_scope[0].1;
    let name_a = result.renamer.name_of(&graph.symbols, a_fn).to_string();
    let name_b = result.renamer.name_of(&graph.symbols, b_fn).to_string();
    assert_eq!(name_a, "fn");
    assert_eq!(name_b, "fn2");
}

#[test]
fn reserved_names_are_never_assigned() {
    let mut log = Log::new();
    // `console` is unbound in /entry.js, so its name is reserved; the
    // declared `console` in /lib.js must be renamed away from it.
    let mut graph = build_graph(
        &[
            ("/entry.js", "import { keep } from './lib';\nconsole.log(keep);\n"),
            (
                "/lib.js",
                "function console() { return { log: () => 1 } }\nexport const keep = console();\n",
            ),
        ],
        &["/entry.js"],
        &mut log,
    );
    let result = link(&mut graph, &default_link_options(), &mut log);
    assert!(!log.has_errors());

    let lib_console = graph.files[2].module.module_scope[0].1;
    let assigned = result.renamer.name_of(&graph.symbols, lib_console);
    assert_eq!(assigned, "console2");
}

#[test]
fn distances_are_minimal_link_counts() {
    let mut log = Log::new();
    let mut graph = build_graph(
        &[
            ("/entry.js", "import './a';\nimport './b';\n"),
            ("/a.js", "import './b';\nconsole.log('a');\n"),
            ("/b.js", "console.log('b');\n"),
        ],
        &["/entry.js"],
        &mut log,
    );
    link(&mut graph, &default_link_options(), &mut log);
    assert!(!log.has_errors());

    assert_eq!(graph.meta[1].distance_from_entry, 0);
    assert_eq!(graph.meta[2].distance_from_entry, 1);
    // Reachable both directly (1) and through /a.js (2): minimum wins.
    assert_eq!(graph.meta[3].distance_from_entry, 1);
}

#[test]
fn minify_assigns_short_names_by_frequency() {
    let mut log = Log::new();
    let mut graph = build_graph(
        &[(
            "/entry.js",
            "export function hot() { return 1 }\nexport function cold() { return 2 }\nconsole.log(hot(), hot(), hot(), cold());\n",
        )],
        &["/entry.js"],
        &mut log,
    );
    let mut options = default_link_options();
    options.minify_identifiers = true;
    let result = link(&mut graph, &options, &mut log);
    assert!(!log.has_errors());

    let hot = graph.files[1].module.module_scope[0].1;
    let cold = graph.files[1].module.module_scope[1].1;
    let hot_name = result.renamer.name_of(&graph.symbols, hot).to_string();
    let cold_name = result.renamer.name_of(&graph.symbols, cold).to_string();
    assert!(hot_name.len() == 1);
    assert!(cold_name.len() == 1);
    assert_ne!(hot_name, cold_name);
}
