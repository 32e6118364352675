//! Bundle-wide symbol renaming and identifier minification.
//!
//! Both algorithms assign printed names to top-level symbols only; nested
//! symbols keep their original names and every nested name is reserved, so
//! no assignment can collide with or be shadowed by inner code. Unbound
//! symbols are never renamed and their names are reserved bundle-wide.

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};

use baler_parser::bind::path_slug;
use baler_parser::symbols::{SymbolKind, SymbolMap, SymbolRef};

use crate::graph::{FileGraph, HELPER_COMMONJS, HELPER_EXPORT, HELPER_TO_MODULE, RUNTIME_SOURCE_INDEX};

#[derive(Debug, Clone, Copy, Default)]
pub struct RenameOptions {
    pub minify_identifiers: bool,
    pub is_bundling: bool,
}

/// Final printed names, keyed by root symbol.
#[derive(Debug, Default)]
pub struct Renamer {
    names: Vec<FxHashMap<u32, String>>,
}

impl Renamer {
    fn with_file_count(count: usize) -> Self {
        Renamer {
            names: vec![FxHashMap::default(); count],
        }
    }

    fn set(&mut self, r: SymbolRef, name: String) {
        self.names[r.source as usize].insert(r.inner, name);
    }

    fn has(&self, r: SymbolRef) -> bool {
        self.names[r.source as usize].contains_key(&r.inner)
    }

    /// The printed name for a symbol. Call after `follow_all`.
    #[must_use]
    pub fn name_of<'a>(&'a self, symbols: &'a SymbolMap, r: SymbolRef) -> &'a str {
        let root = symbols.resolve(r);
        match self.names[root.source as usize].get(&root.inner) {
            Some(name) => name,
            None => &symbols.get(root).name,
        }
    }
}

static JS_KEYWORDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
        "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
        "import", "in", "instanceof", "let", "new", "null", "return", "static", "super", "switch",
        "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
    ]
    .into_iter()
    .collect()
});

pub fn assign_names(graph: &mut FileGraph, options: RenameOptions) -> Renamer {
    let _span = tracing::info_span!("link_rename", minify = options.minify_identifiers).entered();

    assign_pretty_names(graph);
    let reserved = collect_reserved_names(graph, options);

    if options.minify_identifiers {
        minify_names(graph, &reserved)
    } else {
        rename_with_suffixes(graph, &reserved)
    }
}

/// Give every non-CommonJS file's `exports`/`module` symbols slug-based
/// names so later renaming produces stable readable suffixes. CommonJS files
/// keep `exports`/`module`: those become the closure parameters.
fn assign_pretty_names(graph: &mut FileGraph) {
    for source in 0..graph.file_count() {
        if graph.meta[source].is_commonjs {
            continue;
        }
        let slug = path_slug(&graph.sources[source].pretty_path);
        let exports_ref = graph.files[source].module.exports_ref;
        let module_ref = graph.files[source].module.module_ref;
        graph.symbols.get_mut(exports_ref).name = format!("{slug}_exports");
        graph.symbols.get_mut(module_ref).name = format!("{slug}_module");
    }
}

/// Reserved names: every unbound name in any module scope, every name
/// declared in a nested scope, the runtime's non-helper members, and (when
/// bundling) `require` and `Promise`.
fn collect_reserved_names(graph: &FileGraph, options: RenameOptions) -> FxHashSet<String> {
    let mut reserved: FxHashSet<String> = FxHashSet::default();
    if options.is_bundling {
        reserved.insert("require".to_string());
        reserved.insert("Promise".to_string());
    }
    for source in 0..graph.file_count() {
        for symbol in graph.symbols.file_symbols(source as u32) {
            if symbol.kind == SymbolKind::Unbound {
                reserved.insert(symbol.name.clone());
            }
        }
        for name in &graph.files[source].module.nested_declared_names {
            reserved.insert(name.clone());
        }
    }
    for (name, _) in &graph.files[RUNTIME_SOURCE_INDEX as usize].module.module_scope {
        if name != HELPER_COMMONJS && name != HELPER_TO_MODULE && name != HELPER_EXPORT {
            reserved.insert(name.clone());
        }
    }
    reserved
}

/// The symbols a file contributes to the top-level scope, in a deterministic
/// order: module scope declarations, the exports/module/wrapper trio, then
/// import namespace symbols.
fn top_level_symbols(graph: &FileGraph, source: usize) -> Vec<SymbolRef> {
    let module = &graph.files[source].module;
    let mut seen: FxHashSet<SymbolRef> = FxHashSet::default();
    let mut out: Vec<SymbolRef> = Vec::new();
    let mut push = |r: SymbolRef, out: &mut Vec<SymbolRef>| {
        if r.is_valid() && seen.insert(r) {
            out.push(r);
        }
    };
    for &(_, r) in &module.module_scope {
        push(r, &mut out);
    }
    push(module.exports_ref, &mut out);
    push(module.module_ref, &mut out);
    push(module.wrapper_ref, &mut out);
    let mut namespaces: Vec<SymbolRef> = module
        .named_imports
        .values()
        .map(|import| import.namespace_ref)
        .collect();
    namespaces.sort_unstable();
    for r in namespaces {
        push(r, &mut out);
    }
    out
}

fn is_assignable_root(graph: &mut FileGraph, r: SymbolRef) -> Option<SymbolRef> {
    let root = graph.symbols.follow(r);
    if root != r {
        return None; // merged away; the root is named in its own file
    }
    let symbol = graph.symbols.get(root);
    if symbol.kind == SymbolKind::Unbound || symbol.namespace_alias.is_some() {
        return None;
    }
    Some(root)
}

/// Non-minifying rename: keep original names, appending a numeric suffix on
/// collision with a reserved or previously assigned name.
fn rename_with_suffixes(graph: &mut FileGraph, reserved: &FxHashSet<String>) -> Renamer {
    let mut renamer = Renamer::with_file_count(graph.file_count());
    let mut used: FxHashSet<String> = reserved.clone();

    for source in 0..graph.file_count() {
        for r in top_level_symbols(graph, source) {
            let Some(root) = is_assignable_root(graph, r) else {
                continue;
            };
            if renamer.has(root) {
                continue;
            }
            let base = graph.symbols.get(root).name.clone();
            let mut name = base.clone();
            let mut suffix = 2u32;
            while used.contains(&name) || JS_KEYWORDS.contains(name.as_str()) {
                name = format!("{base}{suffix}");
                suffix += 1;
            }
            used.insert(name.clone());
            renamer.set(root, name);
        }
    }
    renamer
}

/// Greedy shortest-name assignment in use-count order.
fn minify_names(graph: &mut FileGraph, reserved: &FxHashSet<String>) -> Renamer {
    let mut renamer = Renamer::with_file_count(graph.file_count());

    let mut candidates: Vec<(u32, SymbolRef)> = Vec::new();
    let mut seen: FxHashSet<SymbolRef> = FxHashSet::default();
    for source in 0..graph.file_count() {
        for r in top_level_symbols(graph, source) {
            let Some(root) = is_assignable_root(graph, r) else {
                continue;
            };
            if seen.insert(root) {
                candidates.push((graph.symbols.get(root).use_count_estimate, root));
            }
        }
    }
    // Most-used first; ties broken by symbol identity for determinism.
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let mut counter = 0usize;
    for (_, root) in candidates {
        let name = loop {
            let name = minified_name(counter);
            counter += 1;
            if !reserved.contains(&name) && !JS_KEYWORDS.contains(name.as_str()) {
                break name;
            }
        };
        renamer.set(root, name);
    }
    renamer
}

const NAME_HEAD: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ$_";
const NAME_TAIL: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ$_0123456789";

/// The `i`-th shortest identifier: `a`, `b`, ... `_`, `aa`, `ab`, ...
fn minified_name(i: usize) -> String {
    let mut name = String::new();
    name.push(NAME_HEAD[i % NAME_HEAD.len()] as char);
    let mut rest = i / NAME_HEAD.len();
    while rest > 0 {
        rest -= 1;
        name.push(NAME_TAIL[rest % NAME_TAIL.len()] as char);
        rest /= NAME_TAIL.len();
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minified_names_are_unique_and_short_first() {
        let names: Vec<String> = (0..200).map(minified_name).collect();
        assert_eq!(names[0], "a");
        assert_eq!(names[25], "z");
        let unique: FxHashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert!(names[..54].iter().all(|n| n.len() == 1));
        assert!(names[54..].iter().all(|n| n.len() == 2));
    }
}
