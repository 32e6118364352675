//! Symbol storage and merging.
//!
//! Every symbol is addressed by a `(source_index, inner_index)` pair into a
//! vector-of-vectors. Symbol merging (binding an import to the export it
//! resolves to) is a union-find over the `link` field of the symbol slot:
//! `follow` chases links with path compression, `merge` points one root at
//! another, and `follow_all` flattens every link so later passes can read the
//! table concurrently without mutating it.

use rustc_hash::FxHashMap;

/// A reference to a symbol: which file it lives in, and its slot there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolRef {
    pub source: u32,
    pub inner: u32,
}

impl Default for SymbolRef {
    fn default() -> Self {
        SymbolRef::INVALID
    }
}

impl SymbolRef {
    /// Placeholder used between parsing and binding.
    pub const INVALID: SymbolRef = SymbolRef {
        source: u32::MAX,
        inner: u32::MAX,
    };

    #[must_use]
    pub const fn new(source: u32, inner: u32) -> Self {
        SymbolRef { source, inner }
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.source != u32::MAX
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// The name did not resolve to any declaration. Unbound symbols are never
    /// renamed and their names are globally reserved.
    Unbound,
    /// `var` and `function` declarations, hoisted within their file.
    Hoisted,
    Other,
}

/// Tag on a symbol telling the printer to emit `<namespace>.<alias>` instead
/// of a bare identifier. Set by the import binder when a named import
/// resolves into a CommonJS-shaped or external module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceAlias {
    pub namespace_ref: SymbolRef,
    pub alias: String,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    /// The name from the source, or a generated pretty name for synthetic
    /// symbols. The renamer assigns final printed names separately.
    pub name: String,
    pub kind: SymbolKind,
    /// Estimated number of references, used by the minifier to order its
    /// frequency-based name assignment.
    pub use_count_estimate: u32,
    /// Union-find parent; `None` for a root.
    pub link: Option<SymbolRef>,
    pub namespace_alias: Option<NamespaceAlias>,
}

impl Symbol {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Symbol {
            name: name.into(),
            kind,
            use_count_estimate: 0,
            link: None,
            namespace_alias: None,
        }
    }
}

/// The bundle-wide two-level symbol table.
#[derive(Debug, Default)]
pub struct SymbolMap {
    files: Vec<Vec<Symbol>>,
}

impl SymbolMap {
    #[must_use]
    pub fn new(files: Vec<Vec<Symbol>>) -> Self {
        SymbolMap { files }
    }

    #[must_use]
    pub fn get(&self, r: SymbolRef) -> &Symbol {
        &self.files[r.source as usize][r.inner as usize]
    }

    pub fn get_mut(&mut self, r: SymbolRef) -> &mut Symbol {
        &mut self.files[r.source as usize][r.inner as usize]
    }

    #[must_use]
    pub fn file_symbols(&self, source: u32) -> &[Symbol] {
        &self.files[source as usize]
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Chase links to the root of the merged set, compressing the path.
    pub fn follow(&mut self, r: SymbolRef) -> SymbolRef {
        let Some(link) = self.get(r).link else {
            return r;
        };
        let root = self.follow(link);
        if root != link {
            self.get_mut(r).link = Some(root);
        }
        root
    }

    /// Non-mutating variant for use after `follow_all` has flattened every
    /// link (each chain is then at most one hop).
    #[must_use]
    pub fn resolve(&self, r: SymbolRef) -> SymbolRef {
        match self.get(r).link {
            Some(link) => match self.get(link).link {
                Some(root) => root,
                None => link,
            },
            None => r,
        }
    }

    /// Merge `old` into `new`: future lookups of `old` yield `new`'s root.
    pub fn merge(&mut self, old: SymbolRef, new: SymbolRef) {
        let old_root = self.follow(old);
        let new_root = self.follow(new);
        if old_root == new_root {
            return;
        }
        let count = self.get(old_root).use_count_estimate;
        self.get_mut(new_root).use_count_estimate += count;
        self.get_mut(old_root).link = Some(new_root);
    }

    /// Flatten every link chain to a single hop. Run once before emission so
    /// printer tasks can share the table read-only.
    pub fn follow_all(&mut self) {
        for source in 0..self.files.len() {
            for inner in 0..self.files[source].len() {
                let r = SymbolRef::new(u32::try_from(source).unwrap_or(0), u32::try_from(inner).unwrap_or(0));
                self.follow(r);
            }
        }
    }
}

/// Per-file interner for unbound names: all references to the same undeclared
/// name within one file share a single symbol.
#[derive(Debug, Default)]
pub struct UnboundNames {
    by_name: FxHashMap<String, SymbolRef>,
}

impl UnboundNames {
    pub fn intern(
        &mut self,
        name: &str,
        symbols: &mut Vec<Symbol>,
        source_index: u32,
    ) -> SymbolRef {
        if let Some(&r) = self.by_name.get(name) {
            return r;
        }
        let r = SymbolRef::new(source_index, u32::try_from(symbols.len()).unwrap_or(u32::MAX));
        symbols.push(Symbol::new(name, SymbolKind::Unbound));
        self.by_name.insert(name.to_string(), r);
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(counts: &[usize]) -> SymbolMap {
        SymbolMap::new(
            counts
                .iter()
                .map(|&n| (0..n).map(|i| Symbol::new(format!("s{i}"), SymbolKind::Other)).collect())
                .collect(),
        )
    }

    #[test]
    fn follow_of_root_is_identity() {
        let mut map = map_with(&[2]);
        let r = SymbolRef::new(0, 0);
        assert_eq!(map.follow(r), r);
    }

    #[test]
    fn merge_redirects_and_sums_use_counts() {
        let mut map = map_with(&[3]);
        let a = SymbolRef::new(0, 0);
        let b = SymbolRef::new(0, 1);
        let c = SymbolRef::new(0, 2);
        map.get_mut(a).use_count_estimate = 2;
        map.get_mut(b).use_count_estimate = 3;
        map.merge(a, b);
        map.merge(b, c);
        assert_eq!(map.follow(a), c);
        assert_eq!(map.get(c).use_count_estimate, 5);
    }

    #[test]
    fn follow_all_makes_resolve_idempotent() {
        let mut map = map_with(&[4]);
        let refs: Vec<SymbolRef> = (0..4).map(|i| SymbolRef::new(0, i)).collect();
        map.merge(refs[0], refs[1]);
        map.merge(refs[1], refs[2]);
        map.merge(refs[2], refs[3]);
        map.follow_all();
        for &r in &refs {
            assert_eq!(map.resolve(r), map.resolve(map.resolve(r)));
            assert_eq!(map.resolve(r), refs[3]);
        }
    }
}
