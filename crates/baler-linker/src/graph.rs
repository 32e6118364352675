//! The file graph: parallel per-file arrays the linker passes read and write.
//!
//! Construction snapshots the parser's output (modules and symbol vectors are
//! cloned) so linker passes can mutate freely while the scan results stay
//! untouched for other links over the same bundle.

use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use baler_parser::ast::Module;
use baler_parser::symbols::{SymbolMap, SymbolRef};

/// The runtime module always occupies source index 0.
pub const RUNTIME_SOURCE_INDEX: u32 = 0;

pub const HELPER_COMMONJS: &str = "__commonJS";
pub const HELPER_TO_MODULE: &str = "__toModule";
pub const HELPER_EXPORT: &str = "__export";

/// An immutable parsed file.
#[derive(Debug, Clone)]
pub struct Source {
    pub index: u32,
    pub abs_path: String,
    pub pretty_path: String,
    pub contents: String,
}

/// A parsed file plus its import resolution map, filled during scan.
#[derive(Debug, Clone, Default)]
pub struct File {
    pub module: Module,
    /// Specifier text -> target source index.
    pub resolved_imports: FxHashMap<String, u32>,
}

impl File {
    /// O(1) lookup honoring the runtime sentinel recorded during scan.
    #[must_use]
    pub fn resolve_import(&self, path: &str) -> Option<u32> {
        self.resolved_imports.get(path).copied()
    }
}

/// A `(source index, part index)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartRef {
    pub source: u32,
    pub part: u32,
}

/// Fixed-width bitset keyed by entry-point ordinal.
///
/// Capacity is fixed at construction; equality and hashing go over the raw
/// block storage so a set is directly usable as a chunk-map key.
#[derive(Debug, Clone, Default)]
pub struct EntryBits(FixedBitSet);

impl EntryBits {
    #[must_use]
    pub fn new(bit_count: usize) -> Self {
        EntryBits(FixedBitSet::with_capacity(bit_count))
    }

    pub fn set(&mut self, i: usize) {
        self.0.insert(i);
    }

    #[must_use]
    pub fn test(&self, i: usize) -> bool {
        self.0.contains(i)
    }

    /// True when no bit is set (the part is unreachable).
    #[must_use]
    pub fn is_all_zero(&self) -> bool {
        self.0.count_ones(..) == 0
    }

    #[must_use]
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.ones()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `other` contains every bit of `self`.
    #[must_use]
    pub fn is_subset_of(&self, other: &EntryBits) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl PartialEq for EntryBits {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.as_slice() == other.0.as_slice()
    }
}

impl Eq for EntryBits {}

impl std::hash::Hash for EntryBits {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        self.0.as_slice().hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPointKind {
    None,
    User,
    Dynamic,
}

/// One flattened `export *` result: where the alias actually lives.
#[derive(Debug, Clone)]
pub struct ExportStarEntry {
    pub source: u32,
    pub symbol: SymbolRef,
    pub part_indices: SmallVec<[u32; 1]>,
    pub is_ambiguous: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PartMeta {
    pub entry_bits: EntryBits,
    /// Parts in other files this part depends on.
    pub non_local_dependencies: Vec<PartRef>,
}

#[derive(Debug, Clone)]
pub struct FileMeta {
    pub is_commonjs: bool,
    pub entry_point_kind: EntryPointKind,
    /// Minimum link count to any reaching entry point.
    pub distance_from_entry: u32,
    pub entry_bits: EntryBits,
    /// Alias -> resolved re-export, flattened across `export *` chains.
    pub resolved_export_stars: FxHashMap<String, ExportStarEntry>,
    pub part_meta: Vec<PartMeta>,
}

impl FileMeta {
    fn for_file(file: &File) -> Self {
        FileMeta {
            is_commonjs: file.module.uses_commonjs_features,
            entry_point_kind: EntryPointKind::None,
            distance_from_entry: u32::MAX,
            entry_bits: EntryBits::default(),
            resolved_export_stars: FxHashMap::default(),
            part_meta: vec![PartMeta::default(); file.module.parts.len()],
        }
    }
}

/// All per-file state for one link. The linker passes mutate this in order;
/// chunk emission reads it.
pub struct FileGraph {
    pub sources: Vec<Source>,
    pub files: Vec<File>,
    pub meta: Vec<FileMeta>,
    /// Entry-point source indices; the classifier appends dynamic-import
    /// targets.
    pub entry_points: Vec<u32>,
    pub symbols: SymbolMap,
}

impl FileGraph {
    /// Snapshot a scanned bundle for linking. Modules are cloned; each
    /// clone's symbol vector moves into the bundle-wide `SymbolMap`.
    #[must_use]
    pub fn new(sources: &[Source], files: &[File], entry_points: Vec<u32>) -> Self {
        let mut files: Vec<File> = files.to_vec();
        let symbol_vecs: Vec<_> = files
            .iter_mut()
            .map(|file| std::mem::take(&mut file.module.symbols))
            .collect();
        let meta = files.iter().map(FileMeta::for_file).collect();
        let mut graph = FileGraph {
            sources: sources.to_vec(),
            files,
            meta,
            entry_points,
            symbols: SymbolMap::new(symbol_vecs),
        };
        for &entry in &graph.entry_points {
            graph.meta[entry as usize].entry_point_kind = EntryPointKind::User;
        }
        graph
    }

    #[must_use]
    pub fn resolve_import(&self, source: u32, path: &str) -> Option<u32> {
        self.files[source as usize].resolve_import(path)
    }

    /// Look up a named export of the runtime module.
    #[must_use]
    pub fn runtime_export(&self, name: &str) -> Option<(SymbolRef, SmallVec<[u32; 1]>)> {
        let runtime = &self.files[RUNTIME_SOURCE_INDEX as usize].module;
        runtime
            .named_exports
            .get(name)
            .map(|export| (export.symbol, export.part_indices.clone()))
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_bits_equality_and_hash_are_content_based() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut a = EntryBits::new(10);
        let mut b = EntryBits::new(10);
        a.set(3);
        b.set(3);
        assert_eq!(a, b);

        let hash = |bits: &EntryBits| {
            let mut hasher = DefaultHasher::new();
            bits.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(hash(&a), hash(&b));

        b.set(7);
        assert_ne!(a, b);
    }

    #[test]
    fn entry_bits_subset() {
        let mut small = EntryBits::new(4);
        let mut big = EntryBits::new(4);
        small.set(1);
        big.set(1);
        big.set(2);
        assert!(small.is_subset_of(&big));
        assert!(!big.is_subset_of(&small));
    }

    #[test]
    fn all_zero_detection() {
        let mut bits = EntryBits::new(4);
        assert!(bits.is_all_zero());
        bits.set(0);
        assert!(!bits.is_all_zero());
    }
}
