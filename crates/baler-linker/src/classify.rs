//! First linker pass: CommonJS classification and dynamic entry promotion.
//!
//! Only direct targets of `require()` and `import()` are marked; there is no
//! transitive promotion. Export-star resolution later skips CommonJS
//! intermediates outright, so the direct flag is all it needs.

use baler_parser::ast::ImportKind;

use crate::graph::{EntryPointKind, FileGraph};

pub fn classify(graph: &mut FileGraph) {
    let _span = tracing::info_span!("link_classify", files = graph.file_count()).entered();

    for source in 0..graph.file_count() {
        for part_index in 0..graph.files[source].module.parts.len() {
            let records: Vec<(ImportKind, Option<u32>)> = {
                let file = &graph.files[source];
                file.module.parts[part_index]
                    .import_records
                    .iter()
                    .map(|&ri| {
                        let record = &file.module.import_records[ri as usize];
                        (record.kind, file.resolve_import(&record.path))
                    })
                    .collect()
            };
            for (kind, target) in records {
                let Some(target) = target else { continue };
                let target = target as usize;
                match kind {
                    ImportKind::Require => {
                        graph.meta[target].is_commonjs = true;
                    }
                    ImportKind::Dynamic => {
                        // Dynamic targets are wrapped like CommonJS so the
                        // import expression can evaluate them on demand.
                        graph.meta[target].is_commonjs = true;
                        if graph.meta[target].entry_point_kind == EntryPointKind::None {
                            graph.meta[target].entry_point_kind = EntryPointKind::Dynamic;
                            graph.entry_points.push(target as u32);
                        }
                    }
                    ImportKind::Stmt => {}
                }
            }
        }
    }
}
