//! Namespace export synthesis.
//!
//! Appends one synthetic part per file exposing its named exports as an
//! object of getters:
//!
//! ```js
//! const foo_exports = {};
//! __export(foo_exports, { a: () => a, b: () => b });
//! ```
//!
//! Non-CommonJS files also gain the reserved `"*"` export pointing at the
//! exports object, which is what `import * as ns` binds against.

use smallvec::SmallVec;

use baler_parser::ast::{
    ArrowBody, Expr, Ident, NamedExport, Part, PartFlags, Prop, PropKey, PropValue, Stmt, StmtKind,
    VarDecl, VarDeclKind, VarStmt,
};
use baler_parser::symbols::SymbolRef;

use crate::graph::{FileGraph, HELPER_EXPORT, PartMeta, PartRef};

pub fn synthesize_namespace_exports(graph: &mut FileGraph) {
    let _span = tracing::info_span!("link_namespace_exports").entered();

    let runtime_export = graph.runtime_export(HELPER_EXPORT);

    for source in 0..graph.file_count() {
        let is_commonjs = graph.meta[source].is_commonjs;
        let exports_ref = graph.files[source].module.exports_ref;
        let new_part_index = u32::try_from(graph.files[source].module.parts.len()).unwrap_or(u32::MAX);

        // Aliases exposed on the namespace object: local named exports plus
        // non-ambiguous re-exports, lexicographically sorted.
        let mut aliases: Vec<(String, SymbolRef, u32, SmallVec<[u32; 1]>)> = Vec::new();
        for (alias, export) in &graph.files[source].module.named_exports {
            aliases.push((
                alias.clone(),
                export.symbol,
                source as u32,
                export.part_indices.clone(),
            ));
        }
        for (alias, entry) in &graph.meta[source].resolved_export_stars {
            if entry.is_ambiguous {
                continue;
            }
            aliases.push((alias.clone(), entry.symbol, entry.source, entry.part_indices.clone()));
        }
        aliases.sort_by(|a, b| a.0.cmp(&b.0));

        let mut stmts: Vec<Stmt> = Vec::new();
        let mut part = Part::default();
        let mut meta = PartMeta::default();

        if !is_commonjs {
            // const <exports> = {};
            let mut name = Ident::new("", 0);
            name.symbol = exports_ref;
            stmts.push(Stmt {
                loc: u32::MAX,
                kind: StmtKind::Var(VarStmt {
                    decl_kind: VarDeclKind::Const,
                    decls: vec![VarDecl {
                        name,
                        init: Some(Expr::Object(Vec::new())),
                    }],
                    is_export: false,
                }),
            });
            part.declared_symbols.push(exports_ref);
        }

        if !aliases.is_empty() {
            if let Some((export_helper_ref, ref helper_parts)) = runtime_export {
                let mut props: Vec<Prop> = Vec::new();
                for (alias, symbol, dep_source, dep_parts) in &aliases {
                    let mut getter = Ident::new(graph.symbols.get(*symbol).name.clone(), u32::MAX);
                    getter.symbol = *symbol;
                    props.push(Prop {
                        key: PropKey::Ident(alias.clone()),
                        value: PropValue::Expr(Expr::Arrow {
                            params: Vec::new(),
                            body: ArrowBody::Expr(Box::new(Expr::Ident(getter))),
                        }),
                        shorthand: false,
                    });
                    *part.symbol_uses.entry(*symbol).or_insert(0) += 1;
                    for &p in dep_parts {
                        meta.non_local_dependencies.push(PartRef {
                            source: *dep_source,
                            part: p,
                        });
                    }
                }

                let mut callee = Ident::new(HELPER_EXPORT, u32::MAX);
                callee.symbol = export_helper_ref;
                let mut target = Ident::new("", u32::MAX);
                target.symbol = exports_ref;
                stmts.push(Stmt {
                    loc: u32::MAX,
                    kind: StmtKind::Expr(Expr::Call {
                        callee: Box::new(Expr::Ident(callee)),
                        args: vec![Expr::Ident(target), Expr::Object(props)],
                    }),
                });
                *part.symbol_uses.entry(export_helper_ref).or_insert(0) += 1;
                *part.symbol_uses.entry(exports_ref).or_insert(0) += 1;

                // The __export call itself lives in the runtime.
                for &p in helper_parts {
                    meta.non_local_dependencies.push(PartRef {
                        source: crate::graph::RUNTIME_SOURCE_INDEX,
                        part: p,
                    });
                }

                // The CommonJS wrapper must now pass the exports object in.
                graph.files[source].module.uses_exports_ref = true;
            }
        }

        part.stmts = stmts;
        part.flags = PartFlags::SHOULD_COME_FIRST | PartFlags::FORCE_TREE_SHAKING;
        if !is_commonjs {
            part.flags |= PartFlags::CAN_BE_REMOVED_IF_UNUSED;
        }

        // Bump bundle-wide use estimates for the minifier.
        let uses: Vec<(SymbolRef, u32)> = part.symbol_uses.iter().map(|(&r, &c)| (r, c)).collect();
        for (r, count) in uses {
            graph.symbols.get_mut(r).use_count_estimate += count;
        }

        if !is_commonjs {
            graph.files[source].module.named_exports.insert(
                "*".to_string(),
                NamedExport {
                    symbol: exports_ref,
                    part_indices: SmallVec::from_slice(&[new_part_index]),
                },
            );
        }

        graph.files[source].module.parts.push(part);
        graph.meta[source].part_meta.push(meta);
    }
}
