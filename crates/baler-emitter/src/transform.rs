//! Statement transforms for bundle context.
//!
//! Converts a file's chunk-selected parts into the statement list that
//! actually prints: import/export syntax is rewritten or stripped,
//! `require()` calls become wrapper invocations, and CommonJS-shaped files
//! are wrapped in a `__commonJS` closure bound to their wrapper symbol.

use baler_linker::Chunk;
use baler_linker::graph::{EntryPointKind, FileGraph, HELPER_COMMONJS, HELPER_TO_MODULE};
use baler_parser::ast::*;
use baler_parser::symbols::SymbolRef;

#[derive(Debug, Clone, Copy, Default)]
pub struct TransformOptions {
    pub is_bundling: bool,
    pub mangle_syntax: bool,
}

fn ident_for(symbol: SymbolRef) -> Ident {
    let mut ident = Ident::new("", u32::MAX);
    ident.symbol = symbol;
    ident
}

fn unbound_require_call(path: String) -> Expr {
    Expr::Call {
        callee: Box::new(Expr::Ident(Ident::new("require", u32::MAX))),
        args: vec![Expr::Str(path)],
    }
}

/// The statements one source contributes to a chunk, transformed for bundle
/// context. Parts flagged `should_come_first` print ahead of the rest, both
/// groups in original part order.
pub fn stmts_for_source_in_chunk(
    graph: &FileGraph,
    chunk: &Chunk,
    source: u32,
    options: TransformOptions,
) -> Vec<Stmt> {
    let Some(part_indices) = chunk.parts.get(&source) else {
        return Vec::new();
    };
    let parts = &graph.files[source as usize].module.parts;

    let mut ordered: Vec<u32> = Vec::with_capacity(part_indices.len());
    ordered.extend(
        part_indices
            .iter()
            .copied()
            .filter(|&p| parts[p as usize].should_come_first()),
    );
    ordered.extend(
        part_indices
            .iter()
            .copied()
            .filter(|&p| !parts[p as usize].should_come_first()),
    );

    let mut stmts: Vec<Stmt> = Vec::new();
    for part in ordered {
        for stmt in &parts[part as usize].stmts {
            if !options.is_bundling {
                stmts.push(stmt.clone());
                continue;
            }
            if let Some(mut converted) = convert_stmt(graph, source, stmt.clone()) {
                rewrite_requires_in_stmt(graph, source, &mut converted);
                stmts.push(converted);
            }
        }
    }

    if options.is_bundling && graph.meta[source as usize].is_commonjs {
        stmts = wrap_commonjs(graph, source, stmts);
    }

    if options.mangle_syntax {
        stmts = merge_adjacent_vars(stmts);
    }
    stmts
}

/// Per-statement rewrites when bundling. `None` drops the statement
/// entirely.
fn convert_stmt(graph: &FileGraph, source: u32, stmt: Stmt) -> Option<Stmt> {
    let loc = stmt.loc;
    match stmt.kind {
        StmtKind::Import(import) => {
            let path = graph.files[source as usize].module.import_records
                [import.record as usize]
                .path
                .clone();
            let target = graph.resolve_import(source, &path);
            if let Some(target) = target {
                if !graph.meta[target as usize].is_commonjs {
                    // Bindings were resolved during import binding.
                    return None;
                }
            }
            let has_bindings = import.default_name.is_some()
                || import.star_name.is_some()
                || !import.items.is_empty();
            Some(namespace_require_stmt(graph, loc, target, path, import.namespace_ref, has_bindings))
        }
        StmtKind::ExportFrom { record, namespace_ref, .. } => {
            let path = graph.files[source as usize].module.import_records[record as usize]
                .path
                .clone();
            let target = graph.resolve_import(source, &path);
            if let Some(target) = target {
                if !graph.meta[target as usize].is_commonjs {
                    return None;
                }
            }
            // Re-exported bindings print as property accesses on the
            // namespace, which therefore must be declared.
            Some(namespace_require_stmt(graph, loc, target, path, namespace_ref, true))
        }
        StmtKind::ExportStar { .. } | StmtKind::ExportClause { .. } => None,
        StmtKind::ExportDefault { default_ref, value } => Some(rewrite_export_default(loc, default_ref, value)),
        StmtKind::Var(mut var) => {
            var.is_export = false;
            Some(Stmt { loc, kind: StmtKind::Var(var) })
        }
        StmtKind::Func(mut func) => {
            func.is_export = false;
            Some(Stmt { loc, kind: StmtKind::Func(func) })
        }
        StmtKind::Class(mut class) => {
            class.is_export = false;
            Some(Stmt { loc, kind: StmtKind::Class(class) })
        }
        other => Some(Stmt { loc, kind: other }),
    }
}

/// `const ns = __toModule(require_target())` for a CommonJS target, or
/// `const ns = __toModule(require("path"))` for an external one. Without
/// bindings only the side effect remains.
fn namespace_require_stmt(
    graph: &FileGraph,
    loc: u32,
    target: Option<u32>,
    path: String,
    namespace_ref: SymbolRef,
    has_bindings: bool,
) -> Stmt {
    let inner = match target {
        Some(target) => Expr::Call {
            callee: Box::new(Expr::Ident(ident_for(
                graph.files[target as usize].module.wrapper_ref,
            ))),
            args: Vec::new(),
        },
        None => unbound_require_call(path),
    };
    let value = match graph.runtime_export(HELPER_TO_MODULE) {
        Some((to_module, _)) => Expr::Call {
            callee: Box::new(Expr::Ident(ident_for(to_module))),
            args: vec![inner],
        },
        None => inner,
    };
    if has_bindings {
        Stmt {
            loc,
            kind: StmtKind::Var(VarStmt {
                decl_kind: VarDeclKind::Var,
                decls: vec![VarDecl {
                    name: ident_for(namespace_ref),
                    init: Some(value),
                }],
                is_export: false,
            }),
        }
    } else {
        Stmt { loc, kind: StmtKind::Expr(value) }
    }
}

/// `export default` becomes a plain declaration bound to the default symbol.
fn rewrite_export_default(loc: u32, default_ref: Ident, value: Expr) -> Stmt {
    match value {
        Expr::Function(func) => {
            let FnExpr { name, params, body } = *func;
            Stmt {
                loc,
                kind: StmtKind::Func(FuncStmt {
                    name: name.unwrap_or(default_ref),
                    params,
                    body,
                    is_export: false,
                }),
            }
        }
        Expr::Class(class) => {
            let ClassExpr { name, extends, members } = *class;
            Stmt {
                loc,
                kind: StmtKind::Class(ClassStmt {
                    name: name.unwrap_or(default_ref),
                    extends,
                    members,
                    is_export: false,
                }),
            }
        }
        other => Stmt {
            loc,
            kind: StmtKind::Var(VarStmt {
                decl_kind: VarDeclKind::Const,
                decls: vec![VarDecl {
                    name: default_ref,
                    init: Some(other),
                }],
                is_export: false,
            }),
        },
    }
}

/// Wrap a CommonJS-shaped file's statements:
///
/// ```js
/// var require_foo = __commonJS((exports, module) => { ... });
/// ```
///
/// Entry-point wrappers (user and dynamic) are invoked after binding;
/// internal wrappers are only bound.
fn wrap_commonjs(graph: &FileGraph, source: u32, stmts: Vec<Stmt>) -> Vec<Stmt> {
    let module = &graph.files[source as usize].module;

    let mut params: Vec<Param> = Vec::new();
    if module.uses_exports_ref || module.uses_module_ref {
        params.push(Param {
            binding: ident_for(module.exports_ref),
            default: None,
            is_rest: false,
        });
    }
    if module.uses_module_ref {
        params.push(Param {
            binding: ident_for(module.module_ref),
            default: None,
            is_rest: false,
        });
    }

    let callback = Expr::Arrow {
        params,
        body: ArrowBody::Block(stmts),
    };
    let call = match graph.runtime_export(HELPER_COMMONJS) {
        Some((common_js, _)) => Expr::Call {
            callee: Box::new(Expr::Ident(ident_for(common_js))),
            args: vec![callback],
        },
        None => callback,
    };

    let mut out = vec![Stmt {
        loc: u32::MAX,
        kind: StmtKind::Var(VarStmt {
            decl_kind: VarDeclKind::Var,
            decls: vec![VarDecl {
                name: ident_for(module.wrapper_ref),
                init: Some(call),
            }],
            is_export: false,
        }),
    }];

    match graph.meta[source as usize].entry_point_kind {
        EntryPointKind::User | EntryPointKind::Dynamic => {
            out.push(Stmt {
                loc: u32::MAX,
                kind: StmtKind::Expr(Expr::Call {
                    callee: Box::new(Expr::Ident(ident_for(module.wrapper_ref))),
                    args: Vec::new(),
                }),
            });
        }
        EntryPointKind::None => {}
    }
    out
}

/// Rewrite `require("path")` expressions to wrapper invocations when the
/// target was bundled; unresolved paths keep the plain `require` call.
fn rewrite_requires_in_stmt(graph: &FileGraph, source: u32, stmt: &mut Stmt) {
    walk_stmt_exprs(stmt, &mut |expr| {
        if let Expr::Require { record } = expr {
            let path = &graph.files[source as usize].module.import_records[*record as usize].path;
            if let Some(target) = graph.resolve_import(source, path) {
                *expr = Expr::Call {
                    callee: Box::new(Expr::Ident(ident_for(
                        graph.files[target as usize].module.wrapper_ref,
                    ))),
                    args: Vec::new(),
                };
            }
        }
    });
}

/// Merge adjacent variable declarations with the same kind.
fn merge_adjacent_vars(stmts: Vec<Stmt>) -> Vec<Stmt> {
    let mut out: Vec<Stmt> = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        if let StmtKind::Var(var) = &stmt.kind {
            if let Some(prev) = out.last_mut() {
                if let StmtKind::Var(prev_var) = &mut prev.kind {
                    if prev_var.decl_kind == var.decl_kind && prev_var.is_export == var.is_export {
                        prev_var.decls.extend(var.decls.iter().cloned());
                        continue;
                    }
                }
            }
        }
        out.push(stmt);
    }
    out
}

// ==================== Expression walking ====================

fn walk_stmt_exprs(stmt: &mut Stmt, f: &mut impl FnMut(&mut Expr)) {
    match &mut stmt.kind {
        StmtKind::Var(var) => {
            for decl in &mut var.decls {
                if let Some(init) = &mut decl.init {
                    walk_expr(init, f);
                }
            }
        }
        StmtKind::Func(func) => walk_body(&mut func.params, &mut func.body, f),
        StmtKind::Class(class) => {
            if let Some(extends) = &mut class.extends {
                walk_expr(extends, f);
            }
            for member in &mut class.members {
                walk_class_member(member, f);
            }
        }
        StmtKind::Expr(expr) | StmtKind::Throw(expr) => walk_expr(expr, f),
        StmtKind::Return(Some(expr)) => walk_expr(expr, f),
        StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {}
        StmtKind::If { test, cons, alt } => {
            walk_expr(test, f);
            walk_stmt_exprs(cons, f);
            if let Some(alt) = alt {
                walk_stmt_exprs(alt, f);
            }
        }
        StmtKind::While { test, body } => {
            walk_expr(test, f);
            walk_stmt_exprs(body, f);
        }
        StmtKind::For { init, test, update, body } => {
            if let Some(init) = init {
                walk_for_init(init, f);
            }
            if let Some(test) = test {
                walk_expr(test, f);
            }
            if let Some(update) = update {
                walk_expr(update, f);
            }
            walk_stmt_exprs(body, f);
        }
        StmtKind::ForIn { decl, obj, body, .. } => {
            walk_for_init(decl, f);
            walk_expr(obj, f);
            walk_stmt_exprs(body, f);
        }
        StmtKind::Block(stmts) => {
            for stmt in stmts {
                walk_stmt_exprs(stmt, f);
            }
        }
        StmtKind::ExportDefault { value, .. } => walk_expr(value, f),
        StmtKind::Import(_)
        | StmtKind::ExportClause { .. }
        | StmtKind::ExportFrom { .. }
        | StmtKind::ExportStar { .. } => {}
    }
}

fn walk_for_init(init: &mut ForInit, f: &mut impl FnMut(&mut Expr)) {
    match init {
        ForInit::Var(var) => {
            for decl in &mut var.decls {
                if let Some(init) = &mut decl.init {
                    walk_expr(init, f);
                }
            }
        }
        ForInit::Expr(expr) => walk_expr(expr, f),
    }
}

fn walk_body(params: &mut [Param], body: &mut [Stmt], f: &mut impl FnMut(&mut Expr)) {
    for param in params {
        if let Some(default) = &mut param.default {
            walk_expr(default, f);
        }
    }
    for stmt in body {
        walk_stmt_exprs(stmt, f);
    }
}

fn walk_class_member(member: &mut ClassMember, f: &mut impl FnMut(&mut Expr)) {
    if let PropKey::Computed(expr) = &mut member.key {
        walk_expr(expr, f);
    }
    match &mut member.kind {
        ClassMemberKind::Method { params, body } => walk_body(params, body, f),
        ClassMemberKind::Field { value } => {
            if let Some(value) = value {
                walk_expr(value, f);
            }
        }
    }
}

fn walk_expr(expr: &mut Expr, f: &mut impl FnMut(&mut Expr)) {
    f(expr);
    match expr {
        Expr::Template { parts, .. } => {
            for part in parts {
                walk_expr(&mut part.expr, f);
            }
        }
        Expr::Array(items) => {
            for item in items {
                walk_expr(item, f);
            }
        }
        Expr::Object(props) => {
            for prop in props {
                if let PropKey::Computed(expr) = &mut prop.key {
                    walk_expr(expr, f);
                }
                match &mut prop.value {
                    PropValue::Expr(expr) => walk_expr(expr, f),
                    PropValue::Method { params, body } => walk_body(params, body, f),
                }
            }
        }
        Expr::Spread(inner) => walk_expr(inner, f),
        Expr::Call { callee, args } | Expr::New { callee, args } => {
            walk_expr(callee, f);
            for arg in args {
                walk_expr(arg, f);
            }
        }
        Expr::Member { obj, .. } => walk_expr(obj, f),
        Expr::Index { obj, index } => {
            walk_expr(obj, f);
            walk_expr(index, f);
        }
        Expr::Unary { arg, .. } | Expr::Postfix { arg, .. } => walk_expr(arg, f),
        Expr::Binary { left, right, .. } => {
            walk_expr(left, f);
            walk_expr(right, f);
        }
        Expr::Assign { target, value, .. } => {
            walk_expr(target, f);
            walk_expr(value, f);
        }
        Expr::Cond { test, cons, alt } => {
            walk_expr(test, f);
            walk_expr(cons, f);
            walk_expr(alt, f);
        }
        Expr::Arrow { params, body } => {
            for param in &mut params[..] {
                if let Some(default) = &mut param.default {
                    walk_expr(default, f);
                }
            }
            match body {
                ArrowBody::Expr(expr) => walk_expr(expr, f),
                ArrowBody::Block(stmts) => {
                    for stmt in stmts {
                        walk_stmt_exprs(stmt, f);
                    }
                }
            }
        }
        Expr::Function(func) => walk_body(&mut func.params, &mut func.body, f),
        Expr::Class(class) => {
            if let Some(extends) = &mut class.extends {
                walk_expr(extends, f);
            }
            for member in &mut class.members {
                walk_class_member(member, f);
            }
        }
        _ => {}
    }
}
