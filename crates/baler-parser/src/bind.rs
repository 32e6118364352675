//! The bind pass: scopes, symbols, parts and import/export tables.
//!
//! Runs after syntax parsing. Top-level declarations are hoisted into the
//! module scope first so references resolve regardless of statement order,
//! then every top-level statement becomes one `Part` with its declared
//! symbols, use counts and import records. Names that resolve nowhere become
//! per-file unbound symbols.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use baler_common::Log;

use crate::ast::*;
use crate::parser::ParseOptions;
use crate::symbols::{Symbol, SymbolKind, SymbolRef, UnboundNames};

/// Derive an identifier-safe slug from a path: the basename without its
/// extension, with every other character replaced by `_`.
#[must_use]
pub fn path_slug(path: &str) -> String {
    let base = path.rsplit('/').next().unwrap_or(path);
    let stem = match base.find('.') {
        Some(0) | None => base,
        Some(dot) => &base[..dot],
    };
    let mut slug = String::with_capacity(stem.len());
    for (i, ch) in stem.chars().enumerate() {
        if ch == '$' || ch == '_' || ch.is_alphanumeric() {
            if i == 0 && ch.is_ascii_digit() {
                slug.push('_');
            }
            slug.push(ch);
        } else {
            slug.push('_');
        }
    }
    if slug.is_empty() {
        slug.push_str("module");
    }
    slug
}

pub(crate) fn bind_module(
    source_index: u32,
    path: &str,
    stmts: Vec<Stmt>,
    import_records: Vec<ImportRecord>,
    hashbang: Option<String>,
    options: &ParseOptions,
    log: &mut Log,
) -> Module {
    let slug = path_slug(path);
    let mut binder = Binder {
        source_index,
        slug,
        log,
        symbols: Vec::new(),
        module_scope_map: FxHashMap::default(),
        module_scope_order: Vec::new(),
        scope_stack: Vec::new(),
        nested_declared: FxHashSet::default(),
        unbound: UnboundNames::default(),
        named_imports: FxHashMap::default(),
        named_exports: IndexMap::new(),
        export_stars: Vec::new(),
        import_records,
        exports_ref: SymbolRef::INVALID,
        module_ref: SymbolRef::INVALID,
        uses_exports_ref: false,
        uses_module_ref: false,
        has_es_module_syntax: false,
        part_uses: FxHashMap::default(),
        part_records: SmallVec::new(),
        part_declared: Vec::new(),
    };

    let exports_ref = binder.alloc("exports", SymbolKind::Other);
    let module_ref = binder.alloc("module", SymbolKind::Other);
    let wrapper_ref = binder.alloc(format!("require_{}", binder.slug), SymbolKind::Other);
    binder.exports_ref = exports_ref;
    binder.module_ref = module_ref;

    let mut stmts = stmts;
    for stmt in &mut stmts {
        binder.hoist_top_level(stmt);
    }

    let mut parts: Vec<Part> = Vec::with_capacity(stmts.len());
    for mut stmt in stmts {
        binder.part_uses = FxHashMap::default();
        binder.part_records = SmallVec::new();
        binder.part_declared = Vec::new();
        binder.bind_top_level(&mut stmt);

        let mut flags = PartFlags::empty();
        if stmt_can_be_removed_if_unused(&stmt) {
            flags |= PartFlags::CAN_BE_REMOVED_IF_UNUSED;
        }
        parts.push(Part {
            stmts: vec![stmt],
            declared_symbols: std::mem::take(&mut binder.part_declared),
            symbol_uses: std::mem::take(&mut binder.part_uses),
            import_records: std::mem::take(&mut binder.part_records),
            local_dependencies: Vec::new(),
            flags,
        });
    }

    binder.finalize(&mut parts, options);

    let uses_commonjs_features = binder.uses_exports_ref || binder.uses_module_ref;
    tracing::trace!(
        path,
        parts = parts.len(),
        imports = binder.named_imports.len(),
        exports = binder.named_exports.len(),
        commonjs = uses_commonjs_features,
        "bound module"
    );
    let mut nested_declared_names: Vec<String> = binder.nested_declared.into_iter().collect();
    nested_declared_names.sort_unstable();

    Module {
        source_index,
        parts,
        symbols: binder.symbols,
        module_scope: binder.module_scope_order,
        nested_declared_names,
        named_imports: binder.named_imports,
        named_exports: binder.named_exports,
        export_stars: binder.export_stars,
        import_records: binder.import_records,
        exports_ref,
        module_ref,
        wrapper_ref,
        uses_exports_ref: binder.uses_exports_ref,
        uses_module_ref: binder.uses_module_ref,
        uses_commonjs_features,
        has_es_module_syntax: binder.has_es_module_syntax,
        hashbang,
    }
}

struct Binder<'a> {
    source_index: u32,
    slug: String,
    log: &'a mut Log,
    symbols: Vec<Symbol>,
    module_scope_map: FxHashMap<String, SymbolRef>,
    module_scope_order: Vec<(String, SymbolRef)>,
    /// Nested scopes only; the module scope is handled separately.
    scope_stack: Vec<FxHashMap<String, SymbolRef>>,
    nested_declared: FxHashSet<String>,
    unbound: UnboundNames,
    named_imports: FxHashMap<SymbolRef, NamedImport>,
    named_exports: IndexMap<String, NamedExport>,
    export_stars: Vec<RecordIndex>,
    import_records: Vec<ImportRecord>,
    exports_ref: SymbolRef,
    module_ref: SymbolRef,
    uses_exports_ref: bool,
    uses_module_ref: bool,
    has_es_module_syntax: bool,
    part_uses: FxHashMap<SymbolRef, u32>,
    part_records: SmallVec<[RecordIndex; 2]>,
    part_declared: Vec<SymbolRef>,
}

impl Binder<'_> {
    fn alloc(&mut self, name: impl Into<String>, kind: SymbolKind) -> SymbolRef {
        let r = SymbolRef::new(
            self.source_index,
            u32::try_from(self.symbols.len()).unwrap_or(u32::MAX),
        );
        self.symbols.push(Symbol::new(name, kind));
        r
    }

    /// Declare a name in the module scope, reusing an existing binding for
    /// `var`/`function` redeclarations.
    fn declare_module(&mut self, ident: &mut Ident, kind: SymbolKind) -> SymbolRef {
        if let Some(&existing) = self.module_scope_map.get(&ident.name) {
            ident.symbol = existing;
            return existing;
        }
        let r = self.alloc(ident.name.clone(), kind);
        self.module_scope_map.insert(ident.name.clone(), r);
        self.module_scope_order.push((ident.name.clone(), r));
        ident.symbol = r;
        r
    }

    fn declare_nested(&mut self, ident: &mut Ident, kind: SymbolKind) -> SymbolRef {
        if ident.symbol.is_valid() {
            return ident.symbol;
        }
        if let Some(scope) = self.scope_stack.last() {
            if let Some(&existing) = scope.get(&ident.name) {
                ident.symbol = existing;
                return existing;
            }
        }
        let r = self.alloc(ident.name.clone(), kind);
        if let Some(scope) = self.scope_stack.last_mut() {
            scope.insert(ident.name.clone(), r);
        }
        self.nested_declared.insert(ident.name.clone());
        ident.symbol = r;
        r
    }

    fn resolve(&mut self, ident: &mut Ident) {
        let r = 'found: {
            for scope in self.scope_stack.iter().rev() {
                if let Some(&r) = scope.get(&ident.name) {
                    break 'found r;
                }
            }
            if let Some(&r) = self.module_scope_map.get(&ident.name) {
                break 'found r;
            }
            if ident.name == "exports" {
                self.uses_exports_ref = true;
                break 'found self.exports_ref;
            }
            if ident.name == "module" {
                self.uses_module_ref = true;
                break 'found self.module_ref;
            }
            self.unbound
                .intern(&ident.name, &mut self.symbols, self.source_index)
        };
        ident.symbol = r;
        self.count_use(r);
    }

    fn count_use(&mut self, r: SymbolRef) {
        *self.part_uses.entry(r).or_insert(0) += 1;
        if r.source == self.source_index {
            self.symbols[r.inner as usize].use_count_estimate += 1;
        }
    }

    fn namespace_ref_for_record(&mut self, record: RecordIndex) -> SymbolRef {
        let slug = path_slug(&self.import_records[record as usize].path);
        self.alloc(format!("import_{slug}"), SymbolKind::Other)
    }

    // ==================== Hoisting ====================

    fn hoist_top_level(&mut self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::Var(var) => {
                let kind = if var.decl_kind == VarDeclKind::Var {
                    SymbolKind::Hoisted
                } else {
                    SymbolKind::Other
                };
                for decl in &mut var.decls {
                    self.declare_module(&mut decl.name, kind);
                }
            }
            StmtKind::Func(func) => {
                self.declare_module(&mut func.name, SymbolKind::Hoisted);
            }
            StmtKind::Class(class) => {
                self.declare_module(&mut class.name, SymbolKind::Other);
            }
            StmtKind::Import(import) => {
                self.has_es_module_syntax = true;
                if let Some(default_name) = &mut import.default_name {
                    self.declare_module(default_name, SymbolKind::Other);
                }
                if let Some(star_name) = &mut import.star_name {
                    let r = self.declare_module(star_name, SymbolKind::Other);
                    import.namespace_ref = r;
                } else {
                    import.namespace_ref = self.namespace_ref_for_record(import.record);
                }
                for item in &mut import.items {
                    self.declare_module(&mut item.name, SymbolKind::Other);
                }
            }
            StmtKind::ExportDefault { default_ref, value } => {
                self.has_es_module_syntax = true;
                // A named `export default function f() {}` binds `f`, and
                // the default export is that very symbol. Anonymous values
                // get a synthetic slug-based symbol instead.
                let named = match value {
                    Expr::Function(func) => {
                        if let Some(name) = &mut func.name {
                            Some(self.declare_module(name, SymbolKind::Hoisted))
                        } else {
                            None
                        }
                    }
                    Expr::Class(class) => {
                        if let Some(name) = &mut class.name {
                            Some(self.declare_module(name, SymbolKind::Other))
                        } else {
                            None
                        }
                    }
                    _ => None,
                };
                default_ref.symbol = match named {
                    Some(r) => r,
                    None => {
                        let name = format!("{}_default", self.slug);
                        let r = self.alloc(name.clone(), SymbolKind::Other);
                        self.module_scope_order.push((name, r));
                        r
                    }
                };
            }
            StmtKind::ExportFrom { items, namespace_ref, record } => {
                self.has_es_module_syntax = true;
                *namespace_ref = self.namespace_ref_for_record(*record);
                for item in &mut items[..] {
                    // Re-export bindings are not referenceable locally.
                    let r = self.alloc(item.name.name.clone(), SymbolKind::Other);
                    item.name.symbol = r;
                }
            }
            StmtKind::ExportClause { .. } | StmtKind::ExportStar { .. } => {
                self.has_es_module_syntax = true;
            }
            _ => {}
        }
    }

    // ==================== Binding ====================

    fn bind_top_level(&mut self, stmt: &mut Stmt) {
        let part_declared: Vec<SymbolRef> = match &stmt.kind {
            StmtKind::Var(var) => var.decls.iter().map(|d| d.name.symbol).collect(),
            StmtKind::Func(func) => vec![func.name.symbol],
            StmtKind::Class(class) => vec![class.name.symbol],
            StmtKind::Import(import) => {
                let mut declared: Vec<SymbolRef> = Vec::new();
                if let Some(name) = &import.default_name {
                    declared.push(name.symbol);
                }
                if let Some(name) = &import.star_name {
                    declared.push(name.symbol);
                }
                declared.extend(import.items.iter().map(|i| i.name.symbol));
                declared
            }
            StmtKind::ExportDefault { default_ref, .. } => vec![default_ref.symbol],
            StmtKind::ExportFrom { items, .. } => items.iter().map(|i| i.name.symbol).collect(),
            _ => Vec::new(),
        };
        self.part_declared = part_declared;

        match &mut stmt.kind {
            StmtKind::Import(import) => {
                self.part_records.push(import.record);
                let record = import.record;
                let namespace_ref = import.namespace_ref;
                if let Some(name) = &import.default_name {
                    self.named_imports.insert(
                        name.symbol,
                        NamedImport {
                            alias: "default".to_string(),
                            alias_loc: name.loc,
                            namespace_ref,
                            record,
                            part_indices: SmallVec::new(),
                        },
                    );
                }
                if let Some(name) = &import.star_name {
                    self.named_imports.insert(
                        name.symbol,
                        NamedImport {
                            alias: "*".to_string(),
                            alias_loc: name.loc,
                            namespace_ref,
                            record,
                            part_indices: SmallVec::new(),
                        },
                    );
                }
                for item in &import.items {
                    self.named_imports.insert(
                        item.name.symbol,
                        NamedImport {
                            alias: item.alias.clone(),
                            alias_loc: item.alias_loc,
                            namespace_ref,
                            record,
                            part_indices: SmallVec::new(),
                        },
                    );
                }
            }
            StmtKind::ExportClause { items } => {
                for item in &mut items[..] {
                    // Resolve the local name; the alias becomes an export.
                    self.resolve(&mut item.name);
                    // The reference above was bookkeeping, not a code use.
                    if let Some(count) = self.part_uses.get_mut(&item.name.symbol) {
                        *count = count.saturating_sub(1);
                    }
                    self.named_exports.insert(
                        item.alias.clone(),
                        NamedExport {
                            symbol: item.name.symbol,
                            part_indices: SmallVec::new(),
                        },
                    );
                }
            }
            StmtKind::ExportFrom { items, record, namespace_ref } => {
                self.part_records.push(*record);
                for item in &items[..] {
                    self.named_imports.insert(
                        item.name.symbol,
                        NamedImport {
                            alias: item.name.name.clone(),
                            alias_loc: item.name.loc,
                            namespace_ref: *namespace_ref,
                            record: *record,
                            part_indices: SmallVec::new(),
                        },
                    );
                    self.named_exports.insert(
                        item.alias.clone(),
                        NamedExport {
                            symbol: item.name.symbol,
                            part_indices: SmallVec::new(),
                        },
                    );
                }
            }
            StmtKind::ExportStar { record } => {
                self.part_records.push(*record);
                self.export_stars.push(*record);
            }
            StmtKind::ExportDefault { default_ref, value } => {
                self.named_exports.insert(
                    "default".to_string(),
                    NamedExport {
                        symbol: default_ref.symbol,
                        part_indices: SmallVec::new(),
                    },
                );
                match value {
                    Expr::Function(func) => self.bind_function(func, true),
                    Expr::Class(class) => self.bind_class_expr(class, true),
                    other => self.bind_expr(other),
                }
            }
            StmtKind::Var(var) => {
                for decl in &mut var.decls {
                    if let Some(init) = &mut decl.init {
                        self.bind_expr(init);
                    }
                }
                if var.is_export {
                    for decl in &var.decls {
                        self.named_exports.insert(
                            decl.name.name.clone(),
                            NamedExport {
                                symbol: decl.name.symbol,
                                part_indices: SmallVec::new(),
                            },
                        );
                    }
                }
            }
            StmtKind::Func(func) => {
                let is_export = func.is_export;
                let name = func.name.clone();
                self.bind_func_body(&mut func.params, &mut func.body);
                if is_export {
                    self.named_exports.insert(
                        name.name.clone(),
                        NamedExport {
                            symbol: name.symbol,
                            part_indices: SmallVec::new(),
                        },
                    );
                }
            }
            StmtKind::Class(class) => {
                if let Some(extends) = &mut class.extends {
                    self.bind_expr(extends);
                }
                let mut members = std::mem::take(&mut class.members);
                for member in &mut members {
                    self.bind_class_member(member);
                }
                class.members = members;
                if class.is_export {
                    self.named_exports.insert(
                        class.name.name.clone(),
                        NamedExport {
                            symbol: class.name.symbol,
                            part_indices: SmallVec::new(),
                        },
                    );
                }
            }
            _ => self.bind_stmt(stmt),
        }
    }

    fn bind_stmt(&mut self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::Var(var) => {
                for decl in &mut var.decls {
                    self.declare_nested(&mut decl.name, SymbolKind::Other);
                    if let Some(init) = &mut decl.init {
                        self.bind_expr(init);
                    }
                }
            }
            StmtKind::Func(func) => {
                self.declare_nested(&mut func.name, SymbolKind::Hoisted);
                self.bind_func_body(&mut func.params, &mut func.body);
            }
            StmtKind::Class(class) => {
                self.declare_nested(&mut class.name, SymbolKind::Other);
                if let Some(extends) = &mut class.extends {
                    self.bind_expr(extends);
                }
                let mut members = std::mem::take(&mut class.members);
                for member in &mut members {
                    self.bind_class_member(member);
                }
                class.members = members;
            }
            StmtKind::Expr(expr) => self.bind_expr(expr),
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.bind_expr(value);
                }
            }
            StmtKind::Throw(value) => self.bind_expr(value),
            StmtKind::If { test, cons, alt } => {
                self.bind_expr(test);
                self.bind_stmt(cons);
                if let Some(alt) = alt {
                    self.bind_stmt(alt);
                }
            }
            StmtKind::While { test, body } => {
                self.bind_expr(test);
                self.bind_stmt(body);
            }
            StmtKind::For { init, test, update, body } => {
                self.scope_stack.push(FxHashMap::default());
                if let Some(init) = init {
                    self.bind_for_init(init);
                }
                if let Some(test) = test {
                    self.bind_expr(test);
                }
                if let Some(update) = update {
                    self.bind_expr(update);
                }
                self.bind_stmt(body);
                self.scope_stack.pop();
            }
            StmtKind::ForIn { decl, obj, body, .. } => {
                self.scope_stack.push(FxHashMap::default());
                self.bind_for_init(decl);
                self.bind_expr(obj);
                self.bind_stmt(body);
                self.scope_stack.pop();
            }
            StmtKind::Block(stmts) => {
                self.scope_stack.push(FxHashMap::default());
                self.hoist_nested(stmts);
                for stmt in &mut stmts[..] {
                    self.bind_stmt(stmt);
                }
                self.scope_stack.pop();
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {}
            // Imports and exports are only valid at the top level; the
            // parser rejects them elsewhere.
            StmtKind::Import(_)
            | StmtKind::ExportClause { .. }
            | StmtKind::ExportFrom { .. }
            | StmtKind::ExportStar { .. }
            | StmtKind::ExportDefault { .. } => {}
        }
    }

    fn bind_for_init(&mut self, init: &mut ForInit) {
        match init {
            ForInit::Var(var) => {
                for decl in &mut var.decls {
                    self.declare_nested(&mut decl.name, SymbolKind::Other);
                    if let Some(init) = &mut decl.init {
                        self.bind_expr(init);
                    }
                }
            }
            ForInit::Expr(expr) => self.bind_expr(expr),
        }
    }

    /// Pre-declare `function` and `var` bindings at this statement depth so
    /// uses before the declaration resolve within the same body.
    fn hoist_nested(&mut self, stmts: &mut [Stmt]) {
        for stmt in stmts {
            match &mut stmt.kind {
                StmtKind::Func(func) => {
                    self.declare_nested(&mut func.name, SymbolKind::Hoisted);
                }
                StmtKind::Var(var) if var.decl_kind == VarDeclKind::Var => {
                    for decl in &mut var.decls {
                        self.declare_nested(&mut decl.name, SymbolKind::Hoisted);
                    }
                }
                _ => {}
            }
        }
    }

    fn bind_func_body(&mut self, params: &mut [Param], body: &mut Vec<Stmt>) {
        self.scope_stack.push(FxHashMap::default());
        for param in &mut params[..] {
            self.declare_nested(&mut param.binding, SymbolKind::Other);
            if let Some(default) = &mut param.default {
                self.bind_expr(default);
            }
        }
        self.hoist_nested(body);
        for stmt in body {
            self.bind_stmt(stmt);
        }
        self.scope_stack.pop();
    }

    /// Bind a function expression. When `name_is_module_scope` is set (the
    /// `export default function f` case) the name was already declared by
    /// the hoist pass.
    fn bind_function(&mut self, func: &mut FnExpr, name_is_module_scope: bool) {
        self.scope_stack.push(FxHashMap::default());
        if let Some(name) = &mut func.name {
            if !name_is_module_scope {
                name.symbol = SymbolRef::INVALID;
                self.declare_nested(name, SymbolKind::Other);
            }
        }
        self.bind_func_body(&mut func.params, &mut func.body);
        self.scope_stack.pop();
    }

    fn bind_class_expr(&mut self, class: &mut ClassExpr, name_is_module_scope: bool) {
        self.scope_stack.push(FxHashMap::default());
        if let Some(name) = &mut class.name {
            if !name_is_module_scope {
                name.symbol = SymbolRef::INVALID;
                self.declare_nested(name, SymbolKind::Other);
            }
        }
        if let Some(extends) = &mut class.extends {
            self.bind_expr(extends);
        }
        for member in &mut class.members {
            self.bind_class_member(member);
        }
        self.scope_stack.pop();
    }

    fn bind_class_member(&mut self, member: &mut ClassMember) {
        if let PropKey::Computed(expr) = &mut member.key {
            self.bind_expr(expr);
        }
        match &mut member.kind {
            ClassMemberKind::Method { params, body } => self.bind_func_body(params, body),
            ClassMemberKind::Field { value } => {
                if let Some(value) = value {
                    self.bind_expr(value);
                }
            }
        }
    }

    fn bind_expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::Ident(ident) => self.resolve(ident),
            Expr::Require { record } | Expr::Dynamic { record } => {
                self.part_records.push(*record);
            }
            Expr::Str(_) | Expr::Num(_) | Expr::Bool(_) | Expr::Null | Expr::This | Expr::Missing => {}
            Expr::Template { parts, .. } => {
                for part in parts {
                    self.bind_expr(&mut part.expr);
                }
            }
            Expr::Array(items) => {
                for item in items {
                    self.bind_expr(item);
                }
            }
            Expr::Object(props) => {
                for prop in props {
                    if let PropKey::Computed(expr) = &mut prop.key {
                        self.bind_expr(expr);
                    }
                    match &mut prop.value {
                        PropValue::Expr(expr) => self.bind_expr(expr),
                        PropValue::Method { params, body } => self.bind_func_body(params, body),
                    }
                }
            }
            Expr::Spread(inner) => self.bind_expr(inner),
            Expr::Call { callee, args } | Expr::New { callee, args } => {
                self.bind_expr(callee);
                for arg in args {
                    self.bind_expr(arg);
                }
            }
            Expr::Member { obj, .. } => self.bind_expr(obj),
            Expr::Index { obj, index } => {
                self.bind_expr(obj);
                self.bind_expr(index);
            }
            Expr::Unary { arg, .. } | Expr::Postfix { arg, .. } => self.bind_expr(arg),
            Expr::Binary { left, right, .. } => {
                self.bind_expr(left);
                self.bind_expr(right);
            }
            Expr::Assign { target, value, .. } => {
                self.bind_expr(target);
                self.bind_expr(value);
            }
            Expr::Cond { test, cons, alt } => {
                self.bind_expr(test);
                self.bind_expr(cons);
                self.bind_expr(alt);
            }
            Expr::Arrow { params, body } => {
                self.scope_stack.push(FxHashMap::default());
                for param in &mut params[..] {
                    self.declare_nested(&mut param.binding, SymbolKind::Other);
                    if let Some(default) = &mut param.default {
                        self.bind_expr(default);
                    }
                }
                match body {
                    ArrowBody::Expr(expr) => self.bind_expr(expr),
                    ArrowBody::Block(stmts) => {
                        self.hoist_nested(stmts);
                        for stmt in stmts {
                            self.bind_stmt(stmt);
                        }
                    }
                }
                self.scope_stack.pop();
            }
            Expr::Function(func) => self.bind_function(func, false),
            Expr::Class(class) => self.bind_class_expr(class, false),
        }
    }

    // ==================== Finalization ====================

    fn finalize(&mut self, parts: &mut [Part], options: &ParseOptions) {
        // Map from declared symbol to declaring parts.
        let mut declared_in: FxHashMap<SymbolRef, SmallVec<[u32; 1]>> = FxHashMap::default();
        for (i, part) in parts.iter().enumerate() {
            let i = u32::try_from(i).unwrap_or(u32::MAX);
            for &sym in &part.declared_symbols {
                declared_in.entry(sym).or_default().push(i);
            }
        }

        for export in self.named_exports.values_mut() {
            if let Some(defining) = declared_in.get(&export.symbol) {
                export.part_indices = defining.clone();
            }
        }

        for (i, part) in parts.iter_mut().enumerate() {
            let i_u32 = u32::try_from(i).unwrap_or(u32::MAX);
            let mut local_deps: Vec<u32> = Vec::new();
            for &sym in part.symbol_uses.keys() {
                if let Some(defining) = declared_in.get(&sym) {
                    for &j in defining {
                        if j != i_u32 {
                            local_deps.push(j);
                        }
                    }
                }
                if let Some(import) = self.named_imports.get_mut(&sym) {
                    if !import.part_indices.contains(&i_u32) {
                        import.part_indices.push(i_u32);
                    }
                }
            }
            local_deps.sort_unstable();
            local_deps.dedup();
            part.local_dependencies = local_deps;
        }
        for import in self.named_imports.values_mut() {
            import.part_indices.sort_unstable();
        }

        // Script-type heuristic: without import/export syntax and outside a
        // bundle, top-level names must survive minification untouched.
        if !self.has_es_module_syntax && !options.is_bundling {
            for &(_, sym) in &self.module_scope_order {
                self.symbols[sym.inner as usize].kind = SymbolKind::Unbound;
            }
        }
    }
}

/// Whether dropping this statement when nothing references its bindings
/// changes observable behavior.
fn stmt_can_be_removed_if_unused(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Import(_)
        | StmtKind::ExportClause { .. }
        | StmtKind::ExportFrom { .. }
        | StmtKind::ExportStar { .. }
        | StmtKind::Func(_)
        | StmtKind::Empty => true,
        StmtKind::Class(class) => class
            .extends
            .as_deref()
            .is_none_or(expr_is_side_effect_free),
        StmtKind::Var(var) => var
            .decls
            .iter()
            .all(|d| d.init.as_ref().is_none_or(expr_is_side_effect_free)),
        StmtKind::ExportDefault { value, .. } => expr_is_side_effect_free(value),
        _ => false,
    }
}

fn expr_is_side_effect_free(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(_)
        | Expr::Str(_)
        | Expr::Num(_)
        | Expr::Bool(_)
        | Expr::Null
        | Expr::This
        | Expr::Arrow { .. }
        | Expr::Function(_) => true,
        Expr::Class(class) => class
            .extends
            .as_deref()
            .is_none_or(expr_is_side_effect_free),
        Expr::Template { parts, .. } => parts.iter().all(|p| expr_is_side_effect_free(&p.expr)),
        Expr::Array(items) => items.iter().all(expr_is_side_effect_free),
        Expr::Object(props) => props.iter().all(|p| {
            let key_ok = match &p.key {
                PropKey::Computed(expr) => expr_is_side_effect_free(expr),
                _ => true,
            };
            let value_ok = match &p.value {
                PropValue::Expr(expr) => expr_is_side_effect_free(expr),
                PropValue::Method { .. } => true,
            };
            key_ok && value_ok
        }),
        Expr::Spread(inner) => expr_is_side_effect_free(inner),
        Expr::Unary { op, arg } => *op != UnaryOp::Delete && expr_is_side_effect_free(arg),
        Expr::Binary { op, left, right } => {
            !matches!(op, BinOp::In | BinOp::Instanceof)
                && expr_is_side_effect_free(left)
                && expr_is_side_effect_free(right)
        }
        Expr::Cond { test, cons, alt } => {
            expr_is_side_effect_free(test)
                && expr_is_side_effect_free(cons)
                && expr_is_side_effect_free(alt)
        }
        _ => false,
    }
}
