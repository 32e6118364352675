//! The AST printer: one pass per source file, producing a code buffer and a
//! source-map mapping batch computed as if the file owned the whole map
//! (source index 0). Chunk assembly rebases the batch later.

use memchr::memchr_iter;

use baler_common::LineMap;
use baler_linker::Renamer;
use baler_parser::ast::*;
use baler_parser::symbols::{SymbolMap, SymbolRef};

#[derive(Debug, Clone, Default)]
pub struct PrintOptions {
    pub remove_whitespace: bool,
}

/// A mapping relative to this printed file, implicitly source index 0.
#[derive(Debug, Clone, Copy)]
pub struct RawMapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub original_line: u32,
    pub original_column: u32,
}

#[derive(Debug, Default)]
pub struct PrintResult {
    pub code: String,
    pub mappings: Vec<RawMapping>,
}

// Operator precedence levels used for parenthesization decisions.
const L_LOWEST: u8 = 0;
const L_ASSIGN: u8 = 2;
const L_COND: u8 = 3;
const L_OR: u8 = 4;
const L_AND: u8 = 5;
const L_BIT_OR: u8 = 6;
const L_BIT_XOR: u8 = 7;
const L_BIT_AND: u8 = 8;
const L_EQUALS: u8 = 9;
const L_COMPARE: u8 = 10;
const L_SHIFT: u8 = 11;
const L_ADD: u8 = 12;
const L_MULTIPLY: u8 = 13;
const L_PREFIX: u8 = 14;
const L_POSTFIX: u8 = 15;
const L_NEW: u8 = 16;
const L_CALL: u8 = 17;
const L_MEMBER: u8 = 18;
const L_PRIMARY: u8 = 20;

fn bin_op_info(op: BinOp) -> (&'static str, u8) {
    match op {
        BinOp::Add => ("+", L_ADD),
        BinOp::Sub => ("-", L_ADD),
        BinOp::Mul => ("*", L_MULTIPLY),
        BinOp::Div => ("/", L_MULTIPLY),
        BinOp::Mod => ("%", L_MULTIPLY),
        BinOp::Lt => ("<", L_COMPARE),
        BinOp::Gt => (">", L_COMPARE),
        BinOp::Le => ("<=", L_COMPARE),
        BinOp::Ge => (">=", L_COMPARE),
        BinOp::LooseEq => ("==", L_EQUALS),
        BinOp::LooseNe => ("!=", L_EQUALS),
        BinOp::StrictEq => ("===", L_EQUALS),
        BinOp::StrictNe => ("!==", L_EQUALS),
        BinOp::LogicalAnd => ("&&", L_AND),
        BinOp::LogicalOr => ("||", L_OR),
        BinOp::Nullish => ("??", L_OR),
        BinOp::BitAnd => ("&", L_BIT_AND),
        BinOp::BitOr => ("|", L_BIT_OR),
        BinOp::BitXor => ("^", L_BIT_XOR),
        BinOp::Shl => ("<<", L_SHIFT),
        BinOp::Shr => (">>", L_SHIFT),
        BinOp::UShr => (">>>", L_SHIFT),
        BinOp::In => ("in", L_COMPARE),
        BinOp::Instanceof => ("instanceof", L_COMPARE),
    }
}

fn assign_op_text(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => "=",
        AssignOp::Add => "+=",
        AssignOp::Sub => "-=",
        AssignOp::Mul => "*=",
        AssignOp::Div => "/=",
        AssignOp::Mod => "%=",
        AssignOp::Shl => "<<=",
        AssignOp::Shr => ">>=",
        AssignOp::UShr => ">>>=",
        AssignOp::BitAnd => "&=",
        AssignOp::BitOr => "|=",
        AssignOp::BitXor => "^=",
    }
}

/// Quote a cooked string value with double quotes.
#[must_use]
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

pub struct Printer<'a> {
    out: String,
    options: &'a PrintOptions,
    symbols: &'a SymbolMap,
    renamer: &'a Renamer,
    line_map: &'a LineMap,
    import_records: &'a [ImportRecord],
    mappings: Vec<RawMapping>,
    line: u32,
    column: u32,
    indent: usize,
}

/// Print a statement list for one source file.
pub fn print_stmts(
    stmts: &[Stmt],
    symbols: &SymbolMap,
    renamer: &Renamer,
    import_records: &[ImportRecord],
    line_map: &LineMap,
    options: &PrintOptions,
) -> PrintResult {
    let mut printer = Printer {
        out: String::new(),
        options,
        symbols,
        renamer,
        line_map,
        import_records,
        mappings: Vec::new(),
        line: 0,
        column: 0,
        indent: 0,
    };
    for stmt in stmts {
        printer.print_stmt(stmt);
    }
    PrintResult {
        code: printer.out,
        mappings: printer.mappings,
    }
}

impl Printer<'_> {
    fn p(&mut self, text: &str) {
        let newlines = memchr_iter(b'\n', text.as_bytes()).count();
        if newlines > 0 {
            self.line += u32::try_from(newlines).unwrap_or(0);
            let last = text.rfind('\n').unwrap_or(0);
            self.column = u32::try_from(text.len() - last - 1).unwrap_or(0);
        } else {
            self.column += u32::try_from(text.len()).unwrap_or(0);
        }
        self.out.push_str(text);
    }

    fn space(&mut self) {
        if !self.options.remove_whitespace {
            self.p(" ");
        }
    }

    fn newline(&mut self) {
        if !self.options.remove_whitespace {
            self.p("\n");
        }
    }

    fn print_indent(&mut self) {
        if !self.options.remove_whitespace {
            for _ in 0..self.indent {
                self.p("  ");
            }
        }
    }

    fn add_mapping(&mut self, loc: u32) {
        if loc == u32::MAX {
            return;
        }
        let original = self.line_map.location(loc);
        self.mappings.push(RawMapping {
            generated_line: self.line,
            generated_column: self.column,
            original_line: original.line,
            original_column: original.column,
        });
    }

    fn print_symbol(&mut self, ident: &Ident) {
        self.add_mapping(ident.loc);
        if !ident.symbol.is_valid() {
            let name = ident.name.clone();
            self.p(&name);
            return;
        }
        self.print_symbol_ref(ident.symbol);
    }

    fn print_symbol_ref(&mut self, r: SymbolRef) {
        let root = self.symbols.resolve(r);
        if let Some(alias) = self.symbols.get(root).namespace_alias.clone() {
            let ns = self
                .renamer
                .name_of(self.symbols, alias.namespace_ref)
                .to_string();
            self.p(&ns);
            self.p(".");
            self.p(&alias.alias);
            return;
        }
        let name = self.renamer.name_of(self.symbols, root).to_string();
        self.p(&name);
    }

    fn record_path(&self, record: RecordIndex) -> &str {
        &self.import_records[record as usize].path
    }

    // ==================== Statements ====================

    fn print_stmt(&mut self, stmt: &Stmt) {
        self.print_indent();
        self.add_mapping(stmt.loc);
        match &stmt.kind {
            StmtKind::Var(var) => {
                self.print_var_stmt(var);
                self.p(";");
                self.newline();
            }
            StmtKind::Func(func) => {
                if func.is_export {
                    self.p("export ");
                }
                self.p("function ");
                self.print_symbol(&func.name);
                self.print_params(&func.params);
                self.space();
                self.print_block(&func.body);
                self.newline();
            }
            StmtKind::Class(class) => {
                if class.is_export {
                    self.p("export ");
                }
                self.p("class ");
                self.print_symbol(&class.name);
                if let Some(extends) = &class.extends {
                    self.p(" extends ");
                    self.print_expr(extends, L_NEW);
                }
                self.space();
                self.print_class_body(&class.members);
                self.newline();
            }
            StmtKind::Expr(expr) => {
                // Leading `function`, `class`, `{` and `(` would reparse as
                // something else at statement position.
                let needs_parens = matches!(
                    expr,
                    Expr::Function(_) | Expr::Class(_) | Expr::Object(_)
                );
                if needs_parens {
                    self.p("(");
                }
                self.print_expr(expr, L_LOWEST);
                if needs_parens {
                    self.p(")");
                }
                self.p(";");
                self.newline();
            }
            StmtKind::Return(value) => {
                self.p("return");
                if let Some(value) = value {
                    self.p(" ");
                    self.print_expr(value, L_LOWEST);
                }
                self.p(";");
                self.newline();
            }
            StmtKind::Throw(value) => {
                self.p("throw ");
                self.print_expr(value, L_LOWEST);
                self.p(";");
                self.newline();
            }
            StmtKind::If { test, cons, alt } => {
                self.p("if");
                self.space();
                self.p("(");
                self.print_expr(test, L_LOWEST);
                self.p(")");
                self.space();
                self.print_nested_stmt(cons);
                if let Some(alt) = alt {
                    self.print_indent();
                    self.p("else");
                    self.space();
                    if self.options.remove_whitespace {
                        self.p(" ");
                    }
                    self.print_nested_stmt(alt);
                }
            }
            StmtKind::While { test, body } => {
                self.p("while");
                self.space();
                self.p("(");
                self.print_expr(test, L_LOWEST);
                self.p(")");
                self.space();
                self.print_nested_stmt(body);
            }
            StmtKind::For { init, test, update, body } => {
                self.p("for");
                self.space();
                self.p("(");
                if let Some(init) = init {
                    self.print_for_init(init);
                }
                self.p(";");
                if let Some(test) = test {
                    self.space();
                    self.print_expr(test, L_LOWEST);
                }
                self.p(";");
                if let Some(update) = update {
                    self.space();
                    self.print_expr(update, L_LOWEST);
                }
                self.p(")");
                self.space();
                self.print_nested_stmt(body);
            }
            StmtKind::ForIn { decl, is_of, obj, body } => {
                self.p("for");
                self.space();
                self.p("(");
                self.print_for_init(decl);
                self.p(if *is_of { " of " } else { " in " });
                self.print_expr(obj, L_LOWEST);
                self.p(")");
                self.space();
                self.print_nested_stmt(body);
            }
            StmtKind::Block(stmts) => {
                self.print_block(stmts);
                self.newline();
            }
            StmtKind::Break => {
                self.p("break;");
                self.newline();
            }
            StmtKind::Continue => {
                self.p("continue;");
                self.newline();
            }
            StmtKind::Empty => {
                self.p(";");
                self.newline();
            }
            StmtKind::Import(import) => self.print_import_stmt(import),
            StmtKind::ExportClause { items } => {
                self.p("export ");
                self.print_export_items(items);
                self.p(";");
                self.newline();
            }
            StmtKind::ExportFrom { items, record, .. } => {
                self.p("export ");
                self.print_export_items(items);
                self.p(" from ");
                let path = quote(self.record_path(*record));
                self.p(&path);
                self.p(";");
                self.newline();
            }
            StmtKind::ExportStar { record } => {
                self.p("export * from ");
                let path = quote(self.record_path(*record));
                self.p(&path);
                self.p(";");
                self.newline();
            }
            StmtKind::ExportDefault { value, .. } => {
                self.p("export default ");
                self.print_expr(value, L_ASSIGN);
                self.p(";");
                self.newline();
            }
        }
    }

    fn print_nested_stmt(&mut self, stmt: &Stmt) {
        if matches!(stmt.kind, StmtKind::Block(_)) {
            if let StmtKind::Block(stmts) = &stmt.kind {
                self.print_block(stmts);
                self.newline();
            }
        } else {
            self.newline();
            self.indent += 1;
            self.print_stmt(stmt);
            self.indent -= 1;
        }
    }

    fn print_var_stmt(&mut self, var: &VarStmt) {
        if var.is_export {
            self.p("export ");
        }
        self.p(var.decl_kind.keyword());
        self.p(" ");
        for (i, decl) in var.decls.iter().enumerate() {
            if i > 0 {
                self.p(",");
                self.space();
            }
            self.print_symbol(&decl.name);
            if let Some(init) = &decl.init {
                self.space();
                self.p("=");
                self.space();
                self.print_expr(init, L_ASSIGN);
            }
        }
    }

    fn print_for_init(&mut self, init: &ForInit) {
        match init {
            ForInit::Var(var) => self.print_var_stmt(var),
            ForInit::Expr(expr) => self.print_expr(expr, L_LOWEST),
        }
    }

    fn print_import_stmt(&mut self, import: &ImportStmt) {
        self.p("import ");
        let mut wrote_binding = false;
        if let Some(default_name) = &import.default_name {
            self.print_symbol(default_name);
            wrote_binding = true;
        }
        if let Some(star_name) = &import.star_name {
            if wrote_binding {
                self.p(",");
                self.space();
            }
            self.p("* as ");
            self.print_symbol(star_name);
            wrote_binding = true;
        }
        if !import.items.is_empty() {
            if wrote_binding {
                self.p(",");
                self.space();
            }
            self.p("{");
            self.space();
            for (i, item) in import.items.iter().enumerate() {
                if i > 0 {
                    self.p(",");
                    self.space();
                }
                if item.alias == item.name.name {
                    self.print_symbol(&item.name);
                } else {
                    self.p(&item.alias.clone());
                    self.p(" as ");
                    self.print_symbol(&item.name);
                }
            }
            self.space();
            self.p("}");
            wrote_binding = true;
        }
        if wrote_binding {
            self.p(" from ");
        }
        let path = quote(self.record_path(import.record));
        self.p(&path);
        self.p(";");
        self.newline();
    }

    fn print_export_items(&mut self, items: &[ExportItem]) {
        self.p("{");
        self.space();
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.p(",");
                self.space();
            }
            if item.alias == item.name.name {
                self.print_symbol(&item.name);
            } else {
                self.print_symbol(&item.name);
                self.p(" as ");
                self.p(&item.alias.clone());
            }
        }
        self.space();
        self.p("}");
    }

    fn print_block(&mut self, stmts: &[Stmt]) {
        self.p("{");
        if stmts.is_empty() {
            self.p("}");
            return;
        }
        self.newline();
        self.indent += 1;
        for stmt in stmts {
            self.print_stmt(stmt);
        }
        self.indent -= 1;
        self.print_indent();
        self.p("}");
    }

    fn print_params(&mut self, params: &[Param]) {
        self.p("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.p(",");
                self.space();
            }
            if param.is_rest {
                self.p("...");
            }
            self.print_symbol(&param.binding);
            if let Some(default) = &param.default {
                self.space();
                self.p("=");
                self.space();
                self.print_expr(default, L_ASSIGN);
            }
        }
        self.p(")");
    }

    fn print_class_body(&mut self, members: &[ClassMember]) {
        self.p("{");
        if members.is_empty() {
            self.p("}");
            return;
        }
        self.newline();
        self.indent += 1;
        for member in members {
            self.print_indent();
            if member.is_static {
                self.p("static ");
            }
            match &member.kind {
                ClassMemberKind::Method { params, body } => {
                    self.print_prop_key(&member.key);
                    self.print_params(params);
                    self.space();
                    self.print_block(body);
                    self.newline();
                }
                ClassMemberKind::Field { value } => {
                    self.print_prop_key(&member.key);
                    if let Some(value) = value {
                        self.space();
                        self.p("=");
                        self.space();
                        self.print_expr(value, L_ASSIGN);
                    }
                    self.p(";");
                    self.newline();
                }
            }
        }
        self.indent -= 1;
        self.print_indent();
        self.p("}");
    }

    fn print_prop_key(&mut self, key: &PropKey) {
        match key {
            PropKey::Ident(name) => self.p(&name.clone()),
            PropKey::Str(value) => {
                let quoted = quote(value);
                self.p(&quoted);
            }
            PropKey::Num(raw) => self.p(&raw.clone()),
            PropKey::Computed(expr) => {
                self.p("[");
                self.print_expr(expr, L_LOWEST);
                self.p("]");
            }
        }
    }

    // ==================== Expressions ====================

    fn expr_level(expr: &Expr) -> u8 {
        match expr {
            Expr::Ident(_)
            | Expr::Str(_)
            | Expr::Num(_)
            | Expr::Bool(_)
            | Expr::Null
            | Expr::This
            | Expr::Template { .. }
            | Expr::Array(_)
            | Expr::Object(_)
            | Expr::Missing => L_PRIMARY,
            Expr::Member { .. } | Expr::Index { .. } => L_MEMBER,
            Expr::Call { .. } | Expr::Dynamic { .. } | Expr::Require { .. } => L_CALL,
            Expr::New { .. } => L_NEW,
            Expr::Postfix { .. } => L_POSTFIX,
            Expr::Unary { .. } => L_PREFIX,
            Expr::Binary { op, .. } => bin_op_info(*op).1,
            Expr::Cond { .. } => L_COND,
            Expr::Assign { .. } | Expr::Arrow { .. } | Expr::Function(_) | Expr::Class(_) => {
                L_ASSIGN
            }
            Expr::Spread(_) => L_PRIMARY,
        }
    }

    fn print_expr(&mut self, expr: &Expr, parent_level: u8) {
        let level = Self::expr_level(expr);
        let needs_parens = level < parent_level;
        if needs_parens {
            self.p("(");
        }
        match expr {
            Expr::Ident(ident) => self.print_symbol(ident),
            Expr::Str(value) => {
                let quoted = quote(value);
                self.p(&quoted);
            }
            Expr::Num(raw) => self.p(&raw.clone()),
            Expr::Bool(value) => self.p(if *value { "true" } else { "false" }),
            Expr::Null => self.p("null"),
            Expr::This => self.p("this"),
            Expr::Missing => {}
            Expr::Template { head, parts } => {
                self.p("`");
                let text = escape_template(head);
                self.p(&text);
                for part in parts {
                    self.p("${");
                    self.print_expr(&part.expr, L_LOWEST);
                    self.p("}");
                    let text = escape_template(&part.text);
                    self.p(&text);
                }
                self.p("`");
            }
            Expr::Array(items) => {
                self.p("[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.p(",");
                        self.space();
                    }
                    self.print_expr(item, L_ASSIGN);
                }
                self.p("]");
            }
            Expr::Object(props) => {
                if props.is_empty() {
                    self.p("{}");
                } else {
                    self.p("{");
                    self.space();
                    for (i, prop) in props.iter().enumerate() {
                        if i > 0 {
                            self.p(",");
                            self.space();
                        }
                        self.print_prop(prop);
                    }
                    self.space();
                    self.p("}");
                }
            }
            Expr::Spread(inner) => {
                self.p("...");
                self.print_expr(inner, L_ASSIGN);
            }
            Expr::Call { callee, args } => {
                self.print_expr(callee, L_CALL);
                self.print_args(args);
            }
            Expr::New { callee, args } => {
                self.p("new ");
                self.print_expr(callee, L_MEMBER);
                self.print_args(args);
            }
            Expr::Member { obj, prop } => {
                self.print_expr(obj, L_MEMBER);
                self.p(".");
                self.p(&prop.clone());
            }
            Expr::Index { obj, index } => {
                self.print_expr(obj, L_MEMBER);
                self.p("[");
                self.print_expr(index, L_LOWEST);
                self.p("]");
            }
            Expr::Unary { op, arg } => {
                let (text, needs_space) = match op {
                    UnaryOp::Pos => ("+", false),
                    UnaryOp::Neg => ("-", false),
                    UnaryOp::Not => ("!", false),
                    UnaryOp::BitNot => ("~", false),
                    UnaryOp::Typeof => ("typeof", true),
                    UnaryOp::Void => ("void", true),
                    UnaryOp::Delete => ("delete", true),
                    UnaryOp::PreInc => ("++", false),
                    UnaryOp::PreDec => ("--", false),
                };
                self.p(text);
                if needs_space {
                    self.p(" ");
                }
                self.print_expr(arg, L_PREFIX);
            }
            Expr::Postfix { op, arg } => {
                self.print_expr(arg, L_POSTFIX);
                self.p(match op {
                    PostfixOp::Inc => "++",
                    PostfixOp::Dec => "--",
                });
            }
            Expr::Binary { op, left, right } => {
                let (text, level) = bin_op_info(*op);
                self.print_expr(left, level);
                if matches!(op, BinOp::In | BinOp::Instanceof) {
                    self.p(" ");
                    self.p(text);
                    self.p(" ");
                } else {
                    self.space();
                    self.p(text);
                    self.space();
                }
                self.print_expr(right, level + 1);
            }
            Expr::Assign { op, target, value } => {
                self.print_expr(target, L_POSTFIX);
                self.space();
                self.p(assign_op_text(*op));
                self.space();
                self.print_expr(value, L_ASSIGN);
            }
            Expr::Cond { test, cons, alt } => {
                self.print_expr(test, L_COND + 1);
                self.space();
                self.p("?");
                self.space();
                self.print_expr(cons, L_ASSIGN);
                self.space();
                self.p(":");
                self.space();
                self.print_expr(alt, L_ASSIGN);
            }
            Expr::Arrow { params, body } => {
                self.print_params(params);
                self.space();
                self.p("=>");
                self.space();
                match body {
                    ArrowBody::Expr(expr) => {
                        // An object body would parse as a block.
                        if matches!(**expr, Expr::Object(_)) {
                            self.p("(");
                            self.print_expr(expr, L_LOWEST);
                            self.p(")");
                        } else {
                            self.print_expr(expr, L_ASSIGN);
                        }
                    }
                    ArrowBody::Block(stmts) => self.print_block(stmts),
                }
            }
            Expr::Function(func) => {
                self.p("function");
                if let Some(name) = &func.name {
                    self.p(" ");
                    self.print_symbol(name);
                }
                self.print_params(&func.params);
                self.space();
                self.print_block(&func.body);
            }
            Expr::Class(class) => {
                self.p("class");
                if let Some(name) = &class.name {
                    self.p(" ");
                    self.print_symbol(name);
                }
                if let Some(extends) = &class.extends {
                    self.p(" extends ");
                    self.print_expr(extends, L_NEW);
                }
                self.space();
                self.print_class_body(&class.members);
            }
            Expr::Dynamic { record } => {
                self.p("import(");
                let path = quote(self.record_path(*record));
                self.p(&path);
                self.p(")");
            }
            Expr::Require { record } => {
                self.p("require(");
                let path = quote(self.record_path(*record));
                self.p(&path);
                self.p(")");
            }
        }
        if needs_parens {
            self.p(")");
        }
    }

    fn print_prop(&mut self, prop: &Prop) {
        match &prop.value {
            PropValue::Method { params, body } => {
                self.print_prop_key(&prop.key);
                self.print_params(params);
                self.space();
                self.print_block(body);
            }
            PropValue::Expr(expr) => {
                if prop.shorthand {
                    if let Expr::Spread(_) = expr {
                        self.print_expr(expr, L_LOWEST);
                        return;
                    }
                }
                self.print_prop_key(&prop.key);
                self.p(":");
                self.space();
                self.print_expr(expr, L_ASSIGN);
            }
        }
    }

    fn print_args(&mut self, args: &[Expr]) {
        self.p("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.p(",");
                self.space();
            }
            self.print_expr(arg, L_ASSIGN);
        }
        self.p(")");
    }
}

fn escape_template(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '`' => out.push_str("\\`"),
            '\\' => out.push_str("\\\\"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            other => out.push(other),
        }
    }
    out
}
