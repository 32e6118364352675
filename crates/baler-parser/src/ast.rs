//! AST types for the JavaScript subset the bundler understands.
//!
//! Statements and expressions are tagged sums; the emitter's bundle
//! transforms rewrite them with plain `match`es. Source positions are byte
//! offsets into the file's contents.

use bitflags::bitflags;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use baler_common::Span;

use crate::symbols::{Symbol, SymbolRef};

/// Index into a module's `import_records`.
pub type RecordIndex = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import ... from "path"`, `export ... from "path"`
    Stmt,
    /// `require("path")`
    Require,
    /// `import("path")`
    Dynamic,
}

/// One import path found in a file. Resolution happens during scan; the
/// record itself only carries the specifier text and its location.
#[derive(Debug, Clone)]
pub struct ImportRecord {
    pub kind: ImportKind,
    pub path: String,
    pub span: Span,
}

/// An identifier occurrence. `symbol` is `SymbolRef::INVALID` until the bind
/// pass resolves the name.
#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub symbol: SymbolRef,
    pub loc: u32,
}

impl Ident {
    #[must_use]
    pub fn new(name: impl Into<String>, loc: u32) -> Self {
        Ident {
            name: name.into(),
            symbol: SymbolRef::INVALID,
            loc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Pos,
    Neg,
    Not,
    BitNot,
    Typeof,
    Void,
    Delete,
    PreInc,
    PreDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOp {
    Inc,
    Dec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Le,
    Ge,
    LooseEq,
    LooseNe,
    StrictEq,
    StrictNe,
    LogicalAnd,
    LogicalOr,
    Nullish,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    In,
    Instanceof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
}

#[derive(Debug, Clone)]
pub enum PropKey {
    Ident(String),
    Str(String),
    Num(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone)]
pub enum PropValue {
    /// `{ key: expr }` (or shorthand `{ key }` where the value is the ident)
    Expr(Expr),
    /// `{ key(params) { ... } }`
    Method { params: Vec<Param>, body: Vec<Stmt> },
}

#[derive(Debug, Clone)]
pub struct Prop {
    pub key: PropKey,
    pub value: PropValue,
    pub shorthand: bool,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub binding: Ident,
    pub default: Option<Expr>,
    pub is_rest: bool,
}

#[derive(Debug, Clone)]
pub enum ArrowBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone)]
pub struct FnExpr {
    pub name: Option<Ident>,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum ClassMemberKind {
    Method { params: Vec<Param>, body: Vec<Stmt> },
    Field { value: Option<Expr> },
}

#[derive(Debug, Clone)]
pub struct ClassMember {
    pub is_static: bool,
    pub key: PropKey,
    pub kind: ClassMemberKind,
}

#[derive(Debug, Clone)]
pub struct ClassExpr {
    pub name: Option<Ident>,
    pub extends: Option<Box<Expr>>,
    pub members: Vec<ClassMember>,
}

#[derive(Debug, Clone)]
pub struct TemplatePart {
    pub expr: Expr,
    /// The cooked text following the substitution.
    pub text: String,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Ident(Ident),
    Str(String),
    Num(String),
    Bool(bool),
    Null,
    This,
    Template {
        head: String,
        parts: Vec<TemplatePart>,
    },
    Array(Vec<Expr>),
    Object(Vec<Prop>),
    Spread(Box<Expr>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        obj: Box<Expr>,
        prop: String,
    },
    Index {
        obj: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        arg: Box<Expr>,
    },
    Postfix {
        op: PostfixOp,
        arg: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Cond {
        test: Box<Expr>,
        cons: Box<Expr>,
        alt: Box<Expr>,
    },
    Arrow {
        params: Vec<Param>,
        body: ArrowBody,
    },
    Function(Box<FnExpr>),
    Class(Box<ClassExpr>),
    /// `import("path")`
    Dynamic {
        record: RecordIndex,
    },
    /// `require("path")`
    Require {
        record: RecordIndex,
    },
    /// Parse-error placeholder.
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarDeclKind {
    Var,
    Let,
    Const,
}

impl VarDeclKind {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            VarDeclKind::Var => "var",
            VarDeclKind::Let => "let",
            VarDeclKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: Ident,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct VarStmt {
    pub decl_kind: VarDeclKind,
    pub decls: Vec<VarDecl>,
    pub is_export: bool,
}

#[derive(Debug, Clone)]
pub struct FuncStmt {
    pub name: Ident,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub is_export: bool,
}

#[derive(Debug, Clone)]
pub struct ClassStmt {
    pub name: Ident,
    pub extends: Option<Box<Expr>>,
    pub members: Vec<ClassMember>,
    pub is_export: bool,
}

/// `import { alias as name }` — `alias` is the export name in the target
/// module, `name` the local binding.
#[derive(Debug, Clone)]
pub struct ImportClauseItem {
    pub alias: String,
    pub alias_loc: u32,
    pub name: Ident,
}

#[derive(Debug, Clone)]
pub struct ImportStmt {
    pub record: RecordIndex,
    pub default_name: Option<Ident>,
    pub star_name: Option<Ident>,
    pub items: Vec<ImportClauseItem>,
    /// Symbol for the module's namespace object, synthesized per import
    /// statement. Equals the star binding's symbol for `import * as ns`.
    pub namespace_ref: SymbolRef,
}

/// `export { name as alias }` — `alias` is the exported name.
#[derive(Debug, Clone)]
pub struct ExportItem {
    pub alias: String,
    pub alias_loc: u32,
    pub name: Ident,
}

#[derive(Debug, Clone)]
pub enum ForInit {
    Var(VarStmt),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Import(ImportStmt),
    /// `export { a, b as c }`
    ExportClause { items: Vec<ExportItem> },
    /// `export { a, b as c } from "path"`
    ExportFrom {
        items: Vec<ExportItem>,
        record: RecordIndex,
        namespace_ref: SymbolRef,
    },
    /// `export * from "path"`
    ExportStar { record: RecordIndex },
    /// `export default <expr>` — function and class payloads arrive as
    /// `Expr::Function` / `Expr::Class` (named or anonymous).
    ExportDefault { default_ref: Ident, value: Expr },
    Var(VarStmt),
    Func(FuncStmt),
    Class(ClassStmt),
    Expr(Expr),
    Return(Option<Expr>),
    If {
        test: Expr,
        cons: Box<Stmt>,
        alt: Option<Box<Stmt>>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn {
        decl: Box<ForInit>,
        is_of: bool,
        obj: Expr,
        body: Box<Stmt>,
    },
    Block(Vec<Stmt>),
    Throw(Expr),
    Break,
    Continue,
    Empty,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub loc: u32,
    pub kind: StmtKind,
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct PartFlags: u8 {
        /// Tree-shaking may drop this part when nothing reaches it.
        const CAN_BE_REMOVED_IF_UNUSED = 1 << 0;
        /// Place ahead of normal parts during emission.
        const SHOULD_COME_FIRST = 1 << 1;
        /// Drop when unused even if global tree-shaking is off.
        const FORCE_TREE_SHAKING = 1 << 2;
    }
}

/// A minimal unit of statement-level code: the granularity of tree-shaking.
#[derive(Debug, Clone, Default)]
pub struct Part {
    pub stmts: Vec<Stmt>,
    /// Module-scope symbols this part declares.
    pub declared_symbols: Vec<SymbolRef>,
    /// Reference counts per symbol for statements in this part.
    pub symbol_uses: FxHashMap<SymbolRef, u32>,
    /// Import records referenced by statements in this part.
    pub import_records: SmallVec<[RecordIndex; 2]>,
    /// Indices of other parts in the same file this part depends on.
    pub local_dependencies: Vec<u32>,
    pub flags: PartFlags,
}

impl Part {
    #[must_use]
    pub fn can_be_removed_if_unused(&self) -> bool {
        self.flags.contains(PartFlags::CAN_BE_REMOVED_IF_UNUSED)
    }

    #[must_use]
    pub fn should_come_first(&self) -> bool {
        self.flags.contains(PartFlags::SHOULD_COME_FIRST)
    }

    #[must_use]
    pub fn force_tree_shaking(&self) -> bool {
        self.flags.contains(PartFlags::FORCE_TREE_SHAKING)
    }
}

#[derive(Debug, Clone)]
pub struct NamedImport {
    /// Export name in the target module; `"default"` for default imports and
    /// `"*"` for namespace imports.
    pub alias: String,
    pub alias_loc: u32,
    pub namespace_ref: SymbolRef,
    pub record: RecordIndex,
    /// Parts of this file that reference the import.
    pub part_indices: SmallVec<[u32; 1]>,
}

#[derive(Debug, Clone)]
pub struct NamedExport {
    pub symbol: SymbolRef,
    /// Parts of this file that define the exported symbol.
    pub part_indices: SmallVec<[u32; 1]>,
}

/// Everything the parser produces for one file.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub source_index: u32,
    pub parts: Vec<Part>,
    pub symbols: Vec<Symbol>,
    /// Module-scope declarations in declaration order.
    pub module_scope: Vec<(String, SymbolRef)>,
    /// Names declared in any nested scope, reserved during renaming.
    pub nested_declared_names: Vec<String>,
    pub named_imports: FxHashMap<SymbolRef, NamedImport>,
    pub named_exports: IndexMap<String, NamedExport>,
    /// Import records of `export * from` statements.
    pub export_stars: Vec<RecordIndex>,
    pub import_records: Vec<ImportRecord>,
    pub exports_ref: SymbolRef,
    pub module_ref: SymbolRef,
    /// Symbol the CommonJS closure wrapper is bound to.
    pub wrapper_ref: SymbolRef,
    pub uses_exports_ref: bool,
    pub uses_module_ref: bool,
    pub uses_commonjs_features: bool,
    pub has_es_module_syntax: bool,
    pub hashbang: Option<String>,
}
