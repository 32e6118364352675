//! Recursive-descent parser for the JavaScript subset.
//!
//! Parsing is syntax-only: identifiers carry their names and
//! `SymbolRef::INVALID`; the bind pass resolves them afterwards. Parse errors
//! are logged and recovery continues so one run surfaces every diagnostic.

use baler_common::{Log, Span};
use baler_scanner::{Scanner, TokenKind};

use crate::ast::*;
use crate::bind;

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// When false, files without import/export syntax are treated as scripts
    /// and their top-level symbols are pinned so they survive minification.
    pub is_bundling: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { is_bundling: true }
    }
}

/// Parse and bind one file.
pub fn parse_module(
    source_index: u32,
    path: &str,
    contents: &str,
    options: &ParseOptions,
    log: &mut Log,
) -> Module {
    let mut parser = Parser::new(path, contents, log);
    let stmts = parser.parse_program();
    let hashbang = parser.scanner.hashbang().map(str::to_string);
    let Parser {
        log,
        import_records,
        ..
    } = parser;
    bind::bind_module(
        source_index,
        path,
        stmts,
        import_records,
        hashbang,
        options,
        log,
    )
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
    pub newline_before: bool,
}

pub(crate) struct Parser<'a> {
    pub(crate) scanner: Scanner,
    pub(crate) token: Token,
    pub(crate) peeked: Option<Token>,
    pub(crate) log: &'a mut Log,
    pub(crate) path: String,
    pub(crate) import_records: Vec<ImportRecord>,
    /// `in` parses as a binary operator except in a `for` head.
    pub(crate) allow_in: bool,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(path: &str, contents: &str, log: &'a mut Log) -> Self {
        let mut scanner = Scanner::new(contents.to_string());
        let kind = scanner.scan();
        let token = Token {
            kind,
            value: scanner.token_value().to_string(),
            span: scanner.token_span(),
            newline_before: scanner.has_newline_before(),
        };
        Parser {
            scanner,
            token,
            peeked: None,
            log,
            path: path.to_string(),
            import_records: Vec::new(),
            allow_in: true,
        }
    }

    pub(crate) fn advance(&mut self) {
        if let Some(peeked) = self.peeked.take() {
            self.token = peeked;
            return;
        }
        let kind = self.scanner.scan();
        self.token = Token {
            kind,
            value: self.scanner.token_value().to_string(),
            span: self.scanner.token_span(),
            newline_before: self.scanner.has_newline_before(),
        };
    }

    pub(crate) fn peek(&mut self) -> &Token {
        if self.peeked.is_none() {
            let kind = self.scanner.scan();
            self.peeked = Some(Token {
                kind,
                value: self.scanner.token_value().to_string(),
                span: self.scanner.token_span(),
                newline_before: self.scanner.has_newline_before(),
            });
        }
        self.peeked.as_ref().expect("just filled")
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.token.kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) {
        if !self.eat(kind) {
            let span = self.token.span;
            self.error(span, format!("Expected {what}"));
        }
    }

    /// Accept an explicit `;`, or insert one before `}` / end-of-file / a
    /// line break.
    pub(crate) fn expect_semicolon(&mut self) {
        if self.eat(TokenKind::Semicolon) {
            return;
        }
        if self.token.kind == TokenKind::CloseBrace
            || self.token.kind == TokenKind::EndOfFile
            || self.token.newline_before
        {
            return;
        }
        let span = self.token.span;
        self.error(span, "Expected \";\"");
    }

    pub(crate) fn error(&mut self, span: Span, text: impl Into<String>) {
        let path = self.path.clone();
        self.log.add_error(path, Some(span), text);
    }

    /// The text of the current token when it can serve as an identifier-like
    /// name (identifiers and keywords).
    pub(crate) fn identifier_like(&self) -> Option<String> {
        match self.token.kind {
            TokenKind::Identifier => Some(self.token.value.clone()),
            kind if kind.is_keyword() => Some(self.token.value.clone()),
            _ => None,
        }
    }

    pub(crate) fn is_contextual(&self, word: &str) -> bool {
        self.token.kind == TokenKind::Identifier && self.token.value == word
    }

    pub(crate) fn expect_identifier(&mut self, what: &str) -> Ident {
        if self.token.kind == TokenKind::Identifier {
            let ident = Ident::new(self.token.value.clone(), self.token.span.start);
            self.advance();
            return ident;
        }
        let span = self.token.span;
        self.error(span, format!("Expected {what}"));
        Ident::new("", span.start)
    }

    pub(crate) fn add_import_record(&mut self, kind: ImportKind, path: String, span: Span) -> RecordIndex {
        let index = u32::try_from(self.import_records.len()).unwrap_or(u32::MAX);
        self.import_records.push(ImportRecord { kind, path, span });
        index
    }

    // ==================== Statements ====================

    pub(crate) fn parse_program(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while self.token.kind != TokenKind::EndOfFile {
            let before = (self.token.span.start, self.token.kind);
            stmts.push(self.parse_stmt());
            // Recovery: if a malformed statement consumed nothing, skip the
            // offending token so the loop always makes progress.
            if (self.token.span.start, self.token.kind) == before
                && self.token.kind != TokenKind::EndOfFile
            {
                self.advance();
            }
        }
        stmts
    }

    pub(crate) fn parse_stmt(&mut self) -> Stmt {
        let loc = self.token.span.start;
        match self.token.kind {
            TokenKind::Semicolon => {
                self.advance();
                Stmt { loc, kind: StmtKind::Empty }
            }
            TokenKind::OpenBrace => {
                self.advance();
                let stmts = self.parse_block_body();
                Stmt { loc, kind: StmtKind::Block(stmts) }
            }
            TokenKind::Import => {
                // `import(` is an expression.
                if self.peek().kind == TokenKind::OpenParen {
                    let expr = self.parse_expr();
                    self.expect_semicolon();
                    Stmt { loc, kind: StmtKind::Expr(expr) }
                } else {
                    self.parse_import_stmt(loc)
                }
            }
            TokenKind::Export => self.parse_export_stmt(loc),
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let stmt = self.parse_var_stmt(false);
                self.expect_semicolon();
                Stmt { loc, kind: StmtKind::Var(stmt) }
            }
            TokenKind::Function => {
                let stmt = self.parse_func_stmt(false);
                Stmt { loc, kind: StmtKind::Func(stmt) }
            }
            TokenKind::Class => {
                let stmt = self.parse_class_stmt(false);
                Stmt { loc, kind: StmtKind::Class(stmt) }
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.token.kind == TokenKind::Semicolon
                    || self.token.kind == TokenKind::CloseBrace
                    || self.token.kind == TokenKind::EndOfFile
                    || self.token.newline_before
                {
                    None
                } else {
                    Some(self.parse_expr())
                };
                self.expect_semicolon();
                Stmt { loc, kind: StmtKind::Return(value) }
            }
            TokenKind::Throw => {
                self.advance();
                let value = self.parse_expr();
                self.expect_semicolon();
                Stmt { loc, kind: StmtKind::Throw(value) }
            }
            TokenKind::Break => {
                self.advance();
                self.expect_semicolon();
                Stmt { loc, kind: StmtKind::Break }
            }
            TokenKind::Continue => {
                self.advance();
                self.expect_semicolon();
                Stmt { loc, kind: StmtKind::Continue }
            }
            TokenKind::If => self.parse_if_stmt(loc),
            TokenKind::While => {
                self.advance();
                self.expect(TokenKind::OpenParen, "\"(\"");
                let test = self.parse_expr();
                self.expect(TokenKind::CloseParen, "\")\"");
                let body = Box::new(self.parse_stmt());
                Stmt { loc, kind: StmtKind::While { test, body } }
            }
            TokenKind::For => self.parse_for_stmt(loc),
            _ => {
                let expr = self.parse_expr();
                self.expect_semicolon();
                Stmt { loc, kind: StmtKind::Expr(expr) }
            }
        }
    }

    pub(crate) fn parse_block_body(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while self.token.kind != TokenKind::CloseBrace && self.token.kind != TokenKind::EndOfFile {
            let before = (self.token.span.start, self.token.kind);
            stmts.push(self.parse_stmt());
            if (self.token.span.start, self.token.kind) == before
                && self.token.kind != TokenKind::CloseBrace
                && self.token.kind != TokenKind::EndOfFile
            {
                self.advance();
            }
        }
        self.expect(TokenKind::CloseBrace, "\"}\"");
        stmts
    }

    fn parse_if_stmt(&mut self, loc: u32) -> Stmt {
        self.advance();
        self.expect(TokenKind::OpenParen, "\"(\"");
        let test = self.parse_expr();
        self.expect(TokenKind::CloseParen, "\")\"");
        let cons = Box::new(self.parse_stmt());
        let alt = if self.eat(TokenKind::Else) {
            Some(Box::new(self.parse_stmt()))
        } else {
            None
        };
        Stmt { loc, kind: StmtKind::If { test, cons, alt } }
    }

    fn parse_for_stmt(&mut self, loc: u32) -> Stmt {
        self.advance();
        self.expect(TokenKind::OpenParen, "\"(\"");

        let init = if self.token.kind == TokenKind::Semicolon {
            None
        } else if matches!(
            self.token.kind,
            TokenKind::Var | TokenKind::Let | TokenKind::Const
        ) {
            Some(ForInit::Var(self.parse_var_stmt(false)))
        } else {
            self.allow_in = false;
            let expr = self.parse_expr();
            self.allow_in = true;
            Some(ForInit::Expr(expr))
        };

        // for-in / for-of heads
        if self.token.kind == TokenKind::In || self.is_contextual("of") {
            let is_of = self.token.kind != TokenKind::In;
            self.advance();
            let obj = self.parse_expr();
            self.expect(TokenKind::CloseParen, "\")\"");
            let body = Box::new(self.parse_stmt());
            let decl = match init {
                Some(init) => Box::new(init),
                None => {
                    self.error(Span::at(loc), "Expected a loop variable");
                    Box::new(ForInit::Expr(Expr::Missing))
                }
            };
            return Stmt {
                loc,
                kind: StmtKind::ForIn { decl, is_of, obj, body },
            };
        }

        self.expect(TokenKind::Semicolon, "\";\"");
        let test = if self.token.kind == TokenKind::Semicolon {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(TokenKind::Semicolon, "\";\"");
        let update = if self.token.kind == TokenKind::CloseParen {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(TokenKind::CloseParen, "\")\"");
        let body = Box::new(self.parse_stmt());
        Stmt { loc, kind: StmtKind::For { init, test, update, body } }
    }

    pub(crate) fn parse_var_stmt(&mut self, is_export: bool) -> VarStmt {
        let decl_kind = match self.token.kind {
            TokenKind::Var => VarDeclKind::Var,
            TokenKind::Let => VarDeclKind::Let,
            _ => VarDeclKind::Const,
        };
        self.advance();
        let mut decls = Vec::new();
        loop {
            let name = self.expect_identifier("a variable name");
            let init = if self.eat(TokenKind::Equals) {
                Some(self.parse_expr())
            } else {
                None
            };
            decls.push(VarDecl { name, init });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        VarStmt { decl_kind, decls, is_export }
    }

    pub(crate) fn parse_func_stmt(&mut self, is_export: bool) -> FuncStmt {
        self.advance(); // function
        let name = self.expect_identifier("a function name");
        let params = self.parse_params();
        self.expect(TokenKind::OpenBrace, "\"{\"");
        let body = self.parse_block_body();
        FuncStmt { name, params, body, is_export }
    }

    pub(crate) fn parse_class_stmt(&mut self, is_export: bool) -> ClassStmt {
        self.advance(); // class
        let name = self.expect_identifier("a class name");
        let extends = if self.eat(TokenKind::Extends) {
            Some(Box::new(self.parse_lhs_expr()))
        } else {
            None
        };
        let members = self.parse_class_body();
        ClassStmt { name, extends, members, is_export }
    }

    pub(crate) fn parse_params(&mut self) -> Vec<Param> {
        self.expect(TokenKind::OpenParen, "\"(\"");
        let mut params = Vec::new();
        while self.token.kind != TokenKind::CloseParen && self.token.kind != TokenKind::EndOfFile {
            let is_rest = self.eat(TokenKind::DotDotDot);
            let binding = self.expect_identifier("a parameter name");
            let default = if self.eat(TokenKind::Equals) {
                Some(self.parse_expr())
            } else {
                None
            };
            params.push(Param { binding, default, is_rest });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "\")\"");
        params
    }

    pub(crate) fn parse_class_body(&mut self) -> Vec<ClassMember> {
        self.expect(TokenKind::OpenBrace, "\"{\"");
        let mut members = Vec::new();
        while self.token.kind != TokenKind::CloseBrace && self.token.kind != TokenKind::EndOfFile {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            let is_static = self.is_contextual("static")
                && !matches!(self.peek().kind, TokenKind::OpenParen | TokenKind::Equals);
            if is_static {
                self.advance();
            }
            let key = self.parse_prop_key();
            if self.token.kind == TokenKind::OpenParen {
                let params = self.parse_params();
                self.expect(TokenKind::OpenBrace, "\"{\"");
                let body = self.parse_block_body();
                members.push(ClassMember {
                    is_static,
                    key,
                    kind: ClassMemberKind::Method { params, body },
                });
            } else {
                let value = if self.eat(TokenKind::Equals) {
                    Some(self.parse_expr())
                } else {
                    None
                };
                self.expect_semicolon();
                members.push(ClassMember {
                    is_static,
                    key,
                    kind: ClassMemberKind::Field { value },
                });
            }
        }
        self.expect(TokenKind::CloseBrace, "\"}\"");
        members
    }

    // ==================== Imports & exports ====================

    fn parse_path_suffix(&mut self) -> Option<(String, Span)> {
        if self.token.kind != TokenKind::StringLiteral {
            let span = self.token.span;
            self.error(span, "Expected a path string");
            return None;
        }
        let path = self.token.value.clone();
        let span = self.token.span;
        self.advance();
        Some((path, span))
    }

    fn parse_import_stmt(&mut self, loc: u32) -> Stmt {
        self.advance(); // import

        // `import "path"` (side effects only)
        if self.token.kind == TokenKind::StringLiteral {
            let path = self.token.value.clone();
            let span = self.token.span;
            self.advance();
            self.expect_semicolon();
            let record = self.add_import_record(ImportKind::Stmt, path, span);
            return Stmt {
                loc,
                kind: StmtKind::Import(ImportStmt {
                    record,
                    default_name: None,
                    star_name: None,
                    items: Vec::new(),
                    namespace_ref: crate::symbols::SymbolRef::INVALID,
                }),
            };
        }

        let mut default_name = None;
        let mut star_name = None;
        let mut items = Vec::new();

        if self.token.kind == TokenKind::Identifier {
            default_name = Some(self.expect_identifier("an import name"));
            if self.eat(TokenKind::Comma) {
                self.parse_import_bindings(&mut star_name, &mut items);
            }
        } else {
            self.parse_import_bindings(&mut star_name, &mut items);
        }

        if !self.is_contextual("from") {
            let span = self.token.span;
            self.error(span, "Expected \"from\"");
        } else {
            self.advance();
        }

        let (path, span) = self.parse_path_suffix().unwrap_or_default();
        self.expect_semicolon();
        let record = self.add_import_record(ImportKind::Stmt, path, span);
        Stmt {
            loc,
            kind: StmtKind::Import(ImportStmt {
                record,
                default_name,
                star_name,
                items,
                namespace_ref: crate::symbols::SymbolRef::INVALID,
            }),
        }
    }

    fn parse_import_bindings(
        &mut self,
        star_name: &mut Option<Ident>,
        items: &mut Vec<ImportClauseItem>,
    ) {
        if self.eat(TokenKind::Asterisk) {
            if self.is_contextual("as") {
                self.advance();
            } else {
                let span = self.token.span;
                self.error(span, "Expected \"as\"");
            }
            *star_name = Some(self.expect_identifier("a namespace name"));
            return;
        }
        self.expect(TokenKind::OpenBrace, "\"{\"");
        while self.token.kind != TokenKind::CloseBrace && self.token.kind != TokenKind::EndOfFile {
            let alias_loc = self.token.span.start;
            let alias = match self.identifier_like() {
                Some(name) => {
                    self.advance();
                    name
                }
                None => {
                    let span = self.token.span;
                    self.error(span, "Expected an import name");
                    break;
                }
            };
            let name = if self.is_contextual("as") {
                self.advance();
                self.expect_identifier("a binding name")
            } else {
                Ident::new(alias.clone(), alias_loc)
            };
            items.push(ImportClauseItem { alias, alias_loc, name });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseBrace, "\"}\"");
    }

    fn parse_export_stmt(&mut self, loc: u32) -> Stmt {
        self.advance(); // export

        match self.token.kind {
            TokenKind::Default => {
                self.advance();
                let default_loc = self.token.span.start;
                let value = match self.token.kind {
                    TokenKind::Function => {
                        let func = self.parse_function_expr();
                        Expr::Function(Box::new(func))
                    }
                    TokenKind::Class => {
                        let class = self.parse_class_expr();
                        Expr::Class(Box::new(class))
                    }
                    _ => {
                        let expr = self.parse_expr();
                        self.expect_semicolon();
                        expr
                    }
                };
                Stmt {
                    loc,
                    kind: StmtKind::ExportDefault {
                        default_ref: Ident::new("default", default_loc),
                        value,
                    },
                }
            }
            TokenKind::Asterisk => {
                self.advance();
                if self.is_contextual("as") {
                    let span = self.token.span;
                    self.error(span, "\"export * as\" is not supported");
                    self.advance();
                    let _ = self.expect_identifier("a namespace name");
                }
                if self.is_contextual("from") {
                    self.advance();
                } else {
                    let span = self.token.span;
                    self.error(span, "Expected \"from\"");
                }
                let (path, span) = self.parse_path_suffix().unwrap_or_default();
                self.expect_semicolon();
                let record = self.add_import_record(ImportKind::Stmt, path, span);
                Stmt { loc, kind: StmtKind::ExportStar { record } }
            }
            TokenKind::OpenBrace => {
                self.advance();
                let mut items = Vec::new();
                while self.token.kind != TokenKind::CloseBrace
                    && self.token.kind != TokenKind::EndOfFile
                {
                    let name_loc = self.token.span.start;
                    let name_text = match self.identifier_like() {
                        Some(name) => {
                            self.advance();
                            name
                        }
                        None => {
                            let span = self.token.span;
                            self.error(span, "Expected an export name");
                            break;
                        }
                    };
                    let (alias, alias_loc) = if self.is_contextual("as") {
                        self.advance();
                        let alias_loc = self.token.span.start;
                        match self.identifier_like() {
                            Some(name) => {
                                self.advance();
                                (name, alias_loc)
                            }
                            None => {
                                let span = self.token.span;
                                self.error(span, "Expected an export alias");
                                (name_text.clone(), name_loc)
                            }
                        }
                    } else {
                        (name_text.clone(), name_loc)
                    };
                    items.push(ExportItem {
                        alias,
                        alias_loc,
                        name: Ident::new(name_text, name_loc),
                    });
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::CloseBrace, "\"}\"");

                if self.is_contextual("from") {
                    self.advance();
                    let (path, span) = self.parse_path_suffix().unwrap_or_default();
                    self.expect_semicolon();
                    let record = self.add_import_record(ImportKind::Stmt, path, span);
                    Stmt {
                        loc,
                        kind: StmtKind::ExportFrom {
                            items,
                            record,
                            namespace_ref: crate::symbols::SymbolRef::INVALID,
                        },
                    }
                } else {
                    self.expect_semicolon();
                    Stmt { loc, kind: StmtKind::ExportClause { items } }
                }
            }
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let stmt = self.parse_var_stmt(true);
                self.expect_semicolon();
                Stmt { loc, kind: StmtKind::Var(stmt) }
            }
            TokenKind::Function => {
                let stmt = self.parse_func_stmt(true);
                Stmt { loc, kind: StmtKind::Func(stmt) }
            }
            TokenKind::Class => {
                let stmt = self.parse_class_stmt(true);
                Stmt { loc, kind: StmtKind::Class(stmt) }
            }
            _ => {
                let span = self.token.span;
                self.error(span, "Unexpected token after \"export\"");
                Stmt { loc, kind: StmtKind::Empty }
            }
        }
    }
}
