//! Expression parsing: a precedence-climbing ladder over the scanner.

use baler_scanner::TokenKind;

use crate::ast::*;
use crate::parser::Parser;

/// Binding powers for binary operators.
fn binary_op(kind: TokenKind) -> Option<(BinOp, u8)> {
    Some(match kind {
        TokenKind::QuestionQuestion => (BinOp::Nullish, 4),
        TokenKind::BarBar => (BinOp::LogicalOr, 4),
        TokenKind::AmpersandAmpersand => (BinOp::LogicalAnd, 5),
        TokenKind::Bar => (BinOp::BitOr, 6),
        TokenKind::Caret => (BinOp::BitXor, 7),
        TokenKind::Ampersand => (BinOp::BitAnd, 8),
        TokenKind::EqualsEquals => (BinOp::LooseEq, 9),
        TokenKind::ExclamationEquals => (BinOp::LooseNe, 9),
        TokenKind::EqualsEqualsEquals => (BinOp::StrictEq, 9),
        TokenKind::ExclamationEqualsEquals => (BinOp::StrictNe, 9),
        TokenKind::LessThan => (BinOp::Lt, 10),
        TokenKind::GreaterThan => (BinOp::Gt, 10),
        TokenKind::LessThanEquals => (BinOp::Le, 10),
        TokenKind::GreaterThanEquals => (BinOp::Ge, 10),
        TokenKind::In => (BinOp::In, 10),
        TokenKind::Instanceof => (BinOp::Instanceof, 10),
        TokenKind::LessThanLessThan => (BinOp::Shl, 11),
        TokenKind::GreaterThanGreaterThan => (BinOp::Shr, 11),
        TokenKind::GreaterThanGreaterThanGreaterThan => (BinOp::UShr, 11),
        TokenKind::Plus => (BinOp::Add, 12),
        TokenKind::Minus => (BinOp::Sub, 12),
        TokenKind::Asterisk => (BinOp::Mul, 13),
        TokenKind::Slash => (BinOp::Div, 13),
        TokenKind::Percent => (BinOp::Mod, 13),
        _ => return None,
    })
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    Some(match kind {
        TokenKind::Equals => AssignOp::Assign,
        TokenKind::PlusEquals => AssignOp::Add,
        TokenKind::MinusEquals => AssignOp::Sub,
        TokenKind::AsteriskEquals => AssignOp::Mul,
        TokenKind::SlashEquals => AssignOp::Div,
        TokenKind::PercentEquals => AssignOp::Mod,
        TokenKind::LessThanLessThanEquals => AssignOp::Shl,
        TokenKind::GreaterThanGreaterThanEquals => AssignOp::Shr,
        TokenKind::GreaterThanGreaterThanGreaterThanEquals => AssignOp::UShr,
        TokenKind::AmpersandEquals => AssignOp::BitAnd,
        TokenKind::BarEquals => AssignOp::BitOr,
        TokenKind::CaretEquals => AssignOp::BitXor,
        _ => return None,
    })
}

impl Parser<'_> {
    /// Parse at assignment precedence (the usual entry point).
    pub(crate) fn parse_expr(&mut self) -> Expr {
        // `name => body` arrow shorthand
        if self.token.kind == TokenKind::Identifier && self.peek().kind == TokenKind::Arrow {
            let binding = self.expect_identifier("a parameter name");
            self.expect(TokenKind::Arrow, "\"=>\"");
            let params = vec![Param { binding, default: None, is_rest: false }];
            return self.parse_arrow_body(params);
        }

        let left = self.parse_cond_expr();
        if let Some(op) = assign_op(self.token.kind) {
            if !matches!(left, Expr::Ident(_) | Expr::Member { .. } | Expr::Index { .. }) {
                let span = self.token.span;
                self.error(span, "Invalid assignment target");
            }
            self.advance();
            let value = self.parse_expr();
            return Expr::Assign {
                op,
                target: Box::new(left),
                value: Box::new(value),
            };
        }
        left
    }

    fn parse_cond_expr(&mut self) -> Expr {
        let test = self.parse_binary_expr(0);
        if self.eat(TokenKind::Question) {
            let cons = self.parse_expr();
            self.expect(TokenKind::Colon, "\":\"");
            let alt = self.parse_expr();
            return Expr::Cond {
                test: Box::new(test),
                cons: Box::new(cons),
                alt: Box::new(alt),
            };
        }
        test
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> Expr {
        let mut left = self.parse_unary_expr();
        while let Some((op, prec)) = binary_op(self.token.kind) {
            if prec < min_prec {
                break;
            }
            if op == BinOp::In && !self.allow_in {
                break;
            }
            self.advance();
            let right = self.parse_binary_expr(prec + 1);
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn parse_unary_expr(&mut self) -> Expr {
        let op = match self.token.kind {
            TokenKind::Plus => UnaryOp::Pos,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Exclamation => UnaryOp::Not,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::Typeof => UnaryOp::Typeof,
            TokenKind::Void => UnaryOp::Void,
            TokenKind::Delete => UnaryOp::Delete,
            TokenKind::PlusPlus => UnaryOp::PreInc,
            TokenKind::MinusMinus => UnaryOp::PreDec,
            _ => return self.parse_postfix_expr(),
        };
        self.advance();
        let arg = self.parse_unary_expr();
        Expr::Unary { op, arg: Box::new(arg) }
    }

    fn parse_postfix_expr(&mut self) -> Expr {
        let expr = self.parse_lhs_expr();
        if !self.token.newline_before {
            if self.eat(TokenKind::PlusPlus) {
                return Expr::Postfix { op: PostfixOp::Inc, arg: Box::new(expr) };
            }
            if self.eat(TokenKind::MinusMinus) {
                return Expr::Postfix { op: PostfixOp::Dec, arg: Box::new(expr) };
            }
        }
        expr
    }

    /// Call / member chains over a primary expression.
    pub(crate) fn parse_lhs_expr(&mut self) -> Expr {
        let mut expr = self.parse_primary_expr();
        loop {
            match self.token.kind {
                TokenKind::Dot => {
                    self.advance();
                    match self.identifier_like() {
                        Some(name) => {
                            self.advance();
                            expr = Expr::Member { obj: Box::new(expr), prop: name };
                        }
                        None => {
                            let span = self.token.span;
                            self.error(span, "Expected a property name");
                            break;
                        }
                    }
                }
                TokenKind::OpenBracket => {
                    self.advance();
                    let index = self.parse_expr();
                    self.expect(TokenKind::CloseBracket, "\"]\"");
                    expr = Expr::Index { obj: Box::new(expr), index: Box::new(index) };
                }
                TokenKind::OpenParen => {
                    let args = self.parse_args();
                    expr = self.make_call(expr, args);
                }
                _ => break,
            }
        }
        expr
    }

    /// Builds a call, recognizing `require("path")` as an import record.
    fn make_call(&mut self, callee: Expr, args: Vec<Expr>) -> Expr {
        if let Expr::Ident(ident) = &callee {
            if ident.name == "require" && args.len() == 1 {
                if let Expr::Str(path) = &args[0] {
                    let span = baler_common::Span::at(ident.loc);
                    let record =
                        self.add_import_record(ImportKind::Require, path.clone(), span);
                    return Expr::Require { record };
                }
            }
        }
        Expr::Call { callee: Box::new(callee), args }
    }

    pub(crate) fn parse_args(&mut self) -> Vec<Expr> {
        self.expect(TokenKind::OpenParen, "\"(\"");
        let mut args = Vec::new();
        while self.token.kind != TokenKind::CloseParen && self.token.kind != TokenKind::EndOfFile {
            if self.eat(TokenKind::DotDotDot) {
                let arg = self.parse_expr();
                args.push(Expr::Spread(Box::new(arg)));
            } else {
                args.push(self.parse_expr());
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "\")\"");
        args
    }

    fn parse_primary_expr(&mut self) -> Expr {
        let loc = self.token.span.start;
        match self.token.kind {
            TokenKind::Identifier => {
                let name = self.token.value.clone();
                self.advance();
                Expr::Ident(Ident::new(name, loc))
            }
            TokenKind::StringLiteral => {
                let value = self.token.value.clone();
                self.advance();
                Expr::Str(value)
            }
            TokenKind::NumericLiteral => {
                let raw = self.token.value.clone();
                self.advance();
                Expr::Num(raw)
            }
            TokenKind::True => {
                self.advance();
                Expr::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                Expr::Bool(false)
            }
            TokenKind::Null => {
                self.advance();
                Expr::Null
            }
            TokenKind::This => {
                self.advance();
                Expr::This
            }
            TokenKind::NoSubstitutionTemplate => {
                let head = self.token.value.clone();
                self.advance();
                Expr::Template { head, parts: Vec::new() }
            }
            TokenKind::TemplateHead => self.parse_template(),
            TokenKind::OpenParen => self.parse_paren_or_arrow(),
            TokenKind::OpenBracket => {
                self.advance();
                let mut items = Vec::new();
                while self.token.kind != TokenKind::CloseBracket
                    && self.token.kind != TokenKind::EndOfFile
                {
                    if self.eat(TokenKind::DotDotDot) {
                        let item = self.parse_expr();
                        items.push(Expr::Spread(Box::new(item)));
                    } else {
                        items.push(self.parse_expr());
                    }
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::CloseBracket, "\"]\"");
                Expr::Array(items)
            }
            TokenKind::OpenBrace => self.parse_object_literal(),
            TokenKind::Function => {
                let func = self.parse_function_expr();
                Expr::Function(Box::new(func))
            }
            TokenKind::Class => {
                let class = self.parse_class_expr();
                Expr::Class(Box::new(class))
            }
            TokenKind::New => {
                self.advance();
                let callee = self.parse_primary_expr();
                // Allow member access on the constructee: `new a.b.C(...)`
                let callee = self.parse_member_suffix(callee);
                let args = if self.token.kind == TokenKind::OpenParen {
                    self.parse_args()
                } else {
                    Vec::new()
                };
                Expr::New { callee: Box::new(callee), args }
            }
            TokenKind::Import => {
                self.advance();
                if self.token.kind == TokenKind::OpenParen {
                    self.advance();
                    let expr = if self.token.kind == TokenKind::StringLiteral {
                        let path = self.token.value.clone();
                        let span = self.token.span;
                        self.advance();
                        let record = self.add_import_record(ImportKind::Dynamic, path, span);
                        Expr::Dynamic { record }
                    } else {
                        let span = self.token.span;
                        self.error(span, "Dynamic imports require a string literal path");
                        let _ = self.parse_expr();
                        Expr::Missing
                    };
                    self.expect(TokenKind::CloseParen, "\")\"");
                    expr
                } else {
                    let span = self.token.span;
                    self.error(span, "Unexpected \"import\"");
                    Expr::Missing
                }
            }
            _ => {
                let span = self.token.span;
                self.error(span, format!("Unexpected token {:?}", self.token.kind));
                Expr::Missing
            }
        }
    }

    fn parse_member_suffix(&mut self, mut expr: Expr) -> Expr {
        while self.token.kind == TokenKind::Dot {
            self.advance();
            match self.identifier_like() {
                Some(name) => {
                    self.advance();
                    expr = Expr::Member { obj: Box::new(expr), prop: name };
                }
                None => break,
            }
        }
        expr
    }

    fn parse_template(&mut self) -> Expr {
        let head = self.token.value.clone();
        self.advance(); // past the head, now at the first substitution
        let mut parts = Vec::new();
        loop {
            let expr = self.parse_expr();
            if self.token.kind != TokenKind::CloseBrace {
                let span = self.token.span;
                self.error(span, "Expected \"}\" in template literal");
                break;
            }
            debug_assert!(self.peeked.is_none(), "lookahead must be empty for rescan");
            let kind = self.scanner.re_scan_template_token();
            let text = self.scanner.token_value().to_string();
            parts.push(TemplatePart { expr, text });
            // Move past the template piece.
            self.advance();
            if kind == TokenKind::TemplateTail {
                break;
            }
        }
        Expr::Template { head, parts }
    }

    fn parse_object_literal(&mut self) -> Expr {
        self.advance(); // {
        let mut props = Vec::new();
        while self.token.kind != TokenKind::CloseBrace && self.token.kind != TokenKind::EndOfFile {
            if self.eat(TokenKind::DotDotDot) {
                let value = self.parse_expr();
                props.push(Prop {
                    key: PropKey::Ident(String::new()),
                    value: PropValue::Expr(Expr::Spread(Box::new(value))),
                    shorthand: true,
                });
            } else {
                let key_loc = self.token.span.start;
                let key = self.parse_prop_key();
                if self.token.kind == TokenKind::OpenParen {
                    let params = self.parse_params();
                    self.expect(TokenKind::OpenBrace, "\"{\"");
                    let body = self.parse_block_body();
                    props.push(Prop {
                        key,
                        value: PropValue::Method { params, body },
                        shorthand: false,
                    });
                } else if self.eat(TokenKind::Colon) {
                    let value = self.parse_expr();
                    props.push(Prop { key, value: PropValue::Expr(value), shorthand: false });
                } else {
                    // Shorthand `{ a }`
                    let name = match &key {
                        PropKey::Ident(name) => name.clone(),
                        _ => {
                            let span = self.token.span;
                            self.error(span, "Expected \":\"");
                            String::new()
                        }
                    };
                    props.push(Prop {
                        key,
                        value: PropValue::Expr(Expr::Ident(Ident::new(name, key_loc))),
                        shorthand: true,
                    });
                }
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseBrace, "\"}\"");
        Expr::Object(props)
    }

    pub(crate) fn parse_prop_key(&mut self) -> PropKey {
        match self.token.kind {
            TokenKind::StringLiteral => {
                let value = self.token.value.clone();
                self.advance();
                PropKey::Str(value)
            }
            TokenKind::NumericLiteral => {
                let raw = self.token.value.clone();
                self.advance();
                PropKey::Num(raw)
            }
            TokenKind::OpenBracket => {
                self.advance();
                let expr = self.parse_expr();
                self.expect(TokenKind::CloseBracket, "\"]\"");
                PropKey::Computed(Box::new(expr))
            }
            _ => match self.identifier_like() {
                Some(name) => {
                    self.advance();
                    PropKey::Ident(name)
                }
                None => {
                    let span = self.token.span;
                    self.error(span, "Expected a property name");
                    self.advance();
                    PropKey::Ident(String::new())
                }
            },
        }
    }

    pub(crate) fn parse_function_expr(&mut self) -> FnExpr {
        self.advance(); // function
        let name = if self.token.kind == TokenKind::Identifier {
            Some(self.expect_identifier("a function name"))
        } else {
            None
        };
        let params = self.parse_params();
        self.expect(TokenKind::OpenBrace, "\"{\"");
        let body = self.parse_block_body();
        FnExpr { name, params, body }
    }

    pub(crate) fn parse_class_expr(&mut self) -> ClassExpr {
        self.advance(); // class
        let name = if self.token.kind == TokenKind::Identifier {
            Some(self.expect_identifier("a class name"))
        } else {
            None
        };
        let extends = if self.eat(TokenKind::Extends) {
            Some(Box::new(self.parse_lhs_expr()))
        } else {
            None
        };
        let members = self.parse_class_body();
        ClassExpr { name, extends, members }
    }

    fn parse_paren_or_arrow(&mut self) -> Expr {
        self.advance(); // (

        // `() => body`
        if self.token.kind == TokenKind::CloseParen {
            self.advance();
            self.expect(TokenKind::Arrow, "\"=>\"");
            return self.parse_arrow_body(Vec::new());
        }

        let mut exprs = Vec::new();
        let mut saw_rest = false;
        while self.token.kind != TokenKind::CloseParen && self.token.kind != TokenKind::EndOfFile {
            if self.eat(TokenKind::DotDotDot) {
                saw_rest = true;
                let inner = self.parse_expr();
                exprs.push(Expr::Spread(Box::new(inner)));
            } else {
                exprs.push(self.parse_expr());
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "\")\"");

        if self.token.kind == TokenKind::Arrow {
            self.advance();
            let params = self.exprs_to_params(exprs);
            return self.parse_arrow_body(params);
        }

        if saw_rest || exprs.len() != 1 {
            let span = self.token.span;
            self.error(span, "Expected \"=>\"");
            return exprs.into_iter().next().unwrap_or(Expr::Missing);
        }
        exprs.into_iter().next().unwrap_or(Expr::Missing)
    }

    fn exprs_to_params(&mut self, exprs: Vec<Expr>) -> Vec<Param> {
        let mut params = Vec::new();
        for expr in exprs {
            match expr {
                Expr::Ident(binding) => params.push(Param {
                    binding,
                    default: None,
                    is_rest: false,
                }),
                Expr::Assign { op: AssignOp::Assign, target, value } => match *target {
                    Expr::Ident(binding) => params.push(Param {
                        binding,
                        default: Some(*value),
                        is_rest: false,
                    }),
                    _ => {
                        let span = self.token.span;
                        self.error(span, "Invalid parameter");
                    }
                },
                Expr::Spread(inner) => match *inner {
                    Expr::Ident(binding) => params.push(Param {
                        binding,
                        default: None,
                        is_rest: true,
                    }),
                    _ => {
                        let span = self.token.span;
                        self.error(span, "Invalid rest parameter");
                    }
                },
                _ => {
                    let span = self.token.span;
                    self.error(span, "Invalid parameter");
                }
            }
        }
        params
    }

    fn parse_arrow_body(&mut self, params: Vec<Param>) -> Expr {
        if self.token.kind == TokenKind::OpenBrace {
            self.advance();
            let body = self.parse_block_body();
            Expr::Arrow { params, body: ArrowBody::Block(body) }
        } else {
            let body = self.parse_expr();
            Expr::Arrow { params, body: ArrowBody::Expr(Box::new(body)) }
        }
    }

    /// Statement-list parsing used from expression contexts (function and
    /// method bodies).
    fn parse_block_body_pub(&mut self) -> Vec<Stmt> {
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
}
