use baler_scanner::{Scanner, TokenKind};

fn all_tokens(source: &str) -> Vec<TokenKind> {
    let mut scanner = Scanner::new(source.to_string());
    let mut tokens = Vec::new();
    loop {
        let kind = scanner.scan();
        if kind == TokenKind::EndOfFile {
            break;
        }
        tokens.push(kind);
    }
    tokens
}

#[test]
fn keywords_and_identifiers() {
    let mut scanner = Scanner::new("const answer = 42;".to_string());
    assert_eq!(scanner.scan(), TokenKind::Const);
    assert_eq!(scanner.scan(), TokenKind::Identifier);
    assert_eq!(scanner.token_value(), "answer");
    assert_eq!(scanner.scan(), TokenKind::Equals);
    assert_eq!(scanner.scan(), TokenKind::NumericLiteral);
    assert_eq!(scanner.token_value(), "42");
    assert_eq!(scanner.scan(), TokenKind::Semicolon);
    assert_eq!(scanner.scan(), TokenKind::EndOfFile);
}

#[test]
fn contextual_keywords_scan_as_identifiers() {
    let tokens = all_tokens("from as of");
    assert_eq!(
        tokens,
        vec![
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::Identifier
        ]
    );
}

#[test]
fn string_escapes_are_cooked() {
    let mut scanner = Scanner::new(r#"'a\nb\'c'"#.to_string());
    assert_eq!(scanner.scan(), TokenKind::StringLiteral);
    assert_eq!(scanner.token_value(), "a\nb'c");
}

#[test]
fn comments_are_trivia_and_track_newlines() {
    let mut scanner = Scanner::new("a // line\nb /* block */ c".to_string());
    assert_eq!(scanner.scan(), TokenKind::Identifier);
    assert_eq!(scanner.scan(), TokenKind::Identifier);
    assert!(scanner.has_newline_before());
    assert_eq!(scanner.token_value(), "b");
    assert_eq!(scanner.scan(), TokenKind::Identifier);
    assert!(!scanner.has_newline_before());
}

#[test]
fn template_with_substitution_produces_head_and_tail() {
    let mut scanner = Scanner::new("`a${x}b`".to_string());
    assert_eq!(scanner.scan(), TokenKind::TemplateHead);
    assert_eq!(scanner.token_value(), "a");
    assert_eq!(scanner.scan(), TokenKind::Identifier);
    assert_eq!(scanner.scan(), TokenKind::CloseBrace);
    assert_eq!(scanner.re_scan_template_token(), TokenKind::TemplateTail);
    assert_eq!(scanner.token_value(), "b");
    assert_eq!(scanner.scan(), TokenKind::EndOfFile);
}

#[test]
fn no_substitution_template() {
    let mut scanner = Scanner::new("`hello`".to_string());
    assert_eq!(scanner.scan(), TokenKind::NoSubstitutionTemplate);
    assert_eq!(scanner.token_value(), "hello");
}

#[test]
fn hashbang_is_captured_not_tokenized() {
    let mut scanner = Scanner::new("#!/usr/bin/env node\nlet x".to_string());
    assert_eq!(scanner.hashbang(), Some("#!/usr/bin/env node"));
    assert_eq!(scanner.scan(), TokenKind::Let);
    assert_eq!(scanner.scan(), TokenKind::Identifier);
}

#[test]
fn punctuation_maximal_munch() {
    let tokens = all_tokens("a >>>= b === c => d ?? e");
    assert_eq!(
        tokens,
        vec![
            TokenKind::Identifier,
            TokenKind::GreaterThanGreaterThanGreaterThanEquals,
            TokenKind::Identifier,
            TokenKind::EqualsEqualsEquals,
            TokenKind::Identifier,
            TokenKind::Arrow,
            TokenKind::Identifier,
            TokenKind::QuestionQuestion,
            TokenKind::Identifier,
        ]
    );
}

#[test]
fn numbers_keep_raw_text() {
    let mut scanner = Scanner::new("0x1F 1.5e3 .25".to_string());
    assert_eq!(scanner.scan(), TokenKind::NumericLiteral);
    assert_eq!(scanner.token_value(), "0x1F");
    assert_eq!(scanner.scan(), TokenKind::NumericLiteral);
    assert_eq!(scanner.token_value(), "1.5e3");
    assert_eq!(scanner.scan(), TokenKind::NumericLiteral);
    assert_eq!(scanner.token_value(), ".25");
}

#[test]
fn spans_cover_token_text() {
    let mut scanner = Scanner::new("let abc".to_string());
    scanner.scan();
    let span = scanner.token_span();
    assert_eq!((span.start, span.end), (0, 3));
    scanner.scan();
    let span = scanner.token_span();
    assert_eq!((span.start, span.end), (4, 7));
}
