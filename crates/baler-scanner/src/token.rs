//! Token kinds produced by the scanner.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    EndOfFile,

    Identifier,
    StringLiteral,
    NumericLiteral,
    /// A template literal without substitutions: `` `text` ``
    NoSubstitutionTemplate,
    /// `` `text${ ``
    TemplateHead,
    /// `}text${`
    TemplateMiddle,
    /// `` }text` ``
    TemplateTail,

    // Punctuation
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Semicolon,
    Comma,
    Dot,
    DotDotDot,
    Colon,
    Question,
    Arrow,

    Equals,
    PlusEquals,
    MinusEquals,
    AsteriskEquals,
    SlashEquals,
    PercentEquals,
    AmpersandEquals,
    BarEquals,
    CaretEquals,
    LessThanLessThanEquals,
    GreaterThanGreaterThanEquals,
    GreaterThanGreaterThanGreaterThanEquals,

    EqualsEquals,
    ExclamationEquals,
    EqualsEqualsEquals,
    ExclamationEqualsEquals,
    LessThan,
    GreaterThan,
    LessThanEquals,
    GreaterThanEquals,

    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,

    AmpersandAmpersand,
    BarBar,
    QuestionQuestion,
    Exclamation,
    Tilde,
    Ampersand,
    Bar,
    Caret,
    LessThanLessThan,
    GreaterThanGreaterThan,
    GreaterThanGreaterThanGreaterThan,

    // Keywords
    Break,
    Class,
    Const,
    Continue,
    Default,
    Delete,
    Else,
    Export,
    Extends,
    False,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    Let,
    New,
    Null,
    Return,
    This,
    Throw,
    True,
    Typeof,
    Var,
    Void,
    While,
}

impl TokenKind {
    /// Keywords can still appear as property names after `.` and as object
    /// literal keys.
    #[must_use]
    pub fn is_keyword(self) -> bool {
        KEYWORDS.values().any(|&k| k == self)
    }
}

/// Reserved words. Contextual keywords (`from`, `as`, `of`, `static`) scan as
/// identifiers and are recognized by the parser where the grammar allows them.
pub static KEYWORDS: Lazy<FxHashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut map = FxHashMap::default();
    map.insert("break", TokenKind::Break);
    map.insert("class", TokenKind::Class);
    map.insert("const", TokenKind::Const);
    map.insert("continue", TokenKind::Continue);
    map.insert("default", TokenKind::Default);
    map.insert("delete", TokenKind::Delete);
    map.insert("else", TokenKind::Else);
    map.insert("export", TokenKind::Export);
    map.insert("extends", TokenKind::Extends);
    map.insert("false", TokenKind::False);
    map.insert("for", TokenKind::For);
    map.insert("function", TokenKind::Function);
    map.insert("if", TokenKind::If);
    map.insert("import", TokenKind::Import);
    map.insert("in", TokenKind::In);
    map.insert("instanceof", TokenKind::Instanceof);
    map.insert("let", TokenKind::Let);
    map.insert("new", TokenKind::New);
    map.insert("null", TokenKind::Null);
    map.insert("return", TokenKind::Return);
    map.insert("this", TokenKind::This);
    map.insert("throw", TokenKind::Throw);
    map.insert("true", TokenKind::True);
    map.insert("typeof", TokenKind::Typeof);
    map.insert("var", TokenKind::Var);
    map.insert("void", TokenKind::Void);
    map.insert("while", TokenKind::While);
    map
});
