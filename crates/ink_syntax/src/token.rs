//! Token types for the Ink lexer.
//!
//! Ink has two lexical grammars, selected by the scanner's mode stack:
//! content mode (prose) and expression mode (logic). Keyword tokens are only
//! produced in expression mode; in content mode the same spelling lexes as a
//! plain [`TokenKind::Word`].

use crate::ast::Span;

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// Kind of token produced by the lexer.
///
/// ## Notes
/// - Tokens do not carry text. Lexeme bytes are recovered from the source via
///   the token's span, which is how content lines are reassembled verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Newline,
    Whitespace,

    // ========== Content and names ==========
    /// A run of word characters in content mode.
    Word,
    Identifier,
    Number,

    // ========== Keywords (expression mode only) ==========
    KeywordAnd,
    KeywordOr,
    KeywordNot,
    KeywordMod,
    KeywordRef,
    KeywordTemp,
    KeywordReturn,
    KeywordTrue,
    KeywordFalse,
    KeywordElse,
    KeywordFunction,
    KeywordVar,
    KeywordConst,
    KeywordList,

    // ========== Operators and punctuation ==========
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Question,
    Tilde,
    Colon,
    Comma,
    Dot,
    Pipe,
    DoubleQuote,
    RightArrow,
    LeftArrow,
    Glue,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,

    Error,
}

/// A token with its kind and source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Construct a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Resolve an identifier spelling to its keyword kind, if reserved.
///
/// `VAR`, `CONST`, and `LIST` are deliberately uppercase; Ink reserves them
/// only in that spelling.
pub fn keyword_kind(name: &str) -> Option<TokenKind> {
    let kind = match name {
        "and" => TokenKind::KeywordAnd,
        "or" => TokenKind::KeywordOr,
        "not" => TokenKind::KeywordNot,
        "mod" => TokenKind::KeywordMod,
        "ref" => TokenKind::KeywordRef,
        "temp" => TokenKind::KeywordTemp,
        "return" => TokenKind::KeywordReturn,
        "true" => TokenKind::KeywordTrue,
        "false" => TokenKind::KeywordFalse,
        "else" => TokenKind::KeywordElse,
        "function" => TokenKind::KeywordFunction,
        "VAR" => TokenKind::KeywordVar,
        "CONST" => TokenKind::KeywordConst,
        "LIST" => TokenKind::KeywordList,
        _ => return None,
    };
    Some(kind)
}
