//! Streaming lexer for Ink source text.
//!
//! The lexer is a hand-rolled state machine driven by a stack of grammar
//! modes. Content mode treats prose as runs of [`TokenKind::Word`] and only
//! recognizes the punctuation that can start markup; expression mode lexes
//! identifiers, numbers, keywords, and the full operator set. The parser
//! pushes and pops modes as it crosses `{ ... }`, `~`, and declaration
//! headers, and may rewind the scanner to re-lex a line under a different
//! mode.
//!
//! ## Notes
//! - Tokens never allocate; they are `(kind, span)` pairs over the source.
//! - Consecutive newlines collapse into a single [`TokenKind::Newline`].
//! - Whitespace is skipped at line starts and everywhere in expression mode,
//!   but is a real token mid-line in content mode (words are reassembled from
//!   spans, so the parser needs to step over it explicitly).

use tracing::trace;

use crate::ast::Span;
use crate::token::{Token, TokenKind, keyword_kind};

/// Which grammar the scanner is currently lexing under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarMode {
    Content,
    Expression,
}

#[derive(Debug, Clone, Copy)]
struct ModeFrame {
    mode: GrammarMode,
    /// Source offset at which this mode was pushed, used for rewinding.
    source_offset: usize,
}

enum State {
    Start,
    Minus,
    Slash,
    Equal,
    Bang,
    LessThan,
    GreaterThan,
    Word,
    Identifier,
    Number,
    NumberDot,
    NumberDecimal,
    Whitespace,
    CommentLine,
    CommentBlock,
    CommentBlockStar,
    Newline,
}

/// The scanner over a single source buffer.
pub struct Lexer<'src> {
    source: &'src str,
    start: usize,
    cursor: usize,
    modes: Vec<ModeFrame>,
    is_line_start: bool,
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_word_char(c: u8) -> bool {
    is_alpha(c) || is_digit(c) || c == b'_'
}

/// Non-ASCII bytes all belong to prose words, so word spans never split a
/// UTF-8 sequence.
fn is_prose_char(c: u8) -> bool {
    is_word_char(c) || c >= 0x80
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            start: 0,
            cursor: 0,
            modes: vec![ModeFrame {
                mode: GrammarMode::Content,
                source_offset: 0,
            }],
            is_line_start: true,
        }
    }

    pub fn mode(&self) -> GrammarMode {
        self.modes[self.modes.len() - 1].mode
    }

    /// Source offset at which the current mode was entered.
    pub fn mode_offset(&self) -> usize {
        self.modes[self.modes.len() - 1].source_offset
    }

    pub fn push_mode(&mut self, mode: GrammarMode, source_offset: usize) {
        self.modes.push(ModeFrame {
            mode,
            source_offset,
        });
    }

    pub fn pop_mode(&mut self) {
        debug_assert!(self.modes.len() > 1);
        if self.modes.len() > 1 {
            self.modes.pop();
        }
    }

    /// Rewind to an earlier offset so the next token is lexed fresh,
    /// typically under a different mode.
    pub fn rewind(&mut self, source_offset: usize) {
        debug_assert!(source_offset <= self.cursor);
        self.start = source_offset;
        self.cursor = source_offset;
    }

    /// Re-read `token` as the requested keyword. Returns true and rewrites the
    /// token's kind on a match.
    ///
    /// `VAR`, `CONST`, and `function` are only reserved in certain positions,
    /// so the parser asks for them explicitly rather than the lexer always
    /// producing keyword tokens.
    pub fn try_keyword(&self, token: &mut Token, kind: TokenKind) -> bool {
        let text = token.span.text(self.source);
        if keyword_kind(text) == Some(kind) {
            token.kind = kind;
            return true;
        }
        false
    }

    fn byte(&self, at: usize) -> u8 {
        self.source.as_bytes().get(at).copied().unwrap_or(0)
    }

    /// Lex the next token under the current grammar mode.
    pub fn next_token(&mut self) -> Token {
        let mut state = State::Start;
        let mode = self.mode();
        let len = self.source.len();

        let kind = loop {
            let at_end = self.cursor >= len;
            let c = self.byte(self.cursor);

            match state {
                State::Start => {
                    self.start = self.cursor;
                    if at_end {
                        break TokenKind::Eof;
                    }
                    match c {
                        b'\n' => state = State::Newline,
                        b' ' | b'\t' => state = State::Whitespace,
                        b'~' => {
                            self.cursor += 1;
                            break TokenKind::Tilde;
                        }
                        b':' => {
                            self.cursor += 1;
                            break TokenKind::Colon;
                        }
                        b'!' => state = State::Bang,
                        b'"' => {
                            self.cursor += 1;
                            break TokenKind::DoubleQuote;
                        }
                        b'=' => state = State::Equal,
                        b'+' => {
                            self.cursor += 1;
                            break TokenKind::Plus;
                        }
                        b'-' => state = State::Minus,
                        b'*' => {
                            self.cursor += 1;
                            break TokenKind::Star;
                        }
                        b'/' => state = State::Slash,
                        b',' => {
                            self.cursor += 1;
                            break TokenKind::Comma;
                        }
                        b'%' => {
                            self.cursor += 1;
                            break TokenKind::Percent;
                        }
                        b'?' => {
                            self.cursor += 1;
                            break TokenKind::Question;
                        }
                        b'|' => {
                            self.cursor += 1;
                            break TokenKind::Pipe;
                        }
                        b'(' => {
                            self.cursor += 1;
                            break TokenKind::LeftParen;
                        }
                        b')' => {
                            self.cursor += 1;
                            break TokenKind::RightParen;
                        }
                        b'<' => state = State::LessThan,
                        b'>' => state = State::GreaterThan,
                        b'[' => {
                            self.cursor += 1;
                            break TokenKind::LeftBracket;
                        }
                        b']' => {
                            self.cursor += 1;
                            break TokenKind::RightBracket;
                        }
                        b'{' => {
                            self.cursor += 1;
                            break TokenKind::LeftBrace;
                        }
                        b'}' => {
                            self.cursor += 1;
                            break TokenKind::RightBrace;
                        }
                        b'.' if mode == GrammarMode::Expression => {
                            self.cursor += 1;
                            break TokenKind::Dot;
                        }
                        _ => {
                            if mode == GrammarMode::Expression {
                                if is_alpha(c) {
                                    state = State::Identifier;
                                } else if is_digit(c) {
                                    state = State::Number;
                                } else {
                                    // Step over the whole character so the
                                    // error span stays on a UTF-8 boundary.
                                    self.cursor += 1;
                                    while self.byte(self.cursor) & 0xC0 == 0x80 {
                                        self.cursor += 1;
                                    }
                                    break TokenKind::Error;
                                }
                            } else {
                                state = State::Word;
                            }
                        }
                    }
                    self.cursor += 1;
                }
                State::Minus => {
                    if c == b'>' {
                        self.cursor += 1;
                        break TokenKind::RightArrow;
                    }
                    break TokenKind::Minus;
                }
                State::Slash => match c {
                    b'/' => {
                        state = State::CommentLine;
                        self.cursor += 1;
                    }
                    b'*' => {
                        state = State::CommentBlock;
                        self.cursor += 1;
                    }
                    _ => break TokenKind::Slash,
                },
                State::Equal => {
                    if mode == GrammarMode::Expression && c == b'=' {
                        self.cursor += 1;
                        break TokenKind::EqualEqual;
                    }
                    break TokenKind::Equal;
                }
                State::Bang => {
                    if c == b'=' {
                        self.cursor += 1;
                        break TokenKind::BangEqual;
                    }
                    break TokenKind::Bang;
                }
                State::LessThan => match c {
                    b'=' => {
                        self.cursor += 1;
                        break TokenKind::LessEqual;
                    }
                    b'-' => {
                        self.cursor += 1;
                        break TokenKind::LeftArrow;
                    }
                    b'>' => {
                        self.cursor += 1;
                        break TokenKind::Glue;
                    }
                    _ => break TokenKind::LessThan,
                },
                State::GreaterThan => {
                    if c == b'=' {
                        self.cursor += 1;
                        break TokenKind::GreaterEqual;
                    }
                    break TokenKind::GreaterThan;
                }
                State::Word => {
                    if at_end || !is_prose_char(c) {
                        break TokenKind::Word;
                    }
                    self.cursor += 1;
                }
                State::Number => {
                    if c == b'.' {
                        state = State::NumberDot;
                        self.cursor += 1;
                    } else if is_alpha(c) || c == b'_' {
                        state = State::Identifier;
                        self.cursor += 1;
                    } else if !is_digit(c) {
                        break TokenKind::Number;
                    } else {
                        self.cursor += 1;
                    }
                }
                State::NumberDot => {
                    if !is_digit(c) {
                        break TokenKind::Error;
                    }
                    state = State::NumberDecimal;
                    self.cursor += 1;
                }
                State::NumberDecimal => {
                    if !is_digit(c) {
                        break TokenKind::Number;
                    }
                    self.cursor += 1;
                }
                State::Identifier => {
                    if at_end || !is_word_char(c) {
                        if mode == GrammarMode::Expression {
                            let text = &self.source[self.start..self.cursor];
                            break keyword_kind(text).unwrap_or(TokenKind::Identifier);
                        }
                        break TokenKind::Identifier;
                    }
                    self.cursor += 1;
                }
                State::Whitespace => match c {
                    b' ' | b'\t' => self.cursor += 1,
                    _ => {
                        if self.is_line_start || mode == GrammarMode::Expression {
                            state = State::Start;
                        } else {
                            break TokenKind::Whitespace;
                        }
                    }
                },
                State::CommentLine => {
                    if at_end {
                        state = State::Start;
                    } else if c == b'\n' {
                        state = State::Start;
                        self.is_line_start = true;
                        self.cursor += 1;
                    } else {
                        self.cursor += 1;
                    }
                }
                State::CommentBlock => {
                    if at_end {
                        break TokenKind::Error;
                    }
                    if c == b'*' {
                        state = State::CommentBlockStar;
                    }
                    self.cursor += 1;
                }
                State::CommentBlockStar => {
                    if at_end {
                        break TokenKind::Error;
                    }
                    state = if c == b'/' {
                        State::Start
                    } else {
                        State::CommentBlock
                    };
                    self.cursor += 1;
                }
                State::Newline => {
                    if c == b'\n' && !at_end {
                        self.cursor += 1;
                    } else if self.is_line_start {
                        self.is_line_start = false;
                        state = State::Start;
                    } else {
                        break TokenKind::Newline;
                    }
                }
            }
        };

        if self.is_line_start {
            self.is_line_start = false;
        }

        let token = Token::new(kind, Span::new(self.start, self.cursor));
        trace!(?kind, start = token.span.start, end = token.span.end, "lexed");
        token
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str, mode: GrammarMode) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(source);
        if mode == GrammarMode::Expression {
            lexer.push_mode(GrammarMode::Expression, 0);
        }
        let mut out = Vec::new();
        loop {
            let t = lexer.next_token();
            if t.kind == TokenKind::Eof {
                break;
            }
            out.push((t.kind, t.span.text(source).to_string()));
        }
        out
    }

    fn kinds(source: &str, mode: GrammarMode) -> Vec<TokenKind> {
        lex_all(source, mode).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn content_words_and_whitespace() {
        let toks = lex_all("Hello there\n", GrammarMode::Content);
        assert_eq!(
            toks,
            vec![
                (TokenKind::Word, "Hello".to_string()),
                (TokenKind::Whitespace, " ".to_string()),
                (TokenKind::Word, "there".to_string()),
                (TokenKind::Newline, "\n".to_string()),
            ]
        );
    }

    #[test]
    fn keywords_only_in_expression_mode() {
        assert_eq!(kinds("true", GrammarMode::Content), vec![TokenKind::Word]);
        assert_eq!(
            kinds("true", GrammarMode::Expression),
            vec![TokenKind::KeywordTrue]
        );
        assert_eq!(
            kinds("VAR", GrammarMode::Expression),
            vec![TokenKind::KeywordVar]
        );
        // Lowercase spelling is not reserved.
        assert_eq!(
            kinds("var", GrammarMode::Expression),
            vec![TokenKind::Identifier]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("3 1.25", GrammarMode::Expression),
            vec![TokenKind::Number, TokenKind::Number]
        );
        // A digit run flowing into word characters re-lexes as an identifier.
        assert_eq!(
            kinds("12abc", GrammarMode::Expression),
            vec![TokenKind::Identifier]
        );
        // A dot with no following digit is an error.
        assert_eq!(
            kinds("1.", GrammarMode::Expression),
            vec![TokenKind::Error]
        );
    }

    #[test]
    fn arrows_and_glue() {
        assert_eq!(
            kinds("-> <- <>", GrammarMode::Expression),
            vec![
                TokenKind::RightArrow,
                TokenKind::LeftArrow,
                TokenKind::Glue
            ]
        );
    }

    #[test]
    fn double_equal_is_expression_only() {
        assert_eq!(
            kinds("==", GrammarMode::Expression),
            vec![TokenKind::EqualEqual]
        );
        assert_eq!(
            kinds("==", GrammarMode::Content),
            vec![TokenKind::Equal, TokenKind::Equal]
        );
    }

    #[test]
    fn newlines_collapse() {
        assert_eq!(
            kinds("a\n\n\nb\n", GrammarMode::Content),
            vec![
                TokenKind::Word,
                TokenKind::Newline,
                TokenKind::Word,
                TokenKind::Newline
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("a // trailing\nb", GrammarMode::Content),
            vec![TokenKind::Word, TokenKind::Whitespace, TokenKind::Word]
        );
        assert_eq!(
            kinds("1 /* skip */ 2", GrammarMode::Expression),
            vec![TokenKind::Number, TokenKind::Number]
        );
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        assert_eq!(
            kinds("/* never closed", GrammarMode::Content),
            vec![TokenKind::Error]
        );
    }

    #[test]
    fn rewind_relexes_under_new_mode() {
        let source = "temp";
        let mut lexer = Lexer::new(source);
        let t = lexer.next_token();
        assert_eq!(t.kind, TokenKind::Word);

        lexer.rewind(0);
        lexer.push_mode(GrammarMode::Expression, 0);
        let t = lexer.next_token();
        assert_eq!(t.kind, TokenKind::KeywordTemp);
    }

    #[test]
    fn try_keyword_promotes_identifier() {
        let source = "function";
        let mut lexer = Lexer::new(source);
        lexer.push_mode(GrammarMode::Expression, 0);
        let mut t = lexer.next_token();
        // Recognized eagerly in expression mode, but the promotion API must
        // agree with the spelling either way.
        t.kind = TokenKind::Identifier;
        assert!(lexer.try_keyword(&mut t, TokenKind::KeywordFunction));
        assert_eq!(t.kind, TokenKind::KeywordFunction);
        assert!(!lexer.try_keyword(&mut t, TokenKind::KeywordVar));
    }

    #[test]
    fn leading_whitespace_skipped_at_line_start() {
        // The first line starts in line-start state, so indentation vanishes.
        let toks = lex_all("   hi", GrammarMode::Content);
        assert_eq!(toks[0], (TokenKind::Word, "hi".to_string()));
    }
}
