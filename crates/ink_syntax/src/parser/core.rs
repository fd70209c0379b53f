/// Parser core types and entrypoint.
///
/// This chunk defines the [`Parser`] type, the statement-context bookkeeping
/// shared by the block-collection machinery, and the public `parse()`
/// entrypoint.
const PARSER_ARGS_MAX: usize = 255;

/// Tokens that terminate a plain content run.
const CONTENT_SET: &[TokenKind] = &[
    TokenKind::LeftBrace,
    TokenKind::RightBrace,
    TokenKind::RightArrow,
    TokenKind::Glue,
    TokenKind::Newline,
    TokenKind::Eof,
];

/// Tokens that terminate the textual parts of a choice line.
const CHOICE_SET: &[TokenKind] = &[
    TokenKind::LeftBrace,
    TokenKind::LeftBracket,
    TokenKind::RightBrace,
    TokenKind::RightBracket,
    TokenKind::RightArrow,
    TokenKind::Newline,
    TokenKind::Eof,
];

/// Tokens that terminate a quoted string literal.
const STRING_SET: &[TokenKind] = &[TokenKind::DoubleQuote, TokenKind::Newline, TokenKind::Eof];

/// An open block or choice group awaiting collection.
#[derive(Debug, Clone, Copy)]
struct OpenFrame {
    level: usize,
    scratch_offset: usize,
    source_offset: usize,
}

/// What kind of statement list is being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextKind {
    Block,
    /// Inside a `{ ... }` conditional body. `has_expr` distinguishes switch
    /// arms from multi-if arms when a `-` line is seen.
    Switch { has_expr: bool },
}

/// Per-statement-list parsing context.
///
/// The `*_top` fields are floors into the parser's shared stacks: helpers
/// treat the stacks as empty below them, so nested lists cannot collect
/// their parents' pending state.
#[derive(Debug, Clone, Copy)]
struct StmtContext {
    kind: ContextKind,
    is_block_created: bool,
    level: usize,
    blocks_top: usize,
    choices_top: usize,
    scratch_top: usize,
}

/// Parser state.
///
/// ## Notes
/// - The parser is single-pass and recovers from errors by synchronizing at
///   newline/closing-delimiter boundaries.
/// - `knot_offset` marks where the current knot's statements begin on the
///   scratch stack; everything above it is folded into the knot when the
///   next knot header (or EOF) arrives.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    token: Token,
    errors: Vec<CompileError>,
    panic_mode: bool,
    scratch: Vec<Node>,
    open_blocks: Vec<OpenFrame>,
    open_choices: Vec<OpenFrame>,
    knot_offset: usize,
}

impl<'src> Parser<'src> {
    /// Create a new parser over a source buffer.
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            token: Token::new(TokenKind::Error, Span::default()),
            errors: Vec::new(),
            panic_mode: false,
            scratch: Vec::new(),
            open_blocks: Vec::new(),
            open_choices: Vec::new(),
            knot_offset: 0,
        }
    }

    fn make_context(&self, kind: ContextKind) -> StmtContext {
        StmtContext {
            kind,
            is_block_created: false,
            level: 0,
            blocks_top: self.open_blocks.len(),
            choices_top: self.open_choices.len(),
            scratch_top: self.scratch.len(),
        }
    }

    /// Parse the whole buffer into a [`SourceFile`].
    ///
    /// Parsing always yields a tree; recorded errors travel with it.
    pub fn parse(mut self) -> SourceFile {
        self.advance();

        let mut ctx = self.make_context(ContextKind::Block);
        while !self.check(TokenKind::Eof) {
            if let Some(n) = self.parse_stmt(&mut ctx) {
                self.scratch.push(n);
            }
        }
        if let Some(n) = self.collect_knot(&mut ctx) {
            self.scratch.push(n);
        }

        let span = Span::new(0, self.token.span.end);
        let items = self.drain_scratch(ctx.scratch_top);
        debug!(
            statements = items.len(),
            errors = self.errors.len(),
            "parsed source file"
        );
        SourceFile {
            root: Node::new(NodeKind::File(items), span),
            errors: self.errors,
        }
    }
}
