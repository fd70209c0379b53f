/// Token-stream helpers and error recovery.
///
/// Low-level primitives used throughout parsing: advancing the scanner,
/// matching and expecting tokens, grammar-mode juggling, and panic-mode
/// synchronization.
impl<'src> Parser<'src> {
    // ========================================================================
    // Helpers
    // ========================================================================

    /// Record an error unless one is already pending for this panic region.
    fn error_at(&mut self, err: CompileError) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.errors.push(err);
    }

    /// Advance to the next token, skipping scan errors (each is recorded).
    ///
    /// Returns the start offset of the token we just moved past, which is
    /// how statement spans learn their end position.
    fn advance(&mut self) -> usize {
        let prev_start = self.token.span.start;
        loop {
            self.token = self.lexer.next_token();
            if self.token.kind == TokenKind::Error {
                self.error_at(errors::unexpected_token(self.token.span));
            } else {
                break;
            }
        }
        prev_start
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.token.kind == kind
    }

    /// Return true if the current token is EOF or appears in `set`.
    fn check_any(&self, set: &[TokenKind]) -> bool {
        if self.check(TokenKind::Eof) {
            return true;
        }
        set.contains(&self.token.kind)
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        false
    }

    /// Consume a run of `kind` tokens, returning how many were seen.
    /// Used to count choice/gather nesting markers.
    fn match_many(&mut self, kind: TokenKind, ignore_whitespace: bool) -> usize {
        let mut count = 0;
        while self.check(kind) {
            count += 1;
            self.advance();
            if ignore_whitespace {
                self.match_token(TokenKind::Whitespace);
            }
        }
        count
    }

    /// Expect a specific token, recording an error on mismatch.
    ///
    /// Returns the start offset of the expected token's position either way.
    fn expect_token(&mut self, kind: TokenKind) -> usize {
        let mut start = self.token.span.start;
        if self.lexer.mode() == GrammarMode::Expression && self.check(TokenKind::Whitespace) {
            start = self.advance();
        }
        if !self.check(kind) {
            self.error_at(errors::unexpected_token(self.token.span));
            return start;
        }
        self.advance();
        start
    }

    /// Expect the end of a statement: a newline or EOF.
    fn expect_stmt_end(&mut self) -> usize {
        if !self.check(TokenKind::Eof) && !self.check(TokenKind::Newline) {
            self.error_at(errors::expected_newline(self.token.span));
            return self.token.span.start;
        }
        self.advance()
    }

    /// Skip ahead to a safe token after a parse error.
    fn synchronize(&mut self) {
        self.panic_mode = false;
        loop {
            match self.token.kind {
                TokenKind::Eof
                | TokenKind::Newline
                | TokenKind::RightBrace
                | TokenKind::RightParen => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Push a grammar mode anchored at the current token.
    fn push_mode_here(&mut self, mode: GrammarMode) {
        self.lexer.push_mode(mode, self.token.span.start);
    }

    fn pop_mode(&mut self) {
        self.lexer.pop_mode();
    }
}
