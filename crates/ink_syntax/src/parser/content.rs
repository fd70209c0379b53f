/// Content-line parsing: prose runs, inline `{ ... }` logic, conditionals,
/// and the textual parts of choice lines.
impl<'src> Parser<'src> {
    /// Consume raw tokens until one from `set` appears, yielding a text leaf
    /// covering everything consumed. Token kinds inside the run are
    /// irrelevant; the text is recovered from the covered span.
    fn parse_string(&mut self, set: &[TokenKind]) -> Node {
        let t = self.token;
        while !self.check_any(set) {
            self.advance();
        }
        let end = self.token.span.start;
        let kind = if t.span.start == end {
            NodeKind::EmptyText
        } else {
            NodeKind::Text
        };
        Node::new(kind, Span::new(t.span.start, end))
    }

    fn parse_glue(&mut self) -> Node {
        self.parse_atom(NodeKind::Glue)
    }

    /// One run of content items: text, inline logic, diverts, glue.
    fn parse_content(&mut self, set: &[TokenKind]) -> Node {
        let ctx = self.make_context(ContextKind::Block);
        let t = self.token;

        loop {
            if !self.check_any(set) {
                let n = self.parse_string(set);
                self.scratch.push(n);
                continue;
            }
            let n = match self.token.kind {
                TokenKind::LeftBrace => self.parse_lbrace_expr(),
                TokenKind::RightArrow => self.parse_divert_stmt(),
                TokenKind::Glue => Some(self.parse_glue()),
                _ => break,
            };
            if let Some(n) = n {
                self.scratch.push(n);
            }
        }

        let span = Span::new(t.span.start, self.token.span.start);
        if t.span.start == self.token.span.start {
            Node::new(NodeKind::EmptyText, span)
        } else {
            let items = self.drain_scratch(ctx.scratch_top);
            Node::new(NodeKind::Content(items), span)
        }
    }

    fn parse_content_stmt(&mut self) -> Node {
        let b_start = self.token.span.start;
        let n = self.parse_content(CONTENT_SET);
        let b_end = n.span.end;

        if self.check(TokenKind::Newline) {
            self.advance();
            // Trailing whitespace would otherwise read as empty content on
            // the next line.
            self.match_token(TokenKind::Whitespace);
        }
        Node::new(
            NodeKind::ContentStmt(Box::new(n)),
            Span::new(b_start, b_end),
        )
    }

    fn parse_divert_stmt(&mut self) -> Option<Node> {
        let b_start = self.token.span.start;
        self.push_mode_here(GrammarMode::Expression);
        let divert = self.parse_divert();
        self.pop_mode();
        let divert = divert?;
        let b_end = self.expect_stmt_end();
        Some(Node::new(
            NodeKind::DivertStmt(Box::new(divert)),
            Span::new(b_start, b_end),
        ))
    }

    /// `{ ... }`: inline logic, `{cond: content}`, or a block conditional.
    fn parse_lbrace_expr(&mut self) -> Option<Node> {
        let t = self.token;

        self.push_mode_here(GrammarMode::Expression);
        self.advance();

        let result = if !self.check(TokenKind::Newline) {
            let Some(lhs) = self.parse_expr() else {
                self.pop_mode();
                self.error_at(errors::invalid_expr(self.token.span));
                self.advance();
                return None;
            };
            if self.check(TokenKind::Colon) {
                self.push_mode_here(GrammarMode::Content);
                self.advance();

                let rhs = if self.check(TokenKind::Newline) {
                    self.advance();
                    self.parse_conditional(Some(lhs))
                } else {
                    let content = self.parse_content(CONTENT_SET);
                    let span = Span::new(t.span.start, self.token.span.start);
                    Node::new(
                        NodeKind::IfExpr {
                            cond: Box::new(lhs),
                            content: Box::new(content),
                        },
                        span,
                    )
                };

                self.pop_mode();
                self.expect_token(TokenKind::RightBrace);
                Some(rhs)
            } else {
                self.pop_mode();
                self.expect_token(TokenKind::RightBrace);
                let span = Span::new(t.span.start, self.token.span.start);
                return Some(Node::new(NodeKind::InlineLogic(Box::new(lhs)), span));
            }
        } else {
            self.advance();
            self.push_mode_here(GrammarMode::Content);
            let rhs = self.parse_conditional(None);
            self.expect_token(TokenKind::RightBrace);
            self.pop_mode();
            Some(rhs)
        };

        self.pop_mode();
        result
    }

    /// The arm list of a block conditional. Which conditional it is only
    /// becomes clear afterwards: literal-armed with a scrutinee is a switch,
    /// condition-armed without one is a multi-if, and arms that open with
    /// plain content make it an if/else.
    fn parse_conditional(&mut self, expr: Option<Node>) -> Node {
        let t = self.token;
        let mut ctx = self.make_context(ContextKind::Switch {
            has_expr: expr.is_some(),
        });

        while !self.check(TokenKind::Eof) && !self.check(TokenKind::RightBrace) {
            if let Some(n) = self.parse_stmt(&mut ctx) {
                self.scratch.push(n);
            }
        }
        if let Some(n) = self.collect_context(&mut ctx, 0, false) {
            self.scratch.push(n);
        }

        let arms = self.drain_scratch(ctx.scratch_top);
        let span = Span::new(t.span.start, self.token.span.start);
        let kind = match (expr, ctx.is_block_created) {
            (Some(cond), false) => NodeKind::SwitchStmt {
                cond: Box::new(cond),
                arms,
            },
            (None, false) => NodeKind::MultiIfStmt { arms },
            (cond, true) => NodeKind::IfStmt {
                cond: cond.map(Box::new),
                arms,
            },
        };
        Node::new(kind, span)
    }

    /// One `- value:` / `- cond:` / `- else:` arm header. Returns None when
    /// the line turns out not to be an arm (the caller re-lexes it as a
    /// gather point).
    fn parse_conditional_branch(&mut self, as_case: bool) -> Option<Node> {
        let t = self.token;
        let mut cond = None;

        let is_else = self.match_token(TokenKind::KeywordElse);
        if !is_else {
            cond = Some(self.parse_expr()?);
        }
        if !self.match_token(TokenKind::Colon) {
            return None;
        }
        if self.check(TokenKind::Newline) {
            self.advance();
        }

        let span = Span::new(t.span.start, self.token.span.start);
        let kind = if is_else {
            NodeKind::ElseBranch { body: None }
        } else if as_case {
            NodeKind::SwitchCase {
                value: Box::new(cond?),
                body: None,
            }
        } else {
            NodeKind::IfBranch {
                cond: Box::new(cond?),
                body: None,
            }
        };
        Some(Node::new(kind, span))
    }

    /// The textual parts of a choice line: `start [option] inner`.
    fn parse_choice_expr(&mut self) -> Node {
        let t = self.token;
        let start = self.parse_string(CHOICE_SET);
        let mut option = None;
        let mut inner = None;

        if self.check(TokenKind::LeftBracket) {
            self.advance();
            self.match_token(TokenKind::Whitespace);

            if !self.check(TokenKind::RightBracket) {
                option = non_empty(self.parse_string(CHOICE_SET));
            }
            self.expect_token(TokenKind::RightBracket);

            if !self.check_any(CHOICE_SET) {
                inner = non_empty(self.parse_string(CHOICE_SET));
            }
        }

        let span = Span::new(t.span.start, self.token.span.start);
        Node::new(
            NodeKind::ChoiceExpr {
                start: non_empty(start),
                option,
                inner,
            },
            span,
        )
    }
}

/// Discard empty text leaves; the positions in a choice expression encode
/// their role, so empties carry no information.
fn non_empty(n: Node) -> Option<Box<Node>> {
    match n.kind {
        NodeKind::EmptyText => None,
        _ => Some(Box::new(n)),
    }
}
