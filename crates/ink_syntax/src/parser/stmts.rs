/// Statement-level parsing: the per-line dispatch and the declaration forms.
impl<'src> Parser<'src> {
    /// `*`/`+` choice branch. The marker count becomes the context level.
    fn parse_choice_stmt(&mut self, ctx: &mut StmtContext) -> Node {
        let t = self.token;
        ctx.level = self.match_many(t.kind, true);

        let expr = self.parse_choice_expr();
        let b_end = expr.span.end;
        if self.check(TokenKind::Newline) {
            self.advance();
        }

        let expr = Box::new(expr);
        let kind = if t.kind == TokenKind::Star {
            NodeKind::ChoiceStar { expr, body: None }
        } else {
            NodeKind::ChoicePlus { expr, body: None }
        };
        Node::new(kind, Span::new(t.span.start, b_end))
    }

    /// `-` gather point. Any content after the markers parses as its own
    /// statement on the same line.
    fn parse_gather_point(&mut self, ctx: &mut StmtContext) -> Node {
        let t = self.token;
        ctx.level = self.match_many(TokenKind::Minus, true);
        let b_end = self.token.span.start;
        self.match_token(TokenKind::Whitespace);
        self.match_token(TokenKind::Newline);
        Node::new(NodeKind::GatherPoint, Span::new(t.span.start, b_end))
    }

    /// `~` logic line: temp declaration, return, assignment, or expression.
    fn parse_tilde_stmt(&mut self) -> Option<Node> {
        self.push_mode_here(GrammarMode::Expression);
        self.advance();

        let n = match self.token.kind {
            TokenKind::KeywordTemp => self.parse_temp_decl(),
            TokenKind::KeywordReturn => Some(self.parse_return_stmt()),
            TokenKind::Identifier => self.parse_assign_stmt(),
            _ => self.parse_expr_stmt(None),
        };

        self.pop_mode();
        n
    }

    fn parse_temp_decl(&mut self) -> Option<Node> {
        let b_start = self.advance();
        let name = self.parse_expect_identifier()?;

        self.expect_token(TokenKind::Equal);
        let expr = self.parse_expect_expr()?;
        let end = self.expect_stmt_end();
        Some(Node::new(
            NodeKind::TempDecl {
                name: Box::new(name),
                expr: Box::new(expr),
            },
            Span::new(b_start, end),
        ))
    }

    fn parse_return_stmt(&mut self) -> Node {
        let t = self.token;
        self.advance();

        let expr = if !self.check(TokenKind::Newline) && !self.check(TokenKind::Eof) {
            self.parse_expr()
        } else {
            None
        };
        let end = self.expect_stmt_end();
        Node::new(
            NodeKind::ReturnStmt(expr.map(Box::new)),
            Span::new(t.span.start, end),
        )
    }

    fn parse_assign_stmt(&mut self) -> Option<Node> {
        let t = self.token;
        let lhs = self.parse_identifier_expr();

        if !self.match_token(TokenKind::Equal) {
            return self.parse_expr_stmt(lhs);
        }

        let lhs = lhs?;
        let rhs = self.parse_expect_expr()?;
        let end = self.expect_stmt_end();
        Some(Node::new(
            NodeKind::AssignStmt {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            Span::new(t.span.start, end),
        ))
    }

    fn parse_expr_stmt(&mut self, lhs: Option<Node>) -> Option<Node> {
        let b_start = lhs
            .as_ref()
            .map(|n| n.span.start)
            .unwrap_or(self.token.span.start);

        let Some(n) = self.parse_infix_expr(lhs, Prec::None) else {
            self.error_at(errors::expected_expr(self.token.span));
            return None;
        };
        let end = self.expect_stmt_end();
        Some(Node::new(
            NodeKind::ExprStmt(Box::new(n)),
            Span::new(b_start, end),
        ))
    }

    /// `VAR name = expr` / `CONST name = expr`.
    fn parse_var_decl(&mut self, is_const: bool) -> Option<Node> {
        let t = self.token;
        self.push_mode_here(GrammarMode::Expression);
        self.advance();

        let Some(name) = self.parse_expect_identifier() else {
            self.pop_mode();
            return None;
        };
        self.expect_token(TokenKind::Equal);
        let expr = self.parse_expect_expr();
        self.pop_mode();

        let expr = expr?;
        let end = self.expect_stmt_end();
        let name = Box::new(name);
        let expr = Box::new(expr);
        let kind = if is_const {
            NodeKind::ConstDecl { name, expr }
        } else {
            NodeKind::VarDecl { name, expr }
        };
        Some(Node::new(kind, Span::new(t.span.start, end)))
    }

    fn parse_parameter_decl(&mut self) -> Option<Node> {
        if self.check(TokenKind::KeywordRef) {
            self.advance();
            let n = self.parse_expect_identifier()?;
            return Some(Node::new(NodeKind::RefParamDecl, n.span));
        }
        let n = self.parse_expect_identifier()?;
        Some(Node::new(NodeKind::ParamDecl, n.span))
    }

    fn parse_parameter_list(&mut self) -> Node {
        let ctx = self.make_context(ContextKind::Block);
        let b_start = self.expect_token(TokenKind::LeftParen);

        if !self.check(TokenKind::RightParen) {
            loop {
                if self.scratch.len() - ctx.scratch_top == PARSER_ARGS_MAX {
                    self.error_at(errors::too_many_params(self.token.span));
                    break;
                }
                if let Some(n) = self.parse_parameter_decl() {
                    self.scratch.push(n);
                }
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_token(TokenKind::RightParen);

        let span = Span::new(b_start, self.token.span.start);
        let params = self.drain_scratch(ctx.scratch_top);
        Node::new(NodeKind::ParamList(params), span)
    }

    /// `== name ==`, `== function name(params) ==`, or `= name` headers.
    fn parse_knot_decl(&mut self) -> Option<Node> {
        #[derive(PartialEq)]
        enum Proto {
            Knot,
            Stitch,
            Func,
        }

        let b_start = self.advance();
        self.push_mode_here(GrammarMode::Expression);
        self.match_token(TokenKind::Whitespace);

        let mut proto = Proto::Stitch;
        if self.check(TokenKind::Equal) {
            proto = Proto::Knot;
            while self.check(TokenKind::Equal) {
                self.advance();
            }
        }
        if self.lexer.try_keyword(&mut self.token, TokenKind::KeywordFunction) {
            self.advance();
            proto = Proto::Func;
        }

        let Some(name) = self.parse_expect_identifier() else {
            self.pop_mode();
            return None;
        };
        let params = if self.check(TokenKind::LeftParen) {
            Some(Box::new(self.parse_parameter_list()))
        } else {
            None
        };
        while self.check(TokenKind::Equal) || self.check(TokenKind::EqualEqual) {
            self.advance();
        }

        self.pop_mode();
        let end = self.expect_stmt_end();
        let name = Box::new(name);
        let kind = match proto {
            Proto::Knot => NodeKind::KnotProto { name, params },
            Proto::Stitch => NodeKind::StitchProto { name, params },
            Proto::Func => NodeKind::FuncProto { name, params },
        };
        Some(Node::new(kind, Span::new(b_start, end)))
    }

    /// Parse one statement and run the block-structure handler for it.
    fn parse_stmt(&mut self, ctx: &mut StmtContext) -> Option<Node> {
        self.match_token(TokenKind::Whitespace);

        let n = match self.token.kind {
            TokenKind::Eof => None,
            TokenKind::Star | TokenKind::Plus => Some(self.parse_choice_stmt(ctx)),
            TokenKind::Minus => {
                if let ContextKind::Switch { has_expr } = ctx.kind {
                    // A `-` line in a conditional is first tried as an arm
                    // header. If that fails, the line is re-lexed from the
                    // marker as a gather point.
                    self.push_mode_here(GrammarMode::Expression);
                    self.advance();

                    let mut n = self.parse_conditional_branch(has_expr);
                    if n.is_none() {
                        let off = self.lexer.mode_offset();
                        self.lexer.rewind(off);
                        self.lexer.push_mode(GrammarMode::Content, off);
                        self.advance();
                        n = Some(self.parse_gather_point(ctx));
                        self.lexer.pop_mode();
                    }

                    self.pop_mode();
                    n
                } else {
                    Some(self.parse_gather_point(ctx))
                }
            }
            TokenKind::Tilde => self.parse_tilde_stmt(),
            TokenKind::RightArrow => self.parse_divert_stmt(),
            TokenKind::Equal | TokenKind::EqualEqual => {
                if matches!(ctx.kind, ContextKind::Block) {
                    self.parse_knot_decl()
                } else {
                    Some(self.parse_content_stmt())
                }
            }
            TokenKind::RightBrace => {
                self.error_at(errors::unexpected_token(self.token.span));
                self.advance();
                None
            }
            _ => {
                if self.lexer.try_keyword(&mut self.token, TokenKind::KeywordConst) {
                    self.parse_var_decl(true)
                } else if self.lexer.try_keyword(&mut self.token, TokenKind::KeywordVar) {
                    self.parse_var_decl(false)
                } else {
                    Some(self.parse_content_stmt())
                }
            }
        };

        if n.is_none() || self.panic_mode {
            self.synchronize();
            self.match_token(TokenKind::Newline);
            return None;
        }
        let mut n = n?;

        match &n.kind {
            NodeKind::IfBranch { .. } | NodeKind::ElseBranch { .. } | NodeKind::SwitchCase { .. } => {
                self.handle_conditional_branch(ctx);
            }
            NodeKind::ChoiceStar { .. } | NodeKind::ChoicePlus { .. } => {
                self.handle_choice_branch(ctx, &n);
            }
            NodeKind::GatherPoint => {
                n = self.handle_gather(ctx, n);
            }
            NodeKind::KnotProto { .. } => self.handle_knot(ctx),
            NodeKind::StitchProto { .. } | NodeKind::FuncProto { .. } => self.handle_stitch(ctx),
            _ => self.handle_content(ctx, &n),
        }
        Some(n)
    }
}

/// Parse a source buffer into a [`SourceFile`].
pub fn parse(source: &str) -> SourceFile {
    Parser::new(source).parse()
}
