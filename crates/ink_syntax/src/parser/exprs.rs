/// Expression parsing.
///
/// A compact Pratt parser. Binding powers follow Ink's grammar: assignment
/// binds loosest, then `or`, `and`, comparisons, additive, multiplicative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    None = 0,
    Assign,
    LogicalOr,
    LogicalAnd,
    Comparison,
    Term,
    Factor,
}

fn binding_power(kind: TokenKind) -> Prec {
    match kind {
        TokenKind::KeywordAnd => Prec::LogicalAnd,
        TokenKind::KeywordOr => Prec::LogicalOr,
        TokenKind::EqualEqual
        | TokenKind::BangEqual
        | TokenKind::LessEqual
        | TokenKind::LessThan
        | TokenKind::GreaterEqual
        | TokenKind::GreaterThan
        | TokenKind::Question => Prec::Comparison,
        TokenKind::Plus | TokenKind::Minus => Prec::Term,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent | TokenKind::KeywordMod => {
            Prec::Factor
        }
        TokenKind::Equal => Prec::Assign,
        _ => Prec::None,
    }
}

fn infix_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::KeywordAnd => BinaryOp::And,
        TokenKind::KeywordOr => BinaryOp::Or,
        TokenKind::Percent | TokenKind::KeywordMod => BinaryOp::Mod,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Question => BinaryOp::Contains,
        TokenKind::EqualEqual => BinaryOp::Equal,
        TokenKind::BangEqual => BinaryOp::NotEqual,
        TokenKind::LessThan => BinaryOp::Less,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::GreaterThan => BinaryOp::Greater,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        _ => return None,
    };
    Some(op)
}

impl<'src> Parser<'src> {
    /// Build a leaf node from the current token, then advance.
    ///
    /// The node MUST be created before advancing, so trailing whitespace is
    /// never folded into the leaf's span.
    fn parse_atom(&mut self, kind: NodeKind) -> Node {
        let span = self.token.span;
        self.advance();
        Node::new(kind, span)
    }

    fn parse_expect_identifier(&mut self) -> Option<Node> {
        if !self.check(TokenKind::Identifier) {
            self.error_at(errors::expected_identifier(self.token.span));
            return None;
        }
        Some(self.parse_atom(NodeKind::Identifier))
    }

    fn parse_expect_expr(&mut self) -> Option<Node> {
        let t = self.token;
        let n = self.parse_expr();
        if n.is_none() {
            self.error_at(errors::expected_expr(t.span));
        }
        n
    }

    /// An identifier, optionally extended by `.name` selectors or a call.
    fn parse_identifier_expr(&mut self) -> Option<Node> {
        let mut lhs = self.parse_expect_identifier()?;
        loop {
            match self.token.kind {
                TokenKind::Dot => {
                    self.advance();
                    let rhs = self.parse_expect_identifier()?;
                    let span = Span::new(lhs.span.start, self.token.span.start);
                    lhs = Node::new(
                        NodeKind::SelectorExpr {
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        },
                        span,
                    );
                }
                TokenKind::LeftParen => {
                    let args = self.parse_arglist();
                    let span = Span::new(lhs.span.start, self.token.span.start);
                    return Some(Node::new(
                        NodeKind::CallExpr {
                            callee: Box::new(lhs),
                            args,
                        },
                        span,
                    ));
                }
                _ => return Some(lhs),
            }
        }
    }

    fn parse_arglist(&mut self) -> Vec<Node> {
        self.expect_token(TokenKind::LeftParen);

        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if args.len() == PARSER_ARGS_MAX {
                    self.error_at(errors::too_many_params(self.token.span));
                    break;
                }
                match self.parse_expr() {
                    Some(n) => args.push(n),
                    None => {
                        self.error_at(errors::expected_expr(self.token.span));
                        break;
                    }
                }
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_token(TokenKind::RightParen);
        args
    }

    /// `-> target` as an expression or statement payload.
    fn parse_divert(&mut self) -> Option<Node> {
        let b_start = self.token.span.start;
        self.advance();
        let target = self.parse_identifier_expr()?;
        let span = Span::new(b_start, self.token.span.start);
        Some(Node::new(NodeKind::Divert(Box::new(target)), span))
    }

    /// `"..."` string literal. The inner text is recovered from spans.
    fn parse_string_expr(&mut self) -> Option<Node> {
        let b_start = self.expect_token(TokenKind::DoubleQuote);
        let inner = self.parse_string(STRING_SET);
        if !self.check(TokenKind::DoubleQuote) {
            self.error_at(errors::expected_quote(self.token.span));
            return None;
        }
        self.advance();
        let span = Span::new(b_start, self.token.span.start);
        let inner = match inner.kind {
            NodeKind::EmptyText => None,
            _ => Some(Box::new(inner)),
        };
        Some(Node::new(NodeKind::StringExpr(inner), span))
    }

    fn parse_primary_expr(&mut self) -> Option<Node> {
        match self.token.kind {
            TokenKind::Number => Some(self.parse_atom(NodeKind::Number)),
            TokenKind::KeywordTrue => Some(self.parse_atom(NodeKind::True)),
            TokenKind::KeywordFalse => Some(self.parse_atom(NodeKind::False)),
            TokenKind::Identifier => self.parse_identifier_expr(),
            TokenKind::DoubleQuote => self.parse_string_expr(),
            TokenKind::LeftParen => {
                self.advance();
                let n = self.parse_infix_expr(None, Prec::None)?;
                self.match_token(TokenKind::RightParen);
                Some(n)
            }
            _ => None,
        }
    }

    fn parse_prefix_expr(&mut self) -> Option<Node> {
        let t = self.token;
        match t.kind {
            TokenKind::KeywordNot | TokenKind::Minus | TokenKind::Bang => {
                self.advance();
                let operand = self.parse_prefix_expr()?;
                let span = Span::new(t.span.start, operand.span.end);
                let op = if t.kind == TokenKind::Minus {
                    UnaryOp::Negate
                } else {
                    UnaryOp::Not
                };
                Some(Node::new(
                    NodeKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            TokenKind::RightArrow => self.parse_divert(),
            _ => self.parse_primary_expr(),
        }
    }

    fn parse_infix_expr(&mut self, lhs: Option<Node>, prec: Prec) -> Option<Node> {
        let mut lhs = match lhs {
            Some(n) => n,
            None => self.parse_prefix_expr()?,
        };
        loop {
            let t = self.token;
            let t_prec = binding_power(t.kind);
            if t_prec <= prec {
                break;
            }
            self.advance();

            let rhs = self.parse_infix_expr(None, t_prec)?;
            let span = Span::new(lhs.span.start, rhs.span.end);
            lhs = match infix_op(t.kind) {
                Some(op) => Node::new(
                    NodeKind::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    span,
                ),
                // The only infix token without a BinaryOp is `=`.
                None => Node::new(
                    NodeKind::AssignStmt {
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    span,
                ),
            };
        }
        Some(lhs)
    }

    fn parse_expr(&mut self) -> Option<Node> {
        self.parse_infix_expr(None, Prec::None)
    }
}
