/// Block and choice-group collection.
///
/// Finished statements accumulate on the scratch stack. Open blocks and open
/// choice groups remember where on that stack they began; when a statement
/// at a shallower level arrives, the functions here fold the deeper entries
/// into `Block`/`ChoiceGroup` nodes and attach them to their parent branch.
impl<'src> Parser<'src> {
    fn scratch_is_empty(&self, ctx: &StmtContext) -> bool {
        self.scratch.len() == ctx.scratch_top
    }

    /// Topmost open choice frame. Callers check the context floor first.
    fn top_choice(&self) -> OpenFrame {
        self.open_choices.last().copied().unwrap_or(OpenFrame {
            level: 0,
            scratch_offset: 0,
            source_offset: 0,
        })
    }

    /// Topmost open block frame. Callers check the context floor first.
    fn top_block(&self) -> OpenFrame {
        self.open_blocks.last().copied().unwrap_or(OpenFrame {
            level: 0,
            scratch_offset: 0,
            source_offset: 0,
        })
    }

    /// Move scratch entries from `from` upward out into a list.
    fn drain_scratch(&mut self, from: usize) -> Vec<Node> {
        if from < self.scratch.len() {
            self.scratch.split_off(from)
        } else {
            Vec::new()
        }
    }

    /// Attach a freshly collected block to the branch waiting for it, if the
    /// top of scratch is a branch with an empty body. Otherwise the block
    /// stands alone and the context notes that a bare block was created.
    fn fixup_block(&mut self, ctx: &mut StmtContext, block: Node) -> Node {
        if !self.scratch_is_empty(ctx) {
            if let Some(mut owner) = self.scratch.pop() {
                match &mut owner.kind {
                    NodeKind::ChoiceStar { body, .. }
                    | NodeKind::ChoicePlus { body, .. }
                    | NodeKind::SwitchCase { body, .. }
                    | NodeKind::IfBranch { body, .. }
                    | NodeKind::ElseBranch { body } => {
                        *body = Some(Box::new(block));
                        return owner;
                    }
                    _ => self.scratch.push(owner),
                }
            }
        }
        ctx.is_block_created = true;
        block
    }

    /// Collect the topmost open block if its level is at or above `level`.
    fn collect_block(&mut self, ctx: &mut StmtContext, level: usize) -> Option<Node> {
        if self.open_blocks.len() <= ctx.blocks_top {
            return None;
        }
        let b = self.top_block();
        if b.level < level {
            return None;
        }

        let b_start = b.source_offset;
        let b_end = if self.scratch_is_empty(ctx) {
            b_start
        } else {
            self.scratch.last().map(|n| n.span.end).unwrap_or(b_start)
        };
        let items = self.drain_scratch(b.scratch_offset);
        let block = Node::new(NodeKind::Block(items), Span::new(b_start, b_end));
        let block = self.fixup_block(ctx, block);
        self.open_blocks.pop();
        Some(block)
    }

    /// Collect open choice groups (and their blocks) deeper than `level`.
    ///
    /// Choice levels need not increase sequentially. A branch at a level
    /// below the previous one re-opens the enclosing group rather than
    /// closing it, which is why popped frames are sometimes pushed back with
    /// the shallower level.
    fn collect_context(
        &mut self,
        ctx: &mut StmtContext,
        level: usize,
        should_gather: bool,
    ) -> Option<Node> {
        while self.open_choices.len() > ctx.choices_top {
            let c = self.top_choice();
            if c.level <= level {
                break;
            }
            self.open_choices.pop();

            if self.open_blocks.len() > ctx.blocks_top {
                let b = self.top_block();
                if c.level <= b.level {
                    if let Some(n) = self.collect_block(ctx, b.level) {
                        self.scratch.push(n);
                    }
                }
            }
            if !should_gather {
                if self.open_choices.len() > ctx.choices_top {
                    let prev = self.top_choice();
                    if level > prev.level {
                        self.open_choices.push(OpenFrame {
                            level,
                            scratch_offset: c.scratch_offset,
                            source_offset: c.source_offset,
                        });
                        break;
                    }
                } else if level > 0 {
                    self.open_choices.push(OpenFrame {
                        level,
                        scratch_offset: c.scratch_offset,
                        source_offset: c.source_offset,
                    });
                    break;
                }
            }

            let span = Span::new(c.source_offset, self.token.span.start);
            let items = self.drain_scratch(c.scratch_offset);
            self.scratch.push(Node::new(NodeKind::ChoiceGroup(items), span));
        }

        if !should_gather {
            return self.collect_block(ctx, level);
        }
        if !self.scratch_is_empty(ctx) {
            return self.scratch.pop();
        }
        None
    }

    /// Close out the current stitch or function, wrapping its prototype and
    /// collected body into a declaration node.
    fn collect_stitch(&mut self, ctx: &mut StmtContext) -> Option<Node> {
        let body = self.collect_context(ctx, 0, false);

        if !self.scratch_is_empty(ctx) {
            let is_stitch = matches!(
                self.scratch.last().map(|n| &n.kind),
                Some(NodeKind::StitchProto { .. })
            );
            let is_func = matches!(
                self.scratch.last().map(|n| &n.kind),
                Some(NodeKind::FuncProto { .. })
            );
            if is_stitch || is_func {
                let proto = self.scratch.pop()?;
                let b_end = body
                    .as_ref()
                    .map(|n| n.span.end)
                    .unwrap_or(proto.span.end);
                let span = Span::new(proto.span.start, b_end);
                let kind = if is_stitch {
                    NodeKind::StitchDecl {
                        proto: Box::new(proto),
                        body: body.map(Box::new),
                    }
                } else {
                    NodeKind::FuncDecl {
                        proto: Box::new(proto),
                        body: body.map(Box::new),
                    }
                };
                return Some(Node::new(kind, span));
            }
        }
        body
    }

    /// Close out the current knot: collect its trailing stitch, then fold
    /// everything since `knot_offset` under the knot prototype.
    fn collect_knot(&mut self, ctx: &mut StmtContext) -> Option<Node> {
        if self.scratch_is_empty(ctx) {
            return None;
        }
        if let Some(child) = self.collect_stitch(ctx) {
            self.scratch.push(child);
        }
        if self.knot_offset < self.scratch.len()
            && matches!(
                self.scratch[self.knot_offset].kind,
                NodeKind::KnotProto { .. }
            )
        {
            let children = self.drain_scratch(self.knot_offset + 1);
            let proto = self.scratch.pop()?;
            let b_end = children
                .last()
                .map(|n| n.span.end)
                .unwrap_or(proto.span.end);
            let span = Span::new(proto.span.start, b_end);
            return Some(Node::new(
                NodeKind::KnotDecl {
                    proto: Box::new(proto),
                    children,
                },
                span,
            ));
        }
        None
    }

    // ========================================================================
    // Statement handlers
    //
    // Called after each statement parses, before the statement itself lands
    // on the scratch stack. They maintain the open-block/open-choice stacks.
    // ========================================================================

    fn handle_conditional_branch(&mut self, ctx: &mut StmtContext) {
        if let Some(n) = self.collect_context(ctx, 0, false) {
            self.scratch.push(n);
        }
    }

    fn handle_choice_branch(&mut self, ctx: &mut StmtContext, node: &Node) {
        let level = ctx.level;

        if self.open_blocks.len() <= ctx.blocks_top {
            self.open_blocks.push(OpenFrame {
                level: 0,
                scratch_offset: self.scratch.len(),
                source_offset: node.span.start,
            });
        }
        if self.open_choices.len() <= ctx.choices_top {
            self.open_choices.push(OpenFrame {
                level,
                scratch_offset: self.scratch.len(),
                source_offset: node.span.start,
            });
            return;
        }

        let c = self.top_choice();
        let b = self.top_block();

        if level > c.level {
            if b.level < c.level {
                self.open_blocks.push(OpenFrame {
                    level: c.level,
                    scratch_offset: self.scratch.len(),
                    source_offset: self.token.span.start,
                });
            }
            self.open_choices.push(OpenFrame {
                level,
                scratch_offset: self.scratch.len(),
                source_offset: node.span.start,
            });
        } else if level == c.level {
            if let Some(n) = self.collect_block(ctx, level) {
                self.scratch.push(n);
            }
        } else if let Some(n) = self.collect_context(ctx, level, false) {
            self.scratch.push(n);
        }
    }

    /// Gather points terminate choice groups at their level. The collected
    /// group and the gather fuse into a `GatheredStmt` so later passes know
    /// control continues at the gather after any branch.
    fn handle_gather(&mut self, ctx: &mut StmtContext, node: Node) -> Node {
        let level = ctx.level;
        let t_start = self.token.span.start;
        let mut node = node;

        if self.open_blocks.len() <= ctx.blocks_top {
            self.open_blocks.push(OpenFrame {
                level: 0,
                scratch_offset: self.scratch.len(),
                source_offset: node.span.start,
            });
        }
        if self.open_choices.len() > ctx.choices_top {
            let c = self.top_choice();
            let b = self.top_block();

            if level > c.level {
                if b.level != c.level {
                    self.open_blocks.push(OpenFrame {
                        level: c.level,
                        scratch_offset: self.scratch.len(),
                        source_offset: node.span.start,
                    });
                }
            } else if !self.scratch_is_empty(ctx) {
                if let Some(group) = self.collect_context(ctx, level.saturating_sub(1), true) {
                    if matches!(group.kind, NodeKind::ChoiceGroup(_)) {
                        let span = Span::new(group.span.start, t_start);
                        node = Node::new(
                            NodeKind::GatheredStmt {
                                group: Box::new(group),
                                gather: Box::new(node),
                            },
                            span,
                        );
                    }
                }
                if self.open_blocks.len() > ctx.blocks_top {
                    let b = self.top_block();
                    if b.level == level {
                        if let Some(n) = self.collect_block(ctx, level) {
                            self.scratch.push(n);
                        }
                    }
                }
            }
        }
        node
    }

    fn handle_content(&mut self, ctx: &mut StmtContext, node: &Node) {
        if self.open_blocks.len() <= ctx.blocks_top {
            self.open_blocks.push(OpenFrame {
                level: 0,
                scratch_offset: self.scratch.len(),
                source_offset: node.span.start,
            });
        }
        if self.open_choices.len() > ctx.choices_top {
            let b = self.top_block();
            let c = self.top_choice();
            if b.level != c.level {
                self.open_blocks.push(OpenFrame {
                    level: c.level,
                    scratch_offset: self.scratch.len(),
                    source_offset: node.span.start,
                });
            }
        }
    }

    fn handle_knot(&mut self, ctx: &mut StmtContext) {
        if let Some(n) = self.collect_knot(ctx) {
            self.scratch.push(n);
        }
        self.knot_offset = self.scratch.len();
    }

    fn handle_stitch(&mut self, ctx: &mut StmtContext) {
        if let Some(n) = self.collect_stitch(ctx) {
            self.scratch.push(n);
        }
    }
}
