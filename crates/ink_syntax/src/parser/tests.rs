#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Node {
        let file = parse(source);
        assert!(!file.has_errors(), "unexpected errors: {:?}", file.errors);
        file.root
    }

    fn file_items(root: Node) -> Vec<Node> {
        match root.kind {
            NodeKind::File(items) => items,
            other => panic!("expected File, got {other:?}"),
        }
    }

    fn block_items(node: Node) -> Vec<Node> {
        match node.kind {
            NodeKind::Block(items) => items,
            other => panic!("expected Block, got {other:?}"),
        }
    }

    /// The single top-level block of a source file.
    fn top_block(source: &str) -> Vec<Node> {
        let mut items = file_items(parse_ok(source));
        assert_eq!(items.len(), 1);
        block_items(items.remove(0))
    }

    fn content_parts(node: Node) -> Vec<Node> {
        match node.kind {
            NodeKind::ContentStmt(inner) => match inner.kind {
                NodeKind::Content(parts) => parts,
                other => panic!("expected Content, got {other:?}"),
            },
            other => panic!("expected ContentStmt, got {other:?}"),
        }
    }

    #[test]
    fn content_line() {
        let src = "Hello, world!\n";
        let parts = content_parts(top_block(src).remove(0));
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].kind, NodeKind::Text);
        assert_eq!(parts[0].span.text(src), "Hello, world!");
    }

    #[test]
    fn content_lines_fold_into_one_block() {
        let items = top_block("First line\nSecond line\n");
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0].kind, NodeKind::ContentStmt(_)));
        assert!(matches!(items[1].kind, NodeKind::ContentStmt(_)));
    }

    #[test]
    fn glue_splits_a_content_line() {
        let src = "left <> right\n";
        let parts = content_parts(top_block(src).remove(0));
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].span.text(src), "left ");
        assert_eq!(parts[1].kind, NodeKind::Glue);
        assert_eq!(parts[2].span.text(src), " right");
    }

    #[test]
    fn divert_stmt() {
        let src = "-> ending\n";
        let mut items = top_block(src);
        let NodeKind::DivertStmt(divert) = items.remove(0).kind else {
            panic!("expected DivertStmt");
        };
        let NodeKind::Divert(target) = divert.kind else {
            panic!("expected Divert");
        };
        assert_eq!(target.kind, NodeKind::Identifier);
        assert_eq!(target.span.text(src), "ending");
    }

    #[test]
    fn var_decl() {
        let src = "VAR health = 100\n";
        let mut items = top_block(src);
        let NodeKind::VarDecl { name, expr } = items.remove(0).kind else {
            panic!("expected VarDecl");
        };
        assert_eq!(name.span.text(src), "health");
        assert_eq!(expr.kind, NodeKind::Number);
    }

    #[test]
    fn const_decl() {
        let src = "CONST SPEED = 10\n";
        let mut items = top_block(src);
        assert!(matches!(items.remove(0).kind, NodeKind::ConstDecl { .. }));
    }

    #[test]
    fn var_is_a_plain_word_mid_line() {
        let src = "The VAR stays text here\n";
        let parts = content_parts(top_block(src).remove(0));
        assert_eq!(parts[0].span.text(src), "The VAR stays text here");
    }

    #[test]
    fn tilde_temp_decl() {
        let src = "~ temp x = 1 + 2\n";
        let mut items = top_block(src);
        let NodeKind::TempDecl { name, expr } = items.remove(0).kind else {
            panic!("expected TempDecl");
        };
        assert_eq!(name.span.text(src), "x");
        assert!(matches!(
            expr.kind,
            NodeKind::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn tilde_assignment() {
        let src = "~ x = x - 1\n";
        let mut items = top_block(src);
        assert!(matches!(items.remove(0).kind, NodeKind::AssignStmt { .. }));
    }

    #[test]
    fn tilde_call_is_an_expr_stmt() {
        let src = "~ beep(2, 3)\n";
        let mut items = top_block(src);
        let NodeKind::ExprStmt(inner) = items.remove(0).kind else {
            panic!("expected ExprStmt");
        };
        let NodeKind::CallExpr { args, .. } = inner.kind else {
            panic!("expected CallExpr");
        };
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn tilde_return_without_value() {
        let src = "~ return\n";
        let mut items = top_block(src);
        assert!(matches!(items.remove(0).kind, NodeKind::ReturnStmt(None)));
    }

    #[test]
    fn operator_precedence() {
        let src = "~ temp v = 1 + 2 * 3\n";
        let mut items = top_block(src);
        let NodeKind::TempDecl { expr, .. } = items.remove(0).kind else {
            panic!("expected TempDecl");
        };
        let NodeKind::Binary { op, rhs, .. } = expr.kind else {
            panic!("expected Binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(
            rhs.kind,
            NodeKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn choices_fold_into_a_group() {
        let src = "* One\n* Two\n* Three\n";
        let mut items = top_block(src);
        assert_eq!(items.len(), 1);
        let NodeKind::ChoiceGroup(branches) = items.remove(0).kind else {
            panic!("expected ChoiceGroup");
        };
        assert_eq!(branches.len(), 3);
        assert!(matches!(branches[0].kind, NodeKind::ChoiceStar { .. }));
    }

    #[test]
    fn nested_choice_becomes_branch_body() {
        let src = "* A\n** A nested\n* B\n";
        let mut items = top_block(src);
        let NodeKind::ChoiceGroup(branches) = items.remove(0).kind else {
            panic!("expected ChoiceGroup");
        };
        assert_eq!(branches.len(), 2);
        let NodeKind::ChoiceStar { body, .. } = &branches[0].kind else {
            panic!("expected ChoiceStar");
        };
        assert!(body.is_some(), "nested branch should attach as a body");
        let NodeKind::ChoiceStar { body, .. } = &branches[1].kind else {
            panic!("expected ChoiceStar");
        };
        assert!(body.is_none());
    }

    #[test]
    fn block_fixup_keeps_earlier_siblings() {
        // A collected body must attach to the branch directly above it while
        // statements before the group stay where they were.
        let src = "Lead in.\n* A\n  Deeper.\n* B\n";
        let items = top_block(src);
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0].kind, NodeKind::ContentStmt(_)));
        let NodeKind::ChoiceGroup(branches) = &items[1].kind else {
            panic!("expected ChoiceGroup");
        };
        let NodeKind::ChoiceStar { body, .. } = &branches[0].kind else {
            panic!("expected ChoiceStar");
        };
        let body = body.as_deref().expect("body should attach to branch A");
        assert!(matches!(body.kind, NodeKind::Block(_)));
    }

    #[test]
    fn gather_closes_a_choice_group() {
        let src = "* One\n* Two\n- Done\n";
        let items = top_block(src);
        assert_eq!(items.len(), 2);
        let NodeKind::GatheredStmt { group, gather } = &items[0].kind else {
            panic!("expected GatheredStmt");
        };
        assert!(matches!(group.kind, NodeKind::ChoiceGroup(_)));
        assert!(matches!(gather.kind, NodeKind::GatherPoint));
        // The line after the gather marker is ordinary content.
        assert!(matches!(items[1].kind, NodeKind::ContentStmt(_)));
    }

    #[test]
    fn choice_expr_brackets() {
        let src = "* Shared [Option only] inner only\n";
        let mut items = top_block(src);
        let NodeKind::ChoiceGroup(mut branches) = items.remove(0).kind else {
            panic!("expected ChoiceGroup");
        };
        let NodeKind::ChoiceStar { expr, .. } = branches.remove(0).kind else {
            panic!("expected ChoiceStar");
        };
        let NodeKind::ChoiceExpr {
            start,
            option,
            inner,
        } = expr.kind
        else {
            panic!("expected ChoiceExpr");
        };
        assert_eq!(start.unwrap().span.text(src), "Shared ");
        assert_eq!(option.unwrap().span.text(src), "Option only");
        assert_eq!(inner.unwrap().span.text(src), " inner only");
    }

    #[test]
    fn knot_decl_wraps_its_statements() {
        let src = "== island ==\nYou are here.\n";
        let mut items = file_items(parse_ok(src));
        assert_eq!(items.len(), 1);
        let NodeKind::KnotDecl { proto, children } = items.remove(0).kind else {
            panic!("expected KnotDecl");
        };
        let NodeKind::KnotProto { name, params } = proto.kind else {
            panic!("expected KnotProto");
        };
        assert_eq!(name.span.text(src), "island");
        assert!(params.is_none());
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn stitch_decl_inside_knot() {
        let src = "== island ==\n= shore\nSand.\n";
        let mut items = file_items(parse_ok(src));
        let NodeKind::KnotDecl { children, .. } = items.remove(0).kind else {
            panic!("expected KnotDecl");
        };
        assert_eq!(children.len(), 1);
        assert!(matches!(children[0].kind, NodeKind::StitchDecl { .. }));
    }

    #[test]
    fn function_decl_with_params() {
        let src = "== function add(a, b) ==\n~ return a + b\n";
        let mut items = file_items(parse_ok(src));
        let NodeKind::FuncDecl { proto, body } = items.remove(0).kind else {
            panic!("expected FuncDecl");
        };
        let NodeKind::FuncProto { name, params } = proto.kind else {
            panic!("expected FuncProto");
        };
        assert_eq!(name.span.text(src), "add");
        let NodeKind::ParamList(params) = params.expect("params").kind else {
            panic!("expected ParamList");
        };
        assert_eq!(params.len(), 2);
        assert!(body.is_some());
    }

    #[test]
    fn ref_param() {
        let src = "== function bump(ref x) ==\n~ x = x + 1\n";
        let mut items = file_items(parse_ok(src));
        let NodeKind::FuncDecl { proto, .. } = items.remove(0).kind else {
            panic!("expected FuncDecl");
        };
        let NodeKind::FuncProto { params, .. } = proto.kind else {
            panic!("expected FuncProto");
        };
        let NodeKind::ParamList(params) = params.expect("params").kind else {
            panic!("expected ParamList");
        };
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].kind, NodeKind::RefParamDecl);
    }

    #[test]
    fn inline_logic_in_content() {
        let src = "You have {count} coins.\n";
        let parts = content_parts(top_block(src).remove(0));
        assert_eq!(parts.len(), 3);
        let NodeKind::InlineLogic(expr) = &parts[1].kind else {
            panic!("expected InlineLogic");
        };
        assert_eq!(expr.span.text(src), "count");
    }

    #[test]
    fn inline_conditional_in_content() {
        let src = "{found: You found it!}\n";
        let parts = content_parts(top_block(src).remove(0));
        let NodeKind::IfExpr { cond, content } = &parts[0].kind else {
            panic!("expected IfExpr");
        };
        assert_eq!(cond.span.text(src), "found");
        assert!(matches!(content.kind, NodeKind::Content(_)));
    }

    #[test]
    fn block_conditional_with_else() {
        let src = "{found:\nYes.\n- else:\nNo.\n}\n";
        let parts = content_parts(top_block(src).remove(0));
        let NodeKind::IfStmt { cond, arms } = &parts[0].kind else {
            panic!("expected IfStmt");
        };
        assert!(cond.is_some());
        assert_eq!(arms.len(), 2);
        assert!(matches!(arms[0].kind, NodeKind::Block(_)));
        let NodeKind::ElseBranch { body } = &arms[1].kind else {
            panic!("expected ElseBranch");
        };
        assert!(body.is_some());
    }

    #[test]
    fn switch_stmt() {
        let src = "{x:\n- 1: one\n- 2: two\n}\n";
        let parts = content_parts(top_block(src).remove(0));
        let NodeKind::SwitchStmt { cond, arms } = &parts[0].kind else {
            panic!("expected SwitchStmt");
        };
        assert_eq!(cond.span.text(src), "x");
        assert_eq!(arms.len(), 2);
        for arm in arms {
            let NodeKind::SwitchCase { body, .. } = &arm.kind else {
                panic!("expected SwitchCase");
            };
            assert!(body.is_some());
        }
    }

    #[test]
    fn multi_if_stmt() {
        let src = "{\n- x > 1: big\n- else: small\n}\n";
        let parts = content_parts(top_block(src).remove(0));
        let NodeKind::MultiIfStmt { arms } = &parts[0].kind else {
            panic!("expected MultiIfStmt");
        };
        assert_eq!(arms.len(), 2);
        assert!(matches!(arms[0].kind, NodeKind::IfBranch { .. }));
        assert!(matches!(arms[1].kind, NodeKind::ElseBranch { .. }));
    }

    #[test]
    fn string_literal_expr() {
        let src = "~ temp s = \"hi there\"\n";
        let mut items = top_block(src);
        let NodeKind::TempDecl { expr, .. } = items.remove(0).kind else {
            panic!("expected TempDecl");
        };
        let NodeKind::StringExpr(inner) = expr.kind else {
            panic!("expected StringExpr");
        };
        assert_eq!(inner.expect("inner text").span.text(src), "hi there");
    }

    #[test]
    fn selector_expr() {
        let src = "-> island.shore\n";
        let mut items = top_block(src);
        let NodeKind::DivertStmt(divert) = items.remove(0).kind else {
            panic!("expected DivertStmt");
        };
        let NodeKind::Divert(target) = divert.kind else {
            panic!("expected Divert");
        };
        assert!(matches!(target.kind, NodeKind::SelectorExpr { .. }));
    }

    #[test]
    fn unclosed_brace_is_an_error() {
        let file = parse("{ broken\n");
        assert!(file.has_errors());
    }

    #[test]
    fn recovery_continues_after_bad_line() {
        let src = "~ temp = 3\nStill here\n";
        let file = parse(src);
        assert!(file.has_errors());
        let NodeKind::File(items) = &file.root.kind else {
            panic!("expected File");
        };
        assert_eq!(items.len(), 1, "good line should survive recovery");
    }

    #[test]
    fn empty_source_parses_clean() {
        let file = parse("");
        assert!(!file.has_errors());
        assert!(matches!(file.root.kind, NodeKind::File(_)));
    }
}
