//! Bytecode generation.
//!
//! Generation runs in two passes. The first interns every knot, stitch, and
//! function prototype so forward diverts and calls resolve; the second walks
//! the tree again and emits one [`ContentPath`] per declaration, plus the
//! synthetic [`DEFAULT_PATH`] holding file-level content.
//!
//! Forward control flow inside a path goes through labels: `emit_jump`
//! records the operand offset against a label id, and `end_path` backpatches
//! every recorded jump once the label offsets are known.

use std::rc::Rc;

use ink_syntax::ast::{BinaryOp, Node, NodeKind, SourceFile, Span, UnaryOp};
use ink_syntax::diagnostics::{CompileError, errors};
use tracing::debug;

use crate::compiler::symbols::{ScopeId, Symbol, SymbolTable};
use crate::runtime::{ContentPath, DEFAULT_PATH, Opcode, Program, Value};

/// Generate bytecode for a parsed file.
pub(crate) fn generate(source: &str, file: &SourceFile) -> Result<Program, Vec<CompileError>> {
    let mut g = Codegen::new(source);
    g.gen_file(&file.root);
    if g.errors.is_empty() {
        debug!(paths = g.program.paths.len(), "generated bytecode");
        Ok(g.program)
    } else {
        Err(g.errors)
    }
}

struct Codegen<'src> {
    source: &'src str,
    symbols: SymbolTable,
    scope: ScopeId,
    program: Program,
    errors: Vec<CompileError>,

    // Path under construction.
    path_name: String,
    arity: usize,
    locals: usize,
    code: Vec<u8>,
    consts: Vec<Value>,
    labels: Vec<Option<usize>>,
    jumps: Vec<(usize, usize)>,
    /// Label that choice branch bodies jump to when they finish: the gather
    /// point when one exists, otherwise the end of the path.
    exit_label: usize,
}

impl<'src> Codegen<'src> {
    fn new(source: &'src str) -> Self {
        let symbols = SymbolTable::new();
        let scope = symbols.root();
        Self {
            source,
            symbols,
            scope,
            program: Program::default(),
            errors: Vec::new(),
            path_name: String::new(),
            arity: 0,
            locals: 0,
            code: Vec::new(),
            consts: Vec::new(),
            labels: Vec::new(),
            jumps: Vec::new(),
            exit_label: 0,
        }
    }

    fn name_of(&self, node: &Node) -> String {
        node.span.text(self.source).to_string()
    }

    // ========================================================================
    // Emission
    // ========================================================================

    fn emit(&mut self, op: Opcode) {
        self.code.push(op as u8);
    }

    fn emit_byte(&mut self, byte: u8) {
        self.code.push(byte);
    }

    fn add_const(&mut self, value: Value, span: Span) -> u8 {
        if self.consts.len() > u8::MAX as usize {
            self.errors.push(errors::too_many_constants(span));
            return 0;
        }
        self.consts.push(value);
        (self.consts.len() - 1) as u8
    }

    fn emit_const(&mut self, value: Value, span: Span) {
        let idx = self.add_const(value, span);
        self.emit(Opcode::Const);
        self.emit_byte(idx);
    }

    /// Emit an op whose operand is a constant-pool index, e.g. `call`,
    /// `divert`, and the global load/store pair.
    fn emit_op_const(&mut self, op: Opcode, value: Value, span: Span) {
        let idx = self.add_const(value, span);
        self.emit(op);
        self.emit_byte(idx);
    }

    fn add_label(&mut self) -> usize {
        self.labels.push(None);
        self.labels.len() - 1
    }

    fn set_label(&mut self, label: usize) {
        self.labels[label] = Some(self.code.len());
    }

    fn emit_jump(&mut self, op: Opcode, label: usize) {
        self.emit(op);
        self.jumps.push((label, self.code.len()));
        self.emit_byte(0xff);
        self.emit_byte(0xff);
    }

    fn alloc_local(&mut self, span: Span) -> u8 {
        let slot = self.arity + self.locals;
        self.locals += 1;
        if slot > u8::MAX as usize {
            self.errors.push(errors::too_many_locals(span));
            return 0;
        }
        slot as u8
    }

    fn begin_path(&mut self, name: &str, arity: usize) {
        self.path_name = name.to_string();
        self.arity = arity;
        self.locals = 0;
        self.code = Vec::new();
        self.consts = Vec::new();
        self.labels = Vec::new();
        self.jumps = Vec::new();
    }

    /// Backpatch recorded jumps and commit the path to the program.
    fn end_path(&mut self, span: Span) {
        for (label, arg_offset) in std::mem::take(&mut self.jumps) {
            let Some(target) = self.labels[label] else {
                debug_assert!(false, "unset label {label}");
                self.errors.push(errors::jump_too_large(span));
                continue;
            };
            let Some(jump) = target.checked_sub(arg_offset + 2) else {
                debug_assert!(false, "backward jump through label {label}");
                self.errors.push(errors::jump_too_large(span));
                continue;
            };
            if jump > u16::MAX as usize {
                self.errors.push(errors::jump_too_large(span));
                continue;
            }
            self.code[arg_offset] = (jump >> 8) as u8;
            self.code[arg_offset + 1] = (jump & 0xff) as u8;
        }
        let path = ContentPath {
            name: std::mem::take(&mut self.path_name),
            arity: self.arity,
            locals: self.locals,
            code: std::mem::take(&mut self.code),
            consts: std::mem::take(&mut self.consts),
        };
        self.program.paths.insert(path.name.clone(), Rc::new(path));
    }

    // ========================================================================
    // Interning pass
    // ========================================================================

    fn intern_items(&mut self, scope: ScopeId, namespace: Option<&str>, items: &[Node]) {
        for item in items {
            match &item.kind {
                NodeKind::KnotDecl { proto, children } => {
                    if let Some((qualified, members)) = self.intern_proto(scope, namespace, proto)
                    {
                        self.intern_items(members, Some(&qualified), children);
                    }
                }
                NodeKind::StitchDecl { proto, .. } | NodeKind::FuncDecl { proto, .. } => {
                    self.intern_proto(scope, namespace, proto);
                }
                _ => {}
            }
        }
    }

    fn intern_proto(
        &mut self,
        scope: ScopeId,
        namespace: Option<&str>,
        proto: &Node,
    ) -> Option<(String, ScopeId)> {
        let (name_node, params) = match &proto.kind {
            NodeKind::KnotProto { name, params }
            | NodeKind::StitchProto { name, params }
            | NodeKind::FuncProto { name, params } => (name, params),
            _ => return None,
        };
        let name = self.name_of(name_node);
        let qualified = match namespace {
            Some(ns) => format!("{ns}.{name}"),
            None => name.clone(),
        };

        let members = self.symbols.push_scope(scope);
        let mut arity = 0;
        if let Some(NodeKind::ParamList(decls)) = params.as_ref().map(|list| &list.kind) {
            for (slot, decl) in decls.iter().enumerate() {
                let param = self.name_of(decl);
                if self
                    .symbols
                    .define(members, &param, Symbol::Param { slot })
                    .is_err()
                {
                    self.errors
                        .push(errors::redefined_identifier(&param, decl.span));
                }
                arity += 1;
            }
        }

        let symbol = Symbol::Path {
            qualified: qualified.clone(),
            arity,
            members,
        };
        if self.symbols.define(scope, &name, symbol).is_err() {
            self.errors
                .push(errors::redefined_identifier(&name, name_node.span));
            return None;
        }
        Some((qualified, members))
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn gen_file(&mut self, root: &Node) {
        let NodeKind::File(items) = &root.kind else {
            return;
        };
        self.intern_items(self.symbols.root(), None, items);

        // File-level content becomes the synthetic start path.
        self.begin_path(DEFAULT_PATH, 0);
        self.exit_label = self.add_label();
        if let Some(first) = items.first() {
            if matches!(first.kind, NodeKind::Block(_)) {
                self.gen_block(first);
            }
        }
        let exit = self.exit_label;
        self.set_label(exit);
        self.emit(Opcode::Exit);
        self.end_path(root.span);

        for item in items {
            match &item.kind {
                NodeKind::KnotDecl { .. } => self.gen_knot_decl(item),
                NodeKind::StitchDecl { .. } | NodeKind::FuncDecl { .. } => {
                    self.gen_leaf_decl(item)
                }
                _ => {}
            }
        }
    }

    fn gen_knot_decl(&mut self, node: &Node) {
        let NodeKind::KnotDecl { proto, children } = &node.kind else {
            return;
        };
        let Some((qualified, arity, members)) = self.decl_symbol(proto) else {
            return;
        };

        let saved = self.scope;
        self.scope = members;
        self.begin_path(&qualified, arity);
        self.exit_label = self.add_label();
        if let Some(body) = children.iter().find(|c| matches!(c.kind, NodeKind::Block(_))) {
            self.gen_block(body);
        }
        let exit = self.exit_label;
        self.set_label(exit);
        self.emit(Opcode::Exit);
        self.end_path(node.span);

        for child in children {
            if matches!(
                child.kind,
                NodeKind::StitchDecl { .. } | NodeKind::FuncDecl { .. }
            ) {
                self.gen_leaf_decl(child);
            }
        }
        self.scope = saved;
    }

    fn gen_leaf_decl(&mut self, node: &Node) {
        let (proto, body, is_func) = match &node.kind {
            NodeKind::StitchDecl { proto, body } => (proto, body, false),
            NodeKind::FuncDecl { proto, body } => (proto, body, true),
            _ => return,
        };
        let Some((qualified, arity, members)) = self.decl_symbol(proto) else {
            return;
        };

        let saved = self.scope;
        self.scope = members;
        self.begin_path(&qualified, arity);
        self.exit_label = self.add_label();
        if let Some(body) = body {
            self.gen_block(body);
        }
        let exit = self.exit_label;
        self.set_label(exit);
        if is_func {
            // Implicit `return false` on fallthrough.
            self.emit(Opcode::False);
            self.emit(Opcode::Ret);
        } else {
            self.emit(Opcode::Exit);
        }
        self.end_path(node.span);
        self.scope = saved;
    }

    /// Look up the interned symbol for a declaration's prototype.
    fn decl_symbol(&mut self, proto: &Node) -> Option<(String, usize, ScopeId)> {
        let name_node = match &proto.kind {
            NodeKind::KnotProto { name, .. }
            | NodeKind::StitchProto { name, .. }
            | NodeKind::FuncProto { name, .. } => name,
            _ => return None,
        };
        let name = self.name_of(name_node);
        match self.symbols.lookup(self.scope, &name).cloned() {
            Some(Symbol::Path {
                qualified,
                arity,
                members,
            }) => Some((qualified, arity, members)),
            // Interning already reported the problem.
            _ => None,
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn gen_block(&mut self, node: &Node) {
        let NodeKind::Block(stmts) = &node.kind else {
            return;
        };
        let saved = self.scope;
        self.scope = self.symbols.push_scope(saved);
        for stmt in stmts {
            self.gen_stmt(stmt);
        }
        self.scope = saved;
    }

    fn gen_stmt(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::ContentStmt(content) => self.gen_content_stmt(content),
            NodeKind::DivertStmt(divert) => self.gen_divert(divert),
            NodeKind::TempDecl { name, expr } => self.gen_temp_decl(name, expr),
            NodeKind::VarDecl { name, expr } => self.gen_global_decl(name, expr, false),
            NodeKind::ConstDecl { name, expr } => self.gen_global_decl(name, expr, true),
            NodeKind::AssignStmt { lhs, rhs } => self.gen_assign(lhs, rhs),
            NodeKind::ExprStmt(expr) => {
                self.gen_expr(expr);
                self.emit(Opcode::Pop);
            }
            NodeKind::ReturnStmt(expr) => {
                match expr {
                    Some(expr) => self.gen_expr(expr),
                    None => self.emit(Opcode::False),
                }
                self.emit(Opcode::Ret);
            }
            NodeKind::IfStmt { cond, arms } => {
                self.gen_if_stmt(cond.as_deref(), arms, node.span)
            }
            NodeKind::MultiIfStmt { arms } => self.gen_multi_if(arms, node.span),
            NodeKind::SwitchStmt { cond, arms } => self.gen_switch(cond, arms, node.span),
            NodeKind::ChoiceGroup(_) => self.gen_choice_group(node),
            NodeKind::GatheredStmt { group, .. } => self.gen_gathered(group),
            NodeKind::GatherPoint => {}
            NodeKind::Block(_) => self.gen_block(node),
            NodeKind::EmptyText => {}
            _ => {}
        }
    }

    fn gen_temp_decl(&mut self, name: &Node, expr: &Node) {
        self.gen_expr(expr);
        let text = self.name_of(name);
        let slot = self.alloc_local(name.span);
        if self
            .symbols
            .define(self.scope, &text, Symbol::Local { slot: slot as usize })
            .is_err()
        {
            self.errors
                .push(errors::redefined_identifier(&text, name.span));
        }
        self.emit(Opcode::Store);
        self.emit_byte(slot);
        self.emit(Opcode::Pop);
    }

    fn gen_global_decl(&mut self, name: &Node, expr: &Node, is_const: bool) {
        self.gen_expr(expr);
        let text = self.name_of(name);
        let root = self.symbols.root();
        if self
            .symbols
            .define(root, &text, Symbol::Global { is_const })
            .is_err()
        {
            self.errors
                .push(errors::redefined_identifier(&text, name.span));
        }
        self.emit_op_const(Opcode::StoreGlobal, Value::string(&text), name.span);
        self.emit(Opcode::Pop);
    }

    fn gen_assign(&mut self, lhs: &Node, rhs: &Node) {
        let NodeKind::Identifier = lhs.kind else {
            self.errors.push(errors::invalid_lvalue(lhs.span));
            return;
        };
        let name = self.name_of(lhs);
        match self.symbols.lookup(self.scope, &name).cloned() {
            Some(Symbol::Global { is_const }) => {
                if is_const {
                    self.errors.push(errors::const_assign(&name, lhs.span));
                    return;
                }
                self.gen_expr(rhs);
                self.emit_op_const(Opcode::StoreGlobal, Value::string(&name), lhs.span);
                self.emit(Opcode::Pop);
            }
            Some(Symbol::Local { slot }) | Some(Symbol::Param { slot }) => {
                self.gen_expr(rhs);
                self.emit(Opcode::Store);
                self.emit_byte(slot as u8);
                self.emit(Opcode::Pop);
            }
            Some(Symbol::Path { .. }) => self.errors.push(errors::invalid_lvalue(lhs.span)),
            None => self
                .errors
                .push(errors::unknown_identifier(&name, lhs.span)),
        }
    }

    // ========================================================================
    // Content
    // ========================================================================

    fn gen_content_stmt(&mut self, content: &Node) {
        let NodeKind::Content(items) = &content.kind else {
            return;
        };
        self.gen_content_items(items);
        // Trailing glue joins this line onto the next one; leave the line
        // unterminated so the runtime holds it back.
        if !matches!(items.last().map(|n| &n.kind), Some(NodeKind::Glue)) {
            self.emit(Opcode::Line);
        }
        self.emit(Opcode::Flush);
    }

    fn gen_content_items(&mut self, items: &[Node]) {
        for item in items {
            match &item.kind {
                NodeKind::Text => {
                    let text = item.span.text(self.source).to_string();
                    self.emit_const(Value::string(text), item.span);
                    self.emit(Opcode::ContentPush);
                }
                NodeKind::EmptyText => {}
                NodeKind::Glue => self.emit(Opcode::Glue),
                NodeKind::InlineLogic(expr) => {
                    self.gen_expr(expr);
                    self.emit(Opcode::ContentPush);
                }
                NodeKind::IfExpr { .. } => self.gen_if_expr(item),
                NodeKind::IfStmt { .. }
                | NodeKind::MultiIfStmt { .. }
                | NodeKind::SwitchStmt { .. }
                | NodeKind::DivertStmt(_) => self.gen_stmt(item),
                _ => {}
            }
        }
    }

    /// Inline `{cond: content}`.
    fn gen_if_expr(&mut self, node: &Node) {
        let NodeKind::IfExpr { cond, content } = &node.kind else {
            return;
        };
        self.gen_expr(cond);
        let skip = self.add_label();
        let end = self.add_label();
        self.emit_jump(Opcode::JmpF, skip);
        self.emit(Opcode::Pop);
        if let NodeKind::Content(items) = &content.kind {
            self.gen_content_items(items);
        }
        self.emit_jump(Opcode::Jmp, end);
        self.set_label(skip);
        self.emit(Opcode::Pop);
        self.set_label(end);
    }

    // ========================================================================
    // Diverts and calls
    // ========================================================================

    fn gen_divert(&mut self, node: &Node) {
        let NodeKind::Divert(target) = &node.kind else {
            return;
        };
        match &target.kind {
            NodeKind::Identifier => {
                let name = self.name_of(target);
                if name == "END" || name == "DONE" {
                    self.emit(Opcode::Exit);
                    return;
                }
                self.gen_divert_to(target);
            }
            NodeKind::SelectorExpr { .. } => self.gen_divert_to(target),
            NodeKind::CallExpr { .. } => self.gen_call(target, Opcode::Divert),
            _ => self.errors.push(errors::invalid_expr(target.span)),
        }
    }

    fn gen_divert_to(&mut self, target: &Node) {
        let Some((qualified, arity, _)) = self.resolve_path(target) else {
            return;
        };
        if arity > 0 {
            self.errors
                .push(errors::too_few_args(&qualified, target.span));
            return;
        }
        self.emit_op_const(Opcode::Divert, Value::string(qualified), target.span);
    }

    fn gen_call(&mut self, node: &Node, op: Opcode) {
        let NodeKind::CallExpr { callee, args } = &node.kind else {
            return;
        };
        let Some((qualified, arity, _)) = self.resolve_path(callee) else {
            return;
        };
        if args.len() < arity {
            self.errors.push(errors::too_few_args(&qualified, node.span));
            return;
        }
        if args.len() > arity {
            self.errors
                .push(errors::too_many_args(&qualified, node.span));
            return;
        }
        for arg in args {
            self.gen_expr(arg);
        }
        self.emit_op_const(op, Value::string(qualified), node.span);
    }

    /// Resolve an identifier or dotted selector to a content path.
    fn resolve_path(&mut self, node: &Node) -> Option<(String, usize, ScopeId)> {
        match &node.kind {
            NodeKind::Identifier => {
                let name = self.name_of(node);
                match self.symbols.lookup(self.scope, &name).cloned() {
                    Some(Symbol::Path {
                        qualified,
                        arity,
                        members,
                    }) => Some((qualified, arity, members)),
                    Some(_) => {
                        self.errors.push(errors::invalid_expr(node.span));
                        None
                    }
                    None => {
                        self.errors
                            .push(errors::unknown_identifier(&name, node.span));
                        None
                    }
                }
            }
            NodeKind::SelectorExpr { lhs, rhs } => {
                let (_, _, members) = self.resolve_path(lhs)?;
                let name = self.name_of(rhs);
                match self.symbols.lookup_member(members, &name).cloned() {
                    Some(Symbol::Path {
                        qualified,
                        arity,
                        members,
                    }) => Some((qualified, arity, members)),
                    _ => {
                        self.errors
                            .push(errors::unknown_identifier(&name, rhs.span));
                        None
                    }
                }
            }
            _ => {
                self.errors.push(errors::invalid_expr(node.span));
                None
            }
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn gen_expr(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Number => match parse_number(node.span.text(self.source)) {
                Some(value) => self.emit_const(value, node.span),
                None => self.errors.push(errors::invalid_expr(node.span)),
            },
            NodeKind::True => self.emit(Opcode::True),
            NodeKind::False => self.emit(Opcode::False),
            NodeKind::StringExpr(inner) => {
                let text = inner
                    .as_ref()
                    .map(|n| n.span.text(self.source))
                    .unwrap_or("");
                self.emit_const(Value::string(text), node.span);
            }
            NodeKind::Identifier => self.gen_identifier(node),
            NodeKind::CallExpr { .. } => self.gen_call(node, Opcode::Call),
            NodeKind::Binary { op, lhs, rhs } => self.gen_binary(*op, lhs, rhs, node.span),
            NodeKind::Unary { op, operand } => {
                self.gen_expr(operand);
                match op {
                    UnaryOp::Not => self.emit(Opcode::Not),
                    UnaryOp::Negate => self.emit(Opcode::Neg),
                }
            }
            NodeKind::IfExpr { .. } => self.gen_if_expr(node),
            NodeKind::InlineLogic(expr) => self.gen_expr(expr),
            NodeKind::Divert(_) => self.gen_divert(node),
            _ => self.errors.push(errors::invalid_expr(node.span)),
        }
    }

    fn gen_identifier(&mut self, node: &Node) {
        let name = self.name_of(node);
        match self.symbols.lookup(self.scope, &name).cloned() {
            Some(Symbol::Global { .. }) => {
                self.emit_op_const(Opcode::LoadGlobal, Value::string(&name), node.span);
            }
            Some(Symbol::Local { slot }) | Some(Symbol::Param { slot }) => {
                self.emit(Opcode::Load);
                self.emit_byte(slot as u8);
            }
            Some(Symbol::Path { .. }) => self.errors.push(errors::invalid_expr(node.span)),
            None => self
                .errors
                .push(errors::unknown_identifier(&name, node.span)),
        }
    }

    fn gen_binary(&mut self, op: BinaryOp, lhs: &Node, rhs: &Node, span: Span) {
        match op {
            BinaryOp::And => self.gen_logical(Opcode::JmpF, lhs, rhs),
            BinaryOp::Or => self.gen_logical(Opcode::JmpT, lhs, rhs),
            BinaryOp::NotEqual => {
                self.gen_expr(lhs);
                self.gen_expr(rhs);
                self.emit(Opcode::CmpEq);
                self.emit(Opcode::Not);
            }
            BinaryOp::Contains => self.errors.push(errors::invalid_expr(span)),
            _ => {
                self.gen_expr(lhs);
                self.gen_expr(rhs);
                let op = match op {
                    BinaryOp::Add => Opcode::Add,
                    BinaryOp::Sub => Opcode::Sub,
                    BinaryOp::Mul => Opcode::Mul,
                    BinaryOp::Div => Opcode::Div,
                    BinaryOp::Mod => Opcode::Mod,
                    BinaryOp::Equal => Opcode::CmpEq,
                    BinaryOp::Less => Opcode::CmpLt,
                    BinaryOp::LessEqual => Opcode::CmpLte,
                    BinaryOp::Greater => Opcode::CmpGt,
                    BinaryOp::GreaterEqual => Opcode::CmpGte,
                    _ => unreachable!("handled above"),
                };
                self.emit(op);
            }
        }
    }

    /// Short-circuit `and`/`or`: the skip condition keeps the left value.
    fn gen_logical(&mut self, skip_op: Opcode, lhs: &Node, rhs: &Node) {
        self.gen_expr(lhs);
        let skip = self.add_label();
        self.emit_jump(skip_op, skip);
        self.emit(Opcode::Pop);
        self.gen_expr(rhs);
        self.set_label(skip);
    }

    // ========================================================================
    // Conditionals
    // ========================================================================

    /// Every conditional shares the same arm rules: at least one arm, at most
    /// one `else`, and `else` last.
    fn check_arms(&mut self, arms: &[Node], span: Span) -> bool {
        if arms.is_empty() {
            self.errors.push(errors::conditional_empty(span));
            return false;
        }
        let mut seen_else = false;
        for arm in arms {
            if matches!(arm.kind, NodeKind::ElseBranch { .. }) {
                if seen_else {
                    self.errors.push(errors::else_multiple(arm.span));
                    return false;
                }
                seen_else = true;
            } else if seen_else {
                self.errors.push(errors::else_not_final(arm.span));
                return false;
            }
        }
        true
    }

    fn gen_if_stmt(&mut self, cond: Option<&Node>, arms: &[Node], span: Span) {
        let Some(cond) = cond else {
            self.errors.push(errors::expected_expr(span));
            return;
        };
        if !self.check_arms(arms, span) {
            return;
        }
        self.gen_expr(cond);
        let otherwise = self.add_label();
        let end = self.add_label();
        self.emit_jump(Opcode::JmpF, otherwise);
        self.emit(Opcode::Pop);
        for arm in arms {
            if matches!(arm.kind, NodeKind::Block(_)) {
                self.gen_block(arm);
            }
        }
        self.emit_jump(Opcode::Jmp, end);
        self.set_label(otherwise);
        self.emit(Opcode::Pop);
        for arm in arms {
            if let NodeKind::ElseBranch { body: Some(body) } = &arm.kind {
                self.gen_block(body);
            }
        }
        self.set_label(end);
    }

    fn gen_multi_if(&mut self, arms: &[Node], span: Span) {
        if !self.check_arms(arms, span) {
            return;
        }
        let end = self.add_label();
        for arm in arms {
            match &arm.kind {
                NodeKind::IfBranch { cond, body } => {
                    self.gen_expr(cond);
                    let next = self.add_label();
                    self.emit_jump(Opcode::JmpF, next);
                    self.emit(Opcode::Pop);
                    if let Some(body) = body {
                        self.gen_block(body);
                    }
                    self.emit_jump(Opcode::Jmp, end);
                    self.set_label(next);
                    self.emit(Opcode::Pop);
                }
                NodeKind::ElseBranch { body: Some(body) } => self.gen_block(body),
                _ => {}
            }
        }
        self.set_label(end);
    }

    fn gen_switch(&mut self, cond: &Node, arms: &[Node], span: Span) {
        if !self.check_arms(arms, span) {
            return;
        }
        // The scrutinee evaluates once, into a dedicated local slot.
        self.gen_expr(cond);
        let slot = self.alloc_local(span);
        self.emit(Opcode::Store);
        self.emit_byte(slot);
        self.emit(Opcode::Pop);

        let mut cases: Vec<(&Node, Option<&Node>, usize)> = Vec::new();
        let mut else_body = None;
        for arm in arms {
            match &arm.kind {
                NodeKind::SwitchCase { value, body } => {
                    if !matches!(
                        value.kind,
                        NodeKind::Number | NodeKind::True | NodeKind::False
                    ) {
                        self.errors
                            .push(errors::switch_case_not_literal(value.span));
                        continue;
                    }
                    let label = self.add_label();
                    cases.push((value, body.as_deref(), label));
                }
                NodeKind::ElseBranch { body } => else_body = body.as_deref(),
                _ => {}
            }
        }

        for (value, _, label) in &cases {
            self.emit(Opcode::Load);
            self.emit_byte(slot);
            self.gen_expr(value);
            self.emit(Opcode::CmpEq);
            self.emit_jump(Opcode::JmpT, *label);
            self.emit(Opcode::Pop);
        }
        let end = self.add_label();
        if let Some(body) = else_body {
            self.gen_block(body);
        }
        self.emit_jump(Opcode::Jmp, end);

        for (_, body, label) in &cases {
            self.set_label(*label);
            self.emit(Opcode::Pop);
            if let Some(body) = body {
                self.gen_block(body);
            }
            self.emit_jump(Opcode::Jmp, end);
        }
        self.set_label(end);
    }

    // ========================================================================
    // Choices
    // ========================================================================

    fn gen_choice_group(&mut self, node: &Node) {
        let NodeKind::ChoiceGroup(branches) = &node.kind else {
            return;
        };

        // Menu: each branch contributes its display text and numeric id.
        for (id, branch) in branches.iter().enumerate() {
            let Some((expr, _)) = branch_parts(branch) else {
                continue;
            };
            if let NodeKind::ChoiceExpr { start, option, .. } = &expr.kind {
                for part in [start, option] {
                    if let Some(part) = part {
                        self.gen_text_push(part);
                    }
                }
            }
            self.emit_const(Value::Int(id as i64), branch.span);
            self.emit(Opcode::ChoicePush);
        }
        self.emit(Opcode::Flush);

        // Dispatch on the chosen id.
        let labels: Vec<usize> = branches.iter().map(|_| self.add_label()).collect();
        for (id, label) in labels.iter().enumerate() {
            self.emit(Opcode::LoadChoiceId);
            self.emit_const(Value::Int(id as i64), node.span);
            self.emit(Opcode::CmpEq);
            self.emit_jump(Opcode::JmpT, *label);
            self.emit(Opcode::Pop);
        }
        self.emit(Opcode::Exit);

        // Branch bodies: echo the chosen text, run the body, rejoin at the
        // gather point.
        for (id, branch) in branches.iter().enumerate() {
            self.set_label(labels[id]);
            self.emit(Opcode::Pop);
            let Some((expr, body)) = branch_parts(branch) else {
                continue;
            };
            if let NodeKind::ChoiceExpr { start, inner, .. } = &expr.kind {
                for part in [start, inner] {
                    if let Some(part) = part {
                        self.gen_text_push(part);
                    }
                }
            }
            self.emit(Opcode::Line);
            self.emit(Opcode::Flush);
            if let Some(body) = body {
                self.gen_block(body);
            }
            let exit = self.exit_label;
            self.emit_jump(Opcode::Jmp, exit);
        }
    }

    fn gen_gathered(&mut self, group: &Node) {
        let saved = self.exit_label;
        self.exit_label = self.add_label();
        self.gen_choice_group(group);
        let gather = self.exit_label;
        self.set_label(gather);
        self.exit_label = saved;
    }

    fn gen_text_push(&mut self, part: &Node) {
        if let NodeKind::Text = part.kind {
            let text = part.span.text(self.source).to_string();
            self.emit_const(Value::string(text), part.span);
            self.emit(Opcode::ContentPush);
        }
    }
}

fn branch_parts(branch: &Node) -> Option<(&Node, Option<&Node>)> {
    match &branch.kind {
        NodeKind::ChoiceStar { expr, body } | NodeKind::ChoicePlus { expr, body } => {
            Some((expr, body.as_deref()))
        }
        _ => None,
    }
}

fn parse_number(text: &str) -> Option<Value> {
    if text.contains('.') {
        text.parse::<f64>().ok().map(Value::Float)
    } else {
        text.parse::<i64>().ok().map(Value::Int)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ink_syntax::parser;

    fn compile_src(source: &str) -> Result<Program, Vec<CompileError>> {
        let file = parser::parse(source);
        assert!(!file.has_errors(), "parse errors: {:?}", file.errors);
        generate(source, &file)
    }

    fn compile_errors(source: &str) -> Vec<CompileError> {
        compile_src(source).expect_err("expected semantic errors")
    }

    #[test]
    fn file_content_becomes_the_start_path() {
        let program = compile_src("Hello there.\n").unwrap();
        assert!(program.get(DEFAULT_PATH).is_some());
        let asm = program.disassemble();
        assert!(asm.contains("content_push"));
        assert!(asm.contains("'Hello there.'"));
    }

    #[test]
    fn knots_and_stitches_get_qualified_paths() {
        let program = compile_src("-> hike\n== hike ==\nUp we go.\n= summit\nMade it.\n").unwrap();
        assert!(program.get("hike").is_some());
        assert!(program.get("hike.summit").is_some());
    }

    #[test]
    fn functions_compile_with_arity() {
        let program = compile_src("== function add(a, b) ==\n~ return a + b\n").unwrap();
        let path = program.get("add").unwrap();
        assert_eq!(path.arity, 2);
    }

    #[test]
    fn unknown_divert_target_is_reported() {
        let errors = compile_errors("-> nowhere\n");
        assert!(errors[0].message.contains("nowhere"));
    }

    #[test]
    fn assigning_a_constant_is_an_error() {
        let errors = compile_errors("CONST limit = 3\n~ limit = 4\n");
        assert!(errors[0].message.contains("limit"));
    }

    #[test]
    fn redefining_a_knot_is_an_error() {
        let errors = compile_errors("== hike ==\nOne.\n== hike ==\nTwo.\n");
        assert!(errors[0].message.contains("hike"));
    }

    #[test]
    fn call_arity_is_checked() {
        let errors = compile_errors("== function dbl(x) ==\n~ return x * 2\n== top ==\n~ dbl(1, 2)\n");
        assert!(errors[0].message.contains("too many arguments"));
    }

    #[test]
    fn temps_use_stack_slots() {
        let program = compile_src("== hike ==\n~ temp steps = 3\nWalked {steps} steps.\n").unwrap();
        let path = program.get("hike").unwrap();
        assert_eq!(path.locals, 1);
        let asm = program.disassemble();
        assert!(asm.contains("store"));
        assert!(asm.contains("load"));
    }
}
