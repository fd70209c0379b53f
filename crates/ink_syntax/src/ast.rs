//! AST node definitions for Ink source files.
//!
//! Nodes are owned and carry byte spans into the original source. Leaf nodes
//! (words, identifiers, numbers) hold no text; their lexemes are recovered
//! from the source via [`Span`], which keeps content lines byte-exact.

use crate::diagnostics::CompileError;

/// A byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The source text this span covers.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start.min(source.len())..self.end.min(source.len())]
    }
}

/// Binary operators appearing in expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// The `?` containment operator.
    Contains,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

/// An AST node: a kind plus the span it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The shape of an AST node.
///
/// Choice branches (`ChoiceStar`/`ChoicePlus`) and conditional arms carry an
/// optional `body` that starts out `None`; the parser attaches a collected
/// [`NodeKind::Block`] once the branch's nested statements are known.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    File(Vec<Node>),
    Block(Vec<Node>),

    // ========== Content ==========
    /// One line of content: words, inline logic, diverts, glue.
    Content(Vec<Node>),
    ContentStmt(Box<Node>),
    /// A verbatim run of content text.
    Text,
    EmptyText,
    Glue,
    InlineLogic(Box<Node>),

    // ========== Choices and gathers ==========
    /// `*` choice branch. `level` is the marker count.
    ChoiceStar {
        expr: Box<Node>,
        body: Option<Box<Node>>,
    },
    /// `+` choice branch.
    ChoicePlus {
        expr: Box<Node>,
        body: Option<Box<Node>>,
    },
    /// A group of sibling choice branches at one level.
    ChoiceGroup(Vec<Node>),
    /// A choice group followed by the gather point that closes it.
    GatheredStmt {
        group: Box<Node>,
        gather: Box<Node>,
    },
    GatherPoint,
    /// The textual parts of a choice line: `start [option] inner`.
    ChoiceExpr {
        start: Option<Box<Node>>,
        option: Option<Box<Node>>,
        inner: Option<Box<Node>>,
    },

    // ========== Conditionals ==========
    /// `{cond: content}` inline form.
    IfExpr {
        cond: Box<Node>,
        content: Box<Node>,
    },
    /// `{cond:\n ...}` block form, with optional else arm.
    IfStmt {
        cond: Option<Box<Node>>,
        arms: Vec<Node>,
    },
    /// `{\n - cond: ...}` with a condition per arm.
    MultiIfStmt {
        arms: Vec<Node>,
    },
    /// `{expr:\n - value: ...}`.
    SwitchStmt {
        cond: Box<Node>,
        arms: Vec<Node>,
    },
    SwitchCase {
        value: Box<Node>,
        body: Option<Box<Node>>,
    },
    IfBranch {
        cond: Box<Node>,
        body: Option<Box<Node>>,
    },
    ElseBranch {
        body: Option<Box<Node>>,
    },

    // ========== Diverts ==========
    Divert(Box<Node>),
    DivertStmt(Box<Node>),

    // ========== Declarations ==========
    KnotProto {
        name: Box<Node>,
        params: Option<Box<Node>>,
    },
    StitchProto {
        name: Box<Node>,
        params: Option<Box<Node>>,
    },
    FuncProto {
        name: Box<Node>,
        params: Option<Box<Node>>,
    },
    KnotDecl {
        proto: Box<Node>,
        children: Vec<Node>,
    },
    StitchDecl {
        proto: Box<Node>,
        body: Option<Box<Node>>,
    },
    FuncDecl {
        proto: Box<Node>,
        body: Option<Box<Node>>,
    },
    ParamList(Vec<Node>),
    ParamDecl,
    RefParamDecl,
    VarDecl {
        name: Box<Node>,
        expr: Box<Node>,
    },
    ConstDecl {
        name: Box<Node>,
        expr: Box<Node>,
    },

    // ========== Logic statements ==========
    TempDecl {
        name: Box<Node>,
        expr: Box<Node>,
    },
    AssignStmt {
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    ExprStmt(Box<Node>),
    ReturnStmt(Option<Box<Node>>),

    // ========== Expressions ==========
    Identifier,
    Number,
    True,
    False,
    /// A quoted string literal; the inner text node may be absent when empty.
    StringExpr(Option<Box<Node>>),
    /// Dotted path, e.g. `knot.stitch`.
    SelectorExpr {
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    CallExpr {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
}

/// A parsed source file: the root node plus any errors recorded along the way.
///
/// Parsing always produces a tree. Callers must check `errors` before
/// compiling further.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub root: Node,
    pub errors: Vec<CompileError>,
}

impl SourceFile {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
