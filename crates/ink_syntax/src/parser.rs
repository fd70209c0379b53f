//! Parser for Ink source files.
//!
//! Converts source text into an AST. Ink's block structure is not delimited
//! by indentation or braces: choice branches (`*`, `+`) and gather points
//! (`-`) carry nesting levels given by their marker count, and the parser
//! reconstructs the tree by keeping stacks of open blocks and open choice
//! groups alongside a scratch stack of finished statements. When a statement
//! arrives at a shallower level, the deeper blocks and choice groups are
//! collected off the scratch stack and attached to their parent branches.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use ink_syntax::parser;
//!
//! let file = parser::parse("Hello, world!\n");
//! assert!(!file.has_errors());
//! ```

use tracing::debug;

use crate::ast::{BinaryOp, Node, NodeKind, SourceFile, Span, UnaryOp};
use crate::diagnostics::{CompileError, errors};
use crate::lexer::{GrammarMode, Lexer};
use crate::token::{Token, TokenKind};

// NOTE: This module is split across multiple files using `include!` to keep
// all parser methods in the same Rust module (preserving privacy + call
// patterns) while avoiding a single large source file.

include!("parser/core.rs");
include!("parser/helpers.rs");
include!("parser/collect.rs");
include!("parser/exprs.rs");
include!("parser/content.rs");
include!("parser/stmts.rs");
include!("parser/tests.rs");
