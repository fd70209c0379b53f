//! Syntax frontend for the Ink narrative scripting language: lexer, parser,
//! AST, diagnostics.
//!
//! ## Notes
//! - This crate is intentionally "syntax-only": it does not resolve names,
//!   check arity, or lower to bytecode.
//! - Parsing never fails outright. [`parser::parse`] always yields a tree,
//!   with recorded errors attached; callers decide whether to proceed.
//!
//! ## Examples
//! ```rust,no_run
//! use ink_syntax::parser;
//!
//! let file = parser::parse("Hello, world!\n");
//! assert!(!file.has_errors());
//! ```

#![forbid(unsafe_code)]

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod token;
