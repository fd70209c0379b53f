#![forbid(unsafe_code)]
//! Ink Narrative Language Compiler
//!
//! Ink is a scripting language for branching interactive fiction. This crate
//! provides the compiler pipeline (parsing via `ink_syntax`, bytecode
//! generation) and the story virtual machine that plays compiled stories.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module
//!   enforces `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents a compiler bug (logic error), use `debug_assert!` with a
//!   clear explanation and recover with a recorded diagnostic.

pub mod cli;
pub mod compiler;
pub mod runtime;
pub mod version;

pub use compiler::compile;
pub use runtime::{Program, RuntimeError, Story, Value};
