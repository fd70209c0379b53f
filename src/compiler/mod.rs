//! Source-to-bytecode compilation.

mod codegen;
mod symbols;

use ink_syntax::ast::SourceFile;
use ink_syntax::diagnostics::CompileError;
use ink_syntax::parser;

use crate::runtime::Program;

/// Compile an Ink source buffer into a runnable program.
///
/// Syntax errors abort before code generation; semantic errors are collected
/// across the whole file.
pub fn compile(source: &str) -> Result<Program, Vec<CompileError>> {
    let file = parser::parse(source);
    if file.has_errors() {
        return Err(file.errors);
    }
    codegen::generate(source, &file)
}

/// Generate bytecode for an already-parsed file.
///
/// Callers that need the tree for other purposes (the `--dump-ast` flag)
/// parse once and hand the result here.
pub fn generate(source: &str, file: &SourceFile) -> Result<Program, Vec<CompileError>> {
    codegen::generate(source, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_stop_compilation() {
        let errors = compile("Unbalanced {\n").expect_err("expected syntax errors");
        assert!(!errors.is_empty());
    }

    #[test]
    fn clean_sources_compile() {
        assert!(compile("A quiet morning.\n").is_ok());
    }
}
