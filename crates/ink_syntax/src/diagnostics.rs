//! Diagnostics and error reporting for Ink sources.
//!
//! [`CompileError`] is the shared error currency for the lexer, parser, and
//! the bytecode generator. Terminal rendering goes through miette so errors
//! show the offending source line with a labeled span.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::ast::Span;

/// A compile-time error with location information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub message: String,
    pub span: Span,
    pub kind: ErrorKind,
}

impl CompileError {
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            kind: ErrorKind::Syntax,
        }
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            kind: ErrorKind::Semantic,
        }
    }

    /// Convert to a miette report carrying the named source for rendering.
    pub fn to_report(&self, file_name: &str, source: &str) -> miette::Report {
        let span_len = self.span.end.saturating_sub(self.span.start).max(1);
        let report = LabeledReport {
            message: self.message.clone(),
            kind: self.kind,
            src: NamedSource::new(file_name, source.to_string()),
            span: SourceSpan::new(self.span.start.into(), span_len),
        };
        miette::Report::new(report)
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CompileError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Semantic,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Syntax => write!(f, "syntax error"),
            ErrorKind::Semantic => write!(f, "error"),
        }
    }
}

/// Internal miette carrier for a single [`CompileError`].
#[derive(Debug, Error, Diagnostic)]
#[error("{kind}: {message}")]
struct LabeledReport {
    message: String,
    kind: ErrorKind,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    span: SourceSpan,
}

// ============================================================================
// Error catalog
// ============================================================================

/// Constructors for the errors the frontend and code generator report.
pub mod errors {
    use super::*;

    pub fn unexpected_token(span: Span) -> CompileError {
        CompileError::syntax("unexpected token", span)
    }

    pub fn expected_newline(span: Span) -> CompileError {
        CompileError::syntax("expected newline", span)
    }

    pub fn expected_quote(span: Span) -> CompileError {
        CompileError::syntax("expected '\"'", span)
    }

    pub fn expected_identifier(span: Span) -> CompileError {
        CompileError::syntax("expected identifier", span)
    }

    pub fn expected_expr(span: Span) -> CompileError {
        CompileError::syntax("expected expression", span)
    }

    pub fn invalid_expr(span: Span) -> CompileError {
        CompileError::syntax("invalid expression", span)
    }

    pub fn too_many_params(span: Span) -> CompileError {
        CompileError::syntax("too many parameters", span)
    }

    pub fn unknown_identifier(name: &str, span: Span) -> CompileError {
        CompileError::semantic(format!("unknown identifier '{name}'"), span)
    }

    pub fn redefined_identifier(name: &str, span: Span) -> CompileError {
        CompileError::semantic(format!("'{name}' is already defined"), span)
    }

    pub fn too_few_args(name: &str, span: Span) -> CompileError {
        CompileError::semantic(format!("too few arguments to '{name}'"), span)
    }

    pub fn too_many_args(name: &str, span: Span) -> CompileError {
        CompileError::semantic(format!("too many arguments to '{name}'"), span)
    }

    pub fn const_assign(name: &str, span: Span) -> CompileError {
        CompileError::semantic(format!("cannot assign to constant '{name}'"), span)
    }

    pub fn invalid_lvalue(span: Span) -> CompileError {
        CompileError::semantic("invalid assignment target", span)
    }

    pub fn switch_case_not_literal(span: Span) -> CompileError {
        CompileError::semantic("switch case must be a literal value", span)
    }

    pub fn too_many_constants(span: Span) -> CompileError {
        CompileError::semantic("too many constants in one content path", span)
    }

    pub fn jump_too_large(span: Span) -> CompileError {
        CompileError::semantic("conditional body is too large", span)
    }

    pub fn too_many_locals(span: Span) -> CompileError {
        CompileError::semantic("too many locals in one content path", span)
    }

    pub fn conditional_empty(span: Span) -> CompileError {
        CompileError::semantic("conditional has no branches", span)
    }

    pub fn else_multiple(span: Span) -> CompileError {
        CompileError::semantic("conditional has more than one else branch", span)
    }

    pub fn else_not_final(span: Span) -> CompileError {
        CompileError::semantic("else branch must come last", span)
    }
}
