//! Diagnostic reporting with source locations
//!
//! Front-end errors (lexing and parsing) are reported through miette with the
//! offending source attached. Runtime errors live in [`crate::interp::RuntimeError`].

use crate::common::Span;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::sync::Arc;
use thiserror::Error;

/// Name used for source text that did not come from a file
pub const ANONYMOUS_SOURCE: &str = "<input>";

/// Source file for error reporting
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: Arc<str>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Arc::from(content.into()),
        }
    }

    pub fn anonymous(content: impl Into<String>) -> Self {
        Self::new(ANONYMOUS_SOURCE, content)
    }

    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.content.to_string())
    }
}

/// Convert our Span to miette's SourceSpan
impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new(span.start.into(), span.len())
    }
}

/// Lexing and parsing diagnostic
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CompileError {
    // === Lex Errors ===
    #[error("Unexpected character `{text}`")]
    #[diagnostic(code(lex::unexpected_char))]
    UnexpectedChar {
        text: String,
        #[label("not valid SMPL")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Integer literal `{text}` does not fit in 64 bits")]
    #[diagnostic(code(lex::invalid_integer))]
    InvalidInteger {
        text: String,
        #[label("out of range")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    // === Parse Errors ===
    #[error("Unexpected token: expected {expected}, found {found}")]
    #[diagnostic(code(parse::unexpected_token))]
    UnexpectedToken {
        expected: String,
        found: String,
        #[label("unexpected token here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Expression nested more than {limit} levels deep")]
    #[diagnostic(
        code(parse::nesting_too_deep),
        help("split the expression into smaller statements")
    )]
    NestingTooDeep {
        limit: usize,
        #[label("too deep here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Unexpected end of input: expected {expected}")]
    #[diagnostic(code(parse::unexpected_eof))]
    UnexpectedEof {
        expected: String,
        #[label("expected more tokens")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },
}

impl CompileError {
    /// Diagnostic code as a plain string, e.g. `parse::unexpected_token`
    pub fn code_str(&self) -> &'static str {
        match self {
            CompileError::UnexpectedChar { .. } => "lex::unexpected_char",
            CompileError::InvalidInteger { .. } => "lex::invalid_integer",
            CompileError::UnexpectedToken { .. } => "parse::unexpected_token",
            CompileError::UnexpectedEof { .. } => "parse::unexpected_eof",
            CompileError::NestingTooDeep { .. } => "parse::nesting_too_deep",
        }
    }

    /// Location of the error in the source
    pub fn span(&self) -> SourceSpan {
        match self {
            CompileError::UnexpectedChar { span, .. }
            | CompileError::InvalidInteger { span, .. }
            | CompileError::UnexpectedToken { span, .. }
            | CompileError::UnexpectedEof { span, .. }
            | CompileError::NestingTooDeep { span, .. } => *span,
        }
    }
}
