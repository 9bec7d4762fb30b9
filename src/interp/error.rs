//! Runtime errors raised by the evaluator
//!
//! Errors carry an optional labelled span forwarded from the AST. Hosts attach
//! the source text when rendering:
//!
//! ```ignore
//! let report = miette::Report::new(err).with_source_code(source);
//! ```

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::common::Span;

use super::value::Value;

/// Tag of a [`RuntimeError`], for callers that only care about the category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnboundIdentifier,
    TypeMismatch,
    ArityMismatch,
    DivisionByZero,
    Overflow,
    RecursionLimit,
    Interrupted,
    Internal,
}

/// Evaluation failure
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Unbound identifier `{name}`")]
    #[diagnostic(
        code(eval::unbound_identifier),
        help("bind the name first with `name := value`")
    )]
    UnboundIdentifier {
        name: String,
        #[label("not bound in any enclosing scope")]
        span: Option<SourceSpan>,
    },

    #[error("Type mismatch in {context}: expected {expected}, found {got}")]
    #[diagnostic(code(eval::type_mismatch))]
    TypeMismatch {
        expected: String,
        got: String,
        /// Where the mismatch happened, e.g. `condition`
        context: String,
        #[label("this is {got}")]
        span: Option<SourceSpan>,
    },

    #[error("Arity mismatch: procedure expects {expected} argument(s), got {got}")]
    #[diagnostic(code(eval::arity_mismatch))]
    ArityMismatch {
        expected: usize,
        got: usize,
        #[label("called here")]
        span: Option<SourceSpan>,
    },

    #[error("Division by zero")]
    #[diagnostic(code(eval::division_by_zero))]
    DivisionByZero {
        #[label("divisor is zero")]
        span: Option<SourceSpan>,
    },

    #[error("Integer overflow in `{op}`")]
    #[diagnostic(code(eval::overflow))]
    Overflow {
        op: String,
        #[label("result does not fit in 64 bits")]
        span: Option<SourceSpan>,
    },

    #[error("Recursion limit of {limit} nested calls exceeded")]
    #[diagnostic(
        code(eval::recursion_limit),
        help("raise `max_call_depth` in smpl.toml or pass --max-call-depth")
    )]
    RecursionLimit {
        limit: usize,
        #[label("this call went too deep")]
        span: Option<SourceSpan>,
    },

    #[error("Evaluation interrupted")]
    #[diagnostic(code(eval::interrupted))]
    Interrupted,

    #[error("Internal error: {detail}")]
    #[diagnostic(code(eval::internal))]
    Internal { detail: String },
}

/// Spans of synthesised nodes carry no location
fn label(span: Span) -> Option<SourceSpan> {
    if span.is_dummy() {
        None
    } else {
        Some(span.into())
    }
}

impl RuntimeError {
    pub fn unbound(name: impl Into<String>, span: Span) -> Self {
        RuntimeError::UnboundIdentifier {
            name: name.into(),
            span: label(span),
        }
    }

    pub fn type_mismatch(
        expected: impl Into<String>,
        got: &Value,
        context: impl Into<String>,
        span: Span,
    ) -> Self {
        RuntimeError::TypeMismatch {
            expected: expected.into(),
            got: got.type_name().to_string(),
            context: context.into(),
            span: label(span),
        }
    }

    pub fn arity(expected: usize, got: usize, span: Span) -> Self {
        RuntimeError::ArityMismatch {
            expected,
            got,
            span: label(span),
        }
    }

    pub fn division_by_zero(span: Span) -> Self {
        RuntimeError::DivisionByZero { span: label(span) }
    }

    pub fn overflow(op: impl Into<String>, span: Span) -> Self {
        RuntimeError::Overflow {
            op: op.into(),
            span: label(span),
        }
    }

    pub fn recursion_limit(limit: usize, span: Span) -> Self {
        RuntimeError::RecursionLimit {
            limit,
            span: label(span),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        RuntimeError::Internal {
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::UnboundIdentifier { .. } => ErrorKind::UnboundIdentifier,
            RuntimeError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            RuntimeError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            RuntimeError::DivisionByZero { .. } => ErrorKind::DivisionByZero,
            RuntimeError::Overflow { .. } => ErrorKind::Overflow,
            RuntimeError::RecursionLimit { .. } => ErrorKind::RecursionLimit,
            RuntimeError::Interrupted => ErrorKind::Interrupted,
            RuntimeError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Source location, when the failing node had one
    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            RuntimeError::UnboundIdentifier { span, .. }
            | RuntimeError::TypeMismatch { span, .. }
            | RuntimeError::ArityMismatch { span, .. }
            | RuntimeError::DivisionByZero { span }
            | RuntimeError::Overflow { span, .. }
            | RuntimeError::RecursionLimit { span, .. } => *span,
            RuntimeError::Interrupted | RuntimeError::Internal { .. } => None,
        }
    }

    /// Identifier involved in the failure, if any
    pub fn identifier(&self) -> Option<&str> {
        match self {
            RuntimeError::UnboundIdentifier { name, .. } => Some(name),
            _ => None,
        }
    }
}
