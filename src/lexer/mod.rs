//! Lexer for SMPL source text
//!
//! Token kinds are generated by `logos`; this module turns the raw stream
//! into owned [`Token`]s terminated by a single [`TokenKind::Eof`].

mod tokens;

pub use tokens::{Token, TokenKind};

use crate::common::Span;
use crate::diagnostics::{CompileError, SourceFile};
use logos::Logos;

/// Lex anonymous source text
pub fn lex(source: &str) -> Result<Vec<Token>, CompileError> {
    lex_file(&SourceFile::anonymous(source))
}

/// Lex a named source file
pub fn lex_file(file: &SourceFile) -> Result<Vec<Token>, CompileError> {
    let source: &str = &file.content;
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start, range.end);
        let text = lexer.slice();

        let kind = result.map_err(|()| CompileError::UnexpectedChar {
            text: text.to_string(),
            span: span.into(),
            src: file.to_named_source(),
        })?;

        // `-9223372036854775808` is i64::MIN; the parser folds the sign in
        if kind == TokenKind::IntLit && !integer_fits(text, tokens.last()) {
            return Err(CompileError::InvalidInteger {
                text: text.to_string(),
                span: span.into(),
                src: file.to_named_source(),
            });
        }

        tokens.push(Token {
            kind,
            span,
            text: text.to_string(),
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(source.len(), source.len()),
        text: String::new(),
    });

    tracing::trace!("lexed {} tokens from {}", tokens.len(), file.name);
    Ok(tokens)
}

/// Whether an integer literal is in range, allowing one extra unit of
/// magnitude directly after a `-`
fn integer_fits(text: &str, prev: Option<&Token>) -> bool {
    let digits = text.replace('_', "");
    if digits.parse::<i64>().is_ok() {
        return true;
    }
    prev.is_some_and(|t| t.kind == TokenKind::Minus) && format!("-{digits}").parse::<i64>().is_ok()
}
