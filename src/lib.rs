//! SMPL: a tree-walking interpreter for a small teaching language
//!
//! # Architecture
//!
//! ```text
//! Source → Lexer → Parser → AST → Evaluator (visitor) → Value
//! ```
//!
//! The AST is plain data. Traversals are [`ast::Visitor`] implementations:
//! the [`interp::Evaluator`] folds a program into a [`interp::Value`] against
//! an [`interp::Environment`], and [`ast::Printer`] renders it back to source.
//!
//! # Example
//!
//! ```
//! let value = smpl::interpret("x := 4; if x > 3 then x * 2 else 0").unwrap();
//! assert_eq!(value, smpl::Value::Int(8));
//! ```

pub mod ast;
pub mod common;
pub mod config;
pub mod diagnostics;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;

// Re-export diagnostics for convenience
pub use diagnostics::{CompileError, SourceFile};

// Re-exports for convenience
pub use ast::Program;
pub use interp::{Environment, Evaluator, RuntimeError, Value, evaluate};

/// Interpreter version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lex and parse a source file
pub fn parse_source(file: &SourceFile) -> Result<Program, CompileError> {
    let tokens = lexer::lex_file(file)?;
    parser::parse_file(&tokens, file)
}

/// Parse source code to an AST
pub fn parse(source: &str) -> miette::Result<Program> {
    Ok(parse_source(&SourceFile::anonymous(source))?)
}

/// Interpret source code directly against a fresh global environment
pub fn interpret(source: &str) -> miette::Result<Value> {
    let program = parse(source)?;
    evaluate(&program).map_err(|err| miette::Report::new(err).with_source_code(source.to_string()))
}
