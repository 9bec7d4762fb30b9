//! Tree-walking interpreter for SMPL programs
//!
//! Walks the AST directly with an [`Evaluator`] visitor.

pub mod env;
pub mod error;
pub mod eval;
pub mod value;

pub use env::Environment;
pub use error::{ErrorKind, RuntimeError};
pub use eval::{Evaluator, Interrupt, evaluate};
pub use value::{Procedure, Value};
