//! Runtime values for the interpreter

use std::fmt;
use std::rc::Rc;

use crate::ast::{Expr, Literal};
use crate::common::NodeId;

use super::env::Environment;

/// Runtime value
///
/// Values are immutable once constructed. Cloning is cheap: procedures are
/// shared behind an `Rc`.
#[derive(Clone)]
pub enum Value {
    /// Unit value `()`, the result of statements with nothing to return
    Unit,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// Procedure closure
    Proc(Rc<Procedure>),
}

/// A procedure together with the environment it was created in
pub struct Procedure {
    /// Node that produced this closure
    pub origin: NodeId,
    pub params: Vec<String>,
    pub body: Rc<Expr>,
    pub env: Environment,
}

impl Procedure {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Debug for Procedure {
    // The captured environment may contain this procedure; don't print it
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("origin", &self.origin)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Value {
    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Proc(_) => "procedure",
        }
    }

    /// Whether both values are of the same kind
    pub fn same_kind(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    /// Try to get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as procedure
    pub fn as_proc(&self) -> Option<&Rc<Procedure>> {
        match self {
            Value::Proc(p) => Some(p),
            _ => None,
        }
    }
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        match lit {
            Literal::Int(n) => Value::Int(n),
            Literal::Bool(b) => Value::Bool(b),
            Literal::Unit => Value::Unit,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Proc(p) => write!(f, "<proc/{} {}>", p.arity(), p.origin),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Proc(p) => write!(f, "<proc/{}>", p.arity()),
        }
    }
}

/// Structural equality for scalars; procedures compare by identity
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Proc(a), Value::Proc(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
