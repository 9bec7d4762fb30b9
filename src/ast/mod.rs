//! Abstract Syntax Tree for the SMPL language
//!
//! Nodes carry data only. Every traversal (evaluation, printing, analysis)
//! is a [`Visitor`] that the node dispatches to through [`Accept`].
//!
//! Statements are expressions: [`Expr`] is the abstract parent of every node
//! that can appear in a statement sequence, including [`IfStatement`] and
//! [`Assignment`], which evaluate to unit when they have nothing better to
//! produce.
//!
//! Nodes are `Clone`, but a clone keeps the [`NodeId`] of its original.
//! Anything keyed by node identity treats the two as one node.

mod printer;
mod visit;

pub use printer::Printer;
pub use visit::{Accept, Visitor};

use crate::common::{NodeId, Span};
use serde::Serialize;
use std::fmt;
use std::rc::Rc;

/// Top-level entry: one statement sequence
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub id: NodeId,
    pub seq: StmtSequence,
    pub span: Span,
}

impl Program {
    pub fn new(seq: StmtSequence) -> Self {
        Self {
            id: NodeId::fresh(),
            span: seq.span,
            seq,
        }
    }

    /// Build a program directly from its statements
    pub fn from_stmts(stmts: Vec<Expr>) -> Self {
        Self::new(StmtSequence::new(stmts))
    }

    pub fn seq(&self) -> &StmtSequence {
        &self.seq
    }
}

/// Ordered statements, executed left to right
#[derive(Debug, Clone, Serialize)]
pub struct StmtSequence {
    pub id: NodeId,
    pub stmts: Vec<Expr>,
    pub span: Span,
}

impl StmtSequence {
    pub fn new(stmts: Vec<Expr>) -> Self {
        let span = stmts
            .iter()
            .fold(Span::DUMMY, |acc, stmt| acc.merge(stmt.span()));
        Self {
            id: NodeId::fresh(),
            stmts,
            span,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }
}

/// Expression; the abstract parent of every statement-level node
#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    Literal(LiteralExpr),
    Ident(IdentExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Proc(ProcExpr),
    Call(CallExpr),
    Block(BlockExpr),
    If(IfStatement),
    Assign(Assignment),
}

// ==================== LEAVES ====================

/// Literal payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Unit,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiteralExpr {
    pub id: NodeId,
    pub value: Literal,
    pub span: Span,
}

/// Reference to a bound name
#[derive(Debug, Clone, Serialize)]
pub struct IdentExpr {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}

// ==================== OPERATORS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "not",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    /// Binding strength; all binary operators are left-associative
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnaryExpr {
    pub id: NodeId,
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct BinaryExpr {
    pub id: NodeId,
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub span: Span,
}

// ==================== PROCEDURES ====================

/// `proc(a, b) body`
///
/// The body sits behind an `Rc` so a procedure value can keep it alive
/// after the program that defined it has been dropped.
#[derive(Debug, Clone, Serialize)]
pub struct ProcExpr {
    pub id: NodeId,
    pub params: Vec<String>,
    pub body: Rc<Expr>,
    pub span: Span,
}

/// `callee(args...)`
#[derive(Debug, Clone, Serialize)]
pub struct CallExpr {
    pub id: NodeId,
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    pub span: Span,
}

/// `{ seq }`, evaluated in a nested scope
#[derive(Debug, Clone, Serialize)]
pub struct BlockExpr {
    pub id: NodeId,
    pub seq: StmtSequence,
    pub span: Span,
}

// ==================== STATEMENTS ====================

/// `if cond then body [else other]`
///
/// Branches are expressions and run in the enclosing scope.
#[derive(Debug, Clone, Serialize)]
pub struct IfStatement {
    id: NodeId,
    condition: Box<Expr>,
    body: Box<Expr>,
    else_branch: Option<Box<Expr>>,
    span: Span,
}

impl IfStatement {
    /// If-statement with an else branch
    pub fn new(condition: Expr, body: Expr, else_branch: Expr) -> Self {
        Self::build(condition, body, Some(else_branch))
    }

    /// If-statement without an else branch; yields unit when the condition is false
    pub fn without_else(condition: Expr, body: Expr) -> Self {
        Self::build(condition, body, None)
    }

    fn build(condition: Expr, body: Expr, else_branch: Option<Expr>) -> Self {
        let span = condition
            .span()
            .merge(body.span())
            .merge(else_branch.as_ref().map_or(Span::DUMMY, Expr::span));
        Self {
            id: NodeId::fresh(),
            condition: Box::new(condition),
            body: Box::new(body),
            else_branch: else_branch.map(Box::new),
            span,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn condition(&self) -> &Expr {
        &self.condition
    }

    pub fn body(&self) -> &Expr {
        &self.body
    }

    pub fn else_branch(&self) -> Option<&Expr> {
        self.else_branch.as_deref()
    }

    pub fn has_else(&self) -> bool {
        self.else_branch.is_some()
    }
}

/// `name := value`, binding in the current scope
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub id: NodeId,
    pub name: String,
    pub value: Box<Expr>,
    pub span: Span,
}

// ==================== CONSTRUCTORS ====================

impl Expr {
    pub fn int(value: i64) -> Self {
        Self::literal(Literal::Int(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::literal(Literal::Bool(value))
    }

    pub fn unit() -> Self {
        Self::literal(Literal::Unit)
    }

    pub fn literal(value: Literal) -> Self {
        Expr::Literal(LiteralExpr {
            id: NodeId::fresh(),
            value,
            span: Span::DUMMY,
        })
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(IdentExpr {
            id: NodeId::fresh(),
            name: name.into(),
            span: Span::DUMMY,
        })
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        let span = operand.span();
        Expr::Unary(UnaryExpr {
            id: NodeId::fresh(),
            op,
            operand: Box::new(operand),
            span,
        })
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        let span = left.span().merge(right.span());
        Expr::Binary(BinaryExpr {
            id: NodeId::fresh(),
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        })
    }

    pub fn proc(params: Vec<String>, body: Expr) -> Self {
        let span = body.span();
        Expr::Proc(ProcExpr {
            id: NodeId::fresh(),
            params,
            body: Rc::new(body),
            span,
        })
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        let span = args
            .iter()
            .fold(callee.span(), |acc, arg| acc.merge(arg.span()));
        Expr::Call(CallExpr {
            id: NodeId::fresh(),
            callee: Box::new(callee),
            args,
            span,
        })
    }

    pub fn block(stmts: Vec<Expr>) -> Self {
        let seq = StmtSequence::new(stmts);
        Expr::Block(BlockExpr {
            id: NodeId::fresh(),
            span: seq.span,
            seq,
        })
    }

    pub fn if_then(condition: Expr, body: Expr) -> Self {
        Expr::If(IfStatement::without_else(condition, body))
    }

    pub fn if_then_else(condition: Expr, body: Expr, else_branch: Expr) -> Self {
        Expr::If(IfStatement::new(condition, body, else_branch))
    }

    pub fn assign(name: impl Into<String>, value: Expr) -> Self {
        let span = value.span();
        Expr::Assign(Assignment {
            id: NodeId::fresh(),
            name: name.into(),
            value: Box::new(value),
            span,
        })
    }

    // ==================== ACCESSORS ====================

    pub fn id(&self) -> NodeId {
        match self {
            Expr::Literal(e) => e.id,
            Expr::Ident(e) => e.id,
            Expr::Unary(e) => e.id,
            Expr::Binary(e) => e.id,
            Expr::Proc(e) => e.id,
            Expr::Call(e) => e.id,
            Expr::Block(e) => e.id,
            Expr::If(e) => e.id(),
            Expr::Assign(e) => e.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(e) => e.span,
            Expr::Ident(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Proc(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Block(e) => e.span,
            Expr::If(e) => e.span(),
            Expr::Assign(e) => e.span,
        }
    }

    /// Replace the span recorded on this node
    pub fn with_span(self, span: Span) -> Self {
        match self {
            Expr::Literal(e) => Expr::Literal(LiteralExpr { span, ..e }),
            Expr::Ident(e) => Expr::Ident(IdentExpr { span, ..e }),
            Expr::Unary(e) => Expr::Unary(UnaryExpr { span, ..e }),
            Expr::Binary(e) => Expr::Binary(BinaryExpr { span, ..e }),
            Expr::Proc(e) => Expr::Proc(ProcExpr { span, ..e }),
            Expr::Call(e) => Expr::Call(CallExpr { span, ..e }),
            Expr::Block(e) => Expr::Block(BlockExpr { span, ..e }),
            Expr::If(e) => Expr::If(e.with_span(span)),
            Expr::Assign(e) => Expr::Assign(Assignment { span, ..e }),
        }
    }

    /// Whether this node is a statement form rather than a pure expression
    pub fn is_statement(&self) -> bool {
        matches!(self, Expr::If(_) | Expr::Assign(_))
    }

    /// Short name of the node kind, used in logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Literal(_) => "literal",
            Expr::Ident(_) => "identifier",
            Expr::Unary(_) => "unary",
            Expr::Binary(_) => "binary",
            Expr::Proc(_) => "proc",
            Expr::Call(_) => "call",
            Expr::Block(_) => "block",
            Expr::If(_) => "if",
            Expr::Assign(_) => "assignment",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.accept(&mut Printer, &()))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.accept(&mut Printer, &()))
    }
}
