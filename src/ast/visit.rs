//! Visitor dispatch
//!
//! A [`Visitor`] supplies one handler per node kind. Each node routes itself
//! to the matching handler through [`Accept::accept`], passing the visitor's
//! context through untouched. The context type is chosen by the visitor: the
//! evaluator threads an [`Environment`](crate::interp::Environment), the
//! printer uses `()`.

use super::*;

/// Per-node-kind handlers for one traversal
pub trait Visitor<C: ?Sized> {
    type Output;

    fn visit_program(&mut self, program: &Program, ctx: &C) -> Self::Output;
    fn visit_stmt_sequence(&mut self, seq: &StmtSequence, ctx: &C) -> Self::Output;
    fn visit_if_statement(&mut self, stmt: &IfStatement, ctx: &C) -> Self::Output;
    fn visit_assignment(&mut self, stmt: &Assignment, ctx: &C) -> Self::Output;
    fn visit_literal(&mut self, expr: &LiteralExpr, ctx: &C) -> Self::Output;
    fn visit_ident(&mut self, expr: &IdentExpr, ctx: &C) -> Self::Output;
    fn visit_unary(&mut self, expr: &UnaryExpr, ctx: &C) -> Self::Output;
    fn visit_binary(&mut self, expr: &BinaryExpr, ctx: &C) -> Self::Output;
    fn visit_proc(&mut self, expr: &ProcExpr, ctx: &C) -> Self::Output;
    fn visit_call(&mut self, expr: &CallExpr, ctx: &C) -> Self::Output;
    fn visit_block(&mut self, expr: &BlockExpr, ctx: &C) -> Self::Output;
}

/// Route a node to the visitor handler for its own kind
pub trait Accept {
    fn accept<C, V>(&self, visitor: &mut V, ctx: &C) -> V::Output
    where
        C: ?Sized,
        V: Visitor<C> + ?Sized;
}

impl Accept for Program {
    fn accept<C, V>(&self, visitor: &mut V, ctx: &C) -> V::Output
    where
        C: ?Sized,
        V: Visitor<C> + ?Sized,
    {
        visitor.visit_program(self, ctx)
    }
}

impl Accept for StmtSequence {
    fn accept<C, V>(&self, visitor: &mut V, ctx: &C) -> V::Output
    where
        C: ?Sized,
        V: Visitor<C> + ?Sized,
    {
        visitor.visit_stmt_sequence(self, ctx)
    }
}

impl Accept for Expr {
    fn accept<C, V>(&self, visitor: &mut V, ctx: &C) -> V::Output
    where
        C: ?Sized,
        V: Visitor<C> + ?Sized,
    {
        match self {
            Expr::Literal(e) => visitor.visit_literal(e, ctx),
            Expr::Ident(e) => visitor.visit_ident(e, ctx),
            Expr::Unary(e) => visitor.visit_unary(e, ctx),
            Expr::Binary(e) => visitor.visit_binary(e, ctx),
            Expr::Proc(e) => visitor.visit_proc(e, ctx),
            Expr::Call(e) => visitor.visit_call(e, ctx),
            Expr::Block(e) => visitor.visit_block(e, ctx),
            Expr::If(e) => visitor.visit_if_statement(e, ctx),
            Expr::Assign(e) => visitor.visit_assignment(e, ctx),
        }
    }
}

macro_rules! impl_accept {
    ($($node:ty => $method:ident),* $(,)?) => {
        $(
            impl Accept for $node {
                fn accept<C, V>(&self, visitor: &mut V, ctx: &C) -> V::Output
                where
                    C: ?Sized,
                    V: Visitor<C> + ?Sized,
                {
                    visitor.$method(self, ctx)
                }
            }
        )*
    };
}

impl_accept! {
    IfStatement => visit_if_statement,
    Assignment => visit_assignment,
    LiteralExpr => visit_literal,
    IdentExpr => visit_ident,
    UnaryExpr => visit_unary,
    BinaryExpr => visit_binary,
    ProcExpr => visit_proc,
    CallExpr => visit_call,
    BlockExpr => visit_block,
}
