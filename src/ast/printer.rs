//! Renders an AST back to SMPL source
//!
//! Output re-parses to an equivalent tree. Parentheses are inserted only where
//! precedence or a trailing `if`/`proc` would otherwise change the parse.

use super::*;

/// Source printer; stateless, so the context is `()`
#[derive(Debug, Default, Clone, Copy)]
pub struct Printer;

impl Printer {
    /// Print an operand, parenthesised when it would not bind tightly enough
    fn operand(&mut self, expr: &Expr, parent_prec: u8, is_right: bool) -> String {
        let text = expr.accept(self, &());
        let needs_parens = match expr {
            Expr::Binary(b) => {
                let prec = b.op.precedence();
                prec < parent_prec || (is_right && prec == parent_prec)
            }
            Expr::If(_) | Expr::Proc(_) | Expr::Assign(_) => true,
            _ => false,
        };
        if needs_parens {
            format!("({text})")
        } else {
            text
        }
    }

    /// Print a node in a slot that takes an expression but not a statement
    fn expr_slot(&mut self, expr: &Expr) -> String {
        let text = expr.accept(self, &());
        if matches!(expr, Expr::Assign(_)) {
            format!("({text})")
        } else {
            text
        }
    }

    /// Print an if branch; a branch ending in an else-less `if` would steal
    /// the following `else` unless wrapped
    fn branch(&mut self, expr: &Expr, followed_by_else: bool) -> String {
        let text = expr.accept(self, &());
        if followed_by_else && ends_with_open_if(expr) {
            format!("({text})")
        } else {
            text
        }
    }
}

/// Whether the rightmost tail of `expr` is an `if` without an else branch
fn ends_with_open_if(expr: &Expr) -> bool {
    match expr {
        Expr::If(stmt) => stmt.else_branch().is_none_or(ends_with_open_if),
        // Assignments in these slots are already parenthesised
        Expr::Proc(p) => !matches!(*p.body, Expr::Assign(_)) && ends_with_open_if(&p.body),
        Expr::Assign(a) => !matches!(*a.value, Expr::Assign(_)) && ends_with_open_if(&a.value),
        _ => false,
    }
}

impl Visitor<()> for Printer {
    type Output = String;

    fn visit_program(&mut self, program: &Program, ctx: &()) -> String {
        program.seq.accept(self, ctx)
    }

    fn visit_stmt_sequence(&mut self, seq: &StmtSequence, ctx: &()) -> String {
        seq.stmts
            .iter()
            .map(|stmt| stmt.accept(self, ctx))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn visit_if_statement(&mut self, stmt: &IfStatement, ctx: &()) -> String {
        let cond = self.expr_slot(stmt.condition());
        let body = self.branch(stmt.body(), stmt.has_else());
        match stmt.else_branch() {
            Some(other) => {
                let other = self.branch(other, false);
                format!("if {cond} then {body} else {other}")
            }
            None => format!("if {cond} then {body}"),
        }
    }

    fn visit_assignment(&mut self, stmt: &Assignment, _ctx: &()) -> String {
        format!("{} := {}", stmt.name, self.expr_slot(&stmt.value))
    }

    fn visit_literal(&mut self, expr: &LiteralExpr, _ctx: &()) -> String {
        match expr.value {
            Literal::Int(n) => n.to_string(),
            Literal::Bool(b) => b.to_string(),
            Literal::Unit => "()".to_string(),
        }
    }

    fn visit_ident(&mut self, expr: &IdentExpr, _ctx: &()) -> String {
        expr.name.clone()
    }

    fn visit_unary(&mut self, expr: &UnaryExpr, _ctx: &()) -> String {
        // Unary binds tighter than every binary operator
        let operand = self.operand(&expr.operand, u8::MAX, false);
        match expr.op {
            UnaryOp::Neg => format!("-{operand}"),
            UnaryOp::Not => format!("not {operand}"),
        }
    }

    fn visit_binary(&mut self, expr: &BinaryExpr, _ctx: &()) -> String {
        let prec = expr.op.precedence();
        let left = self.operand(&expr.left, prec, false);
        let right = self.operand(&expr.right, prec, true);
        format!("{left} {} {right}", expr.op.symbol())
    }

    fn visit_proc(&mut self, expr: &ProcExpr, _ctx: &()) -> String {
        format!("proc({}) {}", expr.params.join(", "), self.expr_slot(&expr.body))
    }

    fn visit_call(&mut self, expr: &CallExpr, ctx: &()) -> String {
        let callee = match expr.callee.as_ref() {
            // `-5(x)` would negate the call
            Expr::Literal(LiteralExpr {
                value: Literal::Int(n),
                ..
            }) if *n < 0 => format!("({n})"),
            Expr::Ident(_) | Expr::Call(_) | Expr::Block(_) | Expr::Literal(_) => {
                expr.callee.accept(self, ctx)
            }
            other => format!("({})", other.accept(self, ctx)),
        };
        let args = expr
            .args
            .iter()
            .map(|arg| self.expr_slot(arg))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{callee}({args})")
    }

    fn visit_block(&mut self, expr: &BlockExpr, ctx: &()) -> String {
        if expr.seq.is_empty() {
            "{ }".to_string()
        } else {
            format!("{{ {} }}", expr.seq.accept(self, ctx))
        }
    }
}
