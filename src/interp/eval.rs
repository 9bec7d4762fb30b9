//! Tree-walking evaluator
//!
//! The evaluator is the visitor whose context is an [`Environment`] and whose
//! result is a [`Value`]. Each handler is the only place its node kind's
//! semantics live. Errors propagate with `?` straight to the caller of
//! [`Evaluator::evaluate`]; nothing inside the evaluator recovers from them.

use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ast::*;
use crate::common::{Span, ensure_sufficient_stack};
use crate::config::EvalConfig;

use super::env::Environment;
use super::error::RuntimeError;
use super::value::{Procedure, Value};

/// Cancellation flag shared between a host and an evaluator
///
/// Checked before every statement; once triggered, evaluation stops with
/// [`RuntimeError::Interrupted`].
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Tree-walking evaluator
#[derive(Debug, Default)]
pub struct Evaluator {
    config: EvalConfig,
    interrupt: Option<Interrupt>,
    /// Procedure calls currently on the stack
    call_depth: usize,
    /// Statements started since creation
    statements: u64,
}

impl Evaluator {
    /// Create an evaluator with default limits
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Evaluator {
            config,
            ..Self::default()
        }
    }

    /// Attach a cancellation flag
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Number of statements this evaluator has started
    pub fn statements_executed(&self) -> u64 {
        self.statements
    }

    /// Evaluate a program against a fresh global environment
    ///
    /// The environment is released afterwards, so a procedure returned as
    /// the result no longer sees the program's bindings.
    pub fn evaluate(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        let env = Environment::new();
        let result = self.evaluate_in(program, &env);
        env.release();
        result
    }

    /// Evaluate a program against a host-supplied environment
    ///
    /// Bindings made by the program's top-level statements stay in `env`.
    /// The host owns its lifetime and should call [`Environment::release`]
    /// once it is done with it.
    pub fn evaluate_in(
        &mut self,
        program: &Program,
        env: &Environment,
    ) -> Result<Value, RuntimeError> {
        tracing::debug!(
            program = %program.id,
            statements = program.seq.len(),
            "evaluating program"
        );
        self.call_depth = 0;
        let result = program.accept(self, env);
        match &result {
            Ok(value) => tracing::debug!(result = %value, "program finished"),
            Err(err) => tracing::debug!(error = %err, "program failed"),
        }
        result
    }

    fn check_interrupt(&self) -> Result<(), RuntimeError> {
        match &self.interrupt {
            Some(flag) if flag.is_triggered() => Err(RuntimeError::Interrupted),
            _ => Ok(()),
        }
    }

    /// Evaluate both operands left to right, then apply `op`
    fn eval_binary(
        &self,
        expr: &BinaryExpr,
        lhs: Value,
        rhs: Value,
    ) -> Result<Value, RuntimeError> {
        let op = expr.op;
        let context = format!("operand of `{}`", op.symbol());

        if op.is_arithmetic() || op.is_comparison() {
            let a = int_operand(&lhs, &context, expr.left.span())?;
            let b = int_operand(&rhs, &context, expr.right.span())?;
            return arithmetic(op, a, b, expr.span);
        }

        if op.is_logical() {
            let a = bool_operand(&lhs, &context, expr.left.span())?;
            let b = bool_operand(&rhs, &context, expr.right.span())?;
            return Ok(Value::Bool(match op {
                BinaryOp::And => a && b,
                _ => a || b,
            }));
        }

        // Equality requires both sides to be of the same kind
        if !lhs.same_kind(&rhs) {
            return Err(RuntimeError::type_mismatch(
                lhs.type_name(),
                &rhs,
                context,
                expr.right.span(),
            ));
        }
        match op {
            BinaryOp::Eq => Ok(Value::Bool(lhs == rhs)),
            BinaryOp::Ne => Ok(Value::Bool(lhs != rhs)),
            _ => Err(RuntimeError::internal(format!(
                "unhandled binary operator `{}`",
                op
            ))),
        }
    }
}

fn int_operand(value: &Value, context: &str, span: Span) -> Result<i64, RuntimeError> {
    value
        .as_int()
        .ok_or_else(|| RuntimeError::type_mismatch("integer", value, context, span))
}

fn bool_operand(value: &Value, context: &str, span: Span) -> Result<bool, RuntimeError> {
    value
        .as_bool()
        .ok_or_else(|| RuntimeError::type_mismatch("boolean", value, context, span))
}

/// Checked integer arithmetic and ordering
fn arithmetic(op: BinaryOp, a: i64, b: i64, span: Span) -> Result<Value, RuntimeError> {
    let overflow = || RuntimeError::overflow(op.symbol(), span);
    let value = match op {
        BinaryOp::Add => Value::Int(a.checked_add(b).ok_or_else(overflow)?),
        BinaryOp::Sub => Value::Int(a.checked_sub(b).ok_or_else(overflow)?),
        BinaryOp::Mul => Value::Int(a.checked_mul(b).ok_or_else(overflow)?),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => {
            return Err(RuntimeError::division_by_zero(span));
        }
        BinaryOp::Div => Value::Int(a.checked_div(b).ok_or_else(overflow)?),
        BinaryOp::Rem => Value::Int(a.checked_rem(b).ok_or_else(overflow)?),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::Le => Value::Bool(a <= b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::Ge => Value::Bool(a >= b),
        other => {
            return Err(RuntimeError::internal(format!(
                "`{}` is not an integer operator",
                other
            )));
        }
    };
    Ok(value)
}

impl Visitor<Environment> for Evaluator {
    type Output = Result<Value, RuntimeError>;

    fn visit_program(&mut self, program: &Program, env: &Environment) -> Self::Output {
        program.seq.accept(self, env)
    }

    fn visit_stmt_sequence(&mut self, seq: &StmtSequence, env: &Environment) -> Self::Output {
        let mut last = Value::Unit;
        for (index, stmt) in seq.stmts.iter().enumerate() {
            self.check_interrupt()?;
            self.statements += 1;
            tracing::trace!(index, kind = stmt.kind_name(), node = %stmt.id(), "statement");
            last = stmt.accept(self, env)?;
        }
        Ok(last)
    }

    fn visit_if_statement(&mut self, stmt: &IfStatement, env: &Environment) -> Self::Output {
        match stmt.condition().accept(self, env)? {
            Value::Bool(true) => stmt.body().accept(self, env),
            Value::Bool(false) => match stmt.else_branch() {
                Some(other) => other.accept(self, env),
                None => Ok(Value::Unit),
            },
            other => Err(RuntimeError::type_mismatch(
                "boolean",
                &other,
                "condition",
                stmt.condition().span(),
            )),
        }
    }

    fn visit_assignment(&mut self, stmt: &Assignment, env: &Environment) -> Self::Output {
        let value = stmt.value.accept(self, env)?;
        env.bind(stmt.name.clone(), value);
        Ok(Value::Unit)
    }

    fn visit_literal(&mut self, expr: &LiteralExpr, _env: &Environment) -> Self::Output {
        Ok(Value::from(expr.value))
    }

    fn visit_ident(&mut self, expr: &IdentExpr, env: &Environment) -> Self::Output {
        env.get(&expr.name)
            .ok_or_else(|| RuntimeError::unbound(&expr.name, expr.span))
    }

    fn visit_unary(&mut self, expr: &UnaryExpr, env: &Environment) -> Self::Output {
        let operand = expr.operand.accept(self, env)?;
        let context = format!("operand of `{}`", expr.op.symbol());
        match expr.op {
            UnaryOp::Neg => {
                let n = int_operand(&operand, &context, expr.operand.span())?;
                n.checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| RuntimeError::overflow("-", expr.span))
            }
            UnaryOp::Not => {
                let b = bool_operand(&operand, &context, expr.operand.span())?;
                Ok(Value::Bool(!b))
            }
        }
    }

    fn visit_binary(&mut self, expr: &BinaryExpr, env: &Environment) -> Self::Output {
        let lhs = expr.left.accept(self, env)?;
        let rhs = expr.right.accept(self, env)?;
        self.eval_binary(expr, lhs, rhs)
    }

    fn visit_proc(&mut self, expr: &ProcExpr, env: &Environment) -> Self::Output {
        Ok(Value::Proc(Rc::new(Procedure {
            origin: expr.id,
            params: expr.params.clone(),
            body: Rc::clone(&expr.body),
            env: env.clone(),
        })))
    }

    fn visit_call(&mut self, expr: &CallExpr, env: &Environment) -> Self::Output {
        let callee = expr.callee.accept(self, env)?;
        let mut args = Vec::with_capacity(expr.args.len());
        for arg in &expr.args {
            args.push(arg.accept(self, env)?);
        }

        let proc = match callee {
            Value::Proc(proc) => proc,
            other => {
                return Err(RuntimeError::type_mismatch(
                    "procedure",
                    &other,
                    "application",
                    expr.callee.span(),
                ));
            }
        };

        if proc.arity() != args.len() {
            return Err(RuntimeError::arity(proc.arity(), args.len(), expr.span));
        }
        if self.call_depth >= self.config.max_call_depth {
            return Err(RuntimeError::recursion_limit(
                self.config.max_call_depth,
                expr.span,
            ));
        }

        let frame = proc.env.extend();
        for (param, arg) in proc.params.iter().zip(args) {
            frame.bind(param.clone(), arg);
        }

        tracing::trace!(proc = %proc.origin, depth = self.call_depth, "call");
        self.call_depth += 1;
        let result = ensure_sufficient_stack(|| proc.body.accept(self, &frame));
        self.call_depth -= 1;
        result
    }

    fn visit_block(&mut self, expr: &BlockExpr, env: &Environment) -> Self::Output {
        let scope = env.extend();
        expr.seq.accept(self, &scope)
    }
}

/// Evaluate a program with default limits against a fresh global environment
pub fn evaluate(program: &Program) -> Result<Value, RuntimeError> {
    Evaluator::new().evaluate(program)
}
