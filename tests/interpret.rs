//! Interpreter integration tests
//!
//! Tests the full pipeline: source → lex → parse → evaluate

use std::rc::Rc;

use smpl::ast::Expr;
use smpl::config::EvalConfig;
use smpl::interp::{Environment, ErrorKind, Evaluator, Interrupt, RuntimeError, Value};

/// Helper to parse and evaluate source code against a fresh environment
fn interpret(source: &str) -> Result<Value, RuntimeError> {
    let program = smpl::parse(source).unwrap();
    smpl::evaluate(&program)
}

/// Helper to check the result is an integer
fn assert_result_int(source: &str, expected: i64) {
    match interpret(source) {
        Ok(Value::Int(n)) => assert_eq!(n, expected, "Expected {}, got {}", expected, n),
        Ok(v) => panic!("Expected Int({}), got {:?}", expected, v),
        Err(e) => panic!("Interpretation failed: {}", e),
    }
}

/// Helper to check the result is a bool
fn assert_result_bool(source: &str, expected: bool) {
    match interpret(source) {
        Ok(Value::Bool(b)) => assert_eq!(b, expected, "Expected {}, got {}", expected, b),
        Ok(v) => panic!("Expected Bool({}), got {:?}", expected, v),
        Err(e) => panic!("Interpretation failed: {}", e),
    }
}

/// Helper to check the result is unit
fn assert_result_unit(source: &str) {
    match interpret(source) {
        Ok(Value::Unit) => {}
        Ok(v) => panic!("Expected unit, got {:?}", v),
        Err(e) => panic!("Interpretation failed: {}", e),
    }
}

/// Helper to check that evaluation fails with the given kind
fn assert_fails(source: &str, kind: ErrorKind) -> RuntimeError {
    match interpret(source) {
        Ok(v) => panic!("Expected {:?} error, got {:?}", kind, v),
        Err(e) => {
            assert_eq!(e.kind(), kind, "unexpected error: {}", e);
            e
        }
    }
}

// ==================== IF STATEMENTS ====================

#[test]
fn test_if_true_takes_body() {
    assert_result_int("if true then 7 else 9", 7);
}

#[test]
fn test_if_false_takes_else() {
    assert_result_int("if false then 7 else 9", 9);
}

#[test]
fn test_if_false_without_else_is_unit() {
    assert_result_unit("if false then 7");
}

#[test]
fn test_if_true_without_else_is_body() {
    assert_result_int("if true then 7", 7);
}

#[test]
fn test_integer_condition_is_type_mismatch() {
    let err = assert_fails("if 1 then 7 else 9", ErrorKind::TypeMismatch);
    match err {
        RuntimeError::TypeMismatch {
            expected,
            got,
            context,
            span,
        } => {
            assert_eq!(expected, "boolean");
            assert_eq!(got, "integer");
            assert_eq!(context, "condition");
            let span = span.unwrap();
            assert_eq!((span.offset(), span.len()), (3, 1));
        }
        other => panic!("Expected type mismatch, got {:?}", other),
    }
}

#[test]
fn test_unit_and_proc_conditions_are_rejected() {
    assert_fails("if () then 1", ErrorKind::TypeMismatch);
    assert_fails("if proc() 1 then 1", ErrorKind::TypeMismatch);
}

#[test]
fn test_sequence_value_is_last_statement() {
    assert_result_int("if true then 1; if false then 2 else 3", 3);
}

#[test]
fn test_unbound_identifier_in_branch() {
    let err = assert_fails("if true then foo else 0", ErrorKind::UnboundIdentifier);
    assert_eq!(err.identifier(), Some("foo"));
}

#[test]
fn test_untaken_branch_is_not_evaluated() {
    assert_result_int("if false then foo else 0", 0);
    assert_result_int("if true then 1 else 1 / 0", 1);
}

#[test]
fn test_nested_if() {
    assert_result_int("if true then if false then 1 else 2 else 3", 2);
    assert_result_unit("if true then if false then 1");
}

#[test]
fn test_branches_share_enclosing_scope() {
    assert_result_int("if true then x := 5; x", 5);
    assert_result_int("x := 1; if x == 1 then x := 2 else x := 3; x", 2);
}

// ==================== SEQUENCES & ASSIGNMENT ====================

#[test]
fn test_empty_program_is_unit() {
    assert_result_unit("");
}

#[test]
fn test_assignment_is_unit() {
    assert_result_unit("x := 1");
}

#[test]
fn test_rebinding() {
    assert_result_int("x := 1; x := x + 1; x", 2);
}

#[test]
fn test_error_stops_sequence() {
    let program = smpl::parse("x := 1; y; x := 2").unwrap();
    let env = Environment::new();
    let mut evaluator = Evaluator::new();
    let err = evaluator.evaluate_in(&program, &env).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnboundIdentifier);
    assert_eq!(env.get("x"), Some(Value::Int(1)));
    assert_eq!(evaluator.statements_executed(), 2);
}

#[test]
fn test_host_environment() {
    let env = Environment::new();
    env.bind("limit", Value::Int(10));
    let program = smpl::parse("big := limit > 5; limit * 2").unwrap();
    let value = Evaluator::new().evaluate_in(&program, &env).unwrap();
    assert_eq!(value, Value::Int(20));
    assert_eq!(env.get("big"), Some(Value::Bool(true)));
}

// ==================== OPERATORS ====================

#[test]
fn test_arithmetic() {
    assert_result_int("1 + 2 * 3", 7);
    assert_result_int("(1 + 2) * 3", 9);
    assert_result_int("10 - 3 - 2", 5);
    assert_result_int("7 / 2", 3);
    assert_result_int("7 % 3", 1);
    assert_result_int("-7 / 2", -3);
    assert_result_int("--4", 4);
}

#[test]
fn test_comparison() {
    assert_result_bool("1 < 2", true);
    assert_result_bool("2 <= 2", true);
    assert_result_bool("3 > 4", false);
    assert_result_bool("4 >= 5", false);
    assert_result_bool("1 + 1 == 2", true);
    assert_result_bool("1 != 1", false);
}

#[test]
fn test_logic() {
    assert_result_bool("true and false", false);
    assert_result_bool("true or false", true);
    assert_result_bool("not true", false);
    assert_result_bool("1 < 2 and 2 < 3", true);
    assert_result_bool("true == true", true);
    assert_result_bool("() == ()", true);
}

#[test]
fn test_logic_evaluates_both_operands() {
    assert_fails("false and 1 / 0 == 0", ErrorKind::DivisionByZero);
    assert_fails("true or missing", ErrorKind::UnboundIdentifier);
}

#[test]
fn test_operator_type_errors() {
    assert_fails("1 + true", ErrorKind::TypeMismatch);
    assert_fails("not 1", ErrorKind::TypeMismatch);
    assert_fails("-true", ErrorKind::TypeMismatch);
    assert_fails("1 and true", ErrorKind::TypeMismatch);
    assert_fails("1 == true", ErrorKind::TypeMismatch);
}

#[test]
fn test_division_by_zero() {
    assert_fails("1 / 0", ErrorKind::DivisionByZero);
    assert_fails("1 % 0", ErrorKind::DivisionByZero);
}

#[test]
fn test_overflow() {
    assert_fails("9223372036854775807 + 1", ErrorKind::Overflow);
    assert_fails("0 - 9223372036854775807 - 2", ErrorKind::Overflow);
    assert_fails("4611686018427387904 * 2", ErrorKind::Overflow);
}

// ==================== PROCEDURES ====================

#[test]
fn test_procedure_call() {
    assert_result_int("add := proc(a, b) a + b; add(2, 3)", 5);
    assert_result_int("(proc(x) x * x)(9)", 81);
    assert_result_int("k := proc() 42; k()", 42);
}

#[test]
fn test_recursion() {
    assert_result_int(
        "fact := proc(n) if n == 0 then 1 else n * fact(n - 1); fact(10)",
        3_628_800,
    );
}

#[test]
fn test_deep_recursion_within_limit() {
    assert_result_int(
        "count := proc(n) if n == 0 then 0 else count(n - 1); count(5000)",
        0,
    );
}

#[test]
fn test_closures_capture_defining_scope() {
    assert_result_int(
        "make := proc(n) proc(m) n + m; add5 := make(5); add5(10)",
        15,
    );
}

#[test]
fn test_closures_see_later_global_bindings() {
    assert_result_int("f := proc() y; y := 3; f()", 3);
}

#[test]
fn test_parameters_shadow_globals() {
    assert_result_int("x := 1; f := proc(x) x * 10; f(2) + x", 21);
}

#[test]
fn test_assignment_in_procedure_stays_local() {
    assert_result_int("x := 1; f := proc() { x := 99; x }; f(); x", 1);
}

#[test]
fn test_procedure_body_block() {
    assert_result_int(
        "sum := proc(a, b, c) { t := a + b; t + c }; sum(1, 2, 3)",
        6,
    );
}

#[test]
fn test_procedure_equality_is_identity() {
    assert_result_bool("f := proc() 1; g := f; f == g", true);
    assert_result_bool("f := proc() 1; g := proc() 1; f == g", false);
}

#[test]
fn test_arity_mismatch() {
    let err = assert_fails("f := proc(a) a; f(1, 2)", ErrorKind::ArityMismatch);
    assert!(matches!(
        err,
        RuntimeError::ArityMismatch {
            expected: 1,
            got: 2,
            ..
        }
    ));
}

#[test]
fn test_calling_non_procedure() {
    let err = assert_fails("x := 3; x(1)", ErrorKind::TypeMismatch);
    assert!(matches!(
        err,
        RuntimeError::TypeMismatch { ref context, .. } if context == "application"
    ));
}

#[test]
fn test_recursion_limit() {
    let program = smpl::parse("loop := proc() loop(); loop()").unwrap();
    let mut evaluator = Evaluator::with_config(EvalConfig { max_call_depth: 64 });
    let err = evaluator.evaluate(&program).unwrap_err();
    assert!(matches!(err, RuntimeError::RecursionLimit { limit: 64, .. }));
}

#[test]
fn test_procedure_display() {
    let value = interpret("proc(a, b) a").unwrap();
    assert_eq!(value.to_string(), "<proc/2>");
    assert_eq!(value.type_name(), "procedure");
}

// ==================== BLOCKS ====================

#[test]
fn test_block_value() {
    assert_result_int("{ x := 2; x * 3 }", 6);
    assert_result_unit("{ }");
}

#[test]
fn test_block_bindings_do_not_escape() {
    assert_fails("{ inner := 1 }; inner", ErrorKind::UnboundIdentifier);
}

#[test]
fn test_block_shadowing() {
    assert_result_int("x := 1; { x := 2 }; x", 1);
    assert_result_int("x := 1; { x := x + 5; x }", 6);
}

// ==================== MEMORY ====================

/// Body of the procedure bound by an `name := proc ...` statement
fn proc_body(stmt: &Expr) -> Rc<Expr> {
    match stmt {
        Expr::Assign(assign) => match assign.value.as_ref() {
            Expr::Proc(proc) => Rc::clone(&proc.body),
            other => panic!("expected a procedure, got {:?}", other),
        },
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn test_recursive_global_is_freed() {
    let program = smpl::parse("f := proc() 1; f()").unwrap();
    let body = proc_body(&program.seq.stmts[0]);

    assert_eq!(smpl::evaluate(&program).unwrap(), Value::Int(1));
    drop(program);
    assert_eq!(Rc::strong_count(&body), 1);
}

#[test]
fn test_procedure_bound_in_block_is_freed() {
    let program = smpl::parse("g := proc() { h := proc() 2; h() }; g()").unwrap();
    let inner = match proc_body(&program.seq.stmts[0]).as_ref() {
        Expr::Block(block) => proc_body(&block.seq.stmts[0]),
        other => panic!("expected a block, got {:?}", other),
    };

    assert_eq!(smpl::evaluate(&program).unwrap(), Value::Int(2));
    drop(program);
    assert_eq!(Rc::strong_count(&inner), 1);
}

#[test]
fn test_release_empties_host_environment() {
    let env = Environment::new();
    let program = smpl::parse("f := proc() f; { g := proc() g }").unwrap();
    Evaluator::new().evaluate_in(&program, &env).unwrap();
    assert!(env.is_bound("f"));

    env.release();
    assert!(env.bindings().is_empty());
    assert!(!env.is_bound("f"));
}

// ==================== HOST CONTROL ====================

#[test]
fn test_interrupt_before_start() {
    let interrupt = Interrupt::new();
    interrupt.trigger();
    let program = smpl::parse("1; 2; 3").unwrap();
    let mut evaluator = Evaluator::new().with_interrupt(interrupt.clone());
    assert_eq!(
        evaluator.evaluate(&program).unwrap_err(),
        RuntimeError::Interrupted
    );
    assert_eq!(evaluator.statements_executed(), 0);

    interrupt.reset();
    assert_eq!(evaluator.evaluate(&program).unwrap(), Value::Int(3));
}

#[test]
fn test_statements_executed_counts_nested_sequences() {
    let program = smpl::parse("x := 1; { y := 2; y }; x").unwrap();
    let mut evaluator = Evaluator::new();
    evaluator.evaluate(&program).unwrap();
    assert_eq!(evaluator.statements_executed(), 5);
}

#[test]
fn test_interpret_renders_runtime_errors() {
    let report = smpl::interpret("if 1 then 2").unwrap_err();
    let rendered = format!("{:?}", report);
    assert!(rendered.contains("condition"), "{}", rendered);
}

#[test]
fn test_evaluation_is_deterministic() {
    let source = "a := 3; b := proc(x) x * a; if b(2) > 5 then b(b(1)) else 0";
    let first = interpret(source).unwrap();
    let second = interpret(source).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, Value::Int(9));
}
