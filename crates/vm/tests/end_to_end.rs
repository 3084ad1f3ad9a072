//! End-to-end interpreter scenarios, run through the public
//! `Vm::interpret` entry point the same way the CLI's file runner and
//! REPL drive it. Each scenario asserts both the `InterpretResult` and
//! the literal text `PRINT` produced, so a regression in value
//! formatting (not just control flow) gets caught.

use cinder_core::error::InterpretResult;
use cinder_vm::{CapturedOutput, Vm};

fn run(source: &str) -> (InterpretResult, String) {
    let output = CapturedOutput::new();
    let result = Vm::with_output(output.clone()).interpret(source);
    (result, output.as_str())
}

#[test]
fn precedence_verified_by_successful_run() {
    assert_eq!(run("print 1 + 2 * 3;"), (InterpretResult::Ok, "7\n".to_string()));
}

#[test]
fn string_concatenation_via_add() {
    assert_eq!(
        run(r#"print "foo" + "bar";"#),
        (InterpretResult::Ok, "foobar\n".to_string())
    );
}

#[test]
fn lexical_scoping_shadows_inner_from_outer() {
    // The inner `a`'s initializer reads the outer `a` (10) before the
    // inner binding exists, so the block prints 11; once the block
    // ends the inner binding is gone and the outer `a` prints 10.
    assert_eq!(
        run("var a = 10; { var a = a + 1; print a; } print a;"),
        (InterpretResult::Ok, "11\n10\n".to_string())
    );
}

#[test]
fn while_loop_runs_to_completion() {
    assert_eq!(
        run("var i = 0; while (i < 3) { print i; i = i + 1; }"),
        (InterpretResult::Ok, "0\n1\n2\n".to_string())
    );
}

#[test]
fn power_promotes_to_real() {
    // 2 ^ 10 is computed as a Real (1024.0) but prints without a
    // trailing decimal, the same shortest round-trip form as `%g`.
    assert_eq!(run("print 2 ^ 10;"), (InterpretResult::Ok, "1024\n".to_string()));
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let (result, printed) = run("print 1 / 0;");
    assert_eq!(result, InterpretResult::RuntimeError);
    assert_eq!(printed, "");
}

#[test]
fn reading_an_undefined_global_is_a_runtime_error() {
    let (result, printed) = run("print undefined_name;");
    assert_eq!(result, InterpretResult::RuntimeError);
    assert_eq!(printed, "");
}

#[test]
fn redeclaring_a_global_is_allowed_and_shadows() {
    assert_eq!(
        run("var a; var a; print a;"),
        (InterpretResult::Ok, "nil\n".to_string())
    );
}

#[test]
fn redeclaring_a_local_in_the_same_scope_is_a_compile_error() {
    let (result, printed) = run("{ var a; var a; }");
    assert_eq!(result, InterpretResult::CompileError);
    assert_eq!(printed, "");
}

#[test]
fn assigning_to_an_undefined_global_is_a_runtime_error() {
    let (result, printed) = run("x = 1;");
    assert_eq!(result, InterpretResult::RuntimeError);
    assert_eq!(printed, "");
}

#[test]
fn comparison_synthesis_handles_all_four_operators() {
    assert_eq!(
        run("print 1 <= 2; print 2 >= 1; print 1 < 2; print 2 > 1;"),
        (InterpretResult::Ok, "true\ntrue\ntrue\ntrue\n".to_string())
    );
}

#[test]
fn modulo_requires_two_integers() {
    assert_eq!(run("print 7 % 2;"), (InterpretResult::Ok, "1\n".to_string()));
    let (result, printed) = run("print 7.0 % 2;");
    assert_eq!(result, InterpretResult::RuntimeError);
    assert_eq!(printed, "");
}

#[test]
fn logical_and_or_short_circuit_without_error() {
    assert_eq!(
        run("print false & (1 / 0 > 0); print true | (1 / 0 > 0);"),
        (InterpretResult::Ok, "false\ntrue\n".to_string())
    );
}

#[test]
fn do_end_block_is_equivalent_to_braces() {
    assert_eq!(
        run("var a = 1; do var a = 2; print a; end print a;"),
        (InterpretResult::Ok, "2\n1\n".to_string())
    );
}
