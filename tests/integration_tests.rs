//! Integration tests for the complete pipeline.
//!
//! These tests drive source text through lexing, IR building, type checking
//! and then either the interpreter or the C generator, checking program output
//! and the phase that rejects bad programs.

use huskyc::{
    build_program,
    compiler::compiler::compile,
    errors::errors::{ErrorImpl, ErrorKind},
    format_error, run_source,
};
use indoc::indoc;
use pretty_assertions::assert_eq;

fn run(source: &str) -> String {
    let mut out = Vec::new();
    run_source(source, "main.hk", &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn error_kind(source: &str) -> ErrorKind {
    let mut out = Vec::new();
    run_source(source, "main.hk", &mut out).unwrap_err().kind()
}

#[test]
fn test_run_precedence() {
    let source = indoc! {"
        // declare first, assign later
        x: i64
        x = 2 + 3 * 4
        print x
    "};
    assert_eq!(run(source), "14\n");
}

#[test]
fn test_run_fizzbuzz_counts() {
    let source = indoc! {"
        i := 1
        fizz := 0
        buzz := 0
        both := 0
        while i < 16 {
            if i % 15 == 0 {
                both = both + 1
            } else if i % 3 == 0 {
                fizz = fizz + 1
            } else if i % 5 == 0 {
                buzz = buzz + 1
            }
            i = i + 1
        }
        print fizz
        print buzz
        print both
    "};
    assert_eq!(run(source), "4\n2\n1\n");
}

#[test]
fn test_run_string_in_memory() {
    let source = indoc! {"
        text := [3]byte{}
        cursor := text
        ^cursor = 'h'
        cursor = cursor + 1
        ^cursor = 'i'
        cursor = cursor + 1
        ^cursor = '\\n'
        print ^text
        print ^(text + 1)
        done := ^(text + 2) == '\\n'
        print done
    "};
    assert_eq!(run(source), "h\ni\ntrue\n");
}

#[test]
fn test_run_distinct_allocations() {
    let source = indoc! {"
        a := i64{}
        b := i64{}
        ^a = 1
        ^b = 2
        print ^a + ^b
        print a
        print b
    "};
    assert_eq!(run(source), "3\n^i64(0)\n^i64(8)\n");
}

#[test]
fn test_run_fibonacci() {
    let source = indoc! {"
        fib = func(n: i64) -> (i64) {
            if n < 2 {
                -> n
            }
            -> fib(n - 1) + fib(n - 2)
        }
        print fib(15)
    "};
    assert_eq!(run(source), "610\n");
}

#[test]
fn test_run_floats() {
    let source = indoc! {"
        area = func(r: f32) -> (f32) {
            -> r * r * 3.5
        }
        small := area(2.0)
        wide: f64 = small
        print wide
        print -1.25
    "};
    assert_eq!(run(source), "14.000000\n-1.250000\n");
}

#[test]
fn test_error_phases() {
    assert_eq!(error_kind("x ? 1"), ErrorKind::Lex);
    assert_eq!(error_kind("x: i64 = = 1"), ErrorKind::Parse);
    assert_eq!(error_kind("print y"), ErrorKind::Parse);
    assert_eq!(error_kind("} else {"), ErrorKind::Parse);
    assert_eq!(error_kind("x: bool = 1"), ErrorKind::Type);
    assert_eq!(error_kind("p := i64{}\n^(p) = 1"), ErrorKind::Lex);
    assert_eq!(error_kind("p := i64{}\nq := p + 8\nprint ^q"), ErrorKind::Runtime);
}

#[test]
fn test_deferred_type_is_fixed() {
    let mut out = Vec::new();
    let error = run_source("flag := true\nflag = 2", "main.hk", &mut out).unwrap_err();

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::TypeMatchError {
            expected: String::from("bool"),
            received: String::from("i64"),
        }
    );
    assert_eq!(error.get_position().0, 2);
}

#[test]
fn test_output_stops_at_runtime_error() {
    let source = indoc! {"
        print 1
        zero := 0
        print 1 / zero
        print 2
    "};
    let mut out = Vec::new();
    let error = run_source(source, "main.hk", &mut out).unwrap_err();

    assert_eq!(error.get_impl(), &ErrorImpl::DivisionByZero);
    assert_eq!(String::from_utf8(out).unwrap(), "1\n");
}

#[test]
fn test_error_rendering() {
    let source = "x: i64 = 1\n    y: bool = x\n";
    let mut out = Vec::new();
    let error = run_source(source, "main.hk", &mut out).unwrap_err();

    assert_eq!(
        format_error(&error, source),
        indoc! {"
            Error: Type TypeMatchError (Expected type `bool`, received `i64`)
            -> main.hk:2
              |
            2 | y: bool = x
              | ^^^^^^^^^^^
        "}
    );
}

#[test]
fn test_dump_lists_functions() {
    let source = indoc! {"
        sq = func(v: i64) -> (i64) {
            -> v * v
        }
        print sq(3)
    "};
    let program = build_program(source, "main.hk").unwrap();
    let dump = program.to_string();

    assert!(dump.starts_with("memory capacity: 0 bytes\nmain:\n"));
    assert!(dump.contains("func 0 `sq`: func(i64) -> (i64)"));
}

#[test]
fn test_compile_emits_complete_unit() {
    let source = indoc! {"
        total := 0
        i := 0
        while i < 4 {
            total = total + i
            i = i + 1
        }
        print total
    "};
    let program = build_program(source, "main.hk").unwrap();
    let c_source = compile(&program).unwrap();

    assert!(c_source.contains("static i64 v_total_0_0 = 0;"));
    assert!(c_source.contains("static i64 v_i_0_1 = 0;"));
    assert!(c_source.contains("print_i64(((i64)(v_total_0_0)));"));
    assert!(c_source.trim_end().ends_with('}'));
}
