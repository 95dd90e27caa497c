//! Unit tests for the type checker.
//!
//! This module contains tests for:
//! - Expression types, widening and literal assignability
//! - Deferred declarations and back-patching
//! - Stores through pointers
//! - Calls, returns and function bodies
//! - Type errors

use indoc::indoc;
use pretty_assertions::assert_eq;

use super::type_checker::type_check;
use crate::{
    errors::errors::{Error, ErrorImpl, ErrorKind},
    ir::ir::{OpKind, Program},
    lexer::lexer::tokenize,
    parser::parser::parse,
    types::types::{Primitive, Type},
};

fn build(source: &str) -> Result<Program, Error> {
    parse(tokenize(source, "test.hk")?)
}

fn check(source: &str) -> Result<Program, Error> {
    type_check(&build(source)?)
}

fn error_of(source: &str) -> ErrorImpl {
    let error = check(source).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Type);
    error.get_impl().clone()
}

#[test]
fn test_print_type_is_patched() {
    let program = check("x: i64 = 2 + 3 * 4\nprint x").unwrap();

    let print = &program.operations[4];
    assert_eq!(print.kind, OpKind::Print);
    assert_eq!(print.types, vec![Type::I64]);
    assert_eq!(program.operations[2].types, vec![Type::I64]);
}

#[test]
fn test_deferred_declaration_is_resolved() {
    let program = check("x := true\nprint x").unwrap();

    assert_eq!(
        program.operations[0].declarations().collect::<Vec<_>>(),
        vec![("x", &Type::BOOL)]
    );
    assert_eq!(program.operations[2].types, vec![Type::BOOL]);
    assert_eq!(program.operations[4].types, vec![Type::BOOL]);
}

#[test]
fn test_deferred_declaration_in_nested_block() {
    let source = indoc! {"
        if true {
            n := 2.5
            print n
        }
    "};
    let program = check(source).unwrap();

    let scope = &program.operations[3];
    assert_eq!(scope.kind, OpKind::BeginScope);
    assert_eq!(
        scope.declarations().collect::<Vec<_>>(),
        vec![("n", &Type::F64)]
    );
}

#[test]
fn test_type_check_leaves_input_untouched() {
    let program = build("x := 1").unwrap();
    let checked = type_check(&program).unwrap();

    assert_eq!(
        program.operations[0].declarations().collect::<Vec<_>>(),
        vec![("x", &Type::UNTYPED)]
    );
    assert_eq!(
        checked.operations[0].declarations().collect::<Vec<_>>(),
        vec![("x", &Type::I64)]
    );
}

#[test]
fn test_widening_and_literals_are_assignable() {
    let source = indoc! {"
        a: i32 = 5
        b: f32 = -1.5
        c: byte = 65
        d: i64 = a
        e: f64 = b
        f: i32 = c
    "};
    let program = check(source).unwrap();

    let declarations = program.operations[0]
        .declarations()
        .map(|(name, ty)| (name.to_string(), ty.clone()))
        .collect::<Vec<_>>();
    assert_eq!(
        declarations,
        vec![
            (String::from("a"), Type::Primitive(Primitive::I32)),
            (String::from("b"), Type::Primitive(Primitive::F32)),
            (String::from("c"), Type::BYTE),
            (String::from("d"), Type::I64),
            (String::from("e"), Type::F64),
            (String::from("f"), Type::Primitive(Primitive::I32)),
        ]
    );
}

#[test]
fn test_store_through_pointer() {
    let program = check("p := [2]i64{}\n^p = 7\nprint ^p").unwrap();

    let store = &program.operations[4];
    assert_eq!(store.kind, OpKind::Mov);
    assert_eq!(store.types.last(), Some(&Type::Ptr(Primitive::I64)));
    assert_eq!(program.operations[6].types, vec![Type::I64]);
}

#[test]
fn test_function_bodies_are_patched() {
    let source = indoc! {"
        f = func() -> (i64) {
            r := 5
            -> r
        }
        print f()
    "};
    let program = check(source).unwrap();

    let body = &program.functions[0].operations;
    assert_eq!(
        body[0].declarations().collect::<Vec<_>>(),
        vec![("r", &Type::I64)]
    );
    let ret = body.iter().find(|op| op.kind == OpKind::Return).unwrap();
    assert_eq!(ret.types, vec![Type::I64]);

    let print = program
        .operations
        .iter()
        .find(|op| op.kind == OpKind::Print)
        .unwrap();
    assert_eq!(print.types, vec![Type::I64]);
}

#[test]
fn test_function_reads_globals() {
    let source = indoc! {"
        scale := 3
        f = func(a: i64) -> (i64) {
            -> a * scale
        }
        print f(2)
    "};
    assert!(check(source).is_ok());
}

#[test]
fn test_assignment_type_errors() {
    assert_eq!(
        error_of("x: i64 = true"),
        ErrorImpl::TypeMatchError {
            expected: String::from("i64"),
            received: String::from("bool"),
        }
    );
    assert_eq!(
        error_of("x: i64 = 1.5"),
        ErrorImpl::TypeMatchError {
            expected: String::from("i64"),
            received: String::from("f64"),
        }
    );
    assert_eq!(
        error_of("x := true\nx = 1"),
        ErrorImpl::TypeMatchError {
            expected: String::from("bool"),
            received: String::from("i64"),
        }
    );
    assert_eq!(
        error_of("p := [2]i64{}\n^p = true"),
        ErrorImpl::TypeMatchError {
            expected: String::from("i64"),
            received: String::from("bool"),
        }
    );
}

#[test]
fn test_narrowing_is_rejected() {
    assert_eq!(
        error_of("b: byte = 300"),
        ErrorImpl::TypeMatchError {
            expected: String::from("byte"),
            received: String::from("i64"),
        }
    );
    assert_eq!(
        error_of("b: byte = -1"),
        ErrorImpl::TypeMatchError {
            expected: String::from("byte"),
            received: String::from("i64"),
        }
    );
    assert_eq!(
        error_of("x: i64 = 1
y: i32 = x"),
        ErrorImpl::TypeMatchError {
            expected: String::from("i32"),
            received: String::from("i64"),
        }
    );
    assert_eq!(
        error_of("x: f32 = 1.5 * 2.0"),
        ErrorImpl::TypeMatchError {
            expected: String::from("f32"),
            received: String::from("f64"),
        }
    );
    assert_eq!(
        error_of("p := [2]i32{}\n^p = 2147483648"),
        ErrorImpl::TypeMatchError {
            expected: String::from("i32"),
            received: String::from("i64"),
        }
    );
    assert_eq!(
        error_of("f = func(b: byte) -> (byte) {\n-> b\n}\nx := 1\nprint f(x)"),
        ErrorImpl::ArgumentTypeMatchError {
            expected: String::from("byte"),
            received: String::from("i64"),
        }
    );
}

#[test]
fn test_deferred_type_is_exact() {
    assert_eq!(
        error_of("x := 5\nx = 'a'"),
        ErrorImpl::TypeMatchError {
            expected: String::from("i64"),
            received: String::from("byte"),
        }
    );
    assert_eq!(
        error_of("c := 'a'\nc = 98"),
        ErrorImpl::TypeMatchError {
            expected: String::from("byte"),
            received: String::from("i64"),
        }
    );
    assert!(check("x := 5\nx = 6\nprint x").is_ok());
}

#[test]
fn test_return_type_is_exact() {
    assert_eq!(
        error_of("f = func(a: i64) -> (byte) {\n-> a + 200\n}\nprint f(100)"),
        ErrorImpl::ReturnTypeError {
            expected: String::from("byte"),
            received: String::from("i64"),
        }
    );
    assert_eq!(
        error_of("f = func(a: i32) -> (i64) {\n-> a\n}"),
        ErrorImpl::ReturnTypeError {
            expected: String::from("i64"),
            received: String::from("i32"),
        }
    );
}

#[test]
fn test_deferred_errors() {
    assert_eq!(
        error_of("y: defer"),
        ErrorImpl::UnresolvedType {
            variable: String::from("y"),
        }
    );
    assert_eq!(
        error_of("y: defer\nprint y"),
        ErrorImpl::PendingType {
            variable: String::from("y"),
        }
    );
    assert_eq!(
        error_of("x := 1\n^x = 2"),
        ErrorImpl::DerefTypeError {
            received: String::from("i64"),
        }
    );
}

#[test]
fn test_expression_errors() {
    assert_eq!(
        error_of("x := 1 + true"),
        ErrorImpl::OperandTypeError {
            operator: String::from("+"),
            left: String::from("i64"),
            right: String::from("bool"),
        }
    );
    assert_eq!(
        error_of("if 1 {\n}"),
        ErrorImpl::ConditionTypeError {
            received: String::from("i64"),
        }
    );
    assert_eq!(
        error_of("while 1 + 2 {\n}"),
        ErrorImpl::ConditionTypeError {
            received: String::from("i64"),
        }
    );
}

#[test]
fn test_function_errors() {
    let function = "f = func(a: i64) -> (i64) {\n-> a\n}\n";

    assert_eq!(
        error_of(&format!("{}print f(1, 2)", function)),
        ErrorImpl::UnexpectedArguments {
            expected: 1,
            received: 2,
        }
    );
    assert_eq!(
        error_of(&format!("{}print f()", function)),
        ErrorImpl::MissingArguments {
            expected: 1,
            received: 0,
        }
    );
    assert_eq!(
        error_of(&format!("{}print f(true)", function)),
        ErrorImpl::ArgumentTypeMatchError {
            expected: String::from("i64"),
            received: String::from("bool"),
        }
    );
    assert_eq!(
        error_of(&format!("{}print f", function)),
        ErrorImpl::UnprintableType {
            type_: String::from("func(i64) -> (i64)"),
        }
    );
    assert_eq!(
        error_of("f = func() -> (bool) {\n-> 1\n}"),
        ErrorImpl::ReturnTypeError {
            expected: String::from("bool"),
            received: String::from("i64"),
        }
    );
    assert_eq!(
        error_of("f = func() -> (i64) {\nx: i64 = 1\n}"),
        ErrorImpl::MissingReturn {
            function: String::from("f"),
        }
    );
}

#[test]
fn test_error_position() {
    let error = check("x: i64 = 1\n\ny: bool = x").unwrap_err();
    assert_eq!(error.get_position().0, 3);
}
