//! Unit tests for the interpreter.
//!
//! This module contains tests for:
//! - Byte encoding of values
//! - Arithmetic, comparison and printing
//! - Agreement of checked and computed types
//! - Scopes, shadowing and control flow
//! - Memory, pointers and bounds checks
//! - Function calls

use indoc::indoc;
use pretty_assertions::assert_eq;

use super::{
    interpreter::Interpreter,
    value::{Scalar, Value},
};
use crate::{
    build_program,
    errors::errors::{Error, ErrorImpl, ErrorKind},
    ir::ir::OpKind,
    types::types::{Primitive, Type},
};

fn run(source: &str) -> Result<String, Error> {
    let program = build_program(source, "test.hk")?;
    let mut out = Vec::new();
    Interpreter::new(&program, &mut out).run()?;
    Ok(String::from_utf8(out).unwrap())
}

fn runtime_error(source: &str) -> ErrorImpl {
    let error = run(source).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Runtime);
    error.get_impl().clone()
}

#[test]
fn test_values_encode_big_endian() {
    let value = Value::new(Scalar::Int(258), &Type::Primitive(Primitive::I32));
    assert_eq!(value.encode(), vec![0, 0, 1, 2]);

    let value = Value::new(Scalar::Int(-1), &Type::I64);
    assert_eq!(value.encode(), vec![0xff; 8]);

    let value = Value::new(Scalar::Float(1.0), &Type::F64);
    assert_eq!(value.encode(), 1.0f64.to_be_bytes().to_vec());

    let decoded = Value::decode(&[0, 0, 1, 2], &Type::Primitive(Primitive::I32)).unwrap();
    assert_eq!(decoded.as_i64(), 258);
    assert!(Value::decode(&[0, 1], &Type::I64).is_none());
}

#[test]
fn test_values_wrap_to_width() {
    let value = Value::new(Scalar::Int(2147483648), &Type::Primitive(Primitive::I32));
    assert_eq!(value.as_i64(), -2147483648);

    let value = Value::new(Scalar::Int(300), &Type::BYTE);
    assert_eq!(value.as_i64(), 44);

    let value = Value::new(Scalar::Int(7), &Type::BOOL);
    assert_eq!(value.as_i64(), 1);
}

#[test]
fn test_value_rendering() {
    assert_eq!(Value::new(Scalar::Int(1), &Type::BOOL).to_string(), "true");
    assert_eq!(Value::new(Scalar::Int(65), &Type::BYTE).to_string(), "A");
    assert_eq!(Value::new(Scalar::Float(0.5), &Type::F64).to_string(), "0.500000");
    assert_eq!(
        Value::new(Scalar::Int(16), &Type::Ptr(Primitive::I32)).to_string(),
        "^i32(16)"
    );
}

#[test]
fn test_precedence_round_trip() {
    assert_eq!(run("x: i64\nx = 2 + 3 * 4\nprint x").unwrap(), "14\n");
}

#[test]
fn test_arithmetic() {
    let source = indoc! {"
        print 10 - 4 - 3
        print 100 / 10 / 5
        print (2 + 3) * 4
        print -7 % 3
        print 2.0 / 4.0
        print 1 < 2 && 3 > 4
        print !(1 == 2)
    "};
    assert_eq!(run(source).unwrap(), "3\n2\n20\n-1\n0.500000\nfalse\ntrue\n");
}

#[test]
fn test_checked_type_matches_computed_value() {
    let prelude = "a: i32 = 2147483647\nf: f32 = 0.25\nc: byte = 'x'\np := [2]i64{}\n";
    let i32_ = Type::Primitive(Primitive::I32);
    let f32_ = Type::Primitive(Primitive::F32);

    let cases = [
        ("true || false", Type::BOOL, "true"),
        ("true && false", Type::BOOL, "false"),
        ("3 == 3", Type::BOOL, "true"),
        ("c != 'y'", Type::BOOL, "true"),
        ("2 < 1", Type::BOOL, "false"),
        ("2.5 > 1.5", Type::BOOL, "true"),
        ("3 + 4", Type::I64, "7"),
        ("a + 1", i32_.clone(), "-2147483648"),
        ("c + 1", Type::BYTE, "y"),
        ("p + 8", Type::Ptr(Primitive::I64), "^i64(8)"),
        ("f - 1.0", f32_.clone(), "-0.750000"),
        ("6 * 7", Type::I64, "42"),
        ("2.0 / 4.0", Type::F64, "0.500000"),
        ("c % 7", Type::I64, "1"),
        ("!(1 == 2)", Type::BOOL, "true"),
        ("-f", f32_, "-0.250000"),
        ("^p", Type::I64, "0"),
    ];

    for (expression, ty, printed) in cases {
        let source = format!("{}print {}", prelude, expression);
        let program = build_program(&source, "test.hk").unwrap();
        let print = program
            .operations
            .iter()
            .rev()
            .find(|operation| operation.kind == OpKind::Print)
            .unwrap();
        assert_eq!(print.types, vec![ty], "checked type of `{}`", expression);

        assert_eq!(
            run(&source).unwrap(),
            format!("{}\n", printed),
            "computed value of `{}`",
            expression
        );
    }
}

#[test]
fn test_integer_width_wraps() {
    let source = indoc! {"
        x: i32 = 2147483647
        x = x + 1
        print x
    "};
    assert_eq!(run(source).unwrap(), "-2147483648\n");
}

#[test]
fn test_byte_and_bool_printing() {
    let source = indoc! {"
        c: byte = 'A'
        print c
        b := 1 < 2
        print b
    "};
    assert_eq!(run(source).unwrap(), "A\ntrue\n");
}

#[test]
fn test_bytes_print_raw() {
    let program = build_program("c: byte = 200\nprint c\nprint 'a'", "test.hk").unwrap();
    let mut out = Vec::new();
    Interpreter::new(&program, &mut out).run().unwrap();

    assert_eq!(out, vec![200, b'\n', b'a', b'\n']);
}

#[test]
fn test_shadowing_keeps_outer_value() {
    let source = indoc! {"
        x: i64 = 1
        if true {
            x: i64 = 2
            print x
        }
        print x
    "};
    assert_eq!(run(source).unwrap(), "2\n1\n");
}

#[test]
fn test_assignment_reaches_outer_scope() {
    let source = indoc! {"
        x: i64 = 1
        if true {
            x = 5
        }
        print x
    "};
    assert_eq!(run(source).unwrap(), "5\n");
}

#[test]
fn test_else_chain_exclusivity() {
    let source = indoc! {"
        if false {
            print 1
        } else if true {
            print 2
        } else {
            print 3
        }
    "};
    assert_eq!(run(source).unwrap(), "2\n");

    let source = indoc! {"
        if false {
            print 1
        } else if false {
            print 2
        } else {
            print 3
        }
    "};
    assert_eq!(run(source).unwrap(), "3\n");
}

#[test]
fn test_nested_chain_does_not_leak() {
    let source = indoc! {"
        x := 1
        if x == 1 {
            if false {
                print 10
            }
            print 1
        } else {
            print 2
        }
    "};
    assert_eq!(run(source).unwrap(), "1\n");
}

#[test]
fn test_while_loop() {
    let source = indoc! {"
        i := 0
        while i < 3 {
            print i
            i = i + 1
        }
        print 99
    "};
    assert_eq!(run(source).unwrap(), "0\n1\n2\n99\n");
}

#[test]
fn test_nested_loops() {
    let source = indoc! {"
        total := 0
        i := 0
        while i < 3 {
            j := 0
            while j < i {
                total = total + 1
                j = j + 1
            }
            i = i + 1
        }
        print total
    "};
    assert_eq!(run(source).unwrap(), "3\n");
}

#[test]
fn test_pointer_store_and_load() {
    let source = indoc! {"
        p := i64{}
        ^p = 42
        print ^p
        print p
        q := [4]byte{}
        print q
    "};
    assert_eq!(run(source).unwrap(), "42\n^i64(0)\n^byte(8)\n");
}

#[test]
fn test_pointer_arithmetic_in_bytes() {
    let source = indoc! {"
        a := [3]i32{}
        second := a + 4
        ^second = 7
        ^second = ^second * 6
        print ^(a + 4)
    "};
    assert_eq!(run(source).unwrap(), "42\n");
}

#[test]
fn test_memory_is_big_endian() {
    let program = build_program("p := i32{}\n^p = 258", "test.hk").unwrap();
    let mut out = Vec::new();
    let mut interpreter = Interpreter::new(&program, &mut out);
    interpreter.run().unwrap();

    assert_eq!(interpreter.memory(), &[0, 0, 1, 2]);
}

#[test]
fn test_out_of_bounds_store() {
    let source = indoc! {"
        p := [2]i64{}
        q := p + 16
        ^q = 1
    "};
    assert_eq!(
        runtime_error(source),
        ErrorImpl::MemoryOutOfBounds {
            offset: 16,
            size: 8,
            capacity: 16,
        }
    );
}

#[test]
fn test_partly_out_of_bounds_store_writes_nothing() {
    let source = indoc! {"
        p := [2]i64{}
        ^p = -1
        q := p + 12
        ^q = 255
    "};
    let program = build_program(source, "test.hk").unwrap();
    let mut out = Vec::new();
    let mut interpreter = Interpreter::new(&program, &mut out);
    let error = interpreter.run().unwrap_err();

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::MemoryOutOfBounds {
            offset: 12,
            size: 8,
            capacity: 16,
        }
    );
    let mut expected = vec![255u8; 8];
    expected.extend([0u8; 8]);
    assert_eq!(interpreter.memory(), expected.as_slice());
}

#[test]
fn test_out_of_bounds_load() {
    let source = indoc! {"
        p := i64{}
        q := p - 1
        print ^q
    "};
    assert_eq!(
        runtime_error(source),
        ErrorImpl::MemoryOutOfBounds {
            offset: -1,
            size: 8,
            capacity: 8,
        }
    );
}

#[test]
fn test_division_by_zero() {
    assert_eq!(
        runtime_error("x := 0\nprint 1 / x"),
        ErrorImpl::DivisionByZero
    );
    assert_eq!(
        runtime_error("x := 0\nprint 1 % x"),
        ErrorImpl::DivisionByZero
    );
}

#[test]
fn test_function_call() {
    let source = indoc! {"
        add = func(a: i64, b: i64) -> (i64) {
            -> a + b
        }
        print add(2, 3) * 2
    "};
    assert_eq!(run(source).unwrap(), "10\n");
}

#[test]
fn test_recursive_function() {
    let source = indoc! {"
        fact = func(n: i64) -> (i64) {
            if n < 2 {
                -> 1
            }
            -> n * fact(n - 1)
        }
        print fact(5)
    "};
    assert_eq!(run(source).unwrap(), "120\n");
}

#[test]
fn test_function_reads_and_writes_globals() {
    let source = indoc! {"
        counter := 0
        bump = func(by: i64) -> (i64) {
            counter = counter + by
            -> counter
        }
        print bump(2)
        print bump(3)
        print counter
    "};
    assert_eq!(run(source).unwrap(), "2\n5\n5\n");
}

#[test]
fn test_function_converts_arguments() {
    let source = indoc! {"
        half = func(x: f32) -> (f32) {
            -> x / 2.0
        }
        print half(3.0)
    "};
    assert_eq!(run(source).unwrap(), "1.500000\n");
}
