use super::types::{parse_type, Primitive, Type};
use crate::errors::errors::ErrorImpl;

#[test]
fn test_primitive_sizes() {
    assert_eq!(Type::Primitive(Primitive::I32).size(), 4);
    assert_eq!(Type::Primitive(Primitive::F32).size(), 4);
    assert_eq!(Type::I64.size(), 8);
    assert_eq!(Type::F64.size(), 8);
    assert_eq!(Type::BOOL.size(), 1);
    assert_eq!(Type::BYTE.size(), 1);
    assert_eq!(Type::Ptr(Primitive::Byte).size(), 8);
}

#[test]
fn test_parse_types() {
    assert_eq!(parse_type("i64"), Ok(Type::I64));
    assert_eq!(parse_type("^f32"), Ok(Type::Ptr(Primitive::F32)));
    assert_eq!(parse_type("defer"), Ok(Type::UNTYPED));
    assert_eq!(
        parse_type("string"),
        Err(ErrorImpl::UnknownType {
            type_: "string".to_string()
        })
    );
    assert!(parse_type("^defer").is_err());
}

#[test]
fn test_type_display() {
    assert_eq!(Type::Ptr(Primitive::I64).to_string(), "^i64");
    assert_eq!(Type::UNTYPED.to_string(), "defer");
}

#[test]
fn test_accepts_widening_only() {
    let i32_ = Type::Primitive(Primitive::I32);
    let f32_ = Type::Primitive(Primitive::F32);

    assert!(Type::I64.accepts(&i32_));
    assert!(Type::I64.accepts(&Type::BYTE));
    assert!(i32_.accepts(&Type::BYTE));
    assert!(Type::F64.accepts(&f32_));
    assert!(!i32_.accepts(&Type::I64));
    assert!(!Type::BYTE.accepts(&Type::I64));
    assert!(!f32_.accepts(&Type::F64));
    assert!(!Type::I64.accepts(&Type::F64));
    assert!(!Type::BOOL.accepts(&Type::I64));
    assert!(!Type::Ptr(Primitive::I64).accepts(&Type::Ptr(Primitive::Byte)));
    assert!(!Type::Ptr(Primitive::I64).accepts(&Type::I64));
}

#[test]
fn test_holds_integer() {
    let i32_ = Type::Primitive(Primitive::I32);

    assert!(Type::BYTE.holds_integer(255));
    assert!(!Type::BYTE.holds_integer(300));
    assert!(!Type::BYTE.holds_integer(-1));
    assert!(i32_.holds_integer(-2147483648));
    assert!(!i32_.holds_integer(2147483648));
    assert!(Type::I64.holds_integer(i64::MIN));
    assert!(!Type::F64.holds_integer(1));
}
