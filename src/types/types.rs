use std::fmt::Display;

use crate::errors::errors::ErrorImpl;

/// The primitive scalar types of the language.
///
/// `Untyped` marks a declaration whose type is inferred from its first
/// assignment. `Unknown` is an error sentinel and never survives type checking.
/// `Operator` is the type carried by operator entries of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    I32,
    I64,
    F32,
    F64,
    Bool,
    Byte,
    Untyped,
    Unknown,
    Operator,
}

impl Primitive {
    pub fn size(&self) -> usize {
        match self {
            Primitive::I32 | Primitive::F32 => 4,
            Primitive::I64 | Primitive::F64 => 8,
            Primitive::Bool | Primitive::Byte => 1,
            _ => 8,
        }
    }

    pub fn is_concrete(&self) -> bool {
        !matches!(
            self,
            Primitive::Untyped | Primitive::Unknown | Primitive::Operator
        )
    }
}

impl Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Bool => "bool",
            Primitive::Byte => "byte",
            Primitive::Untyped => "defer",
            Primitive::Unknown => "unknown",
            Primitive::Operator => "operator",
        };
        write!(f, "{}", name)
    }
}

/// Signature of a function literal.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncType {
    pub inputs: Vec<Type>,
    pub outputs: Vec<Type>,
}

impl FuncType {
    /// The single value a call produces.
    pub fn output(&self) -> Type {
        self.outputs
            .first()
            .cloned()
            .unwrap_or(Type::Primitive(Primitive::Unknown))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive(Primitive),
    /// An offset into global memory whose pointee is the wrapped primitive.
    Ptr(Primitive),
    Func(FuncType),
}

/// Groups of types that mix freely in arithmetic and assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Integral,
    Float,
    Bool,
    Pointer,
    Function,
    Other,
}

impl Type {
    pub const UNTYPED: Type = Type::Primitive(Primitive::Untyped);
    pub const UNKNOWN: Type = Type::Primitive(Primitive::Unknown);
    pub const OPERATOR: Type = Type::Primitive(Primitive::Operator);
    pub const I64: Type = Type::Primitive(Primitive::I64);
    pub const F64: Type = Type::Primitive(Primitive::F64);
    pub const BOOL: Type = Type::Primitive(Primitive::Bool);
    pub const BYTE: Type = Type::Primitive(Primitive::Byte);

    /// Number of bytes a value of this type occupies.
    pub fn size(&self) -> usize {
        match self {
            Type::Primitive(primitive) => primitive.size(),
            Type::Ptr(_) | Type::Func(_) => 8,
        }
    }

    pub fn family(&self) -> Family {
        match self {
            Type::Primitive(Primitive::I32 | Primitive::I64 | Primitive::Byte) => Family::Integral,
            Type::Primitive(Primitive::F32 | Primitive::F64) => Family::Float,
            Type::Primitive(Primitive::Bool) => Family::Bool,
            Type::Ptr(_) => Family::Pointer,
            Type::Func(_) => Family::Function,
            _ => Family::Other,
        }
    }

    pub fn is_untyped(&self) -> bool {
        *self == Type::UNTYPED
    }

    pub fn is_float(&self) -> bool {
        self.family() == Family::Float
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.family(), Family::Integral | Family::Float)
    }

    pub fn is_concrete(&self) -> bool {
        match self {
            Type::Primitive(primitive) => primitive.is_concrete(),
            Type::Ptr(primitive) => primitive.is_concrete(),
            Type::Func(func) => func
                .inputs
                .iter()
                .chain(func.outputs.iter())
                .all(Type::is_concrete),
        }
    }

    pub fn pointee(&self) -> Option<Primitive> {
        match self {
            Type::Ptr(primitive) => Some(*primitive),
            _ => None,
        }
    }

    /// Whether a value of type `value` may be stored where `self` is expected.
    ///
    /// Numeric values only widen within their family; everything else must match.
    pub fn accepts(&self, value: &Type) -> bool {
        match (self, value) {
            (Type::Primitive(target), Type::Primitive(source)) => {
                target == source
                    || matches!(
                        (target, source),
                        (Primitive::I64, Primitive::I32 | Primitive::Byte)
                            | (Primitive::I32, Primitive::Byte)
                            | (Primitive::F64, Primitive::F32)
                    )
            }
            _ => self == value,
        }
    }

    /// Whether the integer literal `value` is representable in `self`.
    pub fn holds_integer(&self, value: i64) -> bool {
        match self {
            Type::Primitive(Primitive::I64) => true,
            Type::Primitive(Primitive::I32) => i32::try_from(value).is_ok(),
            Type::Primitive(Primitive::Byte) => u8::try_from(value).is_ok(),
            _ => false,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Primitive(primitive) => write!(f, "{}", primitive),
            Type::Ptr(primitive) => write!(f, "^{}", primitive),
            Type::Func(func) => {
                let inputs = func
                    .inputs
                    .iter()
                    .map(|ty| ty.to_string())
                    .collect::<Vec<String>>()
                    .join(", ");
                let outputs = func
                    .outputs
                    .iter()
                    .map(|ty| ty.to_string())
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "func({}) -> ({})", inputs, outputs)
            }
        }
    }
}

pub fn parse_primitive(name: &str) -> Option<Primitive> {
    match name {
        "i32" => Some(Primitive::I32),
        "i64" => Some(Primitive::I64),
        "f32" => Some(Primitive::F32),
        "f64" => Some(Primitive::F64),
        "bool" => Some(Primitive::Bool),
        "byte" => Some(Primitive::Byte),
        "defer" => Some(Primitive::Untyped),
        _ => None,
    }
}

/// Parses a type annotation such as `i64`, `^byte` or `defer`.
pub fn parse_type(name: &str) -> Result<Type, ErrorImpl> {
    let unknown = || ErrorImpl::UnknownType {
        type_: name.to_string(),
    };

    if let Some(pointee) = name.strip_prefix('^') {
        match parse_primitive(pointee.trim()) {
            Some(primitive) if primitive.is_concrete() => Ok(Type::Ptr(primitive)),
            _ => Err(unknown()),
        }
    } else {
        parse_primitive(name.trim())
            .map(Type::Primitive)
            .ok_or_else(unknown)
    }
}
