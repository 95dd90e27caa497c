use std::fmt::Display;

use crate::{
    errors::errors::ErrorImpl,
    eval::operators::{binary_type, unary_type, Operator},
    types::types::{Primitive, Type},
};

/// Machine representation of a value: every integral, boolean, pointer and
/// function reference is carried as an `i64`, every float as an `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub scalar: Scalar,
    pub ty: Type,
}

impl Value {
    /// Builds a value of type `ty`, narrowing `scalar` to that type's width.
    pub fn new(scalar: Scalar, ty: &Type) -> Self {
        Value {
            scalar,
            ty: ty.clone(),
        }
        .cast(ty)
    }

    pub fn as_i64(&self) -> i64 {
        match self.scalar {
            Scalar::Int(value) => value,
            Scalar::Float(value) => value as i64,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self.scalar {
            Scalar::Int(value) => value as f64,
            Scalar::Float(value) => value,
        }
    }

    pub fn is_true(&self) -> bool {
        self.as_i64() != 0
    }

    /// Converts the value to `ty`, wrapping integers to the target width.
    pub fn cast(&self, ty: &Type) -> Value {
        let scalar = match ty {
            Type::Primitive(Primitive::F32) => Scalar::Float(self.as_f64() as f32 as f64),
            Type::Primitive(Primitive::F64) => Scalar::Float(self.as_f64()),
            Type::Primitive(Primitive::I32) => Scalar::Int(self.as_i64() as i32 as i64),
            Type::Primitive(Primitive::Byte) => Scalar::Int(self.as_i64() as u8 as i64),
            Type::Primitive(Primitive::Bool) => Scalar::Int(self.is_true() as i64),
            _ => Scalar::Int(self.as_i64()),
        };

        Value {
            scalar,
            ty: ty.clone(),
        }
    }

    /// Big-endian bytes of the value, `ty.size()` of them.
    pub fn encode(&self) -> Vec<u8> {
        match self.ty {
            Type::Primitive(Primitive::I32) => (self.as_i64() as i32).to_be_bytes().to_vec(),
            Type::Primitive(Primitive::F32) => (self.as_f64() as f32).to_be_bytes().to_vec(),
            Type::Primitive(Primitive::F64) => self.as_f64().to_be_bytes().to_vec(),
            Type::Primitive(Primitive::Bool | Primitive::Byte) => vec![self.as_i64() as u8],
            _ => self.as_i64().to_be_bytes().to_vec(),
        }
    }

    /// Reads a value of type `ty` from big-endian `bytes`.
    ///
    /// Returns `None` when `bytes` is not exactly `ty.size()` long.
    pub fn decode(bytes: &[u8], ty: &Type) -> Option<Value> {
        let scalar = match ty {
            Type::Primitive(Primitive::I32) => {
                Scalar::Int(i32::from_be_bytes(bytes.try_into().ok()?) as i64)
            }
            Type::Primitive(Primitive::F32) => {
                Scalar::Float(f32::from_be_bytes(bytes.try_into().ok()?) as f64)
            }
            Type::Primitive(Primitive::F64) => Scalar::Float(f64::from_be_bytes(bytes.try_into().ok()?)),
            Type::Primitive(Primitive::Bool | Primitive::Byte) => match bytes {
                [byte] => Scalar::Int(*byte as i64),
                _ => return None,
            },
            _ => Scalar::Int(i64::from_be_bytes(bytes.try_into().ok()?)),
        };

        Some(Value {
            scalar,
            ty: ty.clone(),
        })
    }
}

impl Value {
    /// What `print` writes for this value, without the line break.
    ///
    /// A byte is written as the raw byte rather than as UTF-8 text.
    pub fn printed(&self) -> Vec<u8> {
        match &self.ty {
            Type::Primitive(Primitive::Byte) => vec![self.as_i64() as u8],
            _ => self.to_string().into_bytes(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.ty {
            Type::Primitive(Primitive::Bool) => write!(f, "{}", self.is_true()),
            Type::Primitive(Primitive::Byte) => write!(f, "{}", self.as_i64() as u8 as char),
            Type::Primitive(Primitive::F32 | Primitive::F64) => write!(f, "{:.6}", self.as_f64()),
            Type::Ptr(pointee) => write!(f, "^{}({})", pointee, self.as_i64()),
            _ => write!(f, "{}", self.as_i64()),
        }
    }
}

fn int_binary(operator: Operator, left: i64, right: i64) -> Result<Scalar, ErrorImpl> {
    let value = match operator {
        Operator::Plus => left.wrapping_add(right),
        Operator::Minus => left.wrapping_sub(right),
        Operator::Star => left.wrapping_mul(right),
        Operator::Slash | Operator::Percent if right == 0 => return Err(ErrorImpl::DivisionByZero),
        Operator::Slash => left.wrapping_div(right),
        Operator::Percent => left.wrapping_rem(right),
        Operator::Less => (left < right) as i64,
        Operator::Greater => (left > right) as i64,
        Operator::Equals => (left == right) as i64,
        Operator::NotEquals => (left != right) as i64,
        Operator::And => (left != 0 && right != 0) as i64,
        Operator::Or => (left != 0 || right != 0) as i64,
        _ => {
            return Err(ErrorImpl::OperandTypeError {
                operator: operator.symbol().to_string(),
                left: left.to_string(),
                right: right.to_string(),
            })
        }
    };

    Ok(Scalar::Int(value))
}

fn float_binary(operator: Operator, left: f64, right: f64) -> Scalar {
    match operator {
        Operator::Plus => Scalar::Float(left + right),
        Operator::Minus => Scalar::Float(left - right),
        Operator::Star => Scalar::Float(left * right),
        Operator::Slash => Scalar::Float(left / right),
        Operator::Percent => Scalar::Float(left % right),
        Operator::Less => Scalar::Int((left < right) as i64),
        Operator::Greater => Scalar::Int((left > right) as i64),
        Operator::Equals => Scalar::Int((left == right) as i64),
        _ => Scalar::Int((left != right) as i64),
    }
}

/// Computes `left OP right`; the result type comes from the shared operator table.
pub fn binary(operator: Operator, left: &Value, right: &Value) -> Result<Value, ErrorImpl> {
    let ty = binary_type(operator, &left.ty, &right.ty)?;

    let scalar = if left.ty.is_float() {
        float_binary(operator, left.as_f64(), right.as_f64())
    } else {
        int_binary(operator, left.as_i64(), right.as_i64())?
    };

    Ok(Value::new(scalar, &ty))
}

/// Computes `!` and unary `-`. Dereference needs memory and is left to the caller.
pub fn unary(operator: Operator, operand: &Value) -> Result<Value, ErrorImpl> {
    let ty = unary_type(operator, &operand.ty)?;

    let scalar = match (operator, operand.scalar) {
        (Operator::Not, _) => Scalar::Int(!operand.is_true() as i64),
        (Operator::Negate, Scalar::Float(value)) => Scalar::Float(-value),
        (Operator::Negate, Scalar::Int(value)) => Scalar::Int(value.wrapping_neg()),
        _ => {
            return Err(ErrorImpl::DerefTypeError {
                received: operand.ty.to_string(),
            })
        }
    };

    Ok(Value::new(scalar, &ty))
}
