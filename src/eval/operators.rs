use std::fmt::Display;

use crate::{
    errors::errors::ErrorImpl,
    types::types::{Family, Primitive, Type},
};

/// Precedence levels, lowest first.
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub enum BindingPower {
    Default,
    Logical,
    Equality,
    Relational,
    Additive,
    Multiplicative,
    Unary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Or,
    And,
    Equals,
    NotEquals,
    Less,
    Greater,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Not,
    Deref,
    Negate,
    OpenParen,
    CloseParen,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        match symbol {
            "||" => Some(Operator::Or),
            "&&" => Some(Operator::And),
            "==" => Some(Operator::Equals),
            "!=" => Some(Operator::NotEquals),
            "<" => Some(Operator::Less),
            ">" => Some(Operator::Greater),
            "+" => Some(Operator::Plus),
            "-" => Some(Operator::Minus),
            "*" => Some(Operator::Star),
            "/" => Some(Operator::Slash),
            "%" => Some(Operator::Percent),
            "!" => Some(Operator::Not),
            "^" => Some(Operator::Deref),
            "(" => Some(Operator::OpenParen),
            ")" => Some(Operator::CloseParen),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Or => "||",
            Operator::And => "&&",
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Percent => "%",
            Operator::Not => "!",
            Operator::Deref => "^",
            Operator::Negate => "-",
            Operator::OpenParen => "(",
            Operator::CloseParen => ")",
        }
    }

    pub fn binding_power(&self) -> BindingPower {
        match self {
            Operator::Or | Operator::And => BindingPower::Logical,
            Operator::Equals | Operator::NotEquals => BindingPower::Equality,
            Operator::Less | Operator::Greater => BindingPower::Relational,
            Operator::Plus | Operator::Minus => BindingPower::Additive,
            Operator::Star | Operator::Slash | Operator::Percent => BindingPower::Multiplicative,
            Operator::Not | Operator::Deref | Operator::Negate => BindingPower::Unary,
            Operator::OpenParen | Operator::CloseParen => BindingPower::Default,
        }
    }

    pub fn is_unary(&self) -> bool {
        matches!(self, Operator::Not | Operator::Deref | Operator::Negate)
    }

    pub fn is_paren(&self) -> bool {
        matches!(self, Operator::OpenParen | Operator::CloseParen)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

fn operand_error(operator: Operator, left: &Type, right: &Type) -> ErrorImpl {
    ErrorImpl::OperandTypeError {
        operator: operator.symbol().to_string(),
        left: left.to_string(),
        right: right.to_string(),
    }
}

fn same_numeric_family(left: &Type, right: &Type) -> bool {
    left.is_numeric() && left.family() == right.family()
}

/// Result type of `left OP right`.
///
/// Both the type checker and the interpreter derive result types from this
/// table, so static and dynamic evaluation always agree.
pub fn binary_type(operator: Operator, left: &Type, right: &Type) -> Result<Type, ErrorImpl> {
    let valid = match operator {
        Operator::Plus | Operator::Minus => {
            same_numeric_family(left, right)
                || (left.family() == Family::Pointer && right.family() == Family::Integral)
        }
        Operator::Star | Operator::Slash => same_numeric_family(left, right),
        Operator::Percent => {
            left.family() == Family::Integral && right.family() == Family::Integral
        }
        Operator::Less | Operator::Greater => {
            same_numeric_family(left, right)
                || (left.family() == Family::Pointer && right.family() == Family::Pointer)
        }
        Operator::Equals | Operator::NotEquals => {
            left == right
                || same_numeric_family(left, right)
                || (left.family() == Family::Pointer && right.family() == Family::Pointer)
        }
        Operator::And | Operator::Or => *left == Type::BOOL && *right == Type::BOOL,
        _ => false,
    };

    if !valid {
        return Err(operand_error(operator, left, right));
    }

    Ok(match operator {
        Operator::Plus | Operator::Minus | Operator::Star | Operator::Slash => left.clone(),
        Operator::Percent => Type::I64,
        _ => Type::BOOL,
    })
}

/// Result type of a prefix operator applied to `operand`.
pub fn unary_type(operator: Operator, operand: &Type) -> Result<Type, ErrorImpl> {
    match operator {
        Operator::Not if *operand == Type::BOOL => Ok(Type::BOOL),
        Operator::Negate if operand.is_numeric() => Ok(operand.clone()),
        Operator::Deref => match operand.pointee() {
            Some(pointee) => Ok(Type::Primitive(pointee)),
            None => Err(ErrorImpl::DerefTypeError {
                received: operand.to_string(),
            }),
        },
        _ => Err(operand_error(
            operator,
            operand,
            &Type::Primitive(Primitive::Unknown),
        )),
    }
}
