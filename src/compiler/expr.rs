//! C expression generation.
//!
//! Expressions are rendered through the shared evaluator, so the generated C
//! groups operands exactly as the interpreter does. Every subexpression is
//! parenthesized and cast to the type the operator table gives it.

use crate::{
    errors::errors::{Error, ErrorImpl},
    eval::{
        eval::{evaluate, Apply, Token},
        operators::{binary_type, unary_type, Operator},
    },
    ir::ir::{FuncCall, Operand, VarRef},
    types::types::{FuncType, Primitive, Type},
    Position,
};

/// A rendered C expression and its type.
#[derive(Debug, Clone, PartialEq)]
pub struct CExpr {
    pub text: String,
    pub ty: Type,
}

/// C spelling of a type. Pointers and function references are offsets and
/// table indices, both `i64`.
pub fn c_type(ty: &Type) -> &'static str {
    match ty {
        Type::Primitive(Primitive::I32) => "i32",
        Type::Primitive(Primitive::F32) => "f32",
        Type::Primitive(Primitive::F64) => "f64",
        Type::Primitive(Primitive::Bool) => "boolean",
        Type::Primitive(Primitive::Byte) => "byte",
        _ => "i64",
    }
}

/// C identifier of a variable; unique among the scopes visible at any point.
pub fn c_name(var: &VarRef) -> String {
    format!("v_{}_{}_{}", var.name, var.depth, var.slot)
}

/// C type of a pointer to a function with signature `signature`.
pub fn c_function_pointer(signature: &FuncType) -> String {
    let inputs = signature
        .inputs
        .iter()
        .map(c_type)
        .collect::<Vec<&str>>();
    let inputs = if inputs.is_empty() {
        String::from("void")
    } else {
        inputs.join(", ")
    };

    format!("{} (*)({})", c_type(&signature.output()), inputs)
}

pub fn cast(text: &str, ty: &Type) -> String {
    format!("(({})({}))", c_type(ty), text)
}

pub struct CApply<'a> {
    /// Declaration types of the open scopes, innermost last.
    pub scopes: &'a [Vec<Type>],
    pub position: &'a Position,
}

impl<'a> CApply<'a> {
    fn error(&self, error: ErrorImpl) -> Error {
        Error::new(error, self.position.clone())
    }

    fn variable(&self, var: &VarRef) -> Result<CExpr, Error> {
        let ty = self
            .scopes
            .get(var.scope_index(1))
            .and_then(|scope| scope.get(var.slot))
            .ok_or_else(|| {
                self.error(ErrorImpl::UnresolvedSymbol {
                    variable: var.name.clone(),
                })
            })?;

        Ok(CExpr {
            text: c_name(var),
            ty: ty.clone(),
        })
    }

    fn call(&mut self, call: &'a FuncCall) -> Result<CExpr, Error> {
        let mut arguments = vec![];
        for (argument, input) in call.arguments.iter().zip(call.signature.inputs.iter()) {
            let position = self.position;
            let value = evaluate(self, argument.tokens(), position)?;
            arguments.push(cast(&value.text, input));
        }

        Ok(CExpr {
            text: format!(
                "(({})funcs[{}])({})",
                c_function_pointer(&call.signature),
                c_name(&call.callee),
                arguments.join(", ")
            ),
            ty: call.signature.output(),
        })
    }
}

impl<'a> Apply for CApply<'a> {
    type Operand = (&'a Operand, &'a Type);
    type Value = CExpr;

    fn load(&mut self, operand: Self::Operand) -> Result<CExpr, Error> {
        let (operand, ty) = operand;
        match operand {
            Operand::Int(value) => Ok(CExpr {
                text: cast(&format!("{}LL", value), ty),
                ty: ty.clone(),
            }),
            Operand::Float(value) => Ok(CExpr {
                text: cast(&format!("{:?}", value), ty),
                ty: ty.clone(),
            }),
            Operand::Var(var) => self.variable(var),
            Operand::Call(call) => self.call(call),
            Operand::Operator(_) | Operand::Result => {
                Err(self.error(ErrorImpl::MalformedExpression { remaining: 0 }))
            }
        }
    }

    fn binary(&mut self, operator: Operator, left: CExpr, right: CExpr) -> Result<CExpr, Error> {
        let ty = binary_type(operator, &left.ty, &right.ty).map_err(|error| self.error(error))?;
        let text = format!("{} {} {}", left.text, operator.symbol(), right.text);

        Ok(CExpr {
            text: cast(&text, &ty),
            ty,
        })
    }

    fn unary(&mut self, operator: Operator, operand: CExpr) -> Result<CExpr, Error> {
        let ty = unary_type(operator, &operand.ty).map_err(|error| self.error(error))?;

        let text = match operator {
            Operator::Deref => format!("load_{}({})", c_type(&ty), operand.text),
            _ => cast(&format!("{}{}", operator.symbol(), operand.text), &ty),
        };

        Ok(CExpr { text, ty })
    }
}

/// Renders a token stream as one C expression.
pub fn gen_expression<'a>(
    scopes: &'a [Vec<Type>],
    tokens: Vec<Token<(&'a Operand, &'a Type)>>,
    position: &'a Position,
) -> Result<CExpr, Error> {
    let mut apply = CApply { scopes, position };
    evaluate(&mut apply, tokens, position)
}
