use crate::{
    errors::errors::{Error, ErrorImpl},
    ir::ir::{OpKind, Operand, Operation, VarRef},
    types::types::Type,
};

use super::{
    compiler::Compiler,
    expr::{c_name, c_type, cast},
};

/// `(variable, type)` pairs declared by a `BeginScope`.
pub fn declared_vars(operation: &Operation) -> impl Iterator<Item = (&VarRef, &Type)> {
    operation
        .operands
        .iter()
        .zip(operation.types.iter())
        .skip(1)
        .filter_map(|(operand, ty)| match operand {
            Operand::Var(var) => Some((var, ty)),
            _ => None,
        })
}

/// Emits zero-initialized C declarations for the variables of a `BeginScope`,
/// skipping the first `skip`.
pub fn gen_declarations(compiler: &mut Compiler, operation: &Operation, skip: usize, prefix: &str) {
    for (var, ty) in declared_vars(operation).skip(skip) {
        compiler.line(&format!("{}{} {} = 0;", prefix, c_type(ty), c_name(var)));
    }
}

fn target_type(operation: &Operation) -> Result<&Type, Error> {
    operation.types.last().ok_or_else(|| {
        Error::new(
            ErrorImpl::MalformedExpression { remaining: 0 },
            operation.position.clone(),
        )
    })
}

fn gen_mov(compiler: &mut Compiler, operation: &Operation) -> Result<(), Error> {
    let value = compiler.pending_expression(&operation.position)?;
    let ty = target_type(operation)?;

    let (var, deref) = operation.mov_target().ok_or_else(|| {
        Error::new(
            ErrorImpl::MalformedExpression { remaining: 0 },
            operation.position.clone(),
        )
    })?;

    if deref {
        let pointee = ty.pointee().ok_or_else(|| {
            Error::new(
                ErrorImpl::DerefTypeError {
                    received: ty.to_string(),
                },
                operation.position.clone(),
            )
        })?;
        let pointee = Type::Primitive(pointee);

        compiler.line(&format!(
            "store_{}({}, {});",
            c_type(&pointee),
            c_name(var),
            cast(&value.text, &pointee)
        ));
    } else {
        compiler.line(&format!("{} = {};", c_name(var), cast(&value.text, ty)));
    }

    Ok(())
}

fn gen_print(compiler: &mut Compiler, operation: &Operation) -> Result<(), Error> {
    let value = compiler.pending_expression(&operation.position)?;
    let ty = operation.types.first().unwrap_or(&value.ty);

    match ty {
        Type::Ptr(pointee) => {
            compiler.line(&format!("print_ptr(\"{}\", {});", pointee, value.text))
        }
        _ => compiler.line(&format!("print_{}({});", c_type(ty), cast(&value.text, ty))),
    }

    Ok(())
}

/// Emits the C for one operation of a body.
///
/// Scopes become C blocks, so the jump lengths and back-edges of the IR are
/// not needed: `if`/`else`/`while` take their structure from the blocks that
/// follow them.
pub fn gen_operation<'a>(compiler: &mut Compiler<'a>, operation: &'a Operation) -> Result<(), Error> {
    match operation.kind {
        OpKind::BeginScope => {
            compiler.line("{");
            compiler.open_scope(operation);
            gen_declarations(compiler, operation, 0, "");
        }
        OpKind::EndScope => {
            compiler.close_scope();
            compiler.line("}");
        }
        OpKind::Push => compiler.pending = Some(operation),
        OpKind::Mov => gen_mov(compiler, operation)?,
        OpKind::If => {
            let condition = compiler.pending_expression(&operation.position)?;
            compiler.line(&format!("if ({})", condition.text));
        }
        OpKind::ElseIf => {
            let condition = compiler.pending_expression(&operation.position)?;
            compiler.line(&format!("else if ({})", condition.text));
        }
        OpKind::Else => compiler.line("else"),
        OpKind::While => {
            let condition = compiler.pending_expression(&operation.position)?;
            compiler.line(&format!("while ({})", condition.text));
        }
        OpKind::Print => gen_print(compiler, operation)?,
        OpKind::Return => {
            let value = compiler.pending_expression(&operation.position)?;
            let ty = operation.types.first().unwrap_or(&value.ty);
            compiler.line(&format!("return {};", cast(&value.text, ty)));
        }
    }

    Ok(())
}
