use std::mem;

use tracing::debug;

use crate::{
    errors::errors::{Error, ErrorImpl},
    eval::operators::Operator,
    ir::ir::{Expression, Function, OpKind, Operand, Operation, Target},
    lexer::tokens::{Token, TokenKind},
    types::types::{parse_type, FuncType, Type},
    Position,
};

use super::{
    expr::{is_identifier, parse_expression},
    parser::{Block, BlockKind, FunctionContext, Parser},
};

pub fn parse_stmt(parser: &mut Parser) -> Result<(), Error> {
    parser.else_allowed = mem::take(&mut parser.chain_open);

    let kind = parser.current_token_kind();
    match parser.get_stmt_lookup().get(&kind).copied() {
        Some(handler) => handler(parser),
        None => {
            let token = parser.current_token();
            Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: token.value.clone(),
                },
                token.position.clone(),
            ))
        }
    }
}

/// Consumes an `Expression` token and splits it into operands.
fn parse_expression_token(parser: &mut Parser) -> Result<(Expression, Position), Error> {
    let error = Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: parser.current_token().value.clone(),
            message: String::from("expected an expression"),
        },
        parser.get_position(),
    );
    let token = parser.expect_error(TokenKind::Expression, Some(error))?;
    let expression = parse_expression(parser, &token.value, &token.position)?;

    Ok((expression, token.position))
}

/// Expects the `{` of a block and opens its scope.
fn open_block(
    parser: &mut Parser,
    kind: BlockKind,
    opener: usize,
    position: Position,
) -> Result<(), Error> {
    let open = parser.expect(TokenKind::OpenCurly)?;
    parser.blocks.push(Block {
        kind,
        opener,
        position,
    });
    parser.open_scope(open.position);
    Ok(())
}

/// Emits `Push cond` followed by an unpatched `kind` operation.
fn emit_guard(parser: &mut Parser, kind: OpKind) -> Result<usize, Error> {
    let (condition, position) = parse_expression_token(parser)?;
    parser.emit(Operation::push(condition, position.clone()));
    Ok(parser.emit(Operation::new(kind, position, vec![], vec![])))
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<(), Error> {
    let start = parser.advance();
    let opener = emit_guard(parser, OpKind::If)?;
    open_block(parser, BlockKind::If, opener, start.position)
}

pub fn parse_else_stmt(parser: &mut Parser) -> Result<(), Error> {
    let start = parser.advance();

    if !parser.else_allowed {
        return Err(Error::new(ErrorImpl::DanglingElse, start.position));
    }

    if parser.current_token_kind() == TokenKind::If {
        parser.advance();
        let opener = emit_guard(parser, OpKind::ElseIf)?;
        open_block(parser, BlockKind::ElseIf, opener, start.position)
    } else {
        let opener = parser.emit(Operation::new(
            OpKind::Else,
            start.position.clone(),
            vec![],
            vec![],
        ));
        open_block(parser, BlockKind::Else, opener, start.position)
    }
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<(), Error> {
    let start = parser.advance();
    let opener = emit_guard(parser, OpKind::While)?;
    open_block(parser, BlockKind::While, opener, start.position)
}

pub fn parse_print_stmt(parser: &mut Parser) -> Result<(), Error> {
    parser.advance();
    let (expression, position) = parse_expression_token(parser)?;

    parser.emit(Operation::push(expression, position.clone()));
    parser.emit(Operation::new(
        OpKind::Print,
        position,
        vec![Operand::Result],
        vec![Type::UNKNOWN],
    ));
    Ok(())
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<(), Error> {
    let start = parser.advance();

    if parser.target == Target::Global {
        return Err(Error::new(ErrorImpl::ReturnOutsideFunction, start.position));
    }

    let (expression, position) = parse_expression_token(parser)?;
    parser.emit(Operation::push(expression, position.clone()));
    parser.emit(Operation::new(
        OpKind::Return,
        position,
        vec![Operand::Result],
        vec![Type::UNKNOWN],
    ));
    Ok(())
}

/// Writes the length of the block opened at `opener` and closed at `end`.
fn patch_jump(parser: &mut Parser, opener: usize, end: usize) -> usize {
    let length = end - opener;
    let operation = &mut parser.operations_mut()[opener];

    debug_assert!(operation.is_unpatched());
    operation.operands = vec![Operand::Int(length as i64)];
    operation.types = vec![Type::I64];

    debug!(kind = ?operation.kind, opener, length, "patched jump");
    length
}

pub fn parse_close_block_stmt(parser: &mut Parser) -> Result<(), Error> {
    let token = parser.advance();

    let block = parser
        .blocks
        .pop()
        .ok_or_else(|| Error::new(ErrorImpl::UnbalancedBlock, token.position.clone()))?;
    let end = parser.close_scope(token.position);

    match block.kind {
        BlockKind::If | BlockKind::ElseIf | BlockKind::Else => {
            patch_jump(parser, block.opener, end);
            parser.chain_open = block.kind != BlockKind::Else;
        }
        BlockKind::While => {
            let length = patch_jump(parser, block.opener, end);
            let end_scope = &mut parser.operations_mut()[end];

            // Lands on the `Push` feeding the condition.
            end_scope.operands = vec![Operand::Int(-(length as i64 + 1))];
            end_scope.types = vec![Type::I64];
        }
        BlockKind::Function(index) => close_function(parser, index),
    }

    Ok(())
}

fn close_function(parser: &mut Parser, index: usize) {
    if let Some(context) = parser.saved.pop() {
        parser.target = context.target;
        parser.scopes.truncate(1);
        parser.scopes.extend(context.scopes);
        parser.blocks = context.blocks;
    }

    debug!(function = index, "closed function body");
}

fn parameter_error(token: &Token, message: &str) -> Error {
    Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: token.value.clone(),
            message: message.to_string(),
        },
        token.position.clone(),
    )
}

/// Parses a concrete, non-deferred type annotation.
fn parse_signature_type(name: &str, position: &Position) -> Result<Type, Error> {
    let ty = parse_type(name).map_err(|error| Error::new(error, position.clone()))?;

    if !ty.is_concrete() {
        return Err(Error::new(
            ErrorImpl::UnknownType {
                type_: name.to_string(),
            },
            position.clone(),
        ));
    }

    Ok(ty)
}

fn parse_parameters(params: &Token) -> Result<Vec<(String, Type)>, Error> {
    let mut parameters = vec![];

    for parameter in params.value.split(',') {
        let parameter = parameter.trim();
        if parameter.is_empty() {
            if params.value.trim().is_empty() {
                continue;
            }
            return Err(parameter_error(params, "empty parameter"));
        }

        let (name, annotation) = parameter
            .split_once(':')
            .ok_or_else(|| parameter_error(params, "expected `name: type` parameter"))?;
        let name = name.trim();

        if !is_identifier(name) {
            return Err(parameter_error(params, "invalid parameter name"));
        }

        let ty = parse_signature_type(annotation.trim(), &params.position)?;
        parameters.push((name.to_string(), ty));
    }

    Ok(parameters)
}

fn parse_outputs(returns: &Token) -> Result<Vec<Type>, Error> {
    let outputs = returns
        .value
        .split(',')
        .map(str::trim)
        .filter(|output| !output.is_empty())
        .map(|output| parse_signature_type(output, &returns.position))
        .collect::<Result<Vec<Type>, Error>>()?;

    if outputs.len() != 1 {
        return Err(parameter_error(
            returns,
            "functions return exactly one value",
        ));
    }

    Ok(outputs)
}

/// `name = func(a: t, ...) -> (t) {`
///
/// Declares `name` in the current scope, stores the function index in it and
/// switches emission to the function's own sequence. The body sees its own
/// scopes and the global scope only.
fn parse_function_stmt(parser: &mut Parser, name: Token) -> Result<(), Error> {
    parser.expect(TokenKind::Assignment)?;
    parser.expect(TokenKind::Func)?;
    let params = parser.expect(TokenKind::Params)?;
    let returns = parser.expect(TokenKind::Returns)?;

    let parameters = parse_parameters(&params)?;
    let signature = FuncType {
        inputs: parameters.iter().map(|(_, ty)| ty.clone()).collect(),
        outputs: parse_outputs(&returns)?,
    };
    let ty = Type::Func(signature.clone());

    let var = parser.declare(&name.value, ty.clone(), &name.position)?;
    let index = parser.program.functions.len();
    parser.program.functions.push(Function {
        name: name.value.clone(),
        signature,
        operations: vec![],
    });

    parser.emit(Operation::new(
        OpKind::Push,
        name.position.clone(),
        vec![Operand::Int(index as i64)],
        vec![ty.clone()],
    ));
    parser.emit(Operation::new(
        OpKind::Mov,
        name.position.clone(),
        vec![Operand::Var(var)],
        vec![ty],
    ));

    let open = parser.expect(TokenKind::OpenCurly)?;

    let context = FunctionContext {
        target: parser.target,
        scopes: parser.scopes.split_off(1),
        blocks: mem::take(&mut parser.blocks),
    };
    parser.saved.push(context);
    parser.target = Target::Function(index);
    parser.blocks.push(Block {
        kind: BlockKind::Function(index),
        opener: 0,
        position: name.position.clone(),
    });
    parser.open_scope(open.position);

    for (parameter, ty) in parameters {
        parser.declare(&parameter, ty, &params.position)?;
    }

    debug!(function = index, name = %name.value, "opened function body");
    Ok(())
}

/// Declarations, assignments and stores through pointers.
///
/// `x: t`, `x: t = e` and `x := e` declare in the innermost scope; `x = e`
/// assigns to the visible `x`; `^p = e` stores through the pointer `p`.
pub fn parse_symbol_stmt(parser: &mut Parser) -> Result<(), Error> {
    let deref = if parser.current_token_kind() == TokenKind::Deref {
        parser.advance();
        true
    } else {
        false
    };

    let name = parser.expect(TokenKind::Identifier)?;

    if !deref
        && parser.current_token_kind() == TokenKind::Assignment
        && parser.peek_kind(1) == Some(TokenKind::Func)
    {
        return parse_function_stmt(parser, name);
    }

    // `Some(None)` is a `:=` declaration.
    let annotation = if parser.current_token_kind() == TokenKind::Colon {
        parser.advance();
        if parser.current_token_kind() == TokenKind::Type {
            let token = parser.advance();
            let ty = parse_type(&token.value).map_err(|error| Error::new(error, token.position))?;
            Some(Some(ty))
        } else {
            Some(None)
        }
    } else {
        None
    };

    if parser.current_token_kind() != TokenKind::Assignment {
        return match annotation {
            Some(Some(ty)) if !deref => {
                parser.declare(&name.value, ty, &name.position)?;
                Ok(())
            }
            _ => {
                let token = parser.current_token();
                Err(Error::new(
                    ErrorImpl::UnexpectedToken {
                        token: token.value.clone(),
                    },
                    token.position.clone(),
                ))
            }
        };
    }
    parser.advance();

    // The right-hand side is resolved before the target is declared.
    let (expression, _) = parse_expression_token(parser)?;
    parser.emit(Operation::push(expression, name.position.clone()));

    let (operands, types) = match annotation {
        Some(_) if deref => {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: name.value.clone(),
                    message: String::from("cannot declare a variable through a pointer"),
                },
                name.position,
            ))
        }
        Some(ty) => {
            let ty = ty.unwrap_or(Type::UNTYPED);
            let var = parser.declare(&name.value, ty.clone(), &name.position)?;
            (vec![Operand::Var(var)], vec![ty])
        }
        None => {
            let (var, ty) = parser.resolve(&name.value).ok_or_else(|| {
                Error::new(
                    ErrorImpl::ExpectedExplicitType {
                        variable: name.value.clone(),
                    },
                    name.position.clone(),
                )
            })?;

            if deref {
                if ty.is_concrete() && ty.pointee().is_none() {
                    return Err(Error::new(
                        ErrorImpl::DerefNonPointer {
                            variable: name.value.clone(),
                        },
                        name.position,
                    ));
                }
                (
                    vec![Operand::Operator(Operator::Deref), Operand::Var(var)],
                    vec![Type::OPERATOR, ty],
                )
            } else {
                (vec![Operand::Var(var)], vec![ty])
            }
        }
    };

    parser.emit(Operation::new(OpKind::Mov, name.position, operands, types));
    Ok(())
}
