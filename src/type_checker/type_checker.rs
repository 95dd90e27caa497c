use tracing::debug;

use crate::{
    errors::errors::{Error, ErrorImpl},
    eval::{
        eval::{evaluate, Apply},
        operators::{binary_type, unary_type, Operator},
    },
    ir::ir::{Expression, FuncCall, OpKind, Operand, Operation, Program, VarRef},
    types::types::{Family, Primitive, Type},
    Position,
};

/// Type state of one declaration.
///
/// A deferred declaration starts `Pending` and becomes `Resolved` at its first
/// assignment; that is the only legal transition.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclState {
    Pending,
    Resolved(Type),
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub state: DeclState,
    /// Declared with `:=` or `defer`; its type is then fixed by the first assignment.
    pub deferred: bool,
}

/// Declarations of one open scope.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Index of the scope's `BeginScope` in the sequence being checked.
    pub begin: usize,
    pub variables: Vec<Declaration>,
}

impl Environment {
    pub fn from_scope(begin: usize, operation: &Operation) -> Self {
        let variables = operation
            .declarations()
            .map(|(name, ty)| {
                let deferred = ty.is_untyped();
                let state = if deferred {
                    DeclState::Pending
                } else {
                    DeclState::Resolved(ty.clone())
                };
                Declaration {
                    name: name.to_string(),
                    state,
                    deferred,
                }
            })
            .collect();

        Environment { begin, variables }
    }
}

fn lookup<'e>(environments: &'e [Environment], var: &VarRef) -> Option<&'e DeclState> {
    environments
        .get(var.scope_index(1))
        .and_then(|environment| environment.variables.get(var.slot))
        .map(|declaration| &declaration.state)
}

enum Literal {
    Int(i64),
    Float,
}

/// The number an expression consists of, if it is a lone, possibly negated, literal.
fn literal(expression: &Expression) -> Option<Literal> {
    match expression.operands.as_slice() {
        [Operand::Int(value)] => Some(Literal::Int(*value)),
        [Operand::Operator(Operator::Negate), Operand::Int(value)] => {
            value.checked_neg().map(Literal::Int)
        }
        [Operand::Float(_)] | [Operand::Operator(Operator::Negate), Operand::Float(_)] => {
            Some(Literal::Float)
        }
        _ => None,
    }
}

/// Whether `expression`, of type `result`, may be stored into an annotated `expected`.
///
/// Beyond widening, a literal narrows to any type that represents it.
fn assignable(expected: &Type, result: &Type, expression: &Expression) -> bool {
    if expected.accepts(result) {
        return true;
    }

    match literal(expression) {
        Some(Literal::Int(value)) => result == &Type::I64 && expected.holds_integer(value),
        Some(Literal::Float) => *expected == Type::Primitive(Primitive::F32),
        None => false,
    }
}

fn not_declared(var: &VarRef, position: &Position) -> Error {
    Error::new(
        ErrorImpl::VariableNotDeclared {
            variable: var.name.clone(),
        },
        position.clone(),
    )
}

/// Evaluates expressions over types.
struct TypeApply<'a> {
    environments: &'a [Environment],
    position: &'a Position,
}

impl<'a> TypeApply<'a> {
    fn error(&self, error: ErrorImpl) -> Error {
        Error::new(error, self.position.clone())
    }

    fn variable_type(&self, var: &VarRef) -> Result<Type, Error> {
        match lookup(self.environments, var) {
            Some(DeclState::Resolved(ty)) => Ok(ty.clone()),
            Some(DeclState::Pending) => Err(self.error(ErrorImpl::PendingType {
                variable: var.name.clone(),
            })),
            None => Err(not_declared(var, self.position)),
        }
    }

    fn call_type(&mut self, call: &'a FuncCall) -> Result<Type, Error> {
        let expected = call.signature.inputs.len();
        let received = call.arguments.len();

        if received > expected {
            return Err(self.error(ErrorImpl::UnexpectedArguments { expected, received }));
        }
        if received < expected {
            return Err(self.error(ErrorImpl::MissingArguments { expected, received }));
        }

        for (argument, input) in call.arguments.iter().zip(call.signature.inputs.iter()) {
            let position = self.position;
            let ty = evaluate(self, argument.tokens(), position)?;

            if !assignable(input, &ty, argument) {
                return Err(self.error(ErrorImpl::ArgumentTypeMatchError {
                    expected: input.to_string(),
                    received: ty.to_string(),
                }));
            }
        }

        Ok(call.signature.output())
    }
}

impl<'a> Apply for TypeApply<'a> {
    type Operand = (&'a Operand, &'a Type);
    type Value = Type;

    fn load(&mut self, operand: Self::Operand) -> Result<Type, Error> {
        match operand {
            (Operand::Var(var), _) => self.variable_type(var),
            (Operand::Call(call), _) => self.call_type(call),
            (_, ty) => Ok(ty.clone()),
        }
    }

    fn binary(&mut self, operator: Operator, left: Type, right: Type) -> Result<Type, Error> {
        binary_type(operator, &left, &right).map_err(|error| self.error(error))
    }

    fn unary(&mut self, operator: Operator, operand: Type) -> Result<Type, Error> {
        unary_type(operator, &operand).map_err(|error| self.error(error))
    }
}

#[derive(Debug, Default)]
pub struct TypeChecker {
    pub environments: Vec<Environment>,
    /// The global scope as it stood when the top-level sequence ended.
    pub globals: Option<Environment>,
    /// Output type of the function being checked.
    pub function_output: Option<Type>,
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker::default()
    }

    fn expression(pending: Option<Expression>, position: &Position) -> Result<Expression, Error> {
        pending.ok_or_else(|| {
            Error::new(
                ErrorImpl::MalformedExpression { remaining: 0 },
                position.clone(),
            )
        })
    }

    fn evaluate(&self, expression: &Expression, position: &Position) -> Result<Type, Error> {
        let mut apply = TypeApply {
            environments: &self.environments,
            position,
        };
        evaluate(&mut apply, expression.tokens(), position)
    }

    fn check_condition(&self, expression: &Expression, position: &Position) -> Result<(), Error> {
        let ty = self.evaluate(expression, position)?;

        if ty != Type::BOOL {
            return Err(Error::new(
                ErrorImpl::ConditionTypeError {
                    received: ty.to_string(),
                },
                position.clone(),
            ));
        }

        Ok(())
    }

    /// Checks an assignment of `expression`, of type `result`, resolving a deferred target.
    ///
    /// A deferred target only ever takes values of its resolved type.
    fn check_mov(
        &mut self,
        operation: &mut Operation,
        expression: &Expression,
        result: Type,
    ) -> Result<(), Error> {
        let position = operation.position.clone();
        let (var, deref) = match operation.mov_target() {
            Some((var, deref)) => (var.clone(), deref),
            None => {
                return Err(Error::new(
                    ErrorImpl::MalformedExpression { remaining: 0 },
                    position,
                ))
            }
        };

        let declaration = self
            .environments
            .get_mut(var.scope_index(1))
            .and_then(|environment| environment.variables.get_mut(var.slot))
            .ok_or_else(|| not_declared(&var, &position))?;
        let deferred = declaration.deferred;
        let state = &mut declaration.state;

        let target_type = if deref {
            let pointer = match state {
                DeclState::Resolved(ty) => ty.clone(),
                DeclState::Pending => {
                    return Err(Error::new(
                        ErrorImpl::PendingType {
                            variable: var.name.clone(),
                        },
                        position,
                    ))
                }
            };

            let pointee = pointer.pointee().ok_or_else(|| {
                Error::new(
                    ErrorImpl::DerefTypeError {
                        received: pointer.to_string(),
                    },
                    position.clone(),
                )
            })?;

            let expected = Type::Primitive(pointee);
            if !assignable(&expected, &result, expression) {
                return Err(Error::new(
                    ErrorImpl::TypeMatchError {
                        expected: expected.to_string(),
                        received: result.to_string(),
                    },
                    position,
                ));
            }
            pointer
        } else {
            match state {
                DeclState::Pending => {
                    debug!(variable = %var.name, ty = %result, "resolved deferred declaration");
                    *state = DeclState::Resolved(result.clone());
                    result
                }
                DeclState::Resolved(declared) => {
                    let matches = if deferred {
                        *declared == result
                    } else {
                        assignable(declared, &result, expression)
                    };
                    if !matches {
                        return Err(Error::new(
                            ErrorImpl::TypeMatchError {
                                expected: declared.to_string(),
                                received: result.to_string(),
                            },
                            position,
                        ));
                    }
                    declared.clone()
                }
            }
        };

        if let Some(ty) = operation.types.last_mut() {
            *ty = target_type;
        }

        Ok(())
    }

    /// Pops the innermost scope and writes its resolved types into its `BeginScope`.
    fn close_environment(
        &mut self,
        operations: &mut [Operation],
        position: &Position,
    ) -> Result<(), Error> {
        let Some(environment) = self.environments.pop() else {
            return Err(Error::new(ErrorImpl::UnbalancedBlock, position.clone()));
        };

        let begin = &mut operations[environment.begin];
        for (slot, declaration) in environment.variables.iter().enumerate() {
            match &declaration.state {
                DeclState::Pending => {
                    return Err(Error::new(
                        ErrorImpl::UnresolvedType {
                            variable: declaration.name.clone(),
                        },
                        position.clone(),
                    ))
                }
                DeclState::Resolved(ty) => {
                    if let Some(declared) = begin.declaration_type_mut(slot) {
                        *declared = ty.clone();
                    }
                }
            }
        }

        if self.environments.is_empty() && self.function_output.is_none() {
            self.globals = Some(environment);
        }

        Ok(())
    }

    /// Checks one operation sequence in order, patching it in place.
    pub fn check_sequence(&mut self, operations: &mut [Operation]) -> Result<(), Error> {
        let mut pending: Option<Expression> = None;

        for index in 0..operations.len() {
            let kind = operations[index].kind;
            let position = operations[index].position.clone();

            match kind {
                OpKind::BeginScope => {
                    let environment = Environment::from_scope(index, &operations[index]);
                    self.environments.push(environment);
                }
                OpKind::EndScope => self.close_environment(operations, &position)?,
                OpKind::Push => {
                    let operation = &operations[index];
                    pending = Some(Expression {
                        operands: operation.operands.clone(),
                        types: operation.types.clone(),
                    });
                }
                OpKind::Mov => {
                    let expression = Self::expression(pending.take(), &position)?;
                    let result = self.evaluate(&expression, &position)?;
                    self.check_mov(&mut operations[index], &expression, result)?;
                }
                OpKind::If | OpKind::ElseIf | OpKind::While => {
                    let expression = Self::expression(pending.take(), &position)?;
                    self.check_condition(&expression, &position)?;
                }
                OpKind::Else => {}
                OpKind::Print => {
                    let expression = Self::expression(pending.take(), &position)?;
                    let ty = self.evaluate(&expression, &position)?;

                    if ty.family() == Family::Function {
                        return Err(Error::new(
                            ErrorImpl::UnprintableType {
                                type_: ty.to_string(),
                            },
                            position,
                        ));
                    }
                    operations[index].types = vec![ty];
                }
                OpKind::Return => {
                    let expression = Self::expression(pending.take(), &position)?;
                    let ty = self.evaluate(&expression, &position)?;
                    let expected = self
                        .function_output
                        .clone()
                        .ok_or_else(|| Error::new(ErrorImpl::ReturnOutsideFunction, position.clone()))?;

                    if expected != ty {
                        return Err(Error::new(
                            ErrorImpl::ReturnTypeError {
                                expected: expected.to_string(),
                                received: ty.to_string(),
                            },
                            position,
                        ));
                    }
                    operations[index].types = vec![expected];
                }
            }
        }

        Ok(())
    }
}

/// Type checks `program` and returns a copy with every deferred declaration,
/// assignment target and printed or returned value carrying its resolved type.
///
/// The top-level sequence is checked first, then each function body against
/// the final global scope.
pub fn type_check(program: &Program) -> Result<Program, Error> {
    let mut program = program.clone();
    let mut checker = TypeChecker::new();

    checker.check_sequence(&mut program.operations)?;
    let globals = checker.globals.take();

    for function in program.functions.iter_mut() {
        checker.environments = globals.iter().cloned().collect();
        checker.function_output = Some(function.signature.output());
        checker.check_sequence(&mut function.operations)?;

        let returns = function
            .operations
            .iter()
            .any(|operation| operation.kind == OpKind::Return);

        if !returns {
            let position = function
                .operations
                .first()
                .map(|operation| operation.position.clone())
                .unwrap_or_else(Position::null);

            return Err(Error::new(
                ErrorImpl::MissingReturn {
                    function: function.name.clone(),
                },
                position,
            ));
        }

        debug!(function = %function.name, "checked function body");
    }

    Ok(program)
}
