use std::{io::Write, mem};

use tracing::{debug, trace};

use crate::{
    errors::errors::{Error, ErrorImpl},
    eval::{
        eval::{evaluate, Apply, Token},
        operators::Operator,
    },
    ir::ir::{FuncCall, OpKind, Operand, Operation, Program, VarRef},
    types::types::Type,
    Position,
};

use super::value::{self, Scalar, Value};

/// Storage of one declared variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    pub name: String,
    pub ty: Type,
    pub bytes: Vec<u8>,
}

/// Variables of one open scope.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub vars: Vec<Var>,
    /// Whether a branch of the current `if` chain in this scope has been taken.
    pub chain: bool,
}

impl Frame {
    /// Materializes the zero-initialized variables of a `BeginScope`.
    pub fn from_scope(operation: &Operation) -> Self {
        let vars = operation
            .declarations()
            .map(|(name, ty)| Var {
                name: name.to_string(),
                ty: ty.clone(),
                bytes: vec![0; ty.size()],
            })
            .collect();

        Frame { vars, chain: false }
    }
}

/// An operand loaded by `Push`.
///
/// Variables are decoded when loaded; calls run only when the consuming
/// operation evaluates the expression.
#[derive(Debug, Clone)]
pub enum Pending<'a> {
    Value(Value),
    Call(&'a FuncCall),
}

pub struct Interpreter<'a, W: Write> {
    program: &'a Program,
    frames: Vec<Frame>,
    memory: Vec<u8>,
    /// Frame index of the innermost function body, 1 at the top level.
    base: usize,
    position: Position,
    out: W,
}

impl<'a, W: Write> Interpreter<'a, W> {
    pub fn new(program: &'a Program, out: W) -> Self {
        Interpreter {
            program,
            frames: vec![],
            memory: vec![0; program.memory_capacity],
            base: 1,
            position: Position::null(),
            out,
        }
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Executes the top-level operations to completion.
    pub fn run(&mut self) -> Result<(), Error> {
        let program = self.program;
        debug!(
            operations = program.operations.len(),
            memory = program.memory_capacity,
            "running program"
        );

        self.execute(&program.operations, 0)?;
        self.out.flush().map_err(|error| {
            self.error(ErrorImpl::OutputError {
                message: error.to_string(),
            })
        })
    }

    fn error(&self, error: ErrorImpl) -> Error {
        Error::new(error, self.position.clone())
    }

    fn malformed(&self) -> Error {
        self.error(ErrorImpl::MalformedExpression { remaining: 0 })
    }

    fn unresolved(&self, var: &VarRef) -> Error {
        self.error(ErrorImpl::UnresolvedSymbol {
            variable: var.name.clone(),
        })
    }

    fn var(&self, var: &VarRef) -> Result<&Var, Error> {
        self.frames
            .get(var.scope_index(self.base))
            .and_then(|frame| frame.vars.get(var.slot))
            .ok_or_else(|| self.unresolved(var))
    }

    fn read(&self, var: &VarRef) -> Result<Value, Error> {
        let storage = self.var(var)?;
        Value::decode(&storage.bytes, &storage.ty).ok_or_else(|| self.unresolved(var))
    }

    /// Range of `size` bytes at `offset`, if it lies inside global memory.
    fn bounds(&self, offset: i64, size: usize) -> Result<std::ops::Range<usize>, Error> {
        let capacity = self.memory.len();
        usize::try_from(offset)
            .ok()
            .and_then(|start| Some(start..start.checked_add(size)?))
            .filter(|range| range.end <= capacity)
            .ok_or_else(|| {
                self.error(ErrorImpl::MemoryOutOfBounds {
                    offset,
                    size,
                    capacity,
                })
            })
    }

    fn load_tokens(
        &self,
        tokens: Vec<Token<(&'a Operand, &'a Type)>>,
    ) -> Result<Vec<Token<Pending<'a>>>, Error> {
        tokens
            .into_iter()
            .map(|token| match token {
                Token::Operator(operator) => Ok(Token::Operator(operator)),
                Token::Operand((operand, ty)) => {
                    let pending = match operand {
                        Operand::Int(value) => Pending::Value(Value::new(Scalar::Int(*value), ty)),
                        Operand::Float(value) => {
                            Pending::Value(Value::new(Scalar::Float(*value), ty))
                        }
                        Operand::Var(var) => Pending::Value(self.read(var)?),
                        Operand::Call(call) => Pending::Call(call),
                        Operand::Operator(_) | Operand::Result => return Err(self.malformed()),
                    };
                    Ok(Token::Operand(pending))
                }
            })
            .collect()
    }

    fn reduce(&mut self, tokens: Vec<Token<Pending<'a>>>) -> Result<Value, Error> {
        let position = self.position.clone();
        evaluate(self, tokens, &position)
    }

    /// Writes the result of a `Mov` to its target variable or through it.
    fn store(&mut self, operation: &Operation, value: Value) -> Result<(), Error> {
        let (var, deref) = operation.mov_target().ok_or_else(|| self.malformed())?;

        if deref {
            let pointer = self.read(var)?;
            let pointee = pointer.ty.pointee().ok_or_else(|| {
                self.error(ErrorImpl::DerefTypeError {
                    received: pointer.ty.to_string(),
                })
            })?;

            let bytes = value.cast(&Type::Primitive(pointee)).encode();
            let range = self.bounds(pointer.as_i64(), bytes.len())?;
            self.memory[range].copy_from_slice(&bytes);
            return Ok(());
        }

        let index = var.scope_index(self.base);
        let storage = self
            .frames
            .get_mut(index)
            .and_then(|frame| frame.vars.get_mut(var.slot));

        match storage {
            Some(storage) => {
                storage.bytes = value.cast(&storage.ty).encode();
                Ok(())
            }
            None => Err(self.unresolved(var)),
        }
    }

    fn chain(&self) -> bool {
        self.frames.last().map_or(false, |frame| frame.chain)
    }

    fn set_chain(&mut self, taken: bool) {
        if let Some(frame) = self.frames.last_mut() {
            frame.chain = taken;
        }
    }

    fn skip(&self, operation: &Operation, ip: usize) -> Result<usize, Error> {
        let length = operation.jump().ok_or_else(|| self.malformed())?;
        Ok(ip + length + 1)
    }

    fn print(&mut self, value: Value) -> Result<(), Error> {
        let mut line = value.printed();
        line.push(b'\n');

        self.out.write_all(&line).map_err(|error| {
            self.error(ErrorImpl::OutputError {
                message: error.to_string(),
            })
        })
    }

    /// Runs `operations` from `start` until the sequence ends or a `Return`
    /// yields a value.
    fn execute(&mut self, operations: &'a [Operation], start: usize) -> Result<Option<Value>, Error> {
        let mut ip = start;
        let mut pending: Vec<Token<Pending<'a>>> = vec![];

        while let Some(operation) = operations.get(ip) {
            self.position = operation.position.clone();
            trace!(ip, frames = self.frames.len(), operation = %operation, "execute");

            ip = match operation.kind {
                OpKind::BeginScope => {
                    self.frames.push(Frame::from_scope(operation));
                    ip + 1
                }
                OpKind::EndScope => {
                    self.frames.pop();
                    match operation.back_edge() {
                        Some(offset) => ip
                            .checked_add_signed(offset as isize)
                            .ok_or_else(|| self.malformed())?,
                        None => ip + 1,
                    }
                }
                OpKind::Push => {
                    pending = self.load_tokens(operation.tokens())?;
                    ip + 1
                }
                OpKind::Mov => {
                    let value = self.reduce(mem::take(&mut pending))?;
                    self.store(operation, value)?;
                    ip + 1
                }
                OpKind::If => {
                    let taken = self.reduce(mem::take(&mut pending))?.is_true();
                    self.set_chain(taken);
                    if taken {
                        ip + 1
                    } else {
                        self.skip(operation, ip)?
                    }
                }
                OpKind::ElseIf => {
                    if self.chain() {
                        pending.clear();
                        self.skip(operation, ip)?
                    } else {
                        let taken = self.reduce(mem::take(&mut pending))?.is_true();
                        self.set_chain(taken);
                        if taken {
                            ip + 1
                        } else {
                            self.skip(operation, ip)?
                        }
                    }
                }
                OpKind::Else => {
                    if self.chain() {
                        self.skip(operation, ip)?
                    } else {
                        ip + 1
                    }
                }
                OpKind::While => {
                    if self.reduce(mem::take(&mut pending))?.is_true() {
                        ip + 1
                    } else {
                        self.skip(operation, ip)?
                    }
                }
                OpKind::Print => {
                    let value = self.reduce(mem::take(&mut pending))?;
                    self.print(value)?;
                    ip + 1
                }
                OpKind::Return => {
                    let value = self.reduce(mem::take(&mut pending))?;
                    let value = match operation.types.first() {
                        Some(ty) => value.cast(ty),
                        None => value,
                    };
                    return Ok(Some(value));
                }
            };
        }

        Ok(None)
    }

    /// Evaluates the arguments in the caller's scopes, then runs the callee
    /// body on a fresh set of frames above the current ones.
    fn call(&mut self, call: &'a FuncCall) -> Result<Value, Error> {
        let mut arguments = Vec::with_capacity(call.arguments.len());
        for (argument, input) in call.arguments.iter().zip(call.signature.inputs.iter()) {
            let tokens = self.load_tokens(argument.tokens())?;
            arguments.push(self.reduce(tokens)?.cast(input));
        }

        let index = self.read(&call.callee)?.as_i64();
        let program = self.program;
        let function = usize::try_from(index)
            .ok()
            .and_then(|index| program.functions.get(index))
            .ok_or_else(|| self.unresolved(&call.callee))?;

        let body = function.operations.as_slice();
        let mut frame = body
            .first()
            .map(Frame::from_scope)
            .ok_or_else(|| self.malformed())?;
        for (var, argument) in frame.vars.iter_mut().zip(arguments) {
            var.bytes = argument.cast(&var.ty).encode();
        }

        let depth = self.frames.len();
        let saved_base = mem::replace(&mut self.base, depth);
        let saved_position = self.position.clone();
        debug!(function = %function.name, depth, "calling function");

        self.frames.push(frame);
        let result = self.execute(body, 1);

        self.frames.truncate(depth);
        self.base = saved_base;
        self.position = saved_position;

        match result? {
            Some(value) => Ok(value.cast(&function.signature.output())),
            None => Err(self.error(ErrorImpl::MissingReturnValue {
                function: function.name.clone(),
            })),
        }
    }

    fn dereference(&self, pointer: &Value) -> Result<Value, Error> {
        let pointee = pointer.ty.pointee().ok_or_else(|| {
            self.error(ErrorImpl::DerefTypeError {
                received: pointer.ty.to_string(),
            })
        })?;
        let ty = Type::Primitive(pointee);

        let range = self.bounds(pointer.as_i64(), ty.size())?;
        Value::decode(&self.memory[range], &ty).ok_or_else(|| self.malformed())
    }
}

impl<'a, W: Write> Apply for Interpreter<'a, W> {
    type Operand = Pending<'a>;
    type Value = Value;

    fn load(&mut self, operand: Pending<'a>) -> Result<Value, Error> {
        match operand {
            Pending::Value(value) => Ok(value),
            Pending::Call(call) => self.call(call),
        }
    }

    fn binary(&mut self, operator: Operator, left: Value, right: Value) -> Result<Value, Error> {
        value::binary(operator, &left, &right).map_err(|error| self.error(error))
    }

    fn unary(&mut self, operator: Operator, operand: Value) -> Result<Value, Error> {
        match operator {
            Operator::Deref => self.dereference(&operand),
            _ => value::unary(operator, &operand).map_err(|error| self.error(error)),
        }
    }
}
