use std::fmt::Display;

use crate::{
    eval::{eval::Token, operators::Operator},
    types::types::{FuncType, Type},
    Position,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Opens a lexical scope; operands are `[reserved bytes, declarations...]`.
    BeginScope,
    /// Closes the innermost scope; a `while` body's `EndScope` carries a back-edge.
    EndScope,
    /// Loads an expression's operands for the next consuming operation.
    Push,
    /// Assigns the pushed expression to a variable or, with a leading `^`, through it.
    Mov,
    If,
    ElseIf,
    Else,
    While,
    Print,
    Return,
}

/// A symbol reference resolved once, at parse time.
///
/// `depth` 0 is the global scope; inside a function the body scope is depth 1,
/// at the top level the first nested block is depth 1. `slot` indexes the
/// declarations of that scope's `BeginScope`.
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub name: String,
    pub depth: usize,
    pub slot: usize,
}

impl VarRef {
    /// Index into a scope stack whose innermost function frames start at `base`.
    pub fn scope_index(&self, base: usize) -> usize {
        if self.depth == 0 {
            0
        } else {
            base + self.depth - 1
        }
    }
}

/// Parallel operand/type lists of one expression, in textual order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    pub operands: Vec<Operand>,
    pub types: Vec<Type>,
}

impl Expression {
    pub fn push(&mut self, operand: Operand, ty: Type) {
        self.operands.push(operand);
        self.types.push(ty);
    }

    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }

    pub fn tokens(&self) -> Vec<Token<(&Operand, &Type)>> {
        tokens(&self.operands, &self.types)
    }
}

/// Splits parallel operand/type lists into evaluator tokens.
fn tokens<'a>(operands: &'a [Operand], types: &'a [Type]) -> Vec<Token<(&'a Operand, &'a Type)>> {
    operands
        .iter()
        .zip(types.iter())
        .map(|(operand, ty)| match operand {
            Operand::Operator(operator) => Token::Operator(*operator),
            operand => Token::Operand((operand, ty)),
        })
        .collect()
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts = self
            .operands
            .iter()
            .map(|operand| operand.to_string())
            .collect::<Vec<String>>();
        write!(f, "{}", parts.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    pub callee: VarRef,
    pub signature: FuncType,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(i64),
    Float(f64),
    Var(VarRef),
    Operator(Operator),
    Call(Box<FuncCall>),
    /// The value of the preceding `Push`, consumed by `Print` and `Return`.
    Result,
}

impl Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Int(value) => write!(f, "{}", value),
            Operand::Float(value) => write!(f, "{:?}", value),
            Operand::Var(var) => write!(f, "{}", var.name),
            Operand::Operator(operator) => write!(f, "{}", operator),
            Operand::Call(call) => {
                let arguments = call
                    .arguments
                    .iter()
                    .map(|argument| argument.to_string())
                    .collect::<Vec<String>>();
                write!(f, "{}({})", call.callee.name, arguments.join(", "))
            }
            Operand::Result => write!(f, "_"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OpKind,
    pub position: Position,
    pub operands: Vec<Operand>,
    pub types: Vec<Type>,
}

impl Operation {
    pub fn new(kind: OpKind, position: Position, operands: Vec<Operand>, types: Vec<Type>) -> Self {
        debug_assert_eq!(operands.len(), types.len());
        Operation {
            kind,
            position,
            operands,
            types,
        }
    }

    pub fn push(expression: Expression, position: Position) -> Self {
        Operation::new(OpKind::Push, position, expression.operands, expression.types)
    }

    /// Evaluator tokens of a `Push`.
    pub fn tokens(&self) -> Vec<Token<(&Operand, &Type)>> {
        tokens(&self.operands, &self.types)
    }

    pub fn begin_scope(position: Position) -> Self {
        Operation::new(
            OpKind::BeginScope,
            position,
            vec![Operand::Int(0)],
            vec![Type::I64],
        )
    }

    /// `(name, type)` declarations of a `BeginScope`, skipping the byte counter.
    pub fn declarations(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.operands
            .iter()
            .zip(self.types.iter())
            .skip(1)
            .filter_map(|(operand, ty)| match operand {
                Operand::Var(var) => Some((var.name.as_str(), ty)),
                _ => None,
            })
    }

    pub fn declaration_count(&self) -> usize {
        self.operands.len().saturating_sub(1)
    }

    /// Appends a declaration to a `BeginScope` and returns its slot.
    pub fn declare(&mut self, var: VarRef, ty: Type) -> usize {
        let size = ty.size() as i64;
        if let Some(Operand::Int(reserved)) = self.operands.first_mut() {
            *reserved += size;
        }

        let slot = self.declaration_count();
        self.operands.push(Operand::Var(var));
        self.types.push(ty);
        slot
    }

    pub fn declaration_type_mut(&mut self, slot: usize) -> Option<&mut Type> {
        self.types.get_mut(slot + 1)
    }

    pub fn reserved_bytes(&self) -> i64 {
        match self.operands.first() {
            Some(Operand::Int(reserved)) if self.kind == OpKind::BeginScope => *reserved,
            _ => 0,
        }
    }

    /// Block length written into an `If`/`ElseIf`/`Else`/`While` when its block closes.
    pub fn jump(&self) -> Option<usize> {
        match self.operands.first() {
            Some(Operand::Int(length)) => usize::try_from(*length).ok(),
            _ => None,
        }
    }

    /// Relative jump carried by a loop body's `EndScope`.
    pub fn back_edge(&self) -> Option<i64> {
        match (self.kind, self.operands.first()) {
            (OpKind::EndScope, Some(Operand::Int(offset))) => Some(*offset),
            _ => None,
        }
    }

    /// Target of a `Mov` and whether it is written through.
    pub fn mov_target(&self) -> Option<(&VarRef, bool)> {
        match self.operands.as_slice() {
            [Operand::Var(var)] => Some((var, false)),
            [Operand::Operator(Operator::Deref), Operand::Var(var)] => Some((var, true)),
            _ => None,
        }
    }

    pub fn is_unpatched(&self) -> bool {
        matches!(
            self.kind,
            OpKind::If | OpKind::ElseIf | OpKind::Else | OpKind::While
        ) && self.operands.is_empty()
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<10}", format!("{:?}", self.kind))?;
        match self.kind {
            OpKind::BeginScope => {
                write!(f, " #{}", self.reserved_bytes())?;
                for (name, ty) in self.declarations() {
                    write!(f, " {}:{}", name, ty)?;
                }
                Ok(())
            }
            OpKind::Push => {
                for operand in self.operands.iter() {
                    write!(f, " {}", operand)?;
                }
                Ok(())
            }
            OpKind::Mov => match self.mov_target() {
                Some((var, true)) => write!(f, " ^{}", var.name),
                Some((var, false)) => {
                    write!(f, " {}:{}", var.name, self.types.last().unwrap_or(&Type::UNKNOWN))
                }
                None => Ok(()),
            },
            OpKind::Print | OpKind::Return => {
                write!(f, " {}", self.types.first().unwrap_or(&Type::UNKNOWN))
            }
            _ => {
                for operand in self.operands.iter() {
                    write!(f, " {:+}", match operand {
                        Operand::Int(value) => *value,
                        _ => 0,
                    })?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub signature: FuncType,
    pub operations: Vec<Operation>,
}

/// Which operation sequence the builder is emitting into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Global,
    Function(usize),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// Next free offset handed out to aggregate constructors.
    pub memory_pointer: usize,
    pub memory_capacity: usize,
    pub operations: Vec<Operation>,
    pub functions: Vec<Function>,
}

impl Program {
    pub fn sequence(&self, target: Target) -> &Vec<Operation> {
        match target {
            Target::Global => &self.operations,
            Target::Function(index) => &self.functions[index].operations,
        }
    }

    pub fn sequence_mut(&mut self, target: Target) -> &mut Vec<Operation> {
        match target {
            Target::Global => &mut self.operations,
            Target::Function(index) => &mut self.functions[index].operations,
        }
    }

    /// Reserves `size` bytes of global memory and returns their offset.
    pub fn allocate(&mut self, size: usize) -> usize {
        let offset = self.memory_pointer;
        self.memory_pointer += size;
        self.memory_capacity = self.memory_capacity.max(self.memory_pointer);
        offset
    }
}

fn write_sequence(f: &mut std::fmt::Formatter<'_>, operations: &[Operation]) -> std::fmt::Result {
    for (index, operation) in operations.iter().enumerate() {
        writeln!(f, "{:04} {} ; {}", index, operation, operation.position)?;
    }
    Ok(())
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "memory capacity: {} bytes", self.memory_capacity)?;
        writeln!(f, "main:")?;
        write_sequence(f, &self.operations)?;

        for (index, function) in self.functions.iter().enumerate() {
            writeln!(
                f,
                "func {} `{}`: {}",
                index,
                function.name,
                Type::Func(function.signature.clone())
            )?;
            write_sequence(f, &function.operations)?;
        }

        Ok(())
    }
}
