use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn kind(&self) -> ErrorKind {
        match &self.internal_error {
            ErrorImpl::UnrecognisedLine { .. } | ErrorImpl::ReservedWord { .. } => ErrorKind::Lex,

            ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::UnexpectedTokenDetailed { .. }
            | ErrorImpl::NumberParseError { .. }
            | ErrorImpl::MultipleAssignment
            | ErrorImpl::VariableAlreadyDeclared { .. }
            | ErrorImpl::VariableNotDeclared { .. }
            | ErrorImpl::ExpectedExplicitType { .. }
            | ErrorImpl::UnknownType { .. }
            | ErrorImpl::DerefNonPointer { .. }
            | ErrorImpl::DanglingElse
            | ErrorImpl::ReturnOutsideFunction
            | ErrorImpl::UnbalancedBlock
            | ErrorImpl::UnclosedBlock
            | ErrorImpl::UnterminatedLiteral { .. } => ErrorKind::Parse,

            ErrorImpl::TypeMatchError { .. }
            | ErrorImpl::ConditionTypeError { .. }
            | ErrorImpl::OperandTypeError { .. }
            | ErrorImpl::DerefTypeError { .. }
            | ErrorImpl::UnresolvedType { .. }
            | ErrorImpl::PendingType { .. }
            | ErrorImpl::ReturnTypeError { .. }
            | ErrorImpl::ArgumentTypeMatchError { .. }
            | ErrorImpl::UnexpectedArguments { .. }
            | ErrorImpl::MissingArguments { .. }
            | ErrorImpl::NotCallable { .. }
            | ErrorImpl::MissingReturn { .. }
            | ErrorImpl::UnprintableType { .. } => ErrorKind::Type,

            ErrorImpl::MemoryOutOfBounds { .. }
            | ErrorImpl::MalformedExpression { .. }
            | ErrorImpl::UnresolvedSymbol { .. }
            | ErrorImpl::DivisionByZero
            | ErrorImpl::MissingReturnValue { .. }
            | ErrorImpl::OutputError { .. } => ErrorKind::Runtime,
        }
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedLine { .. } => "UnrecognisedLine",
            ErrorImpl::ReservedWord { .. } => "ReservedWord",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::MultipleAssignment => "MultipleAssignment",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::VariableNotDeclared { .. } => "VariableNotDeclared",
            ErrorImpl::ExpectedExplicitType { .. } => "ExpectedExplicitType",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::DerefNonPointer { .. } => "DerefNonPointer",
            ErrorImpl::DanglingElse => "DanglingElse",
            ErrorImpl::ReturnOutsideFunction => "ReturnOutsideFunction",
            ErrorImpl::UnbalancedBlock => "UnbalancedBlock",
            ErrorImpl::UnclosedBlock => "UnclosedBlock",
            ErrorImpl::UnterminatedLiteral { .. } => "UnterminatedLiteral",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::ConditionTypeError { .. } => "ConditionTypeError",
            ErrorImpl::OperandTypeError { .. } => "OperandTypeError",
            ErrorImpl::DerefTypeError { .. } => "DerefTypeError",
            ErrorImpl::UnresolvedType { .. } => "UnresolvedType",
            ErrorImpl::PendingType { .. } => "PendingType",
            ErrorImpl::ReturnTypeError { .. } => "ReturnTypeError",
            ErrorImpl::ArgumentTypeMatchError { .. } => "ArgumentTypeMatchError",
            ErrorImpl::UnexpectedArguments { .. } => "UnexpectedArguments",
            ErrorImpl::MissingArguments { .. } => "MissingArguments",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::MissingReturn { .. } => "MissingReturn",
            ErrorImpl::UnprintableType { .. } => "UnprintableType",
            ErrorImpl::MemoryOutOfBounds { .. } => "MemoryOutOfBounds",
            ErrorImpl::MalformedExpression { .. } => "MalformedExpression",
            ErrorImpl::UnresolvedSymbol { .. } => "UnresolvedSymbol",
            ErrorImpl::DivisionByZero => "DivisionByZero",
            ErrorImpl::MissingReturnValue { .. } => "MissingReturnValue",
            ErrorImpl::OutputError { .. } => "OutputError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedLine { .. } => ErrorTip::None,
            ErrorImpl::ReservedWord { word } => ErrorTip::Suggestion(format!(
                "`{}` is a reserved word and cannot name a variable",
                word
            )),
            ErrorImpl::UnexpectedToken { token } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`", token))
            }
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::MultipleAssignment => ErrorTip::Suggestion(String::from(
                "An assignment must be of the form `name = expression`",
            )),
            ErrorImpl::VariableAlreadyDeclared { variable } => ErrorTip::Suggestion(format!(
                "Variable `{}` already declared in this scope, drop the type annotation to assign to it",
                variable
            )),
            ErrorImpl::VariableNotDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", variable))
            }
            ErrorImpl::ExpectedExplicitType { variable } => ErrorTip::Suggestion(format!(
                "Declare `{}` with a type, e.g. `{}: i64 = ...` or `{} := ...`",
                variable, variable, variable
            )),
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::DerefNonPointer { variable } => ErrorTip::Suggestion(format!(
                "`{}` is not a pointer and cannot be dereferenced",
                variable
            )),
            ErrorImpl::DanglingElse => ErrorTip::Suggestion(String::from(
                "`else` must directly follow the closing brace of an `if` or `else if` block",
            )),
            ErrorImpl::ReturnOutsideFunction => ErrorTip::Suggestion(String::from(
                "`->` can only be used inside a function body",
            )),
            ErrorImpl::UnbalancedBlock => {
                ErrorTip::Suggestion(String::from("`}` does not close any open block"))
            }
            ErrorImpl::UnclosedBlock => {
                ErrorTip::Suggestion(String::from("A block is never closed with `}`"))
            }
            ErrorImpl::UnterminatedLiteral { token } => {
                ErrorTip::Suggestion(format!("Unterminated literal `{}`", token))
            }
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::ConditionTypeError { received } => ErrorTip::Suggestion(format!(
                "Conditions must be of type `bool`, received `{}`",
                received
            )),
            ErrorImpl::OperandTypeError {
                operator,
                left,
                right,
            } => ErrorTip::Suggestion(format!(
                "Operator `{}` cannot be applied to `{}` and `{}`",
                operator, left, right
            )),
            ErrorImpl::DerefTypeError { received } => ErrorTip::Suggestion(format!(
                "Only pointers can be dereferenced, received `{}`",
                received
            )),
            ErrorImpl::UnresolvedType { variable } => ErrorTip::Suggestion(format!(
                "The type of `{}` could not be inferred, assign to it at least once",
                variable
            )),
            ErrorImpl::PendingType { variable } => ErrorTip::Suggestion(format!(
                "`{}` is read before its first assignment gives it a type",
                variable
            )),
            ErrorImpl::ReturnTypeError { expected, received } => ErrorTip::Suggestion(format!(
                "Function returns `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::ArgumentTypeMatchError { expected, received } => {
                ErrorTip::Suggestion(format!(
                    "Expected argument type `{}`, received `{}`",
                    expected, received
                ))
            }
            ErrorImpl::UnexpectedArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::MissingArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::NotCallable { variable } => {
                ErrorTip::Suggestion(format!("`{}` is not a function", variable))
            }
            ErrorImpl::MissingReturn { function } => ErrorTip::Suggestion(format!(
                "Function `{}` never returns a value with `->`",
                function
            )),
            ErrorImpl::UnprintableType { type_ } => {
                ErrorTip::Suggestion(format!("Values of type `{}` cannot be printed", type_))
            }
            ErrorImpl::MemoryOutOfBounds {
                offset,
                size,
                capacity,
            } => ErrorTip::Suggestion(format!(
                "Access of {} bytes at offset {} exceeds the memory capacity of {} bytes",
                size, offset, capacity
            )),
            ErrorImpl::MalformedExpression { remaining } => ErrorTip::Suggestion(format!(
                "The expression reduced to {} values instead of one",
                remaining
            )),
            ErrorImpl::UnresolvedSymbol { variable } => {
                ErrorTip::Suggestion(format!("`{}` has no storage at this point", variable))
            }
            ErrorImpl::DivisionByZero => {
                ErrorTip::Suggestion(String::from("Integer division or modulo by zero"))
            }
            ErrorImpl::MissingReturnValue { function } => ErrorTip::Suggestion(format!(
                "Function `{}` finished without returning a value",
                function
            )),
            ErrorImpl::OutputError { message } => {
                ErrorTip::Suggestion(format!("Failed to write output: {}", message))
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} error: {}", self.position, self.kind(), self.internal_error)
    }
}

impl std::error::Error for Error {}

/// The phase that detected an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Parse,
    Type,
    Runtime,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Lex => write!(f, "Lex"),
            ErrorKind::Parse => write!(f, "Parse"),
            ErrorKind::Type => write!(f, "Type"),
            ErrorKind::Runtime => write!(f, "Runtime"),
        }
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised line: {line:?}")]
    UnrecognisedLine { line: String },
    #[error("reserved word used as a name: {word:?}")]
    ReservedWord { word: String },

    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("multiple '=' found in one assignment")]
    MultipleAssignment,
    #[error("variable {variable:?} already declared")]
    VariableAlreadyDeclared { variable: String },
    #[error("variable {variable:?} not declared")]
    VariableNotDeclared { variable: String },
    #[error("expected a type when declaring {variable:?}")]
    ExpectedExplicitType { variable: String },
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },
    #[error("cannot dereference non-pointer {variable:?}")]
    DerefNonPointer { variable: String },
    #[error("else without a preceding if")]
    DanglingElse,
    #[error("return outside of a function")]
    ReturnOutsideFunction,
    #[error("unbalanced closing brace")]
    UnbalancedBlock,
    #[error("unclosed block")]
    UnclosedBlock,
    #[error("unterminated literal {token:?}")]
    UnterminatedLiteral { token: String },

    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMatchError { expected: String, received: String },
    #[error("condition must be bool, received {received:?}")]
    ConditionTypeError { received: String },
    #[error("operator {operator} not defined for {left:?} and {right:?}")]
    OperandTypeError {
        operator: String,
        left: String,
        right: String,
    },
    #[error("cannot dereference {received:?}")]
    DerefTypeError { received: String },
    #[error("type of {variable:?} was never resolved")]
    UnresolvedType { variable: String },
    #[error("type of {variable:?} is not known yet")]
    PendingType { variable: String },
    #[error("return types do not match: expected {expected:?}, received {received:?}")]
    ReturnTypeError { expected: String, received: String },
    #[error("argument types do not match: expected {expected:?}, received {received:?}")]
    ArgumentTypeMatchError { expected: String, received: String },
    #[error("unexpected arguments: expected {expected:?}, received {received:?}")]
    UnexpectedArguments { expected: usize, received: usize },
    #[error("missing arguments: expected {expected:?}, received {received:?}")]
    MissingArguments { expected: usize, received: usize },
    #[error("{variable:?} is not callable")]
    NotCallable { variable: String },
    #[error("function {function:?} has no return")]
    MissingReturn { function: String },
    #[error("cannot print values of type {type_}")]
    UnprintableType { type_: String },

    #[error("memory access out of bounds: offset {offset}, size {size}, capacity {capacity}")]
    MemoryOutOfBounds {
        offset: i64,
        size: usize,
        capacity: usize,
    },
    #[error("malformed expression: {remaining} values left on the stack")]
    MalformedExpression { remaining: usize },
    #[error("unresolved symbol {variable:?}")]
    UnresolvedSymbol { variable: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("function {function:?} returned no value")]
    MissingReturnValue { function: String },
    #[error("output error: {message}")]
    OutputError { message: String },
}
