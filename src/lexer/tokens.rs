use std::fmt::Display;

use crate::Position;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Identifier,
    /// Leading `^` of a store through a pointer.
    Deref,
    Colon,
    /// A type annotation such as `i64` or `^byte`.
    Type,
    Assignment,
    /// Raw right-hand side text, split further by the IR builder.
    Expression,

    Func,
    /// Parameter list of a function literal, `a: i64, b: ^byte`.
    Params,
    /// Output list of a function literal.
    Returns,

    OpenCurly,
    CloseCurly,
    Arrow,

    // Reserved
    If,
    Else,
    While,
    Print,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub position: Position,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) at {}", self.kind, self.value, self.position)
    }
}
