//! IR builder state.
//!
//! The parser consumes the token stream one statement at a time and emits
//! operations straight into a [`Program`]. It keeps the stack of open lexical
//! scopes (to resolve symbols once, at parse time) and the stack of open
//! blocks (to back-patch jump lengths when a block closes).

use std::collections::HashMap;

use tracing::debug;

use crate::{
    errors::errors::{Error, ErrorImpl},
    ir::ir::{OpKind, Operation, Program, Target, VarRef},
    lexer::tokens::{Token, TokenKind},
    types::types::Type,
    Position,
};

use super::{
    lookups::{create_token_lookups, StmtHandler, StmtLookup},
    stmt::parse_stmt,
};

/// An open lexical scope: the `BeginScope` holding its declarations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scope {
    pub target: Target,
    pub begin: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockKind {
    If,
    ElseIf,
    Else,
    While,
    Function(usize),
}

/// An open block and the index of the operation that introduced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub opener: usize,
    pub position: Position,
}

/// What the enclosing sequence looked like when a function literal was entered.
#[derive(Debug, Clone)]
pub struct FunctionContext {
    pub target: Target,
    pub scopes: Vec<Scope>,
    pub blocks: Vec<Block>,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    stmt_lookup: StmtLookup,
    pub(crate) program: Program,
    /// Sequence currently being emitted into.
    pub(crate) target: Target,
    /// Visible scopes, innermost last. Entry 0 is always the global scope.
    pub(crate) scopes: Vec<Scope>,
    pub(crate) blocks: Vec<Block>,
    pub(crate) saved: Vec<FunctionContext>,
    /// Set by a statement that closed an `if`/`else if` block.
    pub(crate) chain_open: bool,
    /// Whether the current statement may be an `else`.
    pub(crate) else_allowed: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            stmt_lookup: HashMap::new(),
            program: Program::default(),
            target: Target::Global,
            scopes: vec![],
            blocks: vec![],
            saved: vec![],
            chain_open: false,
            else_allowed: false,
        }
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        let index = self.pos.min(self.tokens.len().saturating_sub(1));
        &self.tokens[index]
    }

    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Kind of the token `offset` places ahead of the current one.
    pub fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|token| token.kind)
    }

    /// Advances to the next token and returns the previous token.
    pub fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<Token, Error> {
        let token = self.current_token();
        if token.kind != expected_kind {
            match error {
                Some(error) => Err(error),
                None => Err(Error::new(
                    ErrorImpl::UnexpectedToken {
                        token: token.value.clone(),
                    },
                    token.position.clone(),
                )),
            }
        } else {
            Ok(self.advance())
        }
    }

    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    pub fn has_tokens(&self) -> bool {
        self.pos < self.tokens.len() && self.current_token_kind() != TokenKind::EOF
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    pub fn get_position(&self) -> Position {
        match self.tokens.get(self.pos).or(self.tokens.last()) {
            Some(token) => token.position.clone(),
            None => Position::null(),
        }
    }

    pub fn operations(&self) -> &Vec<Operation> {
        self.program.sequence(self.target)
    }

    pub fn operations_mut(&mut self) -> &mut Vec<Operation> {
        self.program.sequence_mut(self.target)
    }

    /// Appends an operation to the current sequence and returns its index.
    pub fn emit(&mut self, operation: Operation) -> usize {
        let operations = self.operations_mut();
        operations.push(operation);
        operations.len() - 1
    }

    /// Emits a `BeginScope` and makes it the innermost scope.
    pub fn open_scope(&mut self, position: Position) {
        let begin = self.emit(Operation::begin_scope(position));
        self.scopes.push(Scope {
            target: self.target,
            begin,
        });
        debug!(depth = self.scopes.len() - 1, "opened scope");
    }

    /// Emits the `EndScope` of the innermost scope and returns its index.
    pub fn close_scope(&mut self, position: Position) -> usize {
        self.scopes.pop();
        debug!(depth = self.scopes.len(), "closed scope");
        self.emit(Operation::new(OpKind::EndScope, position, vec![], vec![]))
    }

    fn begin_operation(&self, scope: &Scope) -> &Operation {
        &self.program.sequence(scope.target)[scope.begin]
    }

    /// Resolves `name` against the visible scopes, innermost first.
    pub fn resolve(&self, name: &str) -> Option<(VarRef, Type)> {
        for (depth, scope) in self.scopes.iter().enumerate().rev() {
            let declarations = self.begin_operation(scope).declarations().collect::<Vec<_>>();

            if let Some(slot) = declarations
                .iter()
                .rposition(|(declared, _)| *declared == name)
            {
                return Some((
                    VarRef {
                        name: name.to_string(),
                        depth,
                        slot,
                    },
                    declarations[slot].1.clone(),
                ));
            }
        }

        None
    }

    /// Whether `name` is declared in the innermost scope.
    pub fn declared_locally(&self, name: &str) -> bool {
        self.scopes.last().is_some_and(|scope| {
            self.begin_operation(scope)
                .declarations()
                .any(|(declared, _)| declared == name)
        })
    }

    /// Declares `name` in the innermost scope.
    pub fn declare(&mut self, name: &str, ty: Type, position: &Position) -> Result<VarRef, Error> {
        if self.declared_locally(name) {
            return Err(Error::new(
                ErrorImpl::VariableAlreadyDeclared {
                    variable: name.to_string(),
                },
                position.clone(),
            ));
        }

        let depth = self.scopes.len() - 1;
        let scope = self.scopes[depth];
        let begin = &mut self.program.sequence_mut(scope.target)[scope.begin];

        let var = VarRef {
            name: name.to_string(),
            depth,
            slot: begin.declaration_count(),
        };
        begin.declare(var.clone(), ty);

        Ok(var)
    }
}

/// Builds the IR of a whole token stream.
///
/// The global scope is opened before the first statement and closed after the
/// last one; every block must be closed by then.
pub fn parse(tokens: Vec<Token>) -> Result<Program, Error> {
    let mut parser = Parser::new(tokens);
    create_token_lookups(&mut parser);

    let start = match parser.tokens.first() {
        Some(token) => Position(1, token.position.1.clone()),
        None => Position::null(),
    };
    parser.open_scope(start);

    while parser.has_tokens() {
        parse_stmt(&mut parser)?;
    }

    if let Some(block) = parser.blocks.last() {
        return Err(Error::new(ErrorImpl::UnclosedBlock, block.position.clone()));
    }

    let end = parser.get_position();
    parser.close_scope(end);

    Ok(parser.program)
}
