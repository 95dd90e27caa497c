use std::collections::HashMap;

use crate::{errors::errors::Error, lexer::tokens::TokenKind};

use super::{parser::Parser, stmt::*};

pub type StmtHandler = fn(&mut Parser) -> Result<(), Error>;

pub fn create_token_lookups(parser: &mut Parser) {
    // Keywords
    parser.stmt(TokenKind::If, parse_if_stmt);
    parser.stmt(TokenKind::Else, parse_else_stmt);
    parser.stmt(TokenKind::While, parse_while_stmt);
    parser.stmt(TokenKind::Print, parse_print_stmt);
    parser.stmt(TokenKind::Arrow, parse_return_stmt);

    // Blocks
    parser.stmt(TokenKind::CloseCurly, parse_close_block_stmt);

    // Declarations and assignments
    parser.stmt(TokenKind::Identifier, parse_symbol_stmt);
    parser.stmt(TokenKind::Deref, parse_symbol_stmt);
}

// Lookup table inside parser struct, so it's easier
pub type StmtLookup = HashMap<TokenKind, StmtHandler>;
