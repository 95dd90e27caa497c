//! Lexical analysis module.
//!
//! The language is line oriented: each non-blank source line is matched as a
//! whole against a table of anchored regex patterns, and the matching pattern's
//! handler splits it into tokens. Right-hand side expressions are kept as a
//! single `Expression` token and split further by the IR builder.
//!
//! - `//` comments run to the end of the line
//! - Every token carries the file and line it came from
//! - A line matching no pattern is a lex error

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
