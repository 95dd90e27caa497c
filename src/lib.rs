#![allow(clippy::module_inception)]

use std::{fmt::Display, io::Write, rc::Rc};

use tracing::debug;

use crate::{
    errors::errors::{Error, ErrorTip},
    interpreter::interpreter::Interpreter,
    ir::ir::Program,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::type_check,
};

pub mod compiler;
pub mod errors;
pub mod eval;
pub mod interpreter;
pub mod ir;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;
pub mod types;

extern crate regex;

/// A source location: line number (1-based) and file name.
#[derive(Debug, Clone, PartialEq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.1, self.0)
    }
}

/// Lexes, builds and type checks `source`, returning the checked program.
pub fn build_program(source: &str, file: &str) -> Result<Program, Error> {
    let tokens = tokenize(source, file)?;
    debug!(tokens = tokens.len(), file, "tokenized");

    let program = parse(tokens)?;
    debug!(
        operations = program.operations.len(),
        functions = program.functions.len(),
        "built IR"
    );

    type_check(&program)
}

/// Builds `source` and interprets it, writing program output to `out`.
pub fn run_source<W: Write>(source: &str, file: &str, out: &mut W) -> Result<(), Error> {
    let program = build_program(source, file)?;
    let mut interpreter = Interpreter::new(&program, out);
    interpreter.run()
}

/// Returns the text of `line` (1-based) in `source`, if it exists.
pub fn get_source_line(source: &str, line: u32) -> Option<&str> {
    if line == 0 {
        return None;
    }

    source.lines().nth(line as usize - 1)
}

/// Renders a diagnostic with the offending source line.
///
/// ```text
/// Error: Type TypeMatchError (Expected type `i64`, received `bool`)
/// -> main.hk:3
///   |
/// 3 | x = true
///   | ^^^^^^^^
/// ```
pub fn format_error(error: &Error, source: &str) -> String {
    let position = error.get_position();
    let mut output = String::new();

    if let ErrorTip::None = error.get_tip() {
        output.push_str(&format!("Error: {} {}\n", error.kind(), error.get_error_name()));
    } else {
        output.push_str(&format!(
            "Error: {} {} ({})\n",
            error.kind(),
            error.get_error_name(),
            error.get_tip()
        ));
    }
    output.push_str(&format!("-> {}\n", position));

    if let Some(line_text) = get_source_line(source, position.0) {
        let line_string = position.0.to_string();
        let padding = line_string.len() + 2;
        let (line_text, _) = remove_starting_whitespace(line_text);
        let line_text = line_text.trim_end();

        output.push_str(&format!("{:>padding$}\n", "|"));
        output.push_str(&format!("{} | {}\n", line_string, line_text));
        output.push_str(&format!(
            "{:>padding$} {}\n",
            "|",
            "^".repeat(line_text.chars().count().max(1))
        ));
    }

    output
}

pub fn display_error(error: &Error, source: &str) {
    eprint!("{}", format_error(error, source));
}

fn remove_starting_whitespace(string: &str) -> (&str, usize) {
    let trimmed = string.trim_start();
    (trimmed, string.len() - trimmed.len())
}
