//! Expression tokenization.
//!
//! A right-hand side is scanned character by character and split on the
//! operator characters and whitespace. Words are classified as literals,
//! aggregate constructors or variable references; the result is a flat,
//! textual-order operand list whose evaluation order is decided later by the
//! shared evaluator.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::{
    errors::errors::{Error, ErrorImpl},
    eval::operators::Operator,
    ir::ir::{Expression, FuncCall, Operand},
    types::types::{parse_primitive, Type},
    Position,
};

use super::parser::Parser;

const OPERATOR_CHARS: &str = "=+-/*%()!&^|<>";

lazy_static! {
    static ref INTEGER: Regex = Regex::new(r"^[0-9]+$").unwrap();
    static ref FLOAT: Regex = Regex::new(r"^[0-9]+\.[0-9]+$").unwrap();
    static ref AGGREGATE: Regex = Regex::new(r"^(?:\[([0-9]+)\])?([a-z0-9]+)\{\}$").unwrap();
    static ref ARRAY: Regex = Regex::new(r"^\[([0-9]+)\]([a-z0-9]+)$").unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

pub fn is_identifier(word: &str) -> bool {
    IDENTIFIER.is_match(word)
}

fn unexpected(token: &str, position: &Position) -> Error {
    Error::new(
        ErrorImpl::UnexpectedToken {
            token: token.to_string(),
        },
        position.clone(),
    )
}

fn unexpected_detailed(token: &str, message: &str, position: &Position) -> Error {
    Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: token.to_string(),
            message: message.to_string(),
        },
        position.clone(),
    )
}

/// Whether the next entry of `expression` must be an operand.
fn expects_operand(expression: &Expression) -> bool {
    match expression.operands.last() {
        None => true,
        Some(Operand::Operator(Operator::CloseParen)) => false,
        Some(Operand::Operator(_)) => true,
        Some(_) => false,
    }
}

/// Index just past the character literal starting at `start`.
fn skip_literal(chars: &[char], start: usize) -> usize {
    let mut index = start + 1;
    while index < chars.len() {
        match chars[index] {
            '\\' => index += 2,
            '\'' => return index + 1,
            _ => index += 1,
        }
    }
    chars.len()
}

/// Index of the `)` closing the `(` at `open`.
fn matching_paren(chars: &[char], open: usize, position: &Position) -> Result<usize, Error> {
    let mut depth = 0;
    let mut index = open;

    while index < chars.len() {
        match chars[index] {
            '\'' => {
                index = skip_literal(chars, index);
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(index);
                }
            }
            _ => {}
        }
        index += 1;
    }

    let text = chars.iter().collect::<String>();
    Err(unexpected_detailed(&text, "unbalanced parentheses", position))
}

/// Splits call arguments at top-level commas.
fn split_arguments(inner: &[char]) -> Vec<String> {
    let mut arguments = vec![];
    let mut current = String::new();
    let mut depth = 0;
    let mut index = 0;

    if inner.iter().all(|ch| ch.is_whitespace()) {
        return arguments;
    }

    while index < inner.len() {
        let ch = inner[index];
        match ch {
            '\'' => {
                let end = skip_literal(inner, index);
                current.extend(&inner[index..end]);
                index = end;
                continue;
            }
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                arguments.push(current.trim().to_string());
                current.clear();
                index += 1;
                continue;
            }
            _ => {}
        }
        current.push(ch);
        index += 1;
    }

    arguments.push(current.trim().to_string());
    arguments
}

/// Reads the character literal starting at `start`: `'a'`, `'\n'`, `'\s'`...
fn parse_char_literal(
    chars: &[char],
    start: usize,
    position: &Position,
) -> Result<(u8, usize), Error> {
    let end = skip_literal(chars, start);
    let literal = chars[start..end].iter().collect::<String>();
    let unterminated = || {
        Error::new(
            ErrorImpl::UnterminatedLiteral {
                token: literal.clone(),
            },
            position.clone(),
        )
    };

    let value = match &chars[start + 1..end] {
        ['\\', escape, '\''] => match escape {
            'n' => b'\n',
            't' => b'\t',
            '0' => 0,
            '\\' => b'\\',
            '\'' => b'\'',
            's' => b' ',
            _ => return Err(unexpected(&literal, position)),
        },
        [ch, '\''] if ch.is_ascii() && *ch != '\\' => *ch as u8,
        [.., '\''] => return Err(unexpected(&literal, position)),
        _ => return Err(unterminated()),
    };

    Ok((value, end))
}

/// Classifies one word of an expression.
fn parse_word(parser: &mut Parser, word: &str, position: &Position) -> Result<(Operand, Type), Error> {
    if INTEGER.is_match(word) {
        let value = word.parse::<i64>().map_err(|_| {
            Error::new(
                ErrorImpl::NumberParseError {
                    token: word.to_string(),
                },
                position.clone(),
            )
        })?;
        return Ok((Operand::Int(value), Type::I64));
    }

    if FLOAT.is_match(word) {
        let value = word.parse::<f64>().map_err(|_| {
            Error::new(
                ErrorImpl::NumberParseError {
                    token: word.to_string(),
                },
                position.clone(),
            )
        })?;
        return Ok((Operand::Float(value), Type::F64));
    }

    match word {
        "true" => return Ok((Operand::Int(1), Type::BOOL)),
        "false" => return Ok((Operand::Int(0), Type::BOOL)),
        _ => {}
    }

    if let Some(captures) = AGGREGATE.captures(word).or_else(|| ARRAY.captures(word)) {
        let count = match captures.get(1) {
            Some(count) => count.as_str().parse::<usize>().map_err(|_| {
                Error::new(
                    ErrorImpl::NumberParseError {
                        token: count.as_str().to_string(),
                    },
                    position.clone(),
                )
            })?,
            None => 1,
        };

        let primitive = parse_primitive(&captures[2])
            .filter(|primitive| primitive.is_concrete())
            .ok_or_else(|| {
                Error::new(
                    ErrorImpl::UnknownType {
                        type_: captures[2].to_string(),
                    },
                    position.clone(),
                )
            })?;

        let offset = parser.program.allocate(count * primitive.size());
        debug!(offset, count, pointee = %primitive, "allocated aggregate");

        return Ok((Operand::Int(offset as i64), Type::Ptr(primitive)));
    }

    if is_identifier(word) {
        return match parser.resolve(word) {
            Some((var, ty)) => Ok((Operand::Var(var), ty)),
            None => Err(Error::new(
                ErrorImpl::VariableNotDeclared {
                    variable: word.to_string(),
                },
                position.clone(),
            )),
        };
    }

    Err(unexpected(word, position))
}

/// `name(arguments)` inside an expression.
fn parse_call(
    parser: &mut Parser,
    name: &str,
    inner: &[char],
    position: &Position,
) -> Result<(FuncCall, Type), Error> {
    let (callee, ty) = parser.resolve(name).ok_or_else(|| {
        Error::new(
            ErrorImpl::VariableNotDeclared {
                variable: name.to_string(),
            },
            position.clone(),
        )
    })?;

    let signature = match ty {
        Type::Func(signature) => signature,
        _ => {
            return Err(Error::new(
                ErrorImpl::NotCallable {
                    variable: name.to_string(),
                },
                position.clone(),
            ))
        }
    };

    let mut arguments = vec![];
    for argument in split_arguments(inner) {
        if argument.is_empty() {
            return Err(unexpected_detailed(name, "empty argument in call", position));
        }
        arguments.push(parse_expression(parser, &argument, position)?);
    }

    let output = signature.output();
    Ok((
        FuncCall {
            callee,
            signature,
            arguments,
        },
        output,
    ))
}

struct Scanner {
    expression: Expression,
    word: String,
    depth: usize,
}

impl Scanner {
    fn push_operand(&mut self, operand: Operand, ty: Type, token: &str, position: &Position) -> Result<(), Error> {
        if !expects_operand(&self.expression) {
            return Err(unexpected(token, position));
        }
        self.expression.push(operand, ty);
        Ok(())
    }

    fn flush_word(&mut self, parser: &mut Parser, position: &Position) -> Result<(), Error> {
        if self.word.is_empty() {
            return Ok(());
        }

        let word = std::mem::take(&mut self.word);
        let (operand, ty) = parse_word(parser, &word, position)?;
        self.push_operand(operand, ty, &word, position)
    }

    fn push_operator(&mut self, operator: Operator, position: &Position) -> Result<(), Error> {
        let expecting = expects_operand(&self.expression);
        let valid = match operator {
            Operator::OpenParen => expecting,
            Operator::CloseParen => !expecting && self.depth > 0,
            _ if operator.is_unary() => expecting,
            _ => !expecting,
        };

        if !valid {
            return Err(unexpected(operator.symbol(), position));
        }

        match operator {
            Operator::OpenParen => self.depth += 1,
            Operator::CloseParen => self.depth -= 1,
            _ => {}
        }

        self.expression
            .push(Operand::Operator(operator), Type::OPERATOR);
        Ok(())
    }
}

/// Splits `text` into a textual-order operand list.
///
/// Literals are `123` (i64), `1.5` (f64), `true`/`false`, `'c'` (byte) and the
/// aggregate constructors `type{}`, `[N]type{}` and `[N]type`, which allocate
/// global memory immediately. Any other word must name a visible variable; a
/// word followed by `(` is a call.
pub fn parse_expression(parser: &mut Parser, text: &str, position: &Position) -> Result<Expression, Error> {
    let chars = text.chars().collect::<Vec<char>>();
    let mut scanner = Scanner {
        expression: Expression::default(),
        word: String::new(),
        depth: 0,
    };
    let mut index = 0;

    while index < chars.len() {
        let ch = chars[index];

        if ch == '(' && is_identifier(&scanner.word) {
            let close = matching_paren(&chars, index, position)?;
            let name = std::mem::take(&mut scanner.word);
            let (call, ty) = parse_call(parser, &name, &chars[index + 1..close], position)?;
            scanner.push_operand(Operand::Call(Box::new(call)), ty, &name, position)?;
            index = close + 1;
            continue;
        }

        if ch.is_whitespace() {
            scanner.flush_word(parser, position)?;
            index += 1;
            continue;
        }

        if ch == '\'' {
            scanner.flush_word(parser, position)?;
            let (value, end) = parse_char_literal(&chars, index, position)?;
            let literal = chars[index..end].iter().collect::<String>();
            scanner.push_operand(Operand::Int(value as i64), Type::BYTE, &literal, position)?;
            index = end;
            continue;
        }

        if OPERATOR_CHARS.contains(ch) {
            scanner.flush_word(parser, position)?;

            let pair = chars.get(index + 1).map(|next| format!("{}{}", ch, next));
            let double = match pair.as_deref() {
                Some(symbol @ ("&&" | "||" | "==" | "!=")) => Operator::from_symbol(symbol),
                _ => None,
            };

            let (operator, width) = match double {
                Some(operator) => (operator, 2),
                None => match ch {
                    '=' => return Err(Error::new(ErrorImpl::MultipleAssignment, position.clone())),
                    '-' if expects_operand(&scanner.expression) => (Operator::Negate, 1),
                    _ => {
                        let symbol = ch.to_string();
                        let operator = Operator::from_symbol(&symbol)
                            .ok_or_else(|| unexpected(&symbol, position))?;
                        (operator, 1)
                    }
                },
            };

            scanner.push_operator(operator, position)?;
            index += width;
            continue;
        }

        scanner.word.push(ch);
        index += 1;
    }

    scanner.flush_word(parser, position)?;

    if scanner.expression.is_empty() || expects_operand(&scanner.expression) {
        return Err(unexpected_detailed(text, "incomplete expression", position));
    }
    if scanner.depth != 0 {
        return Err(unexpected_detailed(text, "unbalanced parentheses", position));
    }

    Ok(scanner.expression)
}
