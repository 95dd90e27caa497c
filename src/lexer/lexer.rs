use std::rc::Rc;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind};

pub type LineHandler = fn(&mut Lexer, &Captures);

pub struct LinePattern {
    regex: Regex,
    handler: LineHandler,
}

lazy_static! {
    /// A declaration or assignment whose target is a keyword.
    static ref RESERVED_TARGET: Regex = Regex::new(
        r"^\^?\s*(if|else|while|print|func|true|false)\s*(?:(?::\s*\^?[A-Za-z0-9_]*\s*)?=(?:[^=]|$)|:\s*\^?[A-Za-z0-9_]+$)"
    )
    .unwrap();

    /// Whole-line patterns, tried in order. The first match wins.
    static ref LINE_PATTERNS: Vec<LinePattern> = vec![
        LinePattern {
            regex: Regex::new(r"^\}\s*else\s+if\s+(.+?)\s*\{$").unwrap(),
            handler: close_else_if_handler,
        },
        LinePattern {
            regex: Regex::new(r"^\}\s*else\s*\{$").unwrap(),
            handler: MK_DEFAULT_HANDLER!(
                (TokenKind::CloseCurly, "}"),
                (TokenKind::Else, "else"),
                (TokenKind::OpenCurly, "{"),
            ),
        },
        LinePattern {
            regex: Regex::new(r"^\}$").unwrap(),
            handler: MK_DEFAULT_HANDLER!((TokenKind::CloseCurly, "}")),
        },
        LinePattern {
            regex: Regex::new(r"^else\s+if\s+(.+?)\s*\{$").unwrap(),
            handler: else_if_handler,
        },
        LinePattern {
            regex: Regex::new(r"^else\s*\{$").unwrap(),
            handler: MK_DEFAULT_HANDLER!((TokenKind::Else, "else"), (TokenKind::OpenCurly, "{")),
        },
        LinePattern {
            regex: Regex::new(r"^if\s+(.+?)\s*\{$").unwrap(),
            handler: if_handler,
        },
        LinePattern {
            regex: Regex::new(r"^while\s+(.+?)\s*\{$").unwrap(),
            handler: while_handler,
        },
        LinePattern {
            regex: Regex::new(r"^print\s+(.+)$").unwrap(),
            handler: print_handler,
        },
        LinePattern {
            regex: Regex::new(r"^->\s*(.+)$").unwrap(),
            handler: return_handler,
        },
        LinePattern {
            regex: Regex::new(
                r"^([A-Za-z_][A-Za-z0-9_]*)\s*=\s*func\s*\(([^()]*)\)\s*(?:->)?\s*\(?([^(){}]*?)\)?\s*\{$"
            )
            .unwrap(),
            handler: function_handler,
        },
        LinePattern {
            regex: Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*:\s*(\^?[A-Za-z0-9_]+)$").unwrap(),
            handler: declaration_handler,
        },
        LinePattern {
            regex: Regex::new(
                r"^(\^)?\s*([A-Za-z_][A-Za-z0-9_]*)\s*(:\s*(\^?[A-Za-z0-9_]+)?)?\s*=\s*(.+)$"
            )
            .unwrap(),
            handler: assignment_handler,
        },
    ];
}

pub struct Lexer {
    tokens: Vec<Token>,
    line: u32,
    file: Rc<String>,
}

impl Lexer {
    pub fn new(file: &str) -> Lexer {
        Lexer {
            tokens: vec![],
            line: 0,
            file: Rc::new(file.to_string()),
        }
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn position(&self) -> Position {
        Position(self.line, Rc::clone(&self.file))
    }

    fn push_word(&mut self, kind: TokenKind, value: &str) {
        let position = self.position();
        self.push(MK_TOKEN!(kind, value.trim().to_string(), position));
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(index) => &line[..index],
        None => line,
    }
}

fn close_else_if_handler(lexer: &mut Lexer, captures: &Captures) {
    lexer.push_word(TokenKind::CloseCurly, "}");
    else_if_handler(lexer, captures);
}

fn else_if_handler(lexer: &mut Lexer, captures: &Captures) {
    lexer.push_word(TokenKind::Else, "else");
    if_handler(lexer, captures);
}

fn if_handler(lexer: &mut Lexer, captures: &Captures) {
    lexer.push_word(TokenKind::If, "if");
    lexer.push_word(TokenKind::Expression, &captures[1]);
    lexer.push_word(TokenKind::OpenCurly, "{");
}

fn while_handler(lexer: &mut Lexer, captures: &Captures) {
    lexer.push_word(TokenKind::While, "while");
    lexer.push_word(TokenKind::Expression, &captures[1]);
    lexer.push_word(TokenKind::OpenCurly, "{");
}

fn print_handler(lexer: &mut Lexer, captures: &Captures) {
    lexer.push_word(TokenKind::Print, "print");
    lexer.push_word(TokenKind::Expression, &captures[1]);
}

fn return_handler(lexer: &mut Lexer, captures: &Captures) {
    lexer.push_word(TokenKind::Arrow, "->");
    lexer.push_word(TokenKind::Expression, &captures[1]);
}

fn function_handler(lexer: &mut Lexer, captures: &Captures) {
    lexer.push_word(TokenKind::Identifier, &captures[1]);
    lexer.push_word(TokenKind::Assignment, "=");
    lexer.push_word(TokenKind::Func, "func");
    lexer.push_word(TokenKind::Params, &captures[2]);
    lexer.push_word(TokenKind::Returns, &captures[3]);
    lexer.push_word(TokenKind::OpenCurly, "{");
}

fn declaration_handler(lexer: &mut Lexer, captures: &Captures) {
    lexer.push_word(TokenKind::Identifier, &captures[1]);
    lexer.push_word(TokenKind::Colon, ":");
    lexer.push_word(TokenKind::Type, &captures[2]);
}

fn assignment_handler(lexer: &mut Lexer, captures: &Captures) {
    if captures.get(1).is_some() {
        lexer.push_word(TokenKind::Deref, "^");
    }

    lexer.push_word(TokenKind::Identifier, &captures[2]);

    if captures.get(3).is_some() {
        lexer.push_word(TokenKind::Colon, ":");
    }
    if let Some(annotation) = captures.get(4) {
        lexer.push_word(TokenKind::Type, annotation.as_str());
    }

    lexer.push_word(TokenKind::Assignment, "=");
    lexer.push_word(TokenKind::Expression, &captures[5]);
}

/// Splits `source` into tokens, one line at a time.
///
/// Every non-blank line must match one of the line patterns; the words of a
/// line all carry that line's position. The stream ends with an `EOF` token.
pub fn tokenize(source: &str, file: &str) -> Result<Vec<Token>, Error> {
    let mut lexer = Lexer::new(file);

    for (index, raw) in source.lines().enumerate() {
        lexer.line = index as u32 + 1;

        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(captures) = RESERVED_TARGET.captures(line) {
            return Err(Error::new(
                ErrorImpl::ReservedWord {
                    word: captures[1].to_string(),
                },
                lexer.position(),
            ));
        }

        let matched = LINE_PATTERNS
            .iter()
            .find_map(|pattern| pattern.regex.captures(line).map(|captures| (pattern, captures)));

        match matched {
            Some((pattern, captures)) => (pattern.handler)(&mut lexer, &captures),
            None => {
                return Err(Error::new(
                    ErrorImpl::UnrecognisedLine {
                        line: line.to_string(),
                    },
                    lexer.position(),
                ))
            }
        }
    }

    lexer.line += 1;
    let position = lexer.position();
    lexer.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), position));
    Ok(lexer.tokens)
}
