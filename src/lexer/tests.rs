//! Unit tests for the lexer module.
//!
//! Covers every line shape of the grammar, comment stripping, positions and
//! the unrecognised-line error.

use indoc::indoc;

use super::{lexer::tokenize, tokens::TokenKind};
use crate::errors::errors::ErrorImpl;

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source, "test.hk")
        .unwrap()
        .iter()
        .map(|token| token.kind)
        .collect()
}

fn values(source: &str) -> Vec<String> {
    tokenize(source, "test.hk")
        .unwrap()
        .into_iter()
        .map(|token| token.value)
        .collect()
}

#[test]
fn test_tokenize_declaration() {
    assert_eq!(
        kinds("x : i64"),
        vec![
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Type,
            TokenKind::EOF
        ]
    );
    assert_eq!(values("p:^byte"), vec!["p", ":", "^byte", "EOF"]);
}

#[test]
fn test_tokenize_assignments() {
    assert_eq!(
        kinds("x: i64 = 2 + 3"),
        vec![
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Type,
            TokenKind::Assignment,
            TokenKind::Expression,
            TokenKind::EOF
        ]
    );
    assert_eq!(values("x: i64 = 2 + 3")[4], "2 + 3");

    assert_eq!(
        kinds("x := true"),
        vec![
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Assignment,
            TokenKind::Expression,
            TokenKind::EOF
        ]
    );

    assert_eq!(
        kinds("x = x * 2"),
        vec![
            TokenKind::Identifier,
            TokenKind::Assignment,
            TokenKind::Expression,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_tokenize_deref_store() {
    assert_eq!(
        kinds("^p = 42"),
        vec![
            TokenKind::Deref,
            TokenKind::Identifier,
            TokenKind::Assignment,
            TokenKind::Expression,
            TokenKind::EOF
        ]
    );
    assert_eq!(values("^p = ^q + 1"), vec!["^", "p", "=", "^q + 1", "EOF"]);
}

#[test]
fn test_tokenize_control_flow() {
    let source = indoc! {"
        if x < 3 {
        } else if x == 3 {
        } else {
        }
        while i > 0 {
        }
    "};

    assert_eq!(
        kinds(source),
        vec![
            TokenKind::If,
            TokenKind::Expression,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::Else,
            TokenKind::If,
            TokenKind::Expression,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::Else,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::While,
            TokenKind::Expression,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::EOF
        ]
    );

    let values = values(source);
    assert_eq!(values[1], "x < 3");
    assert_eq!(values[6], "x == 3");
    assert_eq!(values[13], "i > 0");
}

#[test]
fn test_tokenize_detached_else() {
    let source = indoc! {"
        if c {
        }
        else if d {
        }
        else {
        }
    "};

    assert_eq!(
        kinds(source),
        vec![
            TokenKind::If,
            TokenKind::Expression,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::Else,
            TokenKind::If,
            TokenKind::Expression,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::Else,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_tokenize_print_and_return() {
    assert_eq!(values("print 'a'"), vec!["print", "'a'", "EOF"]);
    assert_eq!(values("-> a + b"), vec!["->", "a + b", "EOF"]);
}

#[test]
fn test_tokenize_function_literal() {
    let source = "add = func(a: i64, b: i64) -> (i64) {";
    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Identifier,
            TokenKind::Assignment,
            TokenKind::Func,
            TokenKind::Params,
            TokenKind::Returns,
            TokenKind::OpenCurly,
            TokenKind::EOF
        ]
    );
    assert_eq!(
        values(source),
        vec!["add", "=", "func", "a: i64, b: i64", "i64", "{", "EOF"]
    );

    assert_eq!(values("f = func() -> bool {")[3..5], ["", "bool"]);
}

#[test]
fn test_comments_and_blank_lines() {
    let source = indoc! {"
        // a comment

        x: i64 = 1 // trailing
        print x
    "};

    let tokens = tokenize(source, "test.hk").unwrap();
    assert_eq!(tokens[0].value, "x");
    assert_eq!(tokens[0].position.0, 3);
    assert_eq!(tokens[4].value, "1");
    assert_eq!(tokens[5].kind, TokenKind::Print);
    assert_eq!(tokens[5].position.0, 4);
    assert_eq!(tokens[5].position.1.as_str(), "test.hk");
    assert_eq!(tokens.last().unwrap().kind, TokenKind::EOF);
}

#[test]
fn test_unrecognised_line() {
    let error = tokenize("x: i64 = 1\nwhat is this", "test.hk").unwrap_err();

    assert_eq!(
        *error.get_impl(),
        ErrorImpl::UnrecognisedLine {
            line: "what is this".to_string()
        }
    );
    assert_eq!(error.get_position().0, 2);

    assert!(tokenize("if {", "test.hk").is_err());
    assert!(tokenize("print", "test.hk").is_err());
}

#[test]
fn test_reserved_word_targets() {
    for (source, word) in [
        ("print = 5", "print"),
        ("x := 1\nif: i64 = 2", "if"),
        ("while: bool", "while"),
        ("^true = 1", "true"),
        ("func = func() -> (i64) {", "func"),
    ] {
        let error = tokenize(source, "test.hk").unwrap_err();
        assert_eq!(
            *error.get_impl(),
            ErrorImpl::ReservedWord {
                word: word.to_string()
            },
            "{}",
            source
        );
    }

    let tokens = tokenize("printer = 5\nprint x == 1\nif_done := false", "test.hk").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[3].kind, TokenKind::Print);
    assert_eq!(tokens[5].value, "if_done");
}
