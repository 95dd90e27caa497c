//! Utility macros for the lexer.
//!
//! - `MK_TOKEN!` - Creates a Token instance
//! - `MK_DEFAULT_HANDLER!` - Creates a line handler that emits a fixed token sequence

/// Creates a Token instance.
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::Print, "print".to_string(), position);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $position:expr) => {
        Token {
            kind: $kind,
            value: $value,
            position: $position,
        }
    };
}

/// Creates a line handler for lines made only of fixed words, such as `} else {`.
///
/// Each `(kind, word)` pair becomes one token positioned on the current line.
///
/// ```ignore
/// LinePattern {
///     regex: Regex::new(r"^\}$").unwrap(),
///     handler: MK_DEFAULT_HANDLER!((TokenKind::CloseCurly, "}")),
/// }
/// ```
#[macro_export]
macro_rules! MK_DEFAULT_HANDLER {
    ($(($kind:expr, $value:literal)),+ $(,)?) => {
        |lexer: &mut Lexer, _captures: &Captures| {
            $(
                let position = lexer.position();
                lexer.push(MK_TOKEN!($kind, String::from($value), position));
            )+
        }
    };
}
