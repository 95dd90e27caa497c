use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::operators::Operator;

/// One entry of an expression's token stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<O> {
    Operand(O),
    Operator(Operator),
}

/// The strategy an evaluation is carried out with.
///
/// The type checker applies operators to types, the interpreter to values and
/// the C emitter to source text. All of them share [`evaluate`], so operator
/// precedence and associativity cannot drift apart between the phases.
pub trait Apply {
    /// What appears in the token stream.
    type Operand;
    /// What lives on the operand stack.
    type Value;

    fn load(&mut self, operand: Self::Operand) -> Result<Self::Value, Error>;

    fn binary(
        &mut self,
        operator: Operator,
        left: Self::Value,
        right: Self::Value,
    ) -> Result<Self::Value, Error>;

    fn unary(&mut self, operator: Operator, operand: Self::Value) -> Result<Self::Value, Error>;
}

fn malformed(remaining: usize, position: &Position) -> Error {
    Error::new(ErrorImpl::MalformedExpression { remaining }, position.clone())
}

fn reduce<A: Apply>(
    apply: &mut A,
    operator: Operator,
    values: &mut Vec<A::Value>,
    position: &Position,
) -> Result<(), Error> {
    if operator.is_unary() {
        let operand = values.pop().ok_or_else(|| malformed(0, position))?;
        let result = apply.unary(operator, operand)?;
        values.push(result);
        return Ok(());
    }

    // Tokens are visited right to left, so the left operand sits on top.
    let (left, right) = match (values.pop(), values.pop()) {
        (Some(left), Some(right)) => (left, right),
        (left, _) => return Err(malformed(left.map_or(0, |_| 1), position)),
    };

    let result = apply.binary(operator, left, right)?;
    values.push(result);
    Ok(())
}

/// Reduces a token stream recorded in textual order to a single value.
///
/// The stream is traversed from right to left with an operand stack and an
/// operator stack. A pending binary operator is applied before a new one is
/// pushed only when it binds strictly tighter, which yields left-associative
/// grouping for operators of equal precedence. Prefix operators are applied as
/// soon as they are met, their operand being the value just pushed.
pub fn evaluate<A: Apply>(
    apply: &mut A,
    tokens: Vec<Token<A::Operand>>,
    position: &Position,
) -> Result<A::Value, Error> {
    let mut values: Vec<A::Value> = Vec::new();
    let mut operators: Vec<Operator> = Vec::new();

    for token in tokens.into_iter().rev() {
        match token {
            Token::Operand(operand) => {
                let value = apply.load(operand)?;
                values.push(value);
            }
            Token::Operator(Operator::CloseParen) => operators.push(Operator::CloseParen),
            Token::Operator(Operator::OpenParen) => loop {
                match operators.pop() {
                    Some(Operator::CloseParen) => break,
                    Some(pending) => reduce(apply, pending, &mut values, position)?,
                    None => return Err(malformed(values.len(), position)),
                }
            },
            Token::Operator(operator) if operator.is_unary() => {
                reduce(apply, operator, &mut values, position)?;
            }
            Token::Operator(operator) => {
                while let Some(pending) = operators.last().copied() {
                    if pending.is_paren() || pending.binding_power() <= operator.binding_power() {
                        break;
                    }
                    operators.pop();
                    reduce(apply, pending, &mut values, position)?;
                }
                operators.push(operator);
            }
        }
    }

    while let Some(pending) = operators.pop() {
        if pending.is_paren() {
            return Err(malformed(values.len(), position));
        }
        reduce(apply, pending, &mut values, position)?;
    }

    match (values.pop(), values.is_empty()) {
        (Some(value), true) => Ok(value),
        (Some(_), false) => Err(malformed(values.len() + 1, position)),
        (None, _) => Err(malformed(0, position)),
    }
}
