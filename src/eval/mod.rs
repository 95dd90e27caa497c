//! Shared expression evaluator.
//!
//! Expressions are stored by the IR builder as flat operand/operator token
//! streams in textual order. This module reduces such a stream with a
//! precedence-climbing algorithm parameterised by an [`eval::Apply`] strategy,
//! and owns the operator table (precedence and result typing) every strategy
//! relies on.

pub mod eval;
pub mod operators;
