//! Type checking module.
//!
//! Walks the IR produced by the builder in program order and:
//!
//! - Computes the type of every pushed expression with the shared evaluator
//! - Resolves deferred declarations at their first assignment
//! - Back-patches resolved types into each scope's `BeginScope`
//! - Validates conditions, stores through pointers, calls and returns
//!
//! Function bodies are checked after the top-level sequence, against the
//! global scope as it stood at the end of the program.

pub mod type_checker;

#[cfg(test)]
mod tests;
