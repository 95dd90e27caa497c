//! Type system definitions.
//!
//! This module defines the closed type universe of the language:
//!
//! - Primitive scalars (integers, floats, booleans, bytes)
//! - Typed pointers into the flat global memory
//! - Function signatures
//! - The deferred (`defer`) and error (`unknown`) sentinels
//!
//! It also owns type sizes, type annotation parsing and the assignment
//! compatibility rule shared by the type checker and the interpreter.

pub mod types;

#[cfg(test)]
mod tests;
