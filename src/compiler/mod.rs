//! C code generation module.
//!
//! This module renders a type checked program as one C translation unit:
//!
//! - Fixed-width type aliases and one print helper per primitive
//! - A flat byte buffer sized to the program's memory capacity, with
//!   big-endian, bounds-checked load and store helpers
//! - One C function per source function, reached through a function table
//! - A `main` translating the top-level operations

pub mod compiler;
pub mod expr;
pub mod stmt;
