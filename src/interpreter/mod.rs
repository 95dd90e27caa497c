//! Stack machine executing the type checked IR.
//!
//! Holds a stack of scope frames, each a list of sized byte buffers built
//! from a `BeginScope`, and a flat byte array standing in for addressable
//! memory. Values are stored big-endian in both.

pub mod interpreter;
pub mod value;

#[cfg(test)]
mod tests;
