//! Linear intermediate representation.
//!
//! A program is a flat sequence of scope-annotated operations plus one
//! sequence per function literal. Structured control flow is encoded as
//! relative jump lengths written into the operations when their block
//! closes, so no basic-block graph is needed.

pub mod ir;
