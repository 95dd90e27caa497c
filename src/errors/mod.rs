//! Error types and error handling for the compiler.
//!
//! This module defines the error types used throughout the pipeline.
//! It includes:
//!
//! - Error structures with file/line information
//! - Specific error variants for every phase (lex, parse, type, runtime)
//! - Error classification and helpful suggestions for display

pub mod errors;
