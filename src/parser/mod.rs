//! IR builder.
//!
//! Turns the token stream into the linear IR of [`crate::ir`]:
//!
//! - Statement dispatch through a token-kind lookup table
//! - Symbol resolution against the stack of open scopes, once, at parse time
//! - Expression splitting and literal classification
//! - Back-patching of jump lengths when a block closes
//! - Function literals, emitted into their own operation sequences

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
