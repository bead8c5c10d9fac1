//! Expression parser.
//!
//! This module turns expression source text into an AST with byte spans. The
//! AST is what the interpreter binds and type checks against a schema.

pub mod ast;
pub mod error;
mod expr;

pub use ast::*;
pub use error::ParseError;
pub use expr::parse_expression;
