//! Parse error types for skycast expressions.

use thiserror::Error;

/// An error that occurred during parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A syntax error with location information.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        /// Byte offset of the error within the expression.
        offset: usize,
        line: usize,
        column: usize,
        message: String,
    },

    /// The expression was empty or whitespace only.
    #[error("empty expression")]
    Empty,
}

impl ParseError {
    /// Byte offset of the error, `0` for empty input.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::Syntax { offset, .. } => *offset,
            ParseError::Empty => 0,
        }
    }
}
