//! Error types for the skycast interpreter.

use strsim::levenshtein;
use thiserror::Error;

use crate::parser::{BinaryOp, ParseError, Span, UnaryOp};
use crate::types::Kind;

/// An expression that could not be compiled.
///
/// Carries the offending expression and the span of the sub-expression that
/// caused the failure, so callers can point at it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot compile `{expression}`: {cause}")]
pub struct CompileError {
    /// The full source expression.
    pub expression: String,
    /// Location of the failing sub-expression within `expression`.
    pub span: Span,
    #[source]
    pub cause: CompileErrorKind,
}

impl CompileError {
    pub fn new(expression: impl Into<String>, span: Span, cause: CompileErrorKind) -> Self {
        Self {
            expression: expression.into(),
            span,
            cause,
        }
    }

    /// Wrap a parse error for `expression`.
    pub fn from_parse(expression: &str, error: ParseError) -> Self {
        let offset = error.offset().min(expression.len());
        Self::new(
            expression,
            Span::new(offset, offset),
            CompileErrorKind::Parse(error),
        )
    }

    /// The text of the failing sub-expression.
    pub fn fragment(&self) -> &str {
        self.expression
            .get(self.span.start..self.span.end)
            .unwrap_or("")
    }
}

/// Why an expression could not be compiled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileErrorKind {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A name that is neither in the schema nor a built-in function.
    #[error("unknown identifier '{name}'{}", format_suggestions(suggestions))]
    UnknownIdentifier {
        name: String,
        suggestions: Vec<String>,
    },

    /// A member access on a record or timestamp that has no such field.
    #[error("'{object}' has no field '{field}'{}", format_suggestions(suggestions))]
    UnknownField {
        object: String,
        field: String,
        suggestions: Vec<String>,
    },

    /// A member access on a value that has no fields.
    #[error("cannot access field '{field}' on {kind}")]
    NoFields { kind: Kind, field: String },

    /// A call on something that is not a function.
    #[error("{kind} is not callable")]
    NotCallable { kind: Kind },

    /// Wrong number of arguments passed to a function.
    #[error("function '{function}' expects {expected} arguments, got {got}")]
    ArgumentCount {
        function: String,
        expected: String,
        got: usize,
    },

    /// An argument of the wrong kind.
    #[error("argument {position} of '{function}' must be {expected}, found {found}")]
    ArgumentType {
        function: String,
        position: usize,
        expected: Kind,
        found: Kind,
    },

    #[error("operator '{op}' cannot be applied to {left} and {right}")]
    InvalidBinary {
        op: BinaryOp,
        left: Kind,
        right: Kind,
    },

    #[error("operator '{op}' cannot be applied to {operand}")]
    InvalidUnary { op: UnaryOp, operand: Kind },

    /// The condition of `a ? b : c` is not boolean.
    #[error("condition of '?:' must be bool, found {found}")]
    ConditionNotBool { found: Kind },

    /// The two branches of `a ? b : c` have incompatible kinds.
    #[error("branches of '?:' have different kinds: {then_kind} and {else_kind}")]
    BranchMismatch { then_kind: Kind, else_kind: Kind },

    /// A function was named without being called.
    #[error("built-in function '{name}' must be called")]
    BareFunction { name: String },
}

/// A failure while running a compiled program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// The environment does not provide a variable the program references.
    #[error("missing binding for '{name}'")]
    MissingBinding { name: String },

    /// The environment provides a variable with the wrong kind.
    #[error("binding '{name}' must be {expected}, found {found}")]
    BindingKind {
        name: String,
        expected: Kind,
        found: Kind,
    },

    /// A record does not carry a field the program reads.
    #[error("missing field '{field}'")]
    MissingField { field: String },

    /// A value of an unexpected kind reached an operator.
    #[error("operator '{op}' cannot be applied to {found}")]
    TypeMismatch { op: String, found: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in '{op}'")]
    Overflow { op: BinaryOp },

    /// A native function reported a failure.
    #[error("{function}: {message}")]
    Function { function: String, message: String },

    /// A `sprintf` format string could not be applied.
    #[error("bad format string '{format}': {message}")]
    Format { format: String, message: String },
}

impl RuntimeError {
    /// Convenience constructor for native function failures.
    pub fn function(function: impl Into<String>, message: impl Into<String>) -> Self {
        RuntimeError::Function {
            function: function.into(),
            message: message.into(),
        }
    }
}

/// Compute "did you mean" suggestions for an unknown name.
///
/// Returns up to 3 candidates within Levenshtein distance 2 (distance 1 for
/// names of 3 characters or fewer), closest first.
pub fn compute_suggestions<'a, I>(name: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let max_distance = if name.chars().count() <= 3 { 1 } else { 2 };
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .map(|candidate| (levenshtein(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= max_distance)
        .collect();
    scored.sort();
    scored
        .into_iter()
        .take(3)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(", did you mean: {}?", suggestions.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_are_sorted_and_limited() {
        let names = ["temperature", "tempMin", "tempMax", "feelsLike"];
        assert_eq!(
            compute_suggestions("temprature", names),
            vec!["temperature"]
        );
        assert_eq!(compute_suggestions("tempMix", names), vec!["tempMax", "tempMin"]);
        assert!(compute_suggestions("xyz", names).is_empty());
    }
}
