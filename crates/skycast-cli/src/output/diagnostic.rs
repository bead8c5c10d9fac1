//! Miette diagnostics for expression compile errors.
//!
//! Note: This module has an exception for `unused_assignments` because miette
//! derive macros read struct fields in generated code that rustc cannot track.
#![allow(unused_assignments)]

use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use skycast::{CompileError, CompileErrorKind, MessageCompileError};
use thiserror::Error;

/// A compile error pointing into the offending expression.
#[derive(Debug, Error, Diagnostic)]
#[error("{title}")]
#[diagnostic(code(skycast::compile))]
pub struct ExpressionDiagnostic {
    title: String,

    #[source_code]
    src: NamedSource<String>,

    #[label("{cause}")]
    span: SourceSpan,

    cause: String,

    #[help]
    help: Option<String>,
}

impl ExpressionDiagnostic {
    /// Create a diagnostic for `error`, naming the expression `source_name`.
    pub fn new(title: String, source_name: String, error: &CompileError) -> Self {
        let help = match &error.cause {
            CompileErrorKind::UnknownIdentifier { suggestions, .. }
            | CompileErrorKind::UnknownField { suggestions, .. }
                if !suggestions.is_empty() =>
            {
                Some(format!("did you mean: {}?", suggestions.join(", ")))
            }
            _ => None,
        };
        let start = error.span.start.min(error.expression.len());
        let len = error.span.len().min(error.expression.len() - start);
        Self {
            title,
            src: NamedSource::new(source_name, error.expression.clone()),
            span: (start, len).into(),
            cause: cause_without_suggestions(&error.cause),
            help,
        }
    }
}

/// A message compile error with no expression to point into.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(skycast::message))]
pub struct MessageDiagnostic {
    message: String,
}

/// Build the report for a message compile error in the config at
/// `config_path`.
pub fn compile_report(config_path: &Path, error: &MessageCompileError) -> miette::Report {
    match error {
        MessageCompileError::Expression { role, source, .. } => {
            let label = match error.id() {
                Some(id) => format!("'{id}'"),
                None => format!("#{}", error.index()),
            };
            miette::Report::new(ExpressionDiagnostic::new(
                format!("message {label}: cannot compile {role}"),
                format!("{} [message {label}, {role}]", config_path.display()),
                source,
            ))
        }
        MessageCompileError::DuplicateVariable { .. } => miette::Report::new(MessageDiagnostic {
            message: error.to_string(),
        }),
    }
}

/// The cause text, leaving suggestions to the help line.
fn cause_without_suggestions(cause: &CompileErrorKind) -> String {
    match cause {
        CompileErrorKind::UnknownIdentifier { name, .. } => format!("unknown identifier '{name}'"),
        CompileErrorKind::UnknownField { object, field, .. } => {
            format!("'{object}' has no field '{field}'")
        }
        other => other.to_string(),
    }
}
