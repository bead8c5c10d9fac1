//! Running one compiled message against a data environment.

use thiserror::Error;
use tracing::{debug, warn};

use crate::interpreter::{Environment, ExpressionEngine, RuntimeError};
use crate::messages::compiled::{Compiled, CompiledMessage, CompiledVariable};
use crate::types::Value;

/// Bound to a variable whose choices exist but none of whose guards matched.
pub const UNMATCHED: &str = "<>";

/// The result of evaluating one message.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The message rendered to this text.
    Rendered(String),
    /// The condition was false and there is no negative template.
    Skipped,
    /// Evaluation failed.
    Failed(EvalError),
}

impl Outcome {
    /// The text this outcome contributes to the batch output: the rendered
    /// text, or the empty string.
    pub fn text(&self) -> &str {
        match self {
            Outcome::Rendered(text) => text,
            Outcome::Skipped | Outcome::Failed(_) => "",
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Outcome::Rendered(text) => text,
            Outcome::Skipped | Outcome::Failed(_) => String::new(),
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, Outcome::Rendered(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Why a message failed to evaluate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("condition `{expression}` returned {found}, expected bool")]
    ConditionType { expression: String, found: String },

    #[error("condition `{expression}` failed: {source}")]
    ConditionEval {
        expression: String,
        #[source]
        source: RuntimeError,
    },

    #[error("template `{expression}` returned {found}, expected string")]
    RenderType { expression: String, found: String },

    #[error("template `{expression}` failed: {source}")]
    RenderEval {
        expression: String,
        #[source]
        source: RuntimeError,
    },
}

impl EvalError {
    /// The expression that failed.
    pub fn expression(&self) -> &str {
        match self {
            EvalError::ConditionType { expression, .. }
            | EvalError::ConditionEval { expression, .. }
            | EvalError::RenderType { expression, .. }
            | EvalError::RenderEval { expression, .. } => expression,
        }
    }
}

pub(crate) fn evaluate_message<E: ExpressionEngine>(
    engine: &E,
    message: &CompiledMessage<E::Program>,
    data: &Environment,
) -> Outcome {
    debug!(index = message.index, id = message.id.as_deref(), "Evaluating message");

    let selected = match check_condition(engine, message, data) {
        Ok(Some(template)) => template,
        Ok(None) => {
            debug!(index = message.index, "Condition false, message skipped");
            return Outcome::Skipped;
        }
        Err(error) => return Outcome::Failed(error),
    };

    let bindings: Environment = message
        .variables
        .iter()
        .map(|variable| {
            let value = resolve_variable(engine, message, variable, data);
            (variable.name.as_str(), Value::String(value))
        })
        .collect();

    match engine.run(&selected.program, &bindings) {
        Ok(Value::String(text)) => Outcome::Rendered(text),
        Ok(other) => Outcome::Failed(EvalError::RenderType {
            expression: selected.source.clone(),
            found: other.kind_name().to_string(),
        }),
        Err(source) => Outcome::Failed(EvalError::RenderEval {
            expression: selected.source.clone(),
            source,
        }),
    }
}

/// Runs the condition and picks the template to render, or `None` when the
/// message is skipped.
///
/// An absent condition selects the template the same way a true one does.
fn check_condition<'m, E: ExpressionEngine>(
    engine: &E,
    message: &'m CompiledMessage<E::Program>,
    data: &Environment,
) -> Result<Option<&'m Compiled<E::Program>>, EvalError> {
    let Some(condition) = &message.condition else {
        return Ok(Some(&message.template));
    };
    let value = engine
        .run(&condition.program, data)
        .map_err(|source| EvalError::ConditionEval {
            expression: condition.source.clone(),
            source,
        })?;
    match value {
        Value::Bool(true) => Ok(Some(&message.template)),
        Value::Bool(false) => Ok(message.negative_template.as_ref()),
        other => Err(EvalError::ConditionType {
            expression: condition.source.clone(),
            found: other.kind_name().to_string(),
        }),
    }
}

/// Picks the value of the first choice whose guard is true.
///
/// Guards that fail or return a non-bool are logged and skipped.
fn resolve_variable<E: ExpressionEngine>(
    engine: &E,
    message: &CompiledMessage<E::Program>,
    variable: &CompiledVariable<E::Program>,
    data: &Environment,
) -> String {
    if variable.choices.is_empty() {
        return String::new();
    }
    for choice in &variable.choices {
        match engine.run(&choice.guard.program, data) {
            Ok(Value::Bool(true)) => {
                debug!(
                    index = message.index,
                    variable = %variable.name,
                    value = %choice.value,
                    "Variable resolved"
                );
                return choice.value.clone();
            }
            Ok(Value::Bool(false)) => {}
            Ok(other) => warn!(
                index = message.index,
                id = message.id.as_deref(),
                variable = %variable.name,
                expression = %choice.guard.source,
                found = other.kind_name(),
                "Guard did not return a bool"
            ),
            Err(error) => warn!(
                index = message.index,
                id = message.id.as_deref(),
                variable = %variable.name,
                expression = %choice.guard.source,
                %error,
                "Guard failed"
            ),
        }
    }
    debug!(index = message.index, variable = %variable.name, "No choice matched");
    UNMATCHED.to_string()
}
