//! Compiling message definitions into runnable programs.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};

use thiserror::Error;

use crate::interpreter::{CompileError, EnvironmentSchema, ExpressionEngine};
use crate::messages::definition::Message;
use crate::types::Kind;

/// Which expression of a message a compile error or warning refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprRole {
    Condition,
    /// The guard of choice `choice` (zero-based) of `variable`.
    Guard { variable: String, choice: usize },
    Template,
    NegativeTemplate,
}

impl Display for ExprRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ExprRole::Condition => write!(f, "condition"),
            ExprRole::Guard { variable, choice } => {
                write!(f, "guard of choice {} of variable '{variable}'", choice + 1)
            }
            ExprRole::Template => write!(f, "template"),
            ExprRole::NegativeTemplate => write!(f, "negative template"),
        }
    }
}

/// A message that could not be compiled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MessageCompileError {
    /// One of the message's expressions failed to compile.
    #[error("message {}: {role}: {source}", label(*index, id.as_deref()))]
    Expression {
        index: usize,
        id: Option<String>,
        role: ExprRole,
        #[source]
        source: CompileError,
    },

    /// Two variables of one message share a name.
    #[error("message {}: variable '{name}' is declared more than once", label(*index, id.as_deref()))]
    DuplicateVariable {
        index: usize,
        id: Option<String>,
        name: String,
    },
}

impl MessageCompileError {
    /// Position of the failing message in the configured list.
    pub fn index(&self) -> usize {
        match self {
            MessageCompileError::Expression { index, .. }
            | MessageCompileError::DuplicateVariable { index, .. } => *index,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            MessageCompileError::Expression { id, .. }
            | MessageCompileError::DuplicateVariable { id, .. } => id.as_deref(),
        }
    }

    /// The underlying expression error, if an expression failed.
    pub fn compile_error(&self) -> Option<&CompileError> {
        match self {
            MessageCompileError::Expression { source, .. } => Some(source),
            MessageCompileError::DuplicateVariable { .. } => None,
        }
    }
}

/// A non-fatal problem found while compiling a message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileWarning {
    /// A template whose static kind is not `string`. Rendering it fails.
    #[error("message {}: {role} has kind {kind}, expected string", label(*index, id.as_deref()))]
    TemplateNotString {
        index: usize,
        id: Option<String>,
        role: ExprRole,
        kind: Kind,
    },

    /// A condition or guard whose static kind is not `bool`.
    #[error("message {}: {role} has kind {kind}, expected bool", label(*index, id.as_deref()))]
    NotBool {
        index: usize,
        id: Option<String>,
        role: ExprRole,
        kind: Kind,
    },

    /// A negative template with no condition to select it.
    #[error("message {}: negative template is never used without a condition", label(*index, id.as_deref()))]
    UnusedNegativeTemplate { index: usize, id: Option<String> },
}

/// Records a failed compile and yields the successful result, if any.
fn keep<T>(
    errors: &mut Vec<MessageCompileError>,
    result: Result<T, MessageCompileError>,
) -> Option<T> {
    result.map_err(|error| errors.push(error)).ok()
}

fn label(index: usize, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("'{id}'"),
        None => format!("#{index}"),
    }
}

/// A program together with the expression it was compiled from.
#[derive(Debug)]
pub(crate) struct Compiled<P> {
    pub(crate) source: String,
    pub(crate) program: P,
}

#[derive(Debug)]
pub(crate) struct CompiledChoice<P> {
    pub(crate) guard: Compiled<P>,
    pub(crate) value: String,
}

#[derive(Debug)]
pub(crate) struct CompiledVariable<P> {
    pub(crate) name: String,
    pub(crate) choices: Vec<CompiledChoice<P>>,
}

/// A message with every expression compiled.
#[derive(Debug)]
pub(crate) struct CompiledMessage<P> {
    pub(crate) index: usize,
    pub(crate) id: Option<String>,
    pub(crate) condition: Option<Compiled<P>>,
    pub(crate) variables: Vec<CompiledVariable<P>>,
    pub(crate) template: Compiled<P>,
    pub(crate) negative_template: Option<Compiled<P>>,
}

impl<P> CompiledMessage<P> {
    pub(crate) fn label(&self) -> String {
        label(self.index, self.id.as_deref())
    }
}

/// Compiles one message, collecting every error rather than stopping at the
/// first.
///
/// Expressions are compiled in a fixed order: the condition, then each guard
/// against `data_schema`, then the template and negative template against
/// the binding schema of declared variable names.
pub(crate) fn compile_message<E: ExpressionEngine>(
    engine: &E,
    index: usize,
    message: &Message,
    data_schema: &EnvironmentSchema,
    warnings: &mut Vec<CompileWarning>,
) -> Result<CompiledMessage<E::Program>, Vec<MessageCompileError>> {
    let mut errors = Vec::new();
    let id = message.id.clone();
    let compile = |source: &str, role: ExprRole, schema: &EnvironmentSchema| {
        engine
            .compile(source, schema)
            .map(|program| {
                let compiled = Compiled {
                    source: source.to_string(),
                    program,
                };
                (compiled, role.clone())
            })
            .map_err(|source| MessageCompileError::Expression {
                index,
                id: id.clone(),
                role,
                source,
            })
    };

    let condition = message
        .condition()
        .and_then(|source| keep(&mut errors, compile(source, ExprRole::Condition, data_schema)));

    let mut seen = BTreeSet::new();
    for variable in &message.variables {
        if !seen.insert(variable.name.as_str()) {
            errors.push(MessageCompileError::DuplicateVariable {
                index,
                id: id.clone(),
                name: variable.name.clone(),
            });
        }
    }

    let mut variables = Vec::with_capacity(message.variables.len());
    for variable in &message.variables {
        let mut choices = Vec::with_capacity(variable.choices.len());
        for (choice_index, choice) in variable.choices.iter().enumerate() {
            let role = ExprRole::Guard {
                variable: variable.name.clone(),
                choice: choice_index,
            };
            if let Some(guard) = keep(&mut errors, compile(&choice.guard, role, data_schema)) {
                choices.push((guard, choice.value.clone()));
            }
        }
        variables.push((variable.name.clone(), choices));
    }

    let binding_schema = EnvironmentSchema::strings(seen.iter().copied());
    let template = keep(
        &mut errors,
        compile(&message.template, ExprRole::Template, &binding_schema),
    );
    let negative_template = message.negative_template().and_then(|source| {
        keep(
            &mut errors,
            compile(source, ExprRole::NegativeTemplate, &binding_schema),
        )
    });

    let Some(template) = template else {
        return Err(errors);
    };
    if !errors.is_empty() {
        return Err(errors);
    }

    // Static kind checks are advisory; runtime checks decide the outcome.
    let mut warn_kind = |compiled: &(Compiled<E::Program>, ExprRole), expected: &Kind| {
        let kind = engine.result_kind(&compiled.0.program);
        if expected.accepts(&kind) {
            return;
        }
        let role = compiled.1.clone();
        warnings.push(if *expected == Kind::String {
            CompileWarning::TemplateNotString {
                index,
                id: id.clone(),
                role,
                kind,
            }
        } else {
            CompileWarning::NotBool {
                index,
                id: id.clone(),
                role,
                kind,
            }
        });
    };
    if let Some(condition) = &condition {
        warn_kind(condition, &Kind::Bool);
    }
    for (_, choices) in &variables {
        for (guard, _) in choices {
            warn_kind(guard, &Kind::Bool);
        }
    }
    warn_kind(&template, &Kind::String);
    if let Some(negative) = &negative_template {
        warn_kind(negative, &Kind::String);
    }
    if negative_template.is_some() && condition.is_none() {
        warnings.push(CompileWarning::UnusedNegativeTemplate {
            index,
            id: id.clone(),
        });
    }

    Ok(CompiledMessage {
        index,
        id,
        condition: condition.map(|(compiled, _)| compiled),
        variables: variables
            .into_iter()
            .map(|(name, choices)| CompiledVariable {
                name,
                choices: choices
                    .into_iter()
                    .map(|((guard, _), value)| CompiledChoice { guard, value })
                    .collect(),
            })
            .collect(),
        template: template.0,
        negative_template: negative_template.map(|(compiled, _)| compiled),
    })
}
