use bon::Builder;
use serde::{Deserialize, Serialize};

/// A configured message: a template rendered from declared variables,
/// optionally gated by a condition over the weather data.
///
/// # Example
///
/// ```
/// use skycast::{Choice, Message, Variable};
///
/// let message = Message::builder()
///     .template("'Bring an umbrella'")
///     .condition("rain3h > 0")
///     .build();
/// assert_eq!(message.condition(), Some("rain3h > 0"));
/// assert_eq!(message.negative_template(), None);
///
/// let layered = Message::builder()
///     .template("'Wear a ' + layer")
///     .variables(vec![Variable::new(
///         "layer",
///         vec![Choice::new("temperature < 10", "coat"), Choice::new("true", "jumper")],
///     )])
///     .build();
/// assert_eq!(layered.variables.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Message {
    /// Identifies the message in logs and diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub id: Option<String>,

    /// Expression producing the rendered text. Sees only the declared
    /// variables, each bound to a string.
    #[serde(alias = "message")]
    #[builder(into)]
    pub template: String,

    /// Rendered instead of `template` when the condition is false.
    #[serde(default, alias = "negative_message", skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub negative_template: Option<String>,

    /// Boolean expression over the weather data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub condition: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub variables: Vec<Variable>,
}

impl Message {
    /// The condition, if one is configured and non-blank.
    pub fn condition(&self) -> Option<&str> {
        non_blank(self.condition.as_deref())
    }

    /// The negative template, if one is configured and non-blank.
    pub fn negative_template(&self) -> Option<&str> {
        non_blank(self.negative_template.as_deref())
    }

    /// A label for diagnostics: the id when present, else the position.
    pub fn label(&self, index: usize) -> String {
        match &self.id {
            Some(id) => format!("'{id}'"),
            None => format!("#{index}"),
        }
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|s| !s.trim().is_empty())
}

/// A named value chosen from an ordered list of guarded choices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Variable {
    pub name: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl Variable {
    pub fn new(name: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self {
            name: name.into(),
            choices,
        }
    }
}

/// One candidate value for a variable, taken when `guard` is true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Choice {
    #[serde(alias = "expression")]
    pub guard: String,
    pub value: String,
}

impl Choice {
    pub fn new(guard: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            guard: guard.into(),
            value: value.into(),
        }
    }
}
