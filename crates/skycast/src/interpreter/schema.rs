//! Environment schemas: the names and kinds an expression may reference.

use std::collections::BTreeMap;

use crate::interpreter::{Environment, RuntimeError};
use crate::types::Kind;

/// A mapping from variable name to its kind.
///
/// Expressions are compiled against a schema, never against live data. Two
/// kinds of schema are used by the message evaluator: the data schema
/// describing the weather environment, and per-message binding schemas in
/// which every declared variable is a string.
///
/// # Example
///
/// ```
/// use skycast::{EnvironmentSchema, Kind};
///
/// let schema = EnvironmentSchema::new()
///     .with("temperature", Kind::Float)
///     .with("cloudiness", Kind::Int);
/// assert_eq!(schema.get("temperature"), Some(&Kind::Float));
/// assert_eq!(schema.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentSchema {
    entries: BTreeMap<String, Kind>,
}

impl EnvironmentSchema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema in which every name is a string.
    pub fn strings<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .map(|name| (name.into(), Kind::String))
            .collect()
    }

    /// Derive a schema from the values present in an environment.
    pub fn of(environment: &Environment) -> Self {
        environment
            .iter()
            .map(|(name, value)| (name.to_string(), value.kind()))
            .collect()
    }

    /// Add an entry, returning the schema for chaining.
    pub fn with(mut self, name: impl Into<String>, kind: Kind) -> Self {
        self.insert(name, kind);
        self
    }

    /// Add or replace an entry. Returns the previous kind, if any.
    pub fn insert(&mut self, name: impl Into<String>, kind: Kind) -> Option<Kind> {
        self.entries.insert(name.into(), kind)
    }

    pub fn get(&self, name: &str) -> Option<&Kind> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Kind)> {
        self.entries.iter().map(|(name, kind)| (name.as_str(), kind))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that `environment` provides every entry with an acceptable kind.
    ///
    /// Returns the first missing or mismatched binding.
    pub fn validate(&self, environment: &Environment) -> Result<(), RuntimeError> {
        for (name, expected) in &self.entries {
            let value = environment
                .get(name)
                .ok_or_else(|| RuntimeError::MissingBinding { name: name.clone() })?;
            let found = value.kind();
            if !expected.accepts(&found) {
                return Err(RuntimeError::BindingKind {
                    name: name.clone(),
                    expected: expected.clone(),
                    found,
                });
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, Kind)> for EnvironmentSchema {
    fn from_iter<T: IntoIterator<Item = (String, Kind)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
