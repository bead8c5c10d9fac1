//! Runtime environments: the concrete values a compiled program runs against.

use std::collections::BTreeMap;

use crate::interpreter::RuntimeError;
use crate::types::{NativeFunction, Signature, Value};

/// Named values supplied to a compiled program for one run.
///
/// An environment is built fresh by the caller for each evaluation pass and
/// is only ever read by the engine.
///
/// # Example
///
/// ```
/// use skycast::{Environment, Kind, Signature, Value};
///
/// let env = Environment::new()
///     .with("temperature", 15)
///     .with_function("double", Signature::new(vec![Kind::Int], Kind::Int), |args| {
///         Ok(Value::Int(args[0].as_int().unwrap_or(0) * 2))
///     });
/// assert_eq!(env.get("temperature"), Some(&Value::Int(15)));
/// assert!(env.contains("double"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    values: BTreeMap<String, Value>,
}

impl Environment {
    /// Create a new empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, returning the environment for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add a native function, returning the environment for chaining.
    pub fn with_function<F>(self, name: &str, signature: Signature, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        self.with(name, NativeFunction::new(name, signature, body))
    }

    /// Add or replace a value. Returns the previous value, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for Environment {
    fn from_iter<T: IntoIterator<Item = (S, Value)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }
}
