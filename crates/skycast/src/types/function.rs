use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::interpreter::RuntimeError;
use crate::types::{Signature, Value};

/// Body of a native function.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync;

/// A function value: a named native closure plus its signature.
///
/// The signature is what the compiler checks calls against; the closure is
/// only invoked with arguments that already passed that check. Cloning is
/// cheap (the closure is reference counted).
#[derive(Clone)]
pub struct NativeFunction {
    name: Arc<str>,
    signature: Signature,
    body: Arc<NativeFn>,
}

impl NativeFunction {
    /// Creates a function value.
    pub fn new<F>(name: impl Into<Arc<str>>, signature: Signature, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature,
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Invokes the function.
    pub fn call(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        (self.body)(args)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.body, &other.body)
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.name, self.signature)
    }
}
