use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// The static type of an expression or environment entry.
///
/// Kinds are what the compiler checks expressions against. They are
/// deliberately coarse: a handful of scalar kinds, records with named fields,
/// and native function signatures.
///
/// # Example
///
/// ```
/// use skycast::Kind;
///
/// assert!(Kind::Float.accepts(&Kind::Int));
/// assert!(!Kind::Int.accepts(&Kind::Float));
/// assert!(Kind::Any.accepts(&Kind::String));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    /// Unknown until run time. Accepts every other kind.
    Any,
    Bool,
    Int,
    Float,
    String,
    Timestamp,
    /// A record with named fields.
    Record(BTreeMap<String, Kind>),
    /// A native function.
    Function(Box<Signature>),
}

/// Parameter and return kinds of a native function.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// Kinds of the fixed leading parameters.
    pub params: Vec<Kind>,
    /// Kind of any additional trailing arguments, for variadic functions.
    pub rest: Option<Kind>,
    /// Kind of the returned value.
    pub returns: Kind,
}

impl Signature {
    /// Creates a signature with fixed parameters.
    pub fn new(params: Vec<Kind>, returns: Kind) -> Self {
        Self {
            params,
            rest: None,
            returns,
        }
    }

    /// Creates a variadic signature: `params` followed by any number of `rest`.
    pub fn variadic(params: Vec<Kind>, rest: Kind, returns: Kind) -> Self {
        Self {
            params,
            rest: Some(rest),
            returns,
        }
    }

    /// Returns true if `count` arguments satisfy this signature's arity.
    pub fn accepts_arity(&self, count: usize) -> bool {
        if self.rest.is_some() {
            count >= self.params.len()
        } else {
            count == self.params.len()
        }
    }

    /// Kind expected for the argument at `position`, if any.
    pub fn param(&self, position: usize) -> Option<&Kind> {
        self.params.get(position).or(self.rest.as_ref())
    }
}

impl Kind {
    /// Creates a record kind from `(field, kind)` pairs.
    pub fn record<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Kind)>,
        S: Into<String>,
    {
        Kind::Record(
            fields
                .into_iter()
                .map(|(name, kind)| (name.into(), kind))
                .collect(),
        )
    }

    /// Creates a function kind from a signature.
    pub fn function(signature: Signature) -> Self {
        Kind::Function(Box::new(signature))
    }

    /// Returns true if a value of kind `other` may be used where `self` is
    /// expected.
    ///
    /// `Any` accepts and is accepted by everything, `Float` accepts `Int`,
    /// and a record accepts any record that has at least its fields with
    /// acceptable kinds.
    pub fn accepts(&self, other: &Kind) -> bool {
        match (self, other) {
            (Kind::Any, _) | (_, Kind::Any) => true,
            (Kind::Float, Kind::Int) => true,
            (Kind::Record(expected), Kind::Record(actual)) => {
                expected.iter().all(|(name, kind)| {
                    actual
                        .get(name)
                        .is_some_and(|actual_kind| kind.accepts(actual_kind))
                })
            }
            (Kind::Function(expected), Kind::Function(actual)) => expected == actual,
            _ => self == other,
        }
    }

    /// Returns true for `Int`, `Float`, and `Any`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Kind::Int | Kind::Float | Kind::Any)
    }

    /// The kind of a value produced by combining two numeric kinds.
    pub(crate) fn widen(&self, other: &Kind) -> Kind {
        match (self, other) {
            (Kind::Int, Kind::Int) => Kind::Int,
            (Kind::Any, _) | (_, Kind::Any) => Kind::Any,
            _ => Kind::Float,
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Kind::Any => write!(f, "any"),
            Kind::Bool => write!(f, "bool"),
            Kind::Int => write!(f, "int"),
            Kind::Float => write!(f, "float"),
            Kind::String => write!(f, "string"),
            Kind::Timestamp => write!(f, "timestamp"),
            Kind::Record(fields) => {
                write!(f, "record{{")?;
                for (i, (name, kind)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {kind}")?;
                }
                write!(f, "}}")
            }
            Kind::Function(signature) => write!(f, "{signature}"),
        }
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "fn(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        if let Some(rest) = &self.rest {
            if !self.params.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "{rest}...")?;
        }
        write!(f, ") -> {}", self.returns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accepts_wider_record() {
        let expected = Kind::record([("hours", Kind::Int)]);
        let actual = Kind::record([("hours", Kind::Int), ("rain", Kind::Float)]);
        assert!(expected.accepts(&actual));
        assert!(!actual.accepts(&expected));
    }

    #[test]
    fn signature_display() {
        let sig = Signature::variadic(vec![Kind::String], Kind::Any, Kind::String);
        assert_eq!(sig.to_string(), "fn(string, any...) -> string");
        let sig = Signature::new(vec![Kind::Int], Kind::Float);
        assert_eq!(Kind::function(sig).to_string(), "fn(int) -> float");
    }

    #[test]
    fn variadic_arity() {
        let sig = Signature::variadic(vec![Kind::String], Kind::Any, Kind::String);
        assert!(!sig.accepts_arity(0));
        assert!(sig.accepts_arity(1));
        assert!(sig.accepts_arity(4));
        assert_eq!(sig.param(3), Some(&Kind::Any));
    }
}
