//! Built-in function registry.
//!
//! Built-ins are resolvable from every expression, after schema names. They
//! cover the string formatting helpers message templates need.

use std::collections::BTreeMap;

use crate::interpreter::RuntimeError;
use crate::types::{Kind, NativeFunction, Signature, Value};

/// Registry of functions available to every compiled expression.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, NativeFunction>,
}

impl FunctionRegistry {
    /// Create a registry with no functions.
    pub fn empty() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    /// Create a registry holding the standard built-ins:
    /// `sprintf`, `upper`, `lower`, `trim`, `len`, `abs`, `round`, `string`.
    pub fn builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(NativeFunction::new(
            "sprintf",
            Signature::variadic(vec![Kind::String], Kind::Any, Kind::String),
            |args| {
                let format = expect_str("sprintf", args, 0)?;
                sprintf(format, &args[1..]).map(Value::String)
            },
        ));
        registry.register(string_fn("upper", str::to_uppercase));
        registry.register(string_fn("lower", str::to_lowercase));
        registry.register(string_fn("trim", |s| s.trim().to_string()));
        registry.register(NativeFunction::new(
            "len",
            Signature::new(vec![Kind::String], Kind::Int),
            |args| {
                let s = expect_str("len", args, 0)?;
                i64::try_from(s.chars().count())
                    .map(Value::Int)
                    .map_err(|_| RuntimeError::function("len", "string too long"))
            },
        ));
        registry.register(NativeFunction::new(
            "abs",
            Signature::new(vec![Kind::Float], Kind::Float),
            |args| Ok(Value::Float(expect_float("abs", args, 0)?.abs())),
        ));
        registry.register(NativeFunction::new(
            "round",
            Signature::new(vec![Kind::Float], Kind::Int),
            |args| {
                let rounded = expect_float("round", args, 0)?.round();
                if rounded.is_finite() && rounded.abs() < 9.0e18 {
                    Ok(Value::Int(rounded as i64))
                } else {
                    Err(RuntimeError::function("round", "value out of range"))
                }
            },
        ));
        registry.register(NativeFunction::new(
            "string",
            Signature::new(vec![Kind::Any], Kind::String),
            |args| {
                args.first()
                    .map(|value| Value::String(value.to_string()))
                    .ok_or_else(|| RuntimeError::function("string", "missing argument"))
            },
        ));
        registry
    }

    /// Register a function, replacing any previous function of the same name.
    pub fn register(&mut self, function: NativeFunction) {
        self.functions.insert(function.name().to_string(), function);
    }

    pub fn get(&self, name: &str) -> Option<&NativeFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Function names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::builtins()
    }
}

fn string_fn(name: &'static str, f: fn(&str) -> String) -> NativeFunction {
    NativeFunction::new(
        name,
        Signature::new(vec![Kind::String], Kind::String),
        move |args| Ok(Value::String(f(expect_str(name, args, 0)?))),
    )
}

fn expect_str<'a>(
    function: &str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a str, RuntimeError> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            RuntimeError::function(function, format!("argument {} must be a string", index + 1))
        })
}

fn expect_float(function: &str, args: &[Value], index: usize) -> Result<f64, RuntimeError> {
    args.get(index)
        .and_then(Value::as_float)
        .ok_or_else(|| {
            RuntimeError::function(function, format!("argument {} must be a number", index + 1))
        })
}

/// Format `args` according to a printf-style `format`.
///
/// Supports the verbs `%d`, `%f`, `%s`, `%v`, `%t` and the literal `%%`,
/// with an optional `-` flag, width, and `.precision`.
///
/// # Example
///
/// ```
/// use skycast::interpreter::sprintf;
/// use skycast::Value;
///
/// let text = sprintf("%.1f°C, %d%% clouds", &[Value::Float(21.46), Value::Int(40)]).unwrap();
/// assert_eq!(text, "21.5°C, 40% clouds");
/// ```
pub fn sprintf(format: &str, args: &[Value]) -> Result<String, RuntimeError> {
    let bad_format = |message: String| RuntimeError::Format {
        format: format.to_string(),
        message,
    };

    let mut out = String::with_capacity(format.len());
    let mut args = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let left_align = chars.next_if_eq(&'-').is_some();
        let mut width = String::new();
        while let Some(d) = chars.next_if(char::is_ascii_digit) {
            width.push(d);
        }
        let mut precision: Option<usize> = None;
        if chars.next_if_eq(&'.').is_some() {
            let mut digits = String::new();
            while let Some(d) = chars.next_if(char::is_ascii_digit) {
                digits.push(d);
            }
            precision = Some(digits.parse().unwrap_or(0));
        }

        let verb = chars
            .next()
            .ok_or_else(|| bad_format("trailing '%'".to_string()))?;
        if verb == '%' {
            out.push('%');
            continue;
        }

        let arg = args
            .next()
            .ok_or_else(|| bad_format(format!("missing argument for '%{verb}'")))?;
        let text = match (verb, arg) {
            ('d', Value::Int(n)) => n.to_string(),
            ('f', value) => match value.as_float() {
                Some(f) => format!("{:.*}", precision.unwrap_or(6), f),
                None => return Err(bad_format(format!("'%f' given {}", value.kind_name()))),
            },
            ('t', Value::Bool(b)) => b.to_string(),
            ('s' | 'v', Value::Float(f)) => match precision {
                Some(p) => format!("{f:.p$}"),
                None => f.to_string(),
            },
            ('s' | 'v', value) => value.to_string(),
            ('d' | 't', value) => {
                return Err(bad_format(format!(
                    "'%{verb}' given {}",
                    value.kind_name()
                )));
            }
            (other, _) => return Err(bad_format(format!("unknown verb '%{other}'"))),
        };

        match width.parse::<usize>() {
            Ok(w) if left_align => out.push_str(&format!("{text:<w$}")),
            Ok(w) => out.push_str(&format!("{text:>w$}")),
            Err(_) => out.push_str(&text),
        }
    }

    if args.next().is_some() {
        return Err(bad_format("too many arguments".to_string()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprintf_verbs() {
        let args = [
            Value::Int(7),
            Value::Float(2.5),
            Value::from("rain"),
            Value::Bool(true),
        ];
        assert_eq!(
            sprintf("%d|%.2f|%s|%t", &args).unwrap(),
            "7|2.50|rain|true"
        );
        assert_eq!(sprintf("%v", &[Value::Float(3.0)]).unwrap(), "3");
        assert_eq!(sprintf("[%4d]", &[Value::Int(42)]).unwrap(), "[  42]");
        assert_eq!(sprintf("[%-4s]", &[Value::from("ab")]).unwrap(), "[ab  ]");
        assert_eq!(sprintf("100%%", &[]).unwrap(), "100%");
    }

    #[test]
    fn sprintf_errors() {
        assert!(matches!(
            sprintf("%d", &[]),
            Err(RuntimeError::Format { .. })
        ));
        assert!(matches!(
            sprintf("%d", &[Value::from("x")]),
            Err(RuntimeError::Format { .. })
        ));
        assert!(matches!(
            sprintf("plain", &[Value::Int(1)]),
            Err(RuntimeError::Format { .. })
        ));
        assert!(matches!(sprintf("%", &[]), Err(RuntimeError::Format { .. })));
        assert!(matches!(
            sprintf("%q", &[Value::Int(1)]),
            Err(RuntimeError::Format { .. })
        ));
    }

    #[test]
    fn builtins_are_registered() {
        let registry = FunctionRegistry::builtins();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec!["abs", "len", "lower", "round", "sprintf", "string", "trim", "upper"]
        );
        let upper = registry.get("upper").unwrap();
        assert_eq!(upper.call(&[Value::from("rain")]).unwrap(), Value::from("RAIN"));
        let round = registry.get("round").unwrap();
        assert_eq!(round.call(&[Value::Float(2.5)]).unwrap(), Value::Int(3));
    }
}
