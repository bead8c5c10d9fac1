//! Expression compilation and evaluation.
//!
//! Expressions are compiled against an [`EnvironmentSchema`] that names the
//! variables and functions they may reference, producing an immutable
//! [`Program`]. Programs are then run against an [`Environment`] of concrete
//! values. Compilation never needs live data.

mod checker;
mod engine;
mod environment;
mod error;
mod functions;
mod program;
mod schema;

pub use engine::{ExpressionEngine, Interpreter, compile};
pub use environment::Environment;
pub use error::{CompileError, CompileErrorKind, RuntimeError, compute_suggestions};
pub use functions::{FunctionRegistry, sprintf};
pub use program::Program;
pub use schema::EnvironmentSchema;

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::types::{Kind, Signature, Value};

    fn schema() -> EnvironmentSchema {
        EnvironmentSchema::new()
            .with("temperature", Kind::Float)
            .with("cloudiness", Kind::Int)
            .with("label", Kind::String)
            .with("now", Kind::Timestamp)
            .with(
                "forecast",
                Kind::record([("hours", Kind::Int), ("rain", Kind::Float)]),
            )
            .with(
                "rainIn",
                Kind::function(Signature::new(vec![Kind::Int], Kind::Float)),
            )
    }

    fn env() -> Environment {
        Environment::new()
            .with("temperature", 12.5)
            .with("cloudiness", 40)
            .with("label", "rain")
            .with(
                "now",
                DateTime::parse_from_rfc3339("2026-10-18T07:30:00+02:00").unwrap(),
            )
            .with(
                "forecast",
                Value::record([("hours", Value::Int(12)), ("rain", Value::Float(3.5))]),
            )
            .with_function(
                "rainIn",
                Signature::new(vec![Kind::Int], Kind::Float),
                |args| match args.first().and_then(Value::as_int) {
                    Some(hours) if (0..12).contains(&hours) => Ok(Value::Float(0.5)),
                    _ => Err(RuntimeError::function("rainIn", "out of range")),
                },
            )
    }

    fn eval(source: &str) -> Result<Value, RuntimeError> {
        compile(source, &schema()).unwrap().run(&env())
    }

    fn compile_err(source: &str) -> CompileErrorKind {
        compile(source, &schema()).unwrap_err().cause
    }

    #[test]
    fn arithmetic_and_comparison() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), Value::Int(7));
        assert_eq!(eval("(1 + 2) * 3").unwrap(), Value::Int(9));
        assert_eq!(eval("7 / 2").unwrap(), Value::Float(3.5));
        assert_eq!(eval("7 % 4").unwrap(), Value::Int(3));
        assert_eq!(eval("temperature + 1").unwrap(), Value::Float(13.5));
        assert_eq!(eval("-cloudiness").unwrap(), Value::Int(-40));
        assert_eq!(eval("temperature < 20 && temperature > 10").unwrap(), Value::Bool(true));
        assert_eq!(eval("cloudiness == 40.0").unwrap(), Value::Bool(true));
        assert_eq!(eval("'a' < 'b'").unwrap(), Value::Bool(true));
    }

    #[test]
    fn strings_and_builtins() {
        assert_eq!(eval("'Test is ' + label").unwrap(), Value::from("Test is rain"));
        assert_eq!(eval("upper(label)").unwrap(), Value::from("RAIN"));
        assert_eq!(
            eval("sprintf('%.1f mm', forecast.rain)").unwrap(),
            Value::from("3.5 mm")
        );
        assert_eq!(eval("len(label) == 4").unwrap(), Value::Bool(true));
    }

    #[test]
    fn members_calls_and_ternary() {
        assert_eq!(eval("forecast.hours").unwrap(), Value::Int(12));
        assert_eq!(eval("rainIn(3)").unwrap(), Value::Float(0.5));
        assert_eq!(eval("now.hour").unwrap(), Value::Int(7));
        assert_eq!(eval("now.weekday").unwrap(), Value::Int(0));
        assert_eq!(
            eval("cloudiness > 50 ? 'cloudy' : 'clear'").unwrap(),
            Value::from("clear")
        );
        assert_eq!(eval("true ? 1 : 2.5").unwrap(), Value::Float(1.0));
        assert_eq!(eval("false ? 2.5 : cloudiness").unwrap(), Value::Float(40.0));
        assert_eq!(eval("true ? 1 : 2").unwrap(), Value::Int(1));
    }

    #[test]
    fn logical_operators_short_circuit() {
        assert_eq!(eval("false && rainIn(99) > 0").unwrap(), Value::Bool(false));
        assert_eq!(eval("true || rainIn(99) > 0").unwrap(), Value::Bool(true));
        assert!(matches!(
            eval("true && rainIn(99) > 0"),
            Err(RuntimeError::Function { .. })
        ));
    }

    #[test]
    fn runtime_errors() {
        assert_eq!(eval("cloudiness % 0"), Err(RuntimeError::DivisionByZero));
        assert_eq!(eval("temperature / 0"), Err(RuntimeError::DivisionByZero));
        assert!(matches!(
            eval("9223372036854775807 + cloudiness"),
            Err(RuntimeError::Overflow { .. })
        ));
    }

    #[test]
    fn run_requires_free_variables() {
        let program = compile("temperature > 10", &schema()).unwrap();
        let names: Vec<&str> = program.free_variables().names().collect();
        assert_eq!(names, vec!["temperature"]);

        let empty = Environment::new();
        assert_eq!(
            program.run(&empty),
            Err(RuntimeError::MissingBinding {
                name: "temperature".to_string()
            })
        );
        let wrong = Environment::new().with("temperature", "hot");
        assert!(matches!(
            program.run(&wrong),
            Err(RuntimeError::BindingKind { .. })
        ));
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(
            compile_err("temprature > 3"),
            CompileErrorKind::UnknownIdentifier {
                name: "temprature".to_string(),
                suggestions: vec!["temperature".to_string()],
            }
        );
        assert!(matches!(
            compile_err("forecast.rian"),
            CompileErrorKind::UnknownField { .. }
        ));
        assert!(matches!(
            compile_err("upper"),
            CompileErrorKind::BareFunction { .. }
        ));
    }

    #[test]
    fn kinds_are_checked() {
        assert!(matches!(
            compile_err("label + 1"),
            CompileErrorKind::InvalidBinary { .. }
        ));
        assert!(matches!(
            compile_err("!cloudiness"),
            CompileErrorKind::InvalidUnary { .. }
        ));
        assert!(matches!(
            compile_err("cloudiness ? 1 : 2"),
            CompileErrorKind::ConditionNotBool { .. }
        ));
        assert!(matches!(
            compile_err("true ? 1 : 'x'"),
            CompileErrorKind::BranchMismatch { .. }
        ));
        assert!(matches!(
            compile_err("rainIn('x')"),
            CompileErrorKind::ArgumentType { position: 1, .. }
        ));
        assert!(matches!(
            compile_err("rainIn(1, 2)"),
            CompileErrorKind::ArgumentCount { got: 2, .. }
        ));
        assert!(matches!(
            compile_err("label(1)"),
            CompileErrorKind::NotCallable { .. }
        ));
        assert!(matches!(
            compile_err("cloudiness.hours"),
            CompileErrorKind::NoFields { .. }
        ));
    }

    #[test]
    fn error_span_points_at_fragment() {
        let error = compile("temperature > 3 && missing", &schema()).unwrap_err();
        assert_eq!(error.fragment(), "missing");
        assert_eq!(error.span.start, 19);
    }

    #[test]
    fn schema_names_shadow_builtins() {
        let schema = EnvironmentSchema::new().with("upper", Kind::String);
        let program = compile("upper + '!'", &schema).unwrap();
        let env = Environment::new().with("upper", "hi");
        assert_eq!(program.run(&env).unwrap(), Value::from("hi!"));
    }
}
