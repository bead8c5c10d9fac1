pub mod config;
pub mod interpreter;
pub mod messages;
pub mod parser;
pub mod types;
pub mod weather;

pub use config::{Config, ConfigError, LogFormat, LoggingConfig};
pub use interpreter::{
    CompileError, CompileErrorKind, Environment, EnvironmentSchema, ExpressionEngine,
    FunctionRegistry, Interpreter, Program, RuntimeError, compute_suggestions,
};
pub use messages::{
    Choice, CompileWarning, EvalError, ExprRole, Message, MessageCompileError, MessageSet,
    Outcome, UNMATCHED, Variable,
};
pub use types::{Kind, NativeFunction, Signature, Value};
pub use weather::{Forecast, HourlyForecast, WeatherData};

/// Creates an [`Environment`] from name/value pairs.
///
/// Values are converted via `Into<Value>`, so integers, floats, strings,
/// and timestamps can be passed directly.
///
/// # Example
///
/// ```
/// use skycast::{environment, Value};
///
/// let env = environment! { "temperature" => 15, "label" => "rain" };
/// assert_eq!(env.len(), 2);
/// assert_eq!(env.get("temperature"), Some(&Value::Int(15)));
/// ```
#[macro_export]
macro_rules! environment {
    {} => {
        $crate::Environment::new()
    };
    { $($key:expr => $value:expr),+ $(,)? } => {
        {
            let mut env = $crate::Environment::new();
            $(
                env.insert($key, ::std::convert::Into::<$crate::Value>::into($value));
            )+
            env
        }
    };
}
