//! Compiled programs and the tree-walking evaluator that runs them.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};

use crate::interpreter::{Environment, EnvironmentSchema, RuntimeError};
use crate::parser::BinaryOp;
use crate::types::{Kind, Value};

/// A checked expression, lowered for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Const(Value),
    Var(String),
    Field {
        object: Box<Node>,
        field: String,
    },
    TimeField {
        object: Box<Node>,
        component: TimeComponent,
    },
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    Not(Box<Node>),
    Neg(Box<Node>),
    /// Widens an int operand to float.
    ToFloat(Box<Node>),
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Conditional {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Box<Node>,
    },
}

/// Integer members exposed by timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimeComponent {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    /// Days since Sunday.
    Weekday,
}

impl TimeComponent {
    pub(crate) const NAMES: [&'static str; 7] =
        ["year", "month", "day", "hour", "minute", "second", "weekday"];

    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "year" => Some(Self::Year),
            "month" => Some(Self::Month),
            "day" => Some(Self::Day),
            "hour" => Some(Self::Hour),
            "minute" => Some(Self::Minute),
            "second" => Some(Self::Second),
            "weekday" => Some(Self::Weekday),
            _ => None,
        }
    }
}

/// An immutable, repeatedly runnable compiled expression.
///
/// A program is produced once per expression and schema, and may then be run
/// any number of times, from any number of threads, against environments that
/// supply its free variables.
///
/// # Example
///
/// ```
/// use skycast::interpreter::compile;
/// use skycast::{Environment, EnvironmentSchema, Kind, Value};
///
/// let schema = EnvironmentSchema::new().with("temperature", Kind::Float);
/// let program = compile("temperature < 20", &schema).unwrap();
/// assert_eq!(program.kind(), &Kind::Bool);
///
/// let env = Environment::new().with("temperature", 15.0);
/// assert_eq!(program.run(&env).unwrap(), Value::Bool(true));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    source: String,
    root: Node,
    kind: Kind,
    bindings: EnvironmentSchema,
}

impl Program {
    pub(crate) fn new(
        source: &str,
        root: Node,
        kind: Kind,
        bindings: BTreeMap<String, Kind>,
    ) -> Self {
        Self {
            source: source.to_string(),
            root,
            kind,
            bindings: bindings.into_iter().collect(),
        }
    }

    /// The expression this program was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The static kind of the program's result.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// The schema entries the program references, in name order.
    pub fn free_variables(&self) -> &EnvironmentSchema {
        &self.bindings
    }

    /// Run the program against `environment`.
    ///
    /// Every free variable must be present with a kind its schema entry
    /// accepts, otherwise the run fails before evaluating anything.
    pub fn run(&self, environment: &Environment) -> Result<Value, RuntimeError> {
        self.bindings.validate(environment)?;
        eval(&self.root, environment)
    }
}

fn eval(node: &Node, env: &Environment) -> Result<Value, RuntimeError> {
    match node {
        Node::Const(value) => Ok(value.clone()),
        Node::Var(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::MissingBinding { name: name.clone() }),
        Node::Field { object, field } => {
            let object = eval(object, env)?;
            match &object {
                Value::Record(fields) => fields
                    .get(field)
                    .cloned()
                    .ok_or_else(|| RuntimeError::MissingField {
                        field: field.clone(),
                    }),
                other => Err(mismatch(format!(".{field}"), other)),
            }
        }
        Node::TimeField { object, component } => {
            let object = eval(object, env)?;
            let time = object
                .as_timestamp()
                .ok_or_else(|| mismatch("timestamp member", &object))?;
            let n = match component {
                TimeComponent::Year => i64::from(time.year()),
                TimeComponent::Month => i64::from(time.month()),
                TimeComponent::Day => i64::from(time.day()),
                TimeComponent::Hour => i64::from(time.hour()),
                TimeComponent::Minute => i64::from(time.minute()),
                TimeComponent::Second => i64::from(time.second()),
                TimeComponent::Weekday => i64::from(time.weekday().num_days_from_sunday()),
            };
            Ok(Value::Int(n))
        }
        Node::Call { callee, args } => {
            let callee = eval(callee, env)?;
            let Value::Function(function) = &callee else {
                return Err(mismatch("call", &callee));
            };
            let args = args
                .iter()
                .map(|arg| eval(arg, env))
                .collect::<Result<Vec<_>, _>>()?;
            function.call(&args)
        }
        Node::Not(operand) => match eval(operand, env)? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(mismatch("!", &other)),
        },
        Node::Neg(operand) => match eval(operand, env)? {
            Value::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or(RuntimeError::Overflow { op: BinaryOp::Sub }),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(mismatch("-", &other)),
        },
        Node::ToFloat(operand) => match eval(operand, env)? {
            Value::Int(n) => Ok(Value::Float(n as f64)),
            other => Ok(other),
        },
        Node::Binary { op, left, right } => eval_binary(*op, left, right, env),
        Node::Conditional {
            condition,
            then_branch,
            else_branch,
        } => match eval(condition, env)? {
            Value::Bool(true) => eval(then_branch, env),
            Value::Bool(false) => eval(else_branch, env),
            other => Err(mismatch("?:", &other)),
        },
    }
}

fn eval_binary(
    op: BinaryOp,
    left: &Node,
    right: &Node,
    env: &Environment,
) -> Result<Value, RuntimeError> {
    // Logical operators evaluate the right operand only when needed.
    if matches!(op, BinaryOp::And | BinaryOp::Or) {
        let value = eval(left, env)?;
        let Value::Bool(lhs) = value else {
            return Err(mismatch(op.to_string(), &value));
        };
        if lhs == (op == BinaryOp::Or) {
            return Ok(Value::Bool(lhs));
        }
        return match eval(right, env)? {
            Value::Bool(rhs) => Ok(Value::Bool(rhs)),
            other => Err(mismatch(op.to_string(), &other)),
        };
    }

    let lhs = eval(left, env)?;
    let rhs = eval(right, env)?;
    match op {
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&lhs, &rhs))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(&lhs, &rhs).ok_or_else(|| mismatch_pair(op, &lhs, &rhs))?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::Add => match (&lhs, &rhs) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            _ => arithmetic(op, &lhs, &rhs, i64::checked_add, |a, b| a + b),
        },
        BinaryOp::Sub => arithmetic(op, &lhs, &rhs, i64::checked_sub, |a, b| a - b),
        BinaryOp::Mul => arithmetic(op, &lhs, &rhs, i64::checked_mul, |a, b| a * b),
        BinaryOp::Div => {
            let (Some(a), Some(b)) = (lhs.as_float(), rhs.as_float()) else {
                return Err(mismatch_pair(op, &lhs, &rhs));
            };
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Value::Float(a / b))
        }
        BinaryOp::Mod => match (&lhs, &rhs) {
            (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => a
                .checked_rem(*b)
                .map(Value::Int)
                .ok_or(RuntimeError::Overflow { op }),
            _ => Err(mismatch_pair(op, &lhs, &rhs)),
        },
        BinaryOp::And | BinaryOp::Or => match (&lhs, &rhs) {
            (Value::Bool(a), Value::Bool(b)) if op == BinaryOp::And => Ok(Value::Bool(*a && *b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a || *b)),
            _ => Err(mismatch_pair(op, &lhs, &rhs)),
        },
    }
}

fn arithmetic(
    op: BinaryOp,
    lhs: &Value,
    rhs: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        return int_op(*a, *b)
            .map(Value::Int)
            .ok_or(RuntimeError::Overflow { op });
    }
    match (lhs.as_float(), rhs.as_float()) {
        (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
        _ => Err(mismatch_pair(op, lhs, rhs)),
    }
}

/// Equality with integers and floats compared numerically.
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
        _ => lhs == rhs,
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        _ => lhs.as_float()?.partial_cmp(&rhs.as_float()?),
    }
}

fn mismatch(op: impl Into<String>, found: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        op: op.into(),
        found: found.kind_name().to_string(),
    }
}

fn mismatch_pair(op: BinaryOp, lhs: &Value, rhs: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        op: op.to_string(),
        found: format!("{} and {}", lhs.kind_name(), rhs.kind_name()),
    }
}
