//! The pluggable expression engine seam.

use std::sync::LazyLock;

use crate::interpreter::checker::compile_expression;
use crate::interpreter::{
    CompileError, Environment, EnvironmentSchema, FunctionRegistry, Program, RuntimeError,
};
use crate::types::{Kind, Value};

/// Compiles expressions against a schema and runs the resulting programs.
///
/// The message evaluator is generic over this trait. Implementations must
/// be free of side effects: compiling never mutates the schema or earlier
/// programs, and running a program never mutates the environment.
pub trait ExpressionEngine: Send + Sync {
    /// The compiled form of one expression.
    type Program: Send + Sync;

    /// Compile `source` against `schema`.
    fn compile(&self, source: &str, schema: &EnvironmentSchema)
    -> Result<Self::Program, CompileError>;

    /// Run a compiled program against concrete values.
    fn run(&self, program: &Self::Program, environment: &Environment)
    -> Result<Value, RuntimeError>;

    /// The static result kind of a program, if the engine knows it.
    fn result_kind(&self, _program: &Self::Program) -> Kind {
        Kind::Any
    }
}

/// The built-in tree-walking expression engine.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    functions: FunctionRegistry,
}

impl Interpreter {
    /// Create an interpreter with the standard built-in functions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an interpreter with a custom function registry.
    pub fn with_functions(functions: FunctionRegistry) -> Self {
        Self { functions }
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Mutable access to the registry, for registering extra built-ins.
    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }
}

impl ExpressionEngine for Interpreter {
    type Program = Program;

    fn compile(&self, source: &str, schema: &EnvironmentSchema) -> Result<Program, CompileError> {
        compile_expression(source, schema, &self.functions)
    }

    fn run(&self, program: &Program, environment: &Environment) -> Result<Value, RuntimeError> {
        program.run(environment)
    }

    fn result_kind(&self, program: &Program) -> Kind {
        program.kind().clone()
    }
}

static BUILTINS: LazyLock<FunctionRegistry> = LazyLock::new(FunctionRegistry::builtins);

/// Compile `source` against `schema` with the standard built-ins.
pub fn compile(source: &str, schema: &EnvironmentSchema) -> Result<Program, CompileError> {
    compile_expression(source, schema, &BUILTINS)
}
