use std::sync::{Arc, Mutex, PoisonError};

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use rayon::prelude::*;
use tracing::{debug, error, warn};

use crate::interpreter::{Environment, EnvironmentSchema, ExpressionEngine, Interpreter};
use crate::messages::compiled::{
    CompileWarning, CompiledMessage, MessageCompileError, compile_message,
};
use crate::messages::definition::Message;
use crate::messages::evaluate::{Outcome, evaluate_message};

/// An ordered set of compiled messages, ready to evaluate repeatedly.
///
/// Compilation happens once, up front, against a shape-only data schema.
/// Each evaluation pass then takes a fresh data environment and produces
/// exactly one output per configured message, in configured order.
///
/// # Example
///
/// ```
/// use skycast::{environment, Choice, EnvironmentSchema, Kind, Message, MessageSet, Variable};
///
/// let schema = EnvironmentSchema::new().with("temperature", Kind::Float);
/// let messages = vec![Message::builder()
///     .template("'Test is ' + test")
///     .variables(vec![Variable::new(
///         "test",
///         vec![
///             Choice::new("temperature < 20 && temperature > 10", "test"),
///             Choice::new("temperature <= 10", "foo"),
///         ],
///     )])
///     .build()];
///
/// let set = MessageSet::compile(&messages, &schema).unwrap();
/// let output = set.evaluate_all(&environment! { "temperature" => 15 });
/// assert_eq!(output, vec!["Test is test"]);
/// ```
pub struct MessageSet<E: ExpressionEngine = Interpreter> {
    engine: E,
    messages: Vec<CompiledMessage<E::Program>>,
    warnings: Vec<CompileWarning>,
    /// Worker pool reused across parallel passes with the same thread count.
    pool: Mutex<Option<Arc<ThreadPool>>>,
}

impl MessageSet<Interpreter> {
    /// Compile `messages` with the built-in interpreter, failing on the
    /// first error.
    pub fn compile(
        messages: &[Message],
        schema: &EnvironmentSchema,
    ) -> Result<Self, MessageCompileError> {
        Self::compile_with(Interpreter::new(), messages, schema)
    }

    /// Compile every expression of `messages` with the built-in interpreter
    /// and return all errors, in message order.
    pub fn diagnose(messages: &[Message], schema: &EnvironmentSchema) -> Vec<MessageCompileError> {
        Self::diagnose_with(&Interpreter::new(), messages, schema)
    }
}

impl<E: ExpressionEngine> MessageSet<E> {
    /// Compile `messages` with `engine`, failing on the first error.
    ///
    /// Messages are compiled in order. Warnings are logged and kept for
    /// [`MessageSet::warnings`].
    pub fn compile_with(
        engine: E,
        messages: &[Message],
        schema: &EnvironmentSchema,
    ) -> Result<Self, MessageCompileError> {
        let mut compiled = Vec::with_capacity(messages.len());
        let mut warnings = Vec::new();
        for (index, message) in messages.iter().enumerate() {
            let result = compile_message(&engine, index, message, schema, &mut warnings);
            match result {
                Ok(message) => compiled.push(message),
                Err(errors) => {
                    if let Some(first) = errors.into_iter().next() {
                        return Err(first);
                    }
                }
            }
        }
        for warning in &warnings {
            warn!(%warning, "Message compiled with warning");
        }
        debug!(count = compiled.len(), "Compiled messages");
        Ok(Self {
            engine,
            messages: compiled,
            warnings,
            pool: Mutex::new(None),
        })
    }

    /// Compile every expression of `messages` and return all errors.
    pub fn diagnose_with(
        engine: &E,
        messages: &[Message],
        schema: &EnvironmentSchema,
    ) -> Vec<MessageCompileError> {
        let mut warnings = Vec::new();
        messages
            .iter()
            .enumerate()
            .filter_map(|(index, message)| {
                compile_message(engine, index, message, schema, &mut warnings).err()
            })
            .flatten()
            .collect()
    }

    /// Warnings recorded while compiling.
    pub fn warnings(&self) -> &[CompileWarning] {
        &self.warnings
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Evaluate the message at `index`, or `None` if there is no such
    /// message.
    pub fn evaluate_one(&self, index: usize, data: &Environment) -> Option<Outcome> {
        self.messages
            .get(index)
            .map(|message| self.evaluate(message, data))
    }

    /// Evaluate every message, returning one outcome per message in order.
    pub fn outcomes(&self, data: &Environment) -> Vec<Outcome> {
        self.messages
            .iter()
            .map(|message| self.evaluate(message, data))
            .collect()
    }

    /// Evaluate every message, returning one string per message in order.
    ///
    /// Skipped and failed messages contribute the empty string. Failures
    /// are logged at error level.
    pub fn evaluate_all(&self, data: &Environment) -> Vec<String> {
        self.outcomes(data)
            .into_iter()
            .map(Outcome::into_text)
            .collect()
    }

    /// Like [`MessageSet::evaluate_all`], spreading messages over a pool of
    /// up to `workers` threads. The output is identical: results are
    /// collected by index, not by completion order.
    ///
    /// The pool is started on first use and kept for later passes that ask
    /// for the same number of threads.
    pub fn evaluate_all_parallel(&self, data: &Environment, workers: usize) -> Vec<String> {
        let threads = workers.clamp(1, self.messages.len().max(1));
        match self.pool(threads) {
            Ok(pool) => self.evaluate_all_in(&pool, data),
            Err(error) => {
                warn!(%error, "Cannot start worker pool, evaluating sequentially");
                self.evaluate_all(data)
            }
        }
    }

    /// Like [`MessageSet::evaluate_all`], running on a caller-owned pool.
    pub fn evaluate_all_in(&self, pool: &ThreadPool, data: &Environment) -> Vec<String> {
        let mut slots = Vec::with_capacity(self.messages.len());
        pool.install(|| {
            self.messages
                .par_iter()
                .map(|message| self.evaluate(message, data).into_text())
                .collect_into_vec(&mut slots);
        });
        slots
    }

    fn pool(&self, threads: usize) -> Result<Arc<ThreadPool>, ThreadPoolBuildError> {
        let mut cached = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pool) = cached
            .as_ref()
            .filter(|pool| pool.current_num_threads() == threads)
        {
            return Ok(Arc::clone(pool));
        }
        let pool = Arc::new(ThreadPoolBuilder::new().num_threads(threads).build()?);
        *cached = Some(Arc::clone(&pool));
        debug!(threads, "Started worker pool");
        Ok(pool)
    }

    fn evaluate(&self, message: &CompiledMessage<E::Program>, data: &Environment) -> Outcome {
        let outcome = evaluate_message(&self.engine, message, data);
        if let Outcome::Failed(failure) = &outcome {
            error!(
                index = message.index,
                id = message.id.as_deref(),
                label = %message.label(),
                expression = failure.expression(),
                error = %failure,
                "Message evaluation failed"
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(count: usize) -> MessageSet {
        let messages: Vec<Message> = (0..count)
            .map(|i| Message::builder().template(format!("'m{i}'")).build())
            .collect();
        MessageSet::compile(&messages, &EnvironmentSchema::new()).unwrap()
    }

    #[test]
    fn worker_pool_is_reused_for_the_same_thread_count() {
        let set = set_of(8);
        let first = set.pool(2).unwrap();
        let second = set.pool(2).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.current_num_threads(), 2);

        let wider = set.pool(4).unwrap();
        assert!(!Arc::ptr_eq(&first, &wider));
        assert!(Arc::ptr_eq(&wider, &set.pool(4).unwrap()));
    }

    #[test]
    fn repeated_parallel_passes_keep_one_pool() {
        let set = set_of(5);
        let env = Environment::new();
        let expected = set.evaluate_all(&env);
        assert_eq!(set.evaluate_all_parallel(&env, 3), expected);
        let pool = set.pool(3).unwrap();
        assert_eq!(set.evaluate_all_parallel(&env, 3), expected);
        assert!(Arc::ptr_eq(&pool, &set.pool(3).unwrap()));
    }

    #[test]
    fn caller_pool_renders_in_order() {
        let set = set_of(6);
        let pool = ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        assert_eq!(
            set.evaluate_all_in(&pool, &Environment::new()),
            vec!["m0", "m1", "m2", "m3", "m4", "m5"]
        );
    }
}
