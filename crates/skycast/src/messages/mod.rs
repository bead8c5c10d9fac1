//! Configured messages: compiling them once, then rendering them against
//! each fresh data environment.
//!
//! Evaluating a message runs four stages:
//!
//! 1. The condition, against the data environment. A false condition with
//!    no negative template skips the message.
//! 2. Each variable, by taking the value of the first choice whose guard is
//!    true. A variable with no choices binds `""`, and one whose guards all
//!    fail binds [`UNMATCHED`].
//! 3. Template selection: the negative template when the condition was
//!    false, otherwise the template.
//! 4. Rendering the selected template against the variable bindings.

mod compiled;
mod definition;
mod evaluate;
mod set;

pub use compiled::{CompileWarning, ExprRole, MessageCompileError};
pub use definition::{Choice, Message, Variable};
pub use evaluate::{EvalError, Outcome, UNMATCHED};
pub use set::MessageSet;
