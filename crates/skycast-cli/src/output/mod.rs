//! Terminal output: diagnostics and tables.

mod diagnostic;
mod table;

pub use diagnostic::{ExpressionDiagnostic, compile_report};
pub use table::{MessageRow, format_outcome_table};
