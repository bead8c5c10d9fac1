//! Implementation of the `skycast eval` command.

use std::path::{Path, PathBuf};

use serde::Serialize;
use skycast::LoggingConfig;
use skycast::interpreter::compile;
use skycast::weather::data_schema;

use super::{load_weather, to_json};
use crate::logging::init_logging;
use crate::output::ExpressionDiagnostic;

/// Arguments for the eval command.
#[derive(Debug, clap::Args)]
pub struct EvalArgs {
    /// Expression to evaluate against the weather data
    pub expression: String,

    /// Weather snapshot (.json); a placeholder snapshot is used when absent
    #[arg(long, short)]
    pub weather: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output for eval results.
#[derive(Serialize)]
pub struct EvalResult {
    pub value: String,
    pub kind: String,
}

/// Run the eval command.
pub fn run_eval(args: EvalArgs, verbose: bool) -> miette::Result<i32> {
    let _guard = init_logging(&LoggingConfig::default(), Path::new("."), verbose)
        .map_err(|e| miette::miette!("cannot set up logging: {e}"))?;
    let data = load_weather(args.weather.as_deref())?;

    let program = match compile(&args.expression, &data_schema()) {
        Ok(program) => program,
        Err(error) => {
            let diagnostic = ExpressionDiagnostic::new(
                "cannot compile expression".to_string(),
                "<expression>".to_string(),
                &error,
            );
            eprintln!("{:?}", miette::Report::new(diagnostic));
            return Ok(exitcode::DATAERR);
        }
    };

    match program.run(&data.environment()) {
        Ok(value) => {
            if args.json {
                let output = EvalResult {
                    value: value.to_string(),
                    kind: value.kind().to_string(),
                };
                println!("{}", to_json(&output)?);
            } else {
                println!("{value}");
            }
            Ok(exitcode::OK)
        }
        Err(e) => {
            if args.json {
                let output = serde_json::json!({ "error": e.to_string() });
                eprintln!("{}", to_json(&output)?);
            } else {
                eprintln!("Evaluation error: {e}");
            }
            Ok(exitcode::DATAERR)
        }
    }
}
