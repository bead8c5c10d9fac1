//! Implementation of the `skycast check` command.

use std::path::PathBuf;

use owo_colors::OwoColorize;
use serde::Serialize;
use skycast::MessageSet;
use skycast::weather::data_schema;

use super::{load_config, to_json};
use crate::output::compile_report;

/// Arguments for the check command.
#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Config file (.toml)
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output for check results.
#[derive(Serialize)]
pub struct CheckResult {
    pub messages: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Run the check command.
///
/// Reports every compile error rather than stopping at the first, then the
/// compile warnings of a config that compiles.
pub fn run_check(args: CheckArgs, verbose: bool) -> miette::Result<i32> {
    let loaded = load_config(&args.config, verbose)?;
    let messages = &loaded.config.messages;
    let schema = data_schema();

    let errors = MessageSet::diagnose(messages, &schema);
    let warnings = if errors.is_empty() {
        match MessageSet::compile(messages, &schema) {
            Ok(set) => set.warnings().to_vec(),
            Err(error) => return Err(compile_report(&args.config, &error)),
        }
    } else {
        Vec::new()
    };

    if args.json {
        let output = CheckResult {
            messages: messages.len(),
            errors: errors.iter().map(ToString::to_string).collect(),
            warnings: warnings.iter().map(ToString::to_string).collect(),
        };
        println!("{}", to_json(&output)?);
    } else {
        for error in &errors {
            eprintln!("{:?}", compile_report(&args.config, error));
        }
        for warning in &warnings {
            eprintln!("{}: {warning}", "warning".yellow().bold());
        }
        if errors.is_empty() {
            println!(
                "{} {}: {} messages compiled",
                "✓".green(),
                args.config.display(),
                messages.len()
            );
        } else {
            println!(
                "{} {}: {} errors",
                "✗".red(),
                args.config.display(),
                errors.len()
            );
        }
    }

    if errors.is_empty() {
        Ok(exitcode::OK)
    } else {
        Ok(exitcode::DATAERR)
    }
}
