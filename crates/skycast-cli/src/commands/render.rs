//! Implementation of the `skycast render` command.

use std::path::PathBuf;

use serde::Serialize;
use skycast::weather::data_schema;
use skycast::{MessageSet, Outcome};
use tracing::debug;

use super::{load_config, load_weather, to_json};
use crate::output::{MessageRow, compile_report, format_outcome_table};

/// Arguments for the render command.
#[derive(Debug, clap::Args)]
pub struct RenderArgs {
    /// Config file (.toml)
    pub config: PathBuf,

    /// Weather snapshot (.json); a placeholder snapshot is used when absent
    #[arg(long, short)]
    pub weather: Option<PathBuf>,

    /// Show each message's status in a table
    #[arg(long, conflicts_with = "json")]
    pub table: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Evaluate messages on this many threads
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,
}

/// JSON output for one rendered message.
#[derive(Serialize)]
pub struct RenderedJson {
    pub index: usize,
    pub id: Option<String>,
    pub status: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run the render command.
pub fn run_render(args: RenderArgs, verbose: bool) -> miette::Result<i32> {
    let loaded = load_config(&args.config, verbose)?;
    let messages = &loaded.config.messages;
    let data = load_weather(args.weather.as_deref())?;

    let set = match MessageSet::compile(messages, &data_schema()) {
        Ok(set) => set,
        Err(error) => {
            eprintln!("{:?}", compile_report(&args.config, &error));
            return Ok(exitcode::DATAERR);
        }
    };
    debug!(
        messages = set.len(),
        warnings = set.warnings().len(),
        workers = args.workers,
        "compiled config"
    );
    let env = data.environment();

    if !args.table && !args.json {
        for line in set.evaluate_all_parallel(&env, usize::from(args.workers)) {
            println!("{line}");
        }
        return Ok(exitcode::OK);
    }

    let rows: Vec<MessageRow> = set
        .outcomes(&env)
        .into_iter()
        .zip(messages)
        .enumerate()
        .map(|(index, (outcome, message))| MessageRow {
            index,
            id: message.id.clone(),
            outcome,
        })
        .collect();

    if args.json {
        let output = rendered_json(rows);
        println!("{}", to_json(&output)?);
    } else {
        println!("{}", format_outcome_table(&rows));
    }
    Ok(exitcode::OK)
}

/// Map evaluated rows to their JSON form, keeping the error text of failed
/// messages.
fn rendered_json(rows: Vec<MessageRow>) -> Vec<RenderedJson> {
    rows.into_iter()
        .map(|row| {
            let status = row.status();
            let error = match &row.outcome {
                Outcome::Failed(error) => Some(error.to_string()),
                Outcome::Rendered(_) | Outcome::Skipped => None,
            };
            RenderedJson {
                index: row.index,
                id: row.id,
                status,
                text: row.outcome.into_text(),
                error,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use skycast::EvalError;

    use super::*;

    #[test]
    fn json_rows_carry_status_and_error() {
        let rows = vec![
            MessageRow {
                index: 0,
                id: Some("umbrella".to_string()),
                outcome: Outcome::Rendered("Bring an umbrella".to_string()),
            },
            MessageRow {
                index: 1,
                id: None,
                outcome: Outcome::Skipped,
            },
            MessageRow {
                index: 2,
                id: Some("layer".to_string()),
                outcome: Outcome::Failed(EvalError::RenderType {
                    expression: "1 + 2".to_string(),
                    found: "int".to_string(),
                }),
            },
        ];
        let output = rendered_json(rows);

        assert_eq!(output[0].id.as_deref(), Some("umbrella"));
        assert_eq!(output[0].status, "rendered");
        assert_eq!(output[0].text, "Bring an umbrella");
        assert!(output[0].error.is_none());

        assert_eq!(output[1].status, "skipped");
        assert_eq!(output[1].text, "");

        assert_eq!(output[2].index, 2);
        assert_eq!(output[2].status, "failed");
        assert_eq!(output[2].text, "");
        assert_eq!(
            output[2].error.as_deref(),
            Some("template `1 + 2` returned int, expected string")
        );

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json[1]["id"], serde_json::Value::Null);
        assert!(json[1].get("error").is_none());
        assert_eq!(json[2]["error"], "template `1 + 2` returned int, expected string");
    }
}
