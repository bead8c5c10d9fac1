//! Table formatting utilities for CLI output.

use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use skycast::Outcome;

/// One evaluated message, as shown by `render --table` and `render --json`.
pub struct MessageRow {
    /// Position of the message in the config.
    pub index: usize,
    pub id: Option<String>,
    pub outcome: Outcome,
}

impl MessageRow {
    pub fn status(&self) -> &'static str {
        match self.outcome {
            Outcome::Rendered(_) => "rendered",
            Outcome::Skipped => "skipped",
            Outcome::Failed(_) => "failed",
        }
    }
}

/// Format evaluated messages as a table of index, id, status, and text.
///
/// Failed rows show the error in place of their (empty) text.
pub fn format_outcome_table(rows: &[MessageRow]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_BORDERS_ONLY);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Id", "Status", "Text"]);

    for row in rows {
        let status = Cell::new(row.status()).fg(match row.outcome {
            Outcome::Rendered(_) => Color::Green,
            Outcome::Skipped => Color::DarkGrey,
            Outcome::Failed(_) => Color::Red,
        });
        let text = match &row.outcome {
            Outcome::Failed(error) => error.to_string(),
            Outcome::Rendered(_) | Outcome::Skipped => row.outcome.text().to_string(),
        };
        table.add_row(vec![
            Cell::new(row.index),
            Cell::new(row.id.as_deref().unwrap_or("-")),
            status,
            Cell::new(text),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use skycast::EvalError;

    use super::*;

    #[test]
    fn rows_show_status_and_error_text() {
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
                id: None,
                outcome: Outcome::Failed(EvalError::ConditionType {
                    expression: "cloudiness".to_string(),
                    found: "int".to_string(),
                }),
            },
        ];
        let mut table = format_outcome_table(&rows);
        table.set_width(160);
        let rendered = table.to_string();
        assert!(rendered.contains("umbrella"));
        assert!(rendered.contains("Bring an umbrella"));
        assert!(rendered.contains("skipped"));
        assert!(rendered.contains("returned int, expected bool"));
        assert_eq!(rows[2].status(), "failed");
    }
}
