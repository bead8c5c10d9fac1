//! Integration tests for the events logged while evaluating messages.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use skycast::{EnvironmentSchema, Kind, Message, MessageSet, environment};
use tracing::Level;
use tracing::subscriber::with_default;
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with error-level events written to the returned buffer.
fn capture_errors(f: impl FnOnce()) -> Vec<String> {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(Level::ERROR)
        .with_ansi(false)
        .finish();
    with_default(subscriber, f);
    buffer.lines()
}

fn compile(messages: &[Message]) -> MessageSet {
    let schema = EnvironmentSchema::new().with("temperature", Kind::Float);
    MessageSet::compile(messages, &schema).unwrap()
}

#[test]
fn failed_messages_log_one_error_each() {
    let messages = vec![
        Message::builder()
            .id("hot")
            .template("'hot'")
            .condition("temperature")
            .build(),
        Message::builder().template("sprintf('%d', 'a')").build(),
        Message::builder()
            .template("'umbrella'")
            .condition("temperature < 20")
            .build(),
    ];
    let set = compile(&messages);
    let env = environment! { "temperature" => 21.0 };

    let mut output = Vec::new();
    let lines = capture_errors(|| output = set.evaluate_all(&env));

    assert_eq!(output, vec!["", "", ""]);
    assert_eq!(lines.len(), 2, "{lines:#?}");
    assert!(lines.iter().all(|line| line.contains("ERROR")));
    assert!(lines[0].contains("index=0"));
    assert!(lines[0].contains("Message evaluation failed"));
    assert!(lines[1].contains("index=1"));
    assert!(lines[1].contains("sprintf('%d', 'a')"));
}

#[test]
fn skipped_messages_log_no_error() {
    let messages = vec![
        Message::builder()
            .template("'umbrella'")
            .condition("temperature < 20")
            .build(),
        Message::builder()
            .template("'shade'")
            .condition("temperature > 30")
            .build(),
    ];
    let set = compile(&messages);
    let env = environment! { "temperature" => 25.0 };

    let mut output = Vec::new();
    let lines = capture_errors(|| output = set.evaluate_all(&env));

    assert_eq!(output, vec!["", ""]);
    assert!(lines.is_empty(), "{lines:#?}");
}
