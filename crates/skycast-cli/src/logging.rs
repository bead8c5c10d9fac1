//! Tracing subscriber setup from the `[logging]` config section.

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use skycast::{LogFormat, LoggingConfig};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

type Filtered = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Filtered> + Send + Sync>;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{directives}': {message}")]
    Filter { directives: String, message: String },

    #[error("cannot create log directory '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("log file path '{path}' has no file name")]
    FileName { path: PathBuf },

    #[error("cannot install tracing subscriber: {0}")]
    Init(String),
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides every config-driven directive. `verbose` raises the
/// global level to `debug`. Relative log file paths resolve against
/// `base_dir`. The returned guard flushes the file writer on drop and must
/// be held until the process exits.
pub fn init_logging(
    config: &LoggingConfig,
    base_dir: &Path,
    verbose: bool,
) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let mut config = config.clone();
        if verbose {
            config.level = "debug".to_string();
        }
        let directives = config.directives();
        EnvFilter::try_new(&directives).map_err(|e| LoggingError::Filter {
            directives,
            message: e.to_string(),
        })?
    };

    let json = config.format == LogFormat::Json;
    let mut layers: Vec<BoxedLayer> = vec![if json {
        fmt::layer()
            .json()
            .with_target(false)
            .with_writer(io::stderr)
            .boxed()
    } else {
        fmt::layer().with_target(false).with_writer(io::stderr).boxed()
    }];

    let mut guard = None;
    if let Some(file) = &config.file {
        let resolved = if file.is_relative() {
            base_dir.join(file)
        } else {
            file.clone()
        };
        let file_name = resolved
            .file_name()
            .ok_or_else(|| LoggingError::FileName {
                path: resolved.clone(),
            })?
            .to_os_string();
        let dir = resolved.parent().unwrap_or(Path::new(""));
        fs::create_dir_all(dir).map_err(|source| LoggingError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let (writer, file_guard) = tracing_appender::non_blocking(rolling::never(dir, file_name));
        guard = Some(file_guard);
        layers.push(if json {
            fmt::layer().json().with_ansi(false).with_writer(writer).boxed()
        } else {
            fmt::layer().with_ansi(false).with_writer(writer).boxed()
        });
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;
    Ok(guard)
}
