//! Configuration file loading.
//!
//! A config file is TOML with an optional `[logging]` section and a
//! `[[messages]]` array:
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "plain"
//!
//! [[messages]]
//! id = "umbrella"
//! condition = "rain3h > 0"
//! template = "'Bring an umbrella'"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages::Message;

/// Errors that occur while loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error when reading the config file.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML or a field of the wrong shape.
    #[error("{path}:{line}:{column}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
}

/// The parsed contents of a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Config {
    /// Read and parse the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse config text. `path` is only used in error messages.
    pub fn parse(content: &str, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|error| {
            let offset = error.span().map_or(0, |span| span.start);
            let (line, column) = position(content, offset);
            ConfigError::Parse {
                path: path.as_ref().to_path_buf(),
                line,
                column,
                message: error.message().to_string(),
            }
        })
    }
}

fn position(content: &str, offset: usize) -> (usize, usize) {
    let before = content.get(..offset).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().unwrap_or("").chars().count() + 1;
    (line, column)
}

/// Logging configuration. Every field has a default, so the whole
/// `[logging]` section may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global level filter, e.g. `"info"` or `"debug"`.
    pub level: String,
    /// Per-module level overrides, e.g. `{ "skycast::messages" = "debug" }`.
    pub modules: BTreeMap<String, String>,
    /// Optional log file. Relative paths resolve against the config file's
    /// directory.
    pub file: Option<PathBuf>,
    pub format: LogFormat,
}

impl LoggingConfig {
    /// The `EnvFilter` directive string: the global level followed by each
    /// module override.
    pub fn directives(&self) -> String {
        let mut directives = self.level.clone();
        for (module, level) in &self.modules {
            directives.push(',');
            directives.push_str(module);
            directives.push('=');
            directives.push_str(level);
        }
        directives
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            modules: BTreeMap::new(),
            file: None,
            format: LogFormat::Plain,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}
