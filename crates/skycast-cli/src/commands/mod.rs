//! CLI command implementations.

mod check;
mod eval;
mod render;

use std::fs::read_to_string;
use std::path::Path;

use miette::IntoDiagnostic;
use serde::Serialize;
use skycast::{Config, WeatherData};
use tracing_appender::non_blocking::WorkerGuard;

use crate::logging::init_logging;

pub use check::{CheckArgs, run_check};
pub use eval::{EvalArgs, run_eval};
pub use render::{RenderArgs, run_render};

/// A loaded config with logging installed from its `[logging]` section.
struct Loaded {
    config: Config,
    _guard: Option<WorkerGuard>,
}

/// Load the config file and install logging from it.
fn load_config(path: &Path, verbose: bool) -> miette::Result<Loaded> {
    let config = Config::load(path).map_err(|e| miette::miette!("{e}"))?;
    let base_dir = path.parent().unwrap_or(Path::new("."));
    let guard = init_logging(&config.logging, base_dir, verbose)
        .map_err(|e| miette::miette!("cannot set up logging: {e}"))?;
    Ok(Loaded {
        config,
        _guard: guard,
    })
}

/// Read a weather snapshot from JSON, or use the placeholder snapshot.
fn load_weather(path: Option<&Path>) -> miette::Result<WeatherData> {
    let Some(path) = path else {
        return Ok(WeatherData::placeholder());
    };
    let content = read_to_string(path)
        .map_err(|e| miette::miette!("cannot read weather file {}: {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| miette::miette!("invalid weather file {}: {e}", path.display()))
}

/// Pretty JSON for `--json` output.
fn to_json<T: Serialize>(value: &T) -> miette::Result<String> {
    serde_json::to_string_pretty(value).into_diagnostic()
}
