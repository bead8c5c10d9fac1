//! skycast CLI entry point.
//!
//! - `skycast check` - compile a config and report every error
//! - `skycast render` - render the configured messages against a snapshot
//! - `skycast eval` - evaluate one expression against a snapshot

mod commands;
mod logging;
mod output;

use std::process::exit;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{CheckArgs, EvalArgs, RenderArgs, run_check, run_eval, run_render};

/// Weather-conditioned message tools.
#[derive(Debug, Parser)]
#[command(name = "skycast")]
#[command(about = "Render weather-conditioned messages", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Color output control
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto, global = true)]
    pub color: ColorWhen,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// When to use colored output.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorWhen {
    Auto,
    Always,
    Never,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compile every message of a config and report all errors
    Check(CheckArgs),
    /// Render the configured messages against a weather snapshot
    Render(RenderArgs),
    /// Evaluate an expression against a weather snapshot
    Eval(EvalArgs),
}

fn setup_colors(color_when: ColorWhen) {
    match color_when {
        // owo-colors checks the TTY, NO_COLOR and FORCE_COLOR itself
        ColorWhen::Auto => {}
        ColorWhen::Always => owo_colors::set_override(true),
        ColorWhen::Never => owo_colors::set_override(false),
    }
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    setup_colors(cli.color);

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))?;

    let result = match cli.command {
        Commands::Check(args) => run_check(args, cli.verbose),
        Commands::Render(args) => run_render(args, cli.verbose),
        Commands::Eval(args) => run_eval(args, cli.verbose),
    };

    match result {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("{e:?}");
            exit(exitcode::SOFTWARE);
        }
    }
}
