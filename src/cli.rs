//! CLI command implementations for Conquest.

pub(crate) mod inspect;
pub(crate) mod run;
pub(crate) mod tournament;

mod output;

use std::path::Path;

use clap::ValueEnum;
use conquest::{GameConfig, GameError};
use thiserror::Error;

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `tournament` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TournamentFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// CLI error type.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// Failure inside the engine.
    #[error(transparent)]
    Game(#[from] GameError),
    /// Failure writing output.
    #[error("output: {0}")]
    Io(#[from] std::io::Error),
    /// Failure encoding output.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load `path` if given, otherwise use the defaults.
fn load_config(path: Option<&Path>) -> Result<GameConfig, CliError> {
    Ok(match path {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    })
}

/// A seed from the clock, for runs without `--seed`.
fn clock_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(42, |d| d.as_secs() ^ u64::from(d.subsec_nanos()))
}
