//! Run command implementation.

use std::io::{self, Write};
use std::path::PathBuf;

use conquest::tournament::Runner;
use tracing::info;

use super::output::format_report;
use super::{CliError, OutputFormat, clock_seed, load_config};

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the game fails to run or output cannot be written.
pub(crate) fn execute(
    seed: Option<u64>,
    config: Option<PathBuf>,
    format: OutputFormat,
    save: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let seed = seed.unwrap_or_else(clock_seed);
    let mut out = io::stdout().lock();

    if !quiet && format == OutputFormat::Text {
        writeln!(out, "Running game with seed {seed}...")?;
        writeln!(out, "Players: {}", config.players.len())?;
        writeln!(out)?;
    }

    let mut runner = Runner::new(seed, &config)?;
    while !runner.is_finished() {
        runner.step()?;
    }

    if let Some(path) = save {
        runner.game().snapshot().save(&path)?;
        info!(path = %path.display(), "final snapshot saved");
        if !quiet && format == OutputFormat::Text {
            writeln!(out, "Snapshot saved to: {}", path.display())?;
            writeln!(out)?;
        }
    }

    let report = runner.into_report();
    match format {
        OutputFormat::Text => write!(out, "{}", format_report(&report))?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?,
    }
    Ok(())
}
