//! Tournament command implementation.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use conquest::tournament::run_tournament_with;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use super::output::{JsonTournamentResult, format_tournament_csv, format_tournament_text};
use super::{CliError, TournamentFormat, clock_seed, load_config};

/// Options for the tournament command.
#[derive(Debug)]
pub(crate) struct TournamentArgs {
    /// Number of games.
    pub(crate) games: u64,
    /// First seed; game `i` uses `seed + i`.
    pub(crate) seed: Option<u64>,
    /// Worker threads.
    pub(crate) threads: Option<usize>,
    /// Config file.
    pub(crate) config: Option<PathBuf>,
    /// Turn limit override.
    pub(crate) max_turns: Option<u32>,
    /// Output format.
    pub(crate) format: TournamentFormat,
    /// Show a progress bar.
    pub(crate) progress: bool,
}

/// Execute the tournament command.
///
/// # Errors
///
/// Returns an error if the config is invalid or output cannot be written.
pub(crate) fn execute(args: TournamentArgs) -> Result<(), CliError> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(turns) = args.max_turns {
        config.max_turns = turns;
    }
    // Headless games do not need to wait between moves
    config.ai_move_delay_ms = 0;
    config.validate().map_err(conquest::GameError::from)?;

    if let Some(num_threads) = args.threads
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
    {
        warn!(error = %e, "thread pool already initialized");
    }

    let base_seed = args.seed.unwrap_or_else(clock_seed);
    let seeds: Vec<u64> = (0..args.games).map(|i| base_seed.wrapping_add(i)).collect();

    let pb = if args.progress {
        let pb = ProgressBar::new(args.games);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})",
        ) {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let start = Instant::now();
    let summary = run_tournament_with(&seeds, &config, |_| pb.inc(1));
    pb.finish_with_message("done");
    let duration = start.elapsed();

    let mut out = io::stdout().lock();
    match args.format {
        TournamentFormat::Text => {
            writeln!(out)?;
            write!(out, "{}", format_tournament_text(&summary))?;
            writeln!(out)?;
            writeln!(out, "Duration: {:.2}s", duration.as_secs_f64())?;
        }
        TournamentFormat::Json => {
            let json = JsonTournamentResult::from_summary(&summary);
            writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
        }
        TournamentFormat::Csv => write!(out, "{}", format_tournament_csv(&summary))?,
    }
    Ok(())
}
