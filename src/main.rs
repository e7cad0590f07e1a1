//! Conquest CLI - run headless games and inspect saved snapshots.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use conquest::logging::{self, LogFormat};

/// Conquest - a turn-based territory game engine
#[derive(Parser, Debug)]
#[command(name = "conquest")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single all-AI game
    Run {
        /// Random seed (default: from the clock)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Game configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save the final snapshot to file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Suppress the banner
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run many games in parallel and aggregate win counts
    Tournament {
        /// Number of games to run (default: 100)
        #[arg(short, long, default_value = "100")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Game configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Maximum turns per game
        #[arg(short = 't', long)]
        max_turns: Option<u32>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Print per-player stats from a saved snapshot
    Inspect {
        /// Snapshot file (JSON)
        #[arg(required = true)]
        file: PathBuf,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose, args.log_format);

    let result = match args.command {
        Commands::Run {
            seed,
            config,
            format,
            save,
            quiet,
        } => cli::run::execute(seed, config, format, save, quiet),

        Commands::Tournament {
            games,
            seed,
            threads,
            config,
            max_turns,
            format,
            progress,
        } => cli::tournament::execute(cli::tournament::TournamentArgs {
            games,
            seed,
            threads,
            config,
            max_turns,
            format,
            progress,
        }),

        Commands::Inspect { file, format } => cli::inspect::execute(file, format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
