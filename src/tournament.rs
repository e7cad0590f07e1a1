//! Headless runner for all-AI games.
//!
//! Provides a pure function interface: `(seed, config) -> GameReport`
//!
//! The runner handles:
//! - Deterministic map generation
//! - Ticking AI autoplay until a winner or the turn limit
//! - Acknowledging elimination notices and completing minigames
//! - Parallel batches over many seeds with rayon

mod mapgen;

pub use mapgen::generate_layout;

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::effect::Resource;
use crate::game::{Game, PlayerId, PlayerKind};
use crate::GameResult;

/// Ticks allowed per turn before a run is declared stalled.
const MAX_TICKS_PER_TURN: u64 = 1_000;

/// Final result of a headless game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameReport {
    /// The winning player (None if the turn limit was hit first).
    pub winner: Option<PlayerId>,
    /// Total turns played.
    pub turns_played: u32,
    /// Elimination order (first eliminated is index 0).
    pub elimination_order: Vec<PlayerId>,
    /// Minigames played.
    pub minigames: u32,
    /// The seed used for this game.
    pub seed: u64,
}

/// Drives a [`Game`] with no human at the controls.
#[derive(Debug)]
pub struct Runner {
    game: Game,
    seed: u64,
    rng: StdRng,
    dt: Duration,
    max_turns: u32,
    minigames: u32,
    ticks: u64,
}

impl Runner {
    /// Set up a game for `seed` with every player forced to AI.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(seed: u64, config: &GameConfig) -> GameResult<Self> {
        let mut config = config.clone();
        for spec in &mut config.players {
            spec.kind = PlayerKind::Ai;
        }
        let dt = Duration::from_millis(config.ai_move_delay_ms);
        let max_turns = config.max_turns;
        let game = Game::new(config, seed)?;
        Ok(Self {
            game,
            seed,
            rng: StdRng::seed_from_u64(seed.rotate_left(32)),
            dt,
            max_turns,
            minigames: 0,
            ticks: 0,
        })
    }

    /// The game being driven.
    #[must_use]
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// Whether the run has finished, by victory or turn limit.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.game.is_over() || self.game.turn() >= self.max_turns || self.is_stalled()
    }

    fn is_stalled(&self) -> bool {
        self.ticks > u64::from(self.game.turn() + 1) * MAX_TICKS_PER_TURN
    }

    /// Advance by one cooperative step: answer any pending prompt, otherwise
    /// tick the scheduler by the AI move delay.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the game.
    pub fn step(&mut self) -> GameResult<()> {
        if self.game.diverted().is_some() {
            let reward = *[Resource::Attack, Resource::Defence]
                .choose(&mut self.rng)
                .unwrap_or(&Resource::Attack);
            self.minigames += 1;
            return self.game.complete_minigame(reward);
        }
        if self.game.acknowledge_notice() {
            return Ok(());
        }
        self.ticks += 1;
        self.game.tick(self.dt)
    }

    /// Step until the run finishes.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the game.
    pub fn run(mut self) -> GameResult<GameReport> {
        while !self.is_finished() {
            self.step()?;
        }
        if self.is_stalled() && !self.game.is_over() {
            warn!(seed = self.seed, turn = self.game.turn(), "run stalled");
        }
        Ok(self.into_report())
    }

    /// Stop here and summarise.
    #[must_use]
    pub fn into_report(self) -> GameReport {
        let report = GameReport {
            winner: self.game.winner(),
            turns_played: self.game.turn(),
            elimination_order: self.game.eliminations().processed().to_vec(),
            minigames: self.minigames,
            seed: self.seed,
        };
        debug!(?report, "game finished");
        report
    }
}

/// Run a complete all-AI game with the given seed.
///
/// This is the main entry point - a pure function from inputs to result.
/// Given the same seed and config, it always produces the same report.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the game raises one.
pub fn run_game(seed: u64, config: &GameConfig) -> GameResult<GameReport> {
    Runner::new(seed, config)?.run()
}

/// Win counts aggregated over many games.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TournamentSummary {
    /// Games completed.
    pub games_played: u64,
    /// Games that failed to run.
    pub failed: u64,
    /// Win count per player id.
    pub wins: Vec<u64>,
    /// Games that hit the turn limit.
    pub draws: u64,
    /// Total turns across all games.
    pub total_turns: u64,
}

impl TournamentSummary {
    /// Empty summary for `players` players.
    #[must_use]
    pub fn new(players: usize) -> Self {
        Self {
            wins: vec![0; players],
            ..Self::default()
        }
    }

    /// Fold one report in.
    pub fn add(&mut self, report: &GameReport) {
        self.games_played += 1;
        self.total_turns += u64::from(report.turns_played);
        match report.winner.and_then(|w| self.wins.get_mut(usize::from(w))) {
            Some(wins) => *wins += 1,
            None => self.draws += 1,
        }
    }

    /// Combine with another partial summary.
    pub fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.failed += other.failed;
        self.draws += other.draws;
        self.total_turns += other.total_turns;
        if self.wins.len() < other.wins.len() {
            self.wins.resize(other.wins.len(), 0);
        }
        for (mine, theirs) in self.wins.iter_mut().zip(&other.wins) {
            *mine += theirs;
        }
    }

    /// Win rate for a player (0.0-1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn win_rate(&self, player: PlayerId) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins.get(usize::from(player)).copied().unwrap_or(0) as f64 / self.games_played as f64
    }

    /// Average game length in turns.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_turns(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_turns as f64 / self.games_played as f64
    }
}

/// Run one game per seed in parallel and aggregate the results.
#[must_use]
pub fn run_tournament(seeds: &[u64], config: &GameConfig) -> TournamentSummary {
    run_tournament_with(seeds, config, |_| {})
}

/// Like [`run_tournament`], calling `on_game` after every finished game.
pub fn run_tournament_with(
    seeds: &[u64],
    config: &GameConfig,
    on_game: impl Fn(&GameReport) + Sync,
) -> TournamentSummary {
    let players = config.players.len();
    let summary = seeds
        .par_iter()
        .fold(
            || TournamentSummary::new(players),
            |mut local, &seed| {
                match run_game(seed, config) {
                    Ok(report) => {
                        on_game(&report);
                        local.add(&report);
                    }
                    Err(e) => {
                        warn!(seed, error = %e, "game failed");
                        local.failed += 1;
                    }
                }
                local
            },
        )
        .reduce(
            || TournamentSummary::new(players),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );
    info!(
        games = summary.games_played,
        failed = summary.failed,
        draws = summary.draws,
        "tournament finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config(players: usize) -> GameConfig {
        GameConfig {
            ai_move_delay_ms: 0,
            max_turns: 200,
            ..GameConfig::with_ai_players(players)
        }
    }

    #[test]
    fn test_run_game_determinism() {
        let config = quick_config(3);
        assert_eq!(
            run_game(5, &config).unwrap(),
            run_game(5, &config).unwrap()
        );
    }

    #[test]
    fn test_run_game_respects_turn_limit() {
        let config = GameConfig {
            max_turns: 4,
            ..quick_config(4)
        };
        let report = run_game(1, &config).unwrap();
        assert!(report.turns_played <= 4);
        assert_eq!(report.seed, 1);
    }

    #[test]
    fn test_run_game_rejects_bad_config() {
        let config = GameConfig {
            players: Vec::new(),
            ..GameConfig::default()
        };
        assert!(run_game(0, &config).is_err());
    }

    #[test]
    fn test_winner_outlives_everyone() {
        let config = quick_config(2);
        for seed in 0..5 {
            let report = run_game(seed, &config).unwrap();
            if let Some(winner) = report.winner {
                assert!(!report.elimination_order.contains(&winner));
                assert!(report.elimination_order.len() <= 1);
            }
        }
    }

    #[test]
    fn test_summary_merge() {
        let report = |winner| GameReport {
            winner,
            turns_played: 10,
            elimination_order: Vec::new(),
            minigames: 0,
            seed: 0,
        };
        let mut a = TournamentSummary::new(2);
        a.add(&report(Some(1)));
        let mut b = TournamentSummary::new(2);
        b.add(&report(None));
        b.add(&report(Some(1)));
        a.merge(&b);

        assert_eq!(a.games_played, 3);
        assert_eq!(a.wins, vec![0, 2]);
        assert_eq!(a.draws, 1);
        assert!((a.avg_turns() - 10.0).abs() < f64::EPSILON);
        assert!((a.win_rate(1) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_tournament_counts_every_seed() {
        let seeds: Vec<u64> = (0..6).collect();
        let summary = run_tournament(&seeds, &quick_config(2));
        assert_eq!(summary.games_played + summary.failed, 6);
        assert_eq!(summary.failed, 0);
        assert_eq!(
            summary.wins.iter().sum::<u64>() + summary.draws,
            summary.games_played
        );
    }
}
