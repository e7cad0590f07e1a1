//! Output formatting utilities for CLI.

use std::fmt::Write;

use conquest::PlayerId;
use conquest::tournament::{GameReport, TournamentSummary};
use serde::Serialize;

/// Per-player line of `inspect` output.
#[derive(Debug, Serialize)]
pub(super) struct PlayerReport {
    /// Player id.
    pub(super) id: PlayerId,
    /// Human or AI.
    pub(super) kind: &'static str,
    /// Display colour.
    pub(super) color: String,
    /// Sectors owned.
    pub(super) sectors: usize,
    /// Units on the map.
    pub(super) units: usize,
    /// Derived attack.
    pub(super) attack: i32,
    /// Derived defence.
    pub(super) defence: i32,
    /// Actions per turn.
    pub(super) actions: i32,
    /// Actions left this turn.
    pub(super) actions_remaining: u32,
    /// Move range.
    pub(super) move_range: i32,
    /// Unit level cap.
    pub(super) level_cap: i32,
}

/// Format a game report as human-readable text.
pub(super) fn format_report(report: &GameReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Game Result (seed: {})", report.seed);
    match report.winner {
        Some(winner) => {
            let _ = writeln!(output, "  Winner: Player {winner}");
        }
        None => output.push_str("  Winner: none (turn limit)\n"),
    }
    let _ = writeln!(output, "  Turns: {}", report.turns_played);
    let _ = writeln!(output, "  Minigames: {}", report.minigames);
    if !report.elimination_order.is_empty() {
        let order: Vec<String> = report
            .elimination_order
            .iter()
            .map(ToString::to_string)
            .collect();
        let _ = writeln!(output, "  Eliminated: {}", order.join(" -> "));
    }

    output
}

/// JSON-serializable tournament result.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentResult {
    /// Total games played.
    games_played: u64,
    /// Games that failed.
    failed: u64,
    /// Per-player statistics.
    players: Vec<JsonTournamentPlayer>,
    /// Games that hit the turn limit.
    draws: u64,
    /// Average game length in turns.
    avg_turns: f64,
}

/// JSON-serializable per-player tournament stats.
#[derive(Debug, Serialize)]
struct JsonTournamentPlayer {
    /// Player id.
    player: PlayerId,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
}

impl JsonTournamentResult {
    /// Create from a summary.
    pub(super) fn from_summary(summary: &TournamentSummary) -> Self {
        Self {
            games_played: summary.games_played,
            failed: summary.failed,
            players: player_ids(summary)
                .map(|player| JsonTournamentPlayer {
                    player,
                    wins: wins(summary, player),
                    win_rate: summary.win_rate(player),
                })
                .collect(),
            draws: summary.draws,
            avg_turns: summary.avg_turns(),
        }
    }
}

fn player_ids(summary: &TournamentSummary) -> impl Iterator<Item = PlayerId> {
    (0..summary.wins.len()).filter_map(|i| PlayerId::try_from(i).ok())
}

fn wins(summary: &TournamentSummary, player: PlayerId) -> u64 {
    summary.wins.get(usize::from(player)).copied().unwrap_or(0)
}

/// Format a tournament summary as human-readable text.
#[allow(clippy::cast_precision_loss)]
pub(super) fn format_tournament_text(summary: &TournamentSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Tournament Results ({} games)", summary.games_played);
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for player in player_ids(summary) {
        let _ = writeln!(
            output,
            "  Player {player}: {:.1}% ({} wins)",
            summary.win_rate(player) * 100.0,
            wins(summary, player)
        );
    }
    let draw_rate = if summary.games_played == 0 {
        0.0
    } else {
        summary.draws as f64 / summary.games_played as f64 * 100.0
    };
    let _ = writeln!(output, "  Draws: {} ({draw_rate:.1}%)", summary.draws);
    if summary.failed > 0 {
        let _ = writeln!(output, "  Failed: {}", summary.failed);
    }

    let _ = writeln!(
        output,
        "\nAverage Game Length: {:.0} turns",
        summary.avg_turns()
    );

    output
}

/// Format a tournament summary as CSV.
pub(super) fn format_tournament_csv(summary: &TournamentSummary) -> String {
    let mut output = String::from("player,wins,win_rate\n");
    for player in player_ids(summary) {
        let _ = writeln!(
            output,
            "{player},{},{:.4}",
            wins(summary, player),
            summary.win_rate(player)
        );
    }
    output
}

/// Format `inspect` rows as an aligned table.
pub(super) fn format_players(turn: u32, current: PlayerId, players: &[PlayerReport]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Turn {turn}, player {current} to move\n");
    output.push_str("  id  kind   color    sectors units  atk  def  act  left  range  cap\n");
    for p in players {
        let _ = writeln!(
            output,
            "  {:<3} {:<6} {:<8} {:>7} {:>5} {:>4} {:>4} {:>4} {:>5} {:>6} {:>4}",
            p.id,
            p.kind,
            p.color,
            p.sectors,
            p.units,
            p.attack,
            p.defence,
            p.actions,
            p.actions_remaining,
            p.move_range,
            p.level_cap
        );
    }
    output
}
