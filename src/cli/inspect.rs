//! Inspect command implementation.

use std::io::{self, Write};
use std::path::PathBuf;

use conquest::effect::{EffectManager, EffectOwner};
use conquest::{GameError, GameSnapshot, PlayerKind};

use super::output::{PlayerReport, format_players};
use super::{CliError, OutputFormat};

/// Execute the inspect command: load a snapshot and print each player's
/// derived stats.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or holds effects a
/// player cannot own.
pub(crate) fn execute(file: PathBuf, format: OutputFormat) -> Result<(), CliError> {
    let snapshot = GameSnapshot::load(&file)?;
    let players = player_reports(&snapshot)?;

    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Text => write!(
            out,
            "{}",
            format_players(snapshot.turn, snapshot.current, &players)
        )?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&players)?)?,
    }
    Ok(())
}

fn player_reports(snapshot: &GameSnapshot) -> Result<Vec<PlayerReport>, GameError> {
    snapshot
        .players
        .iter()
        .map(|player| {
            let effects =
                EffectManager::restored(EffectOwner::Player(player.id), player.effects.iter().copied())?;
            let stats = effects.stats();
            let sectors = &snapshot.map.sectors;
            Ok(PlayerReport {
                id: player.id,
                kind: match player.kind {
                    PlayerKind::Human => "human",
                    PlayerKind::Ai => "ai",
                },
                color: player.color.to_string(),
                sectors: sectors.iter().filter(|s| s.owner == Some(player.id)).count(),
                units: sectors
                    .iter()
                    .filter_map(|s| s.unit.as_ref())
                    .filter(|u| u.owner == Some(player.id))
                    .count(),
                attack: stats.attack,
                defence: stats.defence,
                actions: stats.actions,
                actions_remaining: player.actions_remaining,
                move_range: stats.move_range,
                level_cap: stats.level_cap,
            })
        })
        .collect()
}
