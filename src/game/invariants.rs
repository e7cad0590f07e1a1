//! Game invariants - sanity checks that detect bugs.
//!
//! These should NEVER trigger in a correctly implemented game. If they do,
//! it indicates a bug in the controller, not a gameplay condition.

use std::collections::HashSet;

use crate::game::Game;

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(game: &Game) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut report = |message: String| violations.push(InvariantViolation { message });
    let map = game.map();
    let mut seen_units = HashSet::new();

    for sector in map.sectors() {
        let id = sector.id();

        // Adjacency must be symmetric
        for &next in sector.adjacent() {
            match map.sector(next) {
                None => report(format!("Sector {id} lists unknown neighbour {next}")),
                Some(other) if !other.adjacent().contains(&id) => {
                    report(format!("Sector {id} lists {next} but not the reverse"));
                }
                Some(_) => {}
            }
        }

        if let Some(owner) = sector.owner()
            && game.roster().get(owner).is_none()
        {
            report(format!("Sector {id} owned by unknown player {owner}"));
        }

        let Some(unit) = sector.unit() else {
            continue;
        };
        if !seen_units.insert(unit.id()) {
            report(format!("Unit {} appears in more than one sector", unit.id()));
        }
        if unit.sector() != id {
            report(format!(
                "Unit {} stands in sector {id} but believes it is in {}",
                unit.id(),
                unit.sector()
            ));
        }
        if unit.is_destroyed() {
            report(format!("Destroyed unit {} still on sector {id}", unit.id()));
        }
        match unit.owner().and_then(|owner| game.roster().get(owner)) {
            None => report(format!("Unit {} on sector {id} has no owner", unit.id())),
            Some(owner) => {
                let cap = owner.effects().level_cap();
                if unit.level() < 1 || unit.level() > cap {
                    report(format!(
                        "Unit {} has level {} outside 1..={cap}",
                        unit.id(),
                        unit.level()
                    ));
                }
            }
        }
    }

    // Processed eliminations must have given everything up
    for &player in game.eliminations().processed() {
        let owned = map.owned_by(player).count();
        if owned > 0 {
            report(format!("Eliminated player {player} still owns {owned} sectors"));
        }
        if map.has_units(player) {
            report(format!("Eliminated player {player} still has units"));
        }
    }

    // Exactly one active indicator, on the current player, while running
    if game.is_processing() {
        for player in game.roster().iter() {
            if player.is_active() != (player.id() == game.current_player()) {
                report(format!(
                    "Player {} active flag is {} but current player is {}",
                    player.id(),
                    player.is_active(),
                    game.current_player()
                ));
            }
        }
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(game: &Game) {
    let violations = check_invariants(game);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_game: &Game) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, PlayerSpec};
    use crate::effect::Resource;
    use crate::game::{Color, Landmark, MapLayout, PlayerKind, SectorLayout};

    fn create_valid_game() -> Game {
        let landmark = Some(Landmark {
            resource: Resource::Defence,
            amount: 1,
        });
        let layout = MapLayout {
            columns: 3,
            sectors: vec![
                SectorLayout {
                    adjacent: vec![1],
                    landmark,
                },
                SectorLayout {
                    adjacent: vec![0, 2],
                    landmark: None,
                },
                SectorLayout {
                    adjacent: vec![1],
                    landmark,
                },
            ],
        };
        let config = GameConfig {
            players: vec![
                PlayerSpec {
                    kind: PlayerKind::Human,
                    color: Color::PALETTE[0],
                },
                PlayerSpec {
                    kind: PlayerKind::Human,
                    color: Color::PALETTE[1],
                },
            ],
            ..GameConfig::default()
        };
        Game::with_layout(config, &layout, 11).unwrap()
    }

    #[test]
    fn test_valid_game_passes() {
        let game = create_valid_game();
        let violations = check_invariants(&game);
        assert!(violations.is_empty(), "Unexpected violations: {violations:?}");
    }

    #[test]
    fn test_detects_level_above_cap() {
        let mut game = create_valid_game();
        let unit = game.map.units_of(0).next().unwrap().id();
        game.map.unit_mut(unit).unwrap().adjust_level(10, 50).unwrap();

        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("outside 1..=5"));
    }

    #[test]
    fn test_detects_stale_unit_sector() {
        let mut game = create_valid_game();
        let unit = game.map.units_of(0).next().unwrap().id();
        game.map.unit_mut(unit).unwrap().set_sector(1);

        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("believes")));
    }

    #[test]
    fn test_detects_unknown_owner() {
        let mut game = create_valid_game();
        game.map.sector_mut(1).unwrap().set_owner(Some(7));

        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("unknown player 7"));
    }

    #[test]
    #[should_panic(expected = "Game invariant violations")]
    #[cfg(debug_assertions)]
    fn test_assert_invariants_panics() {
        let mut game = create_valid_game();
        let unit = game.map.units_of(0).next().unwrap().id();
        game.map.unit_mut(unit).unwrap().destroy().unwrap();
        assert_invariants(&game);
    }
}
