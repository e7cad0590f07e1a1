//! AI move selection.
//!
//! AI players never move onto a human-owned sector. The random strategy
//! also keeps clear of the bonus objective; the greedy one goes for it.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::AiStrategy;
use crate::game::combat::{self, Combatant};
use crate::game::{Map, PlayerId, PlayerManager, Sector, SectorId, Unit};

/// Pick a move for `player`, or `None` if the chosen unit has nowhere to go.
pub fn choose_move(
    map: &Map,
    roster: &PlayerManager,
    player: PlayerId,
    strategy: AiStrategy,
    rng: &mut impl Rng,
) -> Option<(SectorId, SectorId)> {
    match strategy {
        AiStrategy::Random => random_move(map, roster, player, rng),
        AiStrategy::Greedy => greedy_move(map, roster, player, rng),
    }
}

/// Sectors the AI may move onto: unowned or AI-owned.
fn allowed_target(roster: &PlayerManager, sector: &Sector) -> bool {
    sector
        .owner()
        .is_none_or(|owner| roster.get(owner).is_some_and(|p| p.is_ai()))
}

fn move_range(roster: &PlayerManager, player: PlayerId) -> i32 {
    roster
        .get(player)
        .map_or(0, |p| p.effects().move_range())
}

fn movable_units(map: &Map, player: PlayerId) -> Vec<&Unit> {
    map.units_of(player).filter(|u| u.can_move()).collect()
}

/// A random own unit, then a random allowed target away from the bonus
/// objective.
fn random_move(
    map: &Map,
    roster: &PlayerManager,
    player: PlayerId,
    rng: &mut impl Rng,
) -> Option<(SectorId, SectorId)> {
    let unit = movable_units(map, player).choose(rng).copied()?;
    let from = unit.sector();
    let targets: Vec<SectorId> = map
        .reachable(from, move_range(roster, player))
        .into_iter()
        .filter(|&to| {
            map.sector(to)
                .is_some_and(|s| allowed_target(roster, s) && !s.has_bonus_objective())
        })
        .collect();
    targets.choose(rng).map(|&to| (from, to))
}

/// Value of moving `unit` onto `target`; `None` if the move would throw the
/// unit away.
fn score(map: &Map, roster: &PlayerManager, player: PlayerId, unit: &Unit, target: &Sector) -> Option<i32> {
    let mut value = match target.unit() {
        Some(other) if other.owner() == Some(player) => 0,
        Some(enemy) => {
            let attack = Combatant::of(unit, roster.get(player));
            let defence = Combatant::of(enemy, enemy.owner().and_then(|o| roster.get(o)));
            if combat::skill_diff(attack, defence) < 0 {
                return None;
            }
            let kills = combat::damage(attack.total_attack() - defence.total_defence()) >= enemy.level();
            if kills { 40 } else { 25 }
        }
        None if target.owner() == Some(player) => 1,
        None => 20,
    };
    if target.owner() != Some(player) {
        if target.landmark().is_some() {
            value += 15;
        }
        if target.has_bonus_objective() {
            value += 25;
        }
        if target.owner().is_some_and(|owner| map.owned_by(owner).count() == 1) {
            value += 10;
        }
    }
    Some(value)
}

/// The best-scoring move over every own unit, ties broken at random.
fn greedy_move(
    map: &Map,
    roster: &PlayerManager,
    player: PlayerId,
    rng: &mut impl Rng,
) -> Option<(SectorId, SectorId)> {
    let range = move_range(roster, player);
    let mut best = Vec::new();
    let mut best_score = i32::MIN;

    for unit in movable_units(map, player) {
        let from = unit.sector();
        for to in map.reachable(from, range) {
            let Some(target) = map.sector(to).filter(|s| allowed_target(roster, s)) else {
                continue;
            };
            let Some(value) = score(map, roster, player, unit, target) else {
                continue;
            };
            if value > best_score {
                best_score = value;
                best.clear();
            }
            if value == best_score {
                best.push((from, to));
            }
        }
    }
    best.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{Effect, Resource};
    use crate::game::{Color, Landmark, MapLayout, PlayerKind, SectorLayout, UnitTemplate};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// A line of four sectors: 0 - 1 - 2 - 3, landmark on 3.
    fn line() -> Map {
        let layout = MapLayout {
            columns: 4,
            sectors: (0..4u16)
                .map(|i| SectorLayout {
                    adjacent: [i.checked_sub(1), (i < 3).then_some(i + 1)]
                        .into_iter()
                        .flatten()
                        .collect(),
                    landmark: (i == 3).then_some(Landmark {
                        resource: Resource::Defence,
                        amount: 1,
                    }),
                })
                .collect(),
        };
        let mut map = Map::new();
        map.build(&layout).unwrap();
        map
    }

    fn roster(kinds: &[PlayerKind]) -> PlayerManager {
        let specs: Vec<_> = kinds
            .iter()
            .enumerate()
            .map(|(i, &k)| (k, Color::PALETTE[i]))
            .collect();
        let mut roster = PlayerManager::new();
        roster.initialize(&specs, UnitTemplate::default()).unwrap();
        roster
    }

    fn place(map: &mut Map, owner: PlayerId, sector: SectorId, level: i32) {
        let id = map.allocate_unit_id();
        let slot = map.sector_mut(sector).unwrap();
        slot.set_owner(Some(owner));
        slot.place_unit(Unit::new(id, owner, sector, level, 5));
    }

    #[test]
    fn test_random_avoids_human_sectors() {
        let mut map = line();
        let roster = roster(&[PlayerKind::Ai, PlayerKind::Human]);
        place(&mut map, 0, 1, 1);
        map.sector_mut(0).unwrap().set_owner(Some(1));

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let choice = choose_move(&map, &roster, 0, AiStrategy::Random, &mut rng);
            assert_eq!(choice, Some((1, 2)));
        }
    }

    #[test]
    fn test_random_avoids_bonus_objective() {
        let mut map = line();
        let roster = roster(&[PlayerKind::Ai, PlayerKind::Ai]);
        place(&mut map, 0, 0, 1);
        map.sector_mut(1)
            .unwrap()
            .effects_mut()
            .apply(Effect::BonusObjective)
            .unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(choose_move(&map, &roster, 0, AiStrategy::Random, &mut rng), None);
        assert_eq!(
            choose_move(&map, &roster, 0, AiStrategy::Greedy, &mut rng),
            Some((0, 1))
        );
    }

    #[test]
    fn test_no_units_no_move() {
        let map = line();
        let roster = roster(&[PlayerKind::Ai, PlayerKind::Ai]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(choose_move(&map, &roster, 0, AiStrategy::Random, &mut rng), None);
        assert_eq!(choose_move(&map, &roster, 0, AiStrategy::Greedy, &mut rng), None);
    }

    #[test]
    fn test_greedy_prefers_winnable_attack() {
        let mut map = line();
        let roster = roster(&[PlayerKind::Ai, PlayerKind::Ai]);
        place(&mut map, 0, 1, 3);
        place(&mut map, 1, 2, 1);

        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            choose_move(&map, &roster, 0, AiStrategy::Greedy, &mut rng),
            Some((1, 2))
        );
    }

    #[test]
    fn test_greedy_skips_losing_attack() {
        let mut map = line();
        let roster = roster(&[PlayerKind::Ai, PlayerKind::Ai]);
        place(&mut map, 0, 1, 1);
        place(&mut map, 1, 2, 4);

        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            choose_move(&map, &roster, 0, AiStrategy::Greedy, &mut rng),
            Some((1, 0))
        );
    }
}
