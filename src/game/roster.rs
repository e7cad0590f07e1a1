//! The fixed player roster.

use crate::error::{ConfigError, InvalidOperation};
use crate::game::{Color, Map, Player, PlayerId, PlayerKind, PlayerSnapshot, UnitTemplate};

/// Smallest playable roster.
pub const MIN_PLAYERS: usize = 2;
/// Largest roster; colours and ids fit comfortably.
pub const MAX_PLAYERS: usize = 8;

/// Ordered roster of players, fixed once initialized.
#[derive(Debug, Clone, Default)]
pub struct PlayerManager {
    players: Vec<Player>,
    initialized: bool,
}

impl PlayerManager {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the roster from `(kind, color)` pairs. Player ids are roster
    /// indices.
    ///
    /// # Errors
    ///
    /// Returns an error if the roster was already initialized or the number
    /// of players is outside `MIN_PLAYERS..=MAX_PLAYERS`.
    pub fn initialize(
        &mut self,
        specs: &[(PlayerKind, Color)],
        template: UnitTemplate,
    ) -> Result<(), ConfigError> {
        if self.initialized {
            return Err(ConfigError::RosterAlreadyInitialized);
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&specs.len()) {
            return Err(ConfigError::InvalidRosterSize {
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
                got: specs.len(),
            });
        }

        self.players = specs
            .iter()
            .zip(0..=PlayerId::MAX)
            .map(|(&(kind, color), id)| Player::new(id, kind, color, template))
            .collect();
        self.initialized = true;
        Ok(())
    }

    /// Number of players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Look up a player.
    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(usize::from(id))
    }

    /// Look up a player mutably.
    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(usize::from(id))
    }

    /// Players in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    /// Players not eliminated on `map`, in roster order.
    pub fn remaining<'a>(&'a self, map: &'a Map) -> impl Iterator<Item = &'a Player> + 'a {
        self.players.iter().filter(|p| !map.is_eliminated(p.id()))
    }

    /// The unique player left standing, if exactly one remains.
    #[must_use]
    pub fn winner(&self, map: &Map) -> Option<PlayerId> {
        let mut remaining = self.remaining(map);
        let first = remaining.next()?;
        remaining.next().is_none().then_some(first.id())
    }

    /// Move the turn indicator from `current` to the next non-eliminated
    /// player, wrapping around the roster.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOperation::NoRemainingPlayers`] if every other player
    /// is eliminated.
    pub fn to_next_player(&mut self, current: &mut PlayerId, map: &Map) -> Result<(), InvalidOperation> {
        let count = self.players.len();
        let start = usize::from(*current);
        let next = (1..count)
            .map(|offset| (start + offset) % count)
            .find(|&index| !map.is_eliminated(self.players[index].id()))
            .ok_or(InvalidOperation::NoRemainingPlayers)?;

        if let Some(player) = self.players.get_mut(start) {
            player.set_active(false);
        }
        self.players[next].set_active(true);
        *current = self.players[next].id();
        Ok(())
    }

    /// Persisted form of every player, in roster order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PlayerSnapshot> {
        self.players.iter().map(Player::snapshot).collect()
    }

    /// Overwrite every player from a snapshot of the same roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the roster sizes differ or an effect cannot be
    /// re-attached.
    pub(crate) fn restore(&mut self, snapshots: &[PlayerSnapshot]) -> crate::GameResult<()> {
        if snapshots.len() != self.players.len() {
            return Err(InvalidOperation::SnapshotMismatch(format!(
                "snapshot has {} players, roster has {}",
                snapshots.len(),
                self.players.len()
            ))
            .into());
        }
        for (player, saved) in self.players.iter_mut().zip(snapshots) {
            if player.id() != saved.id {
                return Err(InvalidOperation::SnapshotMismatch(format!(
                    "player {} restored from snapshot of player {}",
                    player.id(),
                    saved.id
                ))
                .into());
            }
            player.restore(saved)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Landmark, MapLayout, SectorLayout, Unit};
    use crate::effect::Resource;

    fn specs(n: usize) -> Vec<(PlayerKind, Color)> {
        (0..n).map(|i| (PlayerKind::Ai, Color::PALETTE[i])).collect()
    }

    /// A map with one landmarked, isolated sector per player.
    fn map_with_landmarks(n: usize) -> Map {
        let layout = MapLayout {
            columns: 4,
            sectors: (0..n)
                .map(|_| SectorLayout {
                    adjacent: Vec::new(),
                    landmark: Some(Landmark {
                        resource: Resource::Attack,
                        amount: 1,
                    }),
                })
                .collect(),
        };
        let mut map = Map::new();
        map.build(&layout).unwrap();
        for id in 0..n {
            #[allow(clippy::cast_possible_truncation)]
            map.sector_mut(id as u16).unwrap().set_owner(Some(id as u8));
        }
        map
    }

    #[test]
    fn test_initialize_once() {
        let mut roster = PlayerManager::new();
        roster.initialize(&specs(3), UnitTemplate::default()).unwrap();
        assert_eq!(roster.len(), 3);
        assert_eq!(
            roster.initialize(&specs(3), UnitTemplate::default()),
            Err(ConfigError::RosterAlreadyInitialized)
        );
    }

    #[test]
    fn test_initialize_rejects_bad_size() {
        let err = PlayerManager::new()
            .initialize(&specs(1), UnitTemplate::default())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidRosterSize {
                min: 2,
                max: 8,
                got: 1
            }
        );
    }

    #[test]
    fn test_to_next_player_skips_eliminated() {
        let mut roster = PlayerManager::new();
        roster.initialize(&specs(4), UnitTemplate::default()).unwrap();
        let mut map = map_with_landmarks(4);
        map.sector_mut(2).unwrap().set_owner(None);
        assert!(map.is_eliminated(2));

        let mut current = 1;
        roster.to_next_player(&mut current, &map).unwrap();
        assert_eq!(current, 3);
        assert!(roster.get(3).unwrap().is_active());
        assert!(!roster.get(1).unwrap().is_active());

        roster.to_next_player(&mut current, &map).unwrap();
        assert_eq!(current, 0);
    }

    #[test]
    fn test_to_next_player_fails_when_alone() {
        let mut roster = PlayerManager::new();
        roster.initialize(&specs(2), UnitTemplate::default()).unwrap();
        let mut map = map_with_landmarks(2);
        map.sector_mut(1).unwrap().set_owner(None);

        let mut current = 0;
        assert_eq!(
            roster.to_next_player(&mut current, &map),
            Err(InvalidOperation::NoRemainingPlayers)
        );
        assert_eq!(current, 0);
    }

    #[test]
    fn test_winner() {
        let mut roster = PlayerManager::new();
        roster.initialize(&specs(3), UnitTemplate::default()).unwrap();
        let mut map = map_with_landmarks(3);
        assert_eq!(roster.winner(&map), None);

        map.sector_mut(0).unwrap().set_owner(None);
        map.sector_mut(2).unwrap().set_owner(None);
        assert_eq!(roster.winner(&map), Some(1));

        // A unit alone keeps a player in the game.
        let id = map.allocate_unit_id();
        map.sector_mut(0).unwrap().place_unit(Unit::new(id, 2, 0, 1, 5));
        assert_eq!(roster.winner(&map), None);
    }
}
