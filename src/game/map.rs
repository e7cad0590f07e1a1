//! Sectors, landmarks and the map graph.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::effect::{Effect, EffectKind, EffectManager, EffectOwner, Resource};
use crate::error::ConfigError;
use crate::game::{PlayerId, SectorId, Unit, UnitId, UnitSnapshot};

/// A grid coordinate, used when laying sectors out on a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Get adjacent coordinates (up, down, left, right).
    ///
    /// The array contains valid coordinates in indices 0..count.
    #[must_use]
    #[inline]
    pub fn adjacent(&self, width: u16, height: u16) -> ([Coord; 4], u8) {
        let mut result = [Coord::new(0, 0); 4];
        let mut count = 0u8;

        if self.y > 0 {
            result[count as usize] = Coord::new(self.x, self.y - 1);
            count += 1;
        }
        if self.y + 1 < height {
            result[count as usize] = Coord::new(self.x, self.y + 1);
            count += 1;
        }
        if self.x > 0 {
            result[count as usize] = Coord::new(self.x - 1, self.y);
            count += 1;
        }
        if self.x + 1 < width {
            result[count as usize] = Coord::new(self.x + 1, self.y);
            count += 1;
        }

        (result, count)
    }
}

/// A fixed sector feature granting its owner a bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landmark {
    /// Stat raised for the owner.
    pub resource: Resource,
    /// Bonus amount.
    pub amount: i32,
}

/// Static description of one sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorLayout {
    /// Neighbouring sectors.
    pub adjacent: Vec<SectorId>,
    /// Landmark, if any.
    pub landmark: Option<Landmark>,
}

/// Static description of a whole map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayout {
    /// Sectors per row when drawn as a grid.
    pub columns: u16,
    /// Sectors indexed by id.
    pub sectors: Vec<SectorLayout>,
}

/// Persisted form of a [`Sector`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorSnapshot {
    /// Sector-scoped effects.
    pub effects: Vec<Effect>,
    /// Occupying unit.
    pub unit: Option<UnitSnapshot>,
    /// Owning player.
    pub owner: Option<PlayerId>,
}

/// One map cell.
#[derive(Debug, Clone)]
pub struct Sector {
    id: SectorId,
    adjacent: Vec<SectorId>,
    landmark: Option<Landmark>,
    owner: Option<PlayerId>,
    unit: Option<Unit>,
    effects: EffectManager,
}

impl Sector {
    /// Sector identity.
    #[must_use]
    pub const fn id(&self) -> SectorId {
        self.id
    }

    /// Neighbouring sectors.
    #[must_use]
    pub fn adjacent(&self) -> &[SectorId] {
        &self.adjacent
    }

    /// Landmark, if any.
    #[must_use]
    pub const fn landmark(&self) -> Option<Landmark> {
        self.landmark
    }

    /// Owning player.
    #[must_use]
    pub const fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    /// Occupying unit.
    #[must_use]
    pub const fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }

    /// Mutable occupying unit.
    pub fn unit_mut(&mut self) -> Option<&mut Unit> {
        self.unit.as_mut()
    }

    /// Sector-scoped effects.
    #[must_use]
    pub const fn effects(&self) -> &EffectManager {
        &self.effects
    }

    /// Mutable sector-scoped effects.
    pub fn effects_mut(&mut self) -> &mut EffectManager {
        &mut self.effects
    }

    /// Whether units may enter.
    #[must_use]
    pub fn is_traversable(&self) -> bool {
        self.effects.traversable()
    }

    /// Whether the bonus objective sits here.
    #[must_use]
    pub fn has_bonus_objective(&self) -> bool {
        self.effects.has(EffectKind::BonusObjective)
    }

    pub(crate) fn set_owner(&mut self, owner: Option<PlayerId>) -> Option<PlayerId> {
        std::mem::replace(&mut self.owner, owner)
    }

    pub(crate) fn take_unit(&mut self) -> Option<Unit> {
        self.unit.take()
    }

    pub(crate) fn place_unit(&mut self, mut unit: Unit) -> Option<Unit> {
        unit.set_sector(self.id);
        self.unit.replace(unit)
    }

    /// Persisted form of this sector.
    #[must_use]
    pub fn snapshot(&self) -> SectorSnapshot {
        SectorSnapshot {
            effects: self.effects.snapshot(),
            unit: self.unit.as_ref().map(Unit::snapshot),
            owner: self.owner,
        }
    }
}

/// Rotation state of the bonus objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BonusObjectiveTimer {
    /// Rounds left before the next allocation.
    pub countdown: u32,
    /// Sector that last hosted the objective.
    pub last_sector: Option<SectorId>,
}

/// Persisted form of a [`Map`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSnapshot {
    /// Rounds left before the next bonus objective allocation.
    pub bonus_countdown: u32,
    /// Sector that last hosted the bonus objective.
    pub last_bonus_sector: Option<SectorId>,
    /// Sectors in id order.
    pub sectors: Vec<SectorSnapshot>,
}

/// The sector graph.
#[derive(Debug, Clone, Default)]
pub struct Map {
    sectors: Vec<Sector>,
    columns: u16,
    built: bool,
    next_unit_id: UnitId,
    /// Bonus objective rotation.
    pub bonus: BonusObjectiveTimer,
}

impl Map {
    /// Create an empty, unbuilt map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate sectors from a layout. Landmarked sectors receive a
    /// beacon effect that hands the landmark bonus to their owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the map was already built or the adjacency lists
    /// are dangling or asymmetric.
    pub fn build(&mut self, layout: &MapLayout) -> Result<(), ConfigError> {
        if self.built {
            return Err(ConfigError::MapAlreadyBuilt);
        }
        let count = layout.sectors.len();
        for (from, sector) in layout.sectors.iter().enumerate() {
            let from = sector_id(from);
            for &to in &sector.adjacent {
                let Some(other) = layout.sectors.get(usize::from(to)) else {
                    return Err(ConfigError::DanglingAdjacency { from, to });
                };
                if !other.adjacent.contains(&from) {
                    return Err(ConfigError::AsymmetricAdjacency { from, to });
                }
            }
        }

        let mut sectors = Vec::with_capacity(count);
        for (index, spec) in layout.sectors.iter().enumerate() {
            let id = sector_id(index);
            let mut effects = EffectManager::new(EffectOwner::Sector(id));
            if let Some(landmark) = spec.landmark {
                effects
                    .apply(Effect::LandmarkBeacon {
                        resource: landmark.resource,
                        amount: landmark.amount,
                    })
                    .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            }
            sectors.push(Sector {
                id,
                adjacent: spec.adjacent.clone(),
                landmark: spec.landmark,
                owner: None,
                unit: None,
                effects,
            });
        }

        self.sectors = sectors;
        self.columns = layout.columns;
        self.built = true;
        Ok(())
    }

    /// Whether [`Map::build`] has run.
    #[must_use]
    pub const fn is_built(&self) -> bool {
        self.built
    }

    /// Sectors per row when drawn as a grid.
    #[must_use]
    pub const fn columns(&self) -> u16 {
        self.columns
    }

    /// Number of sectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    /// Whether the map has no sectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// All sectors in id order.
    #[must_use]
    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub(crate) fn sectors_mut(&mut self) -> &mut [Sector] {
        &mut self.sectors
    }

    /// Look up a sector.
    #[must_use]
    pub fn sector(&self, id: SectorId) -> Option<&Sector> {
        self.sectors.get(usize::from(id))
    }

    /// Look up a sector mutably.
    pub fn sector_mut(&mut self, id: SectorId) -> Option<&mut Sector> {
        self.sectors.get_mut(usize::from(id))
    }

    /// Sectors whose landmark is set.
    pub fn landmark_sectors(&self) -> impl Iterator<Item = &Sector> {
        self.sectors.iter().filter(|s| s.landmark.is_some())
    }

    /// Sectors owned by `player`.
    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = &Sector> {
        self.sectors
            .iter()
            .filter(move |s| s.owner == Some(player))
    }

    /// Units owned by `player`, in sector order.
    pub fn units_of(&self, player: PlayerId) -> impl Iterator<Item = &Unit> {
        self.sectors
            .iter()
            .filter_map(|s| s.unit.as_ref())
            .filter(move |u| u.owner() == Some(player))
    }

    /// Whether `player` has at least one unit.
    #[must_use]
    pub fn has_units(&self, player: PlayerId) -> bool {
        self.units_of(player).next().is_some()
    }

    /// Whether `player` owns at least one landmarked sector.
    #[must_use]
    pub fn owns_landmark(&self, player: PlayerId) -> bool {
        self.owned_by(player).any(|s| s.landmark.is_some())
    }

    /// A player with no units and no landmark is eliminated.
    #[must_use]
    pub fn is_eliminated(&self, player: PlayerId) -> bool {
        !self.has_units(player) && !self.owns_landmark(player)
    }

    /// Sector currently holding `unit`.
    #[must_use]
    pub fn find_unit(&self, unit: UnitId) -> Option<SectorId> {
        self.sectors
            .iter()
            .find(|s| s.unit.as_ref().is_some_and(|u| u.id() == unit))
            .map(Sector::id)
    }

    /// Look up a unit by id.
    #[must_use]
    pub fn unit(&self, unit: UnitId) -> Option<&Unit> {
        let sector = self.find_unit(unit)?;
        self.sector(sector)?.unit()
    }

    /// Look up a unit by id mutably.
    pub fn unit_mut(&mut self, unit: UnitId) -> Option<&mut Unit> {
        let sector = self.find_unit(unit)?;
        self.sector_mut(sector)?.unit_mut()
    }

    /// Every unit on the map ordered by id, which is spawn order.
    pub(crate) fn unit_sectors_by_spawn(&self) -> Vec<(UnitId, SectorId)> {
        let mut units: Vec<_> = self
            .sectors
            .iter()
            .filter_map(|s| s.unit.as_ref().map(|u| (u.id(), s.id)))
            .collect();
        units.sort_unstable();
        units
    }

    pub(crate) fn allocate_unit_id(&mut self) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id += 1;
        id
    }

    /// Sectors a unit at `from` can reach within `range` hops, moving only
    /// through traversable sectors. An occupied sector can be reached but
    /// not passed through. `from` itself is excluded.
    #[must_use]
    pub fn reachable(&self, from: SectorId, range: i32) -> Vec<SectorId> {
        let Ok(range) = usize::try_from(range) else {
            return Vec::new();
        };
        let mut depth = vec![usize::MAX; self.sectors.len()];
        let mut queue = VecDeque::new();
        let mut found = Vec::new();

        if let Some(slot) = depth.get_mut(usize::from(from)) {
            *slot = 0;
            queue.push_back(from);
        }
        while let Some(current) = queue.pop_front() {
            let here = depth[usize::from(current)];
            if here >= range {
                continue;
            }
            for &next in &self.sectors[usize::from(current)].adjacent {
                let index = usize::from(next);
                if depth[index] != usize::MAX || !self.sectors[index].is_traversable() {
                    continue;
                }
                depth[index] = here + 1;
                found.push(next);
                if self.sectors[index].unit.is_none() {
                    queue.push_back(next);
                }
            }
        }
        found
    }

    /// Clear ownership of every sector owned by `player`.
    pub(crate) fn release(&mut self, player: PlayerId) -> Vec<SectorId> {
        let mut released = Vec::new();
        for sector in &mut self.sectors {
            if sector.owner == Some(player) {
                sector.owner = None;
                released.push(sector.id);
            }
        }
        released
    }

    /// Persisted form of the map.
    #[must_use]
    pub fn snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            bonus_countdown: self.bonus.countdown,
            last_bonus_sector: self.bonus.last_sector,
            sectors: self.sectors.iter().map(Sector::snapshot).collect(),
        }
    }

    /// Overwrite dynamic state from a snapshot of a map with the same
    /// layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the sector count differs or a persisted effect
    /// cannot be re-attached.
    pub(crate) fn restore(&mut self, snapshot: &MapSnapshot) -> crate::GameResult<()> {
        if snapshot.sectors.len() != self.sectors.len() {
            return Err(crate::error::InvalidOperation::SnapshotMismatch(format!(
                "snapshot has {} sectors, map has {}",
                snapshot.sectors.len(),
                self.sectors.len()
            ))
            .into());
        }

        let mut next_unit_id = 0;
        for (sector, saved) in self.sectors.iter_mut().zip(&snapshot.sectors) {
            sector.owner = saved.owner;
            sector.effects =
                EffectManager::restored(EffectOwner::Sector(sector.id), saved.effects.iter().copied())?;
            sector.unit = match &saved.unit {
                Some(unit) => {
                    next_unit_id = next_unit_id.max(unit.id + 1);
                    let mut unit = Unit::from_snapshot(unit)?;
                    unit.set_sector(sector.id);
                    Some(unit)
                }
                None => None,
            };
        }
        self.next_unit_id = self.next_unit_id.max(next_unit_id);
        self.bonus = BonusObjectiveTimer {
            countdown: snapshot.bonus_countdown,
            last_sector: snapshot.last_bonus_sector,
        };
        Ok(())
    }
}

/// Convert a sector index into an id.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub(crate) const fn sector_id(index: usize) -> SectorId {
    index as SectorId
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three sectors in a line: 0 - 1 - 2, with a landmark on 2.
    fn line_layout() -> MapLayout {
        MapLayout {
            columns: 3,
            sectors: vec![
                SectorLayout {
                    adjacent: vec![1],
                    landmark: None,
                },
                SectorLayout {
                    adjacent: vec![0, 2],
                    landmark: None,
                },
                SectorLayout {
                    adjacent: vec![1],
                    landmark: Some(Landmark {
                        resource: Resource::Attack,
                        amount: 2,
                    }),
                },
            ],
        }
    }

    fn line_map() -> Map {
        let mut map = Map::new();
        map.build(&line_layout()).unwrap();
        map
    }

    #[test]
    fn test_coord_adjacent() {
        let coord = Coord::new(5, 5);
        let (adj, count) = coord.adjacent(10, 10);
        let adj_slice = &adj[..count as usize];
        assert_eq!(count, 4);
        assert!(adj_slice.contains(&Coord::new(5, 4)));
        assert!(adj_slice.contains(&Coord::new(5, 6)));
        assert!(adj_slice.contains(&Coord::new(4, 5)));
        assert!(adj_slice.contains(&Coord::new(6, 5)));
    }

    #[test]
    fn test_coord_adjacent_corner() {
        let (adj, count) = Coord::new(0, 0).adjacent(10, 10);
        let adj_slice = &adj[..count as usize];
        assert_eq!(count, 2);
        assert!(adj_slice.contains(&Coord::new(0, 1)));
        assert!(adj_slice.contains(&Coord::new(1, 0)));
    }

    #[test]
    fn test_build_twice_fails() {
        let mut map = line_map();
        assert_eq!(map.build(&line_layout()), Err(ConfigError::MapAlreadyBuilt));
    }

    #[test]
    fn test_build_rejects_asymmetric_adjacency() {
        let mut layout = line_layout();
        layout.sectors[0].adjacent.push(2);
        let err = Map::new().build(&layout).unwrap_err();
        assert_eq!(err, ConfigError::AsymmetricAdjacency { from: 0, to: 2 });
    }

    #[test]
    fn test_build_rejects_dangling_adjacency() {
        let mut layout = line_layout();
        layout.sectors[2].adjacent.push(9);
        let err = Map::new().build(&layout).unwrap_err();
        assert_eq!(err, ConfigError::DanglingAdjacency { from: 2, to: 9 });
    }

    #[test]
    fn test_landmark_sectors_carry_beacon() {
        let map = line_map();
        let landmarks: Vec<_> = map.landmark_sectors().map(Sector::id).collect();
        assert_eq!(landmarks, vec![2]);
        assert!(map.sector(2).unwrap().effects().has(EffectKind::LandmarkBeacon));
        assert!(map.sector(0).unwrap().effects().is_empty());
    }

    #[test]
    fn test_reachable_respects_range_and_flooding() {
        let mut map = line_map();
        assert_eq!(map.reachable(0, 1), vec![1]);
        assert_eq!(map.reachable(0, 2), vec![1, 2]);
        assert!(map.reachable(0, 0).is_empty());

        map.sector_mut(1)
            .unwrap()
            .effects_mut()
            .apply(Effect::Flooded { turns: 1 })
            .unwrap();
        assert!(map.reachable(0, 2).is_empty());
    }

    #[test]
    fn test_reachable_stops_at_occupied_sectors() {
        let mut map = line_map();
        let id = map.allocate_unit_id();
        map.sector_mut(1).unwrap().place_unit(Unit::new(id, 1, 1, 1, 5));
        assert_eq!(map.reachable(0, 1), vec![1]);
        assert_eq!(map.reachable(0, 3), vec![1]);
        assert_eq!(map.reachable(2, 2), vec![1]);
    }

    #[test]
    fn test_elimination_is_derived() {
        let mut map = line_map();
        assert!(map.is_eliminated(0));

        map.sector_mut(2).unwrap().set_owner(Some(0));
        assert!(!map.is_eliminated(0));

        map.sector_mut(2).unwrap().set_owner(None);
        let id = map.allocate_unit_id();
        map.sector_mut(0).unwrap().place_unit(Unit::new(id, 0, 0, 1, 5));
        assert!(!map.is_eliminated(0));
        assert_eq!(map.find_unit(id), Some(0));
        assert_eq!(map.unit(id).map(Unit::sector), Some(0));
    }

    #[test]
    fn test_release() {
        let mut map = line_map();
        map.sector_mut(0).unwrap().set_owner(Some(1));
        map.sector_mut(1).unwrap().set_owner(Some(1));
        assert_eq!(map.release(1), vec![0, 1]);
        assert_eq!(map.owned_by(1).count(), 0);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut map = line_map();
        map.sector_mut(1).unwrap().set_owner(Some(0));
        let id = map.allocate_unit_id();
        map.sector_mut(1).unwrap().place_unit(Unit::new(id, 0, 1, 3, 5));
        map.bonus.countdown = 2;
        let snapshot = map.snapshot();

        let mut other = line_map();
        other.restore(&snapshot).unwrap();
        assert_eq!(other.sector(1).unwrap().owner(), Some(0));
        assert_eq!(other.unit(id).map(Unit::level), Some(3));
        assert_eq!(other.bonus.countdown, 2);
        assert_eq!(other.allocate_unit_id(), id + 1);
    }
}
