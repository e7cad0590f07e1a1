//! Units standing on map sectors.

use serde::{Deserialize, Serialize};

use crate::effect::{Effect, EffectManager, EffectOwner};
use crate::error::{EffectError, InvalidOperation};
use crate::game::{PlayerId, SectorId, UnitId};

/// Level given to a unit spawned from a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTemplate {
    /// Starting level.
    pub level: i32,
}

impl Default for UnitTemplate {
    fn default() -> Self {
        Self { level: 1 }
    }
}

/// Persisted form of a [`Unit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unit identity.
    pub id: UnitId,
    /// Unit-scoped effects.
    pub effects: Vec<Effect>,
    /// Owning player.
    pub owner: Option<PlayerId>,
    /// Sector the unit stands in.
    pub sector: SectorId,
    /// Current level.
    pub level: i32,
}

/// A unit on the map.
#[derive(Debug, Clone)]
pub struct Unit {
    id: UnitId,
    owner: Option<PlayerId>,
    sector: SectorId,
    level: i32,
    effects: EffectManager,
    destroyed: bool,
}

impl Unit {
    /// Create a unit. `level` is clamped to `1..=level_cap`.
    #[must_use]
    pub fn new(id: UnitId, owner: PlayerId, sector: SectorId, level: i32, level_cap: i32) -> Self {
        Self {
            id,
            owner: Some(owner),
            sector,
            level: level.clamp(1, level_cap.max(1)),
            effects: EffectManager::new(EffectOwner::Unit(id)),
            destroyed: false,
        }
    }

    /// Rebuild a unit from its snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if a persisted effect cannot be attached to a unit.
    pub fn from_snapshot(snapshot: &UnitSnapshot) -> Result<Self, EffectError> {
        Ok(Self {
            id: snapshot.id,
            owner: snapshot.owner,
            sector: snapshot.sector,
            level: snapshot.level,
            effects: EffectManager::restored(
                EffectOwner::Unit(snapshot.id),
                snapshot.effects.iter().copied(),
            )?,
            destroyed: false,
        })
    }

    /// Persisted form of this unit.
    #[must_use]
    pub fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            effects: self.effects.snapshot(),
            owner: self.owner,
            sector: self.sector,
            level: self.level,
        }
    }

    /// Unit identity.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Owning player; `None` once destroyed.
    #[must_use]
    pub const fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    /// Sector the unit stands in.
    #[must_use]
    pub const fn sector(&self) -> SectorId {
        self.sector
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> i32 {
        self.level
    }

    /// Whether the unit has been destroyed.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Unit-scoped effects.
    #[must_use]
    pub const fn effects(&self) -> &EffectManager {
        &self.effects
    }

    /// Mutable unit-scoped effects.
    pub fn effects_mut(&mut self) -> &mut EffectManager {
        &mut self.effects
    }

    /// Whether no effect prevents the unit from moving.
    #[must_use]
    pub fn can_move(&self) -> bool {
        self.effects.can_move()
    }

    pub(crate) fn set_sector(&mut self, sector: SectorId) {
        self.sector = sector;
    }

    /// Change the level by `delta`, keeping it within `1..=level_cap`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOperation::UnitDestroyed`] for a destroyed unit.
    pub fn adjust_level(&mut self, delta: i32, level_cap: i32) -> Result<i32, InvalidOperation> {
        if self.destroyed {
            return Err(InvalidOperation::UnitDestroyed(self.id));
        }
        self.level = self.level.saturating_add(delta).clamp(1, level_cap.max(1));
        Ok(self.level)
    }

    /// Lose `damage` levels. Returns `true` if the level dropped to zero or
    /// below.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOperation::UnitDestroyed`] for a destroyed unit.
    pub fn take_damage(&mut self, damage: i32) -> Result<bool, InvalidOperation> {
        if self.destroyed {
            return Err(InvalidOperation::UnitDestroyed(self.id));
        }
        self.level = self.level.saturating_sub(damage);
        Ok(self.level <= 0)
    }

    /// Destroy the unit: clears its owner and tears down its effects.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOperation::UnitDestroyed`] if already destroyed.
    pub fn destroy(&mut self) -> Result<(), InvalidOperation> {
        if self.destroyed {
            return Err(InvalidOperation::UnitDestroyed(self.id));
        }
        self.destroyed = true;
        self.owner = None;
        self.effects.teardown();
        Ok(())
    }
}
