//! Effect engine.
//!
//! Effects are stackable modifiers attached to a player, sector or unit. Each
//! owner holds one [`EffectManager`] whose derived stats are pure folds over
//! the attached effects:
//!
//! | Stat        | Reducer | Base |
//! |-------------|---------|------|
//! | attack      | sum     | 0    |
//! | defence     | sum     | 0    |
//! | actions     | sum     | 2    |
//! | move range  | sum     | 1    |
//! | level cap   | sum     | 5    |
//! | traversable | AND     | true |
//! | can move    | AND     | true |
//!
//! Effects also react to [`GameEvent`](crate::game::GameEvent)s. Hooks never
//! touch game state directly; they queue [`EffectCommand`]s which the turn
//! controller executes once the fan-out for an event has finished.

mod kind;
mod manager;

pub use kind::{Effect, EffectFilter, EffectKind, Resource};
pub use manager::{EffectId, EffectManager};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::{GameEvent, PlayerId, SectorId, UnitId};

/// Base value of the attack stat.
pub const BASE_ATTACK: i32 = 0;
/// Base value of the defence stat.
pub const BASE_DEFENCE: i32 = 0;
/// Base number of actions per turn.
pub const BASE_ACTIONS: i32 = 2;
/// Base move range in sector hops.
pub const BASE_MOVE_RANGE: i32 = 1;
/// Base unit level cap.
pub const BASE_LEVEL_CAP: i32 = 5;

/// The object an effect manager belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EffectOwner {
    /// A player in the roster.
    Player(PlayerId),
    /// A map sector.
    Sector(SectorId),
    /// A unit on the map.
    Unit(UnitId),
}

impl EffectOwner {
    /// The kind of this owner.
    #[must_use]
    pub const fn kind(self) -> OwnerKind {
        match self {
            Self::Player(_) => OwnerKind::Player,
            Self::Sector(_) => OwnerKind::Sector,
            Self::Unit(_) => OwnerKind::Unit,
        }
    }
}

/// Owner kinds an effect may be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    /// Player-scoped.
    Player,
    /// Sector-scoped.
    Sector,
    /// Unit-scoped.
    Unit,
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Sector => write!(f, "sector"),
            Self::Unit => write!(f, "unit"),
        }
    }
}

/// Context handed to effect hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectScope {
    /// The object the effect is attached to.
    pub owner: EffectOwner,
    /// The player controlling the owner: the player itself, the sector's
    /// owner, or the unit's owner.
    pub controller: Option<PlayerId>,
}

/// A side effect requested by an effect hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectCommand {
    /// Attach an effect to another owner.
    Apply {
        /// Receiving owner.
        target: EffectOwner,
        /// Effect to attach.
        effect: Effect,
    },
    /// Remove every effect matching the filter from an owner.
    RemoveMatching {
        /// Owner to strip.
        target: EffectOwner,
        /// Which effects to remove.
        filter: EffectFilter,
    },
    /// Change a unit's level, clamped to its owner's level cap.
    AdjustUnitLevel {
        /// Unit to adjust.
        unit: UnitId,
        /// Level delta.
        delta: i32,
    },
    /// Add actions to a player's remaining budget.
    GrantActions {
        /// Receiving player.
        player: PlayerId,
        /// Number of actions.
        amount: u32,
    },
    /// Divert into the bonus minigame for a player.
    StartMinigame {
        /// Player who captured the bonus objective.
        player: PlayerId,
    },
    /// Raise an event for subscribers.
    Notify(GameEvent),
}

/// Derived stats of one effect manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Attack bonus.
    pub attack: i32,
    /// Defence bonus.
    pub defence: i32,
    /// Actions per turn.
    pub actions: i32,
    /// Move range in hops.
    pub move_range: i32,
    /// Unit level cap.
    pub level_cap: i32,
    /// Whether units may enter.
    pub traversable: bool,
    /// Whether the owner may move.
    pub can_move: bool,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            attack: BASE_ATTACK,
            defence: BASE_DEFENCE,
            actions: BASE_ACTIONS,
            move_range: BASE_MOVE_RANGE,
            level_cap: BASE_LEVEL_CAP,
            traversable: true,
            can_move: true,
        }
    }
}
