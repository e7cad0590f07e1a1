//! Game layer for Conquest.
//!
//! Implements the rules of the territory game:
//! - Map of sectors with adjacency, ownership and landmarks
//! - Units with levels, spawned at owned landmarks
//! - Players with effect-derived stats and an action budget
//! - Combat resolution
//! - Turn sequencing, elimination and victory in [`Game`]

pub mod ai;
pub mod combat;
mod elimination;
mod events;
mod invariants;
mod map;
mod player;
mod roster;
mod state;
mod turn;
mod unit;

pub use combat::{CombatOutcome, Combatant, Victor};
pub use elimination::{Elimination, EliminationQueue};
pub use events::{EventBus, GameEvent, SubscriptionId};
pub use invariants::{InvariantViolation, assert_invariants, check_invariants};
pub use map::{
    BonusObjectiveTimer, Coord, Landmark, Map, MapLayout, MapSnapshot, Sector, SectorLayout,
    SectorSnapshot,
};
pub use player::{Color, Player, PlayerId, PlayerKind, PlayerSnapshot};
pub use roster::{MAX_PLAYERS, MIN_PLAYERS, PlayerManager};
pub use state::{Diversion, Game};
pub use unit::{Unit, UnitSnapshot, UnitTemplate};

/// Stable index of a sector in its map.
pub type SectorId = u16;

/// Identity of a unit. Allocated by the map and never reused.
pub type UnitId = u32;
