//! Error types for the conquest engine.
//!
//! Every error here signals a logic error upstream rather than a transient
//! condition: they are raised at the point of violation and never retried.

use thiserror::Error;

use crate::effect::{EffectId, OwnerKind};
use crate::game::{PlayerId, SectorId, UnitId};

/// Errors raised by an [`EffectManager`](crate::effect::EffectManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EffectError {
    /// The effect kind cannot be attached to this kind of owner.
    #[error("effect {effect} cannot be attached to a {owner}")]
    UnsupportedOwner {
        /// Name of the effect kind.
        effect: &'static str,
        /// Kind of owner it was applied to.
        owner: OwnerKind,
    },
    /// No effect with this id is attached to the manager.
    #[error("effect {0} is not attached to this manager")]
    NotAttached(EffectId),
}

/// Fatal configuration errors raised while setting a game up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The roster was initialized twice.
    #[error("player roster is already initialized")]
    RosterAlreadyInitialized,
    /// The map was built twice.
    #[error("map is already built")]
    MapAlreadyBuilt,
    /// Roster size outside the supported range.
    #[error("roster must hold between {min} and {max} players, got {got}")]
    InvalidRosterSize {
        /// Minimum number of players.
        min: usize,
        /// Maximum number of players.
        max: usize,
        /// Requested number of players.
        got: usize,
    },
    /// Adjacency list references a sector that does not exist.
    #[error("sector {from} lists unknown neighbour {to}")]
    DanglingAdjacency {
        /// Sector holding the adjacency entry.
        from: SectorId,
        /// Missing neighbour.
        to: SectorId,
    },
    /// Adjacency is not symmetric.
    #[error("sector {from} lists {to} as neighbour but not the reverse")]
    AsymmetricAdjacency {
        /// Sector holding the adjacency entry.
        from: SectorId,
        /// Neighbour missing the reverse entry.
        to: SectorId,
    },
    /// Fewer landmarked sectors than players.
    #[error("{players} players need as many landmarked sectors, map has {landmarks}")]
    NotEnoughLandmarks {
        /// Number of players.
        players: usize,
        /// Number of landmarked sectors available.
        landmarks: usize,
    },
    /// No sector can host the bonus objective.
    #[error("no sector is eligible to host the bonus objective")]
    NoEligibleSector,
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Caller bugs: operations that are never legal in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidOperation {
    /// The source sector does not hold a unit owned by the mover.
    #[error("sector {sector} does not hold a unit owned by player {player}")]
    NotOwnUnit {
        /// Source sector.
        sector: SectorId,
        /// Player attempting the move.
        player: PlayerId,
    },
    /// The player has no actions left this turn.
    #[error("player {0} has no actions remaining")]
    NoActionsRemaining(PlayerId),
    /// The target sector is not reachable from the source.
    #[error("sector {to} is not reachable from sector {from}")]
    Unreachable {
        /// Source sector.
        from: SectorId,
        /// Target sector.
        to: SectorId,
    },
    /// The unit is prevented from moving.
    #[error("unit {0} cannot move")]
    UnitCannotMove(UnitId),
    /// The unit was already destroyed.
    #[error("unit {0} is already destroyed")]
    UnitDestroyed(UnitId),
    /// Every other player is eliminated.
    #[error("no non-eliminated player remains to take the turn")]
    NoRemainingPlayers,
    /// No minigame diversion is in progress.
    #[error("no minigame is in progress")]
    NotDiverted,
    /// Unknown sector id.
    #[error("unknown sector {0}")]
    UnknownSector(SectorId),
    /// Unknown unit id.
    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),
    /// Unknown player id.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    /// A snapshot does not match the live game's shape.
    #[error("snapshot mismatch: {0}")]
    SnapshotMismatch(String),
}

/// Top-level error for game operations.
#[derive(Debug, Error)]
pub enum GameError {
    /// Effect attach/remove failure.
    #[error(transparent)]
    Effect(#[from] EffectError),
    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Illegal operation.
    #[error(transparent)]
    Invalid(#[from] InvalidOperation),
    /// Snapshot (de)serialization failure.
    #[error("snapshot encoding: {0}")]
    Encoding(#[from] serde_json::Error),
    /// Snapshot or config file I/O failure.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;
