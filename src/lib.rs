// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Conquest: the turn, effect and combat engine of a turn-based territory
//! game.
//!
//! Players take turns moving units across a map of sectors, capturing
//! territory and landmarks. Every stat is derived from stackable effects
//! attached to players, sectors and units.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Tournament Runner / CLI           │
//! ├─────────────────────────────────────┤
//! │   Game (turns, combat, elimination) │
//! ├─────────────────────────────────────┤
//! │   Effect engine (stats, reactions)  │
//! └─────────────────────────────────────┘
//! ```
//!
//! Everything runs on one thread. Long-running flows (AI autoplay, the
//! elimination pipeline) are cooperative tasks advanced by
//! [`Game::tick`].

pub mod config;
pub mod effect;
pub mod error;
pub mod game;
pub mod logging;
pub mod scheduler;
pub mod snapshot;
pub mod tournament;

pub use config::{AiStrategy, GameConfig, MapConfig, PlayerSpec};
pub use error::{ConfigError, EffectError, GameError, GameResult, InvalidOperation};
pub use snapshot::GameSnapshot;

// Re-export key game types at crate root for convenience
pub use game::{Game, GameEvent, Map, Player, PlayerId, PlayerKind, SectorId, UnitId};
