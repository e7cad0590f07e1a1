//! Player state management.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::effect::{Effect, EffectManager, EffectOwner};
use crate::error::EffectError;
use crate::game::UnitTemplate;

/// Unique identifier for a player: its index in the roster.
pub type PlayerId = u8;

/// Who decides a player's moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    /// Moves come from sector clicks.
    Human,
    /// Moves come from the autoplay task.
    Ai,
}

/// Display colour of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Default colours handed out in roster order.
    pub const PALETTE: [Self; 8] = [
        Self::rgb(0xe6, 0x19, 0x4b),
        Self::rgb(0x3c, 0xb4, 0x4b),
        Self::rgb(0x43, 0x63, 0xd8),
        Self::rgb(0xff, 0xe1, 0x19),
        Self::rgb(0xf5, 0x82, 0x31),
        Self::rgb(0x91, 0x1e, 0xb4),
        Self::rgb(0x46, 0xf0, 0xf0),
        Self::rgb(0xf0, 0x32, 0xe6),
    ];

    /// Build a colour from its channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Persisted form of a [`Player`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Human or AI.
    pub kind: PlayerKind,
    /// Roster index.
    pub id: PlayerId,
    /// Display colour.
    pub color: Color,
    /// Player-scoped effects.
    pub effects: Vec<Effect>,
    /// Actions left in the current turn.
    pub actions_remaining: u32,
}

/// State for a single player.
///
/// Elimination is not stored here; it is derived from the map with
/// [`Map::is_eliminated`](crate::game::Map::is_eliminated).
#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    kind: PlayerKind,
    color: Color,
    template: UnitTemplate,
    effects: EffectManager,
    actions_remaining: u32,
    active: bool,
}

impl Player {
    /// Create a player with no effects and an empty action budget.
    #[must_use]
    pub fn new(id: PlayerId, kind: PlayerKind, color: Color, template: UnitTemplate) -> Self {
        Self {
            id,
            kind,
            color,
            template,
            effects: EffectManager::new(EffectOwner::Player(id)),
            actions_remaining: 0,
            active: false,
        }
    }

    /// Unique identifier for this player.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Human or AI.
    #[must_use]
    pub const fn kind(&self) -> PlayerKind {
        self.kind
    }

    /// Whether the autoplay task drives this player.
    #[must_use]
    pub fn is_ai(&self) -> bool {
        self.kind == PlayerKind::Ai
    }

    /// Display colour.
    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Template for units spawned at this player's landmarks.
    #[must_use]
    pub const fn template(&self) -> UnitTemplate {
        self.template
    }

    /// Player-scoped effects.
    #[must_use]
    pub const fn effects(&self) -> &EffectManager {
        &self.effects
    }

    /// Mutable player-scoped effects.
    pub fn effects_mut(&mut self) -> &mut EffectManager {
        &mut self.effects
    }

    /// Actions left in the current turn.
    #[must_use]
    pub const fn actions_remaining(&self) -> u32 {
        self.actions_remaining
    }

    /// Whether the turn indicator is on this player.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Reset the action budget to the effective actions stat.
    pub(crate) fn reset_actions(&mut self) -> u32 {
        self.actions_remaining = u32::try_from(self.effects.actions()).unwrap_or(0);
        self.actions_remaining
    }

    /// Spend one action. Returns the remaining budget, or `None` if none was
    /// left.
    pub(crate) fn spend_action(&mut self) -> Option<u32> {
        self.actions_remaining = self.actions_remaining.checked_sub(1)?;
        Some(self.actions_remaining)
    }

    pub(crate) fn grant_actions(&mut self, amount: u32) {
        self.actions_remaining = self.actions_remaining.saturating_add(amount);
    }

    /// Persisted form of this player.
    #[must_use]
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            kind: self.kind,
            id: self.id,
            color: self.color,
            effects: self.effects.snapshot(),
            actions_remaining: self.actions_remaining,
        }
    }

    /// Overwrite dynamic state from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if a persisted effect cannot be attached to a player.
    pub(crate) fn restore(&mut self, snapshot: &PlayerSnapshot) -> Result<(), EffectError> {
        self.kind = snapshot.kind;
        self.color = snapshot.color;
        self.effects =
            EffectManager::restored(EffectOwner::Player(self.id), snapshot.effects.iter().copied())?;
        self.actions_remaining = snapshot.actions_remaining;
        Ok(())
    }
}
