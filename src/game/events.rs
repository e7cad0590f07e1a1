//! Domain events and the subscriber list.

use std::fmt;

use serde::Serialize;

use crate::effect::{EffectKind, EffectOwner, Resource};
use crate::game::{PlayerId, SectorId, UnitId};

/// Something that happened in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// A player's turn began.
    TurnStarted {
        /// Active player.
        player: PlayerId,
    },
    /// A player's turn ended.
    TurnEnded {
        /// Player whose turn ended.
        player: PlayerId,
    },
    /// A player spent an action.
    ActionPerformed {
        /// Acting player.
        player: PlayerId,
        /// Actions left this turn.
        remaining: u32,
    },
    /// A player has been eliminated.
    PlayerEliminated {
        /// Eliminated player.
        player: PlayerId,
        /// Player responsible, if any.
        eliminator: Option<PlayerId>,
    },
    /// A sector changed owner.
    SectorCaptured {
        /// Captured sector.
        sector: SectorId,
        /// Previous owner.
        old_owner: Option<PlayerId>,
        /// New owner.
        new_owner: Option<PlayerId>,
    },
    /// A unit moved between sectors.
    UnitMoved {
        /// Moving unit.
        unit: UnitId,
        /// Source sector.
        from: SectorId,
        /// Destination sector.
        to: SectorId,
    },
    /// A unit was destroyed.
    UnitDied {
        /// Destroyed unit.
        unit: UnitId,
        /// Its owner at the time of death.
        owner: Option<PlayerId>,
        /// Sector it died in.
        sector: SectorId,
        /// Player responsible, if any.
        eliminator: Option<PlayerId>,
    },
    /// A unit survived an attack.
    UnitAttacked {
        /// Defending unit.
        unit: UnitId,
        /// Sector it stands in.
        sector: SectorId,
        /// Attacking player.
        attacker: PlayerId,
        /// Levels lost.
        damage: i32,
    },
    /// A unit was spawned at a landmark.
    UnitSpawned {
        /// New unit.
        unit: UnitId,
        /// Spawn sector.
        sector: SectorId,
        /// Owning player.
        owner: PlayerId,
    },
    /// A timed effect wore off.
    EffectExpired {
        /// Owner the effect was attached to.
        owner: EffectOwner,
        /// Kind of the expired effect.
        kind: EffectKind,
    },
    /// An elimination notice is waiting for acknowledgement.
    EliminationNotice {
        /// Eliminated player.
        player: PlayerId,
        /// Player responsible, if any.
        eliminator: Option<PlayerId>,
    },
    /// The game diverted into the bonus minigame.
    MinigameRequested {
        /// Player who captured the bonus objective.
        player: PlayerId,
    },
    /// The game resumed after the bonus minigame.
    MinigameCompleted {
        /// Rewarded player.
        player: PlayerId,
        /// Reward granted.
        reward: Resource,
    },
    /// Only one player remains.
    GameWon {
        /// The winner.
        winner: PlayerId,
    },
}

/// Handle returned by [`EventBus::subscribe`].
pub type SubscriptionId = u64;

type Subscriber = Box<dyn FnMut(&GameEvent)>;

/// External observers of game events, called in registration order.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: SubscriptionId,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Register an observer.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Deliver an event to every observer.
    pub fn publish(&mut self, event: &GameEvent) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(event);
        }
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
