//! Concrete effect kinds.
//!
//! [`Effect`] is a tagged union: every stat contribution and every event hook
//! is a plain function matched over the variant. Only the persistent fields
//! live in the variant, so an effect serializes as-is into a snapshot.

use serde::{Deserialize, Serialize};

use crate::effect::{EffectCommand, EffectOwner, EffectScope, OwnerKind};
use crate::game::{GameEvent, PlayerId, SectorId};

/// Resource kind granted by landmarks and minigame rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Raises the attack stat.
    Attack,
    /// Raises the defence stat.
    Defence,
}

/// A modifier attached to exactly one effect manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// Bonus granted to the owner of a landmarked sector.
    LandmarkBonus {
        /// Sector holding the landmark.
        sector: SectorId,
        /// Stat raised.
        resource: Resource,
        /// Bonus amount.
        amount: i32,
    },
    /// Permanent reward for winning the bonus minigame.
    MinigameReward {
        /// Stat raised.
        resource: Resource,
        /// Bonus amount.
        amount: i32,
    },
    /// Extra actions for the next `turns` turns of the owner.
    ExtraActions {
        /// Actions added per turn.
        amount: i32,
        /// Turn starts left.
        turns: u32,
    },
    /// Longer moves until the end of the owner's turn.
    ForcedMarch {
        /// Extra hops.
        amount: i32,
    },
    /// Raises the unit level cap.
    LevelCapBoost {
        /// Extra levels.
        amount: i32,
    },
    /// Refunds actions for every unit the owner destroys this turn.
    Bounty {
        /// Actions refunded per kill.
        amount: u32,
    },
    /// The unit cannot move for `turns` of its owner's turns.
    Frozen {
        /// Turn ends left.
        turns: u32,
    },
    /// One-time level gain for a unit.
    Reinforcements {
        /// Levels gained on apply.
        levels: i32,
    },
    /// The sector cannot be entered for `turns` turn ends.
    Flooded {
        /// Turn ends left.
        turns: u32,
    },
    /// The next unit entering the sector loses levels.
    Ambush {
        /// Levels lost.
        damage: i32,
    },
    /// Carried by a landmarked sector; moves [`Effect::LandmarkBonus`] to
    /// whoever captures it.
    LandmarkBeacon {
        /// Stat raised for the owner.
        resource: Resource,
        /// Bonus amount.
        amount: i32,
    },
    /// The rotating bonus objective.
    BonusObjective,
}

/// Discriminant of [`Effect`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// [`Effect::LandmarkBonus`].
    LandmarkBonus,
    /// [`Effect::MinigameReward`].
    MinigameReward,
    /// [`Effect::ExtraActions`].
    ExtraActions,
    /// [`Effect::ForcedMarch`].
    ForcedMarch,
    /// [`Effect::LevelCapBoost`].
    LevelCapBoost,
    /// [`Effect::Bounty`].
    Bounty,
    /// [`Effect::Frozen`].
    Frozen,
    /// [`Effect::Reinforcements`].
    Reinforcements,
    /// [`Effect::Flooded`].
    Flooded,
    /// [`Effect::Ambush`].
    Ambush,
    /// [`Effect::LandmarkBeacon`].
    LandmarkBeacon,
    /// [`Effect::BonusObjective`].
    BonusObjective,
}

impl EffectKind {
    /// Snake-case name of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::LandmarkBonus => "landmark_bonus",
            Self::MinigameReward => "minigame_reward",
            Self::ExtraActions => "extra_actions",
            Self::ForcedMarch => "forced_march",
            Self::LevelCapBoost => "level_cap_boost",
            Self::Bounty => "bounty",
            Self::Frozen => "frozen",
            Self::Reinforcements => "reinforcements",
            Self::Flooded => "flooded",
            Self::Ambush => "ambush",
            Self::LandmarkBeacon => "landmark_beacon",
            Self::BonusObjective => "bonus_objective",
        }
    }

    /// The only owner kind this effect may be attached to.
    #[must_use]
    pub const fn owner_kind(self) -> OwnerKind {
        match self {
            Self::LandmarkBonus
            | Self::MinigameReward
            | Self::ExtraActions
            | Self::ForcedMarch
            | Self::LevelCapBoost
            | Self::Bounty => OwnerKind::Player,
            Self::Frozen | Self::Reinforcements => OwnerKind::Unit,
            Self::Flooded | Self::Ambush | Self::LandmarkBeacon | Self::BonusObjective => {
                OwnerKind::Sector
            }
        }
    }

    /// Whether effects of this kind expire on their own.
    #[must_use]
    pub const fn is_timed(self) -> bool {
        matches!(
            self,
            Self::ExtraActions
                | Self::ForcedMarch
                | Self::Bounty
                | Self::Frozen
                | Self::Reinforcements
                | Self::Flooded
        )
    }
}

/// Selects effects by kind or family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectFilter {
    /// Exactly this kind.
    Kind(EffectKind),
    /// Landmark bonuses and minigame rewards.
    ResourceBonus,
    /// Every kind that expires on its own.
    Timed,
    /// The landmark bonus granted by one sector.
    LandmarkOf(SectorId),
}

impl EffectFilter {
    /// Whether `effect` is selected.
    #[must_use]
    pub fn matches(self, effect: &Effect) -> bool {
        match self {
            Self::Kind(kind) => effect.kind() == kind,
            Self::ResourceBonus => matches!(
                effect,
                Effect::LandmarkBonus { .. } | Effect::MinigameReward { .. }
            ),
            Self::Timed => effect.kind().is_timed(),
            Self::LandmarkOf(id) => {
                matches!(effect, Effect::LandmarkBonus { sector, .. } if *sector == id)
            }
        }
    }
}

impl From<EffectKind> for EffectFilter {
    fn from(kind: EffectKind) -> Self {
        Self::Kind(kind)
    }
}

/// What an effect wants after reacting to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reaction {
    /// Stay attached.
    Keep,
    /// Detach and run the removal hook.
    Remove,
}

/// Decrement a turn counter, asking for removal once it runs out.
fn count_down(turns: &mut u32) -> Reaction {
    *turns = turns.saturating_sub(1);
    if *turns == 0 {
        Reaction::Remove
    } else {
        Reaction::Keep
    }
}

impl Effect {
    /// Discriminant of this effect.
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        match self {
            Self::LandmarkBonus { .. } => EffectKind::LandmarkBonus,
            Self::MinigameReward { .. } => EffectKind::MinigameReward,
            Self::ExtraActions { .. } => EffectKind::ExtraActions,
            Self::ForcedMarch { .. } => EffectKind::ForcedMarch,
            Self::LevelCapBoost { .. } => EffectKind::LevelCapBoost,
            Self::Bounty { .. } => EffectKind::Bounty,
            Self::Frozen { .. } => EffectKind::Frozen,
            Self::Reinforcements { .. } => EffectKind::Reinforcements,
            Self::Flooded { .. } => EffectKind::Flooded,
            Self::Ambush { .. } => EffectKind::Ambush,
            Self::LandmarkBeacon { .. } => EffectKind::LandmarkBeacon,
            Self::BonusObjective => EffectKind::BonusObjective,
        }
    }

    fn resource_bonus(&self, wanted: Resource) -> Option<i32> {
        match *self {
            Self::LandmarkBonus {
                resource, amount, ..
            }
            | Self::MinigameReward { resource, amount } if resource == wanted => Some(amount),
            _ => None,
        }
    }

    /// Contribution to the attack stat.
    #[must_use]
    pub fn attack_bonus(&self) -> Option<i32> {
        self.resource_bonus(Resource::Attack)
    }

    /// Contribution to the defence stat.
    #[must_use]
    pub fn defence_bonus(&self) -> Option<i32> {
        self.resource_bonus(Resource::Defence)
    }

    /// Contribution to the actions stat.
    #[must_use]
    pub const fn action_bonus(&self) -> Option<i32> {
        match *self {
            Self::ExtraActions { amount, .. } => Some(amount),
            _ => None,
        }
    }

    /// Contribution to the move range stat.
    #[must_use]
    pub const fn move_range_bonus(&self) -> Option<i32> {
        match *self {
            Self::ForcedMarch { amount } => Some(amount),
            _ => None,
        }
    }

    /// Contribution to the level cap stat.
    #[must_use]
    pub const fn level_cap_bonus(&self) -> Option<i32> {
        match *self {
            Self::LevelCapBoost { amount } => Some(amount),
            _ => None,
        }
    }

    /// Contribution to the traversable flag.
    #[must_use]
    pub const fn traversable(&self) -> Option<bool> {
        match self {
            Self::Flooded { .. } => Some(false),
            _ => None,
        }
    }

    /// Contribution to the can-move flag.
    #[must_use]
    pub const fn can_move(&self) -> Option<bool> {
        match self {
            Self::Frozen { .. } => Some(false),
            _ => None,
        }
    }

    /// One-time side effects of a fresh attach. Never run on restore.
    pub(crate) fn on_apply(&self, scope: EffectScope, out: &mut Vec<EffectCommand>) {
        if let (Self::Reinforcements { levels }, EffectOwner::Unit(unit)) = (*self, scope.owner) {
            out.push(EffectCommand::AdjustUnitLevel {
                unit,
                delta: levels,
            });
        }
    }

    /// Runs after the effect has been detached.
    pub(crate) fn on_remove(&self, scope: EffectScope, out: &mut Vec<EffectCommand>) {
        if self.kind().is_timed() {
            out.push(EffectCommand::Notify(GameEvent::EffectExpired {
                owner: scope.owner,
                kind: self.kind(),
            }));
        }
    }

    /// React to a domain event.
    pub(crate) fn react(
        &mut self,
        scope: EffectScope,
        event: &GameEvent,
        out: &mut Vec<EffectCommand>,
    ) -> Reaction {
        let controlled_by = |player: PlayerId| scope.controller == Some(player);

        match self {
            Self::ExtraActions { turns, .. } => match *event {
                GameEvent::TurnStarted { player } if controlled_by(player) => count_down(turns),
                _ => Reaction::Keep,
            },
            Self::ForcedMarch { .. } | Self::Reinforcements { .. } => match *event {
                GameEvent::TurnEnded { player } if controlled_by(player) => Reaction::Remove,
                _ => Reaction::Keep,
            },
            Self::Bounty { amount } => match *event {
                GameEvent::UnitDied {
                    eliminator: Some(killer),
                    ..
                } if controlled_by(killer) => {
                    out.push(EffectCommand::GrantActions {
                        player: killer,
                        amount: *amount,
                    });
                    Reaction::Keep
                }
                GameEvent::TurnEnded { player } if controlled_by(player) => Reaction::Remove,
                _ => Reaction::Keep,
            },
            Self::Frozen { turns } => match *event {
                GameEvent::TurnEnded { player } if controlled_by(player) => count_down(turns),
                _ => Reaction::Keep,
            },
            Self::Flooded { turns } => match *event {
                GameEvent::TurnEnded { .. } => count_down(turns),
                _ => Reaction::Keep,
            },
            Self::Ambush { damage } => match *event {
                GameEvent::UnitMoved { unit, to, .. } if scope.owner == EffectOwner::Sector(to) => {
                    out.push(EffectCommand::AdjustUnitLevel {
                        unit,
                        delta: -*damage,
                    });
                    Reaction::Remove
                }
                _ => Reaction::Keep,
            },
            Self::LandmarkBeacon { resource, amount } => match *event {
                GameEvent::SectorCaptured {
                    sector,
                    old_owner,
                    new_owner,
                } if scope.owner == EffectOwner::Sector(sector) => {
                    if let Some(old) = old_owner {
                        out.push(EffectCommand::RemoveMatching {
                            target: EffectOwner::Player(old),
                            filter: EffectFilter::LandmarkOf(sector),
                        });
                    }
                    if let Some(new) = new_owner {
                        out.push(EffectCommand::Apply {
                            target: EffectOwner::Player(new),
                            effect: Self::LandmarkBonus {
                                sector,
                                resource: *resource,
                                amount: *amount,
                            },
                        });
                    }
                    Reaction::Keep
                }
                _ => Reaction::Keep,
            },
            Self::BonusObjective => match *event {
                GameEvent::SectorCaptured {
                    sector,
                    new_owner: Some(player),
                    ..
                } if scope.owner == EffectOwner::Sector(sector) => {
                    out.push(EffectCommand::StartMinigame { player });
                    Reaction::Remove
                }
                _ => Reaction::Keep,
            },
            Self::LandmarkBonus { .. } | Self::MinigameReward { .. } | Self::LevelCapBoost { .. } => {
                Reaction::Keep
            }
        }
    }
}
