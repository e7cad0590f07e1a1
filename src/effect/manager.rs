//! Per-owner effect aggregation.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::effect::kind::Reaction;
use crate::effect::{
    BASE_ACTIONS, BASE_ATTACK, BASE_DEFENCE, BASE_LEVEL_CAP, BASE_MOVE_RANGE, Effect,
    EffectCommand, EffectFilter, EffectOwner, EffectScope, Stats,
};
use crate::error::EffectError;
use crate::game::{GameEvent, PlayerId};

/// Identity of an effect within one manager. Never reused.
pub type EffectId = u64;

/// Holds the effects attached to one player, sector or unit.
///
/// Effects are keyed by a monotonically increasing id, so iteration order is
/// application order. Hooks run by `apply`, `remove` and `dispatch` push
/// their requests into an outbox drained with [`EffectManager::take_commands`].
#[derive(Debug, Clone)]
pub struct EffectManager {
    owner: EffectOwner,
    effects: BTreeMap<EffectId, Effect>,
    next_id: EffectId,
    active: bool,
    outbox: Vec<EffectCommand>,
}

impl EffectManager {
    /// Create an empty, active manager.
    #[must_use]
    pub const fn new(owner: EffectOwner) -> Self {
        Self {
            owner,
            effects: BTreeMap::new(),
            next_id: 0,
            active: true,
            outbox: Vec::new(),
        }
    }

    /// Rebuild a manager from persisted effects without running apply hooks.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::UnsupportedOwner`] if an effect cannot be
    /// attached to `owner`.
    pub fn restored(
        owner: EffectOwner,
        effects: impl IntoIterator<Item = Effect>,
    ) -> Result<Self, EffectError> {
        let mut manager = Self::new(owner);
        for effect in effects {
            manager.restore(effect)?;
        }
        Ok(manager)
    }

    /// The object this manager belongs to.
    #[must_use]
    pub const fn owner(&self) -> EffectOwner {
        self.owner
    }

    /// Whether the manager still receives events.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    fn scope(&self, controller: Option<PlayerId>) -> EffectScope {
        EffectScope {
            owner: self.owner,
            controller,
        }
    }

    fn check_owner(&self, effect: &Effect) -> Result<(), EffectError> {
        let wanted = effect.kind().owner_kind();
        if wanted == self.owner.kind() {
            Ok(())
        } else {
            Err(EffectError::UnsupportedOwner {
                effect: effect.kind().name(),
                owner: self.owner.kind(),
            })
        }
    }

    fn attach(&mut self, effect: Effect) -> EffectId {
        let id = self.next_id;
        self.next_id += 1;
        self.effects.insert(id, effect);
        id
    }

    /// Attach a fresh effect and run its apply hook.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::UnsupportedOwner`] if the effect kind cannot be
    /// attached to this manager's owner.
    pub fn apply(&mut self, effect: Effect) -> Result<EffectId, EffectError> {
        self.check_owner(&effect)?;
        effect.on_apply(self.scope(None), &mut self.outbox);
        let id = self.attach(effect);
        debug!(owner = ?self.owner, id, kind = effect.kind().name(), "effect applied");
        Ok(id)
    }

    /// Re-attach a persisted effect. One-time apply side effects are not
    /// repeated.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::UnsupportedOwner`] if the effect kind cannot be
    /// attached to this manager's owner.
    pub fn restore(&mut self, effect: Effect) -> Result<EffectId, EffectError> {
        self.check_owner(&effect)?;
        let id = self.attach(effect);
        debug!(owner = ?self.owner, id, kind = effect.kind().name(), "effect restored");
        Ok(id)
    }

    /// Detach an effect and run its removal hook.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::NotAttached`] if no effect with this id is
    /// currently attached.
    pub fn remove(&mut self, id: EffectId) -> Result<Effect, EffectError> {
        self.detach(id).ok_or(EffectError::NotAttached(id))
    }

    fn detach(&mut self, id: EffectId) -> Option<Effect> {
        let effect = self.effects.remove(&id)?;
        effect.on_remove(self.scope(None), &mut self.outbox);
        debug!(owner = ?self.owner, id, kind = effect.kind().name(), "effect removed");
        Some(effect)
    }

    fn detach_all(&mut self, ids: Vec<EffectId>) -> usize {
        let mut removed = 0;
        for id in ids {
            if self.detach(id).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Remove every effect selected by `filter`. Returns how many were
    /// removed; zero matches is not an error.
    pub fn remove_matching(&mut self, filter: impl Into<EffectFilter>) -> usize {
        let filter = filter.into();
        let ids: Vec<EffectId> = self
            .effects
            .iter()
            .filter(|(_, effect)| filter.matches(effect))
            .map(|(id, _)| *id)
            .collect();
        self.detach_all(ids)
    }

    /// Remove every effect.
    pub fn remove_all(&mut self) -> usize {
        let ids: Vec<EffectId> = self.effects.keys().copied().collect();
        self.detach_all(ids)
    }

    /// Remove every effect and stop receiving events.
    pub fn teardown(&mut self) {
        self.remove_all();
        self.active = false;
    }

    /// Whether any attached effect is selected by `filter`.
    #[must_use]
    pub fn has(&self, filter: impl Into<EffectFilter>) -> bool {
        let filter = filter.into();
        self.effects.values().any(|effect| filter.matches(effect))
    }

    /// Attached effects selected by `filter`, in application order.
    pub fn effects_of(
        &self,
        filter: impl Into<EffectFilter>,
    ) -> impl Iterator<Item = (EffectId, &Effect)> {
        let filter = filter.into();
        self.iter().filter(move |(_, effect)| filter.matches(effect))
    }

    /// Look up an attached effect.
    #[must_use]
    pub fn get(&self, id: EffectId) -> Option<&Effect> {
        self.effects.get(&id)
    }

    /// All attached effects in application order.
    pub fn iter(&self) -> impl Iterator<Item = (EffectId, &Effect)> {
        self.effects.iter().map(|(id, effect)| (*id, effect))
    }

    /// Number of attached effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether no effect is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Persistent form: the attached effects in application order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Effect> {
        self.effects.values().copied().collect()
    }

    fn sum(&self, base: i32, contribution: fn(&Effect) -> Option<i32>) -> i32 {
        base + self.effects.values().filter_map(contribution).sum::<i32>()
    }

    fn all(&self, contribution: fn(&Effect) -> Option<bool>) -> bool {
        all_of(self.effects.values().map(contribution))
    }

    /// Attack bonus.
    #[must_use]
    pub fn attack(&self) -> i32 {
        self.sum(BASE_ATTACK, Effect::attack_bonus)
    }

    /// Defence bonus.
    #[must_use]
    pub fn defence(&self) -> i32 {
        self.sum(BASE_DEFENCE, Effect::defence_bonus)
    }

    /// Actions per turn.
    #[must_use]
    pub fn actions(&self) -> i32 {
        self.sum(BASE_ACTIONS, Effect::action_bonus)
    }

    /// Move range in hops.
    #[must_use]
    pub fn move_range(&self) -> i32 {
        self.sum(BASE_MOVE_RANGE, Effect::move_range_bonus)
    }

    /// Unit level cap.
    #[must_use]
    pub fn level_cap(&self) -> i32 {
        self.sum(BASE_LEVEL_CAP, Effect::level_cap_bonus)
    }

    /// False as soon as any effect blocks entry.
    #[must_use]
    pub fn traversable(&self) -> bool {
        self.all(Effect::traversable)
    }

    /// False as soon as any effect blocks movement.
    #[must_use]
    pub fn can_move(&self) -> bool {
        self.all(Effect::can_move)
    }

    /// Every derived stat at once.
    #[must_use]
    pub fn stats(&self) -> Stats {
        Stats {
            attack: self.attack(),
            defence: self.defence(),
            actions: self.actions(),
            move_range: self.move_range(),
            level_cap: self.level_cap(),
            traversable: self.traversable(),
            can_move: self.can_move(),
        }
    }

    /// Fan an event out to every attached effect in application order.
    ///
    /// Effects asking to be removed are detached once every effect has seen
    /// the event.
    pub fn dispatch(&mut self, controller: Option<PlayerId>, event: &GameEvent) {
        if !self.active || self.effects.is_empty() {
            return;
        }
        trace!(owner = ?self.owner, ?event, "dispatching");

        let scope = self.scope(controller);
        let mut expired = Vec::new();
        for (id, effect) in &mut self.effects {
            if effect.react(scope, event, &mut self.outbox) == Reaction::Remove {
                expired.push(*id);
            }
        }
        self.detach_all(expired);
    }

    /// Drain the commands queued by hooks.
    pub fn take_commands(&mut self) -> Vec<EffectCommand> {
        std::mem::take(&mut self.outbox)
    }

    /// Whether hooks queued commands not yet drained.
    #[must_use]
    pub fn has_commands(&self) -> bool {
        !self.outbox.is_empty()
    }
}

/// AND over the contributions present; `true` with none. A single `false`
/// wins regardless of order.
fn all_of(contributions: impl IntoIterator<Item = Option<bool>>) -> bool {
    contributions.into_iter().flatten().all(|value| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{EffectKind, Resource};

    fn player_manager() -> EffectManager {
        EffectManager::new(EffectOwner::Player(0))
    }

    fn attack(amount: i32) -> Effect {
        Effect::MinigameReward {
            resource: Resource::Attack,
            amount,
        }
    }

    #[test]
    fn test_base_stats() {
        let manager = player_manager();
        assert_eq!(manager.stats(), Stats::default());
        assert_eq!(manager.attack(), 0);
        assert_eq!(manager.actions(), 2);
        assert_eq!(manager.move_range(), 1);
        assert_eq!(manager.level_cap(), 5);
    }

    #[test]
    fn test_summing_reducer() {
        let mut manager = player_manager();
        manager.apply(attack(2)).unwrap();
        manager.apply(attack(3)).unwrap();
        manager
            .apply(Effect::ExtraActions {
                amount: 1,
                turns: 2,
            })
            .unwrap();
        manager.apply(Effect::LevelCapBoost { amount: 2 }).unwrap();

        assert_eq!(manager.attack(), 5);
        assert_eq!(manager.defence(), 0);
        assert_eq!(manager.actions(), 3);
        assert_eq!(manager.level_cap(), 7);
    }

    #[test]
    fn test_and_reducer_false_dominates() {
        let mut manager = EffectManager::new(EffectOwner::Sector(1));
        assert!(manager.traversable());

        let first = manager.apply(Effect::Flooded { turns: 2 }).unwrap();
        manager.apply(Effect::Ambush { damage: 1 }).unwrap();
        assert!(!manager.traversable());

        let second = manager.apply(Effect::Flooded { turns: 5 }).unwrap();
        manager.remove(first).unwrap();
        assert!(!manager.traversable());

        manager.remove(second).unwrap();
        assert!(manager.traversable());
    }

    #[test]
    fn test_all_of_false_dominates_later_true() {
        let nothing: [Option<bool>; 0] = [];
        assert!(all_of(nothing));
        assert!(all_of([None, Some(true), None]));
        assert!(!all_of([Some(false), Some(true)]));
        assert!(!all_of([Some(true), None, Some(false), Some(true)]));
        assert!(!all_of([None, Some(false)]));
    }

    #[test]
    fn test_ids_are_sequential_and_never_reused() {
        let mut manager = player_manager();
        let ids: Vec<_> = (0..4).map(|i| manager.apply(attack(i)).unwrap()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);

        manager.remove(1).unwrap();
        let next = manager.apply(attack(9)).unwrap();
        assert_eq!(next, 4);
    }

    #[test]
    fn test_remove_missing_fails() {
        let mut manager = player_manager();
        assert_eq!(manager.remove(0), Err(EffectError::NotAttached(0)));

        let id = manager.apply(attack(1)).unwrap();
        manager.remove(id).unwrap();
        assert_eq!(manager.remove(id), Err(EffectError::NotAttached(id)));
    }

    #[test]
    fn test_remove_matching() {
        let mut manager = player_manager();
        assert_eq!(manager.remove_matching(EffectKind::Bounty), 0);

        manager.apply(attack(1)).unwrap();
        manager
            .apply(Effect::LandmarkBonus {
                sector: 2,
                resource: Resource::Defence,
                amount: 1,
            })
            .unwrap();
        manager.apply(Effect::ForcedMarch { amount: 1 }).unwrap();

        assert!(manager.has(EffectFilter::ResourceBonus));
        assert_eq!(manager.effects_of(EffectFilter::ResourceBonus).count(), 2);
        assert_eq!(manager.remove_matching(EffectFilter::ResourceBonus), 2);
        assert!(!manager.has(EffectFilter::ResourceBonus));
        assert_eq!(manager.len(), 1);

        assert_eq!(manager.remove_all(), 1);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_unsupported_owner() {
        let mut manager = player_manager();
        let err = manager.apply(Effect::Frozen { turns: 1 }).unwrap_err();
        assert_eq!(
            err,
            EffectError::UnsupportedOwner {
                effect: "frozen",
                owner: crate::effect::OwnerKind::Player,
            }
        );
        assert!(manager.restore(Effect::BonusObjective).is_err());
    }

    #[test]
    fn test_restore_skips_apply_hook() {
        let mut applied = EffectManager::new(EffectOwner::Unit(3));
        applied.apply(Effect::Reinforcements { levels: 2 }).unwrap();
        assert_eq!(applied.take_commands().len(), 1);

        let restored = EffectManager::restored(EffectOwner::Unit(3), applied.snapshot()).unwrap();
        assert!(!restored.has_commands());
        assert_eq!(restored.len(), 1);
    }

    #[test]
    fn test_self_removal_during_dispatch() {
        let mut manager = player_manager();
        manager.apply(Effect::ForcedMarch { amount: 1 }).unwrap();
        manager.apply(attack(1)).unwrap();
        manager
            .apply(Effect::Bounty { amount: 1 })
            .unwrap();
        manager.apply(Effect::ForcedMarch { amount: 2 }).unwrap();

        manager.dispatch(Some(0), &GameEvent::TurnEnded { player: 0 });

        let kinds: Vec<_> = manager.iter().map(|(_, e)| e.kind()).collect();
        assert_eq!(kinds, vec![EffectKind::MinigameReward]);
        // Three timed effects expired, each with a notification.
        assert_eq!(manager.take_commands().len(), 3);
    }

    #[test]
    fn test_teardown_stops_dispatch() {
        let mut manager = player_manager();
        manager.apply(Effect::ForcedMarch { amount: 1 }).unwrap();
        manager.teardown();
        assert!(!manager.is_active());
        assert!(manager.is_empty());

        manager.take_commands();
        manager.dispatch(Some(0), &GameEvent::TurnEnded { player: 0 });
        assert!(!manager.has_commands());
    }
}
