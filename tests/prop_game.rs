//! Property-based tests for game mechanics.
//!
//! These tests verify properties of the effect reducers and combat.
//! Run with: cargo test --release prop_game

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use conquest::effect::{
    BASE_ACTIONS, BASE_ATTACK, BASE_DEFENCE, BASE_LEVEL_CAP, BASE_MOVE_RANGE, Effect,
    EffectFilter, EffectKind, EffectManager, EffectOwner, Resource,
};
use conquest::game::combat::{self, Combatant, Victor};

fn resource() -> impl Strategy<Value = Resource> {
    prop_oneof![Just(Resource::Attack), Just(Resource::Defence)]
}

/// Player-scoped effects with a stat contribution.
fn player_effect() -> impl Strategy<Value = Effect> {
    prop_oneof![
        (0u16..50, resource(), -5i32..10).prop_map(|(sector, resource, amount)| {
            Effect::LandmarkBonus {
                sector,
                resource,
                amount,
            }
        }),
        (resource(), 0i32..5).prop_map(|(resource, amount)| Effect::MinigameReward {
            resource,
            amount
        }),
        (0i32..4, 1u32..5).prop_map(|(amount, turns)| Effect::ExtraActions { amount, turns }),
        (0i32..3).prop_map(|amount| Effect::ForcedMarch { amount }),
        (0i32..4).prop_map(|amount| Effect::LevelCapBoost { amount }),
    ]
}

fn combatant() -> impl Strategy<Value = Combatant> {
    (1i32..20, -5i32..10, -5i32..10).prop_map(|(level, attack, defence)| Combatant {
        level,
        attack,
        defence,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Additive stats are the base plus the sum of every contribution.
    #[test]
    fn prop_sum_reducer(effects in prop::collection::vec(player_effect(), 0..20)) {
        let mut manager = EffectManager::new(EffectOwner::Player(0));
        let (mut attack, mut defence, mut actions) = (BASE_ATTACK, BASE_DEFENCE, BASE_ACTIONS);
        let (mut move_range, mut level_cap) = (BASE_MOVE_RANGE, BASE_LEVEL_CAP);
        for effect in &effects {
            manager.apply(*effect).unwrap();
            match *effect {
                Effect::LandmarkBonus { resource, amount, .. }
                | Effect::MinigameReward { resource, amount } => match resource {
                    Resource::Attack => attack += amount,
                    Resource::Defence => defence += amount,
                },
                Effect::ExtraActions { amount, .. } => actions += amount,
                Effect::ForcedMarch { amount } => move_range += amount,
                Effect::LevelCapBoost { amount } => level_cap += amount,
                _ => {}
            }
        }

        prop_assert_eq!(manager.attack(), attack);
        prop_assert_eq!(manager.defence(), defence);
        prop_assert_eq!(manager.actions(), actions);
        prop_assert_eq!(manager.move_range(), move_range);
        prop_assert_eq!(manager.level_cap(), level_cap);
        prop_assert_eq!(manager.len(), effects.len());
        // Booleans are untouched by additive effects.
        prop_assert!(manager.traversable() && manager.can_move());
    }

    /// Boolean stats are false as soon as one effect says so.
    #[test]
    fn prop_and_reducer(floods in prop::collection::vec(1u32..5, 0..6), ambushes in 0usize..4) {
        let mut manager = EffectManager::new(EffectOwner::Sector(3));
        for _ in 0..ambushes {
            manager.apply(Effect::Ambush { damage: 1 }).unwrap();
        }
        let ids: Vec<_> = floods
            .iter()
            .map(|&turns| manager.apply(Effect::Flooded { turns }).unwrap())
            .collect();
        prop_assert_eq!(manager.traversable(), floods.is_empty());

        for id in ids {
            manager.remove(id).unwrap();
        }
        prop_assert!(manager.traversable());
    }

    /// A unit can move only while no effect freezes it, whatever else is
    /// attached and in whatever order.
    #[test]
    fn prop_can_move_reducer(
        frozen in prop::collection::vec(1u32..5, 0..6),
        boosts in prop::collection::vec(1i32..4, 0..4),
        frozen_first in any::<bool>()
    ) {
        let mut manager = EffectManager::new(EffectOwner::Unit(7));
        let mut ids = Vec::new();
        if frozen_first {
            for &turns in &frozen {
                ids.push(manager.apply(Effect::Frozen { turns }).unwrap());
            }
        }
        for &levels in &boosts {
            manager.apply(Effect::Reinforcements { levels }).unwrap();
        }
        if !frozen_first {
            for &turns in &frozen {
                ids.push(manager.apply(Effect::Frozen { turns }).unwrap());
            }
        }
        prop_assert_eq!(manager.can_move(), frozen.is_empty());
        prop_assert!(manager.traversable());

        while let Some(id) = ids.pop() {
            prop_assert!(!manager.can_move());
            manager.remove(id).unwrap();
        }
        prop_assert!(manager.can_move());
    }

    /// Effect ids are handed out in order and never reused.
    #[test]
    fn prop_effect_ids_never_reused(ops in prop::collection::vec(any::<bool>(), 1..50)) {
        let mut manager = EffectManager::new(EffectOwner::Player(1));
        let mut live = Vec::new();
        let mut last = None;
        for add in ops {
            if add || live.is_empty() {
                let id = manager.apply(Effect::LevelCapBoost { amount: 1 }).unwrap();
                prop_assert!(last.is_none_or(|prev| id > prev));
                last = Some(id);
                live.push(id);
            } else {
                let id = live.remove(0);
                manager.remove(id).unwrap();
                prop_assert!(manager.remove(id).is_err());
            }
        }
        prop_assert_eq!(manager.len(), live.len());
        prop_assert_eq!(manager.effects_of(EffectKind::LevelCapBoost).count(), live.len());
        prop_assert_eq!(
            manager.remove_matching(EffectFilter::Kind(EffectKind::LevelCapBoost)),
            live.len()
        );
        prop_assert!(manager.is_empty());
    }

    /// Damage follows ceil(0.08 * 2.5^(0.35x + 2)), never below one.
    #[test]
    fn prop_damage_formula(x in -10i32..40) {
        let expected = (0.08 * 2.5f64.powf(0.35 * f64::from(x.max(0)) + 2.0)).ceil();
        let got = combat::damage(x);
        prop_assert!((f64::from(got) - expected).abs() < f64::EPSILON);
        prop_assert!(got >= 1);
        prop_assert!(combat::damage(x + 1) >= got);
    }

    /// The uncertainty band stays within [0.1, 0.5].
    #[test]
    fn prop_uncertainty_bounds(diff in -100i32..100) {
        let u = combat::uncertainty(diff);
        prop_assert!((0.1..=0.5).contains(&u));
        prop_assert!((u - combat::uncertainty(-diff)).abs() < f64::EPSILON);
    }

    /// The roll never decides a fight: only the sign of the skill gap does.
    #[test]
    fn prop_victor_ignores_roll(
        attacker in combatant(),
        defender in combatant(),
        seed in any::<u64>()
    ) {
        let outcome = combat::resolve(attacker, defender, &mut StdRng::seed_from_u64(seed));
        let expected = if combat::skill_diff(attacker, defender) >= 0 {
            Victor::Attacker
        } else {
            Victor::Defender
        };
        prop_assert_eq!(outcome.victor, expected);
        prop_assert_eq!(outcome.contested, outcome.roll < outcome.uncertainty);
        prop_assert_eq!(
            outcome.damage,
            combat::damage(attacker.total_attack() - defender.total_defence())
        );
    }

    /// Same seed, same outcome.
    #[test]
    fn prop_combat_deterministic(
        attacker in combatant(),
        defender in combatant(),
        seed in any::<u64>()
    ) {
        let a = combat::resolve(attacker, defender, &mut StdRng::seed_from_u64(seed));
        let b = combat::resolve(attacker, defender, &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(a, b);
    }
}
