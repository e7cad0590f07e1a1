#![no_main]

//! Combat resolution fuzzer.
//!
//! Checks that the outcome never depends on the roll, that the uncertainty
//! band stays in range and that damage is always positive.

use arbitrary::Arbitrary;
use conquest::game::combat::{self, Combatant, Victor};
use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Structured input for combat fuzzing.
#[derive(Arbitrary, Debug)]
struct CombatInput {
    /// Attacking unit level.
    attacker_level: i32,
    /// Attacker owner's attack stat.
    attacker_attack: i32,
    /// Defending unit level.
    defender_level: i32,
    /// Defender owner's defence stat.
    defender_defence: i32,
    /// Seed for the roll.
    seed: u64,
}

fuzz_target!(|input: CombatInput| {
    let attacker = Combatant {
        level: input.attacker_level,
        attack: input.attacker_attack,
        defence: 0,
    };
    let defender = Combatant {
        level: input.defender_level,
        attack: 0,
        defence: input.defender_defence,
    };

    let outcome = combat::resolve(attacker, defender, &mut StdRng::seed_from_u64(input.seed));
    let again = combat::resolve(attacker, defender, &mut StdRng::seed_from_u64(input.seed));
    assert_eq!(outcome, again, "combat is not deterministic");

    assert!((0.1..=0.5).contains(&outcome.uncertainty));
    assert!((0.0..1.0).contains(&outcome.roll));
    assert_eq!(outcome.contested, outcome.roll < outcome.uncertainty);

    let expected = if outcome.diff >= 0 {
        Victor::Attacker
    } else {
        Victor::Defender
    };
    assert_eq!(outcome.victor, expected, "the roll changed the winner");
    assert!(outcome.damage >= 1);
});
