#![no_main]

//! Full game turn fuzzer.
//!
//! Drives a small game with arbitrary player input and checks the state
//! invariants after every command:
//! 1. Sector clicks and direct moves, legal or not
//! 2. Turn ends and clock ticks (AI moves, elimination processing)
//! 3. Notice acknowledgements and minigame completion
//!
//! Rejected input must leave the game consistent.

use std::time::Duration;

use arbitrary::Arbitrary;
use conquest::effect::Resource;
use conquest::game::{Color, check_invariants};
use conquest::{Game, GameConfig, MapConfig, PlayerKind, PlayerSpec};
use libfuzzer_sys::fuzz_target;

/// A fuzzer-generated command.
#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzCommand {
    /// Click a sector.
    Click { sector: u8 },
    /// Move straight from one sector to another.
    Move { from: u8, to: u8 },
    /// End the current turn.
    EndTurn,
    /// Advance the clock.
    Tick { ms: u16 },
    /// Dismiss the elimination notice.
    Acknowledge,
    /// Finish the minigame.
    CompleteMinigame { attack: bool },
}

/// Structured input for full game turn fuzzing.
#[derive(Arbitrary, Debug)]
struct GameTurnInput {
    /// Which seats are AI-controlled.
    ai_seats: [bool; 4],
    /// Number of players, 2..=4.
    players: u8,
    /// Game seed.
    seed: u64,
    /// Player input.
    commands: Vec<FuzzCommand>,
}

fuzz_target!(|input: GameTurnInput| {
    let players = usize::from(input.players % 3 + 2);
    let config = GameConfig {
        players: (0..players)
            .map(|i| PlayerSpec {
                kind: if input.ai_seats[i] {
                    PlayerKind::Ai
                } else {
                    PlayerKind::Human
                },
                color: Color::PALETTE[i],
            })
            .collect(),
        map: MapConfig {
            width: 4,
            height: 4,
            landmarks: 5,
            seed: None,
        },
        ai_move_delay_ms: 10,
        ..GameConfig::default()
    };
    let Ok(mut game) = Game::new(config, input.seed) else {
        return;
    };
    let sectors = game.map().len();

    let violations = check_invariants(&game);
    assert!(violations.is_empty(), "invariants violated at start: {violations:?}");

    for (step, cmd) in input.commands.iter().take(200).enumerate() {
        let sector = |s: u8| u16::from(s) % u16::try_from(sectors).unwrap_or(u16::MAX);
        let _ = match *cmd {
            FuzzCommand::Click { sector: s } => game.sector_clicked(sector(s)),
            FuzzCommand::Move { from, to } => game.attempt_move(sector(from), sector(to)),
            FuzzCommand::EndTurn => game.end_turn_now(),
            FuzzCommand::Tick { ms } => game.tick(Duration::from_millis(u64::from(ms))),
            FuzzCommand::Acknowledge => {
                game.acknowledge_notice();
                Ok(())
            }
            FuzzCommand::CompleteMinigame { attack } => game.complete_minigame(if attack {
                Resource::Attack
            } else {
                Resource::Defence
            }),
        };

        let violations = check_invariants(&game);
        assert!(
            violations.is_empty(),
            "invariants violated after step {step} ({cmd:?}): {violations:?}"
        );
        if game.is_over() {
            assert!(game.winner().is_some());
            break;
        }
    }
});
