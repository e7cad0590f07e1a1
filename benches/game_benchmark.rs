//! Benchmarks for running complete games.
//!
//! This benchmarks the full headless game loop: AI moves, combat, effect
//! dispatch and the elimination pipeline.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use conquest::tournament::{generate_layout, run_game};
use conquest::{AiStrategy, Game, GameConfig, MapConfig};

fn headless(players: usize) -> GameConfig {
    GameConfig {
        ai_move_delay_ms: 0,
        ..GameConfig::with_ai_players(players)
    }
}

fn bench_single_game(c: &mut Criterion) {
    let config = headless(2);
    c.bench_function("single_game_2p", |b| {
        b.iter(|| black_box(run_game(black_box(42), black_box(&config))));
    });
}

fn bench_single_game_4p(c: &mut Criterion) {
    let config = headless(4);
    c.bench_function("single_game_4p", |b| {
        b.iter(|| black_box(run_game(black_box(42), black_box(&config))));
    });
}

fn bench_greedy_game(c: &mut Criterion) {
    let config = GameConfig {
        ai_strategy: AiStrategy::Greedy,
        ..headless(4)
    };
    c.bench_function("greedy_game_4p", |b| {
        b.iter(|| black_box(run_game(black_box(42), black_box(&config))));
    });
}

fn bench_game_batch(c: &mut Criterion) {
    // Sequential, without rayon overhead
    let config = headless(2);
    c.bench_function("10_games_sequential", |b| {
        b.iter(|| {
            for seed in 0..10u64 {
                let _ = black_box(run_game(black_box(seed), black_box(&config)));
            }
        });
    });
}

fn bench_setup(c: &mut Criterion) {
    let config = headless(4);
    c.bench_function("game_setup_4p", |b| {
        b.iter(|| black_box(Game::new(black_box(config.clone()), black_box(7)).unwrap()));
    });

    let map = MapConfig {
        width: 32,
        height: 32,
        landmarks: 64,
        seed: Some(7),
    };
    c.bench_function("generate_layout_32x32", |b| {
        b.iter(|| black_box(generate_layout(black_box(&map)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_single_game,
    bench_single_game_4p,
    bench_greedy_game,
    bench_game_batch,
    bench_setup
);
criterion_main!(benches);
