//! Benchmarks for effect stat folds and event dispatch.
//!
//! Every stat read walks the whole effect list, so these are the paths
//! the AI hits hardest when scoring moves.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use conquest::effect::{Effect, EffectManager, EffectOwner, Resource};
use conquest::game::GameEvent;

/// A player manager holding `n` landmark bonuses.
fn loaded_manager(n: u16) -> EffectManager {
    let mut manager = EffectManager::new(EffectOwner::Player(0));
    for sector in 0..n {
        let resource = if sector % 2 == 0 {
            Resource::Attack
        } else {
            Resource::Defence
        };
        manager
            .apply(Effect::LandmarkBonus {
                sector,
                resource,
                amount: 1,
            })
            .unwrap();
    }
    manager
}

fn bench_stat_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("stat_fold");
    for n in [1u16, 8, 64] {
        let manager = loaded_manager(n);
        group.bench_with_input(BenchmarkId::new("stats", n), &manager, |b, m| {
            b.iter(|| black_box(m).stats());
        });
        group.bench_with_input(BenchmarkId::new("attack", n), &manager, |b, m| {
            b.iter(|| black_box(m).attack());
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let event = GameEvent::UnitMoved {
        unit: 3,
        from: 1,
        to: 2,
    };
    let mut group = c.benchmark_group("dispatch");
    for n in [1u16, 8, 64] {
        let mut manager = loaded_manager(n);
        group.bench_function(BenchmarkId::from_parameter(n), |b| {
            b.iter(|| {
                manager.dispatch(Some(0), black_box(&event));
                black_box(manager.take_commands())
            });
        });
    }
    group.finish();
}

fn bench_apply_remove(c: &mut Criterion) {
    let mut manager = loaded_manager(8);
    c.bench_function("apply_remove", |b| {
        b.iter(|| {
            let id = manager
                .apply(black_box(Effect::Flooded { turns: 2 }))
                .unwrap();
            black_box(manager.remove(id).unwrap())
        });
    });
}

criterion_group!(benches, bench_stat_fold, bench_dispatch, bench_apply_remove);
criterion_main!(benches);
