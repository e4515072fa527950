// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for soundmux
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Registry churn (add/remove)
//! - Preemption cost when switching sounds
//! - Completion handling for looped playback

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use soundmux::engine::MockEngine;
use soundmux::{extension_to_type, LoopCount, PlaybackMultiplexer, Sound};

fn make_sounds(count: usize) -> Vec<Sound> {
    (0..count)
        .map(|i| Sound::from_locator(format!("sounds/clip_{}.ogg", i)))
        .collect()
}

/// Benchmark registering and unregistering sounds
fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");

    for size in [10, 100, 1000].iter() {
        let sounds = make_sounds(*size);
        group.bench_with_input(BenchmarkId::new("add_remove", size), &sounds, |b, sounds| {
            b.iter(|| {
                let (engine, _handle) = MockEngine::new();
                let mut mux = PlaybackMultiplexer::new(engine);
                for sound in sounds {
                    mux.add(sound);
                }
                for sound in sounds {
                    mux.remove(sound.id());
                }
                black_box(mux.len())
            })
        });
    }

    group.finish();
}

/// Benchmark switching the active slot between sounds
fn bench_preemption(c: &mut Criterion) {
    let sounds = make_sounds(16);
    let (engine, _handle) = MockEngine::new();
    let mut mux = PlaybackMultiplexer::new(engine);
    for sound in &sounds {
        mux.add(sound);
    }

    c.bench_function("preempt_cycle", |b| {
        b.iter(|| {
            for sound in &sounds {
                let _ = mux.play(black_box(sound.id()), LoopCount::Infinite);
            }
        })
    });
}

/// Benchmark completion handling through the queue
fn bench_completions(c: &mut Criterion) {
    let sound = Sound::from_locator("loop.ogg");

    c.bench_function("loop_100_completions", |b| {
        b.iter(|| {
            let (engine, handle) = MockEngine::new();
            let mut mux = PlaybackMultiplexer::new(engine);
            mux.add(&sound);
            let _ = mux.play(sound.id(), LoopCount::Finite(100));
            while handle.complete() {
                mux.pump();
            }
            black_box(mux.is_finished(sound.id()).unwrap_or(false))
        })
    });
}

/// Benchmark MIME table lookup
fn bench_mime(c: &mut Criterion) {
    c.bench_function("extension_to_type", |b| {
        b.iter(|| {
            black_box(extension_to_type(black_box("webm")));
            black_box(extension_to_type(black_box("flac")))
        })
    });
}

criterion_group!(
    benches,
    bench_registry,
    bench_preemption,
    bench_completions,
    bench_mime
);
criterion_main!(benches);
