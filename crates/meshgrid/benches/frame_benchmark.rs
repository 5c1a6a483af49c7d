//! # Frame Benchmark
//!
//! Measures a full frame (effects, composition, draw-list recording) over
//! full-HD hosts at several densities.
//!
//! Run with: `cargo bench --package meshgrid`

// Benchmarks don't need strict docs
#![allow(missing_docs)]
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use meshgrid::{builtin_registry, DrawList, HostEnvironment, HostEvent, Options, ParticleField, Vec2};

fn field(density: f32, effects: &str) -> ParticleField {
    let options = Options::new()
        .with("grid-bg", "true")
        .with("grid-density", density.to_string())
        .with("grid-effect", effects);
    let registry = Arc::new(builtin_registry());
    ParticleField::setup(options, &registry, HostEnvironment::desktop(1920.0, 1080.0))
}

/// Benchmark: all effects with the pointer moving across the host.
fn bench_interactive_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("interactive_frame");

    for density in [1.0_f32, 2.0, 4.0] {
        let mut field = field(density, "repulsion ripple connect");
        let mut surface = DrawList::with_capacity(field.particles().len());
        let particles = field.particles().len();

        group.bench_with_input(BenchmarkId::new("particles", particles), &density, |b, _| {
            let mut now = 0.0_f64;
            b.iter(|| {
                now += 1.0 / 45.0;
                let x = (now * 200.0 % 1920.0) as f32;
                field.handle_event(HostEvent::PointerMove(Vec2::new(x, 540.0)), now);
                if (now * 45.0) as u64 % 30 == 0 {
                    field.handle_event(HostEvent::Click(Vec2::new(960.0, 540.0)), now);
                }
                black_box(field.frame(now, &mut surface))
            });
        });
    }

    group.finish();
}

/// Benchmark: a grid with no effects (composition and drawing only).
fn bench_static_frame(c: &mut Criterion) {
    let mut field = field(2.0, "");
    let mut surface = DrawList::with_capacity(field.particles().len());

    c.bench_function("static_frame", |b| {
        b.iter(|| {
            // Keep the scheduler awake
            field.handle_event(HostEvent::PointerEnter, 0.0);
            black_box(field.frame(0.0, &mut surface))
        });
    });
}

/// Benchmark: regeneration after a resize, including effect resync.
fn bench_regenerate(c: &mut Criterion) {
    let mut field = field(2.0, "repulsion ripple connect");
    let mut wide = false;

    c.bench_function("resize_regenerate", |b| {
        b.iter(|| {
            wide = !wide;
            let width = if wide { 1920.0 } else { 1280.0 };
            field.handle_event(
                HostEvent::Resize {
                    width,
                    height: 1080.0,
                    viewport_width: width,
                },
                0.0,
            );
            black_box(field.particles().len())
        });
    });
}

criterion_group!(benches, bench_interactive_frame, bench_static_frame, bench_regenerate);
criterion_main!(benches);
