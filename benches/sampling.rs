//! Benchmarks for parameter sampling, persistence and the main module step.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec4;
use rand::rngs::StdRng;
use rand::SeedableRng;

use particle_params::prelude::*;

fn bench_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample");
    let mut rng = StdRng::seed_from_u64(1);

    group.bench_function("constant", |b| {
        let parameter = ParameterF32::constant(2.0);
        b.iter(|| black_box(parameter.sample(black_box(0.5), &mut rng)))
    });

    group.bench_function("curve", |b| {
        let parameter = ParameterF32::curve(AnimationCurve::smooth01());
        b.iter(|| black_box(parameter.sample(black_box(0.5), &mut rng)))
    });

    group.bench_function("random_between_curves", |b| {
        let (ease_in, fade) = (AnimationCurve::sqr01(), AnimationCurve::smooth10());
        let parameter = ParameterF32::random_between_curves(ease_in, fade);
        b.iter(|| black_box(parameter.sample(black_box(0.5), &mut rng)))
    });

    group.bench_function("random_between_gradients", |b| {
        let parameter = ParameterColor::random_between_gradients(
            ColorGradient::two_colors(Vec4::ONE, Vec4::ZERO),
            ColorGradient::two_colors(
                Vec4::new(1.0, 0.0, 0.0, 1.0),
                Vec4::new(0.0, 0.0, 1.0, 0.0),
            ),
        );
        b.iter(|| black_box(parameter.sample(black_box(0.5), &mut rng)))
    });

    group.bench_function("seeded", |b| {
        let seeds = ParticleSeeds::new(1);
        let parameter = ParameterF32::random_between_constants(1.0, 2.0);
        let mut seed = 0u32;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(parameter.sample_seeded(seed, 0.5, &seeds))
        })
    });

    group.finish();
}

fn bench_persistence(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistence");
    let mut module = MainModule::default();
    module.size_over_lifetime =
        OverLifetimeModule::enabled(ParameterF32::curve(AnimationCurve::smooth10()));
    let fade = ColorGradient::two_colors(Vec4::ONE, Vec4::ZERO);
    module.color_over_lifetime = OverLifetimeModule::enabled(ParameterColor::gradient(fade));

    group.bench_function("json", |b| {
        b.iter(|| black_box(serde_json::to_string(black_box(&module))))
    });

    group.bench_function("data_block_encode", |b| {
        b.iter(|| {
            let mut block = DataBlock::new();
            module.to_data_block(&mut block);
            black_box(block.to_bytes())
        })
    });

    let mut block = DataBlock::new();
    module.to_data_block(&mut block);
    if let Ok(bytes) = block.to_bytes() {
        group.bench_function("data_block_decode", |b| {
            b.iter(|| black_box(DataBlock::from_bytes(black_box(&bytes))))
        });
    }

    group.finish();
}

fn bench_main_module(c: &mut Criterion) {
    let mut group = c.benchmark_group("main_module");

    for count in [1_000usize, 10_000, 100_000] {
        let id = BenchmarkId::new("update_lifetime", count);
        group.bench_with_input(id, &count, |b, &count| {
            let mut module = MainModule::default();
            module.lifetime = ParameterF32::constant(1.0e6);
            module.size_over_lifetime =
                OverLifetimeModule::enabled(ParameterF32::curve(AnimationCurve::linear10()));
            module.velocity_limit_over_lifetime =
                OverLifetimeModule::enabled(ParameterF32::constant(1.0));

            let mut rng = StdRng::seed_from_u64(2);
            let seeds = ParticleSeeds::new(2);
            let mut particles = Particles::with_max_count(count);
            let range = particles.emit(count, &mut rng, &seeds);
            module.update_initial(&mut particles, range, 0.0, &seeds);

            b.iter(|| {
                module.update_lifetime(&mut particles, 0..count, black_box(1.0 / 60.0), &seeds)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sample, bench_persistence, bench_main_module);
criterion_main!(benches);
