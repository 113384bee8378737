#![allow(missing_docs)]
//! Benchmarks for light propagation.

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use steel_lighting::{BlockProps, LightEngine, LightType, LightingConfig, MemoryWorld};
use steel_utils::{BlockPos, ChunkPos};

/// A 3x3 chunk area without sky, four sections tall.
fn create_dark_world() -> MemoryWorld {
    let mut world = MemoryWorld::new(false);
    for dz in -1..=1 {
        for dx in -1..=1 {
            world.insert_empty_chunk(ChunkPos::new(dx, dz), 0..4);
        }
    }
    world
}

/// A 3x3 chunk area with sky, lit by chunk init.
fn create_sky_world(engine: &LightEngine) -> MemoryWorld {
    let mut world = MemoryWorld::new(true);
    for dz in -1..=1 {
        for dx in -1..=1 {
            world.insert_empty_chunk(ChunkPos::new(dx, dz), 0..4);
        }
    }
    for dz in -1..=1 {
        for dx in -1..=1 {
            engine.handle_chunk_init(&mut world, ChunkPos::new(dx, dz));
        }
    }
    engine.process_lighting_updates_for_all_types(&mut world);
    world
}

fn bench_block_light(c: &mut Criterion) {
    let lamp = BlockPos::new(8, 32, 8);
    let mut group = c.benchmark_group("block_light");

    for brightness in [8u8, 15] {
        group.bench_with_input(BenchmarkId::new("place_lamp", brightness), &brightness, |b, &brightness| {
            b.iter_batched(
                || {
                    let mut world = create_dark_world();
                    world.set_block(lamp, BlockProps::new(0, brightness));
                    (LightEngine::new(LightingConfig::default()), world)
                },
                |(engine, mut world)| {
                    engine.update_lighting_for_block(&mut world, lamp);
                    engine.process_lighting_updates_for_all_types(&mut world);
                    black_box(world)
                },
                BatchSize::LargeInput,
            );
        });
    }

    // Removing the lamp darkens the whole sphere and rebrightens nothing.
    group.bench_function("remove_lamp", |b| {
        b.iter_batched(
            || {
                let engine = LightEngine::new(LightingConfig::default());
                let mut world = create_dark_world();
                world.set_block(lamp, BlockProps::new(0, 15));
                engine.update_lighting_for_block(&mut world, lamp);
                engine.process_lighting_updates_for_all_types(&mut world);
                world.set_block(lamp, BlockProps::AIR);
                (engine, world)
            },
            |(engine, mut world)| {
                engine.update_lighting_for_block(&mut world, lamp);
                engine.process_lighting_updates_for_all_types(&mut world);
                black_box(world)
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_sky_light(c: &mut Criterion) {
    let mut group = c.benchmark_group("sky_light");
    group.sample_size(20);

    group.bench_function("chunk_init_3x3", |b| {
        b.iter(|| {
            let engine = LightEngine::new(LightingConfig::default());
            black_box(create_sky_world(&engine))
        });
    });

    group.bench_function("roof_placement", |b| {
        b.iter_batched(
            || {
                let engine = LightEngine::new(LightingConfig::default());
                let world = create_sky_world(&engine);
                (engine, world)
            },
            |(engine, mut world)| {
                for z in 4..12 {
                    for x in 4..12 {
                        let pos = BlockPos::new(x, 40, z);
                        world.set_block(pos, BlockProps::SOLID);
                        engine.update_lighting_for_block(&mut world, pos);
                    }
                }
                black_box(engine.get_current_light_value(&mut world, LightType::Sky, BlockPos::new(8, 20, 8)))
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_block_light, bench_sky_light);
criterion_main!(benches);
