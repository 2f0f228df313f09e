//! # ECS Performance Benchmark
//!
//! Covers the three paths a frame exercises most:
//! - entity create/destroy churn with id recycling
//! - component add/remove with membership refresh
//! - a full `update_systems` pass over a movement system
//!
//! Run with: `cargo bench --package strata_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_core::{Entity, FnSystem, World, MAX_ENTITIES};

#[derive(Clone, Copy)]
struct Position {
    x: f64,
    y: f64,
}

#[derive(Clone, Copy)]
struct Velocity {
    dx: f64,
    dy: f64,
}

struct Health(u32);

/// World with the movement system and `count` moving entities.
fn movement_world(count: u32) -> World {
    let mut world = World::new();
    world.register_component::<Position>();
    world.register_component::<Velocity>();
    world.register_component::<Health>();

    let movers = world.make_signature::<(Position, Velocity)>();
    world.register_system(
        "movement",
        movers,
        FnSystem::new(|world: &mut World, entities: &[Entity], dt: f64| {
            for &e in entities {
                let v = *world.get_component::<Velocity>(e);
                let p = world.get_component_mut::<Position>(e);
                p.x += v.dx * dt;
                p.y += v.dy * dt;
            }
        }),
    );

    for i in 0..count {
        let e = world.create_entity();
        let f = f64::from(i);
        world.add_component(e, Position { x: f, y: f });
        world.add_component(e, Velocity { dx: 1.0, dy: -1.0 });
    }
    world
}

/// Benchmark: fill every id, then release them all.
fn bench_create_destroy_cycle(c: &mut Criterion) {
    let mut world = World::new();
    let mut ids: Vec<Entity> = Vec::with_capacity(MAX_ENTITIES as usize);

    c.bench_function("create_destroy_cycle_4096", |b| {
        b.iter(|| {
            for _ in 0..MAX_ENTITIES {
                ids.push(world.create_entity());
            }
            for e in ids.drain(..) {
                world.destroy_entity(e);
            }
            black_box(world.entity_count())
        });
    });
}

/// Benchmark: add and remove a component, toggling system membership.
fn bench_add_remove_component(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_remove_component");

    for count in [256_u32, 1024, MAX_ENTITIES] {
        let mut world = movement_world(count);
        let entities: Vec<Entity> = (1..=count).map(Entity::from_raw).collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                for &e in &entities {
                    world.add_component(e, Health(100));
                }
                for &e in &entities {
                    black_box(world.remove_component::<Health>(e).0);
                }
            });
        });
    }

    group.finish();
}

/// Benchmark: one `update_systems` pass over every moving entity.
fn bench_update_systems(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_systems");

    for count in [256_u32, 1024, MAX_ENTITIES] {
        let mut world = movement_world(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                world.update_systems(black_box(1.0 / 60.0));
            });
        });
    }

    group.finish();
}

/// Benchmark: bulk pass over packed values without per-entity lookups.
fn bench_packed_values(c: &mut Criterion) {
    let mut world = movement_world(MAX_ENTITIES);

    c.bench_function("packed_position_pass_4096", |b| {
        b.iter(|| {
            for p in world.component_values_mut::<Position>() {
                p.x += 1.0;
            }
            black_box(world.component_store::<Position>().len())
        });
    });
}

criterion_group!(
    benches,
    bench_create_destroy_cycle,
    bench_add_remove_component,
    bench_update_systems,
    bench_packed_values,
);

criterion_main!(benches);
