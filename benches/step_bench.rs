//! Stepping and ray-test benchmarks.
//!
//! Run with: cargo bench --bench step_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;

use rigid_sim::{
    math::{Transform, Vector3},
    shapes::Shape,
    CollisionFilterGroups, PhysicsWorld, RayCastFlags,
};

const H: f32 = 1.0 / 60.0;

/// A ground plane with `count` boxes and spheres dropped onto it
fn scatter_scene(count: usize) -> PhysicsWorld {
    let mut rng = StdRng::seed_from_u64(7);
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vector3::new(0.0, -9.8, 0.0)).unwrap();

    let ground = Arc::new(Shape::new_plane(Vector3::unit_y(), 0.0).unwrap());
    let cube = Arc::new(Shape::new_box(Vector3::splat(0.4)).unwrap());
    let ball = Arc::new(Shape::new_sphere(0.4).unwrap());
    world.create_body(0.0, Transform::identity(), ground).unwrap();

    for i in 0..count {
        let position = Vector3::new(
            rng.gen_range(-8.0..8.0),
            rng.gen_range(0.5..12.0),
            rng.gen_range(-8.0..8.0),
        );
        let shape = if i % 2 == 0 { cube.clone() } else { ball.clone() };
        world.create_body(1.0, Transform::from_position(position), shape).unwrap();
    }
    world
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_simulation");

    for count in [10usize, 50, 200] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut world = scatter_scene(count);
            // let the pile form so contacts are being solved
            for _ in 0..60 {
                world.step_simulation(H, 1, H).unwrap();
            }
            b.iter(|| black_box(world.step_simulation(black_box(H), 1, H).unwrap()));
        });
    }

    group.finish();
}

fn bench_ray_test(c: &mut Criterion) {
    let world = scatter_scene(200);
    let mut rng = StdRng::seed_from_u64(11);
    let rays: Vec<(Vector3, Vector3)> = (0..64)
        .map(|_| {
            let x = rng.gen_range(-8.0..8.0);
            let z = rng.gen_range(-8.0..8.0);
            (Vector3::new(x, 20.0, z), Vector3::new(x, -1.0, z))
        })
        .collect();

    c.bench_function("ray_test_closest/200_bodies", |b| {
        b.iter(|| {
            for (from, to) in &rays {
                black_box(world.ray_test_closest(
                    *from,
                    *to,
                    CollisionFilterGroups::DEFAULT,
                    CollisionFilterGroups::ALL,
                    RayCastFlags::empty(),
                ));
            }
        })
    });
}

criterion_group!(benches, bench_step, bench_ray_test);
criterion_main!(benches);
