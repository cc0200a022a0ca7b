//! Benchmark for the per-step world work without a simulator.
//!
//! Run with: cargo bench --package soccer_env --bench obstacle_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use soccer_env::world::{nearest_obstacle, refresh_obstacles, Court, RobotState};
use soccer_env::WorldModel;
use soccer_geom::Point;

fn court() -> Court {
    Court::from_full(1500.0, 1300.0, 400.0, 100.0, 37.5)
}

fn benchmark_nearest_obstacle(c: &mut Criterion) {
    let court = court();
    let positions = [Point::new(-300.0, 120.0), Point::new(280.0, -90.0)];

    c.bench_function("nearest_obstacle", |b| {
        b.iter(|| black_box(nearest_obstacle(black_box(&court), 0, black_box(&positions))));
    });
}

fn benchmark_refresh(c: &mut Criterion) {
    let court = court();
    let mut robots: Vec<RobotState> = (0..2)
        .map(|id| {
            let mut robot = RobotState::new(id);
            robot.position = Point::new(if id == 0 { -400.0 } else { 400.0 }, 0.0);
            robot
        })
        .collect();

    let mut group = c.benchmark_group("refresh_obstacles");
    group.throughput(Throughput::Elements(robots.len() as u64));
    group.bench_function("two_robots", |b| {
        b.iter(|| refresh_obstacles(black_box(&court), black_box(&mut robots)));
    });
    group.finish();
}

fn benchmark_local_step(c: &mut Criterion) {
    let mut world = WorldModel::with_seed(42);
    world
        .set_environment(1500.0, 1300.0, 400.0, 100.0, 37.5)
        .expect("local world");
    world.create_robots(2).expect("local world");
    world.restart().expect("local world");

    c.bench_function("local_turn", |b| {
        b.iter(|| {
            world.act(0, 0.4, 0.6);
            black_box(world.act(1, 0.6, 0.4))
        });
    });
}

criterion_group!(
    benches,
    benchmark_nearest_obstacle,
    benchmark_refresh,
    benchmark_local_step
);
criterion_main!(benches);
