mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{DVec2, IVec2};
use obstacle_scatter::prelude::{GenerationConfig, GridIndex, SessionOrigin};

const RADII: [i32; 4] = [10, 20, 40, 80];

fn grid_build_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid/build");
    let origin = SessionOrigin::at(DVec2::new(12.0, -3.5));

    for &radius in &RADII {
        let config = GenerationConfig::new(15)
            .with_grid_radius(radius)
            .with_safe_radius(radius as f64 * 0.25);
        let side = (2 * radius + 1) as usize;
        group.throughput(common::elements_throughput(side * side));

        group.bench_with_input(BenchmarkId::from_parameter(radius), &config, |b, config| {
            b.iter(|| {
                let grid = GridIndex::build(&origin, config);
                black_box(grid.available_count());
            });
        });
    }

    group.finish();
}

fn grid_marking_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid/mark_neighborhood");
    let origin = SessionOrigin::new(DVec2::ZERO);

    for &radius in &RADII {
        let config = GenerationConfig::new(15).with_grid_radius(radius);
        let template = GridIndex::build(&origin, &config);
        let coords: Vec<IVec2> = template.available().iter().step_by(3).copied().collect();
        group.throughput(common::elements_throughput(coords.len()));

        group.bench_with_input(BenchmarkId::from_parameter(radius), &coords, |b, coords| {
            b.iter_batched(
                || template.clone(),
                |mut grid| {
                    for &coord in coords {
                        black_box(grid.mark_neighborhood_unavailable(coord));
                    }
                    black_box(grid.available_count());
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = grid_build_benches, grid_marking_benches
}
criterion_main!(benches);
