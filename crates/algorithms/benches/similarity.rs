//! Benchmarks for similarity surfaces

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mess_algorithms::similarity::{
    aggregate, predictor_surface, AggregateOptions, Mess, MessInput, MessParams, Predictor,
    ReferenceSample,
};
use mess_core::{Algorithm, GeoTransform, PointSet, Raster};

/// Smooth gradient with a small periodic ripple
fn create_predictor(size: usize, phase: usize) -> Raster<f64> {
    let mut r = Raster::new(size, size);
    r.set_transform(GeoTransform::new(0.0, size as f64, 1.0, -1.0));
    for row in 0..size {
        for col in 0..size {
            let ripple = ((row * 7 + col * 13 + phase) % 17) as f64 * 0.01;
            r.set(row, col, (row + phase * col) as f64 * 0.5 + ripple).unwrap();
        }
    }
    r
}

/// Points on a regular lattice over the central quarter of the grid
fn create_reference(size: usize) -> ReferenceSample {
    let lo = size as f64 * 0.375;
    let steps = 20;
    let step = size as f64 * 0.25 / steps as f64;
    let coords: Vec<(f64, f64)> = (0..steps)
        .flat_map(|i| (0..steps).map(move |j| (lo + i as f64 * step, lo + j as f64 * step)))
        .collect();
    ReferenceSample::Points(PointSet::from_coords(&coords))
}

fn bench_predictor_surface(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity/predictor_surface");
    for size in [256, 512, 1024] {
        let predictor = create_predictor(size, 1);
        let reference = create_reference(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                predictor_surface("bio1", black_box(&predictor), &reference, 0.0001).unwrap()
            })
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity/aggregate");
    let options = AggregateOptions {
        most_dissimilar: true,
        mean: true,
        median: true,
        negative: true,
    };
    for size in [256, 512, 1024] {
        let layers: Vec<Raster<f64>> = (0..8).map(|p| create_predictor(size, p)).collect();
        let refs: Vec<&Raster<f64>> = layers.iter().collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| aggregate(black_box(&refs), options).unwrap())
        });
    }
    group.finish();
}

fn bench_mess(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity/mess");
    group.sample_size(10);
    for size in [256, 512] {
        let predictors: Vec<Predictor> = (0..8)
            .map(|p| Predictor::new(format!("bio{p}"), create_predictor(size, p)))
            .collect();
        let reference = create_reference(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let input = MessInput {
                    predictors: predictors.clone(),
                    reference: reference.clone(),
                };
                Mess.execute(black_box(input), MessParams::default()).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_predictor_surface, bench_aggregate, bench_mess);
criterion_main!(benches);
