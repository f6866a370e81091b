//! Benchmarks for the shoreline labelling pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shorecast_algorithms::imagery::{water_mask, WaterMaskParams};
use shorecast_algorithms::vector::{build_transects, extract_coastline, measure_positions, TransectParams};
use shorecast_core::{GeoTransform, Raster, CRS};

/// Wavy water-index scene: water north of a sinusoidal coastline
fn create_scene(size: usize) -> Raster<f32> {
    let mut r = Raster::filled(size, size, 0.0f32);
    r.set_transform(GeoTransform::new(16_150_000.0, -4_590_000.0, 10.0, -10.0));
    r.set_crs(Some(CRS::web_mercator()));
    let half = size as f64 / 2.0;
    for row in 0..size {
        for col in 0..size {
            let shore = half + (col as f64 * 0.05).sin() * size as f64 / 8.0;
            let noise = ((row * 7 + col * 13) % 17) as f32 * 0.01;
            let v = if (row as f64) < shore { 0.4 + noise } else { -0.3 - noise };
            r.set(row, col, v).unwrap();
        }
    }
    r
}

fn bench_water_mask(c: &mut Criterion) {
    let mut group = c.benchmark_group("imagery/water_mask");
    let params = WaterMaskParams::default();
    for size in [256, 512, 1024, 2048] {
        let scene = create_scene(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| water_mask(black_box(&scene), &params).unwrap())
        });
    }
    group.finish();
}

fn bench_measure_positions(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector/measure_positions");
    for size in [256, 512, 1024] {
        let scene = create_scene(size);
        let mask = water_mask(&scene, &WaterMaskParams::default()).unwrap().unwrap();
        let coast = extract_coastline(&mask.mask).unwrap();
        let transects = build_transects(&coast, &TransectParams::default()).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| measure_positions(black_box(&coast), black_box(&transects), 2010))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_water_mask, bench_measure_positions);
criterion_main!(benches);
