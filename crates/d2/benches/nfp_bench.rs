//! Benchmarks for 2D nesting operations.
//!
//! Measures pairwise NFP computation (cold cache), convex decomposition, and
//! greedy nesting at various scales.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sheetnest_d2::minkowski::convex_decomposition;
use sheetnest_d2::nfp::compute_pair_nfp;
use sheetnest_d2::{NestConfig, Nester, NfpCache, Part, Polygon2D, Strategy};

fn bench_pair_nfp(c: &mut Criterion) {
    let mut group = c.benchmark_group("pair_nfp");

    let square = Part::new("sq", Polygon2D::rectangle(40.0, 40.0), 0.0, 1).unwrap();
    let l_shape = Part::new("l", Polygon2D::l_shape(60.0, 40.0, 30.0, 20.0), 0.0, 1).unwrap();
    let frame = Part::new("frame", Polygon2D::frame(80.0, 15.0), 0.0, 1).unwrap();

    for (name, placed) in [("square", &square), ("l_shape", &l_shape), ("frame", &frame)] {
        group.bench_with_input(BenchmarkId::new("vs_square", name), placed, |b, placed| {
            b.iter(|| {
                let cache = NfpCache::new();
                let nfp = compute_pair_nfp(
                    &cache,
                    black_box(placed.original_polygon()),
                    black_box(&square.rotated_template(90.0)),
                );
                black_box(nfp)
            })
        });
    }
    group.finish();
}

fn bench_decomposition(c: &mut Criterion) {
    let star = Polygon2D::new(
        (0..16)
            .map(|i| {
                let r = if i % 2 == 0 { 50.0 } else { 20.0 };
                let t = i as f64 * std::f64::consts::TAU / 16.0;
                (r * t.cos(), r * t.sin())
            })
            .collect(),
    );
    c.bench_function("convex_decomposition_star", |b| {
        b.iter(|| convex_decomposition(black_box(&star)))
    });
}

fn bench_greedy_nest(c: &mut Criterion) {
    let mut group = c.benchmark_group("greedy_nest");
    group.sample_size(10);

    for &n in &[5, 10, 20] {
        let parts: Vec<Part> = (0..n)
            .map(|i| {
                let w = 20.0 + (i as f64 * 3.0) % 30.0;
                let h = 15.0 + (i as f64 * 7.0) % 25.0;
                Part::new(format!("R{}", i), Polygon2D::rectangle(w, h), 1.0, 4).unwrap()
            })
            .collect();
        let config = NestConfig::new(200.0, 200.0).with_strategy(Strategy::Greedy);

        group.bench_with_input(BenchmarkId::new("rectangles", n), &parts, |b, parts| {
            b.iter(|| {
                let result = Nester::new(config.clone()).nest(black_box(parts));
                black_box(result)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pair_nfp, bench_decomposition, bench_greedy_nest);
criterion_main!(benches);
