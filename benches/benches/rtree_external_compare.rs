// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tessera_index::{Aabb2D, KdTree, Point, RTree as TesseraRTree};

use rstar::primitives::Rectangle;
use rstar::{AABB, RTree};

fn gen_grid_rects(n: usize, cell: f64) -> Vec<(Aabb2D<f64>, u32)> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            let id = out.len() as u32;
            out.push((Aabb2D::<f64>::from_xywh(x0, y0, cell * 0.8, cell * 0.8), id));
        }
    }
    out
}

fn to_rstar_rects(v: &[(Aabb2D<f64>, u32)]) -> Vec<Rectangle<[f64; 2]>> {
    v.iter()
        .map(|(r, _)| Rectangle::from_corners([r.min_x, r.min_y], [r.max_x, r.max_y]))
        .collect()
}

fn bench_rtree_external_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_external_compare");
    for &n in &[64usize, 128] {
        let rects = gen_grid_rects(n, 10.0);
        let query = Aabb2D::<f64>::from_xywh(100.0, 100.0, 400.0, 400.0);
        group.throughput(Throughput::Elements((n * n) as u64));

        group.bench_function(format!("tessera_build_query_n{}", n), |b| {
            b.iter(|| {
                let Ok(tree) = TesseraRTree::bulk_build(&rects, 16) else {
                    return;
                };
                black_box(tree.query_rect(query).len());
            })
        });

        group.bench_function(format!("rstar_build_query_n{}", n), |b| {
            b.iter_batched(
                || to_rstar_rects(&rects),
                |rectangles| {
                    let tree = RTree::bulk_load(rectangles);
                    let aabb = AABB::from_corners(
                        [query.min_x, query.min_y],
                        [query.max_x, query.max_y],
                    );
                    let hits: usize = tree.locate_in_envelope_intersecting(&aabb).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_point_knn_external_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_knn_external_compare");
    let points: Vec<(Point, u32)> = (0..10_000u32)
        .map(|i| {
            let x = f64::from(i % 100) * 20.0 + f64::from(i % 7);
            let y = f64::from(i / 100) * 20.0 + f64::from(i % 11);
            (Point::new(x, y), i)
        })
        .collect();
    let kd = KdTree::build(&points);
    let rs = RTree::bulk_load(points.iter().map(|(p, _)| [p.x, p.y]).collect::<Vec<_>>());
    let target = Point::new(1003.0, 997.0);
    group.bench_function("tessera_kdtree_k8", |b| {
        b.iter(|| black_box(kd.k_nearest(target, 8)))
    });
    group.bench_function("rstar_k8", |b| {
        b.iter(|| {
            let hits: Vec<_> = rs.nearest_neighbor_iter(&[target.x, target.y]).take(8).collect();
            black_box(hits);
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_rtree_external_compare,
    bench_point_knn_external_compare
);
criterion_main!(benches);
