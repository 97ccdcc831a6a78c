// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tessera_index::{
    Aabb2D, GridCoord, GridFile, KdTree, LinearScan, MortonIndex, Point, PointIndex, QuadTree,
    RTree,
};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

const EXTENT: f64 = 2000.0;

fn gen_uniform_points(count: usize) -> Vec<(Point, u32)> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|i| {
            let p = Point::new(rng.next_f64() * EXTENT, rng.next_f64() * EXTENT);
            (p, i as u32)
        })
        .collect()
}

fn gen_clustered_points(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<(Point, u32)> {
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    for _ in 0..n_clusters {
        let cx = spread + rng.next_f64() * (EXTENT - 2.0 * spread);
        let cy = spread + rng.next_f64() * (EXTENT - 2.0 * spread);
        for _ in 0..per_cluster {
            let dx = (rng.next_f64() - 0.5) * spread;
            let dy = (rng.next_f64() - 0.5) * spread;
            let id = out.len() as u32;
            out.push((Point::new(cx + dx, cy + dy), id));
        }
    }
    out
}

fn gen_query_points(count: usize) -> Vec<Point> {
    let mut rng = Rng::new(0xFACE_FEED_CAFE_BABE);
    (0..count)
        .map(|_| Point::new(rng.next_f64() * EXTENT, rng.next_f64() * EXTENT))
        .collect()
}

fn bounds() -> Aabb2D<f64> {
    Aabb2D::new(0.0, 0.0, EXTENT, EXTENT)
}

fn fill<I: PointIndex<u32>>(mut idx: I, points: &[(Point, u32)]) -> I {
    for &(p, id) in points {
        let _ = idx.insert(p, id);
    }
    idx
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for &n in &[1_000usize, 10_000] {
        let points = gen_uniform_points(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("kdtree_bulk_n{}", n), |b| {
            b.iter(|| black_box(KdTree::build(&points)));
        });
        group.bench_function(format!("kdtree_incremental_n{}", n), |b| {
            b.iter_batched(
                KdTree::<u32>::new,
                |idx| black_box(fill(idx, &points)),
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("quadtree_cap4_n{}", n), |b| {
            b.iter_batched(
                || QuadTree::<u32>::new(bounds(), 4).unwrap(),
                |idx| black_box(fill(idx, &points)),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_knn(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn");
    let queries = gen_query_points(256);
    for (name, points) in [
        ("uniform", gen_uniform_points(10_000)),
        ("clustered", gen_clustered_points(16, 625, 120.0)),
    ] {
        let linear = fill(LinearScan::<u32>::new(), &points);
        let kd = KdTree::build(&points);
        let quad = fill(QuadTree::<u32>::new(bounds(), 8).unwrap(), &points);
        group.throughput(Throughput::Elements(queries.len() as u64));
        for k in [1usize, 8] {
            group.bench_function(format!("linear_{}_k{}", name, k), |b| {
                b.iter(|| {
                    for &q in &queries {
                        black_box(PointIndex::k_nearest(&linear, q, k));
                    }
                })
            });
            group.bench_function(format!("kdtree_{}_k{}", name, k), |b| {
                b.iter(|| {
                    for &q in &queries {
                        black_box(kd.k_nearest(q, k));
                    }
                })
            });
            group.bench_function(format!("quadtree_{}_k{}", name, k), |b| {
                b.iter(|| {
                    for &q in &queries {
                        black_box(quad.k_nearest(q, k));
                    }
                })
            });
        }
    }
    group.finish();
}

fn bench_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("range");
    let points = gen_uniform_points(10_000);
    let kd = KdTree::build(&points);
    let quad = fill(QuadTree::<u32>::new(bounds(), 8).unwrap(), &points);
    let window = Aabb2D::<f64>::from_xywh(800.0, 800.0, 400.0, 400.0);
    group.bench_function("kdtree", |b| b.iter(|| black_box(kd.query_rect(window).len())));
    group.bench_function("kdtree_stepwise", |b| {
        b.iter(|| black_box(kd.range_steps(window).count()))
    });
    group.bench_function("quadtree", |b| b.iter(|| black_box(quad.query(window).len())));
    group.finish();
}

fn bench_rtree(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree");
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    let rects: Vec<(Aabb2D<f64>, u32)> = (0..4_096u32)
        .map(|i| {
            let x = rng.next_f64() * (EXTENT - 60.0);
            let y = rng.next_f64() * (EXTENT - 60.0);
            let w = 20.0 + rng.next_f64() * 40.0;
            let h = 20.0 + rng.next_f64() * 40.0;
            (Aabb2D::from_xywh(x, y, w, h), i)
        })
        .collect();
    let window = Aabb2D::<f64>::from_xywh(800.0, 800.0, 400.0, 400.0);
    for &m in &[4usize, 16] {
        group.throughput(Throughput::Elements(rects.len() as u64));
        group.bench_function(format!("bulk_build_m{}", m), |b| {
            b.iter(|| black_box(RTree::bulk_build(&rects, m).unwrap()))
        });
        let tree = RTree::bulk_build(&rects, m).unwrap();
        group.bench_function(format!("intersect_m{}", m), |b| {
            b.iter(|| black_box(tree.query_rect(window).len()))
        });
        group.bench_function(format!("knn8_m{}", m), |b| {
            b.iter(|| black_box(tree.k_nearest(Point::new(1000.0, 1000.0), 8)))
        });
    }
    group.finish();
}

fn bench_grid_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_file");
    let mut rng = Rng::new(0x0123_4567_89AB_CDEF);
    let coords: Vec<GridCoord> = (0..2_000)
        .map(|_| {
            let x = 1 + (rng.next_u64() % 256) as u32;
            let y = 1 + (rng.next_u64() % 256) as u32;
            GridCoord::new(x, y)
        })
        .collect();
    group.throughput(Throughput::Elements(coords.len() as u64));
    group.bench_function("insert_cap4_size256", |b| {
        b.iter_batched(
            || GridFile::<u32>::new(256, 4).unwrap(),
            |mut grid| {
                for (i, &c) in coords.iter().enumerate() {
                    let _ = grid.insert(c, i as u32);
                }
                black_box(grid.cells().len());
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_morton(c: &mut Criterion) {
    let mut group = c.benchmark_group("morton");
    let mut idx = MortonIndex::new(8).unwrap();
    idx.fill();
    let mut rng = Rng::new(0x5EED_5EED_5EED_5EED);
    let rects: Vec<Aabb2D<u32>> = (0..64)
        .map(|_| {
            let x = (rng.next_u64() % 200) as u32;
            let y = (rng.next_u64() % 200) as u32;
            Aabb2D::new(x, y, x + 40, y + 40)
        })
        .collect();
    group.bench_function("range_scan", |b| {
        b.iter(|| {
            for &r in &rects {
                black_box(idx.range_query(r).len());
            }
        })
    });
    group.bench_function("range_bigmin", |b| {
        b.iter(|| {
            for &r in &rects {
                black_box(idx.range_query_pruned(r).len());
            }
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_knn,
    bench_range,
    bench_rtree,
    bench_grid_file,
    bench_morton,
);
criterion_main!(benches);
