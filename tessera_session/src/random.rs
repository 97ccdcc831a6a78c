// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Random inputs for the demos.

use core::f64::consts::TAU;

use kurbo::{Point, Size};
use rand::Rng;
use rand::rngs::StdRng;
use tessera_index::{Aabb2D, GridCoord};

/// Side lengths of generated rectangles.
const RECT_SIDE: core::ops::Range<f64> = 20.0..60.0;

/// Resampling attempts before a Gaussian point is clamped into its bounds.
const GAUSSIAN_ATTEMPTS: usize = 8;

/// A point uniformly distributed over the canvas.
pub(crate) fn uniform_point(rng: &mut StdRng, canvas: Size) -> Point {
    Point::new(
        rng.random_range(0.0..canvas.width),
        rng.random_range(0.0..canvas.height),
    )
}

/// Normal variate by the Box-Muller transform.
pub(crate) fn gaussian(rng: &mut StdRng, mean: f64, sd: f64) -> f64 {
    // 1 - [0, 1) keeps `u` away from zero.
    let u = 1.0 - rng.random::<f64>();
    let v = rng.random::<f64>();
    (-2.0 * u.ln()).sqrt() * (TAU * v).cos() * sd + mean
}

/// A point clustered around the center of `bounds`, with a standard deviation
/// of a third of the half-extent, kept inside `bounds`.
pub(crate) fn gaussian_point(rng: &mut StdRng, bounds: Aabb2D<f64>) -> Point {
    let center = bounds.center();
    let (sx, sy) = (bounds.width() / 6.0, bounds.height() / 6.0);
    for _ in 0..GAUSSIAN_ATTEMPTS {
        let p = Point::new(gaussian(rng, center.x, sx), gaussian(rng, center.y, sy));
        if bounds.contains(p) {
            return p;
        }
    }
    Point::new(
        gaussian(rng, center.x, sx).clamp(bounds.min_x, bounds.max_x),
        gaussian(rng, center.y, sy).clamp(bounds.min_y, bounds.max_y),
    )
}

/// A rectangle with sides in 20..60 pixels lying fully inside the canvas.
pub(crate) fn rect(rng: &mut StdRng, canvas: Size) -> Aabb2D<f64> {
    let w = rng.random_range(RECT_SIDE).min(canvas.width);
    let h = rng.random_range(RECT_SIDE).min(canvas.height);
    let x = rng.random_range(0.0..=canvas.width - w);
    let y = rng.random_range(0.0..=canvas.height - h);
    Aabb2D::from_xywh(x, y, w, h)
}

/// A rectangle with sides in 20..60 pixels centered on `p`, shifted as little
/// as needed to lie inside the canvas.
pub(crate) fn rect_at(rng: &mut StdRng, p: Point, canvas: Size) -> Aabb2D<f64> {
    let w = rng.random_range(RECT_SIDE).min(canvas.width);
    let h = rng.random_range(RECT_SIDE).min(canvas.height);
    let x = (p.x - 0.5 * w).clamp(0.0, canvas.width - w);
    let y = (p.y - 0.5 * h).clamp(0.0, canvas.height - h);
    Aabb2D::from_xywh(x, y, w, h)
}

/// A grid coordinate uniformly distributed over `[1, grid_size]²`.
pub(crate) fn grid_coord(rng: &mut StdRng, grid_size: u32) -> GridCoord {
    GridCoord::new(rng.random_range(1..=grid_size), rng.random_range(1..=grid_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;

    #[test]
    fn gaussian_points_stay_in_bounds_and_cluster() {
        let mut rng = StdRng::seed_from_u64(3);
        let bounds = Aabb2D::new(0.0, 0.0, 750.0, 750.0);
        let pts: Vec<Point> = (0..2000).map(|_| gaussian_point(&mut rng, bounds)).collect();
        assert!(pts.iter().all(|&p| bounds.contains(p)));
        let near_center = pts
            .iter()
            .filter(|p| p.distance(Point::new(375.0, 375.0)) < 250.0)
            .count();
        assert!(near_center > 1500, "only {near_center} of 2000 near the center");
    }

    #[test]
    fn rects_fit_the_canvas() {
        let mut rng = StdRng::seed_from_u64(4);
        let canvas = Size::new(750.0, 750.0);
        for _ in 0..500 {
            let r = rect(&mut rng, canvas);
            assert!(r.width() > 19.9 && r.width() < 60.1, "{r:?}");
            assert!(r.min_x >= 0.0 && r.min_y >= 0.0, "{r:?}");
            assert!(r.max_x <= 750.0 + 1e-9 && r.max_y <= 750.0 + 1e-9, "{r:?}");
        }
    }

    #[test]
    fn rects_at_a_point_cover_it_and_fit_the_canvas() {
        let mut rng = StdRng::seed_from_u64(5);
        let canvas = Size::new(750.0, 750.0);
        for p in [
            Point::new(375.0, 375.0),
            Point::new(0.0, 0.0),
            Point::new(749.0, 3.0),
            Point::new(750.0, 750.0),
        ] {
            let r = rect_at(&mut rng, p, canvas);
            assert!(r.width() > 19.9 && r.width() < 60.1, "{r:?}");
            assert!(r.height() > 19.9 && r.height() < 60.1, "{r:?}");
            assert!(r.contains(p), "{r:?} misses {p:?}");
            assert!(r.min_x >= 0.0 && r.min_y >= 0.0, "{r:?}");
            assert!(r.max_x <= 750.0 + 1e-9 && r.max_y <= 750.0 + 1e-9, "{r:?}");
        }
        let r = rect_at(&mut rng, Point::new(375.0, 375.0), canvas);
        assert!((r.center() - Point::new(375.0, 375.0)).hypot() < 1e-9);
    }
}
