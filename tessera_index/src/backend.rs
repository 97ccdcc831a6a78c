// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point index abstraction shared by the point-storing structures.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::Point;

use crate::error::Error;
use crate::types::Aabb2D;

/// One result of a nearest-neighbor query.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Neighbor<P> {
    /// Position of the stored point.
    pub point: Point,
    /// Payload stored with the point.
    pub payload: P,
    /// Euclidean distance from the query target.
    pub distance: f64,
}

/// Common surface of indexes that store points with payloads.
///
/// Implemented by [`LinearScan`](crate::LinearScan), [`KdTree`](crate::KdTree) and
/// [`QuadTree`](crate::QuadTree), so callers and benches can swap strategies
/// without API churn.
pub trait PointIndex<P: Copy + PartialEq + Debug> {
    /// Insert a point with its payload.
    fn insert(&mut self, point: Point, payload: P) -> Result<(), Error>;

    /// Remove one element equal to `point` and `payload`.
    fn remove(&mut self, point: Point, payload: P) -> Result<(), Error>;

    /// Remove every element.
    fn clear(&mut self);

    /// Number of stored points.
    fn len(&self) -> usize;

    /// Whether the index holds no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Points inside `rect`, edges inclusive.
    fn query_rect<'a>(&'a self, rect: Aabb2D<f64>) -> Box<dyn Iterator<Item = (Point, P)> + 'a>;

    /// Up to `k` stored points closest to `target`, ascending by distance.
    fn k_nearest(&self, target: Point, k: usize) -> Vec<Neighbor<P>>;
}
