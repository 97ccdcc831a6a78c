// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat vector of points with linear scans. Small and simple, and the
//! reference answer the tree structures are checked against.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::Point;

use crate::backend::{Neighbor, PointIndex};
use crate::error::Error;
use crate::knn::KBest;
use crate::types::Aabb2D;

/// Flat vector of points in insertion order.
#[derive(Clone)]
pub struct LinearScan<P> {
    entries: Vec<(Point, P)>,
}

impl<P> Default for LinearScan<P> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<P: Copy + PartialEq + Debug> LinearScan<P> {
    /// Create an empty scan list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored points in insertion order.
    pub fn entries(&self) -> &[(Point, P)] {
        &self.entries
    }

    /// Append a point.
    pub fn push(&mut self, point: Point, payload: P) {
        self.entries.push((point, payload));
    }

    /// Remove the element at `index`, keeping the order of the rest.
    pub fn remove_at(&mut self, index: usize) -> Option<(Point, P)> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Position of the first element equal to `point` and `payload`.
    pub fn position(&self, point: Point, payload: P) -> Option<usize> {
        self.entries
            .iter()
            .position(|&(p, v)| p == point && v == payload)
    }

    /// Replace the position of the element at `index`.
    pub fn set_point(&mut self, index: usize, point: Point) -> Result<(), Error> {
        let entry = self.entries.get_mut(index).ok_or(Error::NotFound)?;
        entry.0 = point;
        Ok(())
    }
}

impl<P: Copy + PartialEq + Debug> PointIndex<P> for LinearScan<P> {
    fn insert(&mut self, point: Point, payload: P) -> Result<(), Error> {
        self.push(point, payload);
        Ok(())
    }

    fn remove(&mut self, point: Point, payload: P) -> Result<(), Error> {
        let i = self.position(point, payload).ok_or(Error::NotFound)?;
        self.entries.remove(i);
        Ok(())
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn query_rect<'a>(&'a self, rect: Aabb2D<f64>) -> Box<dyn Iterator<Item = (Point, P)> + 'a> {
        Box::new(
            self.entries
                .iter()
                .copied()
                .filter(move |(p, _)| rect.contains(*p)),
        )
    }

    fn k_nearest(&self, target: Point, k: usize) -> Vec<Neighbor<P>> {
        let mut best = KBest::new(k);
        for &(point, payload) in &self.entries {
            best.offer(point.distance(target), point, (point, payload));
        }
        best.into_sorted()
            .into_iter()
            .map(|(distance, (point, payload))| Neighbor {
                point,
                payload,
                distance,
            })
            .collect()
    }
}

impl<P> Debug for LinearScan<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LinearScan")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}
