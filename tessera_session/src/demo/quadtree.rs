// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Point;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tessera_index::{Aabb2D, Neighbor, QuadTree};

use super::Demo;
use crate::SessionError;
use crate::random;

/// Quadtree over the canvas fed with clustered random points.
#[derive(Debug)]
pub struct QuadTreeDemo {
    tree: QuadTree<usize>,
    rng: StdRng,
    next_id: usize,
    selection: Vec<(Point, usize)>,
    nearest: Vec<Neighbor<usize>>,
}

impl QuadTreeDemo {
    /// An empty demo whose root covers `boundary`.
    pub fn new(boundary: Aabb2D<f64>, capacity: usize, seed: u64) -> Result<Self, SessionError> {
        Ok(Self {
            tree: QuadTree::new(boundary, capacity)?,
            rng: StdRng::seed_from_u64(seed),
            next_id: 0,
            selection: Vec::new(),
            nearest: Vec::new(),
        })
    }

    /// The tree.
    pub fn tree(&self) -> &QuadTree<usize> {
        &self.tree
    }

    /// Points found by the most recent range query.
    pub fn selection(&self) -> &[(Point, usize)] {
        &self.selection
    }

    /// Result of the most recent nearest-neighbor query.
    pub fn nearest(&self) -> &[Neighbor<usize>] {
        &self.nearest
    }

    /// Insert a point; points outside the root boundary are rejected.
    pub fn insert(&mut self, p: Point) -> Result<(), SessionError> {
        self.tree.insert(p, self.next_id)?;
        self.next_id += 1;
        Ok(())
    }

    /// Remove the point nearest to `p`, merging emptied quadrants.
    pub fn remove_nearest(&mut self, p: Point) -> Result<Option<(Point, usize)>, SessionError> {
        let Some(n) = self.tree.k_nearest(p, 1).first().copied() else {
            return Ok(None);
        };
        self.tree.remove(n.point, n.payload)?;
        self.selection.clear();
        self.nearest.clear();
        Ok(Some((n.point, n.payload)))
    }

    /// Points inside `range`, edges inclusive.
    pub fn query(&mut self, range: Aabb2D<f64>) -> &[(Point, usize)] {
        self.selection = self.tree.query(range);
        &self.selection
    }

    /// Find the `k` points nearest to `p`.
    pub fn query_nearest(&mut self, p: Point, k: usize) -> &[Neighbor<usize>] {
        self.nearest = self.tree.k_nearest(p, k);
        &self.nearest
    }

    /// Change the bucket capacity, redistributing every point.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), SessionError> {
        self.tree.set_capacity(capacity)?;
        Ok(())
    }
}

impl Demo for QuadTreeDemo {
    fn reset(&mut self) {
        self.tree.clear();
        self.selection.clear();
        self.nearest.clear();
    }

    fn add_random(&mut self, count: usize) -> Result<(), SessionError> {
        let boundary = self.tree.boundary();
        for _ in 0..count {
            let p = random::gaussian_point(&mut self.rng, boundary);
            self.insert(p)?;
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.tree.len()
    }
}
