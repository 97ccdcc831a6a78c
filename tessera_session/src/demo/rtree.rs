// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Point, Size};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tessera_index::{
    Aabb2D, BulkOrder, CancelToken, Highlight, IntersectTraversal, RTree, RectNeighbor,
    TraversalSlot, TraversalStep,
};

use super::Demo;
use crate::SessionError;
use crate::random;

/// R-tree of random rectangles with an animated intersection search.
#[derive(Debug)]
pub struct RTreeDemo {
    tree: RTree<usize>,
    canvas: Size,
    rng: StdRng,
    next_id: usize,
    slot: TraversalSlot,
    search: Option<IntersectTraversal>,
    highlight: Highlight,
    nearest: Vec<RectNeighbor<usize>>,
}

impl RTreeDemo {
    /// An empty demo with the given fan-out.
    pub fn new(canvas: Size, max_entries: usize, seed: u64) -> Result<Self, SessionError> {
        Ok(Self {
            tree: RTree::new(max_entries)?,
            canvas,
            rng: StdRng::seed_from_u64(seed),
            next_id: 0,
            slot: TraversalSlot::default(),
            search: None,
            highlight: Highlight::new(),
            nearest: Vec::new(),
        })
    }

    /// The tree.
    pub fn tree(&self) -> &RTree<usize> {
        &self.tree
    }

    /// Nodes visited and items found by the current or last search.
    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    /// Result of the most recent nearest-neighbor query.
    pub fn nearest(&self) -> &[RectNeighbor<usize>] {
        &self.nearest
    }

    /// Add a rectangle and rebuild. Cancels a running search.
    pub fn insert(&mut self, rect: Aabb2D<f64>) {
        self.edit();
        self.tree.insert(rect, self.next_id);
        self.next_id += 1;
    }

    /// Add a random-sized rectangle around a click at `p`, kept inside the
    /// canvas. Clicks off the canvas are rejected.
    pub fn insert_at(&mut self, p: Point) -> Result<Aabb2D<f64>, SessionError> {
        if !Aabb2D::from(self.canvas.to_rect()).contains(p) {
            return Err(tessera_index::Error::OutOfBounds.into());
        }
        let rect = random::rect_at(&mut self.rng, p, self.canvas);
        self.insert(rect);
        Ok(rect)
    }

    /// Remove the rectangle whose center is nearest to `p`.
    pub fn remove_nearest(&mut self, p: Point) -> Result<Option<RectNeighbor<usize>>, SessionError> {
        let Some(n) = self.tree.k_nearest(p, 1).first().copied() else {
            return Ok(None);
        };
        self.edit();
        self.tree.remove(n.rect, n.payload)?;
        Ok(Some(n))
    }

    /// Change the fan-out and rebuild.
    pub fn set_max_entries(&mut self, max_entries: usize) -> Result<(), SessionError> {
        self.edit();
        self.tree.set_max_entries(max_entries)?;
        Ok(())
    }

    /// Change the leaf packing order and rebuild.
    pub fn set_order(&mut self, order: BulkOrder) {
        self.edit();
        self.tree.set_order(order);
    }

    /// Find the `k` rectangles whose centers are nearest to `p`.
    pub fn query_nearest(&mut self, p: Point, k: usize) -> &[RectNeighbor<usize>] {
        self.nearest = self.tree.k_nearest(p, k);
        &self.nearest
    }

    /// Start an animated intersection search, cancelling any running one.
    pub fn begin_intersect_query(&mut self, rect: Aabb2D<f64>) -> CancelToken {
        let token = self.slot.begin();
        self.highlight.clear();
        self.search = Some(
            self.tree
                .intersect_traversal(rect)
                .with_cancel(token.clone()),
        );
        token
    }

    /// Advance the running search by one step and record it in the highlight.
    pub fn step(&mut self) -> Option<TraversalStep<usize>> {
        let search = self.search.as_mut()?;
        match search.next_step(&self.tree) {
            Some(step) => {
                self.highlight.apply(step);
                Some(step)
            }
            None => {
                self.search = None;
                self.slot.cancel();
                None
            }
        }
    }

    /// Run the current search to completion; returns the number of hits.
    pub fn finish_query(&mut self) -> usize {
        while self.step().is_some() {}
        self.highlight.found_count()
    }

    /// Whether an intersection search is running.
    pub fn is_query_active(&self) -> bool {
        self.search.is_some() && self.slot.is_active()
    }

    // Item slots shift on every rebuild, so old marks point at the wrong rects.
    fn edit(&mut self) {
        self.slot.cancel();
        self.search = None;
        self.highlight.clear();
        self.nearest.clear();
    }
}

impl Demo for RTreeDemo {
    fn reset(&mut self) {
        self.edit();
        self.tree.clear();
    }

    fn add_random(&mut self, count: usize) -> Result<(), SessionError> {
        self.edit();
        let first = self.next_id;
        let items: Vec<_> = (first..first + count)
            .map(|id| (random::rect(&mut self.rng, self.canvas), id))
            .collect();
        self.next_id += count;
        self.tree.extend(items);
        Ok(())
    }

    fn len(&self) -> usize {
        self.tree.len()
    }
}
