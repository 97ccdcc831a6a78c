// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Point, Size};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tessera_index::{
    Aabb2D, CancelToken, Highlight, KdTree, Neighbor, NodeId, RangeTraversal, TraversalSlot,
    TraversalStep,
};

use super::Demo;
use crate::SessionError;
use crate::random;

/// k-d tree with an animated range search.
#[derive(Debug)]
pub struct KdTreeDemo {
    tree: KdTree<usize>,
    canvas: Size,
    rng: StdRng,
    next_id: usize,
    slot: TraversalSlot,
    search: Option<RangeTraversal>,
    highlight: Highlight,
    nearest: Vec<Neighbor<usize>>,
}

impl KdTreeDemo {
    /// An empty demo over a canvas of the given size.
    pub fn new(canvas: Size, seed: u64) -> Self {
        Self {
            tree: KdTree::new(),
            canvas,
            rng: StdRng::seed_from_u64(seed),
            next_id: 0,
            slot: TraversalSlot::default(),
            search: None,
            highlight: Highlight::new(),
            nearest: Vec::new(),
        }
    }

    /// The tree.
    pub fn tree(&self) -> &KdTree<usize> {
        &self.tree
    }

    /// Nodes visited and found by the current or last range search.
    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    /// Result of the most recent nearest-neighbor query.
    pub fn nearest(&self) -> &[Neighbor<usize>] {
        &self.nearest
    }

    /// Insert a point. Cancels a running search.
    pub fn insert(&mut self, p: Point) -> NodeId {
        self.cancel_search();
        let id = self.tree.insert(p, self.next_id);
        self.next_id += 1;
        id
    }

    /// Rebuild the tree from its own points by median splits.
    pub fn rebalance(&mut self) {
        self.cancel_search();
        let items: Vec<_> = self.tree.iter().collect();
        self.tree.rebuild(&items);
    }

    /// Find the `k` points nearest to `p`.
    pub fn query_nearest(&mut self, p: Point, k: usize) -> &[Neighbor<usize>] {
        self.nearest = self.tree.k_nearest(p, k);
        &self.nearest
    }

    /// Start an animated range search, cancelling any running one.
    pub fn begin_range_query(&mut self, rect: Aabb2D<f64>) -> CancelToken {
        let token = self.slot.begin();
        self.highlight.clear();
        self.search = Some(self.tree.range_traversal(rect).with_cancel(token.clone()));
        token
    }

    /// Advance the running search by one step and record it in the highlight.
    pub fn step(&mut self) -> Option<TraversalStep<NodeId>> {
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

    /// Whether a range search is running.
    pub fn is_query_active(&self) -> bool {
        self.search.is_some() && self.slot.is_active()
    }

    fn cancel_search(&mut self) {
        self.slot.cancel();
        self.search = None;
    }
}

impl Demo for KdTreeDemo {
    fn reset(&mut self) {
        self.cancel_search();
        self.tree.clear();
        self.highlight.clear();
        self.nearest.clear();
    }

    fn add_random(&mut self, count: usize) -> Result<(), SessionError> {
        for _ in 0..count {
            let p = random::uniform_point(&mut self.rng, self.canvas);
            self.insert(p);
        }
        Ok(())
    }

    /// Fresh random points are bulk built, so the tree starts balanced.
    fn randomize(&mut self, count: usize) -> Result<(), SessionError> {
        self.reset();
        let items: Vec<(Point, usize)> = (0..count)
            .map(|i| (random::uniform_point(&mut self.rng, self.canvas), i))
            .collect();
        self.next_id = count;
        self.tree.rebuild(&items);
        Ok(())
    }

    fn len(&self) -> usize {
        self.tree.len()
    }
}
