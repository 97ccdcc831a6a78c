// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Packed R-tree over axis-aligned rectangles.
//!
//! The tree is bulk loaded: items are chunked into leaves of at most
//! `max_entries`, and node boxes are grouped level by level until few enough
//! remain to hang under a single root. The root always sits above the leaves,
//! so even one leaf gets a level-1 parent. Edits change the flat item list and
//! rebuild the whole tree, which invalidates every [`NodeId`] handed out
//! before.

use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::Point;
use smallvec::SmallVec;

use crate::arena::{Arena, NodeId};
use crate::error::{Error, check_capacity};
use crate::knn::KBest;
use crate::morton;
use crate::traversal::{CancelToken, TraversalStep};
use crate::types::{Aabb2D, union_aabb};

/// Default fan-out.
pub const DEFAULT_MAX_ENTRIES: usize = 4;

/// Order in which items are packed into leaves.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BulkOrder {
    /// Chunk items in the order they were added.
    #[default]
    Insertion,
    /// Sort items along the Z-order curve of their centers first, which keeps
    /// leaf boxes small for scattered input.
    ZOrder,
}

/// A child slot of an [`RNode`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RChild {
    /// An inner child node.
    Node(NodeId),
    /// An item, by its slot in [`RTree::items`].
    Item(usize),
}

/// A node of an [`RTree`].
#[derive(Clone, Debug)]
pub struct RNode {
    bbox: Aabb2D<f64>,
    level: u32,
    children: Vec<RChild>,
}

impl RNode {
    /// Minimum bounding rectangle of everything below this node.
    pub fn bbox(&self) -> Aabb2D<f64> {
        self.bbox
    }

    /// Height above the leaves; leaves are level 0.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Whether the children are items.
    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }

    /// Children in packing order.
    pub fn children(&self) -> &[RChild] {
        &self.children
    }
}

/// One result of [`RTree::k_nearest`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RectNeighbor<P> {
    /// Slot of the item in [`RTree::items`].
    pub slot: usize,
    /// The stored rectangle.
    pub rect: Aabb2D<f64>,
    /// Payload stored with the rectangle.
    pub payload: P,
    /// Distance from the target to the rectangle center.
    pub distance: f64,
}

/// Bulk-loaded R-tree of rectangles with payloads.
pub struct RTree<P> {
    max_entries: usize,
    order: BulkOrder,
    items: Vec<(Aabb2D<f64>, P)>,
    arena: Arena<RNode>,
    root: Option<NodeId>,
}

impl<P> Default for RTree<P> {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            order: BulkOrder::Insertion,
            items: Vec::new(),
            arena: Arena::default(),
            root: None,
        }
    }
}

impl<P: Copy + PartialEq + Debug> RTree<P> {
    /// An empty tree with the given fan-out.
    pub fn new(max_entries: usize) -> Result<Self, Error> {
        Ok(Self {
            max_entries: check_capacity(max_entries)?,
            ..Self::default()
        })
    }

    /// Build a tree over `items` in one pass.
    pub fn bulk_build(items: &[(Aabb2D<f64>, P)], max_entries: usize) -> Result<Self, Error> {
        let mut tree = Self::new(max_entries)?;
        tree.extend(items.iter().copied());
        Ok(tree)
    }

    /// Maximum children per node.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Change the fan-out and rebuild.
    pub fn set_max_entries(&mut self, max_entries: usize) -> Result<(), Error> {
        self.max_entries = check_capacity(max_entries)?;
        self.rebuild();
        Ok(())
    }

    /// Packing order used by rebuilds.
    pub fn order(&self) -> BulkOrder {
        self.order
    }

    /// Change the packing order and rebuild.
    pub fn set_order(&mut self, order: BulkOrder) {
        self.order = order;
        self.rebuild();
    }

    /// Stored items; a slot is an index into this slice.
    pub fn items(&self) -> &[(Aabb2D<f64>, P)] {
        &self.items
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no items are stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Root node, or `None` for an empty tree.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Look up a node. `None` once the handle is stale.
    pub fn node(&self, id: NodeId) -> Option<&RNode> {
        self.arena.get(id)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Add one rectangle and rebuild.
    pub fn insert(&mut self, rect: Aabb2D<f64>, payload: P) {
        self.items.push((rect, payload));
        self.rebuild();
    }

    /// Add many rectangles with a single rebuild.
    pub fn extend(&mut self, items: impl IntoIterator<Item = (Aabb2D<f64>, P)>) {
        self.items.extend(items);
        self.rebuild();
    }

    /// Remove the first item equal to `rect` and `payload`, then rebuild.
    ///
    /// Slots after the removed one shift down by one.
    pub fn remove(&mut self, rect: Aabb2D<f64>, payload: P) -> Result<(), Error> {
        let i = self
            .items
            .iter()
            .position(|&(r, p)| r == rect && p == payload)
            .ok_or(Error::NotFound)?;
        self.items.remove(i);
        self.rebuild();
        Ok(())
    }

    /// Drop every item.
    pub fn clear(&mut self) {
        self.items.clear();
        self.arena.clear();
        self.root = None;
    }

    /// Rebuild the node hierarchy from the item list.
    pub fn rebuild(&mut self) {
        self.arena.clear();
        self.root = None;
        if self.items.is_empty() {
            return;
        }
        let mut slots: Vec<usize> = (0..self.items.len()).collect();
        if self.order == BulkOrder::ZOrder {
            let keys = z_keys(&self.items);
            slots.sort_by_key(|&s| keys[s]);
        }

        let mut level: Vec<NodeId> = slots
            .chunks(self.max_entries)
            .map(|chunk| {
                let children = chunk.iter().map(|&s| RChild::Item(s)).collect();
                self.push_node(0, children)
            })
            .collect();
        let mut height = 1;
        while level.len() > self.max_entries {
            level = level
                .chunks(self.max_entries)
                .map(|chunk| {
                    let children = chunk.iter().map(|&id| RChild::Node(id)).collect();
                    self.push_node(height, children)
                })
                .collect();
            height += 1;
        }
        let children = level.into_iter().map(RChild::Node).collect();
        self.root = Some(self.push_node(height, children));
        tracing::debug!(
            items = self.items.len(),
            nodes = self.arena.len(),
            height,
            order = ?self.order,
            "rebuilt r-tree"
        );
    }

    fn push_node(&mut self, level: u32, children: Vec<RChild>) -> NodeId {
        let bbox = self.children_bbox(&children);
        self.arena.insert(RNode {
            bbox,
            level,
            children,
        })
    }

    fn child_bbox(&self, child: RChild) -> Aabb2D<f64> {
        match child {
            RChild::Node(id) => self.arena[id].bbox,
            RChild::Item(slot) => self.items[slot].0,
        }
    }

    fn children_bbox(&self, children: &[RChild]) -> Aabb2D<f64> {
        let mut it = children.iter().map(|&c| self.child_bbox(c));
        let first = it.next().unwrap_or(Aabb2D::new(0.0, 0.0, 0.0, 0.0));
        it.fold(first, union_aabb)
    }

    /// Up to `k` items whose centers are closest to `target`.
    ///
    /// Children are explored nearest box first; a subtree is skipped when the
    /// distance to its box already exceeds the current k-th best.
    pub fn k_nearest(&self, target: Point, k: usize) -> Vec<RectNeighbor<P>> {
        let mut best = KBest::new(k);
        if let Some(root) = self.root
            && k > 0
        {
            self.knn_visit(root, target, &mut best);
        }
        best.into_sorted()
            .into_iter()
            .map(|(distance, slot)| {
                let (rect, payload) = self.items[slot];
                RectNeighbor {
                    slot,
                    rect,
                    payload,
                    distance,
                }
            })
            .collect()
    }

    fn knn_visit(&self, id: NodeId, target: Point, best: &mut KBest<usize>) {
        let node = &self.arena[id];
        if node.is_leaf() {
            for &child in &node.children {
                if let RChild::Item(slot) = child {
                    let center = self.items[slot].0.center();
                    best.offer(center.distance(target), center, slot);
                }
            }
            return;
        }
        let mut order: SmallVec<[(f64, NodeId); 8]> = node
            .children
            .iter()
            .filter_map(|&c| match c {
                RChild::Node(cid) => Some((self.arena[cid].bbox.distance_to_point(target), cid)),
                RChild::Item(_) => None,
            })
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (lower_bound, cid) in order {
            if lower_bound > best.bound() {
                break;
            }
            self.knn_visit(cid, target, best);
        }
    }

    /// Start an animated intersection search for `rect`.
    pub fn intersect_traversal(&self, rect: Aabb2D<f64>) -> IntersectTraversal {
        IntersectTraversal::new(self.root, rect)
    }

    /// Intersection search as an iterator over a borrowed tree.
    pub fn intersect_steps(&self, rect: Aabb2D<f64>) -> IntersectSteps<'_, P> {
        IntersectSteps {
            tree: self,
            state: self.intersect_traversal(rect),
        }
    }

    /// Slots of every item intersecting `rect`, edges inclusive.
    pub fn query_rect(&self, rect: Aabb2D<f64>) -> Vec<usize> {
        self.intersect_steps(rect)
            .filter_map(TraversalStep::found)
            .collect()
    }
}

/// Quantize item centers to a 65536² grid and take their Morton codes.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Values are clamped to 0..=65535 before the cast."
)]
fn z_keys<P>(items: &[(Aabb2D<f64>, P)]) -> Vec<u64> {
    let centers: Vec<Point> = items.iter().map(|(r, _)| r.center()).collect();
    let bounds = centers
        .iter()
        .map(|&c| Aabb2D::from_point(c))
        .reduce(union_aabb)
        .unwrap_or(Aabb2D::new(0.0, 0.0, 0.0, 0.0));
    let scale = |v: f64, lo: f64, hi: f64| -> u32 {
        if hi > lo {
            ((v - lo) / (hi - lo) * 65535.0).clamp(0.0, 65535.0) as u32
        } else {
            0
        }
    };
    centers
        .iter()
        .map(|c| {
            morton::encode(
                scale(c.x, bounds.min_x, bounds.max_x),
                scale(c.y, bounds.min_y, bounds.max_y),
            )
        })
        .collect()
}

/// Pull-based intersection search over an [`RTree`].
///
/// Yields `Visit` for every node whose box meets the query, then `Found` for
/// each item of a visited leaf that meets it too.
#[derive(Clone, Debug)]
pub struct IntersectTraversal {
    rect: Aabb2D<f64>,
    root: Option<NodeId>,
    stack: SmallVec<[NodeId; 16]>,
    found: SmallVec<[usize; 8]>,
    cancel: Option<CancelToken>,
}

impl IntersectTraversal {
    fn new(root: Option<NodeId>, rect: Aabb2D<f64>) -> Self {
        let mut this = Self {
            rect,
            root,
            stack: SmallVec::new(),
            found: SmallVec::new(),
            cancel: None,
        };
        this.restart();
        this
    }

    /// Stop stepping once `token` is cancelled.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The query rectangle.
    pub fn rect(&self) -> Aabb2D<f64> {
        self.rect
    }

    /// Rewind to the first step.
    pub fn restart(&mut self) {
        self.stack.clear();
        self.found.clear();
        self.stack.extend(self.root);
    }

    /// Whether no further steps will be produced.
    pub fn is_finished(&self) -> bool {
        self.found.is_empty() && self.stack.is_empty()
    }

    /// Perform one step against `tree`.
    ///
    /// Returns `None` when done, cancelled, or when `tree` was rebuilt since
    /// the search began.
    pub fn next_step<P: Copy + PartialEq + Debug>(
        &mut self,
        tree: &RTree<P>,
    ) -> Option<TraversalStep<usize>> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            self.stack.clear();
            self.found.clear();
            return None;
        }
        if let Some(slot) = self.found.pop() {
            return Some(TraversalStep::Found(slot));
        }
        loop {
            let id = self.stack.pop()?;
            let Some(node) = tree.node(id) else {
                tracing::trace!(?id, "intersection search hit a stale node, stopping");
                self.stack.clear();
                return None;
            };
            if !node.bbox.intersects(&self.rect) {
                // Only the root can get here; children are filtered on push.
                continue;
            }
            for &child in node.children.iter().rev() {
                match child {
                    RChild::Node(cid) => {
                        if tree.arena[cid].bbox.intersects(&self.rect) {
                            self.stack.push(cid);
                        }
                    }
                    RChild::Item(slot) => {
                        if tree.items[slot].0.intersects(&self.rect) {
                            self.found.push(slot);
                        }
                    }
                }
            }
            return Some(TraversalStep::Visit(id));
        }
    }
}

/// Iterator adapter driving an [`IntersectTraversal`] over a borrowed tree.
pub struct IntersectSteps<'a, P> {
    tree: &'a RTree<P>,
    state: IntersectTraversal,
}

impl<P: Copy + PartialEq + Debug> Iterator for IntersectSteps<'_, P> {
    type Item = TraversalStep<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        self.state.next_step(self.tree)
    }
}

impl<P> Debug for IntersectSteps<'_, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IntersectSteps")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<P> Debug for RTree<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RTree")
            .field("max_entries", &self.max_entries)
            .field("order", &self.order)
            .field("items", &self.items.len())
            .field("nodes", &self.arena.len())
            .field("has_root", &self.root.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_rects(seed: u64, n: usize) -> Vec<(Aabb2D<f64>, usize)> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|i| {
                let w = rng.random_range(20.0..60.0);
                let h = rng.random_range(20.0..60.0);
                let x = rng.random_range(0.0..750.0 - w);
                let y = rng.random_range(0.0..750.0 - h);
                (Aabb2D::from_xywh(x, y, w, h), i)
            })
            .collect()
    }

    /// Every node box is exactly the union of its children and levels step by one.
    fn assert_tight<P: Copy + PartialEq + Debug>(tree: &RTree<P>, id: NodeId) -> usize {
        let node = tree.node(id).unwrap();
        assert!(!node.children().is_empty());
        assert!(node.children().len() <= tree.max_entries());
        assert_eq!(node.bbox(), tree.children_bbox(node.children()));
        let mut items = 0;
        for &child in node.children() {
            match child {
                RChild::Node(cid) => {
                    assert_eq!(tree.node(cid).unwrap().level() + 1, node.level());
                    items += assert_tight(tree, cid);
                }
                RChild::Item(_) => {
                    assert!(node.is_leaf());
                    items += 1;
                }
            }
        }
        items
    }

    #[test]
    fn empty_tree_has_no_root() {
        let tree = RTree::<u8>::default();
        assert!(tree.root().is_none());
        assert!(tree.k_nearest(Point::ORIGIN, 3).is_empty());
        assert!(tree.query_rect(Aabb2D::new(0.0, 0.0, 1e9, 1e9)).is_empty());
        assert!(
            RTree::<u8>::bulk_build(&[], 4).unwrap().root().is_none(),
            "empty input builds an empty tree"
        );
    }

    #[test]
    fn single_leaf_still_gets_a_root() {
        let tree = RTree::bulk_build(&random_rects(1, 3), 4).unwrap();
        let root = tree.node(tree.root().unwrap()).unwrap();
        assert_eq!(root.level(), 1);
        assert_eq!(root.children().len(), 1);
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn levels_group_by_max_entries() {
        // 25 items: 7 leaves, 2 level-1 nodes, one root at level 2.
        let tree = RTree::bulk_build(&random_rects(2, 25), 4).unwrap();
        let root_id = tree.root().unwrap();
        let root = tree.node(root_id).unwrap();
        assert_eq!(root.level(), 2);
        assert_eq!(root.children().len(), 2);
        assert_eq!(tree.node_count(), 10);
        assert_eq!(assert_tight(&tree, root_id), 25);
    }

    #[test]
    fn z_order_packing_stays_tight_and_answers_the_same() {
        let items = random_rects(3, 120);
        let mut tree = RTree::bulk_build(&items, 5).unwrap();
        let window = Aabb2D::new(100.0, 200.0, 400.0, 380.0);
        let mut before = tree.query_rect(window);
        tree.set_order(BulkOrder::ZOrder);
        assert_eq!(assert_tight(&tree, tree.root().unwrap()), 120);
        let mut after = tree.query_rect(window);
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
    }

    #[test]
    fn k_nearest_matches_sorted_centers() {
        let items = random_rects(4, 200);
        let tree = RTree::bulk_build(&items, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(40);
        for _ in 0..30 {
            let target = Point::new(rng.random_range(0.0..750.0), rng.random_range(0.0..750.0));
            let mut expect: Vec<f64> = items.iter().map(|(r, _)| r.center().distance(target)).collect();
            expect.sort_by(f64::total_cmp);
            expect.truncate(5);
            let got: Vec<f64> = tree.k_nearest(target, 5).iter().map(|n| n.distance).collect();
            assert_eq!(got, expect);
        }
    }

    #[test]
    fn intersection_traversal_matches_filter() {
        let items = random_rects(5, 150);
        let mut tree = RTree::bulk_build(&items, 4).unwrap();
        tree.set_order(BulkOrder::ZOrder);
        let window = Aabb2D::from_center(Point::new(375.0, 375.0), 120.0, 80.0);
        let mut visited = 0;
        let mut found = Vec::new();
        for step in tree.intersect_steps(window) {
            match step {
                TraversalStep::Visit(id) => {
                    assert!(tree.node(id).unwrap().bbox().intersects(&window));
                    visited += 1;
                }
                TraversalStep::Found(slot) => found.push(slot),
            }
        }
        let mut expect: Vec<usize> = items
            .iter()
            .filter(|(r, _)| r.intersects(&window))
            .map(|&(_, i)| i)
            .collect();
        found.sort_unstable();
        expect.sort_unstable();
        assert_eq!(found, expect);
        assert!(visited < tree.node_count(), "disjoint subtrees are skipped");
    }

    #[test]
    fn rebuild_ends_old_traversals() {
        let mut tree = RTree::bulk_build(&random_rects(6, 30), 4).unwrap();
        let mut search = tree.intersect_traversal(Aabb2D::new(0.0, 0.0, 750.0, 750.0));
        assert!(search.next_step(&tree).is_some());
        tree.insert(Aabb2D::new(1.0, 1.0, 2.0, 2.0), 99);
        assert_eq!(search.next_step(&tree), None);
        assert!(search.is_finished());
    }

    #[test]
    fn cancelled_traversal_stops_and_restart_replays() {
        let tree = RTree::bulk_build(&random_rects(7, 40), 4).unwrap();
        let token = CancelToken::new();
        let window = Aabb2D::new(0.0, 0.0, 400.0, 400.0);
        let mut search = tree.intersect_traversal(window).with_cancel(token.clone());
        let first: Vec<_> = core::iter::from_fn(|| search.next_step(&tree)).collect();
        search.restart();
        let second: Vec<_> = core::iter::from_fn(|| search.next_step(&tree)).collect();
        assert_eq!(first, second);

        search.restart();
        token.cancel();
        assert_eq!(search.next_step(&tree), None);
    }

    #[test]
    fn remove_shifts_slots_and_reports_missing() {
        let items = random_rects(8, 10);
        let mut tree = RTree::bulk_build(&items, 3).unwrap();
        let (rect, payload) = items[4];
        tree.remove(rect, payload).unwrap();
        assert_eq!(tree.len(), 9);
        assert_eq!(tree.items()[4], items[5]);
        assert_eq!(tree.remove(rect, payload), Err(Error::NotFound));
        assert_eq!(assert_tight(&tree, tree.root().unwrap()), 9);
        tree.clear();
        assert!(tree.root().is_none());
    }

    #[test]
    fn fan_out_is_validated() {
        assert_eq!(
            RTree::<u8>::new(1).unwrap_err(),
            Error::InvalidCapacity {
                requested: 1,
                minimum: 2
            }
        );
        let mut tree = RTree::bulk_build(&random_rects(9, 20), 4).unwrap();
        tree.set_max_entries(8).unwrap();
        assert_eq!(assert_tight(&tree, tree.root().unwrap()), 20);
    }
}
