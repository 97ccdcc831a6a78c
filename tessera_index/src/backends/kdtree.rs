// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2-d tree with median bulk build, incremental insert, find-min deletion,
//! pruned k-nearest search, and a steppable range search.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::Point;
use smallvec::SmallVec;

use crate::arena::{Arena, NodeId};
use crate::backend::{Neighbor, PointIndex};
use crate::error::Error;
use crate::knn::KBest;
use crate::traversal::{CancelToken, TraversalStep};
use crate::types::{Aabb2D, Axis};

/// A node of a [`KdTree`].
#[derive(Clone, Debug)]
pub struct KdNode<P> {
    point: Point,
    payload: P,
    axis: Axis,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl<P: Copy> KdNode<P> {
    /// The stored point.
    pub fn point(&self) -> Point {
        self.point
    }

    /// The payload stored with the point.
    pub fn payload(&self) -> P {
        self.payload
    }

    /// Axis this node splits on, fixed by its depth.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Subtree holding points strictly less than this one on [`Self::axis`].
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    /// Subtree holding points greater than or equal on [`Self::axis`].
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }
}

/// A 2-d tree over points with payloads.
///
/// The splitting axis of a node is fixed by its depth: x at even depths,
/// y at odd ones. A point goes left only when it is strictly less than the
/// node on that axis, so equal coordinates always descend right.
pub struct KdTree<P> {
    arena: Arena<KdNode<P>>,
    root: Option<NodeId>,
}

impl<P> Default for KdTree<P> {
    fn default() -> Self {
        Self {
            arena: Arena::default(),
            root: None,
        }
    }
}

impl<P: Copy + PartialEq + Debug> KdTree<P> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a balanced tree by recursive median split.
    ///
    /// At each level the items are stably sorted on the depth axis and the
    /// element at index `len / 2` becomes the node.
    pub fn build(items: &[(Point, P)]) -> Self {
        let mut tree = Self::default();
        tree.rebuild(items);
        tree
    }

    /// Replace the contents with a balanced tree over `items`.
    pub fn rebuild(&mut self, items: &[(Point, P)]) {
        self.arena.clear();
        let mut items = items.to_vec();
        self.root = Self::build_node(&mut self.arena, &mut items, 0);
        tracing::debug!(len = items.len(), depth = self.depth(), "rebuilt k-d tree");
    }

    fn build_node(
        arena: &mut Arena<KdNode<P>>,
        items: &mut [(Point, P)],
        depth: usize,
    ) -> Option<NodeId> {
        if items.is_empty() {
            return None;
        }
        let axis = Axis::for_depth(depth);
        items.sort_by(|a, b| axis.of(a.0).total_cmp(&axis.of(b.0)));
        let mid = items.len() / 2;
        let (point, payload) = items[mid];
        let (lower, upper) = items.split_at_mut(mid);
        let left = Self::build_node(arena, lower, depth + 1);
        let right = Self::build_node(arena, &mut upper[1..], depth + 1);
        Some(arena.insert(KdNode {
            point,
            payload,
            axis,
            left,
            right,
        }))
    }

    /// Root node, if any.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Look up a node. Returns `None` for stale handles.
    pub fn node(&self, id: NodeId) -> Option<&KdNode<P>> {
        self.arena.get(id)
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Remove every point. Outstanding node handles go stale.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
    }

    /// Number of levels; zero for an empty tree.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: SmallVec<[(NodeId, usize); 32]> = SmallVec::new();
        stack.extend(self.root.map(|r| (r, 1)));
        while let Some((id, d)) = stack.pop() {
            deepest = deepest.max(d);
            let n = &self.arena[id];
            stack.extend(n.left.map(|c| (c, d + 1)));
            stack.extend(n.right.map(|c| (c, d + 1)));
        }
        deepest
    }

    /// Points in pre-order (node, left subtree, right subtree).
    pub fn iter(&self) -> impl Iterator<Item = (Point, P)> + '_ {
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        core::iter::from_fn(move || {
            let id = stack.pop()?;
            let n = &self.arena[id];
            stack.extend(n.right);
            stack.extend(n.left);
            Some((n.point, n.payload))
        })
    }

    /// Insert a point as a new leaf and return its node.
    pub fn insert(&mut self, point: Point, payload: P) -> NodeId {
        let Some(mut cur) = self.root else {
            let id = self.arena.insert(KdNode {
                point,
                payload,
                axis: Axis::X,
                left: None,
                right: None,
            });
            self.root = Some(id);
            return id;
        };
        let mut depth = 0;
        loop {
            let node = &self.arena[cur];
            let go_left = node.axis.of(point) < node.axis.of(node.point);
            let next = if go_left { node.left } else { node.right };
            depth += 1;
            match next {
                Some(child) => cur = child,
                None => {
                    let id = self.arena.insert(KdNode {
                        point,
                        payload,
                        axis: Axis::for_depth(depth),
                        left: None,
                        right: None,
                    });
                    let parent = &mut self.arena[cur];
                    if go_left {
                        parent.left = Some(id);
                    } else {
                        parent.right = Some(id);
                    }
                    return id;
                }
            }
        }
    }

    /// Remove one point equal to `point` and `payload`.
    ///
    /// A removed interior node is refilled with the minimum (on its axis) of
    /// its right subtree, or of its left subtree which then becomes the right
    /// one. Handles of surviving nodes stay valid but a refilled node now
    /// holds a different point.
    pub fn remove(&mut self, point: Point, payload: P) -> Result<(), Error> {
        self.root = self.remove_from(self.root, point, payload)?;
        Ok(())
    }

    fn remove_from(
        &mut self,
        node: Option<NodeId>,
        point: Point,
        payload: P,
    ) -> Result<Option<NodeId>, Error> {
        let id = node.ok_or(Error::NotFound)?;
        let KdNode {
            point: here,
            payload: here_payload,
            axis,
            left,
            right,
        } = self.arena[id];
        if here == point && here_payload == payload {
            if let Some(r) = right {
                let m = self.find_min(r, axis);
                let (mp, mv) = (self.arena[m].point, self.arena[m].payload);
                let new_right = self.remove_from(Some(r), mp, mv)?;
                let n = &mut self.arena[id];
                n.point = mp;
                n.payload = mv;
                n.right = new_right;
            } else if let Some(l) = left {
                let m = self.find_min(l, axis);
                let (mp, mv) = (self.arena[m].point, self.arena[m].payload);
                let new_right = self.remove_from(Some(l), mp, mv)?;
                let n = &mut self.arena[id];
                n.point = mp;
                n.payload = mv;
                n.left = None;
                n.right = new_right;
            } else {
                self.arena.remove(id);
                return Ok(None);
            }
            return Ok(Some(id));
        }
        if axis.of(point) < axis.of(here) {
            let new_left = self.remove_from(left, point, payload)?;
            self.arena[id].left = new_left;
        } else {
            let new_right = self.remove_from(right, point, payload)?;
            self.arena[id].right = new_right;
        }
        Ok(Some(id))
    }

    /// Node holding the smallest coordinate on `axis` within the subtree.
    fn find_min(&self, id: NodeId, axis: Axis) -> NodeId {
        let n = &self.arena[id];
        if n.axis == axis {
            return match n.left {
                Some(l) => self.find_min(l, axis),
                None => id,
            };
        }
        let mut best = id;
        for child in [n.left, n.right].into_iter().flatten() {
            let m = self.find_min(child, axis);
            if axis.of(self.arena[m].point) < axis.of(self.arena[best].point) {
                best = m;
            }
        }
        best
    }

    /// Up to `k` stored points closest to `target`, ascending by distance.
    pub fn k_nearest(&self, target: Point, k: usize) -> Vec<Neighbor<P>> {
        self.k_nearest_counted(target, k).0
    }

    /// Like [`Self::k_nearest`], also reporting how many nodes were visited.
    pub fn k_nearest_counted(&self, target: Point, k: usize) -> (Vec<Neighbor<P>>, usize) {
        let mut visited = 0;
        let Some(root) = self.root else {
            return (Vec::new(), visited);
        };
        if k == 0 {
            return (Vec::new(), visited);
        }
        let mut best = KBest::new(k);
        self.nearest_from(root, target, &mut best, &mut visited);
        let out = best
            .into_sorted()
            .into_iter()
            .map(|(distance, id)| {
                let n = &self.arena[id];
                Neighbor {
                    point: n.point,
                    payload: n.payload,
                    distance,
                }
            })
            .collect();
        (out, visited)
    }

    fn nearest_from(
        &self,
        id: NodeId,
        target: Point,
        best: &mut KBest<NodeId>,
        visited: &mut usize,
    ) {
        *visited += 1;
        let n = &self.arena[id];
        best.offer(n.point.distance(target), n.point, id);
        let diff = n.axis.of(target) - n.axis.of(n.point);
        let (near, far) = if diff < 0.0 {
            (n.left, n.right)
        } else {
            (n.right, n.left)
        };
        if let Some(near) = near {
            self.nearest_from(near, target, best, visited);
        }
        if let Some(far) = far {
            // The splitting line is |diff| away. A point on the line may tie
            // the worst candidate and still win on position.
            if !best.is_full() || diff.abs() <= best.bound() {
                self.nearest_from(far, target, best, visited);
            }
        }
    }

    /// Start a steppable range search over `rect`.
    pub fn range_traversal(&self, rect: Aabb2D<f64>) -> RangeTraversal {
        RangeTraversal::new(self.root, rect)
    }

    /// Borrowing iterator over the steps of a range search.
    pub fn range_steps(&self, rect: Aabb2D<f64>) -> RangeSteps<'_, P> {
        RangeSteps {
            tree: self,
            state: self.range_traversal(rect),
        }
    }

    /// Nodes whose points lie inside `rect`, edges inclusive, in search order.
    pub fn query_rect(&self, rect: Aabb2D<f64>) -> Vec<NodeId> {
        self.range_steps(rect)
            .filter_map(TraversalStep::found)
            .collect()
    }
}

/// Resumable state of a k-d tree range search.
///
/// Each [`next_step`](Self::next_step) reports a `Visit` for the node it
/// examines, then a `Found` for that node if its point lies in the range,
/// then continues into the left subtree when `min <= coord` and into the
/// right subtree when `max >= coord` on the node's axis.
#[derive(Clone, Debug)]
pub struct RangeTraversal {
    rect: Aabb2D<f64>,
    root: Option<NodeId>,
    stack: SmallVec<[NodeId; 16]>,
    pending: Option<NodeId>,
    cancel: Option<CancelToken>,
}

impl RangeTraversal {
    fn new(root: Option<NodeId>, rect: Aabb2D<f64>) -> Self {
        let mut stack = SmallVec::new();
        stack.extend(root);
        Self {
            rect,
            root,
            stack,
            pending: None,
            cancel: None,
        }
    }

    /// Stop stepping once `token` is cancelled.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The searched range.
    pub fn rect(&self) -> Aabb2D<f64> {
        self.rect
    }

    /// Rewind to the first step.
    pub fn restart(&mut self) {
        self.stack.clear();
        self.stack.extend(self.root);
        self.pending = None;
    }

    /// Whether no further steps will be produced.
    pub fn is_finished(&self) -> bool {
        self.pending.is_none() && self.stack.is_empty()
    }

    /// Perform one step against `tree`.
    ///
    /// Returns `None` when the search is done, was cancelled, or `tree` no
    /// longer holds the nodes this search was started on.
    pub fn next_step<P: Copy>(&mut self, tree: &KdTree<P>) -> Option<TraversalStep<NodeId>> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            self.stack.clear();
            self.pending = None;
            return None;
        }
        if let Some(id) = self.pending.take() {
            return Some(TraversalStep::Found(id));
        }
        let id = self.stack.pop()?;
        let Some(n) = tree.arena.get(id) else {
            tracing::trace!(?id, "range search hit a stale node, stopping");
            self.stack.clear();
            return None;
        };
        let coord = n.axis.of(n.point);
        let (lo, hi) = n.axis.span(&self.rect);
        // Right is pushed first so the left subtree is explored first.
        if hi >= coord {
            self.stack.extend(n.right);
        }
        if lo <= coord {
            self.stack.extend(n.left);
        }
        if self.rect.contains(n.point) {
            self.pending = Some(id);
        }
        Some(TraversalStep::Visit(id))
    }
}

/// Iterator adapter driving a [`RangeTraversal`] over a borrowed tree.
pub struct RangeSteps<'a, P> {
    tree: &'a KdTree<P>,
    state: RangeTraversal,
}

impl<P: Copy> Iterator for RangeSteps<'_, P> {
    type Item = TraversalStep<NodeId>;

    fn next(&mut self) -> Option<Self::Item> {
        self.state.next_step(self.tree)
    }
}

impl<P> Debug for RangeSteps<'_, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RangeSteps")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<P: Copy + PartialEq + Debug> PointIndex<P> for KdTree<P> {
    fn insert(&mut self, point: Point, payload: P) -> Result<(), Error> {
        Self::insert(self, point, payload);
        Ok(())
    }

    fn remove(&mut self, point: Point, payload: P) -> Result<(), Error> {
        Self::remove(self, point, payload)
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn query_rect<'a>(&'a self, rect: Aabb2D<f64>) -> Box<dyn Iterator<Item = (Point, P)> + 'a> {
        Box::new(self.range_steps(rect).filter_map(|step| {
            let n = &self.arena[step.found()?];
            Some((n.point, n.payload))
        }))
    }

    fn k_nearest(&self, target: Point, k: usize) -> Vec<Neighbor<P>> {
        Self::k_nearest(self, target, k)
    }
}

impl<P> Debug for KdTree<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KdTree")
            .field("len", &self.arena.len())
            .field("has_root", &self.root.is_some())
            .finish_non_exhaustive()
    }
}
