// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point region quadtree with bucket capacity.
//!
//! Points live only in leaves. A full leaf that receives another point splits
//! into four quadrants and pushes its points down into them. Removing points
//! merges a subtree back into a leaf once it holds no more than the capacity.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::Point;
use smallvec::SmallVec;

use crate::arena::{Arena, NodeId};
use crate::backend::{Neighbor, PointIndex};
use crate::error::{Error, check_capacity};
use crate::knn::KBest;
use crate::types::Aabb2D;

/// Depth at which leaves stop splitting and accept more than the capacity.
///
/// Without a limit, more than `capacity` coincident points would split forever.
pub const MAX_DEPTH: usize = 24;

/// Child quadrant of a divided node.
///
/// North is toward smaller y, matching screen coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// Larger x, smaller y.
    NorthEast,
    /// Smaller x, smaller y.
    NorthWest,
    /// Larger x, larger y.
    SouthEast,
    /// Smaller x, larger y.
    SouthWest,
}

impl Quadrant {
    /// The fixed order in which children are tried on insertion.
    pub const ALL: [Self; 4] = [
        Self::NorthEast,
        Self::NorthWest,
        Self::SouthEast,
        Self::SouthWest,
    ];

    fn of(self, b: &Aabb2D<f64>) -> Aabb2D<f64> {
        let c = b.center();
        match self {
            Self::NorthEast => Aabb2D::new(c.x, b.min_y, b.max_x, c.y),
            Self::NorthWest => Aabb2D::new(b.min_x, b.min_y, c.x, c.y),
            Self::SouthEast => Aabb2D::new(c.x, c.y, b.max_x, b.max_y),
            Self::SouthWest => Aabb2D::new(b.min_x, c.y, c.x, b.max_y),
        }
    }
}

/// A node of a [`QuadTree`].
#[derive(Clone, Debug)]
pub struct QuadNode<P> {
    boundary: Aabb2D<f64>,
    depth: usize,
    points: Vec<(Point, P)>,
    children: Option<[NodeId; 4]>,
}

impl<P> QuadNode<P> {
    /// Region covered by the node.
    pub fn boundary(&self) -> Aabb2D<f64> {
        self.boundary
    }

    /// Depth below the root, which is at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Points held directly by the node; empty for divided nodes.
    pub fn points(&self) -> &[(Point, P)] {
        &self.points
    }

    /// Children in [`Quadrant::ALL`] order, if divided.
    pub fn children(&self) -> Option<[NodeId; 4]> {
        self.children
    }

    /// Whether the node has been subdivided.
    pub fn is_divided(&self) -> bool {
        self.children.is_some()
    }
}

/// Region quadtree over a fixed boundary.
pub struct QuadTree<P> {
    arena: Arena<QuadNode<P>>,
    root: NodeId,
    boundary: Aabb2D<f64>,
    capacity: usize,
    len: usize,
}

impl<P: Copy + PartialEq + Debug> QuadTree<P> {
    /// Create an empty tree covering `boundary`, splitting leaves that would
    /// hold more than `capacity` points.
    pub fn new(boundary: Aabb2D<f64>, capacity: usize) -> Result<Self, Error> {
        let capacity = check_capacity(capacity)?;
        let mut arena = Arena::default();
        let root = arena.insert(QuadNode {
            boundary,
            depth: 0,
            points: Vec::new(),
            children: None,
        });
        Ok(Self {
            arena,
            root,
            boundary,
            capacity,
            len: 0,
        })
    }

    /// Region covered by the tree.
    pub fn boundary(&self) -> Aabb2D<f64> {
        self.boundary
    }

    /// Bucket capacity of a leaf.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Root node. Always present, possibly an empty leaf.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node. Returns `None` for stale handles.
    pub fn node(&self, id: NodeId) -> Option<&QuadNode<P>> {
        self.arena.get(id)
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no points.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of live nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Deepest node depth plus one.
    pub fn depth(&self) -> usize {
        self.nodes().map(|(_, n)| n.depth + 1).max().unwrap_or(0)
    }

    /// Every live node in depth-first order, starting at the root.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &QuadNode<P>)> + '_ {
        let mut stack = alloc::vec![self.root];
        core::iter::from_fn(move || {
            let id = stack.pop()?;
            let n = &self.arena[id];
            if let Some(children) = n.children {
                stack.extend(children.iter().rev());
            }
            Some((id, n))
        })
    }

    /// Remove every point and collapse to a single empty root.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = self.arena.insert(QuadNode {
            boundary: self.boundary,
            depth: 0,
            points: Vec::new(),
            children: None,
        });
        self.len = 0;
    }

    /// Change the capacity and rebuild the tree with the same points.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), Error> {
        self.capacity = check_capacity(capacity)?;
        let points: Vec<_> = self.iter().collect();
        self.clear();
        for (p, v) in points {
            self.insert(p, v)?;
        }
        Ok(())
    }

    /// All points in depth-first leaf order.
    pub fn iter(&self) -> impl Iterator<Item = (Point, P)> + '_ {
        self.nodes().flat_map(|(_, n)| n.points.iter().copied())
    }

    fn child_for(&self, children: [NodeId; 4], p: Point) -> Option<NodeId> {
        children
            .into_iter()
            .find(|&c| self.arena[c].boundary.contains(p))
    }

    /// Insert a point and return the leaf that stores it.
    ///
    /// Children are tried in [`Quadrant::ALL`] order, so a point on a shared
    /// edge lands in the first quadrant containing it.
    pub fn insert(&mut self, point: Point, payload: P) -> Result<NodeId, Error> {
        if !self.boundary.contains(point) {
            return Err(Error::OutOfBounds);
        }
        let mut id = self.root;
        loop {
            let n = &self.arena[id];
            if let Some(children) = n.children {
                id = self.child_for(children, point).ok_or(Error::OutOfBounds)?;
                continue;
            }
            if n.points.len() < self.capacity || n.depth >= MAX_DEPTH {
                if n.depth >= MAX_DEPTH && n.points.len() >= self.capacity {
                    tracing::warn!(?point, depth = n.depth, "quadtree leaf over capacity at depth limit");
                }
                self.arena[id].points.push((point, payload));
                self.len += 1;
                return Ok(id);
            }
            self.subdivide(id);
        }
    }

    fn subdivide(&mut self, id: NodeId) {
        let (boundary, depth) = {
            let n = &self.arena[id];
            (n.boundary, n.depth)
        };
        let children = Quadrant::ALL.map(|q| {
            self.arena.insert(QuadNode {
                boundary: q.of(&boundary),
                depth: depth + 1,
                points: Vec::new(),
                children: None,
            })
        });
        let held = core::mem::take(&mut self.arena[id].points);
        self.arena[id].children = Some(children);
        for (p, v) in held {
            // A point inside the parent is inside at least one quadrant.
            if let Some(c) = self.child_for(children, p) {
                self.arena[c].points.push((p, v));
            }
        }
        tracing::trace!(?boundary, depth, "subdivided quadtree node");
    }

    /// Points inside `range`, edges inclusive.
    pub fn query(&self, range: Aabb2D<f64>) -> Vec<(Point, P)> {
        let mut found = Vec::new();
        self.query_into(range, &mut found);
        found
    }

    /// Append the points inside `range` to `found`.
    pub fn query_into(&self, range: Aabb2D<f64>, found: &mut Vec<(Point, P)>) {
        let mut stack: SmallVec<[NodeId; 32]> = SmallVec::new();
        stack.push(self.root);
        while let Some(id) = stack.pop() {
            let n = &self.arena[id];
            if !n.boundary.intersects(&range) {
                continue;
            }
            found.extend(n.points.iter().copied().filter(|(p, _)| range.contains(*p)));
            if let Some(children) = n.children {
                stack.extend(children.iter().rev().copied());
            }
        }
    }

    /// Remove one point equal to `point` and `payload`, merging emptied
    /// subtrees back into leaves.
    pub fn remove(&mut self, point: Point, payload: P) -> Result<(), Error> {
        if !self.boundary.contains(point) {
            return Err(Error::NotFound);
        }
        let mut path: SmallVec<[NodeId; 16]> = SmallVec::new();
        let mut id = self.root;
        while let Some(children) = self.arena[id].children {
            path.push(id);
            id = self.child_for(children, point).ok_or(Error::NotFound)?;
        }
        let leaf = &mut self.arena[id].points;
        let i = leaf
            .iter()
            .position(|&(p, v)| p == point && v == payload)
            .ok_or(Error::NotFound)?;
        leaf.remove(i);
        self.len -= 1;

        // Merge the highest ancestor whose subtree now fits in one leaf.
        if let Some(&top) = path.iter().find(|&&a| self.subtree_len(a) <= self.capacity) {
            self.collapse(top);
        }
        Ok(())
    }

    fn subtree_len(&self, id: NodeId) -> usize {
        let n = &self.arena[id];
        n.points.len()
            + n.children
                .map_or(0, |cs| cs.iter().map(|&c| self.subtree_len(c)).sum())
    }

    fn collapse(&mut self, id: NodeId) {
        let Some(children) = self.arena[id].children.take() else {
            return;
        };
        let mut gathered = Vec::new();
        let mut stack: Vec<NodeId> = children.to_vec();
        while let Some(c) = stack.pop() {
            if let Some(n) = self.arena.remove(c) {
                gathered.extend(n.points);
                stack.extend(n.children.into_iter().flatten());
            }
        }
        tracing::trace!(merged = gathered.len(), "merged quadtree subtree");
        self.arena[id].points = gathered;
    }

    /// Up to `k` stored points closest to `target`, ascending by distance.
    pub fn k_nearest(&self, target: Point, k: usize) -> Vec<Neighbor<P>> {
        if k == 0 || self.len == 0 {
            return Vec::new();
        }
        let mut best = KBest::new(k);
        self.nearest_from(self.root, target, &mut best);
        best.into_sorted()
            .into_iter()
            .map(|(distance, (point, payload))| Neighbor {
                point,
                payload,
                distance,
            })
            .collect()
    }

    fn nearest_from(&self, id: NodeId, target: Point, best: &mut KBest<(Point, P)>) {
        let n = &self.arena[id];
        for &(p, v) in &n.points {
            best.offer(p.distance(target), p, (p, v));
        }
        let Some(children) = n.children else {
            return;
        };
        let mut order = children.map(|c| (self.arena[c].boundary.distance_to_point(target), c));
        order.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (lower_bound, c) in order {
            if lower_bound > best.bound() {
                break;
            }
            self.nearest_from(c, target, best);
        }
    }
}

impl<P: Copy + PartialEq + Debug> PointIndex<P> for QuadTree<P> {
    fn insert(&mut self, point: Point, payload: P) -> Result<(), Error> {
        Self::insert(self, point, payload).map(|_| ())
    }

    fn remove(&mut self, point: Point, payload: P) -> Result<(), Error> {
        Self::remove(self, point, payload)
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn len(&self) -> usize {
        self.len
    }

    fn query_rect<'a>(&'a self, rect: Aabb2D<f64>) -> Box<dyn Iterator<Item = (Point, P)> + 'a> {
        Box::new(self.query(rect).into_iter())
    }

    fn k_nearest(&self, target: Point, k: usize) -> Vec<Neighbor<P>> {
        Self::k_nearest(self, target, k)
    }
}

impl<P> Debug for QuadTree<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QuadTree")
            .field("boundary", &self.boundary)
            .field("capacity", &self.capacity)
            .field("len", &self.len)
            .field("nodes", &self.arena.len())
            .finish_non_exhaustive()
    }
}
