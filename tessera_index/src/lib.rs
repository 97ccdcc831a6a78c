// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=tessera_index --heading-base-level=0

//! Tessera Index: classic 2D spatial index structures.
//!
//! Tessera Index collects the textbook spatial indexes in one small `no_std`
//! crate, each with its insertion policy, range search, and nearest-neighbor
//! search:
//!
//! - [`GridFile`]: adaptive grid of bucket cells over an integer domain.
//! - [`KdTree`]: k-d tree with alternating split axes.
//! - [`QuadTree`]: region quadtree with a bucket capacity.
//! - [`RTree`]: bulk-loaded R-tree over rectangles.
//! - [`MortonIndex`]: Z-order curve over a square grid.
//!
//! Points are [`kurbo::Point`]s and boxes are [`Aabb2D`] with closed edges.
//! Tree nodes are addressed by generational [`NodeId`]s, so a snapshot of a tree
//! can be walked by id and a stale id never aliases a newer node.
//!
//! Range searches on the k-d tree and intersection searches on the R-tree are
//! also available as pull-based traversals that report one [`TraversalStep`]
//! at a time. They can be cancelled through a [`CancelToken`], and a
//! [`TraversalSlot`] keeps at most one of them live.
//!
//! # Example
//!
//! ```rust
//! use tessera_index::{Aabb2D, KdTree, Point, TraversalSlot, TraversalStep};
//!
//! let mut tree = KdTree::new();
//! for (i, (x, y)) in [(40.0, 45.0), (15.0, 70.0), (70.0, 10.0), (69.0, 50.0)]
//!     .into_iter()
//!     .enumerate()
//! {
//!     tree.insert(Point::new(x, y), i);
//! }
//!
//! // Nearest neighbors come back sorted by distance.
//! let nearest = tree.k_nearest(Point::new(68.0, 48.0), 2);
//! assert_eq!(nearest[0].payload, 3);
//!
//! // Step through a range search, as an animation would.
//! let mut slot = TraversalSlot::default();
//! let mut search = tree
//!     .range_traversal(Aabb2D::new(30.0, 0.0, 80.0, 60.0))
//!     .with_cancel(slot.begin());
//! let mut found = 0;
//! while let Some(step) = search.next_step(&tree) {
//!     if let TraversalStep::Found(_) = step {
//!         found += 1;
//!     }
//! }
//! assert_eq!(found, 3);
//! ```
//!
//! ## Choosing a structure
//!
//! - `LinearScan`: no structure at all. Fine for a few hundred points and the
//!   reference every other structure is tested against.
//! - `GridFile`: integer coordinates on a bounded grid; cells split one at a
//!   time as buckets overflow and every cut is kept in per-axis scales.
//! - `KdTree`: cheap incremental inserts, good k-NN on uniform data; shape
//!   depends on insertion order, so rebuild from a batch for balance.
//! - `QuadTree`: bounded region with clustered data; subdivision adapts to
//!   density and deletes merge sparse regions back.
//! - `RTree`: rectangles rather than points; bulk loaded, with an optional
//!   Z-order presort for tighter leaves.
//! - `MortonIndex`: cells ordered along the Z-order curve; range queries can
//!   skip runs of the curve with BIGMIN.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs in coordinates.

#![no_std]

extern crate alloc;

mod arena;
mod knn;

pub mod backend;
pub mod backends;
pub mod error;
pub mod grid_file;
pub mod morton;
pub mod rtree;
pub mod traversal;
pub mod types;

pub use kurbo::Point;

pub use arena::NodeId;
pub use backend::{Neighbor, PointIndex};
pub use backends::kdtree::{KdNode, KdTree, RangeSteps, RangeTraversal};
pub use backends::linear::LinearScan;
pub use backends::quadtree::{QuadNode, QuadTree, Quadrant};
pub use error::{Error, MIN_CAPACITY};
pub use grid_file::{GridCell, GridCoord, GridFile, GridNeighbor, InsertOutcome, Split, SplitBlocker};
pub use morton::{MortonEntry, MortonIndex};
pub use rtree::{BulkOrder, IntersectSteps, IntersectTraversal, RChild, RNode, RTree, RectNeighbor};
pub use traversal::{CancelToken, Highlight, Hit, Marks, TraversalSlot, TraversalStep};
pub use types::{Aabb2D, Axis};
