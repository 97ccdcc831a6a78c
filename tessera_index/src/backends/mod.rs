// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point-storing backends behind the [`PointIndex`](crate::PointIndex) trait.
//!
//! - `linear`: flat vector with linear scans (small, simple, and the reference answer).
//! - `kdtree`: k-d tree with alternating split axes and a steppable range search.
//! - `quadtree`: region quadtree with a bucket capacity, push-down subdivision,
//!   and merge-on-delete.
//!
//! Pruning note
//! ------------
//! Both trees answer k-nearest-neighbor queries with a bounded max-heap of the
//! best `k` candidates so far. A subtree is skipped only when its lower-bound
//! distance to the target is already worse than the current k-th best, so
//! pruning changes how many nodes are visited, never the result.

pub mod kdtree;
pub mod linear;
pub mod quadtree;
