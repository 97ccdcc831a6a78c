// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One interactive demo per structure.
//!
//! Each demo owns its structure, a seeded random generator, and whatever
//! query state the presentation layer renders. Demos that animate a search
//! (k-d tree range queries, R-tree intersection queries) hold a
//! [`TraversalSlot`](tessera_index::TraversalSlot): starting a new search
//! cancels the previous one, and so does any edit of the structure.

mod grid_file;
mod kdtree;
mod morton;
mod quadtree;
mod rtree;
mod voronoi;

pub use grid_file::GridFileDemo;
pub use kdtree::KdTreeDemo;
pub use morton::MortonDemo;
pub use quadtree::QuadTreeDemo;
pub use rtree::RTreeDemo;
pub use voronoi::VoronoiDemo;

use crate::SessionError;

/// Actions every demo supports.
pub trait Demo {
    /// Empty the structure and drop query state.
    fn reset(&mut self);

    /// Add `count` random elements to what is already there.
    fn add_random(&mut self, count: usize) -> Result<(), SessionError>;

    /// Replace the contents with `count` random elements.
    fn randomize(&mut self, count: usize) -> Result<(), SessionError> {
        self.reset();
        self.add_random(count)
    }

    /// Number of stored elements.
    fn len(&self) -> usize;

    /// Whether the structure is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
