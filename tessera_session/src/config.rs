// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session configuration.

use tessera_index::MIN_CAPACITY;
use tessera_index::morton::MAX_ORDER;

use crate::SessionError;

/// Tunables shared by every demo of a [`Session`](crate::Session).
///
/// The defaults match a 750 × 750 canvas.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Canvas width in pixels.
    pub canvas_width: f64,
    /// Canvas height in pixels.
    pub canvas_height: f64,
    /// Columns and rows of the grid file.
    pub grid_size: u32,
    /// Bucket capacity of the grid file.
    pub grid_capacity: usize,
    /// Bucket capacity of the quadtree.
    pub quadtree_capacity: usize,
    /// Fan-out of the R-tree.
    pub rtree_max_entries: usize,
    /// Order of the Morton curve; the grid side is `2^order`.
    pub morton_order: u32,
    /// Number of elements added by one "add random" action.
    pub batch_size: usize,
    /// Number of neighbors [`Session::query_nearest`](crate::Session::query_nearest)
    /// asks for.
    pub k: usize,
    /// Seed for every demo's random generator.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas_width: 750.0,
            canvas_height: 750.0,
            grid_size: 10,
            grid_capacity: 2,
            quadtree_capacity: 3,
            rtree_max_entries: 4,
            morton_order: 4,
            batch_size: 20,
            k: 5,
            seed: 0x7E55_E4A0,
        }
    }
}

impl Config {
    /// Check every field against the range the demos accept.
    pub fn validate(&self) -> Result<(), SessionError> {
        let invalid = |field, reason| Err(SessionError::InvalidConfig { field, reason });
        if !(self.canvas_width.is_finite() && self.canvas_width > 0.0) {
            return invalid("canvas_width", "must be positive");
        }
        if !(self.canvas_height.is_finite() && self.canvas_height > 0.0) {
            return invalid("canvas_height", "must be positive");
        }
        if self.grid_size == 0 || self.grid_size == u32::MAX {
            return invalid("grid_size", "is out of range");
        }
        for (field, capacity) in [
            ("grid_capacity", self.grid_capacity),
            ("quadtree_capacity", self.quadtree_capacity),
            ("rtree_max_entries", self.rtree_max_entries),
        ] {
            if capacity < MIN_CAPACITY {
                return invalid(field, "is below the minimum capacity");
            }
        }
        if !(1..=MAX_ORDER).contains(&self.morton_order) {
            return invalid("morton_order", "is out of range");
        }
        if self.k == 0 {
            return invalid("k", "must be at least 1");
        }
        Ok(())
    }
}
