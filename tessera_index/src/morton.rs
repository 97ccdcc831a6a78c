// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Z-order (Morton) curve over a square integer grid.
//!
//! [`encode`] interleaves the bits of two coordinates, x into the even bit
//! positions and y into the odd ones. Sorting cells by their code visits them
//! along the Z-order curve: every quadrant at every level is a contiguous run.
//!
//! ```rust
//! use tessera_index::{Aabb2D, MortonIndex};
//!
//! let mut index = MortonIndex::new(2).unwrap();
//! index.fill();
//! let first: Vec<_> = index.entries()[..4].iter().map(|e| (e.x, e.y)).collect();
//! assert_eq!(first, [(0, 0), (1, 0), (0, 1), (1, 1)]);
//!
//! let hits = index.range_query_pruned(Aabb2D::new(1, 1, 2, 2));
//! assert_eq!(hits.len(), 4);
//! ```

use alloc::vec::Vec;
use core::ops::Range;

use crate::error::Error;
use crate::types::Aabb2D;

/// Largest supported curve order; the grid side is `2^order`.
pub const MAX_ORDER: u32 = 8;

const X_BITS: u64 = 0x5555_5555_5555_5555;
const Y_BITS: u64 = 0xAAAA_AAAA_AAAA_AAAA;

fn spread(v: u32) -> u64 {
    let mut x = u64::from(v);
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    (x | (x << 1)) & X_BITS
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "The final mask leaves only the low 32 bits set."
)]
fn compact(code: u64) -> u32 {
    let mut x = code & X_BITS;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x >> 4)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x >> 8)) & 0x0000_FFFF_0000_FFFF;
    ((x | (x >> 16)) & 0xFFFF_FFFF) as u32
}

/// Interleave `x` into the even bits and `y` into the odd bits.
pub fn encode(x: u32, y: u32) -> u64 {
    spread(x) | (spread(y) << 1)
}

/// Inverse of [`encode`].
pub fn decode(code: u64) -> (u32, u32) {
    (compact(code), compact(code >> 1))
}

/// A grid cell and its Morton code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MortonEntry {
    /// Column, 0-based.
    pub x: u32,
    /// Row, 0-based.
    pub y: u32,
    /// `encode(x, y)`.
    pub code: u64,
}

impl MortonEntry {
    /// Entry for the cell at `(x, y)`.
    pub fn new(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            code: encode(x, y),
        }
    }
}

/// Cells of a `2^order` square grid kept in Z-order.
#[derive(Clone, Debug)]
pub struct MortonIndex {
    order: u32,
    entries: Vec<MortonEntry>,
}

impl MortonIndex {
    /// An empty index over a `2^order` grid. `order` must be in `1..=MAX_ORDER`.
    pub fn new(order: u32) -> Result<Self, Error> {
        Ok(Self {
            order: check_order(order)?,
            entries: Vec::new(),
        })
    }

    /// Curve order.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Number of cells along each side.
    pub fn side(&self) -> u32 {
        1 << self.order
    }

    /// Change the order. Drops every entry.
    pub fn set_order(&mut self, order: u32) -> Result<(), Error> {
        self.order = check_order(order)?;
        self.entries.clear();
        Ok(())
    }

    /// Replace the contents with every cell of the grid.
    pub fn fill(&mut self) {
        let side = self.side();
        self.entries.clear();
        self.entries
            .extend((0..side).flat_map(|y| (0..side).map(move |x| MortonEntry::new(x, y))));
        self.entries.sort_unstable_by_key(|e| e.code);
    }

    /// Add one cell, keeping Z-order.
    pub fn insert(&mut self, x: u32, y: u32) -> Result<(), Error> {
        if x >= self.side() || y >= self.side() {
            return Err(Error::OutOfBounds);
        }
        let entry = MortonEntry::new(x, y);
        let at = self.entries.partition_point(|e| e.code <= entry.code);
        self.entries.insert(at, entry);
        Ok(())
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in Z-order.
    pub fn entries(&self) -> &[MortonEntry] {
        &self.entries
    }

    /// Index range of the entries inside one quadrant of the curve.
    ///
    /// `level` counts quadrant subdivisions from the whole grid (level 0) and
    /// `prefix` holds the `2 * level` leading code bits that name the quadrant.
    /// Levels deeper than the order name single cells. A prefix with more
    /// than `2 * level` bits names no quadrant and gets an empty range.
    pub fn quadrant(&self, prefix: u64, level: u32) -> Range<usize> {
        let level = level.min(self.order);
        if prefix >> (2 * level) != 0 {
            let end = self.entries.len();
            return end..end;
        }
        // The order is at most MAX_ORDER, so neither shift can overflow.
        let shift = 2 * (self.order - level);
        let lo = prefix << shift;
        let hi = (prefix + 1) << shift;
        let start = self.entries.partition_point(|e| e.code < lo);
        let end = self.entries.partition_point(|e| e.code < hi);
        start..end
    }

    /// Entries inside `rect`, edges inclusive, by scanning every entry.
    pub fn range_query(&self, rect: Aabb2D<u32>) -> Vec<MortonEntry> {
        self.entries
            .iter()
            .copied()
            .filter(|e| rect.contains_point(e.x, e.y))
            .collect()
    }

    /// Same result as [`range_query`](Self::range_query), but jumps over runs
    /// of the curve that leave `rect` using the BIGMIN construction.
    pub fn range_query_pruned(&self, rect: Aabb2D<u32>) -> Vec<MortonEntry> {
        let mut out = Vec::new();
        if rect.is_empty() {
            return out;
        }
        let zmin = encode(rect.min_x, rect.min_y);
        let zmax = encode(rect.max_x, rect.max_y);
        let mut i = self.entries.partition_point(|e| e.code < zmin);
        let mut skips = 0_usize;
        while let Some(&e) = self.entries.get(i) {
            if e.code > zmax {
                break;
            }
            if rect.contains_point(e.x, e.y) {
                out.push(e);
                i += 1;
            } else {
                let next = bigmin(e.code, zmin, zmax);
                i = self.entries.partition_point(|e| e.code < next).max(i + 1);
                skips += 1;
            }
        }
        tracing::trace!(hits = out.len(), skips, "pruned morton range query");
        out
    }
}

fn check_order(order: u32) -> Result<u32, Error> {
    if (1..=MAX_ORDER).contains(&order) {
        Ok(order)
    } else {
        Err(Error::InvalidGridSize { requested: order })
    }
}

/// Bits of the same dimension as `mask` strictly below it.
fn lower_same_dim(mask: u64) -> u64 {
    let dim = if mask & X_BITS != 0 { X_BITS } else { Y_BITS };
    dim & (mask - 1)
}

/// Set the bit, clear the lower bits of its dimension.
fn load_1000(v: u64, mask: u64) -> u64 {
    (v & !lower_same_dim(mask)) | mask
}

/// Clear the bit, set the lower bits of its dimension.
fn load_0111(v: u64, mask: u64) -> u64 {
    (v & !mask) | lower_same_dim(mask)
}

/// Smallest code greater than `code` that decodes to a cell inside the box
/// spanned by `zmin` and `zmax`. `code` must lie between the two and outside
/// the box.
fn bigmin(code: u64, zmin: u64, zmax: u64) -> u64 {
    let (mut min, mut max) = (zmin, zmax);
    let mut best = zmax;
    for bit in (0..64).rev() {
        let mask = 1_u64 << bit;
        match (code & mask != 0, min & mask != 0, max & mask != 0) {
            (false, false, true) => {
                best = load_1000(min, mask);
                max = load_0111(max, mask);
            }
            (false, true, true) => return min,
            (true, false, false) => return best,
            (true, false, true) => min = load_1000(min, mask),
            // Equal bits: keep descending. `min > max` cannot happen for a
            // non-empty box.
            _ => {}
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn encode_interleaves_x_into_even_bits() {
        assert_eq!(encode(1, 0), 0b01);
        assert_eq!(encode(0, 1), 0b10);
        assert_eq!(encode(3, 5), 0b10_01_11);
        assert_eq!(decode(encode(0xDEAD, 0xBEEF)), (0xDEAD, 0xBEEF));
        assert_eq!(decode(encode(u32::MAX, 0)), (u32::MAX, 0));
    }

    #[test]
    fn quadrants_are_contiguous_runs() {
        let mut index = MortonIndex::new(3).unwrap();
        index.fill();
        assert_eq!(index.len(), 64);
        for level in 1..=3 {
            let per_quadrant = 64 >> (2 * level);
            let half = 8 >> level;
            for prefix in 0..(1_u64 << (2 * level)) {
                let run = index.quadrant(prefix, level);
                assert_eq!(run.len(), per_quadrant);
                let cells = &index.entries()[run];
                let (x0, y0) = (cells[0].x / half * half, cells[0].y / half * half);
                assert!(
                    cells
                        .iter()
                        .all(|e| (x0..x0 + half).contains(&e.x) && (y0..y0 + half).contains(&e.y)),
                    "level {level} prefix {prefix} leaves its block"
                );
            }
        }
    }

    #[test]
    fn oversized_prefixes_name_no_quadrant() {
        let mut index = MortonIndex::new(3).unwrap();
        index.fill();
        assert_eq!(index.quadrant(0, 0), 0..64);
        assert!(index.quadrant(4, 1).is_empty());
        assert!(index.quadrant(u64::MAX, 2).is_empty());
        assert!(index.quadrant(u64::MAX, 40).is_empty());
        assert_eq!(index.quadrant(63, 40), 63..64);
    }

    #[test]
    fn order_is_monotonic_along_each_axis() {
        for a in 0..16 {
            for b in 0..15 {
                assert!(encode(b, a) < encode(b + 1, a));
                assert!(encode(a, b) < encode(a, b + 1));
            }
        }
    }

    #[test]
    fn insert_keeps_z_order_and_checks_bounds() {
        let mut index = MortonIndex::new(2).unwrap();
        for (x, y) in [(3, 3), (0, 0), (2, 1), (1, 2)] {
            index.insert(x, y).unwrap();
        }
        assert!(index.entries().windows(2).all(|w| w[0].code <= w[1].code));
        assert_eq!(index.insert(4, 0), Err(Error::OutOfBounds));
        assert_eq!(
            MortonIndex::new(MAX_ORDER + 1).unwrap_err(),
            Error::InvalidGridSize { requested: 9 }
        );
        index.set_order(4).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.side(), 16);
    }

    #[test]
    fn pruned_query_matches_scan() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut index = MortonIndex::new(5).unwrap();
        index.fill();
        for _ in 0..200 {
            let (x0, x1) = (rng.random_range(0..32_u32), rng.random_range(0..32_u32));
            let (y0, y1) = (rng.random_range(0..32_u32), rng.random_range(0..32_u32));
            let rect = Aabb2D::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1));
            assert_eq!(index.range_query_pruned(rect), index.range_query(rect), "{rect:?}");
        }
    }

    #[test]
    fn pruned_query_on_sparse_entries() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut index = MortonIndex::new(6).unwrap();
        for _ in 0..300 {
            index
                .insert(rng.random_range(0..64), rng.random_range(0..64))
                .unwrap();
        }
        let rect = Aabb2D::new(10, 3, 40, 20);
        assert_eq!(index.range_query_pruned(rect), index.range_query(rect));
        assert!(index.range_query_pruned(Aabb2D::new(5, 5, 4, 4)).is_empty());
    }
}
