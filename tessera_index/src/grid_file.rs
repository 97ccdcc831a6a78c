// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grid file over an integer coordinate domain.
//!
//! The domain `[1, grid_size + 1)²` starts as a single cell. When a cell holds
//! more points than the bucket capacity it is cut in two by a vertical or
//! horizontal line on an integer coordinate. Every cut ever made is recorded
//! in the per-axis scales and no cut coordinate is reused on the same axis.
//!
//! ```rust
//! use tessera_index::{Axis, GridCoord, GridFile, InsertOutcome, Split};
//!
//! let mut grid = GridFile::new(10, 2).unwrap();
//! grid.insert(GridCoord::new(1, 1), 'a').unwrap();
//! grid.insert(GridCoord::new(1, 9), 'b').unwrap();
//! let outcome = grid.insert(GridCoord::new(9, 1), 'c').unwrap();
//! assert_eq!(outcome, InsertOutcome::Split(Split { axis: Axis::X, at: 6 }));
//! assert_eq!(grid.cells().len(), 2);
//! ```

use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::ops::Range;

use kurbo::Point;

use crate::error::{Error, check_capacity};
use crate::knn::KBest;
use crate::types::{Aabb2D, Axis};

/// Grid size used by [`GridFile::default`].
pub const DEFAULT_GRID_SIZE: u32 = 10;
/// Bucket capacity used by [`GridFile::default`].
pub const DEFAULT_BUCKET_CAPACITY: usize = 2;

/// Integer grid coordinate, 1-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl GridCoord {
    /// Create a coordinate.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Coordinate on `axis`.
    pub const fn on(self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// The coordinate as a floating-point point.
    pub fn to_point(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

/// A cut that was made while inserting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Split {
    /// Axis the cut is perpendicular to: `X` is a vertical line `x = at`.
    pub axis: Axis,
    /// Coordinate of the cut line.
    pub at: u32,
}

/// Why an overfull cell could not be split.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SplitBlocker {
    /// The cell is one unit wide on both axes.
    MinimumSize,
    /// Every interior coordinate on the chosen axis is already a cut.
    NoFreeCut,
}

/// Result of [`GridFile::insert`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The point was stored and its cell is within capacity.
    Stored,
    /// The point was stored and its cell was split once.
    Split(Split),
    /// The point was stored but its cell stays over capacity.
    Overflow(SplitBlocker),
}

/// A rectangular cell of a [`GridFile`], half-open on both axes.
#[derive(Clone, Debug)]
pub struct GridCell<P> {
    x0: u32,
    x1: u32,
    y0: u32,
    y1: u32,
    points: Vec<(GridCoord, P)>,
}

impl<P> GridCell<P> {
    fn whole(grid_size: u32) -> Self {
        Self {
            x0: 1,
            x1: grid_size + 1,
            y0: 1,
            y1: grid_size + 1,
            points: Vec::new(),
        }
    }

    /// Columns covered, half-open.
    pub fn x_range(&self) -> Range<u32> {
        self.x0..self.x1
    }

    /// Rows covered, half-open.
    pub fn y_range(&self) -> Range<u32> {
        self.y0..self.y1
    }

    /// Covered region as a closed box of the last covered column and row.
    pub fn bounds(&self) -> Aabb2D<u32> {
        Aabb2D::new(self.x0, self.y0, self.x1 - 1, self.y1 - 1)
    }

    /// Number of unit squares covered.
    pub fn area(&self) -> u64 {
        u64::from(self.x1 - self.x0) * u64::from(self.y1 - self.y0)
    }

    /// Points stored in the cell, in insertion order.
    pub fn points(&self) -> &[(GridCoord, P)] {
        &self.points
    }

    /// Whether `c` falls inside the cell.
    pub fn contains(&self, c: GridCoord) -> bool {
        (self.x0..self.x1).contains(&c.x) && (self.y0..self.y1).contains(&c.y)
    }

    fn span(&self, axis: Axis) -> (u32, u32) {
        match axis {
            Axis::X => (self.x0, self.x1),
            Axis::Y => (self.y0, self.y1),
        }
    }
}

/// One result of [`GridFile::k_nearest`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridNeighbor<P> {
    /// Grid coordinate of the stored point.
    pub coord: GridCoord,
    /// Payload stored with the point.
    pub payload: P,
    /// Euclidean distance in grid units.
    pub distance: f64,
}

/// Adaptive grid of bucket cells.
pub struct GridFile<P> {
    grid_size: u32,
    capacity: usize,
    x_scales: BTreeSet<u32>,
    y_scales: BTreeSet<u32>,
    cells: Vec<GridCell<P>>,
    last_cut: Axis,
    len: usize,
}

impl<P: Copy + PartialEq + Debug> Default for GridFile<P> {
    fn default() -> Self {
        Self::fresh(DEFAULT_GRID_SIZE, DEFAULT_BUCKET_CAPACITY)
    }
}

impl<P: Copy + PartialEq + Debug> GridFile<P> {
    /// Create an empty grid file over `[1, grid_size + 1)²`.
    pub fn new(grid_size: u32, capacity: usize) -> Result<Self, Error> {
        let grid_size = check_grid_size(grid_size)?;
        let capacity = check_capacity(capacity)?;
        Ok(Self::fresh(grid_size, capacity))
    }

    fn fresh(grid_size: u32, capacity: usize) -> Self {
        Self {
            grid_size,
            capacity,
            x_scales: BTreeSet::from([1, grid_size + 1]),
            y_scales: BTreeSet::from([1, grid_size + 1]),
            cells: alloc::vec![GridCell::whole(grid_size)],
            // The first split is a vertical cut.
            last_cut: Axis::Y,
            len: 0,
        }
    }

    /// Number of columns and rows.
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Bucket capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resize the domain. Drops every point and cut.
    pub fn set_grid_size(&mut self, grid_size: u32) -> Result<(), Error> {
        let grid_size = check_grid_size(grid_size)?;
        *self = Self::fresh(grid_size, self.capacity);
        Ok(())
    }

    /// Change the bucket capacity. Drops every point and cut.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), Error> {
        let capacity = check_capacity(capacity)?;
        *self = Self::fresh(self.grid_size, capacity);
        Ok(())
    }

    /// Drop every point and cut, keeping the size and capacity.
    pub fn reset(&mut self) {
        *self = Self::fresh(self.grid_size, self.capacity);
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no points are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cells in creation order. Together they tile the domain exactly.
    pub fn cells(&self) -> &[GridCell<P>] {
        &self.cells
    }

    /// Cut coordinates on the x axis, including the domain edges.
    pub fn x_scales(&self) -> impl Iterator<Item = u32> + '_ {
        self.x_scales.iter().copied()
    }

    /// Cut coordinates on the y axis, including the domain edges.
    pub fn y_scales(&self) -> impl Iterator<Item = u32> + '_ {
        self.y_scales.iter().copied()
    }

    /// Every stored point.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, P)> + '_ {
        self.cells.iter().flat_map(|c| c.points.iter().copied())
    }

    /// Index into [`Self::cells`] of the cell containing `c`.
    pub fn cell_index_at(&self, c: GridCoord) -> Result<usize, Error> {
        self.cells
            .iter()
            .position(|cell| cell.contains(c))
            .ok_or(Error::OutOfBounds)
    }

    /// The cell containing `c`.
    pub fn cell_at(&self, c: GridCoord) -> Result<&GridCell<P>, Error> {
        self.cell_index_at(c).map(|i| &self.cells[i])
    }

    /// Insert a point, splitting its cell once if it overflows.
    pub fn insert(&mut self, coord: GridCoord, payload: P) -> Result<InsertOutcome, Error> {
        let i = self.cell_index_at(coord)?;
        self.cells[i].points.push((coord, payload));
        self.len += 1;
        if self.cells[i].points.len() <= self.capacity {
            return Ok(InsertOutcome::Stored);
        }
        Ok(match self.split(i) {
            Ok(split) => InsertOutcome::Split(split),
            Err(blocker) => {
                tracing::warn!(?coord, ?blocker, "grid cell stays over capacity");
                InsertOutcome::Overflow(blocker)
            }
        })
    }

    /// Remove one point equal to `coord` and `payload`. Cells are never merged.
    pub fn remove(&mut self, coord: GridCoord, payload: P) -> Result<(), Error> {
        let i = self.cell_index_at(coord).map_err(|_| Error::NotFound)?;
        let points = &mut self.cells[i].points;
        let at = points
            .iter()
            .position(|&(c, v)| c == coord && v == payload)
            .ok_or(Error::NotFound)?;
        points.remove(at);
        self.len -= 1;
        Ok(())
    }

    fn split(&mut self, i: usize) -> Result<Split, SplitBlocker> {
        let cell = &self.cells[i];
        let can_x = cell.x1 - cell.x0 > 1;
        let can_y = cell.y1 - cell.y0 > 1;
        let axis = match (can_x, can_y) {
            (false, false) => return Err(SplitBlocker::MinimumSize),
            (false, true) => Axis::Y,
            (true, false) => Axis::X,
            (true, true) => self.last_cut.other(),
        };
        self.last_cut = axis;

        let (lo, hi) = cell.span(axis);
        let scales = match axis {
            Axis::X => &self.x_scales,
            Axis::Y => &self.y_scales,
        };
        let mut at = lo + (hi - lo) / 2;
        while scales.contains(&at) && at > lo && at < hi {
            // The midpoint is taken; try the median of the cell's points.
            let mut coords: Vec<u32> = cell.points.iter().map(|(c, _)| c.on(axis)).collect();
            coords.sort_unstable();
            let median = coords[coords.len() / 2];
            if median != at && median > lo && median < hi {
                at = median;
                break;
            }
            at -= 1;
        }
        if scales.contains(&at) || at <= lo || at >= hi {
            return Err(SplitBlocker::NoFreeCut);
        }

        match axis {
            Axis::X => self.x_scales.insert(at),
            Axis::Y => self.y_scales.insert(at),
        };
        let old = self.cells.remove(i);
        let (mut lower, mut upper) = (
            GridCell {
                points: Vec::new(),
                ..old
            },
            GridCell {
                points: Vec::new(),
                ..old
            },
        );
        match axis {
            Axis::X => (lower.x1, upper.x0) = (at, at),
            Axis::Y => (lower.y1, upper.y0) = (at, at),
        }
        for (c, v) in old.points {
            if c.on(axis) < at {
                lower.points.push((c, v));
            } else {
                upper.points.push((c, v));
            }
        }
        tracing::debug!(?axis, at, lower = lower.points.len(), upper = upper.points.len(), "split grid cell");
        self.cells.push(lower);
        self.cells.push(upper);
        Ok(Split { axis, at })
    }

    /// Up to `k` stored points closest to `target` in grid units, by scan.
    pub fn k_nearest(&self, target: Point, k: usize) -> Vec<GridNeighbor<P>> {
        let mut best = KBest::new(k);
        for (coord, payload) in self.iter() {
            let at = coord.to_point();
            best.offer(at.distance(target), at, (coord, payload));
        }
        best.into_sorted()
            .into_iter()
            .map(|(distance, (coord, payload))| GridNeighbor {
                coord,
                payload,
                distance,
            })
            .collect()
    }
}

fn check_grid_size(grid_size: u32) -> Result<u32, Error> {
    if grid_size == 0 || grid_size == u32::MAX {
        Err(Error::InvalidGridSize {
            requested: grid_size,
        })
    } else {
        Ok(grid_size)
    }
}

impl<P> Debug for GridFile<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GridFile")
            .field("grid_size", &self.grid_size)
            .field("capacity", &self.capacity)
            .field("cells", &self.cells.len())
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_partition<P: Copy + PartialEq + Debug>(grid: &GridFile<P>) {
        let n = u64::from(grid.grid_size());
        let area: u64 = grid.cells().iter().map(GridCell::area).sum();
        assert_eq!(area, n * n, "cells must cover the domain");
        for x in 1..=grid.grid_size() {
            for y in 1..=grid.grid_size() {
                let c = GridCoord::new(x, y);
                let owners = grid.cells().iter().filter(|cell| cell.contains(c)).count();
                assert_eq!(owners, 1, "{c:?} owned by {owners} cells");
            }
        }
        for cell in grid.cells() {
            for (c, _) in cell.points() {
                assert!(cell.contains(*c), "{c:?} stored in the wrong cell");
            }
        }
        assert_eq!(grid.iter().count(), grid.len());
    }

    #[test]
    fn four_corner_insertions() {
        let mut grid = GridFile::new(10, 2).unwrap();
        let outcomes: Vec<_> = [(1, 1), (1, 9), (9, 1), (9, 9)]
            .into_iter()
            .enumerate()
            .map(|(i, (x, y))| grid.insert(GridCoord::new(x, y), i).unwrap())
            .collect();
        assert_eq!(
            outcomes,
            [
                InsertOutcome::Stored,
                InsertOutcome::Stored,
                InsertOutcome::Split(Split { axis: Axis::X, at: 6 }),
                InsertOutcome::Stored,
            ]
        );
        assert!(grid.cells().iter().all(|c| c.points().len() <= 2));
        assert_partition(&grid);

        // A fifth point in a full cell splits it exactly once, on the other axis.
        let fifth = grid.insert(GridCoord::new(2, 5), 4).unwrap();
        assert_eq!(fifth, InsertOutcome::Split(Split { axis: Axis::Y, at: 6 }));
        assert_eq!(grid.cells().len(), 3);
        assert_eq!(grid.len(), 5);
        let lower_left = grid.cell_at(GridCoord::new(1, 1)).unwrap();
        assert_eq!(lower_left.x_range(), 1..6);
        assert_eq!(lower_left.y_range(), 1..6);
        assert_eq!(lower_left.points().len(), 2);
        assert_partition(&grid);
    }

    #[test]
    fn taken_midpoint_falls_back_to_median() {
        let mut grid = GridFile::new(10, 2).unwrap();
        let script = [
            ((1, 1), InsertOutcome::Stored),
            ((2, 1), InsertOutcome::Stored),
            ((9, 1), InsertOutcome::Split(Split { axis: Axis::X, at: 6 })),
            ((1, 2), InsertOutcome::Split(Split { axis: Axis::Y, at: 6 })),
            ((2, 2), InsertOutcome::Split(Split { axis: Axis::X, at: 3 })),
            ((1, 7), InsertOutcome::Stored),
            ((4, 9), InsertOutcome::Stored),
            ((5, 8), InsertOutcome::Split(Split { axis: Axis::Y, at: 8 })),
            // Cell [1, 6) x [8, 11): midpoint 3 is already a cut, the median
            // x of (4, 9), (5, 8), (4, 10) is used instead.
            ((4, 10), InsertOutcome::Split(Split { axis: Axis::X, at: 4 })),
        ];
        for (i, ((x, y), expect)) in script.into_iter().enumerate() {
            let got = grid.insert(GridCoord::new(x, y), i).unwrap();
            assert_eq!(got, expect, "insert #{i} at ({x}, {y})");
            assert_partition(&grid);
        }
        assert_eq!(grid.x_scales().collect::<Vec<_>>(), [1, 3, 4, 6, 11]);
        assert_eq!(grid.y_scales().collect::<Vec<_>>(), [1, 6, 8, 11]);
        let right = grid.cell_at(GridCoord::new(5, 10)).unwrap();
        assert_eq!(right.x_range(), 4..6);
        assert_eq!(right.points().len(), 3, "one split per insert, even if still full");
    }

    #[test]
    fn minimum_size_cell_reports_overflow() {
        let mut grid = GridFile::new(1, 2).unwrap();
        for i in 0..2 {
            assert_eq!(grid.insert(GridCoord::new(1, 1), i), Ok(InsertOutcome::Stored));
        }
        assert_eq!(
            grid.insert(GridCoord::new(1, 1), 2),
            Ok(InsertOutcome::Overflow(SplitBlocker::MinimumSize))
        );
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.cells().len(), 1);
    }

    #[test]
    fn coincident_points_exhaust_cuts() {
        let mut grid = GridFile::new(4, 2).unwrap();
        let mut saw_overflow = false;
        for i in 0..12 {
            if let InsertOutcome::Overflow(_) = grid.insert(GridCoord::new(2, 3), i).unwrap() {
                saw_overflow = true;
            }
        }
        assert!(saw_overflow, "identical points can never be separated");
        assert_eq!(grid.len(), 12);
        assert_partition(&grid);
    }

    #[test]
    fn out_of_domain_is_rejected() {
        let mut grid = GridFile::new(10, 2).unwrap();
        assert_eq!(grid.insert(GridCoord::new(0, 5), ()), Err(Error::OutOfBounds));
        assert_eq!(grid.insert(GridCoord::new(11, 5), ()), Err(Error::OutOfBounds));
        assert_eq!(grid.insert(GridCoord::new(10, 10), ()), Ok(InsertOutcome::Stored));
        assert!(GridFile::<()>::new(0, 2).is_err());
        assert!(GridFile::<()>::new(10, 1).is_err());
    }

    #[test]
    fn random_insertions_keep_the_partition() {
        let mut rng = StdRng::seed_from_u64(77);
        for size in [5, 10, 20] {
            let mut grid = GridFile::new(size, 2).unwrap();
            for i in 0..60 {
                let c = GridCoord::new(rng.random_range(1..=size), rng.random_range(1..=size));
                grid.insert(c, i).unwrap();
                assert_partition(&grid);
            }
        }
    }

    #[test]
    fn remove_and_nearest() {
        let mut grid = GridFile::default();
        for (i, (x, y)) in [(1, 1), (5, 5), (9, 9), (2, 2)].into_iter().enumerate() {
            grid.insert(GridCoord::new(x, y), i).unwrap();
        }
        let near: Vec<_> = grid
            .k_nearest(Point::new(1.0, 1.0), 3)
            .iter()
            .map(|n| n.payload)
            .collect();
        assert_eq!(near, [0, 3, 1]);
        grid.remove(GridCoord::new(2, 2), 3).unwrap();
        assert_eq!(grid.remove(GridCoord::new(2, 2), 3), Err(Error::NotFound));
        assert_eq!(grid.len(), 3);
        assert_partition(&grid);
    }

    #[test]
    fn resizing_resets() {
        let mut grid = GridFile::new(10, 2).unwrap();
        for i in 0..5 {
            grid.insert(GridCoord::new(i + 1, i + 1), i).unwrap();
        }
        grid.set_grid_size(16).unwrap();
        assert!(grid.is_empty());
        assert_eq!(grid.cells().len(), 1);
        assert_eq!(grid.cells()[0].x_range(), 1..17);
        grid.set_capacity(3).unwrap();
        assert_eq!(grid.capacity(), 3);
        assert_eq!(grid.set_capacity(0), Err(Error::InvalidCapacity { requested: 0, minimum: 2 }));
    }
}
