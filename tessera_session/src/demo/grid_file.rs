// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Point, Rect};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tessera_index::{GridCoord, GridFile, GridNeighbor, InsertOutcome};

use super::Demo;
use crate::SessionError;
use crate::convert::GridMapping;
use crate::random;

/// Grid file drawn over a canvas area.
#[derive(Debug)]
pub struct GridFileDemo {
    grid: GridFile<usize>,
    mapping: GridMapping,
    rng: StdRng,
    next_id: usize,
    last_outcome: Option<InsertOutcome>,
    nearest: Vec<GridNeighbor<usize>>,
}

impl GridFileDemo {
    /// A demo over a `grid_size` grid with the given bucket capacity, drawn
    /// into `area`.
    pub fn new(area: Rect, grid_size: u32, capacity: usize, seed: u64) -> Result<Self, SessionError> {
        Ok(Self {
            grid: GridFile::new(grid_size, capacity)?,
            mapping: GridMapping::new(area, grid_size),
            rng: StdRng::seed_from_u64(seed),
            next_id: 0,
            last_outcome: None,
            nearest: Vec::new(),
        })
    }

    /// The grid file.
    pub fn grid(&self) -> &GridFile<usize> {
        &self.grid
    }

    /// Canvas mapping of the grid.
    pub fn mapping(&self) -> &GridMapping {
        &self.mapping
    }

    /// Outcome of the most recent insertion.
    pub fn last_outcome(&self) -> Option<InsertOutcome> {
        self.last_outcome
    }

    /// Result of the most recent nearest-neighbor query.
    pub fn nearest(&self) -> &[GridNeighbor<usize>] {
        &self.nearest
    }

    /// Insert a point at a grid coordinate.
    pub fn insert(&mut self, coord: GridCoord) -> Result<InsertOutcome, SessionError> {
        let outcome = self.grid.insert(coord, self.next_id)?;
        self.next_id += 1;
        self.last_outcome = Some(outcome);
        self.nearest.clear();
        Ok(outcome)
    }

    /// Insert at the grid cell under a canvas click. Clicks outside the grid
    /// are ignored.
    pub fn click(&mut self, p: Point) -> Result<Option<InsertOutcome>, SessionError> {
        match self.mapping.to_grid(p) {
            Some(coord) => self.insert(coord).map(Some),
            None => Ok(None),
        }
    }

    /// Find the `k` points nearest to a canvas position.
    pub fn query_nearest(&mut self, p: Point, k: usize) -> &[GridNeighbor<usize>] {
        let cell = self.mapping.cell_size();
        let area = self.mapping.area();
        // Grid units, with cell centers on whole numbers.
        let target = Point::new(
            (p.x - area.x0) / cell.width + 0.5,
            (p.y - area.y0) / cell.height + 0.5,
        );
        self.nearest = self.grid.k_nearest(target, k);
        &self.nearest
    }

    /// Resize the grid. Drops every point.
    pub fn set_grid_size(&mut self, grid_size: u32) -> Result<(), SessionError> {
        self.grid.set_grid_size(grid_size)?;
        self.mapping = GridMapping::new(self.mapping.area(), grid_size);
        self.clear_state();
        Ok(())
    }

    /// Change the bucket capacity. Drops every point.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), SessionError> {
        self.grid.set_capacity(capacity)?;
        self.clear_state();
        Ok(())
    }

    fn clear_state(&mut self) {
        self.last_outcome = None;
        self.nearest.clear();
    }
}

impl Demo for GridFileDemo {
    fn reset(&mut self) {
        self.grid.reset();
        self.clear_state();
    }

    fn add_random(&mut self, count: usize) -> Result<(), SessionError> {
        for _ in 0..count {
            let coord = random::grid_coord(&mut self.rng, self.grid.grid_size());
            self.insert(coord)?;
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.grid.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> GridFileDemo {
        GridFileDemo::new(Rect::new(0.0, 0.0, 500.0, 500.0), 10, 2, 1).unwrap()
    }

    #[test]
    fn clicks_map_to_grid_cells() {
        let mut demo = demo();
        assert_eq!(demo.click(Point::new(10.0, 10.0)), Ok(Some(InsertOutcome::Stored)));
        assert_eq!(demo.click(Point::new(-5.0, 10.0)), Ok(None));
        assert_eq!(demo.grid().iter().next().map(|(c, _)| c), Some(GridCoord::new(1, 1)));
    }

    #[test]
    fn nearest_uses_cell_centers() {
        let mut demo = demo();
        demo.insert(GridCoord::new(2, 2)).unwrap();
        demo.insert(GridCoord::new(9, 9)).unwrap();
        // Canvas (75, 75) is the center of cell (2, 2).
        let hits = demo.query_nearest(Point::new(75.0, 75.0), 1);
        assert_eq!(hits[0].coord, GridCoord::new(2, 2));
        assert_eq!(hits[0].distance, 0.0);
    }

    #[test]
    fn resizing_clears_points() {
        let mut demo = demo();
        demo.add_random(15).unwrap();
        assert_eq!(demo.len(), 15);
        demo.set_grid_size(16).unwrap();
        assert!(demo.is_empty());
        assert_eq!(demo.mapping().grid_size(), 16);
        assert!(demo.set_capacity(0).is_err());
    }
}
