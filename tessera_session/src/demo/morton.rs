// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Point, Rect, Size};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessera_index::{MortonEntry, MortonIndex};

use super::Demo;
use crate::SessionError;
use crate::convert;

/// Z-order curve over a square grid stretched across the canvas.
#[derive(Debug)]
pub struct MortonDemo {
    index: MortonIndex,
    canvas: Size,
    rng: StdRng,
    selection: Vec<MortonEntry>,
}

impl MortonDemo {
    /// An empty demo over a `2^order` grid.
    pub fn new(canvas: Size, order: u32, seed: u64) -> Result<Self, SessionError> {
        Ok(Self {
            index: MortonIndex::new(order)?,
            canvas,
            rng: StdRng::seed_from_u64(seed),
            selection: Vec::new(),
        })
    }

    /// The index.
    pub fn index(&self) -> &MortonIndex {
        &self.index
    }

    /// Entries found by the most recent selection.
    pub fn selection(&self) -> &[MortonEntry] {
        &self.selection
    }

    /// Occupy every cell, so the whole curve is drawn.
    pub fn fill(&mut self) {
        self.selection.clear();
        self.index.fill();
    }

    /// Occupy the cell under a canvas click. Clicks outside are ignored.
    pub fn click(&mut self, p: Point) -> Result<Option<MortonEntry>, SessionError> {
        let Some((x, y)) = convert::morton_cell(p, self.canvas, self.index.side()) else {
            return Ok(None);
        };
        self.index.insert(x, y)?;
        self.selection.clear();
        Ok(Some(MortonEntry::new(x, y)))
    }

    /// Select the entries under a dragged canvas rectangle.
    pub fn select(&mut self, drag: Rect) -> &[MortonEntry] {
        self.selection = convert::morton_cells(drag, self.canvas, self.index.side())
            .map(|cells| self.index.range_query_pruned(cells))
            .unwrap_or_default();
        &self.selection
    }

    /// Canvas position of a cell center, for drawing the curve.
    pub fn cell_center(&self, entry: MortonEntry) -> Point {
        let n = f64::from(self.index.side());
        Point::new(
            (f64::from(entry.x) + 0.5) * self.canvas.width / n,
            (f64::from(entry.y) + 0.5) * self.canvas.height / n,
        )
    }

    /// Change the curve order. Drops every entry.
    pub fn set_order(&mut self, order: u32) -> Result<(), SessionError> {
        self.index.set_order(order)?;
        self.selection.clear();
        Ok(())
    }
}

impl Demo for MortonDemo {
    fn reset(&mut self) {
        self.index.clear();
        self.selection.clear();
    }

    fn add_random(&mut self, count: usize) -> Result<(), SessionError> {
        let side = self.index.side();
        for _ in 0..count {
            let x = self.rng.random_range(0..side);
            let y = self.rng.random_range(0..side);
            self.index.insert(x, y)?;
        }
        self.selection.clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> MortonDemo {
        MortonDemo::new(Size::new(800.0, 800.0), 3, 4).unwrap()
    }

    #[test]
    fn fill_draws_the_whole_curve() {
        let mut demo = demo();
        demo.fill();
        assert_eq!(demo.len(), 64);
        let first = demo.index().entries()[0];
        let last = demo.index().entries()[63];
        assert_eq!((first.x, first.y), (0, 0));
        assert_eq!((last.x, last.y), (7, 7));
        assert_eq!(demo.cell_center(first), Point::new(50.0, 50.0));
    }

    #[test]
    fn drag_selects_covered_cells() {
        let mut demo = demo();
        demo.fill();
        // Cells are 100 px wide; this drag covers columns 1..=2 and rows 0..=1.
        let found = demo.select(Rect::new(150.0, 10.0, 250.0, 150.0)).len();
        assert_eq!(found, 4);
        assert!(demo.select(Rect::new(-50.0, -50.0, -10.0, -10.0)).is_empty());
    }

    #[test]
    fn clicks_and_order_changes() {
        let mut demo = demo();
        assert_eq!(
            demo.click(Point::new(799.0, 1.0)).unwrap(),
            Some(MortonEntry::new(7, 0))
        );
        assert_eq!(demo.click(Point::new(900.0, 1.0)).unwrap(), None);
        demo.add_random(10).unwrap();
        assert_eq!(demo.len(), 11);
        demo.set_order(5).unwrap();
        assert!(demo.is_empty());
        assert_eq!(demo.index().side(), 32);
        assert!(demo.set_order(0).is_err());
    }
}
