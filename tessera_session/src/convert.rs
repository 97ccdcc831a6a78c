// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions between canvas pixels and index coordinates.

use kurbo::{Point, Rect, Size};
use tessera_index::{Aabb2D, GridCell, GridCoord};

/// Maps a square integer grid onto a rectangle of the canvas.
///
/// Grid coordinates are 1-based: column 1 starts at the left edge of the
/// area and column `grid_size` ends at its right edge.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridMapping {
    area: Rect,
    grid_size: u32,
}

impl GridMapping {
    /// Map a `grid_size` grid onto `area`.
    pub fn new(area: Rect, grid_size: u32) -> Self {
        Self {
            area: area.abs(),
            grid_size: grid_size.max(1),
        }
    }

    /// Canvas area covered by the grid.
    pub fn area(&self) -> Rect {
        self.area
    }

    /// Columns and rows.
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Grid cell under a canvas point, or `None` outside the grid.
    pub fn to_grid(&self, p: Point) -> Option<GridCoord> {
        Some(GridCoord::new(
            self.column(p.x - self.area.x0, self.area.width())?,
            self.column(p.y - self.area.y0, self.area.height())?,
        ))
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "The value is a non-negative whole number below `grid_size`."
    )]
    fn column(&self, offset: f64, extent: f64) -> Option<u32> {
        let t = offset / extent;
        if !(0.0..1.0).contains(&t) {
            return None;
        }
        let col = (t * f64::from(self.grid_size)).floor() as u32;
        Some(col.min(self.grid_size - 1) + 1)
    }

    /// Canvas position of the center of a grid cell.
    pub fn cell_center(&self, c: GridCoord) -> Point {
        Point::new(
            self.line_x(c.x) + self.cell_size().width / 2.0,
            self.line_y(c.y) + self.cell_size().height / 2.0,
        )
    }

    /// Size of one unit cell in pixels.
    pub fn cell_size(&self) -> Size {
        let n = f64::from(self.grid_size);
        Size::new(self.area.width() / n, self.area.height() / n)
    }

    /// Canvas x of the vertical line in front of column `at`.
    pub fn line_x(&self, at: u32) -> f64 {
        self.area.x0 + f64::from(at.saturating_sub(1)) * self.cell_size().width
    }

    /// Canvas y of the horizontal line in front of row `at`.
    pub fn line_y(&self, at: u32) -> f64 {
        self.area.y0 + f64::from(at.saturating_sub(1)) * self.cell_size().height
    }

    /// Canvas rectangle covered by a grid-file cell.
    pub fn cell_rect<P>(&self, cell: &GridCell<P>) -> Rect {
        let (xs, ys) = (cell.x_range(), cell.y_range());
        Rect::new(
            self.line_x(xs.start),
            self.line_y(ys.start),
            self.line_x(xs.end),
            self.line_y(ys.end),
        )
    }
}

/// Morton grid cell under a canvas point for a `side × side` grid covering
/// the canvas, or `None` outside the canvas.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Both values are checked to lie in 0..side before the cast."
)]
pub fn morton_cell(p: Point, canvas: Size, side: u32) -> Option<(u32, u32)> {
    let n = f64::from(side);
    let x = (p.x / canvas.width * n).floor();
    let y = (p.y / canvas.height * n).floor();
    if (0.0..n).contains(&x) && (0.0..n).contains(&y) {
        Some((x as u32, y as u32))
    } else {
        None
    }
}

/// Morton cells covered by a dragged canvas rectangle, clipped to the grid.
pub fn morton_cells(drag: Rect, canvas: Size, side: u32) -> Option<Aabb2D<u32>> {
    let drag = drag.abs();
    if drag.x1 < 0.0 || drag.y1 < 0.0 {
        return None;
    }
    let drag = drag.intersect(canvas.to_rect());
    let edge = |v: f64, extent: f64| v.min(extent * (1.0 - f64::EPSILON));
    let (x0, y0) = morton_cell(drag.origin(), canvas, side)?;
    let (x1, y1) = morton_cell(
        Point::new(edge(drag.x1, canvas.width), edge(drag.y1, canvas.height)),
        canvas,
        side,
    )?;
    Some(Aabb2D::new(x0, y0, x1, y1))
}

/// Normalized box spanned by two drag corners.
pub fn drag_box(a: Point, b: Point) -> Aabb2D<f64> {
    Rect::from_points(a, b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_round_trip_through_cell_centers() {
        let mapping = GridMapping::new(Rect::new(0.0, 0.0, 750.0, 750.0), 10);
        assert_eq!(mapping.to_grid(Point::new(0.0, 0.0)), Some(GridCoord::new(1, 1)));
        assert_eq!(mapping.to_grid(Point::new(749.9, 74.9)), Some(GridCoord::new(10, 1)));
        assert_eq!(mapping.to_grid(Point::new(750.0, 10.0)), None);
        assert_eq!(mapping.to_grid(Point::new(-1.0, 10.0)), None);
        let c = GridCoord::new(4, 7);
        assert_eq!(mapping.cell_center(c), Point::new(262.5, 487.5));
        assert_eq!(mapping.to_grid(mapping.cell_center(c)), Some(c));
    }

    #[test]
    fn offset_area_maps_lines() {
        let mapping = GridMapping::new(Rect::new(50.0, 20.0, 550.0, 520.0), 5);
        assert_eq!(mapping.line_x(1), 50.0);
        assert_eq!(mapping.line_x(6), 550.0);
        assert_eq!(mapping.line_y(3), 220.0);
    }

    #[test]
    fn morton_cells_clip_to_canvas() {
        let canvas = Size::new(750.0, 750.0);
        assert_eq!(morton_cell(Point::new(100.0, 700.0), canvas, 16), Some((2, 14)));
        assert_eq!(morton_cell(Point::new(750.0, 0.0), canvas, 16), None);
        let cells = morton_cells(Rect::new(800.0, 800.0, 600.0, 10.0), canvas, 16).unwrap();
        assert_eq!(cells, Aabb2D::new(12, 0, 15, 15));
        assert_eq!(morton_cells(Rect::new(900.0, 0.0, 950.0, 10.0), canvas, 16), None);
        assert_eq!(morton_cells(Rect::new(-50.0, -50.0, -10.0, -10.0), canvas, 16), None);
    }

    #[test]
    fn drag_box_normalizes_corners() {
        let b = drag_box(Point::new(30.0, 5.0), Point::new(10.0, 25.0));
        assert_eq!(b, Aabb2D::new(10.0, 5.0, 30.0, 25.0));
    }
}
