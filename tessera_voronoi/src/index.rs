// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt::Debug;

use tessera_index::{Aabb2D, LinearScan, Neighbor, Point, PointIndex};

use crate::diagram::{self, Diagram};
use crate::Error;

/// Point set viewed through its Voronoi diagram.
///
/// Sites are kept in insertion order; a site's slot is its position in
/// [`sites`](Self::sites) and shifts down when an earlier site is removed.
#[derive(Clone, Debug)]
pub struct VoronoiIndex<P> {
    sites: LinearScan<P>,
    bounds: Aabb2D<f64>,
}

impl<P: Copy + PartialEq + Debug> VoronoiIndex<P> {
    /// An empty index. `bounds` is the region dragged sites are clamped to.
    pub fn new(bounds: Aabb2D<f64>) -> Self {
        Self {
            sites: LinearScan::new(),
            bounds,
        }
    }

    /// The clamping region.
    pub fn bounds(&self) -> Aabb2D<f64> {
        self.bounds
    }

    /// Sites in insertion order.
    pub fn sites(&self) -> &[(Point, P)] {
        self.sites.entries()
    }

    /// Number of sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether there are no sites.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Drop every site.
    pub fn clear(&mut self) {
        self.sites.clear();
    }

    /// Add a site. Non-finite coordinates are rejected.
    pub fn insert(&mut self, point: Point, payload: P) -> Result<(), Error> {
        if !point.is_finite() {
            return Err(Error::InvalidSite {
                x: point.x,
                y: point.y,
            });
        }
        self.sites.push(point, payload);
        Ok(())
    }

    /// Up to `k` sites closest to `target`, by scan.
    pub fn k_nearest(&self, target: Point, k: usize) -> Vec<Neighbor<P>> {
        self.sites.k_nearest(target, k)
    }

    /// Remove the site whose cell contains `query` and return it.
    pub fn remove_nearest(&mut self, query: Point) -> Result<(Point, P), Error> {
        if self.sites.is_empty() {
            return Err(Error::Empty);
        }
        let triangulation = diagram::triangulate(self.sites.entries().iter().map(|&(p, _)| p))?;
        let slot = diagram::nearest_slot(&triangulation, query).ok_or(Error::Empty)?;
        let removed = self.sites.remove_at(slot).ok_or(tessera_index::Error::NotFound)?;
        tracing::debug!(slot, x = removed.0.x, y = removed.0.y, "removed voronoi site");
        Ok(removed)
    }

    /// Move the site at `slot` to `to`, clamped to [`bounds`](Self::bounds).
    ///
    /// Returns the position actually used. Non-finite targets are rejected
    /// and leave the site where it was.
    pub fn move_site(&mut self, slot: usize, to: Point) -> Result<Point, Error> {
        if !to.is_finite() {
            return Err(Error::InvalidSite { x: to.x, y: to.y });
        }
        let b = self.bounds;
        let clamped = Point::new(to.x.clamp(b.min_x, b.max_x), to.y.clamp(b.min_y, b.max_y));
        self.sites.set_point(slot, clamped)?;
        Ok(clamped)
    }

    /// Triangulate the current sites.
    pub fn diagram(&self) -> Result<Diagram, Error> {
        let triangulation = diagram::triangulate(self.sites.entries().iter().map(|&(p, _)| p))?;
        let diagram = Diagram::from_triangulation(&triangulation);
        tracing::trace!(
            sites = self.sites.len(),
            triangles = diagram.triangles.len(),
            "computed voronoi diagram"
        );
        Ok(diagram)
    }
}
