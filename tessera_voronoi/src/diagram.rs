// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delaunay triangulation and Voronoi cells of a site list.

use spade::{DelaunayTriangulation, HasPosition, Point2, Triangulation};
use tessera_index::Point;

use crate::Error;

/// A site as handed to the triangulation: its position and its slot in the
/// site list.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Site {
    position: Point2<f64>,
    slot: usize,
}

impl HasPosition for Site {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

pub(crate) type Triangles = DelaunayTriangulation<Site>;

/// Triangulate `points`, remembering each point's slot.
///
/// Points sharing a position collapse into one vertex carrying the last slot.
pub(crate) fn triangulate(points: impl IntoIterator<Item = Point>) -> Result<Triangles, Error> {
    let mut triangulation = Triangles::new();
    for (slot, p) in points.into_iter().enumerate() {
        let site = Site {
            position: Point2::new(p.x, p.y),
            slot,
        };
        triangulation
            .insert(site)
            .map_err(|_| Error::InvalidSite { x: p.x, y: p.y })?;
    }
    Ok(triangulation)
}

/// Slot of the site whose Voronoi cell contains `query`.
pub(crate) fn nearest_slot(triangulation: &Triangles, query: Point) -> Option<usize> {
    triangulation
        .nearest_neighbor(Point2::new(query.x, query.y))
        .map(|v| v.data().slot)
}

/// The Voronoi region of one site.
#[derive(Clone, Debug, PartialEq)]
pub struct VoronoiCell {
    /// Slot of the site in the site list.
    pub site: usize,
    /// Finite corners of the cell, counterclockwise.
    pub polygon: Vec<Point>,
    /// Whether the cell is closed. Cells of sites on the convex hull extend to
    /// infinity; their `polygon` holds only the finite corners.
    pub bounded: bool,
}

/// Snapshot of the Delaunay triangulation and Voronoi diagram.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagram {
    /// Delaunay triangles as site slots, counterclockwise.
    pub triangles: Vec<[usize; 3]>,
    /// One cell per distinct site position.
    pub cells: Vec<VoronoiCell>,
}

impl Diagram {
    pub(crate) fn from_triangulation(triangulation: &Triangles) -> Self {
        let triangles = triangulation
            .inner_faces()
            .map(|face| face.vertices().map(|v| v.data().slot))
            .collect();
        let cells = triangulation
            .voronoi_faces()
            .map(|face| {
                let mut polygon = Vec::new();
                let mut bounded = true;
                for edge in face.adjacent_edges() {
                    match edge.from().position() {
                        Some(p) => polygon.push(Point::new(p.x, p.y)),
                        None => bounded = false,
                    }
                }
                VoronoiCell {
                    site: face.as_delaunay_vertex().data().slot,
                    polygon,
                    bounded,
                }
            })
            .collect();
        Self { triangles, cells }
    }

    /// Cell of the site at `slot`, if it has one.
    pub fn cell(&self, slot: usize) -> Option<&VoronoiCell> {
        self.cells.iter().find(|c| c.site == slot)
    }
}
