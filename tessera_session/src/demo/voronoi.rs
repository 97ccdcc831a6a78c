// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Point;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tessera_index::{Aabb2D, Neighbor};
use tessera_voronoi::{Diagram, VoronoiIndex};

use super::Demo;
use crate::SessionError;
use crate::random;

/// Sites within this distance of a press start a drag.
pub const GRAB_RADIUS: f64 = 10.0;

/// Voronoi diagram with draggable sites.
#[derive(Debug)]
pub struct VoronoiDemo {
    index: VoronoiIndex<usize>,
    rng: StdRng,
    next_id: usize,
    dragging: Option<usize>,
    nearest: Vec<Neighbor<usize>>,
}

impl VoronoiDemo {
    /// An empty demo; dragged sites stay inside `bounds`.
    pub fn new(bounds: Aabb2D<f64>, seed: u64) -> Self {
        Self {
            index: VoronoiIndex::new(bounds),
            rng: StdRng::seed_from_u64(seed),
            next_id: 0,
            dragging: None,
            nearest: Vec::new(),
        }
    }

    /// The site set.
    pub fn index(&self) -> &VoronoiIndex<usize> {
        &self.index
    }

    /// Slot of the site being dragged.
    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    /// Result of the most recent nearest-neighbor query.
    pub fn nearest(&self) -> &[Neighbor<usize>] {
        &self.nearest
    }

    /// Add a site at a click position.
    pub fn insert(&mut self, p: Point) -> Result<(), SessionError> {
        self.index.insert(p, self.next_id)?;
        self.next_id += 1;
        self.nearest.clear();
        Ok(())
    }

    /// Remove the site whose cell contains `p`.
    pub fn remove_at(&mut self, p: Point) -> Result<(Point, usize), SessionError> {
        self.dragging = None;
        self.nearest.clear();
        Ok(self.index.remove_nearest(p)?)
    }

    /// Start dragging the site under `p`, if one is within [`GRAB_RADIUS`].
    pub fn press(&mut self, p: Point) -> Option<usize> {
        self.dragging = self
            .index
            .sites()
            .iter()
            .enumerate()
            .map(|(slot, &(site, _))| (slot, site.distance(p)))
            .filter(|&(_, d)| d <= GRAB_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(slot, _)| slot);
        self.dragging
    }

    /// Move the dragged site; returns where it landed after clamping.
    pub fn drag(&mut self, to: Point) -> Result<Option<Point>, SessionError> {
        let Some(slot) = self.dragging else {
            return Ok(None);
        };
        self.nearest.clear();
        Ok(Some(self.index.move_site(slot, to)?))
    }

    /// End a drag.
    pub fn release(&mut self) {
        self.dragging = None;
    }

    /// Triangulation and cells of the current sites.
    pub fn diagram(&self) -> Result<Diagram, SessionError> {
        Ok(self.index.diagram()?)
    }

    /// Find the `k` sites nearest to `p`.
    pub fn query_nearest(&mut self, p: Point, k: usize) -> &[Neighbor<usize>] {
        self.nearest = self.index.k_nearest(p, k);
        &self.nearest
    }
}

impl Demo for VoronoiDemo {
    fn reset(&mut self) {
        self.index.clear();
        self.dragging = None;
        self.nearest.clear();
    }

    fn add_random(&mut self, count: usize) -> Result<(), SessionError> {
        let bounds = self.index.bounds();
        for _ in 0..count {
            let p = random::gaussian_point(&mut self.rng, bounds);
            self.insert(p)?;
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> VoronoiDemo {
        VoronoiDemo::new(Aabb2D::new(0.0, 0.0, 200.0, 200.0), 12)
    }

    #[test]
    fn drag_moves_and_clamps_the_grabbed_site() {
        let mut demo = demo();
        demo.insert(Point::new(20.0, 20.0)).unwrap();
        demo.insert(Point::new(100.0, 100.0)).unwrap();
        assert_eq!(demo.press(Point::new(60.0, 60.0)), None);
        assert_eq!(demo.drag(Point::new(1.0, 1.0)), Ok(None));
        assert_eq!(demo.press(Point::new(104.0, 97.0)), Some(1));
        assert_eq!(
            demo.drag(Point::new(250.0, 150.0)),
            Ok(Some(Point::new(200.0, 150.0)))
        );
        demo.release();
        assert_eq!(demo.index().sites()[1].0, Point::new(200.0, 150.0));
        assert_eq!(demo.dragging(), None);
    }

    #[test]
    fn random_sites_build_a_diagram() {
        let mut demo = demo();
        demo.randomize(60).unwrap();
        let diagram = demo.diagram().unwrap();
        assert!(!diagram.triangles.is_empty());
        assert!(diagram.cells.iter().any(|c| c.bounded));
        let (_, id) = demo.remove_at(Point::new(100.0, 100.0)).unwrap();
        assert!(id < 60);
        assert_eq!(demo.len(), 59);
    }

    #[test]
    fn empty_removal_is_an_error() {
        let mut demo = demo();
        assert_eq!(
            demo.remove_at(Point::ORIGIN),
            Err(SessionError::Voronoi(tessera_voronoi::Error::Empty))
        );
    }
}
