// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Point, Rect, Size};
use tessera_index::Aabb2D;

use crate::demo::{
    Demo, GridFileDemo, KdTreeDemo, MortonDemo, QuadTreeDemo, RTreeDemo, VoronoiDemo,
};
use crate::{Config, SessionError};

/// The demos a session holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DemoKind {
    /// [`GridFileDemo`].
    GridFile,
    /// [`KdTreeDemo`].
    KdTree,
    /// [`QuadTreeDemo`].
    QuadTree,
    /// [`RTreeDemo`].
    RTree,
    /// [`MortonDemo`].
    Morton,
    /// [`VoronoiDemo`].
    Voronoi,
}

impl DemoKind {
    /// Every kind, in menu order.
    pub const ALL: [Self; 6] = [
        Self::GridFile,
        Self::KdTree,
        Self::QuadTree,
        Self::RTree,
        Self::Morton,
        Self::Voronoi,
    ];

    // One independent stream per demo.
    fn seed(self, base: u64) -> u64 {
        let lane: u64 = match self {
            Self::GridFile => 1,
            Self::KdTree => 2,
            Self::QuadTree => 3,
            Self::RTree => 4,
            Self::Morton => 5,
            Self::Voronoi => 6,
        };
        base ^ lane.wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }
}

/// All demos over one canvas, built from a [`Config`].
#[derive(Debug)]
pub struct Session {
    config: Config,
    grid_file: GridFileDemo,
    kdtree: KdTreeDemo,
    quadtree: QuadTreeDemo,
    rtree: RTreeDemo,
    morton: MortonDemo,
    voronoi: VoronoiDemo,
}

impl Session {
    /// Validate `config` and build every demo, empty.
    pub fn new(config: Config) -> Result<Self, SessionError> {
        config.validate()?;
        let canvas = Size::new(config.canvas_width, config.canvas_height);
        let bounds = Aabb2D::from(canvas.to_rect());
        let seed = config.seed;
        let session = Self {
            grid_file: GridFileDemo::new(
                canvas.to_rect(),
                config.grid_size,
                config.grid_capacity,
                DemoKind::GridFile.seed(seed),
            )?,
            kdtree: KdTreeDemo::new(canvas, DemoKind::KdTree.seed(seed)),
            quadtree: QuadTreeDemo::new(
                bounds,
                config.quadtree_capacity,
                DemoKind::QuadTree.seed(seed),
            )?,
            rtree: RTreeDemo::new(canvas, config.rtree_max_entries, DemoKind::RTree.seed(seed))?,
            morton: MortonDemo::new(canvas, config.morton_order, DemoKind::Morton.seed(seed))?,
            voronoi: VoronoiDemo::new(bounds, DemoKind::Voronoi.seed(seed)),
            config,
        };
        tracing::debug!(
            width = session.config.canvas_width,
            height = session.config.canvas_height,
            "session created"
        );
        Ok(session)
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Canvas rectangle with its origin at zero.
    pub fn canvas(&self) -> Rect {
        Size::new(self.config.canvas_width, self.config.canvas_height).to_rect()
    }

    /// The grid file demo.
    pub fn grid_file(&self) -> &GridFileDemo {
        &self.grid_file
    }

    /// The grid file demo, mutably.
    pub fn grid_file_mut(&mut self) -> &mut GridFileDemo {
        &mut self.grid_file
    }

    /// The k-d tree demo.
    pub fn kdtree(&self) -> &KdTreeDemo {
        &self.kdtree
    }

    /// The k-d tree demo, mutably.
    pub fn kdtree_mut(&mut self) -> &mut KdTreeDemo {
        &mut self.kdtree
    }

    /// The quadtree demo.
    pub fn quadtree(&self) -> &QuadTreeDemo {
        &self.quadtree
    }

    /// The quadtree demo, mutably.
    pub fn quadtree_mut(&mut self) -> &mut QuadTreeDemo {
        &mut self.quadtree
    }

    /// The R-tree demo.
    pub fn rtree(&self) -> &RTreeDemo {
        &self.rtree
    }

    /// The R-tree demo, mutably.
    pub fn rtree_mut(&mut self) -> &mut RTreeDemo {
        &mut self.rtree
    }

    /// The Morton demo.
    pub fn morton(&self) -> &MortonDemo {
        &self.morton
    }

    /// The Morton demo, mutably.
    pub fn morton_mut(&mut self) -> &mut MortonDemo {
        &mut self.morton
    }

    /// The Voronoi demo.
    pub fn voronoi(&self) -> &VoronoiDemo {
        &self.voronoi
    }

    /// The Voronoi demo, mutably.
    pub fn voronoi_mut(&mut self) -> &mut VoronoiDemo {
        &mut self.voronoi
    }

    /// One demo through the shared [`Demo`] actions.
    pub fn demo(&self, kind: DemoKind) -> &dyn Demo {
        match kind {
            DemoKind::GridFile => &self.grid_file,
            DemoKind::KdTree => &self.kdtree,
            DemoKind::QuadTree => &self.quadtree,
            DemoKind::RTree => &self.rtree,
            DemoKind::Morton => &self.morton,
            DemoKind::Voronoi => &self.voronoi,
        }
    }

    /// One demo through the shared [`Demo`] actions, mutably.
    pub fn demo_mut(&mut self, kind: DemoKind) -> &mut dyn Demo {
        match kind {
            DemoKind::GridFile => &mut self.grid_file,
            DemoKind::KdTree => &mut self.kdtree,
            DemoKind::QuadTree => &mut self.quadtree,
            DemoKind::RTree => &mut self.rtree,
            DemoKind::Morton => &mut self.morton,
            DemoKind::Voronoi => &mut self.voronoi,
        }
    }

    /// Add [`Config::batch_size`] random elements to one demo.
    pub fn add_batch(&mut self, kind: DemoKind) -> Result<(), SessionError> {
        let count = self.config.batch_size;
        tracing::trace!(?kind, count, "adding random batch");
        self.demo_mut(kind).add_random(count)
    }

    /// Empty every demo.
    pub fn reset_all(&mut self) {
        for kind in DemoKind::ALL {
            self.demo_mut(kind).reset();
        }
    }

    /// Replace the contents of every demo with `count` random elements.
    pub fn randomize_all(&mut self, count: usize) -> Result<(), SessionError> {
        for kind in DemoKind::ALL {
            self.demo_mut(kind).randomize(count)?;
        }
        Ok(())
    }

    /// Run a nearest-neighbor query for [`Config::k`] neighbors of `p` on one
    /// demo, which keeps the result for drawing.
    ///
    /// Returns how many neighbors were found, or `None` for the Morton demo,
    /// which has no nearest-neighbor query.
    pub fn query_nearest(&mut self, kind: DemoKind, p: Point) -> Option<usize> {
        let k = self.config.k;
        let found = match kind {
            DemoKind::GridFile => self.grid_file.query_nearest(p, k).len(),
            DemoKind::KdTree => self.kdtree.query_nearest(p, k).len(),
            DemoKind::QuadTree => self.quadtree.query_nearest(p, k).len(),
            DemoKind::RTree => self.rtree.query_nearest(p, k).len(),
            DemoKind::Voronoi => self.voronoi.query_nearest(p, k).len(),
            DemoKind::Morton => return None,
        };
        tracing::trace!(?kind, k, found, "nearest-neighbor query");
        Some(found)
    }

    /// Change the neighbor count used by [`query_nearest`](Self::query_nearest).
    pub fn set_k(&mut self, k: usize) -> Result<(), SessionError> {
        self.update(|c| c.k = k)
    }

    /// Change how many elements one batch adds.
    pub fn set_batch_size(&mut self, batch_size: usize) -> Result<(), SessionError> {
        self.update(|c| c.batch_size = batch_size)
    }

    /// Resize the grid file. Drops its points.
    pub fn set_grid_size(&mut self, grid_size: u32) -> Result<(), SessionError> {
        self.update(|c| c.grid_size = grid_size)?;
        self.grid_file.set_grid_size(grid_size)
    }

    /// Change the grid file bucket capacity. Drops its points.
    pub fn set_grid_capacity(&mut self, capacity: usize) -> Result<(), SessionError> {
        self.update(|c| c.grid_capacity = capacity)?;
        self.grid_file.set_capacity(capacity)
    }

    /// Change the quadtree bucket capacity, keeping its points.
    pub fn set_quadtree_capacity(&mut self, capacity: usize) -> Result<(), SessionError> {
        self.update(|c| c.quadtree_capacity = capacity)?;
        self.quadtree.set_capacity(capacity)
    }

    /// Change the R-tree fan-out, keeping its rectangles.
    pub fn set_rtree_max_entries(&mut self, max_entries: usize) -> Result<(), SessionError> {
        self.update(|c| c.rtree_max_entries = max_entries)?;
        self.rtree.set_max_entries(max_entries)
    }

    /// Change the Morton curve order. Drops its entries.
    pub fn set_morton_order(&mut self, order: u32) -> Result<(), SessionError> {
        self.update(|c| c.morton_order = order)?;
        self.morton.set_order(order)
    }

    /// Apply `edit` to a copy of the config and keep it only if it validates.
    fn update(&mut self, edit: impl FnOnce(&mut Config)) -> Result<(), SessionError> {
        let mut next = self.config.clone();
        edit(&mut next);
        next.validate()?;
        self.config = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_seeds_differ() {
        let seeds: Vec<u64> = DemoKind::ALL.iter().map(|k| k.seed(7)).collect();
        for (i, a) in seeds.iter().enumerate() {
            assert!(seeds[i + 1..].iter().all(|b| a != b));
        }
    }

    #[test]
    fn rejected_settings_leave_the_config_alone() {
        let mut session = Session::new(Config::default()).unwrap();
        assert!(session.set_k(0).is_err());
        assert_eq!(session.config().k, 5);
        assert!(session.set_morton_order(12).is_err());
        assert_eq!(session.morton().index().order(), 4);
        session.set_morton_order(6).unwrap();
        assert_eq!(session.morton().index().side(), 64);
        assert_eq!(session.config().morton_order, 6);
    }

    #[test]
    fn k_sets_the_neighbor_count() {
        let mut session = Session::new(Config::default()).unwrap();
        session.randomize_all(30).unwrap();
        let p = Point::new(375.0, 375.0);
        for k in [3, 7] {
            session.set_k(k).unwrap();
            for kind in DemoKind::ALL {
                let expect = (kind != DemoKind::Morton).then_some(k);
                assert_eq!(session.query_nearest(kind, p), expect, "{kind:?}");
            }
            assert_eq!(session.kdtree().nearest().len(), k);
            assert_eq!(session.rtree().nearest().len(), k);
        }
        session.set_k(50).unwrap();
        assert_eq!(session.query_nearest(DemoKind::QuadTree, p), Some(30));
    }
}
