// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tessera Voronoi: a Voronoi/Delaunay view over a point set.
//!
//! The sites live in a plain [`LinearScan`](tessera_index::LinearScan); the
//! Delaunay triangulation is computed on demand with [`spade`] whenever a
//! diagram is requested or a site is removed by clicking inside its cell.
//! Nearest-neighbor search is a linear scan over the sites.
//!
//! # Example
//!
//! ```rust
//! use tessera_index::{Aabb2D, Point};
//! use tessera_voronoi::VoronoiIndex;
//!
//! let mut index = VoronoiIndex::new(Aabb2D::new(0.0, 0.0, 100.0, 100.0));
//! for (i, (x, y)) in [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0), (50.0, 50.0)]
//!     .into_iter()
//!     .enumerate()
//! {
//!     index.insert(Point::new(x, y), i).unwrap();
//! }
//!
//! let diagram = index.diagram().unwrap();
//! assert_eq!(diagram.triangles.len(), 4);
//!
//! // Removing by a point inside a cell removes that cell's site.
//! let (_, removed) = index.remove_nearest(Point::new(55.0, 45.0)).unwrap();
//! assert_eq!(removed, 4);
//! ```

mod diagram;
mod error;
mod index;

pub use diagram::{Diagram, VoronoiCell};
pub use error::Error;
pub use index::VoronoiIndex;
