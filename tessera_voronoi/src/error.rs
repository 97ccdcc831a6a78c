// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Errors reported by [`VoronoiIndex`](crate::VoronoiIndex).
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum Error {
    /// The triangulation rejected a site coordinate (non-finite, or outside
    /// the range it can represent exactly).
    #[error("site ({x}, {y}) cannot be triangulated")]
    InvalidSite {
        /// Rejected x coordinate.
        x: f64,
        /// Rejected y coordinate.
        y: f64,
    },
    /// The operation needs at least one site.
    #[error("the diagram has no sites")]
    Empty,
    /// An error from the underlying site list.
    #[error(transparent)]
    Index(#[from] tessera_index::Error),
}
