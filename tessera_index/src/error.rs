// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by every index in this crate.

use thiserror::Error;

/// Smallest bucket or node capacity any structure accepts.
pub const MIN_CAPACITY: usize = 2;

/// Errors reported by index operations.
///
/// Queries never fail: asking an empty structure for neighbors or a range
/// yields an empty result instead of an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The coordinate lies outside the domain the structure covers.
    #[error("coordinate lies outside the indexed domain")]
    OutOfBounds,
    /// No element matched the given coordinates and payload.
    #[error("no matching element")]
    NotFound,
    /// A bucket or node capacity below [`MIN_CAPACITY`] was requested.
    #[error("capacity {requested} is below the minimum of {minimum}")]
    InvalidCapacity {
        /// The rejected capacity.
        requested: usize,
        /// The smallest accepted capacity.
        minimum: usize,
    },
    /// A grid size or curve order outside the supported range was requested.
    #[error("grid size {requested} is out of range")]
    InvalidGridSize {
        /// The rejected size or order.
        requested: u32,
    },
}

pub(crate) fn check_capacity(requested: usize) -> Result<usize, Error> {
    if requested < MIN_CAPACITY {
        Err(Error::InvalidCapacity {
            requested,
            minimum: MIN_CAPACITY,
        })
    } else {
        Ok(requested)
    }
}
