// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Errors reported by sessions and demos.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SessionError {
    /// An index rejected an operation.
    #[error(transparent)]
    Index(#[from] tessera_index::Error),
    /// The Voronoi view rejected an operation.
    #[error(transparent)]
    Voronoi(#[from] tessera_voronoi::Error),
    /// A configuration value is out of range.
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}
