// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tessera Session: interactive state for exploring the Tessera indexes.
//!
//! A [`Session`] holds one demo per structure over a shared canvas. Demos
//! own their structure and the query state a presentation layer draws:
//! the last nearest-neighbor result, a range selection, or the
//! [`Highlight`](tessera_index::Highlight) of an animated search that
//! advances one [`step`](demo::KdTreeDemo::step) per frame.
//!
//! This crate does no drawing. Canvas coordinates go in as
//! [`kurbo::Point`]s and come out as index coordinates through the helpers
//! in [`convert`].
//!
//! # Example
//!
//! ```rust
//! use kurbo::Point;
//! use tessera_index::Aabb2D;
//! use tessera_session::demo::Demo;
//! use tessera_session::{Config, DemoKind, Session};
//!
//! let mut session = Session::new(Config::default()).unwrap();
//! session.add_batch(DemoKind::KdTree).unwrap();
//! assert_eq!(session.demo(DemoKind::KdTree).len(), 20);
//!
//! let kd = session.kdtree_mut();
//! let token = kd.begin_range_query(Aabb2D::new(0.0, 0.0, 375.0, 375.0));
//! let mut frames = 0;
//! while kd.step().is_some() {
//!     frames += 1;
//! }
//! assert!(frames > 0);
//! assert!(!kd.is_query_active());
//! assert!(token.is_cancelled(), "finished searches release their slot");
//!
//! let hits = kd.query_nearest(Point::new(375.0, 375.0), 3);
//! assert_eq!(hits.len(), 3);
//! ```

pub mod config;
pub mod convert;
pub mod demo;
mod error;
mod random;
mod session;

pub use config::Config;
pub use error::SessionError;
pub use session::{DemoKind, Session};
