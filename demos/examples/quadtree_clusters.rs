// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadtree over clustered points.
//!
//! Fill a quadtree with Gaussian clusters, print how deep it subdivides, then
//! remove points until the tree collapses back to its root.
//!
//! Run:
//! - `cargo run -p tessera_demos --example quadtree_clusters`

use kurbo::Point;
use tessera_index::Aabb2D;
use tessera_session::demo::{Demo, QuadTreeDemo};

fn main() {
    tracing_subscriber::fmt::init();

    let mut demo = QuadTreeDemo::new(Aabb2D::new(0.0, 0.0, 750.0, 750.0), 3, 42).unwrap();
    demo.randomize(600).unwrap();
    println!(
        "{} points in {} nodes, depth {}",
        demo.len(),
        demo.tree().node_count(),
        demo.tree().depth()
    );

    let center = Aabb2D::from_center(Point::new(375.0, 375.0), 60.0, 60.0);
    println!("{} points near the center", demo.query(center).len());

    demo.set_capacity(12).unwrap();
    println!("capacity 12: {} nodes", demo.tree().node_count());

    while demo.remove_nearest(Point::new(375.0, 375.0)).unwrap().is_some() {}
    println!("after removing everything: {} node(s)", demo.tree().node_count());
}
