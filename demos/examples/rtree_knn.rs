// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! R-tree of random rectangles.
//!
//! Bulk-load rectangles, compare packing orders, then run an intersection
//! search and a nearest-neighbor query.
//!
//! Run:
//! - `cargo run -p tessera_demos --example rtree_knn`

use kurbo::{Point, Size};
use tessera_index::{Aabb2D, BulkOrder};
use tessera_session::demo::{Demo, RTreeDemo};

fn main() {
    tracing_subscriber::fmt::init();

    let mut demo = RTreeDemo::new(Size::new(750.0, 750.0), 4, 7).unwrap();
    demo.randomize(25).unwrap();
    let window = Aabb2D::new(200.0, 200.0, 500.0, 500.0);

    for order in [BulkOrder::Insertion, BulkOrder::ZOrder] {
        demo.set_order(order);
        demo.begin_intersect_query(window);
        let found = demo.finish_query();
        println!(
            "{order:?}: {} nodes, visited {}, found {found}",
            demo.tree().node_count(),
            demo.highlight().visited_count()
        );
    }

    for n in demo.query_nearest(Point::new(375.0, 375.0), 3) {
        println!("rect {} center at {:.1}", n.payload, n.distance);
    }
}
