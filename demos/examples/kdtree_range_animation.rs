// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animated k-d tree range search.
//!
//! Start a range search, advance it a few frames, then start another one and
//! watch the first get cancelled.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p tessera_demos --example kdtree_range_animation`

use kurbo::Point;
use tessera_index::{Aabb2D, TraversalStep};
use tessera_session::demo::Demo;
use tessera_session::{Config, Session};

fn main() {
    tracing_subscriber::fmt::init();

    let mut session = Session::new(Config::default()).unwrap();
    let kd = session.kdtree_mut();
    kd.randomize(40).unwrap();
    println!("{} points, depth {}", kd.len(), kd.tree().depth());

    let first = kd.begin_range_query(Aabb2D::new(0.0, 0.0, 400.0, 400.0));
    for frame in 0..3 {
        match kd.step() {
            Some(TraversalStep::Visit(id)) => println!("frame {frame}: visit {id:?}"),
            Some(TraversalStep::Found(id)) => println!("frame {frame}: found {id:?}"),
            None => break,
        }
    }

    let second = kd.begin_range_query(Aabb2D::new(300.0, 300.0, 750.0, 750.0));
    assert!(first.is_cancelled(), "starting a new search cancels the old one");
    let found = kd.finish_query();
    println!(
        "second search: {} visited, {found} found, cancelled after finishing: {}",
        kd.highlight().visited_count(),
        second.is_cancelled()
    );

    for n in kd.query_nearest(Point::new(375.0, 375.0), 5) {
        println!("near center: {:?} at {:.1}", n.point, n.distance);
    }
}
