// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Voronoi cells.
//!
//! Scatter sites, print the triangulation and cell sizes, drag one site and
//! remove another by clicking inside its cell.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p tessera_demos --example voronoi_cells`

use kurbo::Point;
use tessera_index::Aabb2D;
use tessera_session::demo::{Demo, VoronoiDemo};

fn main() {
    tracing_subscriber::fmt::init();

    let mut demo = VoronoiDemo::new(Aabb2D::new(0.0, 0.0, 750.0, 750.0), 3);
    demo.randomize(100).unwrap();

    let diagram = demo.diagram().unwrap();
    let closed = diagram.cells.iter().filter(|c| c.bounded).count();
    println!(
        "{} sites, {} triangles, {closed} closed cells",
        demo.len(),
        diagram.triangles.len()
    );

    let first = demo.index().sites()[0].0;
    if demo.press(first).is_some() {
        let landed = demo.drag(Point::new(900.0, 10.0)).unwrap();
        demo.release();
        println!("dragged site 0 from {first:?} to {landed:?}");
    }

    let (at, id) = demo.remove_at(Point::new(375.0, 375.0)).unwrap();
    println!("removed site {id} at {at:?}, {} left", demo.len());
}
