// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grid file basics.
//!
//! Insert points into a small grid file and print every split as it happens.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p tessera_demos --example grid_file_basics`

use tessera_index::{GridCoord, GridFile, InsertOutcome, Point};

fn main() {
    tracing_subscriber::fmt::init();

    let mut grid = GridFile::new(10, 2).unwrap();
    let script = [(1, 1), (2, 1), (9, 1), (1, 2), (2, 2), (1, 7), (4, 9), (5, 8)];
    for (i, (x, y)) in script.into_iter().enumerate() {
        match grid.insert(GridCoord::new(x, y), i).unwrap() {
            InsertOutcome::Stored => println!("({x}, {y}) stored"),
            InsertOutcome::Split(split) => {
                println!("({x}, {y}) split {:?} at {}", split.axis, split.at);
            }
            InsertOutcome::Overflow(blocker) => println!("({x}, {y}) overflow: {blocker:?}"),
        }
    }

    let xs: Vec<u32> = grid.x_scales().collect();
    let ys: Vec<u32> = grid.y_scales().collect();
    println!("x scales {xs:?}, y scales {ys:?}, {} cells", grid.cells().len());

    for n in grid.k_nearest(Point::new(3.0, 3.0), 3) {
        println!("near (3, 3): {:?} id {} at {:.2}", n.coord, n.payload, n.distance);
    }
}
