// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Z-order curve.
//!
//! Print the curve for a small grid and select a dragged rectangle.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p tessera_demos --example morton_curve`

use kurbo::{Rect, Size};
use tessera_session::demo::MortonDemo;

fn main() {
    tracing_subscriber::fmt::init();

    let mut demo = MortonDemo::new(Size::new(400.0, 400.0), 2, 1).unwrap();
    demo.fill();
    let path: Vec<String> = demo
        .index()
        .entries()
        .iter()
        .map(|e| format!("({},{})", e.x, e.y))
        .collect();
    println!("order 2 curve: {}", path.join(" -> "));

    demo.set_order(4).unwrap();
    demo.fill();
    let selected = demo.select(Rect::new(60.0, 110.0, 240.0, 190.0));
    let codes: Vec<u64> = selected.iter().map(|e| e.code).collect();
    println!("{} cells selected, codes {codes:?}", codes.len());
}
