// Linkproof - Cross-Toolchain Smoke Kit
// Copyright (C) 2026 The Linkproof Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Hosted smoke demo, exit-status variant: same transcript, but the exit
//! code carries the computed sum.

use std::process::exit;

fn main() {
    let a = 5;
    let b = 12;
    let c = a + b;

    println!("Hello, world!");
    println!("a = {}, b = {}", a, b);
    println!("a + b = c = {}", c);

    exit(c);
}
