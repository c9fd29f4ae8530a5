// Linkproof - Cross-Toolchain Smoke Kit
// Copyright (C) 2026 The Linkproof Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Hosted smoke demo: prints the canonical transcript and exits 0.

fn main() {
    let a = 5;
    let b = 12;
    let c = a + b;

    println!("Hello, world!");
    println!("a = {}, b = {}", a, b);
    println!("a + b = c = {}", c);
}
