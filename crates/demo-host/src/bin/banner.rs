// Linkproof - Cross-Toolchain Smoke Kit
// Copyright (C) 2026 The Linkproof Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Hosted smoke demo, banner variant: pushes multibyte UTF-8 through stdout.

fn main() {
    println!();
    println!("========== RUNNING DEMO ==========");
    println!("LLVM Toolchain Demo!");
    println!("👋 Hello, 🌐 World");
    println!("========== DEMO FINISHED ==========");
    println!();
}
