#![no_std]
// Linkproof - Cross-Toolchain Smoke Kit
// Copyright (C) 2026 The Linkproof Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.
#![no_main]

use core::fmt::Write;

use cortex_m_rt::entry;
use panic_halt as _;

// STM32F103 USART1 data register (APB2 base 0x4001_3800, DR at +0x04).
const USART1_DR: *mut u32 = 0x4001_3804 as *mut u32;

struct Tx;

impl Write for Tx {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for &b in s.as_bytes() {
            unsafe {
                core::ptr::write_volatile(USART1_DR, b as u32);
            }
        }
        Ok(())
    }
}

#[entry]
fn main() -> ! {
    let a = 5;
    let b = 12;
    let c = a + b;

    let mut tx = Tx;
    let _ = writeln!(tx, "Hello, world!");
    let _ = writeln!(tx, "a = {}, b = {}", a, b);
    let _ = writeln!(tx, "a + b = c = {}", c);

    linkproof_runtime::exit(0)
}
