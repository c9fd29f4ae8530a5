#![no_std]
// Linkproof - Cross-Toolchain Smoke Kit
// Copyright (C) 2026 The Linkproof Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.
#![no_main]

use linkproof_runtime::exit;

// Default UART TX register of the validation fixture board model.
const UART_TX_PTR: *mut u8 = 0x4000_C000 as *mut u8;

fn write_byte(b: u8) {
    unsafe {
        core::ptr::write_volatile(UART_TX_PTR, b);
    }
}

fn write_str(s: &str) {
    for &b in s.as_bytes() {
        write_byte(b);
    }
}

fn write_dec(value: u32) {
    let mut digits = [0u8; 10];
    let mut n = value;
    let mut i = digits.len();
    loop {
        i -= 1;
        digits[i] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    for &d in &digits[i..] {
        write_byte(d);
    }
}

#[no_mangle]
pub extern "C" fn Reset() -> ! {
    main()
}

// Second word of the vector table; the initial stack pointer comes from link.x.
#[link_section = ".vector_table.reset_vector"]
#[no_mangle]
pub static RESET_VECTOR: extern "C" fn() -> ! = Reset;

fn main() -> ! {
    let a: u32 = 5;
    let b: u32 = 12;
    let c = a + b;

    write_str("Hello, world!\n");
    write_str("a = ");
    write_dec(a);
    write_str(", b = ");
    write_dec(b);
    write_str("\n");
    write_str("a + b = c = ");
    write_dec(c);
    write_str("\n");

    exit(0)
}

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    linkproof_runtime::halt()
}
