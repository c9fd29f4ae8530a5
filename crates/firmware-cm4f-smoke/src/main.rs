#![no_std]
#![no_main]

use panic_halt as _;

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
    if value >= 10 {
        write_dec(value / 10);
    }
    write_byte(b'0' + (value % 10) as u8);
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

    // Completion marker for an attached debugger, then park in the runtime
    // with the sum as the status (exit-code variant of the smoke pair).
    cortex_m::asm::bkpt();
    linkproof_runtime::exit(c as i32)
}
