// Linkproof - Cross-Toolchain Smoke Kit
// Copyright (C) 2026 The Linkproof Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

#![cfg_attr(not(test), no_std)]

use core::ffi::c_void;
use core::ptr::NonNull;

/// True when the C-ABI link stubs are compiled into this crate. The target
/// gate is the entire configuration surface of the shim.
pub const SHIM_ACTIVE: bool = cfg!(all(target_arch = "arm", target_os = "none"));

/// A standard-stream handle that may or may not be backed by a real
/// operating-system facility.
///
/// Layout is exactly a nullable C `FILE*`: `repr(transparent)` over
/// `Option<NonNull<_>>` keeps the null-pointer niche, so the detached
/// placeholder is a plain null on the wire. Resolved once at build
/// configuration time and never mutated afterwards.
#[repr(transparent)]
#[derive(Debug, Clone, Copy)]
pub struct StreamHandle(Option<NonNull<c_void>>);

impl StreamHandle {
    /// Placeholder for a stream with no operating system beneath it.
    pub const fn detached() -> Self {
        Self(None)
    }

    /// Handle backed by a real host facility.
    pub const fn backed(ptr: NonNull<c_void>) -> Self {
        Self(Some(ptr))
    }

    pub const fn is_backed(&self) -> bool {
        self.0.is_some()
    }
}

// Immutable after static initialization; no interior mutability.
unsafe impl Sync for StreamHandle {}

/// Terminal state for a core with nothing to return to. Falling out of
/// `main` on a target without an operating system would run off into
/// unmapped memory; parking the core here is the only safe end state.
pub fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

/// Process-exit replacement for targets with no process to reclaim. Where
/// the link stubs are active the call lands in the exported `_exit`;
/// everywhere else it parks straight in [`halt`]. The status has nowhere to
/// go either way.
pub fn exit(status: i32) -> ! {
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    {
        link_stubs::_exit(status)
    }
    #[cfg(not(all(target_arch = "arm", target_os = "none")))]
    {
        let _ = status;
        halt()
    }
}

/// Terminal probe with no terminal to ask. Formatted-output paths need a
/// deterministic answer to proceed, so every stream reports interactive.
/// Where the link stubs are active this is the exported `isatty`.
pub fn is_terminal(fd: i32) -> bool {
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    {
        return link_stubs::isatty(fd) != 0;
    }
    #[cfg(not(all(target_arch = "arm", target_os = "none")))]
    {
        let _ = fd;
        true
    }
}

/// Symbols a hosted standard library would obtain from the operating
/// system, defined here so freestanding ARM EABI links resolve. Absent on
/// every other target; the toolchain's own definitions apply there.
#[cfg(all(target_arch = "arm", target_os = "none"))]
mod link_stubs {
    use core::ffi::c_int;

    use super::StreamHandle;

    // The stream constants only satisfy symbol resolution for formatted
    // I/O. Byte transport goes through lower-level put primitives that
    // never read them; dereferencing either placeholder on this target is
    // undefined behavior.
    #[allow(non_upper_case_globals)]
    #[no_mangle]
    #[used]
    pub static stdout: StreamHandle = StreamHandle::detached();

    #[allow(non_upper_case_globals)]
    #[no_mangle]
    #[used]
    pub static stderr: StreamHandle = StreamHandle::detached();

    // Every program reaches `_exit`, so the volatile reads below keep the
    // stream constants and the probe present in the final image even under
    // linker section collection. `inline(never)` keeps the call itself a
    // reference to this symbol.
    #[no_mangle]
    #[inline(never)]
    pub extern "C" fn _exit(_status: c_int) -> ! {
        unsafe {
            let _ = core::ptr::read_volatile(core::ptr::addr_of!(stdout));
            let _ = core::ptr::read_volatile(core::ptr::addr_of!(stderr));
        }
        let probe: extern "C" fn(c_int) -> c_int = isatty;
        let _ = unsafe { core::ptr::read_volatile(&probe) };
        super::halt()
    }

    #[no_mangle]
    pub extern "C" fn isatty(_fd: c_int) -> c_int {
        1
    }
}
