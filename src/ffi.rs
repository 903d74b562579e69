//! Shared utilities for ftdi_probe's C entry points.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::{ProbeError, ftdi_probe_error_t, write_error};

/// Borrows a fixed-size byte buffer handed over by a C caller.
///
/// No length travels with the pointer; the caller guarantees `N` readable bytes.
pub(crate) fn read_array<'a, const N: usize>(
    value: *const u8,
    field: &'static str,
    out_error: *mut *mut ftdi_probe_error_t,
) -> Option<&'a [u8; N]> {
    if value.is_null() {
        write_error(out_error, ProbeError::NullPointer(field));
        return None;
    }
    // Safety: caller guarantees at least N readable bytes; [u8; N] has alignment 1.
    Some(unsafe { &*(value as *const [u8; N]) })
}

/// Writes `value` through an output pointer, ignoring null.
pub(crate) fn write_out<T>(out: *mut T, value: T) -> bool {
    if out.is_null() {
        return false;
    }
    // Safety: caller provided a writable, properly aligned output pointer.
    unsafe {
        out.write(value);
    }
    true
}

/// Runs `f`, converting a panic into an error message so it never unwinds into C.
pub(crate) fn guard_panic<T>(
    what: &'static str,
    out_error: *mut *mut ftdi_probe_error_t,
    f: impl FnOnce() -> T,
) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(_) => {
            write_error(out_error, format!("panic while {what}"));
            None
        }
    }
}
