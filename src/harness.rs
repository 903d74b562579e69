//! Test-harness entry points.
//!
//! These keep the crash-on-contract-violation behavior that interop test
//! suites rely on: a violation aborts the process instead of returning an
//! error. Production callers want [`crate::interop`] instead.

use crate::interop::{SENTINEL_LEN, validate_sentinel};

/// Checks that all 8 bytes at `bytes` equal `0xAA`, aborting the process otherwise.
///
/// A null pointer also aborts.
#[unsafe(no_mangle)]
pub extern "C" fn ftdi_probe_consume_bytes(bytes: *const u8) {
    if bytes.is_null() {
        fatal("consume_bytes received a null buffer");
    }
    // Safety: caller guarantees at least SENTINEL_LEN readable bytes.
    let bytes = unsafe { &*(bytes as *const [u8; SENTINEL_LEN]) };
    if let Err(err) = validate_sentinel(bytes) {
        fatal(&err.to_string());
    }
}

fn fatal(message: &str) -> ! {
    log::error!("contract violation: {message}");
    eprintln!("ftdi_probe: contract violation: {message}");
    std::process::abort()
}
