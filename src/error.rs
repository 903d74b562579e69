//! Error types shared by the Rust API and the C entry points.

use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use crate::d2xx::FtStatus;
use crate::probe::ProbeStep;

/// Errors reported by the probes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("byte {index} was {found:#04x}, expected sentinel {expected:#04x}")]
    SentinelMismatch { index: usize, found: u8, expected: u8 },

    #[error("{0} was null")]
    NullPointer(&'static str),

    #[error("{step} failed: {status}")]
    Driver { step: ProbeStep, status: FtStatus },

    #[error("unknown bit mode {0:#04x}")]
    UnknownBitMode(u8),

    #[error("invalid probe configuration: {0}")]
    InvalidConfig(String),

    #[error("logging: {0}")]
    Logging(String),
}

/// Opaque error type for C callers.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct ftdi_probe_error_t;

struct ErrorHandle {
    message: CString,
}

/// Builds a C string, replacing interior NUL bytes with spaces.
pub(crate) fn cstring_lossy(value: &str) -> CString {
    let bytes: Vec<u8> = value
        .bytes()
        .map(|b| if b == 0 { b' ' } else { b })
        .collect();
    // No interior NULs remain after the substitution above.
    CString::new(bytes).unwrap_or_default()
}

pub(crate) fn clear_error(out_error: *mut *mut ftdi_probe_error_t) {
    if !out_error.is_null() {
        // Safety: caller provided a valid out_error pointer.
        unsafe {
            *out_error = ptr::null_mut();
        }
    }
}

pub(crate) fn write_error(out_error: *mut *mut ftdi_probe_error_t, message: impl ToString) {
    if out_error.is_null() {
        return;
    }
    let handle = Box::new(ErrorHandle {
        message: cstring_lossy(&message.to_string()),
    });
    // Safety: out_error is non-null and points to writable memory.
    unsafe {
        *out_error = Box::into_raw(handle) as *mut ftdi_probe_error_t;
    }
}

/// Returns the message for an error allocated by ftdi_probe.
///
/// The returned pointer is valid as long as the error handle is alive.
#[unsafe(no_mangle)]
pub extern "C" fn ftdi_probe_error_message(error: *const ftdi_probe_error_t) -> *const c_char {
    if error.is_null() {
        return ptr::null();
    }
    // Safety: error must be a valid handle allocated by ftdi_probe.
    let handle = unsafe { &*(error as *const ErrorHandle) };
    handle.message.as_ptr()
}

/// Frees an error returned by ftdi_probe.
#[unsafe(no_mangle)]
pub extern "C" fn ftdi_probe_error_free(error: *mut ftdi_probe_error_t) {
    if error.is_null() {
        return;
    }
    // Safety: error must be a valid handle allocated by ftdi_probe.
    unsafe {
        drop(Box::from_raw(error as *mut ErrorHandle));
    }
}
