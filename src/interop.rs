//! C entry points exercising pointer and buffer marshaling across the FFI boundary.

use std::ffi::CStr;
use std::os::raw::c_char;

use crate::error::{ProbeError, clear_error, ftdi_probe_error_t, write_error};
use crate::ffi::{read_array, write_out};

/// Value every byte of a sentinel buffer must hold.
pub const SENTINEL: u8 = 0xaa;

/// Number of bytes in a sentinel buffer.
pub const SENTINEL_LEN: usize = 8;

static FIXED_STRING: &CStr = c"abc";

/// The static string handed out by `ftdi_probe_get_ptr_to_string`.
pub fn fixed_string() -> &'static CStr {
    FIXED_STRING
}

/// Checks that every byte equals [`SENTINEL`], reporting the first that does not.
pub fn validate_sentinel(bytes: &[u8; SENTINEL_LEN]) -> Result<(), ProbeError> {
    match bytes.iter().position(|&b| b != SENTINEL) {
        None => Ok(()),
        Some(index) => Err(ProbeError::SentinelMismatch {
            index,
            found: bytes[index],
            expected: SENTINEL,
        }),
    }
}

/// Stores the address of a static, NUL-terminated `"abc"` into `out`.
///
/// The string lives for the whole process. Callers must not free or modify it.
/// A null `out` is ignored.
#[unsafe(no_mangle)]
pub extern "C" fn ftdi_probe_get_ptr_to_string(out: *mut *const c_char) {
    write_out(out, FIXED_STRING.as_ptr());
}

/// Validates an 8-byte buffer in which every byte must be `0xAA`.
///
/// Returns false and fills `out_error` if `bytes` is null or any byte differs.
#[unsafe(no_mangle)]
pub extern "C" fn ftdi_probe_validate_sentinel_buffer(
    bytes: *const u8,
    out_error: *mut *mut ftdi_probe_error_t,
) -> bool {
    clear_error(out_error);
    let Some(bytes) = read_array::<SENTINEL_LEN>(bytes, "bytes", out_error) else {
        return false;
    };
    match validate_sentinel(bytes) {
        Ok(()) => true,
        Err(err) => {
            log::debug!("rejected sentinel buffer: {err}");
            write_error(out_error, err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    use crate::error::{ftdi_probe_error_free, ftdi_probe_error_message};

    #[test]
    fn fixed_string_is_abc() {
        let mut out: *const c_char = ptr::null();
        ftdi_probe_get_ptr_to_string(&mut out);
        let value = unsafe { CStr::from_ptr(out) };
        assert_eq!(value.to_bytes_with_nul(), b"abc\0");
    }

    #[test]
    fn fixed_string_address_is_stable() {
        let mut first: *const c_char = ptr::null();
        let mut second: *const c_char = ptr::null();
        ftdi_probe_get_ptr_to_string(&mut first);
        ftdi_probe_get_ptr_to_string(&mut second);
        assert_eq!(first, second);
        assert_eq!(first, fixed_string().as_ptr());
    }

    #[test]
    fn null_out_slot_is_ignored() {
        ftdi_probe_get_ptr_to_string(ptr::null_mut());
    }

    #[test]
    fn all_sentinel_buffer_is_accepted() {
        assert_eq!(validate_sentinel(&[SENTINEL; SENTINEL_LEN]), Ok(()));
    }

    #[test]
    fn first_mismatch_is_reported() {
        let mut bytes = [SENTINEL; SENTINEL_LEN];
        bytes[3] = 0x55;
        bytes[6] = 0x00;
        assert_eq!(
            validate_sentinel(&bytes),
            Err(ProbeError::SentinelMismatch {
                index: 3,
                found: 0x55,
                expected: SENTINEL,
            })
        );
    }

    #[test]
    fn c_validator_reports_mismatch() {
        let mut bytes = [SENTINEL; SENTINEL_LEN];
        bytes[7] = 0x00;
        let mut error: *mut ftdi_probe_error_t = ptr::null_mut();
        assert!(!ftdi_probe_validate_sentinel_buffer(bytes.as_ptr(), &mut error));
        assert!(!error.is_null());
        let message = unsafe { CStr::from_ptr(ftdi_probe_error_message(error)) };
        assert!(message.to_str().unwrap().starts_with("byte 7 was 0x00"));
        ftdi_probe_error_free(error);
    }

    #[test]
    fn c_validator_accepts_sentinels_and_clears_error() {
        let bytes = [SENTINEL; SENTINEL_LEN];
        let mut error: *mut ftdi_probe_error_t = ptr::null_mut();
        assert!(ftdi_probe_validate_sentinel_buffer(bytes.as_ptr(), &mut error));
        assert!(error.is_null());
    }

    #[test]
    fn c_validator_rejects_null() {
        let mut error: *mut ftdi_probe_error_t = ptr::null_mut();
        assert!(!ftdi_probe_validate_sentinel_buffer(ptr::null(), &mut error));
        ftdi_probe_error_free(error);
    }
}
