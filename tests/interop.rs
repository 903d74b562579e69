use std::ffi::CStr;
use std::os::raw::c_char;
use std::process::Command;
use std::ptr;

use ftdi_probe::harness::ftdi_probe_consume_bytes;
use ftdi_probe::interop::{
    SENTINEL, SENTINEL_LEN, ftdi_probe_get_ptr_to_string, ftdi_probe_validate_sentinel_buffer,
};

const CHILD_ENV: &str = "FTDI_PROBE_HARNESS_CHILD";

#[test]
fn string_provider_yields_abc() {
    let mut out: *const c_char = ptr::null();
    ftdi_probe_get_ptr_to_string(&mut out);
    assert!(!out.is_null());
    let text = unsafe { CStr::from_ptr(out) };
    assert_eq!(text.to_str().unwrap(), "abc");
}

#[test]
fn string_provider_is_stable_across_calls() {
    let mut seen = Vec::new();
    for _ in 0..4 {
        let mut out: *const c_char = ptr::null();
        ftdi_probe_get_ptr_to_string(&mut out);
        seen.push(out);
    }
    assert!(seen.windows(2).all(|pair| pair[0] == pair[1]));
    let bytes = unsafe { CStr::from_ptr(seen[0]) }.to_bytes_with_nul();
    assert_eq!(bytes, b"abc\0");
}

#[test]
fn sentinel_buffer_passes_both_validators() {
    let bytes = [SENTINEL; SENTINEL_LEN];
    ftdi_probe_consume_bytes(bytes.as_ptr());
    assert!(ftdi_probe_validate_sentinel_buffer(
        bytes.as_ptr(),
        ptr::null_mut()
    ));
}

#[test]
fn checked_validator_rejects_trailing_zero() {
    let mut bytes = [SENTINEL; SENTINEL_LEN];
    bytes[SENTINEL_LEN - 1] = 0x00;
    assert!(!ftdi_probe_validate_sentinel_buffer(
        bytes.as_ptr(),
        ptr::null_mut()
    ));
}

/// Re-runs a single test of this binary in a child process with `CHILD_ENV` set.
fn run_child(test_name: &str) -> std::process::Output {
    let exe = std::env::current_exe().unwrap();
    Command::new(exe)
        .args(["--exact", test_name, "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .output()
        .unwrap()
}

#[test]
fn harness_aborts_on_trailing_zero() {
    if std::env::var_os(CHILD_ENV).is_some() {
        let mut bytes = [SENTINEL; SENTINEL_LEN];
        bytes[SENTINEL_LEN - 1] = 0x00;
        ftdi_probe_consume_bytes(bytes.as_ptr());
        return;
    }

    let output = run_child("harness_aborts_on_trailing_zero");
    assert!(!output.status.success());
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(output.status.signal(), Some(6), "expected SIGABRT");
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("byte 7 was 0x00"), "stderr: {stderr}");
}

#[test]
fn harness_child_with_sentinels_exits_cleanly() {
    if std::env::var_os(CHILD_ENV).is_some() {
        let bytes = [SENTINEL; SENTINEL_LEN];
        ftdi_probe_consume_bytes(bytes.as_ptr());
        return;
    }

    let output = run_child("harness_child_with_sentinels_exits_cleanly");
    assert!(output.status.success());
}
