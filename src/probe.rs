//! Bring-up probe: open an FTDI bridge, enter MPSSE mode, set the latency timer, close.

use std::fmt;
use std::process::ExitCode;

use crate::bitmode::BitMode;
use crate::config::ftdi_probe_config_t;
use crate::d2xx::{D2xxDriver, Device, FtStatus, RawStatus};
use crate::error::{ProbeError, clear_error, ftdi_probe_error_t, write_error};
use crate::ffi::{guard_panic, write_out};
use crate::wire::SetupPacket;

/// The driver's first enumerated device. No selection among several devices is attempted.
pub const DEFAULT_DEVICE_INDEX: i32 = 0;

/// All pins are driven by the MPSSE engine rather than by direct GPIO writes.
pub const DEFAULT_PIN_MASK: u8 = 0x00;

/// Read latency timer, in milliseconds.
pub const DEFAULT_LATENCY_MS: u8 = 17;

/// Driver calls made by the probe, in order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ProbeStep {
    Open,
    SetBitMode,
    SetLatencyTimer,
    Close,
}

impl fmt::Display for ProbeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProbeStep::Open => "FT_Open",
            ProbeStep::SetBitMode => "FT_SetBitMode",
            ProbeStep::SetLatencyTimer => "FT_SetLatencyTimer",
            ProbeStep::Close => "FT_Close",
        })
    }
}

/// Where the device stands in the bring-up sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProbeState {
    Closed,
    Opened,
    ModeConfigured,
    LatencyConfigured,
    /// The handle has been released after a completed run (the final `Closed`).
    Finished,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProbeConfig {
    pub device_index: i32,
    pub bit_mode: BitMode,
    /// 1 marks a pin as an output under direct bit-bang control.
    pub pin_mask: u8,
    pub latency_ms: u8,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            device_index: DEFAULT_DEVICE_INDEX,
            bit_mode: BitMode::Mpsse,
            pin_mask: DEFAULT_PIN_MASK,
            latency_ms: DEFAULT_LATENCY_MS,
        }
    }
}

impl ProbeConfig {
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.device_index < 0 {
            return Err(ProbeError::InvalidConfig(format!(
                "device index {} is negative",
                self.device_index
            )));
        }
        if self.latency_ms == 0 {
            return Err(ProbeError::InvalidConfig(
                "latency timer must be between 1 and 255 ms".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a completed probe run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProbeReport {
    pub final_state: ProbeState,
    /// `FT_Close` result. A failed close does not fail the run.
    pub close_status: Result<(), FtStatus>,
}

/// Runs the bring-up sequence once.
///
/// Stops at the first failing step. The device is closed on every path that
/// opened it.
pub fn run_probe<D: D2xxDriver>(
    driver: &D,
    config: &ProbeConfig,
) -> Result<ProbeReport, ProbeError> {
    config.validate()?;
    let mut state = ProbeState::Closed;

    let mut device = Device::open(driver, config.device_index).map_err(|status| {
        ProbeError::Driver {
            step: ProbeStep::Open,
            status,
        }
    })?;
    advance(&mut state, ProbeState::Opened);

    let mode = config.bit_mode.as_u8();
    log::debug!(
        "expect control transfer: {}",
        SetupPacket::set_bit_mode(config.bit_mode, config.pin_mask)
    );
    device
        .set_bit_mode(config.pin_mask, mode)
        .map_err(|status| ProbeError::Driver {
            step: ProbeStep::SetBitMode,
            status,
        })?;
    advance(&mut state, ProbeState::ModeConfigured);

    log::debug!(
        "expect control transfer: {}",
        SetupPacket::set_latency_timer(config.latency_ms)
    );
    device
        .set_latency_timer(config.latency_ms)
        .map_err(|status| ProbeError::Driver {
            step: ProbeStep::SetLatencyTimer,
            status,
        })?;
    advance(&mut state, ProbeState::LatencyConfigured);

    let close_status = device.close();
    if let Err(status) = close_status {
        log::warn!("{} failed: {status}", ProbeStep::Close);
    }
    advance(&mut state, ProbeState::Finished);

    Ok(ProbeReport {
        final_state: state,
        close_status,
    })
}

fn advance(state: &mut ProbeState, next: ProbeState) {
    log::debug!("probe state {state:?} -> {next:?}");
    *state = next;
}

/// Process exit status for a probe run: success only if the sequence completed.
pub fn exit_code(result: &Result<ProbeReport, ProbeError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

/// Result of a successful probe run.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Default)]
#[repr(C)]
pub struct ftdi_probe_report_t {
    /// Raw `FT_STATUS` returned by `FT_Close`; 0 is `FT_OK`.
    pub close_status: RawStatus,
}

/// C calling convention for [`run_probe`] over any driver.
///
/// If `config` is null, defaults are used. `out_report` may be null.
/// Returns false and fills `out_error` if the config is invalid or any step
/// before close fails.
pub fn run_with_driver<D: D2xxDriver>(
    driver: &D,
    config: *const ftdi_probe_config_t,
    out_report: *mut ftdi_probe_report_t,
    out_error: *mut *mut ftdi_probe_error_t,
) -> bool {
    clear_error(out_error);
    // Safety: a non-null config must point to a valid ftdi_probe_config_t.
    let config = match unsafe { config.as_ref() } {
        Some(raw) => match ProbeConfig::try_from(raw) {
            Ok(config) => config,
            Err(err) => {
                write_error(out_error, err);
                return false;
            }
        },
        None => ProbeConfig::default(),
    };

    let Some(result) = guard_panic("running probe", out_error, || run_probe(driver, &config))
    else {
        return false;
    };

    match result {
        Ok(report) => {
            write_out(
                out_report,
                ftdi_probe_report_t {
                    close_status: FtStatus::code_of(report.close_status),
                },
            );
            true
        }
        Err(err) => {
            write_error(out_error, err);
            false
        }
    }
}

/// Runs the bring-up probe against the D2XX driver.
///
/// See [`run_with_driver`] for the argument contract.
#[cfg(feature = "d2xx")]
#[unsafe(no_mangle)]
pub extern "C" fn ftdi_probe_run(
    config: *const ftdi_probe_config_t,
    out_report: *mut ftdi_probe_report_t,
    out_error: *mut *mut ftdi_probe_error_t,
) -> bool {
    run_with_driver(&crate::d2xx::Ftd2xx, config, out_report, out_error)
}
