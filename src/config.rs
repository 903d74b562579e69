//! C-facing probe configuration.

use crate::bitmode::BitMode;
use crate::error::ProbeError;
use crate::ffi::write_out;
use crate::probe::ProbeConfig;

/// Probe parameters for C callers.
///
/// Initialize with `ftdi_probe_config_init`; the defaults open device 0,
/// select MPSSE mode (`0x02`) with pin mask `0x00`, and set a 17 ms latency.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug)]
#[repr(C)]
pub struct ftdi_probe_config_t {
    pub device_index: i32,
    pub bit_mode: u8,
    pub pin_mask: u8,
    pub latency_ms: u8,
}

impl From<&ProbeConfig> for ftdi_probe_config_t {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            device_index: config.device_index,
            bit_mode: config.bit_mode.as_u8(),
            pin_mask: config.pin_mask,
            latency_ms: config.latency_ms,
        }
    }
}

impl TryFrom<&ftdi_probe_config_t> for ProbeConfig {
    type Error = ProbeError;

    fn try_from(raw: &ftdi_probe_config_t) -> Result<Self, Self::Error> {
        let config = ProbeConfig {
            device_index: raw.device_index,
            bit_mode: BitMode::try_from(raw.bit_mode)?,
            pin_mask: raw.pin_mask,
            latency_ms: raw.latency_ms,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Fills `config` with the default probe parameters.
#[unsafe(no_mangle)]
pub extern "C" fn ftdi_probe_config_init(config: *mut ftdi_probe_config_t) {
    write_out(config, ftdi_probe_config_t::from(&ProbeConfig::default()));
}
