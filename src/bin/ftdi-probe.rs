//! Opens the first FTDI device, switches it to MPSSE mode, sets the latency timer and closes it.
//!
//! Run under usbmon to compare the control transfers against the ones logged at debug level.

use std::process::ExitCode;

use ftdi_probe::d2xx::Ftd2xx;
use ftdi_probe::probe::exit_code;
use ftdi_probe::{ProbeConfig, run_probe};
use log::LevelFilter;

fn main() -> ExitCode {
    if let Err(err) = ftdi_probe::logging::init(LevelFilter::Info) {
        eprintln!("ftdi-probe: {err}");
    }

    let config = ProbeConfig::default();
    let result = run_probe(&Ftd2xx, &config);
    match &result {
        Ok(report) => {
            log::info!(
                "device {} brought up in {:?} mode, latency {} ms",
                config.device_index,
                config.bit_mode,
                config.latency_ms
            );
            log::debug!("final state {:?}", report.final_state);
        }
        Err(err) => log::error!("{err}"),
    }
    exit_code(&result)
}
