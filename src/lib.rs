//! C interop boundary probes and an FTDI D2XX bring-up probe.

pub mod bitmode;
pub mod config;
pub mod d2xx;
pub mod error;
mod ffi;
pub mod harness;
pub mod interop;
pub mod logging;
pub mod probe;
pub mod wire;

pub use bitmode::BitMode;
pub use d2xx::{D2xxDriver, Device, FtStatus};
pub use error::ProbeError;
pub use probe::{ProbeConfig, ProbeReport, ProbeState, ProbeStep, run_probe};
