//! Seam over FTDI's D2XX driver API.
//!
//! The probe talks to a [`D2xxDriver`]; the real implementation links the
//! vendor `libftd2xx` (feature `d2xx`), tests substitute recording stubs.

use std::fmt;
use std::os::raw::c_ulong;

/// Raw `FT_STATUS` as returned by the vendor library.
pub type RawStatus = c_ulong;

/// A non-OK `FT_STATUS`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, thiserror::Error)]
pub enum FtStatus {
    #[error("invalid handle")]
    InvalidHandle,
    #[error("device not found")]
    DeviceNotFound,
    #[error("device not opened")]
    DeviceNotOpened,
    #[error("I/O error")]
    IoError,
    #[error("insufficient resources")]
    InsufficientResources,
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("invalid baud rate")]
    InvalidBaudRate,
    #[error("device not opened for erase")]
    DeviceNotOpenedForErase,
    #[error("device not opened for write")]
    DeviceNotOpenedForWrite,
    #[error("failed to write device")]
    FailedToWriteDevice,
    #[error("EEPROM read failed")]
    EepromReadFailed,
    #[error("EEPROM write failed")]
    EepromWriteFailed,
    #[error("EEPROM erase failed")]
    EepromEraseFailed,
    #[error("EEPROM not present")]
    EepromNotPresent,
    #[error("EEPROM not programmed")]
    EepromNotProgrammed,
    #[error("invalid arguments")]
    InvalidArgs,
    #[error("not supported")]
    NotSupported,
    #[error("other error")]
    OtherError,
    #[error("device list not ready")]
    DeviceListNotReady,
    #[error("unknown status {0}")]
    Unknown(RawStatus),
}

impl FtStatus {
    /// `FT_OK`.
    pub const OK: RawStatus = 0;

    /// Maps a raw status to `Ok(())` for `FT_OK` and an error otherwise.
    pub fn check(raw: RawStatus) -> Result<(), FtStatus> {
        use FtStatus::*;
        Err(match raw {
            0 => return Ok(()),
            1 => InvalidHandle,
            2 => DeviceNotFound,
            3 => DeviceNotOpened,
            4 => IoError,
            5 => InsufficientResources,
            6 => InvalidParameter,
            7 => InvalidBaudRate,
            8 => DeviceNotOpenedForErase,
            9 => DeviceNotOpenedForWrite,
            10 => FailedToWriteDevice,
            11 => EepromReadFailed,
            12 => EepromWriteFailed,
            13 => EepromEraseFailed,
            14 => EepromNotPresent,
            15 => EepromNotProgrammed,
            16 => InvalidArgs,
            17 => NotSupported,
            18 => OtherError,
            19 => DeviceListNotReady,
            other => Unknown(other),
        })
    }

    /// The raw `FT_STATUS` value.
    pub fn code(self) -> RawStatus {
        use FtStatus::*;
        match self {
            InvalidHandle => 1,
            DeviceNotFound => 2,
            DeviceNotOpened => 3,
            IoError => 4,
            InsufficientResources => 5,
            InvalidParameter => 6,
            InvalidBaudRate => 7,
            DeviceNotOpenedForErase => 8,
            DeviceNotOpenedForWrite => 9,
            FailedToWriteDevice => 10,
            EepromReadFailed => 11,
            EepromWriteFailed => 12,
            EepromEraseFailed => 13,
            EepromNotPresent => 14,
            EepromNotProgrammed => 15,
            InvalidArgs => 16,
            NotSupported => 17,
            OtherError => 18,
            DeviceListNotReady => 19,
            Unknown(code) => code,
        }
    }

    /// Raw value of a call result, `FT_OK` for success.
    pub fn code_of(result: Result<(), FtStatus>) -> RawStatus {
        result.err().map_or(Self::OK, FtStatus::code)
    }
}

/// The subset of the D2XX API the bring-up probe drives.
pub trait D2xxDriver {
    type Handle;

    /// `FT_Open`: opens the device at position `index` in the driver's list.
    fn open(&self, index: i32) -> Result<Self::Handle, FtStatus>;

    /// `FT_SetBitMode`.
    fn set_bit_mode(&self, handle: &mut Self::Handle, mask: u8, mode: u8)
    -> Result<(), FtStatus>;

    /// `FT_SetLatencyTimer`, in milliseconds.
    fn set_latency_timer(&self, handle: &mut Self::Handle, ms: u8) -> Result<(), FtStatus>;

    /// `FT_Close`.
    fn close(&self, handle: Self::Handle) -> Result<(), FtStatus>;
}

/// An open device. The handle is closed when this is dropped.
pub struct Device<'d, D: D2xxDriver> {
    driver: &'d D,
    handle: Option<D::Handle>,
    index: i32,
}

impl<'d, D: D2xxDriver> Device<'d, D> {
    pub fn open(driver: &'d D, index: i32) -> Result<Self, FtStatus> {
        let handle = driver.open(index)?;
        log::debug!("opened device {index}");
        Ok(Self {
            driver,
            handle: Some(handle),
            index,
        })
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn set_bit_mode(&mut self, mask: u8, mode: u8) -> Result<(), FtStatus> {
        let handle = self.handle.as_mut().ok_or(FtStatus::InvalidHandle)?;
        self.driver.set_bit_mode(handle, mask, mode)
    }

    pub fn set_latency_timer(&mut self, ms: u8) -> Result<(), FtStatus> {
        let handle = self.handle.as_mut().ok_or(FtStatus::InvalidHandle)?;
        self.driver.set_latency_timer(handle, ms)
    }

    /// Closes the handle now and returns the driver's status.
    pub fn close(mut self) -> Result<(), FtStatus> {
        match self.handle.take() {
            Some(handle) => self.driver.close(handle),
            None => Ok(()),
        }
    }
}

impl<D: D2xxDriver> Drop for Device<'_, D> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(status) = self.driver.close(handle) {
                log::warn!("closing device {} failed: {status}", self.index());
            }
        }
    }
}

impl<D: D2xxDriver> fmt::Debug for Device<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("index", &self.index)
            .field("open", &self.handle.is_some())
            .finish()
    }
}

#[cfg(feature = "d2xx")]
pub use vendor::{Ftd2xx, Ftd2xxHandle};

#[cfg(feature = "d2xx")]
mod vendor {
    use std::os::raw::{c_int, c_uchar, c_void};
    use std::ptr;

    use super::{D2xxDriver, FtStatus, RawStatus};

    type FtHandle = *mut c_void;

    #[link(name = "ftd2xx")]
    unsafe extern "C" {
        fn FT_Open(device_number: c_int, handle: *mut FtHandle) -> RawStatus;
        fn FT_SetBitMode(handle: FtHandle, mask: c_uchar, enable: c_uchar) -> RawStatus;
        fn FT_SetLatencyTimer(handle: FtHandle, timer: c_uchar) -> RawStatus;
        fn FT_Close(handle: FtHandle) -> RawStatus;
    }

    /// FTDI's proprietary D2XX driver.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Ftd2xx;

    /// Handle returned by `FT_Open`.
    #[derive(Debug)]
    pub struct Ftd2xxHandle(FtHandle);

    impl D2xxDriver for Ftd2xx {
        type Handle = Ftd2xxHandle;

        fn open(&self, index: i32) -> Result<Self::Handle, FtStatus> {
            let mut handle: FtHandle = ptr::null_mut();
            // Safety: handle is a valid out pointer for the duration of the call.
            FtStatus::check(unsafe { FT_Open(index, &mut handle) })?;
            Ok(Ftd2xxHandle(handle))
        }

        fn set_bit_mode(
            &self,
            handle: &mut Self::Handle,
            mask: u8,
            mode: u8,
        ) -> Result<(), FtStatus> {
            // Safety: handle came from FT_Open and has not been closed.
            FtStatus::check(unsafe { FT_SetBitMode(handle.0, mask, mode) })
        }

        fn set_latency_timer(&self, handle: &mut Self::Handle, ms: u8) -> Result<(), FtStatus> {
            // Safety: handle came from FT_Open and has not been closed.
            FtStatus::check(unsafe { FT_SetLatencyTimer(handle.0, ms) })
        }

        fn close(&self, handle: Self::Handle) -> Result<(), FtStatus> {
            // Safety: handle came from FT_Open and is consumed here.
            FtStatus::check(unsafe { FT_Close(handle.0) })
        }
    }
}
