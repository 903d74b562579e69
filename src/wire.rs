//! Expected USB control transfers behind the D2XX configuration calls.
//!
//! FTDI does not document these; they were observed with usbmon on Linux.
//! They are used to log what a bus capture should show for each step, and
//! are not sent by this crate.

use std::fmt;

use crate::bitmode::BitMode;

/// bmRequestType for a host-to-device vendor request addressed to the device.
pub const VENDOR_OUT: u8 = 0x40;

/// Vendor bRequest codes issued by the D2XX driver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum VendorRequest {
    /// `FT_SetLatencyTimer`.
    SetLatencyTimer = 0x09,
    /// `FT_SetBitMode`.
    SetBitMode = 0x0b,
}

/// An 8-byte USB setup packet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SetupPacket {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

impl SetupPacket {
    fn vendor_out(request: VendorRequest, value: u16) -> Self {
        // FTDI's driver always sends wIndex 0 and no data stage.
        Self {
            request_type: VENDOR_OUT,
            request: request as u8,
            value,
            index: 0,
            length: 0,
        }
    }

    /// Mode in the high byte of wValue, pin mask in the low byte.
    pub fn set_bit_mode(mode: BitMode, mask: u8) -> Self {
        let value = (u16::from(mode.as_u8()) << 8) | u16::from(mask);
        Self::vendor_out(VendorRequest::SetBitMode, value)
    }

    pub fn set_latency_timer(ms: u8) -> Self {
        Self::vendor_out(VendorRequest::SetLatencyTimer, u16::from(ms))
    }

    /// Packet bytes as they appear on the bus.
    pub fn to_bytes(&self) -> [u8; 8] {
        let [value_lo, value_hi] = self.value.to_le_bytes();
        let [index_lo, index_hi] = self.index.to_le_bytes();
        let [length_lo, length_hi] = self.length.to_le_bytes();
        [
            self.request_type,
            self.request,
            value_lo,
            value_hi,
            index_lo,
            index_hi,
            length_lo,
            length_hi,
        ]
    }
}

/// usbmon text form of a submission, e.g. `s 40 0b 0200 0000 0000 0`.
impl fmt::Display for SetupPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "s {:02x} {:02x} {:04x} {:04x} {:04x} {}",
            self.request_type, self.request, self.value, self.index, self.length, self.length
        )
    }
}
