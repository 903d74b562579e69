//! FTDI bit modes accepted by `FT_SetBitMode`.

use crate::error::ProbeError;

/// Major operating mode of an FTDI bridge chip.
///
/// Values follow the D2XX Programmer's Guide, `FT_SetBitMode`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum BitMode {
    /// Leave any alternate mode; the chip falls back to UART.
    Reset = 0x00,
    AsyncBitbang = 0x01,
    /// Multi-Protocol Synchronous Serial Engine: hardware-timed clock and data.
    #[default]
    Mpsse = 0x02,
    SyncBitbang = 0x04,
    /// MCU host bus emulation.
    Mcu = 0x08,
    /// Fast opto-isolated serial.
    FastSerial = 0x10,
    /// Bit-bang on the CBUS pins; needs an EEPROM option.
    CbusBitbang = 0x20,
    /// Single-channel synchronous 245 FIFO.
    SyncFifo = 0x40,
}

impl BitMode {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<BitMode> for u8 {
    fn from(mode: BitMode) -> Self {
        mode.as_u8()
    }
}

impl TryFrom<u8> for BitMode {
    type Error = ProbeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => BitMode::Reset,
            0x01 => BitMode::AsyncBitbang,
            0x02 => BitMode::Mpsse,
            0x04 => BitMode::SyncBitbang,
            0x08 => BitMode::Mcu,
            0x10 => BitMode::FastSerial,
            0x20 => BitMode::CbusBitbang,
            0x40 => BitMode::SyncFifo,
            other => return Err(ProbeError::UnknownBitMode(other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mpsse_is_the_default_engine_selector() {
        assert_eq!(BitMode::default(), BitMode::Mpsse);
        assert_eq!(u8::from(BitMode::Mpsse), 0x02);
    }

    #[test]
    fn combined_selectors_are_rejected() {
        assert_eq!(BitMode::try_from(0x03), Err(ProbeError::UnknownBitMode(0x03)));
        assert_eq!(BitMode::try_from(0x80), Err(ProbeError::UnknownBitMode(0x80)));
    }

    #[test]
    fn known_selectors_parse() {
        assert_eq!(BitMode::try_from(0x40), Ok(BitMode::SyncFifo));
        assert_eq!(BitMode::try_from(0x00), Ok(BitMode::Reset));
    }
}
