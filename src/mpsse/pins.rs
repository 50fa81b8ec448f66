use bitflags::bitflags;

/*
MPSSE pin assignments (channel A/B on FT2232H, FT4232H, FT232H):
SK:      ADBUS0  (TCK / SCLK / SCL)
DO:      ADBUS1  (TDI / MOSI / SDA out)
DI:      ADBUS2  (TDO / MISO / SDA in)
CS:      ADBUS3  (TMS / CS)
GPIOL*:  ADBUS4..7
GPIOH*:  ACBUS0..7
*/

bitflags! {
    /// GPIO lines of one MPSSE channel
    ///
    /// The low byte maps to the `SetDataBitsLow` pin set, the high byte
    /// to `SetDataBitsHigh`.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Pins: u16 {
        const SK =     1;          // Mask 0x01, ADBUS0
        const DO =     1 << 1;     // Mask 0x02, ADBUS1
        const DI =     1 << 2;     // Mask 0x04, ADBUS2
        const CS =     1 << 3;     // Mask 0x08, ADBUS3
        const GPIOL0 = 1 << 4;     // Mask 0x10, ADBUS4
        const GPIOL1 = 1 << 5;     // Mask 0x20, ADBUS5
        const GPIOL2 = 1 << 6;     // Mask 0x40, ADBUS6
        const GPIOL3 = 1 << 7;     // Mask 0x80, ADBUS7

        const GPIOH0 = 1 << 8;     // ACBUS0
        const GPIOH1 = 1 << 9;     // ACBUS1
        const GPIOH2 = 1 << 10;    // ACBUS2
        const GPIOH3 = 1 << 11;    // ACBUS3
        const GPIOH4 = 1 << 12;    // ACBUS4
        const GPIOH5 = 1 << 13;    // ACBUS5
        const GPIOH6 = 1 << 14;    // ACBUS6
        const GPIOH7 = 1 << 15;    // ACBUS7
    }
}

impl Pins {
    /// Low byte (ADBUS) mask
    pub fn low(self) -> u8 {
        (self.bits() & 0xFF) as u8
    }

    /// High byte (ACBUS) mask
    pub fn high(self) -> u8 {
        (self.bits() >> 8) as u8
    }

    pub fn from_low(bits: u8) -> Self {
        Self::from_bits_truncate(bits.into())
    }

    pub fn from_high(bits: u8) -> Self {
        Self::from_bits_truncate(u16::from(bits) << 8)
    }
}

/// Logical level of a control line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bit {
    #[default]
    Zero,
    One,
}

impl Bit {
    pub fn is_high(self) -> bool {
        self == Bit::One
    }
}

impl From<bool> for Bit {
    fn from(high: bool) -> Self {
        if high { Bit::One } else { Bit::Zero }
    }
}

impl core::ops::Not for Bit {
    type Output = Bit;

    fn not(self) -> Bit {
        match self {
            Bit::Zero => Bit::One,
            Bit::One => Bit::Zero,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_flags() {
        assert_eq!(0x13, (Pins::SK | Pins::DO | Pins::GPIOL0).low());
        assert_eq!(0x0B, (Pins::SK | Pins::DO | Pins::CS).low());
        assert_eq!(0x00, (Pins::SK | Pins::DO | Pins::CS).high());
    }

    #[test]
    fn test_high_byte_split() {
        let pins = Pins::GPIOH1 | Pins::GPIOH3 | Pins::CS;
        assert_eq!(pins.high(), 0x0A);
        assert_eq!(pins.low(), 0x08);
        assert_eq!(Pins::from_high(0x0A), Pins::GPIOH1 | Pins::GPIOH3);
        assert_eq!(Pins::from_low(0x08), Pins::CS);
    }

    #[test]
    fn test_bit_levels() {
        assert_eq!(!Bit::One, Bit::Zero);
        assert_eq!(Bit::from(true), Bit::One);
        assert!(!Bit::Zero.is_high());
    }
}
