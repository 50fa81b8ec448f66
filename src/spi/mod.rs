//! SPI engines on the MPSSE low byte
//!
//! SK is the clock, DO is MOSI and DI is MISO. Chip-select is one low-byte
//! line, and the display variant adds a data/command line and an optional
//! reset line on the high byte.

use crate::mpsse::{Bit, ClockData, ClockDataIn, ClockDataOut, Pins};

pub mod chip_select;
pub mod device;
pub mod display;

pub use chip_select::ChipSelect;
pub use device::SpiDevice;
pub use display::{parse_batch, BatchEntry, DataCommand, SpiDisplay};

/// Supported SPI clock modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpiMode {
    /// CPOL = 0, CPHA = 0
    #[default]
    Mode0,
    /// CPOL = 1, CPHA = 0
    Mode2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    #[default]
    MsbFirst,
    LsbFirst,
}

impl SpiMode {
    /// Write-only and duplex opcodes for this mode
    pub fn opcodes(self, order: BitOrder) -> (ClockDataOut, ClockData) {
        match (self, order) {
            (SpiMode::Mode0, BitOrder::MsbFirst) => (ClockDataOut::MsbNeg, ClockData::MsbPosIn),
            (SpiMode::Mode0, BitOrder::LsbFirst) => (ClockDataOut::LsbNeg, ClockData::LsbPosIn),
            (SpiMode::Mode2, BitOrder::MsbFirst) => (ClockDataOut::MsbPos, ClockData::MsbNegIn),
            (SpiMode::Mode2, BitOrder::LsbFirst) => (ClockDataOut::LsbPos, ClockData::LsbNegIn),
        }
    }

    /// Read-only opcode, sampling on the same edge as the duplex opcode
    pub fn read_opcode(self, order: BitOrder) -> ClockDataIn {
        match (self, order) {
            (SpiMode::Mode0, BitOrder::MsbFirst) => ClockDataIn::MsbPos,
            (SpiMode::Mode0, BitOrder::LsbFirst) => ClockDataIn::LsbPos,
            (SpiMode::Mode2, BitOrder::MsbFirst) => ClockDataIn::MsbNeg,
            (SpiMode::Mode2, BitOrder::LsbFirst) => ClockDataIn::LsbNeg,
        }
    }

    /// Level SK rests at between transfers
    pub fn idle_clock(self) -> Pins {
        match self {
            SpiMode::Mode0 => Pins::empty(),
            SpiMode::Mode2 => Pins::SK,
        }
    }
}

/// How the chip-select line behaves around a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsPolicy {
    /// Low during transfers, high otherwise
    #[default]
    ActiveLow,
    /// High during transfers, low otherwise
    ActiveHigh,
    /// Left at whatever level was last set, starting low
    DefaultLow,
    /// Left at whatever level was last set, starting high
    DefaultHigh,
}

impl CsPolicy {
    pub fn initial_level(self) -> Bit {
        match self {
            CsPolicy::ActiveLow | CsPolicy::DefaultHigh => Bit::One,
            CsPolicy::ActiveHigh | CsPolicy::DefaultLow => Bit::Zero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiConfig {
    pub cs: Pins,
    pub cs_policy: CsPolicy,
    pub mode: SpiMode,
    pub bit_order: BitOrder,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            cs: Pins::CS,
            cs_policy: CsPolicy::ActiveLow,
            mode: SpiMode::Mode0,
            bit_order: BitOrder::MsbFirst,
        }
    }
}

/// SPI display with data/command and reset lines on the high byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    pub spi: SpiConfig,
    pub dc: Pins,
    pub reset: Option<Pins>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            spi: SpiConfig::default(),
            dc: Pins::GPIOH1,
            reset: Some(Pins::GPIOH3),
        }
    }
}
