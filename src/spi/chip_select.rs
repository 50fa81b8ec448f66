use crate::mpsse::encoder;
use crate::mpsse::{Bit, Pins};
use super::{CsPolicy, SpiMode};

/// Chip-select line with a cached level
///
/// Every method returns the pin-set bytes for the caller to enqueue, so the
/// bracket can be placed in the same flush as the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipSelect {
    pin: Pins,
    policy: CsPolicy,
    idle_clock: Pins,
    level: Bit,
}

impl ChipSelect {
    pub fn new(pin: Pins, policy: CsPolicy, mode: SpiMode) -> Self {
        Self {
            pin,
            policy,
            idle_clock: mode.idle_clock(),
            level: policy.initial_level(),
        }
    }

    pub fn pin(&self) -> Pins {
        self.pin
    }

    pub fn policy(&self) -> CsPolicy {
        self.policy
    }

    pub fn level(&self) -> Bit {
        self.level
    }

    /// CS, MOSI and SCLK are outputs
    pub fn direction(&self) -> Pins {
        self.pin | Pins::DO | Pins::SK
    }

    pub fn set_level(&mut self, level: Bit) -> [u8; 3] {
        self.level = level;
        let cs = if level.is_high() { self.pin } else { Pins::empty() };
        encoder::set_data_bits_low(cs | self.idle_clock, self.direction())
    }

    /// Select the device
    pub fn enable(&mut self) -> [u8; 3] {
        let level = match self.policy {
            CsPolicy::ActiveLow => Bit::Zero,
            CsPolicy::ActiveHigh => Bit::One,
            CsPolicy::DefaultLow | CsPolicy::DefaultHigh => self.level,
        };
        self.set_level(level)
    }

    /// Deselect the device
    pub fn disable(&mut self) -> [u8; 3] {
        let level = match self.policy {
            CsPolicy::ActiveLow => Bit::One,
            CsPolicy::ActiveHigh => Bit::Zero,
            CsPolicy::DefaultLow | CsPolicy::DefaultHigh => self.level,
        };
        self.set_level(level)
    }
}
