//! MPSSE command layer - hardware-independent
//!
//! Opcode catalog, pin masks and the pure command encoder.

pub mod encoder;
pub mod opcode;
pub mod pins;

pub use opcode::{
    ClockBits, ClockBitsIn, ClockBitsOut, ClockData, ClockDataIn, ClockDataOut, ClockTms,
    ClockTmsOut, Opcode, Operands,
};
pub use pins::{Bit, Pins};
