//! Transport abstraction module - hardware-specific implementations
//!
//! This module defines the command transport the bus engines push
//! MPSSE command bytes into, and an FTDI implementation of it.

use crate::error::Error;

#[cfg(feature = "ftdi")]
pub mod ftdi;

#[cfg(test)]
pub(crate) mod sim;

/// MPSSE command transport
///
/// Owns the outbound command buffer and the link to the engine. The bus
/// engines only ever enqueue bytes and trigger a flush/read cycle.
pub trait Transport {
    /// Append bytes to the outbound command buffer
    fn enqueue(&mut self, bytes: &[u8]);

    /// Send the whole outbound buffer to the engine
    ///
    /// The buffer is emptied whether or not the send succeeds, so a failed
    /// flush is never partially repeated.
    fn execute_buffer(&mut self) -> Result<(), Error>;

    /// Read exactly `len` response bytes
    fn read(&mut self, len: usize) -> Result<Vec<u8>, Error>;

    /// Discard unread response bytes
    fn clear_input(&mut self) -> Result<(), Error>;

    /// Discard unflushed command bytes
    fn clear_output(&mut self);

    /// Current clock divisor
    fn clock_divisor(&self) -> u16;

    /// Program a new clock divisor
    fn set_clock_divisor(&mut self, divisor: u16) -> Result<(), Error>;

    /// Whether DO is internally looped back to DI
    fn loopback(&self) -> bool;

    /// Connect or disconnect the DO -> DI loopback
    fn set_loopback(&mut self, enabled: bool) -> Result<(), Error>;

    /// Enqueue bytes and flush immediately
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.enqueue(bytes);
        self.execute_buffer()
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn enqueue(&mut self, bytes: &[u8]) {
        (**self).enqueue(bytes)
    }

    fn execute_buffer(&mut self) -> Result<(), Error> {
        (**self).execute_buffer()
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        (**self).read(len)
    }

    fn clear_input(&mut self) -> Result<(), Error> {
        (**self).clear_input()
    }

    fn clear_output(&mut self) {
        (**self).clear_output()
    }

    fn clock_divisor(&self) -> u16 {
        (**self).clock_divisor()
    }

    fn set_clock_divisor(&mut self, divisor: u16) -> Result<(), Error> {
        (**self).set_clock_divisor(divisor)
    }

    fn loopback(&self) -> bool {
        (**self).loopback()
    }

    fn set_loopback(&mut self, enabled: bool) -> Result<(), Error> {
        (**self).set_loopback(enabled)
    }
}

/// Loopback command for the requested state
#[cfg(any(test, feature = "ftdi"))]
pub(crate) fn loopback_command(enabled: bool) -> [u8; 1] {
    use crate::mpsse::encoder;

    if enabled {
        encoder::enable_loopback()
    } else {
        encoder::disable_loopback()
    }
}
