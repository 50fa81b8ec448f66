//! FTDI transport implementation using libftd2xx
//!
//! Buffers MPSSE commands and ships them to the chip in one USB write
//! per flush.

use std::time::Duration;
use libftd2xx::{BitMode, Ft4232h, FtdiCommon};
use log::{debug, trace};

use crate::error::Error;
use crate::mpsse::encoder;
use super::{loopback_command, Transport};

/// Divisor for 1 MHz from the 60 MHz base clock (clock divide-by-5 off)
pub const DEFAULT_CLOCK_DIVISOR: u16 = 29;

/// Bogus opcode used to synchronize with the command processor
const BAD_COMMAND: u8 = 0xAA;
/// Engine answer to an unknown opcode
const BAD_COMMAND_RESPONSE: u8 = 0xFA;

/// FTDI MPSSE transport
pub struct FtdiTransport<D: FtdiCommon> {
    dev: D,
    buffer: Vec<u8>,
    clock_divisor: u16,
    loopback: bool,
}

impl FtdiTransport<Ft4232h> {
    /// Open an FT4232H by description, e.g. "Quad RS232-HS A"
    pub fn open(description: &str) -> Result<Self, Error> {
        let dev = Ft4232h::with_description(description)?;
        Self::new(dev, DEFAULT_CLOCK_DIVISOR)
    }
}

impl<D: FtdiCommon> FtdiTransport<D> {
    /// Put the device in MPSSE mode and program the clock
    pub fn new(dev: D, clock_divisor: u16) -> Result<Self, Error> {
        let mut transport = Self {
            dev,
            buffer: vec![],
            clock_divisor,
            loopback: false,
        };
        transport.initialize()?;
        Ok(transport)
    }

    /// Give back the underlying device
    pub fn into_inner(self) -> D {
        self.dev
    }

    fn initialize(&mut self) -> Result<(), Error> {
        self.dev.reset()?;
        self.dev.purge_all()?;
        self.dev.set_usb_parameters(0x10000)?;
        self.dev.set_timeouts(Duration::from_secs(1), Duration::from_secs(1))?;

        // Set latency timer
        self.dev.set_latency_timer(Duration::from_millis(2))?;

        // Set MPSSE mode
        self.dev.set_bit_mode(0x0, BitMode::Reset)?;
        self.dev.set_bit_mode(0x0, BitMode::Mpsse)?;

        self.synchronize()?;

        self.enqueue(&encoder::set_clock_divisor(self.clock_divisor));
        self.enqueue(&encoder::disable_loopback());
        self.execute_buffer()?;

        debug!("MPSSE ready, clock divisor {}", self.clock_divisor);
        Ok(())
    }

    /// Send a bogus opcode and wait for the engine to reject it
    fn synchronize(&mut self) -> Result<(), Error> {
        self.dev.write_all(&[BAD_COMMAND])?;
        let mut response = [0u8; 2];
        self.dev.read_all(&mut response)?;
        if response != [BAD_COMMAND_RESPONSE, BAD_COMMAND] {
            return Err(Error::SyncFailed);
        }
        Ok(())
    }
}

impl<D: FtdiCommon> Transport for FtdiTransport<D> {
    fn enqueue(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn execute_buffer(&mut self) -> Result<(), Error> {
        let buffer = std::mem::take(&mut self.buffer);
        if buffer.is_empty() {
            return Ok(());
        }
        trace!("Flush {} bytes: {}", buffer.len(), hex::encode(&buffer));
        self.dev.write_all(&buffer)?;
        Ok(())
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let mut response = vec![0u8; len];
        self.dev.read_all(&mut response)?;
        trace!("Read {len} bytes: {}", hex::encode(&response));
        Ok(response)
    }

    fn clear_input(&mut self) -> Result<(), Error> {
        self.dev.purge_rx()?;
        Ok(())
    }

    fn clear_output(&mut self) {
        self.buffer.clear();
    }

    fn clock_divisor(&self) -> u16 {
        self.clock_divisor
    }

    fn set_clock_divisor(&mut self, divisor: u16) -> Result<(), Error> {
        self.write(&encoder::set_clock_divisor(divisor))?;
        self.clock_divisor = divisor;
        Ok(())
    }

    fn loopback(&self) -> bool {
        self.loopback
    }

    fn set_loopback(&mut self, enabled: bool) -> Result<(), Error> {
        self.write(&loopback_command(enabled))?;
        self.loopback = enabled;
        Ok(())
    }
}
