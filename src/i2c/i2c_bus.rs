use core::ops::RangeInclusive;

use embedded_hal::i2c::{ErrorType, I2c, NoAcknowledgeSource, Operation};
use log::{debug, trace};

use crate::error::{Error, Result};
use crate::mpsse::encoder;
use crate::mpsse::{ClockBitsIn, ClockBitsOut, Pins};
use crate::transport::Transport;

const I2C_SCL: Pins = Pins::SK;
const I2C_SDA: Pins = Pins::DO;
const I2C_LINES: Pins = I2C_SCL.union(I2C_SDA);

/// Addresses probed by [`I2cBus::scan`]
pub const SCAN_ADDRESSES: RangeInclusive<u8> = 1..=126;

/// 7-bit address shifted left with the R/W bit appended
pub fn address_byte(address: u8, read: bool) -> Result<u8> {
    if address > 0x7F {
        return Err(Error::InvalidAddress(address));
    }
    Ok((address << 1) | u8::from(read))
}

/// ACK is SDA held low during the ninth clock
pub fn is_ack(sample: u8) -> bool {
    sample & 0x01 == 0
}

/// I2C timing and pin configuration
///
/// START/STOP setup and hold times are approximated by repeating the same
/// pin-set command, each repeat costs one command-processor cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cConfig {
    /// Repeats of "both lines high" before SDA falls
    pub start_setup: u8,
    /// Repeats of "SCL high, SDA low"
    pub start_hold: u8,
    /// Repeats of "both lines low"
    pub stop_setup: u8,
    /// Repeats of "SCL high, SDA low"
    pub stop_hold: u8,
    /// Repeats of "both lines high" before the bus is released
    pub stop_release: u8,
    /// Extra low-byte pins driven with every pin set (bus enable, pull-up switch)
    pub guard_pins: Pins,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            start_setup: 10,
            start_hold: 20,
            stop_setup: 10,
            stop_hold: 10,
            stop_release: 10,
            guard_pins: Pins::GPIOL0,
        }
    }
}

/// I2C master on the MPSSE low byte (SCL = ADBUS0, SDA = ADBUS1/ADBUS2 tied)
pub struct I2cBus<T> {
    transport: T,
    config: I2cConfig,
}

impl<T: Transport> I2cBus<T> {
    /// Configure the engine for I2C and release both lines
    pub fn new(mut transport: T, config: I2cConfig) -> Result<Self> {
        let driven = I2C_LINES | config.guard_pins;
        let divisor = transport.clock_divisor();

        transport.enqueue(&encoder::clock_divide_by_5(false));
        transport.enqueue(&encoder::adaptive_clocking(false));
        // 3-phase clocking keeps data valid on both edges, required by I2C
        transport.enqueue(&encoder::three_phase_clocking(true));
        transport.enqueue(&encoder::set_clock_divisor(divisor));
        transport.enqueue(&encoder::set_data_bits_low(driven, driven));
        transport.set_loopback(false)?;

        debug!("I2C bus ready, clock divisor {divisor}");
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &I2cConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn driven(&self) -> Pins {
        I2C_LINES | self.config.guard_pins
    }

    fn sda_released(&self) -> Pins {
        I2C_SCL | self.config.guard_pins
    }

    fn released(&self) -> Pins {
        self.config.guard_pins
    }

    fn pins(&mut self, value: Pins, direction: Pins) {
        self.transport.enqueue(&encoder::set_data_bits_low(value, direction));
    }

    fn hold(&mut self, count: u8, value: Pins, direction: Pins) {
        for _ in 0..count {
            self.pins(value, direction);
        }
    }

    fn enqueue_start(&mut self) {
        // SDA descending while SCL is HIGH.
        self.hold(self.config.start_setup, I2C_LINES, self.sda_released());
        self.hold(self.config.start_hold, I2C_SCL, self.driven());
        self.pins(Pins::empty(), self.driven());
    }

    fn enqueue_stop(&mut self) {
        // SDA rising while SCL is HIGH.
        self.hold(self.config.stop_setup, Pins::empty(), self.driven());
        self.hold(self.config.stop_hold, I2C_SCL, self.driven());
        self.hold(self.config.stop_release, I2C_LINES, self.sda_released());
        self.pins(I2C_LINES, self.released());
    }

    fn enqueue_send_byte(&mut self, byte: u8, immediate: bool) -> Result<()> {
        let data = encoder::clock_bits_out(ClockBitsOut::MsbNeg, byte, 8)?;
        let ack = encoder::clock_bits_in(ClockBitsIn::MsbPos, 1)?;

        self.pins(Pins::empty(), self.driven());
        self.transport.enqueue(&data);
        // Release SDA for ACK
        self.pins(Pins::empty(), self.sda_released());
        self.transport.enqueue(&ack);
        if immediate {
            self.transport.enqueue(&encoder::send_immediate());
        }
        Ok(())
    }

    fn enqueue_receive_byte(&mut self, nack: bool, immediate: bool) -> Result<()> {
        let data = encoder::clock_bits_in(ClockBitsIn::MsbPos, 8)?;
        let ack = encoder::clock_bits_out(ClockBitsOut::MsbNeg, if nack { 0x80 } else { 0x00 }, 1)?;
        let ack_direction = if nack { self.sda_released() } else { self.driven() };

        self.pins(Pins::empty(), self.sda_released());
        self.transport.enqueue(&data);
        self.pins(Pins::empty(), ack_direction);
        self.transport.enqueue(&ack);
        self.pins(Pins::empty(), self.sda_released());
        if immediate {
            self.transport.enqueue(&encoder::send_immediate());
        }
        Ok(())
    }

    /// STOP the bus, then report the missing ACK
    fn abort<R>(&mut self, source: NoAcknowledgeSource) -> Result<R> {
        debug!("NACK ({source:?}), releasing bus");
        self.stop()?;
        Err(Error::Nack(source))
    }

    pub fn start(&mut self) -> Result<()> {
        self.enqueue_start();
        self.transport.execute_buffer()
    }

    pub fn stop(&mut self) -> Result<()> {
        self.enqueue_stop();
        self.transport.execute_buffer()
    }

    /// Clock out one byte and return whether it was acknowledged
    pub fn send_byte(&mut self, byte: u8, immediate: bool) -> Result<bool> {
        self.enqueue_send_byte(byte, immediate)?;
        self.transport.execute_buffer()?;
        let sample = self.transport.read(1)?;
        Ok(is_ack(sample[0]))
    }

    /// Send the address byte for a read or write
    pub fn send_address(&mut self, address: u8, read: bool, immediate: bool) -> Result<bool> {
        self.send_byte(address_byte(address, read)?, immediate)
    }

    /// Clock in one byte, answering with NACK (last byte) or ACK
    pub fn receive_byte(&mut self, nack: bool, immediate: bool) -> Result<u8> {
        self.enqueue_receive_byte(nack, immediate)?;
        self.transport.execute_buffer()?;
        let data = self.transport.read(1)?;
        Ok(data[0])
    }

    pub fn clear_input(&mut self) -> Result<()> {
        self.transport.clear_input()
    }

    /// Probe every 7-bit address with a write header
    pub fn scan(&mut self) -> Result<Vec<u8>> {
        self.transport.clear_input()?;
        self.transport.clear_output();

        let mut found = vec![];
        for address in SCAN_ADDRESSES {
            self.enqueue_start();
            self.enqueue_send_byte(address_byte(address, false)?, true)?;
            self.enqueue_stop();
            self.transport.execute_buffer()?;

            let sample = self.transport.read(1)?;
            if is_ack(sample[0]) {
                debug!("Found device at {address:#04x}");
                found.push(address);
            }
        }
        Ok(found)
    }

    /// Write `data` to a device, checking every ACK
    pub fn write_data(&mut self, address: u8, data: &[u8]) -> Result<()> {
        let header = address_byte(address, false)?;
        self.transport.clear_input()?;

        self.start()?;
        if !self.send_byte(header, false)? {
            return self.abort(NoAcknowledgeSource::Address);
        }
        for &byte in data {
            if !self.send_byte(byte, true)? {
                return self.abort(NoAcknowledgeSource::Data);
            }
        }
        self.stop()
    }

    /// Read `len` bytes starting at `register`
    pub fn read_data(&mut self, address: u8, register: u8, len: usize) -> Result<Vec<u8>> {
        let write_header = address_byte(address, false)?;
        let read_header = address_byte(address, true)?;
        self.transport.clear_input()?;

        self.start()?;
        if !self.send_byte(write_header, false)? {
            return self.abort(NoAcknowledgeSource::Address);
        }
        if !self.send_byte(register, false)? {
            return self.abort(NoAcknowledgeSource::Data);
        }

        // Repeated start for the read turnaround
        self.start()?;
        if !self.send_byte(read_header, false)? {
            return self.abort(NoAcknowledgeSource::Address);
        }

        let mut data = Vec::with_capacity(len);
        for i in 0..len {
            data.push(self.receive_byte(i + 1 == len, false)?);
        }
        self.stop()?;
        Ok(data)
    }

    /// Write in a single flush, ACKs are only checked after the fact
    ///
    /// With `check_ack` unset the samples are still read back, just not
    /// inspected.
    pub fn fast_write_data(&mut self, address: u8, data: &[u8], check_ack: bool) -> Result<()> {
        let header = address_byte(address, false)?;
        self.transport.clear_input()?;

        self.enqueue_start();
        self.enqueue_send_byte(header, false)?;
        for &byte in data {
            self.enqueue_send_byte(byte, false)?;
        }
        self.enqueue_stop();
        self.transport.execute_buffer()?;

        // The ACK samples are always consumed so none are left for the next transfer
        let acks = self.transport.read(data.len() + 1)?;
        trace!("Fast write ACKs: {}", hex::encode(&acks));
        if check_ack {
            if !is_ack(acks[0]) {
                return Err(Error::Nack(NoAcknowledgeSource::Address));
            }
            if !acks[1..].iter().all(|&sample| is_ack(sample)) {
                return Err(Error::Nack(NoAcknowledgeSource::Data));
            }
        }
        Ok(())
    }

    /// Register read in a single flush
    ///
    /// The STOP is part of the batch, so the bus is already idle when a
    /// missing header ACK is reported.
    pub fn fast_read_data(&mut self, address: u8, register: u8, len: usize) -> Result<Vec<u8>> {
        let write_header = address_byte(address, false)?;
        let read_header = address_byte(address, true)?;
        self.transport.clear_input()?;

        self.enqueue_start();
        self.enqueue_send_byte(write_header, false)?;
        self.enqueue_send_byte(register, false)?;
        self.enqueue_start();
        self.enqueue_send_byte(read_header, false)?;
        for i in 0..len {
            self.enqueue_receive_byte(i + 1 == len, false)?;
        }
        self.enqueue_stop();
        self.transport.execute_buffer()?;

        // Three header ACK samples precede the data
        let response = self.transport.read(len + 3)?;
        trace!("Fast read response: {}", hex::encode(&response));
        if !is_ack(response[0]) || !is_ack(response[2]) {
            return Err(Error::Nack(NoAcknowledgeSource::Address));
        }
        if !is_ack(response[1]) {
            return Err(Error::Nack(NoAcknowledgeSource::Data));
        }
        Ok(response[3..].to_vec())
    }
}

impl<T: Transport> ErrorType for I2cBus<T> {
    type Error = Error;
}

impl<T: Transport> I2c for I2cBus<T> {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<()> {
        self.transport.clear_input()?;
        let mut reading: Option<bool> = None;

        for i in 0..operations.len() {
            let is_read = matches!(operations[i], Operation::Read(_));
            let next_is_read = operations
                .get(i + 1)
                .map(|op| matches!(op, Operation::Read(_)));

            if reading != Some(is_read) {
                self.start()?;
                if !self.send_address(address, is_read, true)? {
                    return self.abort(NoAcknowledgeSource::Address);
                }
                reading = Some(is_read);
            }

            match &mut operations[i] {
                Operation::Write(data) => {
                    debug!("Write transaction with {} bytes, target: {address:#04x}", data.len());
                    for &byte in data.iter() {
                        if !self.send_byte(byte, true)? {
                            return self.abort(NoAcknowledgeSource::Data);
                        }
                    }
                }
                Operation::Read(buffer) => {
                    debug!("Read transaction with {} bytes, target: {address:#04x}", buffer.len());
                    let len = buffer.len();
                    for (j, slot) in buffer.iter_mut().enumerate() {
                        let last = j + 1 == len && next_is_read != Some(true);
                        *slot = self.receive_byte(last, true)?;
                    }
                }
            }
        }

        self.stop()
    }
}
