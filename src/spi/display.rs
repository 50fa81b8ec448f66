use embedded_hal::delay::DelayNs;
use log::debug;

use crate::error::{Error, Result};
use crate::mpsse::encoder;
use crate::mpsse::{Bit, Pins};
use crate::transport::Transport;
use super::{DisplayConfig, SpiDevice};

/// Data/command line with optional reset, both on the high byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataCommand {
    pin: Pins,
    reset: Option<Pins>,
    level: Bit,
}

impl DataCommand {
    pub fn new(pin: Pins, reset: Option<Pins>) -> Self {
        Self {
            pin,
            reset,
            level: Bit::Zero,
        }
    }

    pub fn level(&self) -> Bit {
        self.level
    }

    pub fn reset_pin(&self) -> Option<Pins> {
        self.reset
    }

    pub fn direction(&self) -> Pins {
        self.pin | self.reset.unwrap_or_default()
    }

    /// DC low for commands, high for data. Reset stays released.
    pub fn select(&mut self, command: bool) -> [u8; 3] {
        self.set_level(Bit::from(!command))
    }

    pub fn set_level(&mut self, level: Bit) -> [u8; 3] {
        self.level = level;
        let reset = self.reset.unwrap_or_default();
        let value = if level.is_high() { self.pin | reset } else { reset };
        encoder::set_data_bits_high(value, self.direction())
    }
}

/// One `[command, count, args...]` entry of a command batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchEntry<'a> {
    pub command: u8,
    pub args: &'a [u8],
}

/// Split a command batch, failing on the first truncated entry
///
/// The top bit of the count byte is reserved and ignored.
pub fn parse_batch(batch: &[u8]) -> Result<Vec<BatchEntry<'_>>> {
    let mut entries = vec![];
    let mut offset = 0;
    while offset < batch.len() {
        let header = batch
            .get(offset..offset + 2)
            .ok_or(Error::MalformedBatch { offset })?;
        let count = (header[1] & 0x7F) as usize;
        let args = batch
            .get(offset + 2..offset + 2 + count)
            .ok_or(Error::MalformedBatch { offset })?;
        entries.push(BatchEntry { command: header[0], args });
        offset += 2 + count;
    }
    Ok(entries)
}

/// SPI display controller: an [`SpiDevice`] plus a data/command line
pub struct SpiDisplay<T> {
    spi: SpiDevice<T>,
    dc: DataCommand,
}

impl<T: Transport> SpiDisplay<T> {
    pub fn new(transport: T, config: DisplayConfig) -> Result<Self> {
        let mut spi = SpiDevice::new(transport, config.spi)?;
        let mut dc = DataCommand::new(config.dc, config.reset);
        spi.transport_mut().write(&dc.select(true))?;
        debug!("SPI display, DC on {:?}, reset on {:?}", config.dc, config.reset);
        Ok(Self { spi, dc })
    }

    pub fn device(&self) -> &SpiDevice<T> {
        &self.spi
    }

    pub fn device_mut(&mut self) -> &mut SpiDevice<T> {
        &mut self.spi
    }

    pub fn data_command(&self) -> &DataCommand {
        &self.dc
    }

    pub fn into_inner(self) -> T {
        self.spi.into_inner()
    }

    /// Write `data` as a command or as display data
    pub fn write(&mut self, data: &[u8], command: bool) -> Result<()> {
        let payload = encoder::clock_data_out_chunked(self.spi.write_op(), data)?;

        let mut body = Vec::with_capacity(payload.len() + 3);
        body.extend(self.dc.select(command));
        body.extend(payload);
        self.spi.send_bracketed(&body)
    }

    /// Send a `[command, count, args...]*` batch inside one chip-select bracket
    pub fn write_batch(&mut self, batch: &[u8]) -> Result<()> {
        let entries = parse_batch(batch)?;
        if entries.is_empty() {
            return Ok(());
        }

        let op = self.spi.write_op();
        let mut encoded = Vec::with_capacity(entries.len());
        for entry in &entries {
            let command = encoder::clock_data_out(op, &[entry.command])?;
            let args = if entry.args.is_empty() {
                None
            } else {
                Some(encoder::clock_data_out(op, entry.args)?)
            };
            encoded.push((command, args));
        }

        let mut body = vec![];
        for (command, args) in encoded {
            body.extend(self.dc.select(true));
            body.extend(command);
            if let Some(args) = args {
                body.extend(self.dc.select(false));
                body.extend(args);
            }
        }
        self.spi.send_bracketed(&body)
    }

    /// Pulse reset low without delays
    pub fn reset(&mut self) -> Result<()> {
        let reset = self.dc.reset_pin().ok_or(Error::NoResetPin)?;
        let direction = self.dc.direction();

        let mut cmd = vec![];
        for _ in 0..5 {
            cmd.extend(encoder::set_data_bits_high(Pins::empty(), direction));
        }
        cmd.extend(encoder::set_data_bits_high(reset, direction));
        self.spi.transport_mut().write(&cmd)?;
        self.dc.level = Bit::Zero;
        Ok(())
    }

    /// Hold reset low for `ms`, release it and wait `ms` again
    pub fn reset_with_delay<D: DelayNs>(&mut self, delay: &mut D, ms: u32) -> Result<()> {
        let reset = self.dc.reset_pin().ok_or(Error::NoResetPin)?;
        let direction = self.dc.direction();
        let dc = self.dc.pin;

        self.spi
            .transport_mut()
            .write(&encoder::set_data_bits_high(dc, direction))?;
        delay.delay_ms(ms);
        self.spi
            .transport_mut()
            .write(&encoder::set_data_bits_high(dc | reset, direction))?;
        delay.delay_ms(ms);

        self.dc.level = Bit::One;
        Ok(())
    }
}
