use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{self as eh_spi, Operation};
use log::debug;

use crate::delay::StdDelay;
use crate::error::{Error, Result};
use crate::mpsse::encoder;
use crate::mpsse::{Bit, ClockData, ClockDataIn, ClockDataOut};
use crate::transport::Transport;
use super::{ChipSelect, SpiConfig};

/// SPI device with an MPSSE-driven chip-select
///
/// Every transfer is bracketed by chip-select enable/disable and shipped
/// in one flush.
pub struct SpiDevice<T> {
    transport: T,
    config: SpiConfig,
    cs: ChipSelect,
    write_op: ClockDataOut,
    duplex_op: ClockData,
    read_op: ClockDataIn,
}

impl<T: Transport> SpiDevice<T> {
    /// Drive chip-select to its initial level
    pub fn new(mut transport: T, config: SpiConfig) -> Result<Self> {
        let mut cs = ChipSelect::new(config.cs, config.cs_policy, config.mode);
        let (write_op, duplex_op) = config.mode.opcodes(config.bit_order);
        let read_op = config.mode.read_opcode(config.bit_order);

        transport.write(&cs.set_level(config.cs_policy.initial_level()))?;
        debug!(
            "SPI device on {:?}: {:?} {:?}, {:?}",
            config.cs, config.mode, config.bit_order, config.cs_policy
        );

        Ok(Self {
            transport,
            config,
            cs,
            write_op,
            duplex_op,
            read_op,
        })
    }

    pub fn config(&self) -> &SpiConfig {
        &self.config
    }

    pub fn chip_select(&self) -> &ChipSelect {
        &self.cs
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

    pub(crate) fn write_op(&self) -> ClockDataOut {
        self.write_op
    }

    /// Enable, `body`, disable, then flush
    pub(crate) fn send_bracketed(&mut self, body: &[u8]) -> Result<()> {
        let enable = self.cs.enable();
        let disable = self.cs.disable();
        self.transport.enqueue(&enable);
        self.transport.enqueue(body);
        self.transport.enqueue(&disable);
        self.transport.execute_buffer()
    }

    /// Write-only transfer
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        let payload = encoder::clock_data_out_chunked(self.write_op, data)?;
        self.send_bracketed(&payload)
    }

    /// Full-duplex transfer, returns one byte read per byte written
    pub fn transfer(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let mut payload = encoder::clock_data_chunked(self.duplex_op, data)?;
        payload.extend(encoder::send_immediate());
        self.send_bracketed(&payload)?;
        self.transport.read(data.len())
    }

    /// Pin-set bytes for the requested level, nothing is sent
    pub fn set_chip_select_level(&mut self, level: Bit) -> [u8; 3] {
        self.cs.set_level(level)
    }

    pub fn apply_chip_select_level(&mut self, level: Bit) -> Result<()> {
        let cmd = self.cs.set_level(level);
        self.transport.write(&cmd)
    }

    pub fn loopback_enabled(&self) -> bool {
        self.transport.loopback()
    }

    pub fn set_loopback_enabled(&mut self, enabled: bool) -> Result<()> {
        self.transport.set_loopback(enabled)
    }

    /// Duplex inside an open bracket
    fn exchange(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let payload = encoder::clock_data_chunked(self.duplex_op, data)?;
        self.transport.enqueue(&payload);
        self.transport.enqueue(&encoder::send_immediate());
        self.transport.execute_buffer()?;
        self.transport.read(data.len())
    }

    fn run(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<()> {
        for op in operations {
            match op {
                Operation::Write(data) => {
                    if !data.is_empty() {
                        let payload = encoder::clock_data_out_chunked(self.write_op, &data[..])?;
                        self.transport.enqueue(&payload);
                    }
                }
                Operation::Read(buffer) => {
                    if buffer.is_empty() {
                        continue;
                    }
                    let mut cmd = vec![];
                    for chunk in encoder::chunks(buffer.len()) {
                        cmd.extend(encoder::clock_data_in(self.read_op, chunk.len())?);
                    }
                    cmd.extend(encoder::send_immediate());
                    self.transport.enqueue(&cmd);
                    self.transport.execute_buffer()?;
                    let data = self.transport.read(buffer.len())?;
                    buffer.copy_from_slice(&data);
                }
                Operation::Transfer(read, write) => {
                    let len = read.len().max(write.len());
                    if len == 0 {
                        continue;
                    }
                    let mut tx = write.to_vec();
                    tx.resize(len, 0x00);
                    let rx = self.exchange(&tx)?;
                    read.copy_from_slice(&rx[..read.len()]);
                }
                Operation::TransferInPlace(buffer) => {
                    if buffer.is_empty() {
                        continue;
                    }
                    let rx = self.exchange(&buffer[..])?;
                    buffer.copy_from_slice(&rx);
                }
                Operation::DelayNs(ns) => {
                    self.transport.execute_buffer()?;
                    StdDelay.delay_ns(*ns);
                }
            }
        }
        Ok(())
    }
}

impl<T: Transport> eh_spi::ErrorType for SpiDevice<T> {
    type Error = Error;
}

impl<T: Transport> eh_spi::SpiDevice for SpiDevice<T> {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<()> {
        let enable = self.cs.enable();
        self.transport.enqueue(&enable);

        let result = self.run(operations);
        if result.is_err() {
            self.transport.clear_output();
        }

        // Always deselect, even after a failed operation
        let disable = self.cs.disable();
        let released = self.transport.write(&disable);
        result.and(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpsse::{Opcode, Pins};
    use crate::spi::{BitOrder, CsPolicy, SpiMode};
    use crate::transport::sim::{parse, SimTransport};
    use eh_spi::SpiDevice as _;
    use hex_literal::hex;

    fn device(config: SpiConfig) -> SpiDevice<SimTransport> {
        SpiDevice::new(SimTransport::new(), config).unwrap()
    }

    fn last_flush(dev: &SpiDevice<SimTransport>) -> Vec<u8> {
        dev.transport().flushes().last().cloned().unwrap_or_default()
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn test_initial_chip_select() {
        let dev = device(SpiConfig::default());
        assert_eq!(dev.transport().flushes(), &[hex!("80 08 0B").to_vec()]);

        let config = SpiConfig { cs_policy: CsPolicy::ActiveHigh, ..SpiConfig::default() };
        let dev = device(config);
        assert_eq!(last_flush(&dev), hex!("80 00 0B"));
    }

    #[test]
    fn test_active_low_bracket_order() {
        let mut dev = device(SpiConfig::default());
        dev.write(&[0xAA, 0x55]).unwrap();
        assert_eq!(last_flush(&dev), hex!("80 00 0B 11 01 00 AA 55 80 08 0B"));
        assert_eq!(dev.chip_select().level(), Bit::One);
    }

    #[test]
    fn test_loopback_transfer() {
        let mut dev = device(SpiConfig::default());
        assert!(!dev.loopback_enabled());
        dev.set_loopback_enabled(true).unwrap();
        assert!(dev.loopback_enabled());

        for len in [1, 9, 60000] {
            let data = pattern(len);
            assert_eq!(dev.transfer(&data).unwrap(), data);
        }
    }

    #[test]
    fn test_chunked_loopback_transfer() {
        let mut dev = device(SpiConfig::default());
        dev.set_loopback_enabled(true).unwrap();

        let data = pattern(131072);
        assert_eq!(dev.transfer(&data).unwrap(), data);

        let cmds = parse(&last_flush(&dev));
        let duplex: Vec<_> = cmds.iter().filter(|c| c.opcode == Opcode::ClockDataMsbPosIn).map(|c| c.len).collect();
        assert_eq!(duplex, vec![0xFFFF, 0xFFFF, 2]);
        assert_eq!(cmds[cmds.len() - 2].opcode, Opcode::SendImmediate);
    }

    #[test]
    fn test_chunked_write() {
        let mut dev = device(SpiConfig::default());
        let data = pattern(131072);
        dev.write(&data).unwrap();

        let cmds = parse(&last_flush(&dev));
        assert_eq!(cmds.first().and_then(|c| c.pin_set()), Some((0x00, 0x0B)));
        assert_eq!(cmds.last().and_then(|c| c.pin_set()), Some((0x08, 0x0B)));

        let writes: Vec<_> = cmds.iter().filter(|c| c.opcode == Opcode::ClockDataOutMsbNeg).collect();
        assert!(writes.iter().all(|c| c.len <= 0xFFFF));
        assert_eq!(writes.iter().map(|c| c.len).sum::<usize>(), 131072);
        let payload: Vec<u8> = writes.iter().flat_map(|c| c.data.clone()).collect();
        assert_eq!(payload, data);
    }

    #[test]
    fn test_mode2_write() {
        let config = SpiConfig { mode: SpiMode::Mode2, ..SpiConfig::default() };
        let mut dev = device(config);
        assert_eq!(last_flush(&dev), hex!("80 09 0B"));

        dev.write(&[0x01]).unwrap();
        assert_eq!(last_flush(&dev), hex!("80 01 0B 10 00 00 01 80 09 0B"));
    }

    #[test]
    fn test_lsb_first_transfer() {
        let config = SpiConfig { bit_order: BitOrder::LsbFirst, ..SpiConfig::default() };
        let mut dev = device(config);
        dev.transfer(&[0x80]).unwrap();
        assert_eq!(last_flush(&dev), hex!("80 00 0B 39 00 00 80 87 80 08 0B"));
    }

    #[test]
    fn test_empty_write_rejected() {
        let mut dev = device(SpiConfig::default());
        let err = dev.write(&[]).unwrap_err();
        assert!(matches!(err, Error::InvalidByteLength(0)));
        assert_eq!(dev.transport().flushes().len(), 1);
        assert!(dev.transport().pending().is_empty());
        assert_eq!(dev.chip_select().level(), Bit::One);
    }

    #[test]
    fn test_chip_select_level_is_explicit() {
        let mut dev = device(SpiConfig::default());
        let pending = dev.set_chip_select_level(Bit::Zero);
        assert_eq!(pending, hex!("80 00 0B"));
        assert_eq!(dev.transport().flushes().len(), 1);

        dev.apply_chip_select_level(Bit::One).unwrap();
        assert_eq!(last_flush(&dev), hex!("80 08 0B"));
        assert_eq!(dev.transport().flushes().len(), 2);
    }

    #[test]
    fn test_custom_chip_select_pin() {
        let config = SpiConfig { cs: Pins::GPIOL3, ..SpiConfig::default() };
        let mut dev = device(config);
        dev.write(&[0x00]).unwrap();
        assert_eq!(last_flush(&dev), hex!("80 00 83 11 00 00 00 80 80 83"));
    }

    #[test]
    fn test_embedded_hal_transaction() {
        let mut dev = device(SpiConfig::default());
        dev.set_loopback_enabled(true).unwrap();
        dev.transport_mut().clear_history();

        let mut in_place = [0x12, 0x34];
        let mut read = [0xFFu8; 2];
        let mut transfer_rx = [0u8; 3];
        dev.transaction(&mut [
            Operation::Write(&[0x9F]),
            Operation::TransferInPlace(&mut in_place),
            Operation::Read(&mut read),
            Operation::Transfer(&mut transfer_rx, &[0xA1, 0xA2]),
            Operation::DelayNs(0),
        ])
        .unwrap();

        assert_eq!(in_place, [0x12, 0x34]);
        assert_eq!(read, [0x00, 0x00]);
        assert_eq!(transfer_rx, [0xA1, 0xA2, 0x00]);

        let sent = dev.transport().sent();
        assert!(sent.starts_with(&hex!("80 00 0B 11 00 00 9F")));
        assert!(sent.ends_with(&hex!("80 08 0B")));
        assert_eq!(dev.chip_select().level(), Bit::One);
    }

    #[test]
    fn test_embedded_hal_failure_still_deselects() {
        // Engine that never answers: the read comes back short
        let sim = SimTransport::with_responder(|_| Some(vec![]));
        let mut dev = SpiDevice::new(sim, SpiConfig::default()).unwrap();

        let mut buf = [0u8; 4];
        let err = dev.transaction(&mut [Operation::TransferInPlace(&mut buf)]).unwrap_err();
        assert!(matches!(err, Error::ShortRead { expected: 4, actual: 0 }));
        assert_eq!(last_flush(&dev), hex!("80 08 0B"));
        assert!(dev.transport().pending().is_empty());
    }
}
