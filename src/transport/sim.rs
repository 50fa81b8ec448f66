//! In-memory MPSSE engine for unit tests
//!
//! Decodes every flushed buffer with the opcode catalog and queues the
//! response bytes a real engine would produce.

use std::collections::VecDeque;

use crate::error::Error;
use crate::mpsse::{Opcode, Operands};
use super::Transport;

/// One decoded command
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SimCommand {
    pub opcode: Opcode,
    /// Bit or byte count of clocking commands, 0 otherwise
    pub len: usize,
    /// Operand bytes after the length field
    pub data: Vec<u8>,
}

impl SimCommand {
    /// Pin value and direction of a pin-set command
    pub fn pin_set(&self) -> Option<(u8, u8)> {
        match self.opcode {
            Opcode::SetDataBitsLow | Opcode::SetDataBitsHigh => Some((self.data[0], self.data[1])),
            _ => None,
        }
    }
}

/// Split a command stream into commands, panicking on malformed input
pub(crate) fn parse(bytes: &[u8]) -> Vec<SimCommand> {
    let mut commands = vec![];
    let mut i = 0;
    while i < bytes.len() {
        let opcode = Opcode::from_byte(bytes[i])
            .unwrap_or_else(|| panic!("unknown opcode {:#04X} at offset {i}", bytes[i]));
        i += 1;

        let (len, data_len) = match opcode.operands() {
            Operands::None => (0, 0),
            Operands::PinSet => (0, 2),
            Operands::Fixed(n) => (0, n),
            Operands::BitLength | Operands::BitLengthWithData => {
                let len = bytes[i] as usize + 1;
                i += 1;
                let data_len = usize::from(opcode.operands() == Operands::BitLengthWithData);
                (len, data_len)
            }
            Operands::ByteLength | Operands::ByteLengthWithPayload => {
                let len = u16::from_le_bytes([bytes[i], bytes[i + 1]]) as usize + 1;
                i += 2;
                let data_len = if opcode.operands() == Operands::ByteLength { 0 } else { len };
                (len, data_len)
            }
        };

        commands.push(SimCommand { opcode, len, data: bytes[i..i + data_len].to_vec() });
        i += data_len;
    }
    commands
}

type Responder = Box<dyn FnMut(&SimCommand) -> Option<Vec<u8>>>;

/// Simulated MPSSE engine
///
/// Duplex commands are echoed while loopback is connected. Every other
/// input-producing command answers zeros unless the responder overrides it.
/// The responder also sees commands that produce no input, so it can track
/// bus state.
#[derive(Default)]
pub(crate) struct SimTransport {
    pending: Vec<u8>,
    flushes: Vec<Vec<u8>>,
    input: VecDeque<u8>,
    divisor: u16,
    loopback: bool,
    responder: Option<Responder>,
}

impl SimTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&SimCommand) -> Option<Vec<u8>> + 'static,
    {
        Self { responder: Some(Box::new(responder)), ..Self::default() }
    }

    /// Buffers handed to `execute_buffer`, in order
    pub fn flushes(&self) -> &[Vec<u8>] {
        &self.flushes
    }

    /// Everything flushed so far as one stream
    pub fn sent(&self) -> Vec<u8> {
        self.flushes.concat()
    }

    /// Everything flushed so far, decoded
    pub fn commands(&self) -> Vec<SimCommand> {
        parse(&self.sent())
    }

    /// Bytes enqueued but not flushed yet
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Forget flushed history
    pub fn clear_history(&mut self) {
        self.flushes.clear();
    }

    fn respond(&mut self, cmd: &SimCommand) -> Option<Vec<u8>> {
        match cmd.opcode {
            Opcode::EnableLoopback => self.loopback = true,
            Opcode::DisableLoopback => self.loopback = false,
            Opcode::SetClockDivisor => self.divisor = u16::from_le_bytes([cmd.data[0], cmd.data[1]]),
            _ => {}
        }

        let scripted = self.responder.as_mut().and_then(|responder| responder(cmd));
        if !cmd.opcode.produces_input() {
            return None;
        }

        let len = match cmd.opcode.operands() {
            Operands::ByteLength | Operands::ByteLengthWithPayload => cmd.len,
            _ => 1,
        };

        let echo = self.loopback && !cmd.data.is_empty();
        Some(match scripted {
            Some(bytes) => bytes,
            None if echo => cmd.data[..len].to_vec(),
            None => vec![0u8; len],
        })
    }
}

impl Transport for SimTransport {
    fn enqueue(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    fn execute_buffer(&mut self) -> Result<(), Error> {
        let buffer = std::mem::take(&mut self.pending);
        if buffer.is_empty() {
            return Ok(());
        }
        for cmd in parse(&buffer) {
            if let Some(response) = self.respond(&cmd) {
                self.input.extend(response);
            }
        }
        self.flushes.push(buffer);
        Ok(())
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        if self.input.len() < len {
            let actual = self.input.len();
            self.input.clear();
            return Err(Error::ShortRead { expected: len, actual });
        }
        Ok(self.input.drain(..len).collect())
    }

    fn clear_input(&mut self) -> Result<(), Error> {
        self.input.clear();
        Ok(())
    }

    fn clear_output(&mut self) {
        self.pending.clear();
    }

    fn clock_divisor(&self) -> u16 {
        self.divisor
    }

    fn set_clock_divisor(&mut self, divisor: u16) -> Result<(), Error> {
        self.write(&crate::mpsse::encoder::set_clock_divisor(divisor))
    }

    fn loopback(&self) -> bool {
        self.loopback
    }

    fn set_loopback(&mut self, enabled: bool) -> Result<(), Error> {
        self.write(&super::loopback_command(enabled))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetState {
    Idle,
    Address,
    Selected(u8),
    Unselected,
}

/// I2C targets on a simulated bus
///
/// Watches SCL/SDA pin-set commands for START and STOP, answers the ACK
/// sample after each clocked-out byte and feeds `read_data` to byte reads.
pub(crate) struct I2cTargets {
    present: Vec<u8>,
    nack_data: Vec<u8>,
    read_data: VecDeque<u8>,
    prev_lines: u8,
    state: TargetState,
    ack: bool,
}

impl I2cTargets {
    const LINES: u8 = 0x03; // SCL | SDA

    pub fn new(present: &[u8]) -> Self {
        Self {
            present: present.to_vec(),
            nack_data: vec![],
            read_data: VecDeque::new(),
            prev_lines: Self::LINES,
            state: TargetState::Idle,
            ack: false,
        }
    }

    /// Target acknowledges its address but refuses data bytes
    pub fn nack_data(mut self, address: u8) -> Self {
        self.nack_data.push(address);
        self
    }

    pub fn read_data(mut self, data: &[u8]) -> Self {
        self.read_data.extend(data);
        self
    }

    pub fn handle(&mut self, cmd: &SimCommand) -> Option<Vec<u8>> {
        match (cmd.opcode, cmd.len) {
            (Opcode::SetDataBitsLow, _) => {
                let lines = cmd.data[0] & Self::LINES;
                match (self.prev_lines, lines) {
                    (0x03, 0x01) => self.state = TargetState::Address,
                    (0x01, 0x03) => self.state = TargetState::Idle,
                    _ => {}
                }
                self.prev_lines = lines;
                None
            }
            (Opcode::ClockBitsOutMsbNeg, 8) => {
                let byte = cmd.data[0];
                self.ack = match self.state {
                    TargetState::Address => {
                        let address = byte >> 1;
                        let present = self.present.contains(&address);
                        self.state = if present {
                            TargetState::Selected(address)
                        } else {
                            TargetState::Unselected
                        };
                        present
                    }
                    TargetState::Selected(address) => !self.nack_data.contains(&address),
                    TargetState::Idle | TargetState::Unselected => false,
                };
                None
            }
            (Opcode::ClockBitsInMsbPos, 1) => Some(vec![if self.ack { 0x00 } else { 0x01 }]),
            (Opcode::ClockBitsInMsbPos, 8) => Some(vec![self.read_data.pop_front().unwrap_or(0xFF)]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_parse_stream() {
        let cmds = parse(&hex!("80 03 13 13 07 A5 22 00 11 01 00 AA BB 87"));
        let ops: Vec<_> = cmds.iter().map(|c| c.opcode).collect();
        assert_eq!(
            ops,
            vec![
                Opcode::SetDataBitsLow,
                Opcode::ClockBitsOutMsbNeg,
                Opcode::ClockBitsInMsbPos,
                Opcode::ClockDataOutMsbNeg,
                Opcode::SendImmediate
            ]
        );
        assert_eq!(cmds[1].len, 8);
        assert_eq!(cmds[3].len, 2);
        assert_eq!(cmds[3].data, vec![0xAA, 0xBB]);
    }

    #[test]
    fn test_loopback_echo() {
        let mut sim = SimTransport::new();
        sim.set_loopback(true).unwrap();
        sim.write(&hex!("31 02 00 01 02 03")).unwrap();
        assert_eq!(sim.read(3).unwrap(), vec![1, 2, 3]);

        sim.set_loopback(false).unwrap();
        sim.write(&hex!("31 00 00 55")).unwrap();
        assert_eq!(sim.read(1).unwrap(), vec![0]);
    }

    #[test]
    fn test_short_read() {
        let mut sim = SimTransport::new();
        sim.write(&hex!("22 00")).unwrap();
        assert!(matches!(sim.read(2), Err(Error::ShortRead { expected: 2, actual: 1 })));
    }
}
