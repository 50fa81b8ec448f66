//! MPSSE command encoder
//!
//! Pure functions turning one logical engine operation into the exact
//! bytes the command processor expects. Length operands are validated
//! before anything is produced.

use core::ops::Range;

use crate::error::{Error, Result};
use super::opcode::{
    ClockBits, ClockBitsIn, ClockBitsOut, ClockData, ClockDataIn, ClockDataOut, ClockTms,
    ClockTmsOut, Opcode,
};
use super::pins::Pins;

/// Longest bit transfer
pub const MAX_BITS: u8 = 8;

/// Longest byte transfer
pub const MAX_BYTES: usize = 0x10000;

/// Chunk size used when splitting payloads over several transfer commands
pub const MAX_CHUNK: usize = 0xFFFF;

fn bit_length(len: u8) -> Result<u8> {
    if len == 0 || len > MAX_BITS {
        return Err(Error::InvalidBitLength(len));
    }
    Ok(len - 1)
}

fn byte_length(len: usize) -> Result<[u8; 2]> {
    if len == 0 || len > MAX_BYTES {
        return Err(Error::InvalidByteLength(len));
    }
    Ok(((len - 1) as u16).to_le_bytes())
}

fn checked_range(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(Error::InvalidRange { offset, len, available: data.len() })
}

fn payload(op: Opcode, data: &[u8]) -> Result<Vec<u8>> {
    let [lo, hi] = byte_length(data.len())?;
    let mut cmd = Vec::with_capacity(data.len() + 3);
    cmd.extend_from_slice(&[op.bits(), lo, hi]);
    cmd.extend_from_slice(data);
    Ok(cmd)
}

fn length_only(op: Opcode, len: usize) -> Result<[u8; 3]> {
    let [lo, hi] = byte_length(len)?;
    Ok([op.bits(), lo, hi])
}

fn single(op: Opcode) -> [u8; 1] {
    [op.bits()]
}

/// Split `len` bytes into consecutive ranges of at most [`MAX_CHUNK`] bytes
pub fn chunks(len: usize) -> impl Iterator<Item = Range<usize>> {
    (0..len)
        .step_by(MAX_CHUNK)
        .map(move |start| start..(start + MAX_CHUNK).min(len))
}

pub fn set_clock_divisor(divisor: u16) -> [u8; 3] {
    let [lo, hi] = divisor.to_le_bytes();
    [Opcode::SetClockDivisor.bits(), lo, hi]
}

pub fn send_immediate() -> [u8; 1] {
    single(Opcode::SendImmediate)
}

pub fn enable_loopback() -> [u8; 1] {
    single(Opcode::EnableLoopback)
}

pub fn disable_loopback() -> [u8; 1] {
    single(Opcode::DisableLoopback)
}

/// Stall the command processor until GPIOL1 reaches the given level
pub fn wait_on_io(high: bool) -> [u8; 1] {
    single(if high { Opcode::WaitOnIoHigh } else { Opcode::WaitOnIoLow })
}

/// Clock continuously until GPIOL1 reaches the given level
pub fn clock_until_io(high: bool) -> [u8; 1] {
    single(if high { Opcode::ClockUntilIoHigh } else { Opcode::ClockUntilIoLow })
}

pub fn clock_divide_by_5(enabled: bool) -> [u8; 1] {
    single(if enabled { Opcode::EnableClockDivideBy5 } else { Opcode::DisableClockDivideBy5 })
}

pub fn three_phase_clocking(enabled: bool) -> [u8; 1] {
    single(if enabled { Opcode::Enable3PhaseClocking } else { Opcode::Disable3PhaseClocking })
}

pub fn adaptive_clocking(enabled: bool) -> [u8; 1] {
    single(if enabled { Opcode::EnableAdaptiveClocking } else { Opcode::DisableAdaptiveClocking })
}

/// Program the low byte pins (ADBUS)
pub fn set_data_bits_low(value: Pins, direction: Pins) -> [u8; 3] {
    [Opcode::SetDataBitsLow.bits(), value.low(), direction.low()]
}

/// Program the high byte pins (ACBUS)
pub fn set_data_bits_high(value: Pins, direction: Pins) -> [u8; 3] {
    [Opcode::SetDataBitsHigh.bits(), value.high(), direction.high()]
}

/// Response: 1 byte
pub fn get_data_bits_low() -> [u8; 1] {
    single(Opcode::GetDataBitsLow)
}

/// Response: 1 byte
pub fn get_data_bits_high() -> [u8; 1] {
    single(Opcode::GetDataBitsHigh)
}

/// Pins that only drive low and tristate when set high (FT232H)
pub fn set_open_drain(low: Pins, high: Pins) -> [u8; 3] {
    [Opcode::SetOpenDrain.bits(), low.low(), high.high()]
}

pub fn clock_bits_out(mode: ClockBitsOut, data: u8, len: u8) -> Result<[u8; 3]> {
    Ok([Opcode::from(mode).bits(), bit_length(len)?, data])
}

pub fn clock_bits_in(mode: ClockBitsIn, len: u8) -> Result<[u8; 2]> {
    Ok([Opcode::from(mode).bits(), bit_length(len)?])
}

pub fn clock_bits(mode: ClockBits, data: u8, len: u8) -> Result<[u8; 3]> {
    Ok([Opcode::from(mode).bits(), bit_length(len)?, data])
}

/// Bit 7 of `data` is held on DO while TMS bits shift out
pub fn clock_tms_out(mode: ClockTmsOut, data: u8, len: u8) -> Result<[u8; 3]> {
    Ok([Opcode::from(mode).bits(), bit_length(len)?, data])
}

pub fn clock_tms(mode: ClockTms, data: u8, len: u8) -> Result<[u8; 3]> {
    Ok([Opcode::from(mode).bits(), bit_length(len)?, data])
}

/// Clock without transferring data
pub fn clock_bits_idle(len: u8) -> Result<[u8; 2]> {
    Ok([Opcode::ClockBitsNoData.bits(), bit_length(len)?])
}

/// Clock `len` x 8 bits without transferring data
pub fn clock_bytes_idle(len: usize) -> Result<[u8; 3]> {
    length_only(Opcode::ClockBytesNoData, len)
}

/// Clock `len` x 8 bits or until GPIOL1 reaches the given level
pub fn clock_bytes_until_io(high: bool, len: usize) -> Result<[u8; 3]> {
    let op = if high { Opcode::ClockBytesUntilIoHigh } else { Opcode::ClockBytesUntilIoLow };
    length_only(op, len)
}

pub fn clock_data_out(mode: ClockDataOut, data: &[u8]) -> Result<Vec<u8>> {
    payload(mode.into(), data)
}

/// Encode `len` bytes of `data` starting at `offset`
pub fn clock_data_out_range(mode: ClockDataOut, data: &[u8], offset: usize, len: usize) -> Result<Vec<u8>> {
    payload(mode.into(), checked_range(data, offset, len)?)
}

/// Response: `len` bytes
pub fn clock_data_in(mode: ClockDataIn, len: usize) -> Result<[u8; 3]> {
    length_only(mode.into(), len)
}

/// Response: `data.len()` bytes
pub fn clock_data(mode: ClockData, data: &[u8]) -> Result<Vec<u8>> {
    payload(mode.into(), data)
}

pub fn clock_data_range(mode: ClockData, data: &[u8], offset: usize, len: usize) -> Result<Vec<u8>> {
    payload(mode.into(), checked_range(data, offset, len)?)
}

/// Write-only transfer of any non-empty payload, one command per chunk
pub fn clock_data_out_chunked(mode: ClockDataOut, data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(Error::InvalidByteLength(0));
    }
    let mut cmd = Vec::with_capacity(data.len() + 3 * data.len().div_ceil(MAX_CHUNK));
    for chunk in chunks(data.len()) {
        cmd.extend(clock_data_out_range(mode, data, chunk.start, chunk.len())?);
    }
    Ok(cmd)
}

/// Duplex transfer of any non-empty payload, one command per chunk
pub fn clock_data_chunked(mode: ClockData, data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(Error::InvalidByteLength(0));
    }
    let mut cmd = Vec::with_capacity(data.len() + 3 * data.len().div_ceil(MAX_CHUNK));
    for chunk in chunks(data.len()) {
        cmd.extend(clock_data_range(mode, data, chunk.start, chunk.len())?);
    }
    Ok(cmd)
}

/// Response: 1 byte
pub fn read_short_address(addr: u8) -> [u8; 2] {
    [Opcode::ReadShortAddress.bits(), addr]
}

/// Response: 1 byte
pub fn read_extended_address(addr: u16) -> [u8; 3] {
    let [hi, lo] = addr.to_be_bytes();
    [Opcode::ReadExtendedAddress.bits(), hi, lo]
}

pub fn write_short_address(addr: u8, data: u8) -> [u8; 3] {
    [Opcode::WriteShortAddress.bits(), addr, data]
}

pub fn write_extended_address(addr: u16, data: u8) -> [u8; 4] {
    let [hi, lo] = addr.to_be_bytes();
    [Opcode::WriteExtendedAddress.bits(), hi, lo, data]
}
