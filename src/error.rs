use embedded_hal::i2c::NoAcknowledgeSource;
use thiserror::Error as DeriveError;
#[cfg(feature = "ftdi")]
use libftd2xx::{TimeoutError as FtdiTimeout, FtStatus, DeviceTypeError};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(DeriveError, Debug)]
pub enum Error {
    #[error("Invalid bit length {0} (must be 1..=8)")]
    InvalidBitLength(u8),

    #[error("Invalid byte length {0} (must be 1..=65536)")]
    InvalidByteLength(usize),

    #[error("Range {offset}+{len} out of bounds for {available} bytes")]
    InvalidRange { offset: usize, len: usize, available: usize },

    #[error("Invalid 7-bit I2C address {0:#04X}")]
    InvalidAddress(u8),

    #[error("Malformed command batch at offset {offset}")]
    MalformedBatch { offset: usize },

    #[error("No reset pin configured")]
    NoResetPin,

    #[error("I2C NACK ({0:?})")]
    Nack(NoAcknowledgeSource),

    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("MPSSE synchronization failed")]
    SyncFailed,

    #[cfg(feature = "ftdi")]
    #[error("FTDI Timeout")]
    DeviceTimeout(#[from] FtdiTimeout),

    #[cfg(feature = "ftdi")]
    #[error("FTDI Status: {0}")]
    FtStatus(#[from] FtStatus),

    #[cfg(feature = "ftdi")]
    #[error("FTDI Device Type Error: {0}")]
    DeviceTypeError(#[from] DeviceTypeError),
}

impl Error {
    /// Argument was rejected before anything reached the command buffer
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidBitLength(_)
                | Self::InvalidByteLength(_)
                | Self::InvalidRange { .. }
                | Self::InvalidAddress(_)
                | Self::MalformedBatch { .. }
                | Self::NoResetPin
        )
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        match self {
            Self::Nack(source) => embedded_hal::i2c::ErrorKind::NoAcknowledge(*source),
            _ => embedded_hal::i2c::ErrorKind::Other,
        }
    }
}

impl embedded_hal::spi::Error for Error {
    fn kind(&self) -> embedded_hal::spi::ErrorKind {
        embedded_hal::spi::ErrorKind::Other
    }
}
