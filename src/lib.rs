pub mod delay;
pub mod error;
pub mod i2c;
pub mod mpsse;
pub mod spi;
pub mod transport;

pub use embedded_hal::i2c as eh_i2c;
pub use embedded_hal::spi as eh_spi;
pub use delay::StdDelay;
pub use error::{Error, Result};
pub use i2c::{I2cBus, I2cConfig};
pub use mpsse::{Bit, Pins};
pub use spi::{BitOrder, CsPolicy, DisplayConfig, SpiConfig, SpiDevice, SpiDisplay, SpiMode};
pub use transport::Transport;

#[cfg(feature = "ftdi")]
pub use transport::ftdi::FtdiTransport;
#[cfg(feature = "ftdi")]
pub use libftd2xx::{Ft232h, Ft2232h, Ft4232h, FtdiCommon};
