pub mod i2c_bus;

pub use i2c_bus::{address_byte, is_ack, I2cBus, I2cConfig, SCAN_ADDRESSES};
