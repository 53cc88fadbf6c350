//! Peripheral access from Linux user space.
//!
//! periprims talks to I2C and SPI devices through their character device
//! nodes and drives a capacitor-discharge proximity sensor over one GPIO pin.
//!
//! # Crate Structure
//!
//! - [`ioctl`]: Request-code encoding and device node handles
//! - [`i2c`]: Combined I2C transactions (behind `i2c` feature)
//! - [`spi`]: SPI transfers (behind `spi` feature)
//! - [`sensor`]: Proximity sensor driver (behind `sensor` feature)

/// Re-export device control types.
pub mod ioctl {
    pub use periprims_ioctl::*;
}

/// Re-export I2C types (requires `i2c` feature).
#[cfg(feature = "i2c")]
pub mod i2c {
    pub use periprims_i2c::*;
}

/// Re-export SPI types (requires `spi` feature).
#[cfg(feature = "spi")]
pub mod spi {
    pub use periprims_spi::*;
}

/// Re-export proximity sensor types (requires `sensor` feature).
#[cfg(feature = "sensor")]
pub mod sensor {
    pub use periprims_sensor::*;
}
