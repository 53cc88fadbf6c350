//! I2C combined transactions over the Linux i2c-dev interface.
//!
//! A transaction is an ordered list of up to [`MAX_MESSAGES`] messages,
//! each reading into or writing from a caller buffer, submitted to the
//! adapter as one atomic request:
//!
//! ```no_run
//! use periprims_i2c::I2c;
//!
//! let mut bus = I2c::open(1)?;
//! bus.set_address(0x77)?;
//! let mut calibration = [0u8; 22];
//! bus.read(0xAA, &mut calibration)?;
//! bus.write_register(0xF4, 0x2E)?;
//! # Ok::<(), periprims_i2c::I2cError>(())
//! ```

pub mod bus;
pub mod codec;
pub mod config;
pub mod error;
pub mod funcs;
pub mod message;

pub use bus::I2c;
pub use codec::{MAX_MESSAGES, MAX_SEVEN_BIT_ADDRESS, MAX_TEN_BIT_ADDRESS};
pub use config::I2cConfig;
pub use error::{I2cError, Result};
pub use funcs::Functionality;
pub use message::Message;
