//! SPI transfers over the Linux spidev interface.
//!
//! Every operation, full-duplex or half-duplex, is one transfer record
//! submitted through the same request, so chip-select is asserted for the
//! whole record and released afterwards, and the handle's clock speed,
//! word size and delay always apply.

pub mod codec;
pub mod config;
pub mod device;
pub mod error;
pub mod mode;
pub mod table;

pub use config::SpiConfig;
pub use device::Spi;
pub use error::{Result, SpiError};
pub use mode::SpiMode;
pub use table::{SpiDeviceId, SpiDeviceTable};
