use periprims_ioctl::DeviceError;

use crate::table::SpiDeviceId;

/// Errors that can occur in SPI operations.
#[derive(Debug, thiserror::Error)]
pub enum SpiError {
    /// The device node could not be opened or rejected a request.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// The unit index is not in the device table.
    #[error("unknown spi unit {unit} (table has {len} entries)")]
    UnknownUnit { unit: usize, len: usize },

    /// A device table must list at least one device.
    #[error("spi device table is empty")]
    EmptyTable,

    /// A device table lists the same bus and chip-select twice.
    #[error("spi device table lists {0} more than once")]
    DuplicateDevice(SpiDeviceId),

    /// A transfer must move at least one byte.
    #[error("transfer has no data")]
    EmptyTransfer,

    /// Transmit and receive buffers of a full-duplex transfer differ in length.
    #[error("transmit buffer is {tx} bytes but receive buffer is {rx}")]
    LengthMismatch { tx: usize, rx: usize },

    /// The transfer is longer than a record can describe.
    #[error("transfer too long ({len} bytes, max {max})")]
    TransferTooLong { len: usize, max: usize },
}

impl SpiError {
    /// True for errors detected before any request reached the bus.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SpiError::EmptyTransfer | SpiError::LengthMismatch { .. } | SpiError::TransferTooLong { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SpiError>;
