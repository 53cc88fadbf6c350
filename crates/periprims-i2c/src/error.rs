use periprims_ioctl::DeviceError;

/// Errors that can occur in I2C operations.
#[derive(Debug, thiserror::Error)]
pub enum I2cError {
    /// The device node could not be opened or rejected a request.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// A transaction must carry at least one message.
    #[error("transaction has no messages")]
    EmptyTransaction,

    /// The transaction exceeds the adapter's message limit.
    #[error("transaction has {count} messages, max {max}")]
    TooManyMessages { count: usize, max: usize },

    /// The target address does not fit the addressing width in use.
    #[error("address {address:#05x} does not fit {bits}-bit addressing")]
    AddressOutOfRange { address: u16, bits: u8 },

    /// A message asks for ten-bit addressing while the handle is in 7-bit mode.
    #[error("message {index} uses ten-bit addressing, which is not enabled")]
    TenBitDisabled { index: usize },

    /// A message buffer is empty.
    #[error("message {index} has an empty buffer")]
    EmptyBuffer { index: usize },

    /// A message buffer is longer than the descriptor can express.
    #[error("message {index} buffer too long ({len} bytes, max {max})")]
    BufferTooLong { index: usize, len: usize, max: usize },

    /// The adapter does not implement ten-bit addressing.
    #[error("adapter does not support ten-bit addressing")]
    TenBitUnsupported,
}

impl I2cError {
    /// True for errors detected before any request reached the bus.
    pub fn is_validation(&self) -> bool {
        !matches!(self, I2cError::Device(_) | I2cError::TenBitUnsupported)
    }
}

pub type Result<T> = std::result::Result<T, I2cError>;
