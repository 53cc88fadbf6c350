use std::path::PathBuf;
use std::time::Duration;

/// Default number of times the adapter retries a message that was not
/// acknowledged.
pub const DEFAULT_RETRIES: u32 = 3;

/// Default adapter timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(50);

/// Controls how an I2C handle is opened and what bus-level retry policy the
/// adapter applies beneath every transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cConfig {
    /// Directory holding the `i2c-<bus>` nodes.
    pub device_root: PathBuf,
    /// Adapter retry count applied to every message.
    pub retries: u32,
    /// Adapter timeout, rounded up to the nearest 10 ms on the wire.
    pub timeout: Duration,
}

impl I2cConfig {
    /// Path of the device node for `bus`.
    pub fn node_path(&self, bus: u32) -> PathBuf {
        self.device_root.join(format!("i2c-{bus}"))
    }
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            device_root: PathBuf::from("/dev"),
            retries: DEFAULT_RETRIES,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
