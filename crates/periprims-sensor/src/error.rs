use std::io;
use std::time::Duration;

use crate::gpio::GpioError;

/// Errors that can occur while reading the proximity sensor.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The capacitor did not discharge within the edge timeout.
    #[error("no discharge edge within {0:?}")]
    Timeout(Duration),

    /// The pin rejected a configuration or read.
    #[error("gpio error: {0}")]
    Gpio(#[source] io::Error),

    /// Every attempt produced a reading outside the validity window.
    #[error("no reading inside the window after {attempts} attempts")]
    RetriesExceeded { attempts: u32 },

    #[error("invalid window: min {min:?} is greater than max {max:?}")]
    InvalidWindow { min: Duration, max: Duration },

    #[error("invalid thresholds: off {off:?} is greater than on {on:?}")]
    InvalidThresholds { on: Duration, off: Duration },
}

impl From<GpioError> for SensorError {
    fn from(err: GpioError) -> Self {
        match err {
            GpioError::Timeout(timeout) => SensorError::Timeout(timeout),
            GpioError::Io(source) => SensorError::Gpio(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, SensorError>;
