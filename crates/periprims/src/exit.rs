use std::fmt;
use std::io;

use periprims_i2c::I2cError;
use periprims_ioctl::DeviceError;
use periprims_spi::SpiError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_code(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        _ => FAILURE,
    }
}

pub fn device_error(context: &str, err: DeviceError) -> CliError {
    CliError::new(io_code(err.kind()), format!("{context}: {err}"))
}

pub fn i2c_error(context: &str, err: I2cError) -> CliError {
    match err {
        I2cError::Device(err) => device_error(context, err),
        other if other.is_validation() => {
            CliError::new(DATA_INVALID, format!("{context}: {other}"))
        }
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

pub fn spi_error(context: &str, err: SpiError) -> CliError {
    match err {
        SpiError::Device(err) => device_error(context, err),
        SpiError::UnknownUnit { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        other if other.is_validation() => {
            CliError::new(DATA_INVALID, format!("{context}: {other}"))
        }
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn open_error(kind: io::ErrorKind) -> DeviceError {
        DeviceError::Open {
            path: PathBuf::from("/dev/i2c-1"),
            source: io::Error::from(kind),
        }
    }

    #[test]
    fn device_errors_map_by_kind() {
        assert_eq!(device_error("x", open_error(io::ErrorKind::NotFound)).code, FAILURE);
        assert_eq!(
            device_error("x", open_error(io::ErrorKind::PermissionDenied)).code,
            PERMISSION_DENIED
        );
        assert_eq!(device_error("x", open_error(io::ErrorKind::TimedOut)).code, TIMEOUT);
        assert_eq!(device_error("x", DeviceError::Closed).code, FAILURE);
    }

    #[test]
    fn validation_errors_are_data_invalid() {
        assert_eq!(i2c_error("x", I2cError::EmptyTransaction).code, DATA_INVALID);
        assert_eq!(i2c_error("x", I2cError::TenBitUnsupported).code, FAILURE);
        assert_eq!(spi_error("x", SpiError::EmptyTransfer).code, DATA_INVALID);
        assert_eq!(
            spi_error("x", SpiError::UnknownUnit { unit: 5, len: 5 }).code,
            USAGE
        );
    }

    #[test]
    fn message_carries_context() {
        let err = i2c_error("read i2c bus 1", I2cError::EmptyTransaction);
        assert_eq!(err.to_string(), "read i2c bus 1: transaction has no messages");
    }
}
