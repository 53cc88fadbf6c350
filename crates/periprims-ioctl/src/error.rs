use std::path::PathBuf;

use crate::request::RequestCode;

/// Errors that can occur while opening or controlling a device node.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The device node could not be opened (missing node, permissions).
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The driver rejected a control request.
    #[error("control request {code} failed: {source}")]
    Control {
        code: RequestCode,
        source: std::io::Error,
    },

    /// The handle was closed before the operation was issued.
    #[error("device handle is closed")]
    Closed,
}

impl DeviceError {
    /// The native error number reported by the host, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            DeviceError::Open { source, .. } | DeviceError::Control { source, .. } => {
                source.raw_os_error()
            }
            DeviceError::Closed => None,
        }
    }

    /// The I/O error kind behind this error.
    pub fn kind(&self) -> std::io::ErrorKind {
        match self {
            DeviceError::Open { source, .. } | DeviceError::Control { source, .. } => {
                source.kind()
            }
            DeviceError::Closed => std::io::ErrorKind::NotConnected,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;

#[cfg(test)]
mod tests {
    use super::*;

    const ENXIO: i32 = 6;

    #[test]
    fn control_error_exposes_errno() {
        let err = DeviceError::Control {
            code: RequestCode::none(0x07, 0x07),
            source: std::io::Error::from_raw_os_error(ENXIO),
        };
        assert_eq!(err.raw_os_error(), Some(ENXIO));
        assert!(err.to_string().contains("0x00000707"));
    }

    #[test]
    fn closed_has_no_errno() {
        assert_eq!(DeviceError::Closed.raw_os_error(), None);
        assert_eq!(DeviceError::Closed.kind(), std::io::ErrorKind::NotConnected);
    }
}
