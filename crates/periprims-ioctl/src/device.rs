use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::control::Control;
use crate::error::{DeviceError, Result};
use crate::request::RequestCode;

/// An open connection to one device node (`/dev/i2c-1`, `/dev/spidev0.0`).
///
/// The node is opened read-write on construction and released by
/// [`close`](Control::close) or on drop, whichever comes first. Every request
/// issued after close fails with [`DeviceError::Closed`].
pub struct DeviceNode {
    file: Option<File>,
    path: PathBuf,
}

impl DeviceNode {
    /// Open a device node for read-write access.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| DeviceError::Open {
                path: path.clone(),
                source: e,
            })?;

        debug!(?path, "opened device node");

        Ok(Self {
            file: Some(file),
            path,
        })
    }

    /// The path this handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Control for DeviceNode {
    unsafe fn control(&mut self, code: RequestCode, arg: usize) -> Result<i32> {
        let fd = self.file.as_ref().ok_or(DeviceError::Closed)?.as_raw_fd();
        trace!(path = ?self.path, %code, "control request");

        loop {
            // SAFETY: `fd` is open for the lifetime of `self.file`; the caller
            // guarantees `arg` matches the layout `code` declares.
            let rc = unsafe { libc::ioctl(fd, code.raw() as _, arg) };
            if rc >= 0 {
                return Ok(rc);
            }

            let err = std::io::Error::last_os_error();
            if err.kind() == ErrorKind::Interrupted {
                continue;
            }
            return Err(DeviceError::Control { code, source: err });
        }
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            debug!(path = ?self.path, "closed device node");
        }
    }

    fn is_closed(&self) -> bool {
        self.file.is_none()
    }
}

impl Drop for DeviceNode {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for DeviceNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceNode")
            .field("path", &self.path)
            .field("open", &self.file.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "periprims-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[test]
    fn open_missing_node_is_not_found() {
        let dir = unique_temp_dir("missing");
        let result = DeviceNode::open(dir.join("i2c-99"));
        match result {
            Err(DeviceError::Open { source, .. }) => {
                assert_eq!(source.kind(), ErrorKind::NotFound)
            }
            other => panic!("expected open failure, got {other:?}"),
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn control_on_non_device_reports_errno() {
        let dir = unique_temp_dir("notty");
        let path = dir.join("plain");
        std::fs::write(&path, b"").unwrap();

        let mut node = DeviceNode::open(&path).unwrap();
        // SAFETY: value request, no payload is dereferenced.
        let result = unsafe { node.control(RequestCode::none(0x07, 0x01), 3) };
        match result {
            Err(err @ DeviceError::Control { .. }) => {
                assert_eq!(err.raw_os_error(), Some(libc::ENOTTY))
            }
            other => panic!("expected control failure, got {other:?}"),
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn requests_after_close_fail_deterministically() {
        let dir = unique_temp_dir("closed");
        let path = dir.join("plain");
        std::fs::write(&path, b"").unwrap();

        let mut node = DeviceNode::open(&path).unwrap();
        assert!(!node.is_closed());
        node.close();
        assert!(node.is_closed());

        for _ in 0..2 {
            // SAFETY: value request, no payload is dereferenced.
            let result = unsafe { node.control(RequestCode::none(0x07, 0x02), 5) };
            assert!(matches!(result, Err(DeviceError::Closed)));
        }

        // Closing twice is harmless.
        node.close();
        let _ = std::fs::remove_dir_all(&dir);
    }
}
