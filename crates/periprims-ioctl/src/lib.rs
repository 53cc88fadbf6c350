//! Device control requests for Linux bus drivers.
//!
//! Provides the two primitives every bus layer builds on:
//! - [`RequestCode`], the numeric identifier of a device control operation
//! - [`DeviceNode`], an owned connection to a device node that issues them
//!
//! Bus layers are written against the [`Control`] trait so they can be
//! exercised without hardware.

pub mod control;
pub mod error;
pub mod request;

#[cfg(unix)]
pub mod device;

pub use control::Control;
pub use error::{DeviceError, Result};
pub use request::{Direction, RequestCode};

#[cfg(unix)]
pub use device::DeviceNode;
