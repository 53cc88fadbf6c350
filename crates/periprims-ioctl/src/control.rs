use crate::error::Result;
use crate::request::RequestCode;

/// A connection that accepts device control requests.
///
/// This is the seam between the bus layers and the host: [`DeviceNode`]
/// implements it with `ioctl(2)`, tests implement it with mocks that decode
/// the marshaled payloads.
///
/// [`DeviceNode`]: crate::DeviceNode
pub trait Control {
    /// Issue `code` with `arg` as its argument and return the driver's
    /// non-negative result.
    ///
    /// # Safety
    ///
    /// When `code` carries a payload, `arg` must be the address of memory laid
    /// out as the driver expects for that code, valid for reads and writes of
    /// [`RequestCode::size`] bytes, and every buffer address embedded in that
    /// payload must stay valid for its declared length until this call
    /// returns. For value requests `arg` is passed through unchanged.
    unsafe fn control(&mut self, code: RequestCode, arg: usize) -> Result<i32>;

    /// Release the connection. Further requests fail with
    /// [`DeviceError::Closed`](crate::DeviceError::Closed).
    fn close(&mut self);

    /// Whether [`close`](Control::close) has been called.
    fn is_closed(&self) -> bool;
}

impl<C: Control + ?Sized> Control for &mut C {
    unsafe fn control(&mut self, code: RequestCode, arg: usize) -> Result<i32> {
        // SAFETY: forwarded verbatim; the caller upholds the contract.
        unsafe { (**self).control(code, arg) }
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
