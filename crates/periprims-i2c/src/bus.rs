use std::ffi::c_ulong;
use std::time::Duration;

use periprims_ioctl::{Control, DeviceError};
#[cfg(unix)]
use periprims_ioctl::DeviceNode;
use tracing::{debug, trace};

use crate::codec::{
    check_address, marshal, validate, I2C_FUNCS, I2C_RDWR, I2C_RETRIES, I2C_SLAVE,
    I2C_SLAVE_FORCE, I2C_TENBIT, I2C_TIMEOUT,
};
use crate::config::I2cConfig;
use crate::error::{I2cError, Result};
use crate::funcs::Functionality;
use crate::message::Message;

/// Granularity of the adapter timeout.
const TIMEOUT_QUANTUM_NS: u128 = 10_000_000;

/// One I2C bus, with a default target address for register access.
///
/// Generic over the [`Control`] connection so the transaction logic can run
/// against anything that accepts the i2c-dev requests; [`I2c::open`] uses a
/// [`DeviceNode`].
pub struct I2c<D: Control> {
    device: D,
    address: u16,
    ten_bit: bool,
    funcs: Functionality,
}

#[cfg(unix)]
impl I2c<DeviceNode> {
    /// Open `/dev/i2c-<bus>` with the default configuration.
    pub fn open(bus: u32) -> Result<Self> {
        Self::open_with(bus, &I2cConfig::default())
    }

    /// Open an I2C bus with explicit configuration.
    pub fn open_with(bus: u32, config: &I2cConfig) -> Result<Self> {
        let device = DeviceNode::open(config.node_path(bus))?;
        let i2c = Self::from_device(device, config)?;
        debug!(bus, funcs = ?i2c.funcs, "opened i2c bus");
        Ok(i2c)
    }
}

impl<D: Control> I2c<D> {
    /// Wrap an open connection: query the adapter functionality, then apply
    /// the configured timeout and retry count.
    ///
    /// On failure the connection is dropped.
    pub fn from_device(device: D, config: &I2cConfig) -> Result<Self> {
        let mut i2c = Self {
            device,
            address: 0,
            ten_bit: false,
            funcs: Functionality::empty(),
        };
        i2c.funcs = i2c.query_functionality()?;
        i2c.set_timeout(config.timeout)?;
        i2c.set_retries(config.retries)?;
        Ok(i2c)
    }

    fn query_functionality(&mut self) -> Result<Functionality> {
        let mut raw: c_ulong = 0;
        // SAFETY: I2C_FUNCS writes one unsigned long through the pointer.
        unsafe {
            self.device
                .control(I2C_FUNCS, &mut raw as *mut c_ulong as usize)?;
        }
        Ok(Functionality::from_bits_retain(raw as u32))
    }

    /// Capability flags reported by the adapter at open.
    pub fn functionality(&self) -> Functionality {
        self.funcs
    }

    /// Set the default target address used by the register helpers.
    ///
    /// The address must fit 7 bits, or 10 bits once ten-bit addressing is
    /// enabled. No bus traffic is generated.
    pub fn set_address(&mut self, address: u16) -> Result<()> {
        if self.device.is_closed() {
            return Err(DeviceError::Closed.into());
        }
        check_address(address, self.ten_bit)?;
        self.address = address;
        Ok(())
    }

    /// The default target address.
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Bind the default target at the driver level so other clients see it
    /// as busy. `force` takes it over even if a kernel driver owns it.
    pub fn claim(&mut self, force: bool) -> Result<()> {
        let code = if force { I2C_SLAVE_FORCE } else { I2C_SLAVE };
        // SAFETY: value request, the address is passed by value.
        unsafe {
            self.device.control(code, self.address as usize)?;
        }
        debug!(address = self.address, force, "claimed i2c target");
        Ok(())
    }

    /// Enable or disable ten-bit addressing.
    pub fn set_ten_bit(&mut self, enabled: bool) -> Result<()> {
        if enabled && !self.funcs.contains(Functionality::TEN_BIT_ADDR) {
            return Err(I2cError::TenBitUnsupported);
        }
        // SAFETY: value request.
        unsafe {
            self.device.control(I2C_TENBIT, usize::from(enabled))?;
        }
        self.ten_bit = enabled;
        Ok(())
    }

    pub fn ten_bit_enabled(&self) -> bool {
        self.ten_bit
    }

    /// Set how many times the adapter retries an unacknowledged message.
    pub fn set_retries(&mut self, retries: u32) -> Result<()> {
        // SAFETY: value request.
        unsafe {
            self.device.control(I2C_RETRIES, retries as usize)?;
        }
        debug!(retries, "set i2c retries");
        Ok(())
    }

    /// Set the adapter timeout, rounded up to the nearest 10 ms.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        let quanta = timeout_quanta(timeout);
        // SAFETY: value request.
        unsafe {
            self.device.control(I2C_TIMEOUT, quanta)?;
        }
        debug!(?timeout, quanta, "set i2c timeout");
        Ok(())
    }

    /// Write the register number `reg`, then read `buf.len()` bytes from the
    /// default target, as one transaction.
    pub fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<()> {
        let reg = [reg];
        let mut messages = [
            Message::write(self.address, &reg).ten_bit(self.ten_bit),
            Message::read(self.address, buf).ten_bit(self.ten_bit),
        ];
        self.submit(&mut messages)
    }

    /// Write the register number `reg` followed by `data` to the default
    /// target, as one message.
    pub fn write(&mut self, reg: u8, data: &[u8]) -> Result<()> {
        let mut payload = Vec::with_capacity(data.len() + 1);
        payload.push(reg);
        payload.extend_from_slice(data);
        let mut messages = [Message::write(self.address, &payload).ten_bit(self.ten_bit)];
        self.submit(&mut messages)
    }

    /// Read one 8-bit register.
    pub fn read_register(&mut self, reg: u8) -> Result<u8> {
        let mut value = [0u8; 1];
        self.read(reg, &mut value)?;
        Ok(value[0])
    }

    /// Write one 8-bit register.
    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<()> {
        self.write(reg, &[value])
    }

    /// Submit `messages` as one combined transaction.
    ///
    /// The whole transaction is validated before any request is issued. If
    /// the driver reports a failure, the contents of read buffers are
    /// unspecified.
    pub fn submit(&mut self, messages: &mut [Message<'_>]) -> Result<()> {
        validate(messages, self.ten_bit)?;
        if self.device.is_closed() {
            return Err(DeviceError::Closed.into());
        }

        let count = messages.len();
        let mut marshaled = marshal(messages);
        let mut txn = marshaled.transaction();
        // SAFETY: `txn` points at `count` packed descriptors owned by
        // `marshaled`, whose buffers are borrowed from `messages` with their
        // exact lengths; all of it outlives the request.
        unsafe {
            self.device.control(I2C_RDWR, &mut txn as *mut _ as usize)?;
        }
        trace!(count, "submitted i2c transaction");
        Ok(())
    }

    /// Release the bus. Further operations fail with a closed-handle error.
    pub fn close(&mut self) {
        self.device.close();
    }

    pub fn is_closed(&self) -> bool {
        self.device.is_closed()
    }
}

/// Timeout in adapter quanta, rounded up.
fn timeout_quanta(timeout: Duration) -> usize {
    let quanta = timeout.as_nanos().div_ceil(TIMEOUT_QUANTUM_NS);
    usize::try_from(quanta).unwrap_or(usize::MAX)
}

impl<D: Control> std::fmt::Debug for I2c<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I2c")
            .field("address", &self.address)
            .field("ten_bit", &self.ten_bit)
            .field("funcs", &self.funcs)
            .field("closed", &self.device.is_closed())
            .finish()
    }
}
