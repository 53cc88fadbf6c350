//! Request codes and fixed-layout descriptors of the i2c-dev interface.
//!
//! A combined transaction is passed to the driver as:
//!
//! ```text
//! transaction: ┌──────────────┬──────────────┐
//!              │ msgs pointer │ nmsgs (u32)  │
//!              └──────┬───────┴──────────────┘
//!                     ▼
//! msgs[i]:     ┌──────────┬───────────┬──────────┬───────────┬──────────────┐
//!              │ addr u16 │ flags u16 │ len u16  │ reserved  │ buf pointer  │
//!              └──────────┴───────────┴──────────┴───────────┴──────────────┘
//! ```

use std::marker::PhantomData;

use periprims_ioctl::RequestCode;

use crate::error::{I2cError, Result};
use crate::message::Message;

const SUBSYSTEM: u8 = 0x07;

/// Set the number of times a message is retried.
pub const I2C_RETRIES: RequestCode = RequestCode::none(SUBSYSTEM, 0x01);
/// Set the adapter timeout, in units of 10 ms.
pub const I2C_TIMEOUT: RequestCode = RequestCode::none(SUBSYSTEM, 0x02);
/// Bind the handle to a target address.
pub const I2C_SLAVE: RequestCode = RequestCode::none(SUBSYSTEM, 0x03);
/// Enable or disable ten-bit addressing.
pub const I2C_TENBIT: RequestCode = RequestCode::none(SUBSYSTEM, 0x04);
/// Query the adapter functionality mask.
pub const I2C_FUNCS: RequestCode = RequestCode::none(SUBSYSTEM, 0x05);
/// Bind to a target address even if a kernel driver owns it.
pub const I2C_SLAVE_FORCE: RequestCode = RequestCode::none(SUBSYSTEM, 0x06);
/// Submit a combined transaction.
pub const I2C_RDWR: RequestCode = RequestCode::none(SUBSYSTEM, 0x07);

/// Maximum number of messages in one transaction.
pub const MAX_MESSAGES: usize = 42;

/// Largest 7-bit target address.
pub const MAX_SEVEN_BIT_ADDRESS: u16 = (1 << 7) - 1;

/// Largest 10-bit target address.
pub const MAX_TEN_BIT_ADDRESS: u16 = (1 << 10) - 1;

/// Descriptor flag: the message reads from the target.
pub const FLAG_READ: u16 = 0x0001;

/// Descriptor flag: the address is a ten-bit address.
pub const FLAG_TEN_BIT: u16 = 0x0010;

/// Per-message descriptor (`struct i2c_msg`).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawMessage {
    pub(crate) addr: u16,
    pub(crate) flags: u16,
    pub(crate) len: u16,
    _reserved: u16,
    pub(crate) buf: *mut u8,
}

/// Combined-transaction descriptor (`struct i2c_rdwr_ioctl_data`).
#[repr(C)]
#[derive(Debug)]
pub(crate) struct RawTransaction {
    pub(crate) msgs: *mut RawMessage,
    pub(crate) nmsgs: u32,
}

/// Descriptors for one transaction.
///
/// Holds the mutable borrow of the messages for as long as it lives, so the
/// buffers the descriptors point into cannot be moved, resized or touched
/// until the request is done.
pub(crate) struct Marshaled<'a> {
    descriptors: Vec<RawMessage>,
    _buffers: PhantomData<&'a mut [u8]>,
}

impl Marshaled<'_> {
    /// The top-level descriptor pointing at the packed message array.
    pub(crate) fn transaction(&mut self) -> RawTransaction {
        RawTransaction {
            msgs: self.descriptors.as_mut_ptr(),
            nmsgs: self.descriptors.len() as u32,
        }
    }

    #[cfg(test)]
    pub(crate) fn descriptors(&self) -> &[RawMessage] {
        &self.descriptors
    }
}

/// Check a transaction before it reaches the bus.
///
/// `ten_bit_enabled` is the addressing mode of the handle; a message may only
/// carry a ten-bit address when it is on.
pub fn validate(messages: &[Message<'_>], ten_bit_enabled: bool) -> Result<()> {
    if messages.is_empty() {
        return Err(I2cError::EmptyTransaction);
    }
    if messages.len() > MAX_MESSAGES {
        return Err(I2cError::TooManyMessages {
            count: messages.len(),
            max: MAX_MESSAGES,
        });
    }

    for (index, msg) in messages.iter().enumerate() {
        if msg.is_ten_bit() && !ten_bit_enabled {
            return Err(I2cError::TenBitDisabled { index });
        }
        check_address(msg.address(), msg.is_ten_bit())?;
        if msg.is_empty() {
            return Err(I2cError::EmptyBuffer { index });
        }
        if msg.len() > u16::MAX as usize {
            return Err(I2cError::BufferTooLong {
                index,
                len: msg.len(),
                max: u16::MAX as usize,
            });
        }
    }

    Ok(())
}

/// Check that `address` fits the addressing width.
pub fn check_address(address: u16, ten_bit: bool) -> Result<()> {
    let (max, bits) = if ten_bit {
        (MAX_TEN_BIT_ADDRESS, 10)
    } else {
        (MAX_SEVEN_BIT_ADDRESS, 7)
    };
    if address > max {
        return Err(I2cError::AddressOutOfRange { address, bits });
    }
    Ok(())
}

/// Build the packed descriptor array for validated messages.
pub(crate) fn marshal<'a>(messages: &'a mut [Message<'_>]) -> Marshaled<'a> {
    let descriptors = messages
        .iter_mut()
        .map(|msg| {
            let mut flags = 0;
            if msg.is_read() {
                flags |= FLAG_READ;
            }
            if msg.is_ten_bit() {
                flags |= FLAG_TEN_BIT;
            }
            RawMessage {
                addr: msg.address(),
                flags,
                len: msg.len() as u16,
                _reserved: 0,
                buf: msg.buffer_ptr(),
            }
        })
        .collect();

    Marshaled {
        descriptors,
        _buffers: PhantomData,
    }
}

#[cfg(test)]
mod tests {
    use std::mem::{offset_of, size_of};

    use super::*;

    #[test]
    fn request_codes_match_i2c_dev() {
        assert_eq!(I2C_RETRIES.raw(), 0x0701);
        assert_eq!(I2C_TIMEOUT.raw(), 0x0702);
        assert_eq!(I2C_SLAVE.raw(), 0x0703);
        assert_eq!(I2C_TENBIT.raw(), 0x0704);
        assert_eq!(I2C_FUNCS.raw(), 0x0705);
        assert_eq!(I2C_SLAVE_FORCE.raw(), 0x0706);
        assert_eq!(I2C_RDWR.raw(), 0x0707);
    }

    #[test]
    fn descriptor_layout() {
        assert_eq!(offset_of!(RawMessage, addr), 0);
        assert_eq!(offset_of!(RawMessage, flags), 2);
        assert_eq!(offset_of!(RawMessage, len), 4);
        assert_eq!(offset_of!(RawMessage, buf), 8);
        assert_eq!(size_of::<RawMessage>(), 8 + size_of::<*mut u8>());
        assert_eq!(offset_of!(RawTransaction, nmsgs), size_of::<*mut u8>());
    }

    #[test]
    fn empty_transaction_is_rejected() {
        let result = validate(&[], false);
        assert!(matches!(result, Err(I2cError::EmptyTransaction)));
    }

    #[test]
    fn message_count_limit() {
        let data = [0u8; 1];
        let mut messages: Vec<Message<'_>> =
            (0..MAX_MESSAGES).map(|_| Message::write(0x10, &data)).collect();
        assert!(validate(&messages, false).is_ok());

        messages.push(Message::write(0x10, &data));
        assert!(matches!(
            validate(&messages, false),
            Err(I2cError::TooManyMessages { count: 43, max: 42 })
        ));
    }

    #[test]
    fn seven_bit_address_bounds() {
        assert!(check_address(127, false).is_ok());
        assert!(matches!(
            check_address(128, false),
            Err(I2cError::AddressOutOfRange { address: 128, bits: 7 })
        ));
    }

    #[test]
    fn ten_bit_address_bounds() {
        assert!(check_address(1023, true).is_ok());
        assert!(matches!(
            check_address(1024, true),
            Err(I2cError::AddressOutOfRange { address: 1024, bits: 10 })
        ));
    }

    #[test]
    fn ten_bit_message_requires_ten_bit_mode() {
        let data = [1u8];
        let messages = [Message::write(0x200, &data).ten_bit(true)];
        assert!(matches!(
            validate(&messages, false),
            Err(I2cError::TenBitDisabled { index: 0 })
        ));
        assert!(validate(&messages, true).is_ok());
    }

    #[test]
    fn empty_buffer_is_rejected() {
        let data = [1u8];
        let messages = [Message::write(0x10, &data), Message::write(0x10, &[])];
        assert!(matches!(
            validate(&messages, false),
            Err(I2cError::EmptyBuffer { index: 1 })
        ));
    }

    #[test]
    fn oversized_buffer_is_rejected() {
        let data = vec![0u8; u16::MAX as usize + 1];
        let messages = [Message::write(0x10, &data)];
        assert!(matches!(
            validate(&messages, false),
            Err(I2cError::BufferTooLong { index: 0, .. })
        ));
    }

    #[test]
    fn marshal_sets_flags_lengths_and_pointers() {
        let reg = [0xF6];
        let mut buf = [0u8; 3];
        let buf_ptr = buf.as_mut_ptr();
        let mut messages = [
            Message::write(0x77, &reg),
            Message::read(0x2A0, &mut buf).ten_bit(true),
        ];

        let mut marshaled = marshal(&mut messages);
        let descriptors = marshaled.descriptors().to_vec();
        assert_eq!(descriptors.len(), 2);

        assert_eq!(descriptors[0].addr, 0x77);
        assert_eq!(descriptors[0].flags, 0);
        assert_eq!(descriptors[0].len, 1);
        assert_eq!(descriptors[0].buf.cast_const(), reg.as_ptr());

        assert_eq!(descriptors[1].addr, 0x2A0);
        assert_eq!(descriptors[1].flags, FLAG_READ | FLAG_TEN_BIT);
        assert_eq!(descriptors[1].len, 3);
        assert_eq!(descriptors[1].buf, buf_ptr);

        let txn = marshaled.transaction();
        assert_eq!(txn.nmsgs, 2);
    }
}
