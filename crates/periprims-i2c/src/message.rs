/// Buffer a message transfers, borrowed from the caller for one submit.
#[derive(Debug)]
enum Payload<'a> {
    Write(&'a [u8]),
    Read(&'a mut [u8]),
}

/// One unit of an I2C transaction.
///
/// The buffer is borrowed, not copied: a read message fills the caller's
/// slice in place, a write message sends it as is.
#[derive(Debug)]
pub struct Message<'a> {
    address: u16,
    ten_bit: bool,
    payload: Payload<'a>,
}

impl<'a> Message<'a> {
    /// A message sending `data` to `address`.
    pub fn write(address: u16, data: &'a [u8]) -> Self {
        Self {
            address,
            ten_bit: false,
            payload: Payload::Write(data),
        }
    }

    /// A message reading `buf.len()` bytes from `address` into `buf`.
    pub fn read(address: u16, buf: &'a mut [u8]) -> Self {
        Self {
            address,
            ten_bit: false,
            payload: Payload::Read(buf),
        }
    }

    /// Mark the address as a ten-bit address.
    pub fn ten_bit(mut self, enabled: bool) -> Self {
        self.ten_bit = enabled;
        self
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn is_read(&self) -> bool {
        matches!(self.payload, Payload::Read(_))
    }

    pub fn is_ten_bit(&self) -> bool {
        self.ten_bit
    }

    /// Number of bytes the message transfers.
    pub fn len(&self) -> usize {
        match &self.payload {
            Payload::Write(data) => data.len(),
            Payload::Read(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Address of the first buffer byte, as the descriptor carries it.
    ///
    /// Write buffers are only ever read by the driver; the mutable cast is
    /// what the descriptor field requires.
    pub(crate) fn buffer_ptr(&mut self) -> *mut u8 {
        match &mut self.payload {
            Payload::Write(data) => data.as_ptr().cast_mut(),
            Payload::Read(buf) => buf.as_mut_ptr(),
        }
    }
}
