//! Control request code encoding.
//!
//! Codes follow the Linux `_IOC` convention:
//!
//! ```text
//! ┌───────────┬──────────────┬────────────┬────────────┐
//! │ Direction │ Payload size │ Subsystem  │ Command    │
//! │ bits 31-30│ bits 29-16   │ bits 15-8  │ bits 7-0   │
//! └───────────┴──────────────┴────────────┴────────────┘
//! ```

use std::fmt;

const COMMAND_SHIFT: u32 = 0;
const SUBSYSTEM_SHIFT: u32 = 8;
const SIZE_SHIFT: u32 = 16;
const DIRECTION_SHIFT: u32 = 30;

const SIZE_BITS: u32 = 14;

/// Largest payload size a request code can describe.
pub const MAX_PAYLOAD_SIZE: usize = (1 << SIZE_BITS) - 1;

/// Data direction of a control request, seen from user space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// No payload is transferred (the argument is passed by value).
    None,
    /// The driver writes into the payload.
    Read,
    /// The driver reads from the payload.
    Write,
    /// The payload is read and then written back.
    ReadWrite,
}

impl Direction {
    const fn bits(self) -> u32 {
        match self {
            Direction::None => 0,
            Direction::Write => 1,
            Direction::Read => 2,
            Direction::ReadWrite => 3,
        }
    }

    const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Direction::None,
            1 => Direction::Write,
            2 => Direction::Read,
            _ => Direction::ReadWrite,
        }
    }
}

/// Numeric code identifying one device control operation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestCode(u32);

impl RequestCode {
    /// Encode a request code.
    ///
    /// # Panics
    ///
    /// Panics if `size` exceeds [`MAX_PAYLOAD_SIZE`]; at compile time when
    /// used in a `const` item.
    pub const fn new(direction: Direction, subsystem: u8, command: u8, size: usize) -> Self {
        assert!(size <= MAX_PAYLOAD_SIZE, "payload size does not fit a request code");
        Self(
            (direction.bits() << DIRECTION_SHIFT)
                | ((size as u32) << SIZE_SHIFT)
                | ((subsystem as u32) << SUBSYSTEM_SHIFT)
                | ((command as u32) << COMMAND_SHIFT),
        )
    }

    /// A request whose argument is passed by value.
    pub const fn none(subsystem: u8, command: u8) -> Self {
        Self::new(Direction::None, subsystem, command, 0)
    }

    /// A request where the driver fills a payload of `size` bytes.
    pub const fn read(subsystem: u8, command: u8, size: usize) -> Self {
        Self::new(Direction::Read, subsystem, command, size)
    }

    /// A request where the driver consumes a payload of `size` bytes.
    pub const fn write(subsystem: u8, command: u8, size: usize) -> Self {
        Self::new(Direction::Write, subsystem, command, size)
    }

    /// A request where the payload travels both ways.
    pub const fn read_write(subsystem: u8, command: u8, size: usize) -> Self {
        Self::new(Direction::ReadWrite, subsystem, command, size)
    }

    /// Wrap a raw code obtained elsewhere.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw code passed to the host.
    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn direction(self) -> Direction {
        Direction::from_bits(self.0 >> DIRECTION_SHIFT)
    }

    pub const fn size(self) -> usize {
        ((self.0 >> SIZE_SHIFT) & ((1 << SIZE_BITS) - 1)) as usize
    }

    pub const fn subsystem(self) -> u8 {
        (self.0 >> SUBSYSTEM_SHIFT) as u8
    }

    pub const fn command(self) -> u8 {
        (self.0 >> COMMAND_SHIFT) as u8
    }
}

impl fmt::Display for RequestCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl fmt::Debug for RequestCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCode")
            .field("raw", &format_args!("{self}"))
            .field("direction", &self.direction())
            .field("subsystem", &self.subsystem())
            .field("command", &self.command())
            .field("size", &self.size())
            .finish()
    }
}

impl From<RequestCode> for u32 {
    fn from(code: RequestCode) -> Self {
        code.raw()
    }
}
