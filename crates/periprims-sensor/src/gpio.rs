use std::io;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Which level transitions wake a blocked read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    None,
    Rising,
    Falling,
    Both,
}

/// Errors reported by a [`SensePin`].
#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    /// No armed edge arrived within the timeout.
    #[error("no edge within {0:?}")]
    Timeout(Duration),

    #[error("gpio I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The pin operations the proximity driver needs.
///
/// Implementations wrap whatever GPIO access the host offers (sysfs,
/// character device, memory-mapped registers).
pub trait SensePin {
    fn set_direction(&mut self, direction: Direction) -> Result<(), GpioError>;

    /// Drive the pin. Only meaningful while it is an output.
    fn set_level(&mut self, level: Level) -> Result<(), GpioError>;

    /// Arm edge detection for [`get_timeout`](SensePin::get_timeout).
    fn set_edge(&mut self, edge: Edge) -> Result<(), GpioError>;

    /// Current level, without waiting.
    fn get(&mut self) -> Result<Level, GpioError>;

    /// Block until an armed edge arrives or `timeout` passes, then return the
    /// level. Fails with [`GpioError::Timeout`] when no edge arrived.
    fn get_timeout(&mut self, timeout: Duration) -> Result<Level, GpioError>;
}
