use std::path::PathBuf;
use std::time::Duration;

use crate::mode::SpiMode;
use crate::table::SpiDeviceId;

/// Default clock speed: 100 kHz.
pub const DEFAULT_SPEED_HZ: u32 = 100_000;

/// Default word size.
pub const DEFAULT_BITS_PER_WORD: u8 = 8;

/// Controller settings applied when a SPI handle is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiConfig {
    /// Directory holding the `spidev<bus>.<cs>` nodes.
    pub device_root: PathBuf,
    /// Clock speed in Hz.
    pub speed_hz: u32,
    /// Bits per word.
    pub bits_per_word: u8,
    /// Clock mode and line flags.
    pub mode: SpiMode,
    /// Delay after each transfer before chip-select is released.
    pub delay: Duration,
}

impl SpiConfig {
    /// Path of the device node for `id`.
    pub fn node_path(&self, id: SpiDeviceId) -> PathBuf {
        self.device_root.join(id.node_name())
    }
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            device_root: PathBuf::from("/dev"),
            speed_hz: DEFAULT_SPEED_HZ,
            bits_per_word: DEFAULT_BITS_PER_WORD,
            mode: SpiMode::MODE_0,
            delay: Duration::ZERO,
        }
    }
}
