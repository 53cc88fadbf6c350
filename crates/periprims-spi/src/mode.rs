//! Controller mode flags.

bitflags::bitflags! {
    /// Clock polarity/phase and line options of a SPI device.
    ///
    /// The low two bits select one of the four clock modes; the rest are
    /// independent flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpiMode: u32 {
        /// Sample on the trailing clock edge.
        const CPHA = 0x01;
        /// Clock idles high.
        const CPOL = 0x02;
        /// Chip-select is active high.
        const CS_HIGH = 0x04;
        /// Words are sent least significant bit first.
        const LSB_FIRST = 0x08;
        /// Transmit is looped back to receive inside the controller.
        const LOOP = 0x20;
        /// No chip-select line is driven.
        const NO_CS = 0x40;
        /// The device pulls a ready line low to pause the transfer.
        const READY = 0x80;
    }
}

impl SpiMode {
    pub const MODE_0: Self = Self::empty();
    pub const MODE_1: Self = Self::CPHA;
    pub const MODE_2: Self = Self::CPOL;
    pub const MODE_3: Self = Self::CPHA.union(Self::CPOL);

    /// Clock mode 0-3 for polarity/phase, with no other flags.
    pub fn from_clock_mode(mode: u8) -> Option<Self> {
        match mode {
            0 => Some(Self::MODE_0),
            1 => Some(Self::MODE_1),
            2 => Some(Self::MODE_2),
            3 => Some(Self::MODE_3),
            _ => None,
        }
    }

    /// The clock mode 0-3 encoded in the polarity/phase bits.
    pub fn clock_mode(&self) -> u8 {
        (self.bits() & 0x03) as u8
    }
}

impl Default for SpiMode {
    fn default() -> Self {
        Self::MODE_0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_modes_occupy_low_bits() {
        for mode in 0..4u8 {
            let flags = SpiMode::from_clock_mode(mode).unwrap();
            assert_eq!(flags.bits(), mode as u32);
            assert_eq!(flags.clock_mode(), mode);
        }
        assert!(SpiMode::from_clock_mode(4).is_none());
    }

    #[test]
    fn flags_are_independent() {
        let mode = SpiMode::MODE_3 | SpiMode::CS_HIGH | SpiMode::LOOP;
        assert_eq!(mode.bits(), 0x27);
        assert_eq!(mode.clock_mode(), 3);
        assert_eq!((mode - SpiMode::LOOP).bits(), 0x07);
    }
}
