//! Which (bus, chip-select) pair a unit number refers to.

use std::fmt;

use crate::error::{Result, SpiError};

/// One SPI device: a bus and a chip-select line on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpiDeviceId {
    pub bus: u8,
    pub chip_select: u8,
}

impl SpiDeviceId {
    pub const fn new(bus: u8, chip_select: u8) -> Self {
        Self { bus, chip_select }
    }

    /// File name of the device node, e.g. `spidev0.1`.
    pub fn node_name(&self) -> String {
        format!("spidev{}.{}", self.bus, self.chip_select)
    }
}

impl fmt::Display for SpiDeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bus {} cs {}", self.bus, self.chip_select)
    }
}

/// Devices exposed on a typical single-board computer.
pub const DEFAULT_DEVICES: [SpiDeviceId; 5] = [
    SpiDeviceId::new(0, 0),
    SpiDeviceId::new(0, 1),
    SpiDeviceId::new(1, 0),
    SpiDeviceId::new(1, 1),
    SpiDeviceId::new(1, 2),
];

/// Immutable table mapping unit numbers to devices.
///
/// Validated on construction: non-empty, no device listed twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiDeviceTable {
    devices: Vec<SpiDeviceId>,
}

impl SpiDeviceTable {
    pub fn new(devices: impl Into<Vec<SpiDeviceId>>) -> Result<Self> {
        let devices = devices.into();
        if devices.is_empty() {
            return Err(SpiError::EmptyTable);
        }
        for (i, id) in devices.iter().enumerate() {
            if devices[..i].contains(id) {
                return Err(SpiError::DuplicateDevice(*id));
            }
        }
        Ok(Self { devices })
    }

    /// The device behind `unit`.
    pub fn get(&self, unit: usize) -> Result<SpiDeviceId> {
        self.devices
            .get(unit)
            .copied()
            .ok_or(SpiError::UnknownUnit {
                unit,
                len: self.devices.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SpiDeviceId> + '_ {
        self.devices.iter().copied()
    }
}

impl Default for SpiDeviceTable {
    fn default() -> Self {
        Self {
            devices: DEFAULT_DEVICES.to_vec(),
        }
    }
}
