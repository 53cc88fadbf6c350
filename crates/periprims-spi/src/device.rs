use std::time::Duration;

#[cfg(unix)]
use periprims_ioctl::DeviceNode;
use periprims_ioctl::{Control, DeviceError, RequestCode};
use tracing::{debug, trace};

use crate::codec::{
    RawTransfer, SPI_IOC_MESSAGE_1, SPI_IOC_RD_BITS_PER_WORD, SPI_IOC_RD_LSB_FIRST,
    SPI_IOC_RD_MAX_SPEED_HZ, SPI_IOC_RD_MODE32, SPI_IOC_WR_BITS_PER_WORD, SPI_IOC_WR_LSB_FIRST,
    SPI_IOC_WR_MAX_SPEED_HZ, SPI_IOC_WR_MODE32,
};
use crate::config::SpiConfig;
use crate::error::{Result, SpiError};
use crate::mode::SpiMode;
#[cfg(unix)]
use crate::table::SpiDeviceTable;
use crate::table::SpiDeviceId;

/// One SPI device (a bus and chip-select pair).
///
/// Speed, word size and delay are kept on the handle and written into every
/// transfer record, so they apply to [`xfer`](Spi::xfer), [`write`](Spi::write)
/// and [`read`](Spi::read) alike.
pub struct Spi<D: Control> {
    device: D,
    id: SpiDeviceId,
    speed_hz: u32,
    bits_per_word: u8,
    delay_usecs: u16,
}

#[cfg(unix)]
impl Spi<DeviceNode> {
    /// Open unit `unit` of the default device table with default settings.
    pub fn open(unit: usize) -> Result<Self> {
        Self::open_with(&SpiDeviceTable::default(), unit, &SpiConfig::default())
    }

    /// Open unit `unit` of `table` and apply `config`.
    pub fn open_with(table: &SpiDeviceTable, unit: usize, config: &SpiConfig) -> Result<Self> {
        let id = table.get(unit)?;
        let device = DeviceNode::open(config.node_path(id))?;
        let spi = Self::from_device(device, id, config)?;
        debug!(unit, device = %id, speed_hz = spi.speed_hz, "opened spi device");
        Ok(spi)
    }
}

impl<D: Control> Spi<D> {
    /// Wrap an open connection and apply the speed, word size and mode from
    /// `config`.
    ///
    /// On failure the connection is dropped.
    pub fn from_device(device: D, id: SpiDeviceId, config: &SpiConfig) -> Result<Self> {
        let mut spi = Self {
            device,
            id,
            speed_hz: config.speed_hz,
            bits_per_word: config.bits_per_word,
            delay_usecs: 0,
        };
        spi.set_speed(config.speed_hz)?;
        spi.set_bits(config.bits_per_word)?;
        spi.set_mode(config.mode)?;
        spi.set_delay(config.delay)?;
        Ok(spi)
    }

    pub fn id(&self) -> SpiDeviceId {
        self.id
    }

    /// Set the clock speed in Hz.
    pub fn set_speed(&mut self, speed_hz: u32) -> Result<()> {
        let mut value = speed_hz;
        self.control_ref(SPI_IOC_WR_MAX_SPEED_HZ, &mut value)?;
        self.speed_hz = speed_hz;
        debug!(device = %self.id, speed_hz, "set spi speed");
        Ok(())
    }

    /// Clock speed currently configured in the controller.
    pub fn speed(&mut self) -> Result<u32> {
        let mut value = 0u32;
        self.control_ref(SPI_IOC_RD_MAX_SPEED_HZ, &mut value)?;
        Ok(value)
    }

    /// Set the word size, usually 8 or 9 bits.
    pub fn set_bits(&mut self, bits_per_word: u8) -> Result<()> {
        let mut value = bits_per_word;
        self.control_ref(SPI_IOC_WR_BITS_PER_WORD, &mut value)?;
        self.bits_per_word = bits_per_word;
        debug!(device = %self.id, bits_per_word, "set spi word size");
        Ok(())
    }

    /// Word size currently configured in the controller.
    pub fn bits(&mut self) -> Result<u8> {
        let mut value = 0u8;
        self.control_ref(SPI_IOC_RD_BITS_PER_WORD, &mut value)?;
        Ok(value)
    }

    /// Set the clock mode and line flags.
    pub fn set_mode(&mut self, mode: SpiMode) -> Result<()> {
        let mut value = mode.bits();
        self.control_ref(SPI_IOC_WR_MODE32, &mut value)?;
        debug!(device = %self.id, mode = value, "set spi mode");
        Ok(())
    }

    /// Mode currently configured in the controller, including flags this
    /// crate has no name for.
    pub fn mode(&mut self) -> Result<SpiMode> {
        let mut value = 0u32;
        self.control_ref(SPI_IOC_RD_MODE32, &mut value)?;
        Ok(SpiMode::from_bits_retain(value))
    }

    /// Select least-significant-bit-first word order.
    pub fn set_lsb_first(&mut self, lsb_first: bool) -> Result<()> {
        let mut value = u8::from(lsb_first);
        self.control_ref(SPI_IOC_WR_LSB_FIRST, &mut value)?;
        Ok(())
    }

    pub fn lsb_first(&mut self) -> Result<bool> {
        let mut value = 0u8;
        self.control_ref(SPI_IOC_RD_LSB_FIRST, &mut value)?;
        Ok(value != 0)
    }

    /// Set how long to wait after each transfer before releasing
    /// chip-select. Saturates at 65535 us.
    pub fn set_delay(&mut self, delay: Duration) -> Result<()> {
        if self.device.is_closed() {
            return Err(DeviceError::Closed.into());
        }
        self.delay_usecs = u16::try_from(delay.as_micros()).unwrap_or(u16::MAX);
        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_micros(u64::from(self.delay_usecs))
    }

    /// Send `tx` and return the bytes clocked in at the same time.
    ///
    /// The result always has the length of `tx`.
    pub fn xfer(&mut self, tx: &[u8]) -> Result<Vec<u8>> {
        let mut rx = vec![0u8; tx.len()];
        self.exchange(Some(tx), Some(&mut rx))?;
        Ok(rx)
    }

    /// Full-duplex transfer into a caller buffer of the same length as `tx`.
    pub fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        self.exchange(Some(tx), Some(rx))?;
        Ok(())
    }

    /// Half-duplex write; received bits are discarded.
    ///
    /// Returns the number of bytes the driver transferred.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.exchange(Some(data), None)
    }

    /// Half-duplex read; the controller clocks out idle bits.
    ///
    /// Returns the number of bytes the driver transferred.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.exchange(None, Some(buf))
    }

    /// Release the device. Further operations fail with a closed-handle error.
    pub fn close(&mut self) {
        self.device.close();
    }

    pub fn is_closed(&self) -> bool {
        self.device.is_closed()
    }

    fn exchange(&mut self, tx: Option<&[u8]>, mut rx: Option<&mut [u8]>) -> Result<usize> {
        let len = match (&tx, &rx) {
            (Some(tx), Some(rx)) if tx.len() != rx.len() => {
                return Err(SpiError::LengthMismatch {
                    tx: tx.len(),
                    rx: rx.len(),
                })
            }
            (Some(tx), _) => tx.len(),
            (None, Some(rx)) => rx.len(),
            (None, None) => 0,
        };
        if len == 0 {
            return Err(SpiError::EmptyTransfer);
        }
        let record_len = u32::try_from(len).map_err(|_| SpiError::TransferTooLong {
            len,
            max: u32::MAX as usize,
        })?;
        if self.device.is_closed() {
            return Err(DeviceError::Closed.into());
        }

        let mut record = RawTransfer {
            tx_buf: tx.map_or(0, |buf| buf.as_ptr() as u64),
            rx_buf: rx.as_deref_mut().map_or(0, |buf| buf.as_mut_ptr() as u64),
            len: record_len,
            speed_hz: self.speed_hz,
            delay_usecs: self.delay_usecs,
            bits_per_word: self.bits_per_word,
            ..RawTransfer::default()
        };

        // SAFETY: the record describes buffers borrowed for this call with
        // exactly `len` bytes each; the driver reads `tx` and writes `rx`.
        let transferred = unsafe {
            self.device
                .control(SPI_IOC_MESSAGE_1, &mut record as *mut RawTransfer as usize)?
        };
        trace!(device = %self.id, len, transferred, "spi transfer");
        Ok(transferred as usize)
    }

    /// Issue a request whose payload is a single value of type `T`.
    fn control_ref<T: Copy>(&mut self, code: RequestCode, value: &mut T) -> Result<()> {
        debug_assert_eq!(code.size(), std::mem::size_of::<T>());
        // SAFETY: every caller pairs `code` with a `T` of the size the code
        // declares; the driver reads or writes exactly that many bytes.
        unsafe {
            self.device.control(code, value as *mut T as usize)?;
        }
        Ok(())
    }
}

impl<D: Control> std::fmt::Debug for Spi<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spi")
            .field("id", &self.id)
            .field("speed_hz", &self.speed_hz)
            .field("bits_per_word", &self.bits_per_word)
            .field("delay_usecs", &self.delay_usecs)
            .field("closed", &self.device.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A transfer record as the driver saw it.
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct SeenTransfer {
        tx: Option<Vec<u8>>,
        has_rx: bool,
        len: u32,
        speed_hz: u32,
        bits_per_word: u8,
        delay_usecs: u16,
    }

    /// Stand-in controller: keeps the settings it is given and loops
    /// transmitted bytes back into the receive buffer.
    #[derive(Default)]
    struct MockController {
        speed_hz: u32,
        bits: u8,
        mode: u32,
        lsb_first: u8,
        transfers: Vec<SeenTransfer>,
        closed: bool,
    }

    impl Control for MockController {
        unsafe fn control(&mut self, code: RequestCode, arg: usize) -> periprims_ioctl::Result<i32> {
            if self.closed {
                return Err(DeviceError::Closed);
            }
            // SAFETY: the caller passes a payload laid out as `code` declares.
            unsafe {
                match code {
                    SPI_IOC_WR_MAX_SPEED_HZ => self.speed_hz = *(arg as *const u32),
                    SPI_IOC_RD_MAX_SPEED_HZ => *(arg as *mut u32) = self.speed_hz,
                    SPI_IOC_WR_BITS_PER_WORD => self.bits = *(arg as *const u8),
                    SPI_IOC_RD_BITS_PER_WORD => *(arg as *mut u8) = self.bits,
                    SPI_IOC_WR_MODE32 => self.mode = *(arg as *const u32),
                    SPI_IOC_RD_MODE32 => *(arg as *mut u32) = self.mode,
                    SPI_IOC_WR_LSB_FIRST => self.lsb_first = *(arg as *const u8),
                    SPI_IOC_RD_LSB_FIRST => *(arg as *mut u8) = self.lsb_first,
                    SPI_IOC_MESSAGE_1 => return Ok(self.transfer(&*(arg as *const RawTransfer))),
                    other => panic!("unexpected request {other}"),
                }
            }
            Ok(0)
        }

        fn close(&mut self) {
            self.closed = true;
        }

        fn is_closed(&self) -> bool {
            self.closed
        }
    }

    impl MockController {
        unsafe fn transfer(&mut self, record: &RawTransfer) -> i32 {
            let len = record.len as usize;
            let tx = (record.tx_buf != 0).then(|| {
                // SAFETY: a non-zero tx address points at `len` readable bytes.
                unsafe { std::slice::from_raw_parts(record.tx_buf as *const u8, len) }.to_vec()
            });
            if record.rx_buf != 0 {
                // SAFETY: a non-zero rx address points at `len` writable bytes.
                let rx = unsafe { std::slice::from_raw_parts_mut(record.rx_buf as *mut u8, len) };
                match &tx {
                    Some(tx) => rx.copy_from_slice(tx),
                    None => rx.fill(0x5A),
                }
            }
            self.transfers.push(SeenTransfer {
                tx,
                has_rx: record.rx_buf != 0,
                len: record.len,
                speed_hz: record.speed_hz,
                bits_per_word: record.bits_per_word,
                delay_usecs: record.delay_usecs,
            });
            record.len as i32
        }
    }

    fn open(mock: &mut MockController) -> Spi<&mut MockController> {
        Spi::from_device(mock, SpiDeviceId::new(0, 0), &SpiConfig::default()).unwrap()
    }

    #[test]
    fn construction_applies_defaults() {
        let mut mock = MockController::default();
        let mut spi = open(&mut mock);
        assert_eq!(spi.speed().unwrap(), 100_000);
        assert_eq!(spi.bits().unwrap(), 8);
        assert_eq!(spi.mode().unwrap(), SpiMode::MODE_0);
    }

    #[test]
    fn xfer_returns_buffer_of_tx_length() {
        let mut mock = MockController::default();
        let mut spi = open(&mut mock);
        for len in [1usize, 2, 38, 4096] {
            let tx: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let rx = spi.xfer(&tx).unwrap();
            assert_eq!(rx.len(), tx.len());
            assert_eq!(rx, tx);
        }
    }

    #[test]
    fn xfer_record_carries_handle_settings() {
        let mut mock = MockController::default();
        let mut spi = open(&mut mock);
        spi.set_speed(1_000_000).unwrap();
        spi.set_bits(9).unwrap();
        spi.set_delay(Duration::from_micros(15)).unwrap();
        spi.xfer(&[0x0F, 0xFF]).unwrap();
        drop(spi);

        assert_eq!(
            mock.transfers,
            vec![SeenTransfer {
                tx: Some(vec![0x0F, 0xFF]),
                has_rx: true,
                len: 2,
                speed_hz: 1_000_000,
                bits_per_word: 9,
                delay_usecs: 15,
            }]
        );
    }

    #[test]
    fn half_duplex_uses_transfer_records() {
        let mut mock = MockController::default();
        let mut spi = open(&mut mock);
        assert_eq!(spi.write(&[0x01, 0x00]).unwrap(), 2);
        let mut buf = [0u8; 3];
        assert_eq!(spi.read(&mut buf).unwrap(), 3);
        assert_eq!(buf, [0x5A; 3]);
        drop(spi);

        assert_eq!(mock.transfers.len(), 2);
        assert_eq!(mock.transfers[0].tx, Some(vec![0x01, 0x00]));
        assert!(!mock.transfers[0].has_rx);
        assert_eq!(mock.transfers[1].tx, None);
        assert!(mock.transfers[1].has_rx);
        assert!(mock.transfers.iter().all(|t| t.speed_hz == 100_000));
    }

    #[test]
    fn invalid_transfers_never_reach_the_bus() {
        let mut mock = MockController::default();
        let mut spi = open(&mut mock);
        assert!(matches!(spi.xfer(&[]), Err(SpiError::EmptyTransfer)));
        let mut rx = [0u8; 2];
        let err = spi.transfer(&[1, 2, 3], &mut rx).unwrap_err();
        assert!(matches!(err, SpiError::LengthMismatch { tx: 3, rx: 2 }));
        assert!(err.is_validation());
        drop(spi);
        assert!(mock.transfers.is_empty());
    }

    #[test]
    fn mode_flags_round_trip_through_controller() {
        let mut mock = MockController::default();
        let mut spi = open(&mut mock);
        let mode = SpiMode::MODE_3 | SpiMode::CS_HIGH | SpiMode::NO_CS;
        spi.set_mode(mode).unwrap();
        assert_eq!(spi.mode().unwrap(), mode);

        spi.set_lsb_first(true).unwrap();
        assert!(spi.lsb_first().unwrap());
    }

    #[test]
    fn delay_saturates() {
        let mut mock = MockController::default();
        let mut spi = open(&mut mock);
        spi.set_delay(Duration::from_secs(1)).unwrap();
        assert_eq!(spi.delay(), Duration::from_micros(u16::MAX as u64));
    }

    #[test]
    fn operations_after_close_fail() {
        let mut mock = MockController::default();
        let mut spi = open(&mut mock);
        spi.close();
        assert!(spi.is_closed());
        assert!(matches!(
            spi.xfer(&[1]),
            Err(SpiError::Device(DeviceError::Closed))
        ));
        assert!(matches!(
            spi.set_speed(1),
            Err(SpiError::Device(DeviceError::Closed))
        ));
        assert!(matches!(
            spi.set_delay(Duration::from_micros(5)),
            Err(SpiError::Device(DeviceError::Closed))
        ));
        assert_eq!(spi.delay(), Duration::ZERO);
    }

    #[cfg(unix)]
    #[test]
    fn unknown_unit_fails_before_opening() {
        let result = Spi::open_with(&SpiDeviceTable::default(), 5, &SpiConfig::default());
        assert!(matches!(
            result,
            Err(SpiError::UnknownUnit { unit: 5, len: 5 })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn missing_node_fails_construction() {
        let config = SpiConfig {
            device_root: std::env::temp_dir().join(format!(
                "periprims-spi-missing-{}",
                std::process::id()
            )),
            ..SpiConfig::default()
        };
        match Spi::open_with(&SpiDeviceTable::default(), 0, &config) {
            Err(SpiError::Device(err)) => assert_eq!(err.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected open failure, got {other:?}"),
        }
    }
}
