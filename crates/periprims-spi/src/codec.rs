//! Request codes and the transfer record of the spidev interface.
//!
//! ```text
//! ┌─────────┬─────────┬─────┬───────┬───────┬──────┬───────────┬──────────┬──────────┬──────────┐
//! │ tx u64  │ rx u64  │ len │ speed │ delay │ bits │ cs_change │ tx_nbits │ rx_nbits │ reserved │
//! │         │         │ u32 │ u32   │ u16   │ u8   │ u8        │ u8       │ u8       │ u16      │
//! └─────────┴─────────┴─────┴───────┴───────┴──────┴───────────┴──────────┴──────────┴──────────┘
//! ```

use std::mem::size_of;

use periprims_ioctl::RequestCode;

const SUBSYSTEM: u8 = b'k';

/// Submit one transfer record.
pub const SPI_IOC_MESSAGE_1: RequestCode = RequestCode::write(SUBSYSTEM, 0, size_of::<RawTransfer>());
pub const SPI_IOC_RD_MODE: RequestCode = RequestCode::read(SUBSYSTEM, 1, size_of::<u8>());
pub const SPI_IOC_WR_MODE: RequestCode = RequestCode::write(SUBSYSTEM, 1, size_of::<u8>());
pub const SPI_IOC_RD_LSB_FIRST: RequestCode = RequestCode::read(SUBSYSTEM, 2, size_of::<u8>());
pub const SPI_IOC_WR_LSB_FIRST: RequestCode = RequestCode::write(SUBSYSTEM, 2, size_of::<u8>());
pub const SPI_IOC_RD_BITS_PER_WORD: RequestCode = RequestCode::read(SUBSYSTEM, 3, size_of::<u8>());
pub const SPI_IOC_WR_BITS_PER_WORD: RequestCode = RequestCode::write(SUBSYSTEM, 3, size_of::<u8>());
pub const SPI_IOC_RD_MAX_SPEED_HZ: RequestCode = RequestCode::read(SUBSYSTEM, 4, size_of::<u32>());
pub const SPI_IOC_WR_MAX_SPEED_HZ: RequestCode = RequestCode::write(SUBSYSTEM, 4, size_of::<u32>());
pub const SPI_IOC_RD_MODE32: RequestCode = RequestCode::read(SUBSYSTEM, 5, size_of::<u32>());
pub const SPI_IOC_WR_MODE32: RequestCode = RequestCode::write(SUBSYSTEM, 5, size_of::<u32>());

/// Transfer record (`struct spi_ioc_transfer`).
///
/// Buffer addresses travel as 64-bit integers regardless of pointer width;
/// a zero address means "no buffer" for that direction.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RawTransfer {
    pub(crate) tx_buf: u64,
    pub(crate) rx_buf: u64,
    pub(crate) len: u32,
    pub(crate) speed_hz: u32,
    pub(crate) delay_usecs: u16,
    pub(crate) bits_per_word: u8,
    pub(crate) cs_change: u8,
    pub(crate) tx_nbits: u8,
    pub(crate) rx_nbits: u8,
    pub(crate) _reserved: u16,
}

const _: () = assert!(size_of::<RawTransfer>() == 32);

#[cfg(test)]
mod tests {
    use std::mem::offset_of;

    use super::*;

    #[test]
    fn request_codes_match_spidev() {
        assert_eq!(SPI_IOC_MESSAGE_1.raw(), 0x4020_6b00);
        assert_eq!(SPI_IOC_RD_MODE.raw(), 0x8001_6b01);
        assert_eq!(SPI_IOC_WR_MODE.raw(), 0x4001_6b01);
        assert_eq!(SPI_IOC_RD_LSB_FIRST.raw(), 0x8001_6b02);
        assert_eq!(SPI_IOC_WR_LSB_FIRST.raw(), 0x4001_6b02);
        assert_eq!(SPI_IOC_RD_BITS_PER_WORD.raw(), 0x8001_6b03);
        assert_eq!(SPI_IOC_WR_BITS_PER_WORD.raw(), 0x4001_6b03);
        assert_eq!(SPI_IOC_RD_MAX_SPEED_HZ.raw(), 0x8004_6b04);
        assert_eq!(SPI_IOC_WR_MAX_SPEED_HZ.raw(), 0x4004_6b04);
        assert_eq!(SPI_IOC_RD_MODE32.raw(), 0x8004_6b05);
        assert_eq!(SPI_IOC_WR_MODE32.raw(), 0x4004_6b05);
    }

    #[test]
    fn transfer_record_layout() {
        assert_eq!(offset_of!(RawTransfer, tx_buf), 0);
        assert_eq!(offset_of!(RawTransfer, rx_buf), 8);
        assert_eq!(offset_of!(RawTransfer, len), 16);
        assert_eq!(offset_of!(RawTransfer, speed_hz), 20);
        assert_eq!(offset_of!(RawTransfer, delay_usecs), 24);
        assert_eq!(offset_of!(RawTransfer, bits_per_word), 26);
        assert_eq!(offset_of!(RawTransfer, cs_change), 27);
        assert_eq!(offset_of!(RawTransfer, tx_nbits), 28);
        assert_eq!(offset_of!(RawTransfer, rx_nbits), 29);
    }
}
