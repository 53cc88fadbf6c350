use std::path::Path;

use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod doctor;
pub mod envinfo;
pub mod i2c;
pub mod spi;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// I2C register access.
    #[command(subcommand)]
    I2c(I2cCommand),
    /// SPI transfers.
    #[command(subcommand)]
    Spi(SpiCommand),
    /// Show version information.
    Version(VersionArgs),
    /// Check device nodes and access rights.
    Doctor(DoctorArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat, device_root: &Path) -> CliResult<i32> {
    match command {
        Command::I2c(command) => i2c::run(command, format, device_root),
        Command::Spi(command) => spi::run(command, format, device_root),
        Command::Version(args) => version::run(args),
        Command::Doctor(args) => doctor::run(args, format, device_root),
        Command::Envinfo(args) => envinfo::run(args, format, device_root),
    }
}

#[derive(Subcommand, Debug)]
pub enum I2cCommand {
    /// Read consecutive registers.
    Read(I2cReadArgs),
    /// Write bytes starting at a register.
    Write(I2cWriteArgs),
    /// List the adapter's capabilities.
    Funcs(I2cBusArgs),
}

#[derive(Args, Debug)]
pub struct I2cBusArgs {
    /// Bus number (the N in /dev/i2c-N).
    #[arg(long, short = 'b')]
    pub bus: u32,
}

#[derive(Args, Debug)]
pub struct I2cTargetArgs {
    #[command(flatten)]
    pub bus: I2cBusArgs,
    /// Target address (decimal or 0x-prefixed hex).
    #[arg(long, short = 'a', value_parser = parse_u16)]
    pub addr: u16,
    /// Use ten-bit addressing.
    #[arg(long)]
    pub ten_bit: bool,
    /// Bind the address even if a kernel driver owns it.
    #[arg(long)]
    pub force: bool,
    /// Per-message retries.
    #[arg(long)]
    pub retries: Option<u32>,
    /// Adapter timeout in milliseconds.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

#[derive(Args, Debug)]
pub struct I2cReadArgs {
    #[command(flatten)]
    pub target: I2cTargetArgs,
    /// First register to read.
    #[arg(long, short = 'r', value_parser = parse_u8)]
    pub reg: u8,
    /// Number of bytes to read.
    #[arg(long, short = 'n', default_value = "1")]
    pub len: usize,
}

#[derive(Args, Debug)]
pub struct I2cWriteArgs {
    #[command(flatten)]
    pub target: I2cTargetArgs,
    /// First register to write.
    #[arg(long, short = 'r', value_parser = parse_u8)]
    pub reg: u8,
    /// Bytes to write (comma-separated).
    #[arg(long, short = 'd', value_delimiter = ',', value_parser = parse_u8, required = true)]
    pub data: Vec<u8>,
}

#[derive(Subcommand, Debug)]
pub enum SpiCommand {
    /// Full-duplex transfer; prints the bytes received.
    Xfer(SpiDataArgs),
    /// Half-duplex write.
    Write(SpiDataArgs),
    /// Half-duplex read.
    Read(SpiReadArgs),
}

#[derive(Args, Debug)]
pub struct SpiDeviceArgs {
    /// Index into the device table (0 = spidev0.0, 1 = spidev0.1, ...).
    #[arg(long, short = 'u', default_value = "0")]
    pub unit: usize,
    /// Clock speed in Hz.
    #[arg(long)]
    pub speed: Option<u32>,
    /// Bits per word.
    #[arg(long)]
    pub bits: Option<u8>,
    /// Clock mode 0-3.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub mode: Option<u8>,
}

#[derive(Args, Debug)]
pub struct SpiDataArgs {
    #[command(flatten)]
    pub device: SpiDeviceArgs,
    /// Bytes to send (comma-separated).
    #[arg(long, short = 'd', value_delimiter = ',', value_parser = parse_u8, required = true)]
    pub data: Vec<u8>,
}

#[derive(Args, Debug)]
pub struct SpiReadArgs {
    #[command(flatten)]
    pub device: SpiDeviceArgs,
    /// Number of bytes to read.
    #[arg(long, short = 'n')]
    pub len: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}

fn parse_number(value: &str) -> Result<u64, String> {
    let value = value.trim();
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid number {value:?}: {e}"))
}

pub fn parse_u8(value: &str) -> Result<u8, String> {
    let n = parse_number(value)?;
    u8::try_from(n).map_err(|_| format!("{value} does not fit in a byte"))
}

pub fn parse_u16(value: &str) -> Result<u16, String> {
    let n = parse_number(value)?;
    u16::try_from(n).map_err(|_| format!("{value} does not fit in 16 bits"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_accept_hex_and_decimal() {
        assert_eq!(parse_u8("0x2E"), Ok(0x2E));
        assert_eq!(parse_u8("46"), Ok(46));
        assert_eq!(parse_u16("0X3ff"), Ok(0x3FF));
        assert!(parse_u8("0x100").is_err());
        assert!(parse_u8("zz").is_err());
    }
}
