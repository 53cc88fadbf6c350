use std::path::Path;

use periprims_ioctl::DeviceNode;
use periprims_spi::{Spi, SpiConfig, SpiDeviceTable, SpiMode};

use crate::cmd::{SpiCommand, SpiDataArgs, SpiDeviceArgs, SpiReadArgs};
use crate::exit::{spi_error, CliResult, SUCCESS};
use crate::output::{print_transfer, OutputFormat, TransferReport};

pub fn run(command: SpiCommand, format: OutputFormat, device_root: &Path) -> CliResult<i32> {
    match command {
        SpiCommand::Xfer(args) => xfer(args, format, device_root),
        SpiCommand::Write(args) => write(args, format, device_root),
        SpiCommand::Read(args) => read(args, format, device_root),
    }
}

fn config(args: &SpiDeviceArgs, device_root: &Path) -> SpiConfig {
    let mut config = SpiConfig {
        device_root: device_root.to_path_buf(),
        ..SpiConfig::default()
    };
    if let Some(speed) = args.speed {
        config.speed_hz = speed;
    }
    if let Some(bits) = args.bits {
        config.bits_per_word = bits;
    }
    if let Some(mode) = args.mode.and_then(SpiMode::from_clock_mode) {
        config.mode = mode;
    }
    config
}

/// Open the device and return it with its node path.
fn open(args: &SpiDeviceArgs, device_root: &Path) -> CliResult<(Spi<DeviceNode>, String)> {
    let config = config(args, device_root);
    let spi = Spi::open_with(&SpiDeviceTable::default(), args.unit, &config)
        .map_err(|err| spi_error(&format!("open spi unit {}", args.unit), err))?;
    let device = config.node_path(spi.id()).display().to_string();
    Ok((spi, device))
}

fn xfer(args: SpiDataArgs, format: OutputFormat, device_root: &Path) -> CliResult<i32> {
    let (mut spi, device) = open(&args.device, device_root)?;
    let rx = spi
        .xfer(&args.data)
        .map_err(|err| spi_error("spi transfer", err))?;
    print_transfer(&TransferReport::new(device, "xfer", rx.len(), rx), format);
    Ok(SUCCESS)
}

fn write(args: SpiDataArgs, format: OutputFormat, device_root: &Path) -> CliResult<i32> {
    let (mut spi, device) = open(&args.device, device_root)?;
    let count = spi
        .write(&args.data)
        .map_err(|err| spi_error("spi write", err))?;
    print_transfer(&TransferReport::new(device, "write", count, Vec::new()), format);
    Ok(SUCCESS)
}

fn read(args: SpiReadArgs, format: OutputFormat, device_root: &Path) -> CliResult<i32> {
    let (mut spi, device) = open(&args.device, device_root)?;
    let mut buf = vec![0u8; args.len];
    let count = spi
        .read(&mut buf)
        .map_err(|err| spi_error("spi read", err))?;
    print_transfer(&TransferReport::new(device, "read", count, buf), format);
    Ok(SUCCESS)
}
