use std::path::Path;
use std::time::Duration;

use periprims_i2c::{I2c, I2cConfig};
use periprims_ioctl::DeviceNode;
use serde::Serialize;
use tracing::debug;

use crate::cmd::{I2cBusArgs, I2cCommand, I2cReadArgs, I2cTargetArgs, I2cWriteArgs};
use crate::exit::{i2c_error, CliResult, SUCCESS};
use crate::output::{print_transfer, OutputFormat, TransferReport};

pub fn run(command: I2cCommand, format: OutputFormat, device_root: &Path) -> CliResult<i32> {
    match command {
        I2cCommand::Read(args) => read(args, format, device_root),
        I2cCommand::Write(args) => write(args, format, device_root),
        I2cCommand::Funcs(args) => funcs(args, format, device_root),
    }
}

fn config(device_root: &Path, target: Option<&I2cTargetArgs>) -> I2cConfig {
    let mut config = I2cConfig {
        device_root: device_root.to_path_buf(),
        ..I2cConfig::default()
    };
    if let Some(target) = target {
        if let Some(retries) = target.retries {
            config.retries = retries;
        }
        if let Some(ms) = target.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
    }
    config
}

fn open(bus: &I2cBusArgs, config: &I2cConfig) -> CliResult<I2c<DeviceNode>> {
    I2c::open_with(bus.bus, config)
        .map_err(|err| i2c_error(&format!("open i2c bus {}", bus.bus), err))
}

/// Open the bus and point it at the target address.
fn open_target(target: &I2cTargetArgs, device_root: &Path) -> CliResult<I2c<DeviceNode>> {
    let config = config(device_root, Some(target));
    let mut bus = open(&target.bus, &config)?;
    let context = format!("select address {:#04x}", target.addr);
    if target.ten_bit {
        bus.set_ten_bit(true).map_err(|err| i2c_error(&context, err))?;
    }
    bus.set_address(target.addr)
        .map_err(|err| i2c_error(&context, err))?;
    if target.force {
        bus.claim(true).map_err(|err| i2c_error(&context, err))?;
    }
    debug!(bus = target.bus.bus, address = target.addr, "i2c target selected");
    Ok(bus)
}

fn report(
    target: &I2cTargetArgs,
    device_root: &Path,
    operation: &'static str,
    reg: u8,
    count: usize,
    data: Vec<u8>,
) -> TransferReport {
    let device = config(device_root, None).node_path(target.bus.bus);
    let mut report = TransferReport::new(device.display().to_string(), operation, count, data);
    report.address = Some(target.addr);
    report.register = Some(reg);
    report
}

fn read(args: I2cReadArgs, format: OutputFormat, device_root: &Path) -> CliResult<i32> {
    let mut bus = open_target(&args.target, device_root)?;
    let mut buf = vec![0u8; args.len];
    bus.read(args.reg, &mut buf)
        .map_err(|err| i2c_error(&format!("read register {:#04x}", args.reg), err))?;

    let count = buf.len();
    let report = report(&args.target, device_root, "read", args.reg, count, buf);
    print_transfer(&report, format);
    Ok(SUCCESS)
}

fn write(args: I2cWriteArgs, format: OutputFormat, device_root: &Path) -> CliResult<i32> {
    let mut bus = open_target(&args.target, device_root)?;
    bus.write(args.reg, &args.data)
        .map_err(|err| i2c_error(&format!("write register {:#04x}", args.reg), err))?;

    let count = args.data.len();
    let report = report(&args.target, device_root, "write", args.reg, count, Vec::new());
    print_transfer(&report, format);
    Ok(SUCCESS)
}

#[derive(Debug, Serialize)]
struct FuncsOutput {
    device: String,
    mask: u32,
    functions: Vec<&'static str>,
}

fn funcs(args: I2cBusArgs, format: OutputFormat, device_root: &Path) -> CliResult<i32> {
    let config = config(device_root, None);
    let bus = open(&args, &config)?;
    let funcs = bus.functionality();
    let output = FuncsOutput {
        device: config.node_path(args.bus).display().to_string(),
        mask: funcs.bits(),
        functions: funcs.names(),
    };

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&output).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{} functionality {:#010x}\n", output.device, output.mask);
            for name in &output.functions {
                println!("  {name}");
            }
        }
        OutputFormat::Raw => println!("{:#010x}", output.mask),
    }
    Ok(SUCCESS)
}
