use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Result of one bus operation.
#[derive(Debug, Serialize)]
pub struct TransferReport {
    /// Device node the operation went through.
    pub device: String,
    pub operation: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub register: Option<u8>,
    /// Bytes the driver reported as transferred.
    pub count: usize,
    /// Bytes received; empty for writes.
    pub data: Vec<u8>,
    pub hex: String,
}

impl TransferReport {
    pub fn new(device: String, operation: &'static str, count: usize, data: Vec<u8>) -> Self {
        let hex = hex_string(&data);
        Self {
            device,
            operation,
            address: None,
            register: None,
            count,
            data,
            hex,
        }
    }
}

pub fn print_transfer(report: &TransferReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DEVICE", "OP", "ADDR", "REG", "COUNT", "DATA"])
                .add_row(vec![
                    report.device.clone(),
                    report.operation.to_string(),
                    report.address.map(|a| format!("{a:#04x}")).unwrap_or_default(),
                    report.register.map(|r| format!("{r:#04x}")).unwrap_or_default(),
                    report.count.to_string(),
                    report.hex.clone(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let mut line = format!("{} {}", report.device, report.operation);
            if let Some(address) = report.address {
                line.push_str(&format!(" addr={address:#04x}"));
            }
            if let Some(register) = report.register {
                line.push_str(&format!(" reg={register:#04x}"));
            }
            line.push_str(&format!(" count={}", report.count));
            if !report.data.is_empty() {
                line.push_str(&format!(" data={}", report.hex));
            }
            println!("{line}");
        }
        OutputFormat::Raw => print_raw(&report.data),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Space-separated two-digit hex bytes.
pub fn hex_string(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_string_pads_bytes() {
        assert_eq!(hex_string(&[0x0f, 0xa5, 0x00]), "0f a5 00");
        assert_eq!(hex_string(&[]), "");
    }

    #[test]
    fn report_json_omits_missing_address() {
        let report = TransferReport::new("/dev/spidev0.0".to_string(), "xfer", 2, vec![1, 2]);
        let json = serde_json::to_string(&report).expect("report should serialize");
        assert!(!json.contains("\"address\""));
        assert!(json.contains("\"hex\":\"01 02\""));
        assert!(json.contains("\"data\":[1,2]"));
    }
}
