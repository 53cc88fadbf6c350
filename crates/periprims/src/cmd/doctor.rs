use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use periprims_spi::SpiDeviceTable;
use serde::Serialize;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    device_root: String,
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, format: OutputFormat, device_root: &Path) -> CliResult<i32> {
    let mut checks = vec![platform_check(), device_root_check(device_root)];

    if device_root.is_dir() {
        let i2c_nodes = i2c_nodes(device_root);
        checks.push(nodes_check("i2c_nodes", &i2c_nodes));
        checks.push(access_check("i2c_access", &i2c_nodes));

        let spi_nodes = spi_nodes(device_root);
        checks.push(nodes_check("spi_nodes", &spi_nodes));
        checks.push(access_check("spi_access", &spi_nodes));
    }

    checks.push(compiled_features_check());

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let overall = if has_fail { "fail" } else { "pass" };

    let output = DoctorOutput {
        device_root: device_root.display().to_string(),
        checks,
        overall,
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("periprims doctor ({})\n", output.device_root);
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<18} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
    }
}

fn platform_check() -> CheckResult {
    if cfg!(target_os = "linux") {
        CheckResult {
            name: "platform".to_string(),
            status: CheckStatus::Pass,
            detail: "linux i2c-dev and spidev interfaces".to_string(),
        }
    } else {
        CheckResult {
            name: "platform".to_string(),
            status: CheckStatus::Warn,
            detail: format!(
                "{} may not provide i2c-dev or spidev nodes",
                std::env::consts::OS
            ),
        }
    }
}

fn device_root_check(device_root: &Path) -> CheckResult {
    let (status, detail) = if device_root.is_dir() {
        (CheckStatus::Pass, format!("{} is a directory", device_root.display()))
    } else if device_root.exists() {
        (CheckStatus::Fail, format!("{} is not a directory", device_root.display()))
    } else {
        (CheckStatus::Fail, format!("{} does not exist", device_root.display()))
    };
    CheckResult {
        name: "device_root".to_string(),
        status,
        detail,
    }
}

/// `i2c-<n>` entries under `device_root`, sorted by bus number.
fn i2c_nodes(device_root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(device_root) else {
        return Vec::new();
    };
    let mut nodes: Vec<(u32, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            let bus = name.to_str()?.strip_prefix("i2c-")?.parse().ok()?;
            Some((bus, entry.path()))
        })
        .collect();
    nodes.sort();
    nodes.into_iter().map(|(_, path)| path).collect()
}

/// Nodes of the default SPI device table that exist under `device_root`.
fn spi_nodes(device_root: &Path) -> Vec<PathBuf> {
    SpiDeviceTable::default()
        .iter()
        .map(|id| device_root.join(id.node_name()))
        .filter(|path| path.exists())
        .collect()
}

fn nodes_check(name: &str, nodes: &[PathBuf]) -> CheckResult {
    if nodes.is_empty() {
        return CheckResult {
            name: name.to_string(),
            status: CheckStatus::Warn,
            detail: "no device nodes found".to_string(),
        };
    }
    CheckResult {
        name: name.to_string(),
        status: CheckStatus::Pass,
        detail: file_names(nodes).join(", "),
    }
}

fn access_check(name: &str, nodes: &[PathBuf]) -> CheckResult {
    if nodes.is_empty() {
        return CheckResult {
            name: name.to_string(),
            status: CheckStatus::Info,
            detail: "nothing to open".to_string(),
        };
    }

    let mut denied = Vec::new();
    let mut failed = Vec::new();
    for node in nodes {
        match OpenOptions::new().read(true).write(true).open(node) {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::PermissionDenied => denied.push(node.clone()),
            Err(err) => failed.push(format!("{}: {err}", node.display())),
        }
    }

    if !failed.is_empty() {
        CheckResult {
            name: name.to_string(),
            status: CheckStatus::Fail,
            detail: failed.join("; "),
        }
    } else if !denied.is_empty() {
        CheckResult {
            name: name.to_string(),
            status: CheckStatus::Warn,
            detail: format!("permission denied: {}", file_names(&denied).join(", ")),
        }
    } else {
        CheckResult {
            name: name.to_string(),
            status: CheckStatus::Pass,
            detail: format!("{} node(s) open read-write", nodes.len()),
        }
    }
}

fn file_names(nodes: &[PathBuf]) -> Vec<String> {
    nodes
        .iter()
        .map(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        })
        .collect()
}

fn compiled_features_check() -> CheckResult {
    let mut features = Vec::new();
    if cfg!(feature = "i2c") {
        features.push("i2c");
    }
    if cfg!(feature = "spi") {
        features.push("spi");
    }
    if cfg!(feature = "sensor") {
        features.push("sensor");
    }
    if cfg!(feature = "cli") {
        features.push("cli");
    }

    CheckResult {
        name: "compiled_features".to_string(),
        status: CheckStatus::Info,
        detail: features.join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "periprims-doctor-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[test]
    fn i2c_nodes_are_sorted_by_bus_number() {
        let dir = unique_temp_dir("i2c");
        for name in ["i2c-10", "i2c-2", "i2c-x", "spidev0.0"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }
        let names = file_names(&i2c_nodes(&dir));
        assert_eq!(names, vec!["i2c-2", "i2c-10"]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn spi_nodes_follow_device_table() {
        let dir = unique_temp_dir("spi");
        for name in ["spidev0.1", "spidev3.0"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }
        assert_eq!(file_names(&spi_nodes(&dir)), vec!["spidev0.1"]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_device_root_fails() {
        let dir = unique_temp_dir("root");
        let check = device_root_check(&dir.join("absent"));
        assert!(matches!(check.status, CheckStatus::Fail));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn doctor_output_has_overall_status() {
        let output = DoctorOutput {
            device_root: "/dev".to_string(),
            checks: vec![CheckResult {
                name: "x".to_string(),
                status: CheckStatus::Pass,
                detail: "ok".to_string(),
            }],
            overall: "pass",
        };
        let json = serde_json::to_string(&output).expect("doctor output should serialize");
        assert!(json.contains("\"overall\":\"pass\""));
    }
}
