use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::cmd::EnvinfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct PlatformInfo {
    os: String,
    arch: String,
}

#[derive(Serialize)]
struct EnvInfoOutput {
    version: String,
    target: String,
    rust_version: String,
    git_hash: String,
    platform: PlatformInfo,
    device_root: String,
    features: Vec<String>,
    dependencies: BTreeMap<String, String>,
    environment: BTreeMap<String, Option<String>>,
}

pub fn run(_args: EnvinfoArgs, format: OutputFormat, device_root: &Path) -> CliResult<i32> {
    let mut deps = BTreeMap::new();
    deps.insert("bitflags".to_string(), "2".to_string());
    deps.insert("clap".to_string(), "4.5".to_string());
    deps.insert("libc".to_string(), "0.2".to_string());

    let mut env = BTreeMap::new();
    env.insert(
        "PERIPRIMS_DEVICE_ROOT".to_string(),
        std::env::var("PERIPRIMS_DEVICE_ROOT").ok(),
    );
    env.insert("RUST_LOG".to_string(), std::env::var("RUST_LOG").ok());

    let output = EnvInfoOutput {
        version: env!("CARGO_PKG_VERSION").to_string(),
        target: target_triple(),
        rust_version: option_env!("RUSTC_VERSION")
            .unwrap_or("unknown")
            .to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        platform: PlatformInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        },
        device_root: device_root.display().to_string(),
        features: active_features(),
        dependencies: deps,
        environment: env,
    };

    print_envinfo(&output, format);
    Ok(SUCCESS)
}

fn target_triple() -> String {
    if let Some(target) = option_env!("PERIPRIMS_BUILD_TARGET") {
        return target.to_string();
    }

    match (std::env::consts::ARCH, std::env::consts::OS) {
        ("aarch64", "linux") => "aarch64-unknown-linux-gnu".to_string(),
        ("arm", "linux") => "arm-unknown-linux-gnueabihf".to_string(),
        ("x86_64", "linux") => "x86_64-unknown-linux-gnu".to_string(),
        (arch, os) => format!("{arch}-unknown-{os}"),
    }
}

fn print_envinfo(output: &EnvInfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("periprims environment\n");
            println!("  Version:     {}", output.version);
            println!("  Target:      {}", output.target);
            println!("  Rust:        {}", output.rust_version);
            println!("  Git hash:    {}", output.git_hash);
            println!(
                "  Platform:    {} ({})",
                output.platform.os, output.platform.arch
            );
            println!("  Device root: {}", output.device_root);
            println!("  Features:    {}", output.features.join(", "));
            println!("\n  Dependencies:");
            for (k, v) in &output.dependencies {
                println!("    {:<12} {}", k, v);
            }
            println!("\n  Environment:");
            for (k, v) in &output.environment {
                println!("    {:<22} {}", k, v.as_deref().unwrap_or("(not set)"));
            }
        }
        OutputFormat::Raw => println!("{}", output.version),
    }
}

fn active_features() -> Vec<String> {
    let mut features = Vec::new();
    if cfg!(feature = "i2c") {
        features.push("i2c".to_string());
    }
    if cfg!(feature = "spi") {
        features.push("spi".to_string());
    }
    if cfg!(feature = "sensor") {
        features.push("sensor".to_string());
    }
    if cfg!(feature = "cli") {
        features.push("cli".to_string());
    }
    features
}
