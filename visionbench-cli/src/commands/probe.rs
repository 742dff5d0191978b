// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `vbench probe` command - Show the host and its acceleration backends.

use visionbench_core::{EnvironmentProbe, EnvironmentReport};

pub async fn execute(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!("Probing environment");

    let report = tokio::task::spawn_blocking(EnvironmentProbe::run).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &EnvironmentReport) {
    let system = &report.system;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                    VISIONBENCH ENVIRONMENT                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("Host:     {}", system.hostname);
    println!("OS:       {} {}", system.os, system.os_version);
    if let Some(kernel) = &system.kernel_version {
        println!("Kernel:   {}", kernel);
    }
    println!("CPU:      {} ({} cores)", system.cpu_model, system.cpu_cores);
    println!(
        "Memory:   {:.1} GiB",
        system.memory_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    );
    println!("Device:   {}", report.device_name());
    println!();
    println!("Backends:");
    for backend in &report.accelerators {
        let mark = if backend.available { "✓" } else { "✗" };
        let version = backend.version.as_deref().unwrap_or("-");
        match &backend.detail {
            Some(detail) => println!("  {} {:<14} {:<12} {}", mark, backend.name, version, detail),
            None => println!("  {} {:<14} {}", mark, backend.name, version),
        }
    }
}
