// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Environment capability probing.
//!
//! Reports which acceleration backends are present on this host. The output
//! is informational and only used to annotate reports; nothing in the
//! harness depends on it.

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use sysinfo::System;

/// System information captured at benchmark time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// OS version
    pub os_version: String,
    /// Kernel version (Linux)
    pub kernel_version: Option<String>,
    /// CPU model name
    pub cpu_model: String,
    /// Number of CPU cores
    pub cpu_cores: usize,
    /// Total system memory in bytes
    pub memory_bytes: u64,
    /// Hostname
    pub hostname: String,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// Availability of one acceleration backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
    /// Human readable backend name
    pub name: String,
    /// Whether the backend looks usable
    pub available: bool,
    /// Reported version, when the tool prints one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Extra detail (device name, library path, failure reason)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl BackendStatus {
    fn missing(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            available: false,
            version: None,
            detail: Some(reason.into()),
        }
    }
}

/// Result of probing the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentReport {
    pub system: SystemInfo,
    pub accelerators: Vec<BackendStatus>,
    /// First GPU reported by the driver, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_name: Option<String>,
}

impl EnvironmentReport {
    /// Device label for report headers: the GPU if present, otherwise the CPU.
    pub fn device_name(&self) -> String {
        self.gpu_name
            .clone()
            .unwrap_or_else(|| format!("CPU ({})", self.system.cpu_model))
    }

    /// Look up a backend by name (case-insensitive).
    pub fn backend(&self, name: &str) -> Option<&BackendStatus> {
        self.accelerators
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(name))
    }
}

/// Probes the host for acceleration backends.
pub struct EnvironmentProbe;

impl EnvironmentProbe {
    /// Probe everything. Never fails; missing tools are reported as unavailable.
    pub fn run() -> EnvironmentReport {
        let system = SystemInfo::collect();
        let (nvidia, gpu_name) = Self::probe_nvidia();

        let accelerators = vec![
            nvidia,
            Self::probe_cuda(),
            Self::probe_tensorrt(),
            Self::probe_onnxruntime(),
        ];

        for status in &accelerators {
            tracing::debug!(
                backend = %status.name,
                available = status.available,
                version = ?status.version,
                "Probed backend"
            );
        }

        EnvironmentReport {
            system,
            accelerators,
            gpu_name,
        }
    }

    fn probe_nvidia() -> (BackendStatus, Option<String>) {
        const NAME: &str = "NVIDIA GPU";

        let output = match run_tool(
            "nvidia-smi",
            &["--query-gpu=name,driver_version", "--format=csv,noheader"],
        ) {
            Some(out) => out,
            None => return (BackendStatus::missing(NAME, "nvidia-smi not found"), None),
        };

        match parse_nvidia_smi(&output) {
            Some((gpu, driver)) => (
                BackendStatus {
                    name: NAME.to_string(),
                    available: true,
                    version: Some(driver),
                    detail: Some(gpu.clone()),
                },
                Some(gpu),
            ),
            None => (BackendStatus::missing(NAME, "no GPU reported"), None),
        }
    }

    fn probe_cuda() -> BackendStatus {
        const NAME: &str = "CUDA";

        match run_tool("nvcc", &["--version"]) {
            Some(out) => BackendStatus {
                name: NAME.to_string(),
                available: true,
                version: parse_nvcc_release(&out),
                detail: None,
            },
            None => BackendStatus::missing(NAME, "nvcc not found"),
        }
    }

    fn probe_tensorrt() -> BackendStatus {
        const NAME: &str = "TensorRT";

        if let Some(path) = find_library("libnvinfer.so") {
            return BackendStatus {
                name: NAME.to_string(),
                available: true,
                version: None,
                detail: Some(path.display().to_string()),
            };
        }

        match find_in_path("trtexec") {
            Some(path) => BackendStatus {
                name: NAME.to_string(),
                available: true,
                version: None,
                detail: Some(path.display().to_string()),
            },
            None => BackendStatus::missing(NAME, "libnvinfer and trtexec not found"),
        }
    }

    fn probe_onnxruntime() -> BackendStatus {
        const NAME: &str = "ONNX Runtime";

        if let Some(path) = env::var_os("ORT_DYLIB_PATH").map(PathBuf::from) {
            if path.exists() {
                return BackendStatus {
                    name: NAME.to_string(),
                    available: true,
                    version: None,
                    detail: Some(path.display().to_string()),
                };
            }
            return BackendStatus::missing(
                NAME,
                format!("ORT_DYLIB_PATH points at missing file {}", path.display()),
            );
        }

        match find_library("libonnxruntime.so") {
            Some(path) => BackendStatus {
                name: NAME.to_string(),
                available: true,
                version: None,
                detail: Some(path.display().to_string()),
            },
            None => BackendStatus::missing(NAME, "libonnxruntime not found on library path"),
        }
    }
}

/// Run a tool and return its stdout if it exits successfully.
fn run_tool(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// First line of `nvidia-smi --query-gpu=name,driver_version` CSV output.
fn parse_nvidia_smi(output: &str) -> Option<(String, String)> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
    let (name, driver) = line.split_once(',')?;
    Some((name.trim().to_string(), driver.trim().to_string()))
}

/// Extract "12.4" from nvcc's "Cuda compilation tools, release 12.4, V12.4.131".
fn parse_nvcc_release(output: &str) -> Option<String> {
    let rest = output.split("release ").nth(1)?;
    let version = rest.split(',').next()?.trim();
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}

fn find_in_path(program: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Search LD_LIBRARY_PATH and the usual system directories for a shared library.
fn find_library(prefix: &str) -> Option<PathBuf> {
    const SYSTEM_DIRS: &[&str] = &[
        "/usr/lib",
        "/usr/lib64",
        "/usr/local/lib",
        "/usr/lib/x86_64-linux-gnu",
        "/usr/lib/aarch64-linux-gnu",
    ];

    let mut dirs: Vec<PathBuf> = env::var_os("LD_LIBRARY_PATH")
        .map(|paths| env::split_paths(&paths).collect())
        .unwrap_or_default();
    dirs.extend(SYSTEM_DIRS.iter().map(PathBuf::from));

    dirs.iter().find_map(|dir| find_prefixed(dir, prefix))
}

fn find_prefixed(dir: &Path, prefix: &str) -> Option<PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(prefix))
                .unwrap_or(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_system_info_collect() {
        let info = SystemInfo::collect();
        assert!(!info.os.is_empty());
        assert!(info.cpu_cores > 0);
        assert!(info.memory_bytes > 0);
    }

    #[test]
    fn test_probe_reports_every_backend() {
        let report = EnvironmentProbe::run();
        assert_eq!(report.accelerators.len(), 4);
        assert!(report.backend("cuda").is_some());
        assert!(report.backend("ONNX Runtime").is_some());
        assert!(!report.device_name().is_empty());
    }

    #[test]
    fn test_parse_nvidia_smi() {
        let out = "NVIDIA GeForce RTX 4090, 550.54.14\n";
        let (gpu, driver) = parse_nvidia_smi(out).unwrap();
        assert_eq!(gpu, "NVIDIA GeForce RTX 4090");
        assert_eq!(driver, "550.54.14");
        assert!(parse_nvidia_smi("").is_none());
    }

    #[test]
    fn test_parse_nvcc_release() {
        let out = "nvcc: NVIDIA (R) Cuda compiler driver\n\
                   Cuda compilation tools, release 12.4, V12.4.131\n";
        assert_eq!(parse_nvcc_release(out).as_deref(), Some("12.4"));
        assert!(parse_nvcc_release("garbage").is_none());
    }

    #[test]
    fn test_find_prefixed() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("libonnxruntime.so.1.20.0"), b"").unwrap();

        let found = find_prefixed(temp_dir.path(), "libonnxruntime.so").unwrap();
        assert!(found.ends_with("libonnxruntime.so.1.20.0"));
        assert!(find_prefixed(temp_dir.path(), "libnvinfer.so").is_none());
    }
}
