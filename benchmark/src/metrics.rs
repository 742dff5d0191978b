// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Timing samples, aggregate results and suite reports.
//!
//! Statistics are deliberately plain: mean, min, max and the derived rate.
//! There is no outlier trimming and no percentile computation.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use visionbench_core::{InputShape, ModelFormat, ModelId, PrecisionMode, SystemInfo, TimingMode};

/// One measured duration in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimingSample(f64);

impl TimingSample {
    /// Sample from a monotonic-clock duration.
    pub fn from_duration(elapsed: Duration) -> Self {
        Self(elapsed.as_secs_f64() * 1_000.0)
    }

    /// Sample from a millisecond value.
    pub fn from_millis(ms: f64) -> Self {
        Self(ms)
    }

    /// The duration in milliseconds.
    pub fn as_millis(&self) -> f64 {
        self.0
    }
}

/// Aggregate statistics over the timed phase of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Samples actually collected; may be below the requested count
    pub sample_count: u64,
    /// Arithmetic mean latency in milliseconds
    pub mean_latency_ms: f64,
    /// Minimum observed latency in milliseconds
    pub min_latency_ms: f64,
    /// Maximum observed latency in milliseconds
    pub max_latency_ms: f64,
    /// 1000 / mean_latency_ms
    pub throughput_per_sec: f64,
}

impl BenchmarkResult {
    /// Aggregate a sample sequence. Returns `None` for an empty sequence.
    pub fn from_samples(samples: &[TimingSample]) -> Option<Self> {
        let first = samples.first()?.as_millis();

        let (sum, min, max) = samples.iter().map(TimingSample::as_millis).fold(
            (0.0_f64, first, first),
            |(sum, min, max), ms| (sum + ms, min.min(ms), max.max(ms)),
        );

        let mean = sum / samples.len() as f64;
        // Clamp against float rounding so min <= mean <= max always holds.
        let mean = mean.clamp(min, max);

        // A mean below clock resolution has no meaningful rate.
        let throughput_per_sec = if mean > 0.0 { 1_000.0 / mean } else { 0.0 };

        Some(Self {
            sample_count: samples.len() as u64,
            mean_latency_ms: mean,
            min_latency_ms: min,
            max_latency_ms: max,
            throughput_per_sec,
        })
    }
}

/// Format a millisecond latency in human-readable form (auto-selects µs/ms/s).
pub fn format_latency_ms(ms: f64) -> String {
    if ms < 1.0 {
        format!("{:.2}µs", ms * 1_000.0)
    } else if ms < 1_000.0 {
        format!("{:.2}ms", ms)
    } else {
        format!("{:.2}s", ms / 1_000.0)
    }
}

/// Result of one model benchmarked in one format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    pub model: ModelId,
    pub format: ModelFormat,
    pub precision: PrecisionMode,
    pub timing_mode: TimingMode,
    pub input: InputShape,
    pub result: BenchmarkResult,
    /// Additional metadata specific to this run
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ModelRecord {
    pub fn new(
        model: ModelId,
        format: ModelFormat,
        precision: PrecisionMode,
        timing_mode: TimingMode,
        input: InputShape,
        result: BenchmarkResult,
    ) -> Self {
        Self {
            model,
            format,
            precision,
            timing_mode,
            input,
            result,
            metadata: HashMap::new(),
        }
    }

    /// Add metadata to the record. Values that fail to serialize are dropped.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.metadata.insert(key.into(), value);
        }
        self
    }

    /// Format column label, e.g. "ONNX Runtime FP32".
    pub fn format_label(&self) -> String {
        format!("{} {}", self.format, self.precision)
    }
}

/// A model that could not be benchmarked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedRun {
    pub model: ModelId,
    pub format: ModelFormat,
    pub error: String,
}

/// Complete benchmark suite report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Suite identifier
    pub suite: String,
    /// Framework version
    pub version: String,
    /// Unique id of this run
    pub run_id: Uuid,
    /// Timestamp when benchmarks were run
    pub timestamp: DateTime<Utc>,
    /// Device the models ran on, as reported by the environment probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// System information
    pub system_info: SystemInfo,
    /// Successful runs, in execution order
    pub records: Vec<ModelRecord>,
    /// Runs that failed and were skipped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedRun>,
}

impl SuiteReport {
    /// Create a new report, collecting system information now.
    pub fn new(suite: impl Into<String>) -> Self {
        Self::with_system_info(suite, SystemInfo::collect())
    }

    /// Create a new report with already collected system information.
    pub fn with_system_info(suite: impl Into<String>, system_info: SystemInfo) -> Self {
        Self {
            suite: suite.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            device: None,
            system_info,
            records: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Set the device label.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Add a result to the report.
    pub fn add_record(&mut self, record: ModelRecord) {
        self.records.push(record);
    }

    /// Record a failed run.
    pub fn add_failure(&mut self, model: ModelId, format: ModelFormat, error: impl ToString) {
        self.failures.push(FailedRun {
            model,
            format,
            error: error.to_string(),
        });
    }

    /// Device label with a CPU fallback.
    pub fn device_label(&self) -> String {
        self.device
            .clone()
            .unwrap_or_else(|| format!("CPU ({})", self.system_info.cpu_model))
    }
}
