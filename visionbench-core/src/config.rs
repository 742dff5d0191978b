// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark settings and the YAML suite file parser.
//!
//! Suite files are validated when they are loaded. Any invalid field results
//! in a HardValidationError and no model is ever touched.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HardValidationError, VisionError, VisionResult};
use crate::types::{InputShape, ModelFormat, ModelId, PrecisionMode, TimingMode};

fn default_warmup() -> u64 {
    10
}

fn default_iterations() -> u64 {
    100
}

/// Settings for a single harness invocation.
///
/// Read-only for the duration of a run. Warmup iterations never contribute
/// to the reported statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Untimed calls made before measurement starts
    #[serde(default = "default_warmup", rename = "warmup")]
    pub warmup_count: u64,
    /// Timed calls; must be at least 1
    #[serde(default = "default_iterations", rename = "iterations")]
    pub iteration_count: u64,
    /// Precision the inference unit is expected to run at
    #[serde(default)]
    pub precision: PrecisionMode,
    /// Whether input fetch is part of the timed window
    #[serde(default, rename = "timing")]
    pub timing_mode: TimingMode,
}

impl BenchmarkConfig {
    /// Create a config with the given counts and default modes.
    pub fn new(warmup_count: u64, iteration_count: u64) -> Self {
        Self {
            warmup_count,
            iteration_count,
            ..Self::default()
        }
    }

    /// Set the precision mode.
    pub fn with_precision(mut self, precision: PrecisionMode) -> Self {
        self.precision = precision;
        self
    }

    /// Set the timing mode.
    pub fn with_timing_mode(mut self, timing_mode: TimingMode) -> Self {
        self.timing_mode = timing_mode;
        self
    }

    /// Check the invariants a run depends on.
    pub fn validate(&self) -> Result<(), HardValidationError> {
        if self.iteration_count == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "iterations",
                value: self.iteration_count.to_string(),
                reason: "At least one timed iteration is required".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            warmup_count: default_warmup(),
            iteration_count: default_iterations(),
            precision: PrecisionMode::Default,
            timing_mode: TimingMode::InferenceOnly,
        }
    }
}

/// Raw model entry as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
struct RawModelSpec {
    id: String,
    format: ModelFormat,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    latency_ms: Option<f64>,
}

/// Raw input shape.
#[derive(Debug, Deserialize)]
struct RawInputShape {
    #[serde(default = "default_input_dim")]
    width: u32,
    #[serde(default = "default_input_dim")]
    height: u32,
}

fn default_input_dim() -> u32 {
    640
}

impl Default for RawInputShape {
    fn default() -> Self {
        Self {
            width: default_input_dim(),
            height: default_input_dim(),
        }
    }
}

fn default_output_dir() -> String {
    "results".to_string()
}

/// Raw root suite file.
#[derive(Debug, Deserialize)]
struct RawSuiteConfig {
    #[serde(default)]
    run: BenchmarkConfig,
    #[serde(default)]
    input: RawInputShape,
    #[serde(default = "default_output_dir")]
    output_dir: String,
    models: Vec<RawModelSpec>,
}

/// Validated model entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub id: ModelId,
    pub format: ModelFormat,
    /// Model file; present for every format that executes a real graph
    pub path: Option<PathBuf>,
    /// Per-call latency of a synthetic unit
    pub latency_ms: Option<f64>,
}

impl ModelSpec {
    /// A model file backed entry.
    pub fn file(id: ModelId, format: ModelFormat, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            format,
            path: Some(path.into()),
            latency_ms: None,
        }
    }

    /// A synthetic entry with a fixed per-call latency.
    pub fn synthetic(id: ModelId, latency_ms: f64) -> Self {
        Self {
            id,
            format: ModelFormat::Synthetic,
            path: None,
            latency_ms: Some(latency_ms),
        }
    }

    /// The same model re-targeted at another format.
    pub fn with_format(&self, format: ModelFormat) -> Self {
        Self {
            format,
            ..self.clone()
        }
    }
}

/// Complete validated suite configuration.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    pub run: BenchmarkConfig,
    pub input: InputShape,
    pub output_dir: PathBuf,
    pub models: Vec<ModelSpec>,
}

/// Suite file loader with strict validation.
pub struct SuiteConfigLoader;

impl SuiteConfigLoader {
    /// Load and validate a suite from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> VisionResult<SuiteConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(VisionError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| VisionError::Io {
            context: "reading suite file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate a suite from a YAML string.
    pub fn load_string(content: &str) -> VisionResult<SuiteConfig> {
        let raw: RawSuiteConfig =
            serde_yaml::from_str(content).map_err(|e| VisionError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    fn validate(raw: RawSuiteConfig) -> VisionResult<SuiteConfig> {
        raw.run.validate()?;

        let input = InputShape::new(raw.input.width, raw.input.height)?;

        if raw.models.is_empty() {
            return Err(HardValidationError::MissingRequiredField {
                field: "models",
                context: "suite file (at least one model must be listed)".to_string(),
            }
            .into());
        }

        let mut models = Vec::with_capacity(raw.models.len());
        let mut seen_ids = HashSet::new();

        for (index, raw_model) in raw.models.into_iter().enumerate() {
            let model = Self::validate_model(raw_model, index)?;

            if !seen_ids.insert(model.id.clone()) {
                return Err(HardValidationError::DuplicateModelId {
                    id: model.id.to_string(),
                }
                .into());
            }

            models.push(model);
        }

        tracing::debug!(models = models.len(), "Validated suite configuration");

        Ok(SuiteConfig {
            run: raw.run,
            input,
            output_dir: PathBuf::from(raw.output_dir),
            models,
        })
    }

    fn validate_model(raw: RawModelSpec, index: usize) -> VisionResult<ModelSpec> {
        let context = format!("model at index {}", index);

        let id = ModelId::new(&raw.id).map_err(|mut e| {
            if let HardValidationError::InvalidFieldValue { ref mut field, .. } = e {
                *field = "id";
            }
            e
        })?;

        let path = match (raw.format.requires_path(), raw.path) {
            (true, None) => {
                return Err(HardValidationError::MissingRequiredField {
                    field: "path",
                    context,
                }
                .into());
            }
            (_, path) => path.map(PathBuf::from),
        };

        let latency_ms = match (raw.format, raw.latency_ms) {
            (ModelFormat::Synthetic, None) => {
                return Err(HardValidationError::MissingRequiredField {
                    field: "latency_ms",
                    context,
                }
                .into());
            }
            (_, Some(ms)) if !ms.is_finite() || ms < 0.0 => {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "latency_ms",
                    value: ms.to_string(),
                    reason: "Latency must be a finite, non-negative number".to_string(),
                }
                .into());
            }
            (_, latency) => latency,
        };

        Ok(ModelSpec {
            id,
            format: raw.format,
            path,
            latency_ms,
        })
    }
}
