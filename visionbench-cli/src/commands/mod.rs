// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod probe;
pub mod speed;
pub mod stream;
pub mod validate;

use std::convert::Infallible;
use std::path::PathBuf;

use clap::Args;
use thiserror::Error;
use visionbench_benchmark::HarnessError;
use visionbench_core::{HardValidationError, ModelFormat, ModelId, ModelSpec};

use crate::backend::BackendError;
use crate::frames::FrameError;

/// Failure of a single model's load-and-benchmark job.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Harness(#[from] HarnessError<BackendError, Infallible>),

    #[error(transparent)]
    Frames(#[from] FrameError),

    #[error(transparent)]
    Stream(#[from] HarnessError<BackendError, FrameError>),
}

/// Model selection flags shared by `speed` and `stream`.
#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// Model identifier (e.g. yolo11n)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Model file (defaults to `<model>.onnx`)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Model format: synthetic, onnx or tensorrt
    #[arg(long, default_value = "onnx")]
    pub format: ModelFormat,

    /// Per-call latency for a synthetic model
    #[arg(long)]
    pub latency_ms: Option<f64>,
}

impl ModelArgs {
    /// Build a model entry from the flags, if `--model` was given.
    pub fn to_spec(&self) -> Result<Option<ModelSpec>, HardValidationError> {
        let Some(model) = &self.model else {
            return Ok(None);
        };
        let id = ModelId::new(model.as_str())?;

        let spec = match self.format {
            ModelFormat::Synthetic => {
                let latency_ms =
                    self.latency_ms
                        .ok_or_else(|| HardValidationError::MissingRequiredField {
                            field: "latency_ms",
                            context: format!("synthetic model '{}'", id),
                        })?;
                if !latency_ms.is_finite() || latency_ms < 0.0 {
                    return Err(HardValidationError::InvalidFieldValue {
                        field: "latency_ms",
                        value: latency_ms.to_string(),
                        reason: "must be a non-negative number".to_string(),
                    });
                }
                ModelSpec::synthetic(id, latency_ms)
            }
            format => {
                let path = self
                    .path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(format!("{}.onnx", id)));
                ModelSpec::file(id, format, path)
            }
        };

        Ok(Some(spec))
    }
}
