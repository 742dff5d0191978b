// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Model loaders.
//!
//! Turns a [`ModelSpec`] into a boxed inference unit the harness can time.
//! Real graphs run on ONNX Runtime (cargo feature `onnx`); the synthetic
//! backend needs no model file and is used for calibration.

#[cfg(feature = "onnx")]
mod onnx;
mod synthetic;

use std::path::{Path, PathBuf};

use thiserror::Error;
use visionbench_benchmark::{Frame, InferenceUnit};
use visionbench_core::{InputShape, ModelFormat, ModelId, ModelSpec, PrecisionMode};

pub use synthetic::SyntheticUnit;

/// Errors raised while loading or running a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Model file not found: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("Failed to load model {model}: {reason}")]
    Load { model: ModelId, reason: String },

    #[error("Inference failed: {reason}")]
    Inference { reason: String },

    #[error("{format} backend is not available in this build ({hint})")]
    Unsupported {
        format: ModelFormat,
        hint: &'static str,
    },
}

/// A loaded model, ready to be benchmarked on frames.
pub type DetectorUnit = Box<dyn InferenceUnit<Input = Frame, Error = BackendError>>;

/// How a model should be loaded.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub precision: PrecisionMode,
    pub input: InputShape,
}

/// Load `spec` with the backend its format selects.
pub fn load(spec: &ModelSpec, options: &LoadOptions) -> Result<DetectorUnit, BackendError> {
    if let Some(path) = &spec.path {
        if spec.format.requires_path() && !path.exists() {
            return Err(BackendError::ModelNotFound { path: path.clone() });
        }
    }

    tracing::debug!(
        model = %spec.id,
        format = %spec.format,
        precision = %options.precision,
        input = %options.input,
        "Loading model"
    );

    match spec.format {
        ModelFormat::Synthetic => Ok(Box::new(SyntheticUnit::from_spec(spec)?)),
        ModelFormat::Onnx | ModelFormat::TensorRt => load_onnx(spec, options),
    }
}

/// Directory next to `model` where built TensorRT engines are kept, e.g.
/// `models/yolo11n.onnx` -> `models/yolo11n.engine-cache`.
#[cfg_attr(not(feature = "onnx"), allow(dead_code))]
pub(crate) fn engine_cache_dir(model: &Path) -> PathBuf {
    model.with_extension("engine-cache")
}

#[cfg(feature = "onnx")]
fn load_onnx(spec: &ModelSpec, options: &LoadOptions) -> Result<DetectorUnit, BackendError> {
    let unit = onnx::OnnxUnit::load(spec, options)?;
    Ok(Box::new(unit))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(spec: &ModelSpec, _options: &LoadOptions) -> Result<DetectorUnit, BackendError> {
    Err(BackendError::Unsupported {
        format: spec.format,
        hint: "rebuild with `--features onnx`",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use visionbench_benchmark::{run, StaticInput};
    use visionbench_core::BenchmarkConfig;

    fn options() -> LoadOptions {
        LoadOptions {
            precision: PrecisionMode::Default,
            input: InputShape::new(32, 32).unwrap(),
        }
    }

    #[test]
    fn test_load_synthetic_and_benchmark() {
        let spec = ModelSpec::synthetic(ModelId::new("calibration").unwrap(), 1.0);
        let mut unit = load(&spec, &options()).unwrap();
        let mut producer = StaticInput::new(Frame::zeros(options().input));

        let result = run(&mut unit, &mut producer, &BenchmarkConfig::new(1, 5)).unwrap();
        assert_eq!(result.sample_count, 5);
        assert!(result.min_latency_ms >= 1.0);
    }

    #[test]
    fn test_missing_model_file() {
        let spec = ModelSpec::file(
            ModelId::new("yolo11n").unwrap(),
            ModelFormat::Onnx,
            "/nonexistent/yolo11n.onnx",
        );
        assert!(matches!(
            load(&spec, &options()),
            Err(BackendError::ModelNotFound { .. })
        ));
    }

    #[test]
    fn test_engine_cache_next_to_model() {
        assert_eq!(
            engine_cache_dir(Path::new("models/yolo11n.onnx")),
            PathBuf::from("models/yolo11n.engine-cache")
        );
        assert_eq!(
            engine_cache_dir(Path::new("yolo11s")),
            PathBuf::from("yolo11s.engine-cache")
        );
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_onnx_unsupported_without_feature() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let model_path = temp_dir.path().join("yolo11n.onnx");
        std::fs::write(&model_path, b"not a real graph").unwrap();

        let spec = ModelSpec::file(ModelId::new("yolo11n").unwrap(), ModelFormat::TensorRt, model_path);
        let err = load(&spec, &options()).err().unwrap();
        assert!(matches!(err, BackendError::Unsupported { .. }));
        assert!(err.to_string().contains("--features onnx"));
    }
}
