// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! ONNX Runtime backend.
//!
//! `onnx` models run on the CUDA execution provider when present, falling
//! back to CPU. `tensorrt` models run the same graph through the TensorRT
//! execution provider, which builds the engine on first use (warmup absorbs
//! that cost) and caches it next to the model for later runs.

use std::fmt::Display;

use ndarray::Array4;
use ort::execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use visionbench_benchmark::{Frame, InferenceUnit};
use visionbench_core::{InputShape, ModelFormat, ModelId, ModelSpec};

use super::{engine_cache_dir, BackendError, LoadOptions};

/// A YOLO-style detector graph taking a 1x3xHxW float tensor.
pub struct OnnxUnit {
    session: Session,
    input_name: String,
    input: InputShape,
    tensor: Array4<f32>,
}

fn load_error<E: Display>(model: &ModelId) -> impl Fn(E) -> BackendError + '_ {
    move |e| BackendError::Load {
        model: model.clone(),
        reason: e.to_string(),
    }
}

fn inference_error<E: Display>(e: E) -> BackendError {
    BackendError::Inference {
        reason: e.to_string(),
    }
}

impl OnnxUnit {
    pub fn load(spec: &ModelSpec, options: &LoadOptions) -> Result<Self, BackendError> {
        let path = spec.path.as_deref().ok_or_else(|| BackendError::Load {
            model: spec.id.clone(),
            reason: "no model path".to_string(),
        })?;

        let builder = Session::builder().map_err(load_error(&spec.id))?;

        let builder = match spec.format {
            ModelFormat::TensorRt => {
                let cache_dir = engine_cache_dir(path);
                std::fs::create_dir_all(&cache_dir).map_err(load_error(&spec.id))?;
                tracing::debug!(model = %spec.id, cache = %cache_dir.display(), "TensorRT engine cache");

                builder
                    .with_execution_providers([
                        TensorRTExecutionProvider::default()
                            .with_fp16(options.precision.is_reduced())
                            .with_engine_cache(true)
                            .with_engine_cache_path(cache_dir.display().to_string())
                            .build(),
                        CUDAExecutionProvider::default().build(),
                    ])
                    .map_err(load_error(&spec.id))?
            }
            _ => {
                if options.precision.is_reduced() {
                    tracing::warn!(
                        model = %spec.id,
                        "FP16 on ONNX Runtime needs a half-precision graph; running the graph as exported"
                    );
                }
                builder
                    .with_execution_providers([CUDAExecutionProvider::default().build()])
                    .map_err(load_error(&spec.id))?
            }
        };

        let session = builder
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_error(&spec.id))?
            .commit_from_file(path)
            .map_err(load_error(&spec.id))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "images".to_string());

        tracing::info!(
            model = %spec.id,
            format = %spec.format,
            input = %input_name,
            shape = %options.input,
            "ONNX session ready"
        );

        let tensor = Array4::<f32>::zeros((
            1,
            3,
            options.input.height() as usize,
            options.input.width() as usize,
        ));

        Ok(Self {
            session,
            input_name,
            input: options.input,
            tensor,
        })
    }

    /// HWC u8 -> NCHW f32 in [0, 1].
    fn fill_tensor(&mut self, frame: &Frame) -> Result<(), BackendError> {
        if frame.shape() != self.input {
            return Err(BackendError::Inference {
                reason: format!(
                    "frame is {} but the model expects {}",
                    frame.shape(),
                    self.input
                ),
            });
        }

        let width = self.input.width() as usize;
        for (i, pixel) in frame.as_bytes().chunks_exact(3).enumerate() {
            let (y, x) = (i / width, i % width);
            for (c, &value) in pixel.iter().enumerate() {
                self.tensor[[0, c, y, x]] = f32::from(value) / 255.0;
            }
        }
        Ok(())
    }
}

impl InferenceUnit for OnnxUnit {
    type Input = Frame;
    type Error = BackendError;

    fn infer(&mut self, input: &Frame) -> Result<(), BackendError> {
        self.fill_tensor(input)?;

        let contiguous = self.tensor.as_standard_layout();
        let input_tensor = TensorRef::from_array_view(&contiguous).map_err(inference_error)?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let outputs = self.session.run(inputs).map_err(inference_error)?;
        drop(outputs);
        Ok(())
    }
}
