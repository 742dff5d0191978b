// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers and enums shared by the harness and the driver.
//!
//! Validated types check their invariants at creation time, so a value that
//! exists is a value that is safe to benchmark with.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Maximum length of a model identifier.
const MAX_MODEL_ID_LEN: usize = 64;

/// Validated model identifier.
/// Must be non-empty, alphanumeric with `-`, `_` or `.`, max 64 chars.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelId(String);

impl ModelId {
    /// Create a new ModelId with validation.
    pub fn new(id: impl Into<String>) -> Result<Self, HardValidationError> {
        let id = id.into();

        if id.is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "model_id",
                value: id,
                reason: "Model ID cannot be empty".to_string(),
            });
        }

        if id.len() > MAX_MODEL_ID_LEN {
            return Err(HardValidationError::InvalidFieldValue {
                field: "model_id",
                value: id.clone(),
                reason: format!(
                    "Model ID too long: {} chars (max {})",
                    id.len(),
                    MAX_MODEL_ID_LEN
                ),
            });
        }

        if !id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(HardValidationError::InvalidFieldValue {
                field: "model_id",
                value: id,
                reason: "Model ID must contain only alphanumeric characters, '-', '_' and '.'"
                    .to_string(),
            });
        }

        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ModelId {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ModelId> for String {
    fn from(id: ModelId) -> Self {
        id.0
    }
}

/// Numeric precision the inference unit is loaded with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionMode {
    /// Full precision (FP32).
    #[default]
    Default,
    /// Half precision (FP16).
    Reduced,
}

impl PrecisionMode {
    /// Build from a `--fp16` style flag.
    pub fn from_half(half: bool) -> Self {
        if half {
            PrecisionMode::Reduced
        } else {
            PrecisionMode::Default
        }
    }

    /// Whether this mode requests half precision.
    pub fn is_reduced(&self) -> bool {
        matches!(self, PrecisionMode::Reduced)
    }
}

impl fmt::Display for PrecisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrecisionMode::Default => write!(f, "FP32"),
            PrecisionMode::Reduced => write!(f, "FP16"),
        }
    }
}

/// Which instants bound a timed iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingMode {
    /// Input is fetched before the timer starts; only the inference call is timed.
    #[default]
    InferenceOnly,
    /// Timer starts before the input fetch, so capture cost is part of the sample.
    EndToEnd,
}

impl fmt::Display for TimingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingMode::InferenceOnly => write!(f, "inference_only"),
            TimingMode::EndToEnd => write!(f, "end_to_end"),
        }
    }
}

/// Model format, which also selects the backend that executes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    /// In-process unit with a fixed per-call latency.
    Synthetic,
    /// ONNX graph executed by ONNX Runtime.
    Onnx,
    /// ONNX graph executed through the TensorRT execution provider.
    #[serde(rename = "tensorrt")]
    TensorRt,
}

impl ModelFormat {
    /// Whether the format needs a model file on disk.
    pub fn requires_path(&self) -> bool {
        !matches!(self, ModelFormat::Synthetic)
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFormat::Synthetic => write!(f, "Synthetic"),
            ModelFormat::Onnx => write!(f, "ONNX Runtime"),
            ModelFormat::TensorRt => write!(f, "TensorRT"),
        }
    }
}

impl std::str::FromStr for ModelFormat {
    type Err = HardValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "synthetic" => Ok(ModelFormat::Synthetic),
            "onnx" => Ok(ModelFormat::Onnx),
            "tensorrt" | "trt" | "engine" => Ok(ModelFormat::TensorRt),
            other => Err(HardValidationError::InvalidFieldValue {
                field: "format",
                value: other.to_string(),
                reason: "expected one of: synthetic, onnx, tensorrt".to_string(),
            }),
        }
    }
}

/// Validated input image shape in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ShapeFields")]
pub struct InputShape {
    width: u32,
    height: u32,
}

/// Unchecked wire form of [`InputShape`].
#[derive(Deserialize)]
struct ShapeFields {
    width: u32,
    height: u32,
}

impl TryFrom<ShapeFields> for InputShape {
    type Error = HardValidationError;

    fn try_from(fields: ShapeFields) -> Result<Self, Self::Error> {
        Self::new(fields.width, fields.height)
    }
}

impl InputShape {
    /// The reference 640x640 detector input.
    pub const DEFAULT: InputShape = InputShape {
        width: 640,
        height: 640,
    };

    /// Create a new InputShape; both dimensions must be non-zero and an RGB8
    /// buffer of the shape must be addressable.
    pub fn new(width: u32, height: u32) -> Result<Self, HardValidationError> {
        if width == 0 || height == 0 || checked_rgb_len(width, height).is_none() {
            return Err(HardValidationError::InvalidInputShape { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in an RGB8 image of this shape.
    pub fn rgb_len(&self) -> usize {
        // Checked in `new`.
        self.width as usize * self.height as usize * 3
    }
}

/// RGB8 byte count, `None` past the largest possible allocation.
fn checked_rgb_len(width: u32, height: u32) -> Option<usize> {
    usize::try_from(width)
        .ok()?
        .checked_mul(usize::try_from(height).ok()?)?
        .checked_mul(3)
        .filter(|&len| isize::try_from(len).is_ok())
}

impl Default for InputShape {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_id_valid() {
        assert!(ModelId::new("yolo11n").is_ok());
        assert!(ModelId::new("yolov8s-world").is_ok());
        assert!(ModelId::new("yolo11n.onnx").is_ok());
        assert!(ModelId::new("calibration_5ms").is_ok());
    }

    #[test]
    fn test_model_id_invalid() {
        assert!(ModelId::new("").is_err());
        assert!(ModelId::new("a".repeat(65)).is_err());
        assert!(ModelId::new("models/yolo11n").is_err());
        assert!(ModelId::new("yolo 11n").is_err());
    }

    #[test]
    fn test_precision_labels() {
        assert_eq!(PrecisionMode::Default.to_string(), "FP32");
        assert_eq!(PrecisionMode::Reduced.to_string(), "FP16");
        assert_eq!(PrecisionMode::from_half(true), PrecisionMode::Reduced);
        assert!(!PrecisionMode::from_half(false).is_reduced());
    }

    #[test]
    fn test_model_format_parse() {
        assert_eq!("onnx".parse::<ModelFormat>().unwrap(), ModelFormat::Onnx);
        assert_eq!("TensorRT".parse::<ModelFormat>().unwrap(), ModelFormat::TensorRt);
        assert_eq!("engine".parse::<ModelFormat>().unwrap(), ModelFormat::TensorRt);
        assert!("pytorch".parse::<ModelFormat>().is_err());
        assert!(!ModelFormat::Synthetic.requires_path());
        assert!(ModelFormat::Onnx.requires_path());
    }

    #[test]
    fn test_input_shape() {
        let shape = InputShape::new(1280, 720).unwrap();
        assert_eq!(shape.to_string(), "1280x720");
        assert_eq!(shape.rgb_len(), 1280 * 720 * 3);
        assert_eq!(InputShape::default(), InputShape::DEFAULT);
        assert!(InputShape::new(0, 640).is_err());
    }

    #[test]
    fn test_input_shape_too_large() {
        assert!(matches!(
            InputShape::new(u32::MAX, u32::MAX),
            Err(HardValidationError::InvalidInputShape { .. })
        ));
        assert_eq!(checked_rgb_len(u32::MAX, u32::MAX), None);
        assert_eq!(checked_rgb_len(640, 640), Some(640 * 640 * 3));
    }

    #[test]
    fn test_input_shape_deserialize_validates() {
        let shape: InputShape = serde_yaml::from_str("width: 1280\nheight: 720").unwrap();
        assert_eq!(shape, InputShape::new(1280, 720).unwrap());

        assert!(serde_yaml::from_str::<InputShape>("width: 0\nheight: 720").is_err());
        assert!(serde_yaml::from_str::<InputShape>("width: 4294967295\nheight: 4294967295").is_err());
    }
}
