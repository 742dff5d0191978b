// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Suite files loaded from disk, as the CLI reads them.

use std::path::PathBuf;

use tempfile::TempDir;
use visionbench_core::{
    EnvironmentProbe, InputShape, ModelFormat, PrecisionMode, SuiteConfigLoader, TimingMode,
    VisionError,
};

fn write_suite(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("suite.yaml");
    std::fs::write(&path, content).expect("Failed to write suite file");
    path
}

#[test]
fn test_load_suite_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_suite(
        &temp_dir,
        r#"
run:
  warmup: 10
  iterations: 100
models:
  - id: yolo11n
    format: onnx
    path: models/yolo11n.onnx
  - id: yolo11n-trt
    format: tensorrt
    path: models/yolo11n.onnx
  - id: calibration-5ms
    format: synthetic
    latency_ms: 5.0
"#,
    );

    let suite = SuiteConfigLoader::load_file(&path).expect("Suite should load");

    assert_eq!(suite.run.precision, PrecisionMode::Default);
    assert_eq!(suite.run.timing_mode, TimingMode::InferenceOnly);
    assert_eq!(suite.input, InputShape::DEFAULT);
    assert_eq!(suite.output_dir, PathBuf::from("results"));

    let formats: Vec<ModelFormat> = suite.models.iter().map(|m| m.format).collect();
    assert_eq!(
        formats,
        vec![ModelFormat::Onnx, ModelFormat::TensorRt, ModelFormat::Synthetic]
    );
    assert_eq!(suite.models[2].latency_ms, Some(5.0));
}

#[test]
fn test_broken_yaml_is_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_suite(&temp_dir, "models: [unclosed");

    assert!(matches!(
        SuiteConfigLoader::load_file(&path),
        Err(VisionError::ConfigParse { .. })
    ));
}

#[test]
fn test_unknown_format_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_suite(
        &temp_dir,
        r#"
models:
  - id: yolo11n
    format: coreml
    path: yolo11n.mlpackage
"#,
    );

    assert!(SuiteConfigLoader::load_file(&path).is_err());
}

#[test]
fn test_probe_always_reports() {
    let report = EnvironmentProbe::run();

    assert!(!report.device_name().is_empty());
    assert!(report.backend("ONNX Runtime").is_some());
}
