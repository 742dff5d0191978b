//! Custom error types for visionbench.
//!
//! Explicit enum error types only. Library code never returns
//! `Box<dyn Error>` or `anyhow::Result`.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for configuration loading and probing.
#[derive(Debug, Error)]
pub enum VisionError {
    // =========================================================================
    // Suite Configuration - Rejected Before Any Model Loads
    // =========================================================================
    #[error("Invalid suite configuration: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Suite file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Suite file could not be parsed: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Filesystem
    // =========================================================================
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Validation errors raised before any benchmark work starts.
///
/// A run with an invalid configuration never reaches the inference unit.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Duplicate model ID: {id}")]
    DuplicateModelId { id: String },

    #[error("Invalid input shape: {width}x{height} - dimensions must be non-zero and fit in memory")]
    InvalidInputShape { width: u32, height: u32 },
}

/// Result type alias using VisionError.
pub type VisionResult<T> = Result<T, VisionError>;
