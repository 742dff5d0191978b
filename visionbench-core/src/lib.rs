//! visionbench Core Library
//!
//! Shared building blocks for the visionbench workspace: the error taxonomy,
//! validated newtypes, benchmark and suite configuration, and host
//! environment probing.

pub mod config;
pub mod error;
pub mod probe;
pub mod types;

// Re-export commonly used types
pub use config::{BenchmarkConfig, ModelSpec, SuiteConfig, SuiteConfigLoader};
pub use error::{HardValidationError, VisionError, VisionResult};
pub use probe::{BackendStatus, EnvironmentProbe, EnvironmentReport, SystemInfo};
pub use types::{InputShape, ModelFormat, ModelId, PrecisionMode, TimingMode};
