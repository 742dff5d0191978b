// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Synthetic backend with a fixed per-call latency.

use std::hint::black_box;
use std::thread;
use std::time::{Duration, Instant};

use visionbench_benchmark::{Frame, InferenceUnit};
use visionbench_core::ModelSpec;

use super::BackendError;

/// Below this the remaining wait is spun rather than slept.
const SPIN_THRESHOLD: Duration = Duration::from_micros(500);

/// Inference unit that takes a known amount of time per call.
pub struct SyntheticUnit {
    latency: Duration,
}

impl SyntheticUnit {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Build from a synthetic model entry.
    pub fn from_spec(spec: &ModelSpec) -> Result<Self, BackendError> {
        let latency_ms = spec.latency_ms.ok_or_else(|| BackendError::Load {
            model: spec.id.clone(),
            reason: "synthetic model has no latency_ms".to_string(),
        })?;

        let latency = Duration::try_from_secs_f64(latency_ms / 1_000.0).map_err(|e| {
            BackendError::Load {
                model: spec.id.clone(),
                reason: format!("invalid latency {}ms: {}", latency_ms, e),
            }
        })?;

        Ok(Self::new(latency))
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl InferenceUnit for SyntheticUnit {
    type Input = Frame;
    type Error = BackendError;

    fn infer(&mut self, input: &Frame) -> Result<(), BackendError> {
        let deadline = Instant::now() + self.latency;

        black_box(input.as_bytes().first());

        if self.latency > SPIN_THRESHOLD {
            thread::sleep(self.latency - SPIN_THRESHOLD);
        }
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
        Ok(())
    }
}
