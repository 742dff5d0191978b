// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! visionbench Benchmarking Harness
//!
//! A model-agnostic harness for measuring the latency and throughput of
//! inference backends.
//!
//! # Flow
//!
//! - **Warmup**: untimed calls stabilise caches, graph compilation and clocks
//! - **Timed phase**: one monotonic-clock sample per call
//! - **Aggregate**: mean, min, max and throughput (`1000 / mean`)
//!
//! # Data Output
//!
//! Results are collected into a [`SuiteReport`] and written by a
//! [`ResultSink`]: JSON files for analysis or Markdown tables for humans.

pub mod harness;
pub mod metrics;
pub mod producer;
pub mod reporter;

pub use harness::{
    measure, run, BenchmarkHarness, HarnessError, HarnessResult, InferenceUnit, InputProducer,
    Phase, Timer,
};
pub use metrics::{
    format_latency_ms, BenchmarkResult, FailedRun, ModelRecord, SuiteReport, TimingSample,
};
pub use producer::{from_fn, FiniteInputs, FnInput, Frame, StaticInput};
pub use reporter::{JsonReporter, MarkdownReporter, ReporterError, ResultSink};
