// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark harness for timing inference units.
//!
//! The harness warms an inference unit up, times a fixed number of calls and
//! reduces the samples to a [`BenchmarkResult`]. It is single threaded: one
//! call completes before the next starts. It performs no I/O and no logging;
//! reporting is the caller's job.

use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;
use visionbench_core::{BenchmarkConfig, HardValidationError, PrecisionMode, TimingMode};

use crate::metrics::{BenchmarkResult, TimingSample};

/// Upper bound on the up-front sample buffer allocation.
const MAX_PREALLOCATED_SAMPLES: u64 = 1 << 16;

/// Something that performs one model prediction per call.
///
/// The prediction itself is discarded by the harness; only timing matters.
pub trait InferenceUnit {
    type Input;
    type Error;

    /// Run one inference on `input`.
    fn infer(&mut self, input: &Self::Input) -> Result<(), Self::Error>;
}

impl<U: InferenceUnit + ?Sized> InferenceUnit for Box<U> {
    type Input = U::Input;
    type Error = U::Error;

    fn infer(&mut self, input: &Self::Input) -> Result<(), Self::Error> {
        (**self).infer(input)
    }
}

/// Something that yields one input per call, possibly finitely many.
pub trait InputProducer {
    type Item;
    type Error;

    /// Fetch the next input. `Ok(None)` means the producer is exhausted.
    fn next_input(&mut self) -> Result<Option<Self::Item>, Self::Error>;
}

impl<P: InputProducer + ?Sized> InputProducer for Box<P> {
    type Item = P::Item;
    type Error = P::Error;

    fn next_input(&mut self) -> Result<Option<Self::Item>, Self::Error> {
        (**self).next_input()
    }
}

/// The phase a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Untimed calls before measurement
    Warmup,
    /// Measured calls
    Timed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Warmup => write!(f, "warmup"),
            Phase::Timed => write!(f, "timed"),
        }
    }
}

/// Errors returned by a harness run.
///
/// `U` is the inference unit's error and `P` the input producer's. Both are
/// carried unchanged so callers can tell a broken backend from a broken run.
#[derive(Debug, Error)]
pub enum HarnessError<U, P> {
    #[error("Invalid benchmark configuration: {0}")]
    Config(#[from] HardValidationError),

    #[error("No timed samples collected ({requested} requested): input producer exhausted")]
    InsufficientSamples { requested: u64 },

    #[error("Inference failed in {phase} iteration {iteration}: {source}")]
    Inference {
        phase: Phase,
        iteration: u64,
        #[source]
        source: U,
    },

    #[error("Input producer failed in {phase} iteration {iteration}: {source}")]
    Input {
        phase: Phase,
        iteration: u64,
        #[source]
        source: P,
    },
}

impl<U, P> HarnessError<U, P> {
    /// Phase and zero-based iteration index of a unit or producer failure.
    pub fn location(&self) -> Option<(Phase, u64)> {
        match self {
            HarnessError::Inference {
                phase, iteration, ..
            }
            | HarnessError::Input {
                phase, iteration, ..
            } => Some((*phase, *iteration)),
            _ => None,
        }
    }

    /// Take the inference unit's own error out, if that is what failed.
    pub fn into_inference_error(self) -> Option<U> {
        match self {
            HarnessError::Inference { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Take the input producer's own error out, if that is what failed.
    pub fn into_input_error(self) -> Option<P> {
        match self {
            HarnessError::Input { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Harness result type for a given unit and producer.
pub type HarnessResult<U, P> = Result<
    BenchmarkResult,
    HarnessError<<U as InferenceUnit>::Error, <P as InputProducer>::Error>,
>;

/// A benchmark harness for measuring inference latency.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkHarness {
    config: BenchmarkConfig,
}

impl BenchmarkHarness {
    /// Create a new benchmark harness with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a harness from an existing configuration.
    pub fn with_config(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    /// Set the number of warmup iterations.
    pub fn warmup(mut self, iterations: u64) -> Self {
        self.config.warmup_count = iterations;
        self
    }

    /// Set the number of measurement iterations.
    pub fn iterations(mut self, iterations: u64) -> Self {
        self.config.iteration_count = iterations;
        self
    }

    /// Set the precision mode.
    pub fn precision(mut self, precision: PrecisionMode) -> Self {
        self.config.precision = precision;
        self
    }

    /// Set the timing mode.
    pub fn timing_mode(mut self, timing_mode: TimingMode) -> Self {
        self.config.timing_mode = timing_mode;
        self
    }

    /// The configuration runs will use.
    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Run a benchmark of `unit` fed by `producer`.
    pub fn run<U, P>(&self, unit: &mut U, producer: &mut P) -> HarnessResult<U, P>
    where
        U: InferenceUnit,
        P: InputProducer<Item = U::Input>,
    {
        run(unit, producer, &self.config)
    }
}

/// Warm up `unit`, time `config.iteration_count` calls and aggregate them.
///
/// Stops early without error when `producer` is exhausted; the returned
/// `sample_count` is then smaller than requested. Zero collected samples is
/// an [`HarnessError::InsufficientSamples`] error.
pub fn run<U, P>(unit: &mut U, producer: &mut P, config: &BenchmarkConfig) -> HarnessResult<U, P>
where
    U: InferenceUnit,
    P: InputProducer<Item = U::Input>,
{
    config.validate()?;

    for iteration in 0..config.warmup_count {
        let Some(input) = fetch::<U::Error, P>(producer, Phase::Warmup, iteration)? else {
            break;
        };
        invoke::<U, P::Error>(unit, &input, Phase::Warmup, iteration)?;
    }

    let capacity = config.iteration_count.min(MAX_PREALLOCATED_SAMPLES) as usize;
    let mut samples: Vec<TimingSample> = Vec::with_capacity(capacity);

    for iteration in 0..config.iteration_count {
        let sample = match config.timing_mode {
            TimingMode::InferenceOnly => {
                let Some(input) = fetch::<U::Error, P>(producer, Phase::Timed, iteration)? else {
                    break;
                };
                let timer = Timer::start();
                invoke::<U, P::Error>(unit, &input, Phase::Timed, iteration)?;
                timer.sample()
            }
            TimingMode::EndToEnd => {
                let timer = Timer::start();
                let Some(input) = fetch::<U::Error, P>(producer, Phase::Timed, iteration)? else {
                    break;
                };
                invoke::<U, P::Error>(unit, &input, Phase::Timed, iteration)?;
                timer.sample()
            }
        };
        samples.push(sample);
    }

    BenchmarkResult::from_samples(&samples).ok_or(HarnessError::InsufficientSamples {
        requested: config.iteration_count,
    })
}

fn fetch<E, P>(
    producer: &mut P,
    phase: Phase,
    iteration: u64,
) -> Result<Option<P::Item>, HarnessError<E, P::Error>>
where
    P: InputProducer,
{
    producer
        .next_input()
        .map_err(|source| HarnessError::Input {
            phase,
            iteration,
            source,
        })
}

fn invoke<U, E>(
    unit: &mut U,
    input: &U::Input,
    phase: Phase,
    iteration: u64,
) -> Result<(), HarnessError<U::Error, E>>
where
    U: InferenceUnit,
{
    unit.infer(input).map_err(|source| HarnessError::Inference {
        phase,
        iteration,
        source,
    })
}

/// Timer for measuring individual operations on the monotonic clock.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Stop the timer and record the elapsed time as a sample.
    pub fn sample(self) -> TimingSample {
        TimingSample::from_duration(self.start.elapsed())
    }
}

/// Measure the execution time of a closure.
pub fn measure<F, T>(f: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    (result, elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::{from_fn, FiniteInputs, StaticInput};
    use std::convert::Infallible;
    use std::thread;

    #[derive(Debug, Error, PartialEq)]
    #[error("backend failure at call {0}")]
    struct FakeError(u64);

    #[derive(Debug, Error, PartialEq)]
    #[error("camera unplugged at fetch {0}")]
    struct CaptureError(u64);

    /// Producer that fails on the given zero-based fetch.
    fn failing_capture(
        fail_at: u64,
    ) -> impl InputProducer<Item = u8, Error = CaptureError> {
        let mut fetches = 0u64;
        from_fn(move || {
            let fetch = fetches;
            fetches += 1;
            if fetch == fail_at {
                Err(CaptureError(fetch))
            } else {
                Ok(Some(0u8))
            }
        })
    }

    /// Sleeps a fixed time per call.
    struct SleepUnit {
        latency: Duration,
        calls: u64,
    }

    impl SleepUnit {
        fn new(latency: Duration) -> Self {
            Self { latency, calls: 0 }
        }
    }

    impl InferenceUnit for SleepUnit {
        type Input = u8;
        type Error = FakeError;

        fn infer(&mut self, _input: &u8) -> Result<(), FakeError> {
            self.calls += 1;
            thread::sleep(self.latency);
            Ok(())
        }
    }

    /// Slow for the first `slow_calls` calls, fast afterwards.
    struct SlowStartUnit {
        slow_calls: u64,
        calls: u64,
    }

    impl InferenceUnit for SlowStartUnit {
        type Input = u8;
        type Error = FakeError;

        fn infer(&mut self, _input: &u8) -> Result<(), FakeError> {
            let latency = if self.calls < self.slow_calls {
                Duration::from_millis(50)
            } else {
                Duration::from_millis(1)
            };
            self.calls += 1;
            thread::sleep(latency);
            Ok(())
        }
    }

    /// Fails on the given zero-based call.
    struct FailingUnit {
        fail_at: u64,
        calls: u64,
    }

    impl InferenceUnit for FailingUnit {
        type Input = u8;
        type Error = FakeError;

        fn infer(&mut self, _input: &u8) -> Result<(), FakeError> {
            let call = self.calls;
            self.calls += 1;
            if call == self.fail_at {
                Err(FakeError(call))
            } else {
                Ok(())
            }
        }
    }

    /// Counts fetches and sleeps while "capturing".
    struct SlowCapture {
        capture: Duration,
        fetches: u64,
    }

    impl InputProducer for SlowCapture {
        type Item = u8;
        type Error = Infallible;

        fn next_input(&mut self) -> Result<Option<u8>, Infallible> {
            self.fetches += 1;
            thread::sleep(self.capture);
            Ok(Some(0))
        }
    }

    #[test]
    fn test_fixed_latency_mean_and_throughput() {
        let mut unit = SleepUnit::new(Duration::from_millis(10));
        let mut producer = StaticInput::new(0u8);
        let config = BenchmarkConfig::new(0, 20);

        let result = run(&mut unit, &mut producer, &config).unwrap();

        assert_eq!(result.sample_count, 20);
        assert!(result.mean_latency_ms >= 10.0, "mean {}", result.mean_latency_ms);
        assert!(result.mean_latency_ms < 25.0, "mean {}", result.mean_latency_ms);
        assert!(result.throughput_per_sec <= 100.0);
        assert!(result.throughput_per_sec > 40.0);
        assert!((result.throughput_per_sec - 1000.0 / result.mean_latency_ms).abs() < 1e-9);
    }

    #[test]
    fn test_warmup_then_measure_scenario() {
        let mut unit = SleepUnit::new(Duration::from_millis(5));
        let mut producer = StaticInput::new(0u8);
        let harness = BenchmarkHarness::new().warmup(5).iterations(50);

        let result = harness.run(&mut unit, &mut producer).unwrap();

        assert_eq!(unit.calls, 55);
        assert_eq!(result.sample_count, 50);
        assert!(result.mean_latency_ms >= 5.0);
        assert!(result.mean_latency_ms < 15.0);
        assert!(result.throughput_per_sec <= 200.0);
    }

    #[test]
    fn test_warmup_excluded_from_statistics() {
        let mut unit = SlowStartUnit {
            slow_calls: 3,
            calls: 0,
        };
        let mut producer = StaticInput::new(0u8);
        let config = BenchmarkConfig::new(3, 10);

        let result = run(&mut unit, &mut producer, &config).unwrap();

        assert_eq!(result.sample_count, 10);
        // Every timed call is a 1ms call; a 50ms warmup leaking in would show up in max.
        assert!(result.max_latency_ms < 45.0, "max {}", result.max_latency_ms);
        assert!(result.mean_latency_ms < 45.0);
    }

    #[test]
    fn test_statistics_ordering() {
        let mut unit = SleepUnit::new(Duration::from_micros(200));
        let mut producer = StaticInput::new(0u8);
        let result = run(&mut unit, &mut producer, &BenchmarkConfig::new(2, 25)).unwrap();

        assert!(result.min_latency_ms <= result.mean_latency_ms);
        assert!(result.mean_latency_ms <= result.max_latency_ms);
    }

    #[test]
    fn test_early_exhaustion_reports_partial_samples() {
        let mut unit = SleepUnit::new(Duration::ZERO);
        let mut producer = FiniteInputs::new(vec![1u8, 2, 3]);
        let config = BenchmarkConfig::new(0, 10);

        let result = run(&mut unit, &mut producer, &config).unwrap();

        assert_eq!(result.sample_count, 3);
        assert_eq!(unit.calls, 3);
    }

    #[test]
    fn test_exhaustion_counts_in_both_timing_modes() {
        for mode in [TimingMode::InferenceOnly, TimingMode::EndToEnd] {
            let mut unit = SleepUnit::new(Duration::ZERO);
            let mut producer = FiniteInputs::new(vec![0u8; 4]);
            let config = BenchmarkConfig::new(0, 10).with_timing_mode(mode);

            let result = run(&mut unit, &mut producer, &config).unwrap();
            assert_eq!(result.sample_count, 4, "mode {}", mode);
        }
    }

    #[test]
    fn test_immediate_exhaustion_is_insufficient_samples() {
        let mut unit = SleepUnit::new(Duration::ZERO);
        let mut producer = FiniteInputs::new(Vec::<u8>::new());

        let err = run(&mut unit, &mut producer, &BenchmarkConfig::new(0, 10)).unwrap_err();

        assert!(matches!(
            err,
            HarnessError::InsufficientSamples { requested: 10 }
        ));
        assert_eq!(unit.calls, 0);
    }

    #[test]
    fn test_exhaustion_during_warmup() {
        let mut unit = SleepUnit::new(Duration::ZERO);
        let mut producer = FiniteInputs::new(vec![0u8; 2]);

        let err = run(&mut unit, &mut producer, &BenchmarkConfig::new(5, 10)).unwrap_err();

        assert!(matches!(err, HarnessError::InsufficientSamples { .. }));
        assert_eq!(unit.calls, 2);
    }

    #[test]
    fn test_zero_iterations_rejected_before_any_call() {
        let mut unit = SleepUnit::new(Duration::ZERO);
        let mut producer = SlowCapture {
            capture: Duration::ZERO,
            fetches: 0,
        };

        let err = run(&mut unit, &mut producer, &BenchmarkConfig::new(5, 0)).unwrap_err();

        assert!(matches!(err, HarnessError::Config(_)));
        assert_eq!(unit.calls, 0);
        assert_eq!(producer.fetches, 0);
    }

    #[test]
    fn test_inference_error_in_warmup_propagates() {
        let mut unit = FailingUnit {
            fail_at: 2,
            calls: 0,
        };
        let mut producer = StaticInput::new(0u8);

        let err = run(&mut unit, &mut producer, &BenchmarkConfig::new(5, 10)).unwrap_err();

        assert_eq!(err.location(), Some((Phase::Warmup, 2)));
        assert!(err.to_string().contains("warmup iteration 2"));
        assert_eq!(err.into_inference_error(), Some(FakeError(2)));
        assert_eq!(unit.calls, 3);
    }

    #[test]
    fn test_inference_error_in_timed_phase_propagates() {
        let mut unit = FailingUnit {
            fail_at: 7,
            calls: 0,
        };
        let mut producer = StaticInput::new(0u8);

        let err = run(&mut unit, &mut producer, &BenchmarkConfig::new(5, 10)).unwrap_err();

        // Call 7 overall is timed iteration 2 after five warmup calls.
        assert_eq!(err.location(), Some((Phase::Timed, 2)));
        assert_eq!(unit.calls, 8);
    }

    #[test]
    fn test_input_error_in_warmup_propagates() {
        let mut unit = SleepUnit::new(Duration::ZERO);
        let mut producer = failing_capture(1);

        let err = run(&mut unit, &mut producer, &BenchmarkConfig::new(3, 10)).unwrap_err();

        assert_eq!(err.location(), Some((Phase::Warmup, 1)));
        assert!(err.to_string().contains("Input producer failed in warmup iteration 1"));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.into_input_error(), Some(CaptureError(1)));
        assert_eq!(unit.calls, 1);
    }

    #[test]
    fn test_input_error_in_timed_phase_stops_run() {
        for mode in [TimingMode::InferenceOnly, TimingMode::EndToEnd] {
            let mut unit = SleepUnit::new(Duration::ZERO);
            let mut producer = failing_capture(3);
            let config = BenchmarkConfig::new(2, 10).with_timing_mode(mode);

            let err = run(&mut unit, &mut producer, &config).unwrap_err();

            // Fetch 3 overall is timed iteration 1 after two warmup fetches.
            assert_eq!(err.location(), Some((Phase::Timed, 1)), "mode {}", mode);
            assert!(matches!(
                err,
                HarnessError::Input {
                    phase: Phase::Timed,
                    iteration: 1,
                    ..
                }
            ));
            assert_eq!(err.into_input_error(), Some(CaptureError(3)));
            assert_eq!(unit.calls, 3);
        }
    }

    #[test]
    fn test_inference_error_is_not_an_input_error() {
        let mut unit = FailingUnit {
            fail_at: 0,
            calls: 0,
        };
        let mut producer = failing_capture(u64::MAX);

        let err = run(&mut unit, &mut producer, &BenchmarkConfig::new(0, 5)).unwrap_err();
        assert_eq!(err.into_input_error(), None);
    }

    #[test]
    fn test_end_to_end_includes_capture_time() {
        let config_for = |mode| BenchmarkConfig::new(0, 5).with_timing_mode(mode);

        let mut unit = SleepUnit::new(Duration::ZERO);
        let mut producer = SlowCapture {
            capture: Duration::from_millis(5),
            fetches: 0,
        };
        let e2e = run(&mut unit, &mut producer, &config_for(TimingMode::EndToEnd)).unwrap();
        assert!(e2e.min_latency_ms >= 5.0, "min {}", e2e.min_latency_ms);

        let mut producer = SlowCapture {
            capture: Duration::from_millis(5),
            fetches: 0,
        };
        let inference_only =
            run(&mut unit, &mut producer, &config_for(TimingMode::InferenceOnly)).unwrap();
        assert!(inference_only.min_latency_ms < 5.0);
        assert_eq!(producer.fetches, 5);
    }

    #[test]
    fn test_boxed_unit() {
        let mut unit: Box<dyn InferenceUnit<Input = u8, Error = FakeError>> =
            Box::new(SleepUnit::new(Duration::ZERO));
        let mut producer = StaticInput::new(0u8);

        let result = BenchmarkHarness::new()
            .warmup(1)
            .iterations(3)
            .run(&mut unit, &mut producer)
            .unwrap();
        assert_eq!(result.sample_count, 3);
    }

    #[test]
    fn test_timer() {
        let timer = Timer::start();
        thread::sleep(Duration::from_millis(10));
        let sample = timer.sample();

        assert!(sample.as_millis() >= 10.0, "Elapsed {} < 10ms", sample.as_millis());
    }

    #[test]
    fn test_measure() {
        let (result, duration) = measure(|| {
            thread::sleep(Duration::from_millis(5));
            42
        });

        assert_eq!(result, 42);
        assert!(duration >= Duration::from_millis(5));
    }
}
