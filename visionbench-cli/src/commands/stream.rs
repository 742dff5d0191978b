// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `vbench stream` command - End-to-end latency on a frame source.
//!
//! Each timed sample covers reading, decoding and resizing a frame plus the
//! inference call, like a live camera feed would.

use std::path::{Path, PathBuf};

use clap::Args;
use visionbench_benchmark::{
    format_latency_ms, run, BenchmarkResult, MarkdownReporter, ModelRecord, ResultSink,
    SuiteReport,
};
use visionbench_core::{
    BenchmarkConfig, HardValidationError, InputShape, ModelSpec, PrecisionMode, SystemInfo,
    TimingMode,
};

use super::{ModelArgs, RunError};
use crate::backend::{self, LoadOptions};
use crate::frames::FrameDirectory;

const LATENCY_LOG_FILE: &str = "webcam_latency_results.md";
const SUITE_NAME: &str = "stream";

#[derive(Debug, Clone, Args)]
pub struct StreamArgs {
    /// Directory of frames (jpg, png, bmp) read in file-name order
    #[arg(short, long)]
    pub frames: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Timed frames
    #[arg(short = 'n', long, default_value_t = 200)]
    pub count: u64,

    /// Untimed warmup frames
    #[arg(short, long, default_value_t = 30)]
    pub warmup: u64,

    /// Model input width
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Model input height
    #[arg(long, default_value_t = 640)]
    pub height: u32,

    /// Start over at the first frame when the directory runs out
    #[arg(long)]
    pub repeat: bool,

    /// Run the model at reduced (FP16) precision
    #[arg(long)]
    pub fp16: bool,

    /// Output directory for the latency log
    #[arg(short, long, default_value = "results")]
    pub output: PathBuf,
}

pub async fn execute(args: StreamArgs) -> Result<(), Box<dyn std::error::Error>> {
    let spec = args
        .model
        .to_spec()?
        .ok_or_else(|| HardValidationError::MissingRequiredField {
            field: "model",
            context: "stream (pass --model <id>)".to_string(),
        })?;
    let input = InputShape::new(args.width, args.height)?;
    let config = BenchmarkConfig::new(args.warmup, args.count)
        .with_precision(PrecisionMode::from_half(args.fp16))
        .with_timing_mode(TimingMode::EndToEnd);
    config.validate()?;

    tracing::info!(
        model = %spec.id,
        frames = %args.frames.display(),
        warmup = config.warmup_count,
        count = config.iteration_count,
        "Starting stream latency test"
    );

    println!("▶ {} on frames from {}", spec.id, args.frames.display());

    let frames = args.frames.clone();
    let repeat = args.repeat;
    let task_spec = spec.clone();
    let result = tokio::task::spawn_blocking(move || {
        stream_model(&task_spec, &frames, repeat, input, &config)
    })
    .await??;

    print_result(&result);

    if result.sample_count < config.iteration_count {
        tracing::warn!(
            requested = config.iteration_count,
            collected = result.sample_count,
            "Frame source ran out before the requested count"
        );
    }

    let record = ModelRecord::new(
        spec.id,
        spec.format,
        config.precision,
        config.timing_mode,
        input,
        result,
    );
    let mut report = SuiteReport::with_system_info(SUITE_NAME, SystemInfo::collect());
    report.add_record(record);

    let log_path = MarkdownReporter::latency_log(args.output.join(LATENCY_LOG_FILE)).write(&report)?;
    println!("Results appended to {}", log_path.display());

    Ok(())
}

fn stream_model(
    spec: &ModelSpec,
    frames: &Path,
    repeat: bool,
    input: InputShape,
    config: &BenchmarkConfig,
) -> Result<BenchmarkResult, RunError> {
    let options = LoadOptions {
        precision: config.precision,
        input,
    };
    let mut unit = backend::load(spec, &options)?;
    let mut producer = FrameDirectory::open(frames, input)?.repeat(repeat);

    Ok(run(&mut unit, &mut producer, config)?)
}

fn print_result(result: &BenchmarkResult) {
    println!();
    println!("Frames timed:        {}", result.sample_count);
    println!("Average latency:     {}", format_latency_ms(result.mean_latency_ms));
    println!("Min latency:         {}", format_latency_ms(result.min_latency_ms));
    println!("Max latency:         {}", format_latency_ms(result.max_latency_ms));
    println!("Theoretical max FPS: {:.2}", result.throughput_per_sec);
    println!();
}
