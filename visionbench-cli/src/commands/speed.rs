// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `vbench speed` command - Benchmark models on a fixed input.
//!
//! Every model gets the same zero-valued frame, so only inference time is
//! measured. Models that fail to load or run are recorded and skipped.

use std::path::PathBuf;

use clap::Args;
use visionbench_benchmark::{
    format_latency_ms, measure, run, Frame, JsonReporter, MarkdownReporter, ModelRecord,
    ResultSink, StaticInput, SuiteReport,
};
use visionbench_core::{
    BenchmarkConfig, EnvironmentProbe, HardValidationError, InputShape, ModelFormat, ModelSpec,
    PrecisionMode, SuiteConfig, SuiteConfigLoader, TimingMode,
};

use super::{ModelArgs, RunError};
use crate::backend::{self, LoadOptions};

/// Markdown table written next to the JSON report.
const SPEED_TABLE_FILE: &str = "yolo_speed_results.md";
const SPEED_TABLE_TITLE: &str = "YOLO Speed Benchmarks";
const SUITE_NAME: &str = "speed";

#[derive(Debug, Clone, Args)]
pub struct SpeedArgs {
    /// Suite configuration file (YAML)
    #[arg(short, long, conflicts_with = "model")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Timed iterations per model
    #[arg(short = 'n', long)]
    pub iterations: Option<u64>,

    /// Untimed warmup iterations per model
    #[arg(short, long)]
    pub warmup: Option<u64>,

    /// Run every model at reduced (FP16) precision
    #[arg(long)]
    pub fp16: bool,

    /// Also benchmark each ONNX model through TensorRT at FP16
    #[arg(long)]
    pub accelerate: bool,

    /// Output directory for reports
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// One model in one format at one precision.
#[derive(Debug, Clone)]
struct Job {
    spec: ModelSpec,
    config: BenchmarkConfig,
}

pub async fn execute(args: SpeedArgs) -> Result<(), Box<dyn std::error::Error>> {
    let suite = resolve_suite(&args)?;
    let jobs = plan_jobs(&suite, args.accelerate);

    tracing::info!(
        models = suite.models.len(),
        jobs = jobs.len(),
        warmup = suite.run.warmup_count,
        iterations = suite.run.iteration_count,
        input = %suite.input,
        "Starting speed benchmark"
    );

    let environment = tokio::task::spawn_blocking(EnvironmentProbe::run).await?;
    let mut report = SuiteReport::with_system_info(SUITE_NAME, environment.system.clone())
        .with_device(environment.device_name());

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  VISIONBENCH SPEED BENCHMARK                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("Device: {}", report.device_label());
    println!();

    let input = suite.input;
    let mut interrupted = false;

    for job in jobs {
        let model = job.spec.id.clone();
        let format = job.spec.format;
        println!("▶ {} ({} {})", model, format, job.config.precision);

        let task = tokio::task::spawn_blocking(move || benchmark_model(&job, input));

        tokio::select! {
            joined = task => match joined {
                Ok(Ok(record)) => {
                    println!(
                        "  ✓ {:.2} FPS, {} mean over {} samples",
                        record.result.throughput_per_sec,
                        format_latency_ms(record.result.mean_latency_ms),
                        record.result.sample_count
                    );
                    report.add_record(record);
                }
                Ok(Err(e)) => {
                    tracing::warn!(model = %model, format = %format, error = %e, "Benchmark failed, skipping");
                    println!("  ✗ {}", e);
                    report.add_failure(model, format, e);
                }
                Err(e) => {
                    tracing::warn!(model = %model, format = %format, error = %e, "Benchmark task aborted");
                    println!("  ✗ {}", e);
                    report.add_failure(model, format, e);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!(model = %model, "Interrupted, writing partial report");
                println!("  ✗ interrupted");
                interrupted = true;
                break;
            }
        }
    }

    let json_path = JsonReporter::new(&suite.output_dir)?.write(&report)?;
    let table_path =
        MarkdownReporter::speed_table(suite.output_dir.join(SPEED_TABLE_FILE), SPEED_TABLE_TITLE)
            .write(&report)?;

    print_summary(&report);
    println!("Results saved to:");
    println!("  {}", json_path.display());
    println!("  {}", table_path.display());

    if interrupted {
        std::process::exit(130);
    }
    Ok(())
}

/// Suite from `--config`, or a one-model suite from `--model`, with flag
/// overrides applied.
fn resolve_suite(args: &SpeedArgs) -> Result<SuiteConfig, Box<dyn std::error::Error>> {
    let mut suite = match (&args.config, args.model.to_spec()?) {
        (Some(path), _) => SuiteConfigLoader::load_file(path)?,
        (None, Some(spec)) => SuiteConfig {
            run: BenchmarkConfig::default(),
            input: InputShape::DEFAULT,
            output_dir: PathBuf::from("results"),
            models: vec![spec],
        },
        (None, None) => {
            return Err(HardValidationError::MissingRequiredField {
                field: "model",
                context: "speed (pass --config <file> or --model <id>)".to_string(),
            }
            .into())
        }
    };

    if let Some(warmup) = args.warmup {
        suite.run.warmup_count = warmup;
    }
    if let Some(iterations) = args.iterations {
        suite.run.iteration_count = iterations;
    }
    if args.fp16 {
        suite.run.precision = PrecisionMode::Reduced;
    }
    if let Some(output) = &args.output {
        suite.output_dir = output.clone();
    }
    suite.run.timing_mode = TimingMode::InferenceOnly;
    suite.run.validate()?;

    Ok(suite)
}

/// Expand the suite into jobs; `accelerate` adds a TensorRT FP16 job after
/// each ONNX model.
fn plan_jobs(suite: &SuiteConfig, accelerate: bool) -> Vec<Job> {
    let mut jobs = Vec::with_capacity(suite.models.len() * 2);

    for spec in &suite.models {
        jobs.push(Job {
            spec: spec.clone(),
            config: suite.run,
        });

        if accelerate && spec.format == ModelFormat::Onnx {
            jobs.push(Job {
                spec: spec.with_format(ModelFormat::TensorRt),
                config: suite.run.with_precision(PrecisionMode::Reduced),
            });
        }
    }

    jobs
}

fn benchmark_model(job: &Job, input: InputShape) -> Result<ModelRecord, RunError> {
    let options = LoadOptions {
        precision: job.config.precision,
        input,
    };

    let (loaded, load_time) = measure(|| backend::load(&job.spec, &options));
    let mut unit = loaded?;
    tracing::debug!(model = %job.spec.id, load_ms = load_time.as_secs_f64() * 1_000.0, "Model loaded");

    let mut producer = StaticInput::new(Frame::zeros(input));
    let result = run(&mut unit, &mut producer, &job.config)?;

    Ok(ModelRecord::new(
        job.spec.id.clone(),
        job.spec.format,
        job.config.precision,
        job.config.timing_mode,
        input,
        result,
    )
    .with_metadata("load_time_ms", load_time.as_secs_f64() * 1_000.0)
    .with_metadata("warmup", job.config.warmup_count))
}

fn print_summary(report: &SuiteReport) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                           SUMMARY                            ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    for record in &report.records {
        println!(
            "║ {:<14} {:<22} {:>9.2} FPS {:>9.2} ms ║",
            record.model.as_str(),
            record.format_label(),
            record.result.throughput_per_sec,
            record.result.mean_latency_ms
        );
    }
    for failure in &report.failures {
        println!(
            "║ {:<14} {:<22} {:>26} ║",
            failure.model.as_str(),
            failure.format.to_string(),
            "FAILED"
        );
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}
