// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! visionbench CLI
//!
//! Command-line driver for benchmarking object-detection inference backends.

use clap::{Parser, Subcommand};

mod backend;
mod commands;
mod frames;

use commands::speed::SpeedArgs;
use commands::stream::StreamArgs;

/// visionbench - Latency and throughput benchmarks for detection models
#[derive(Parser)]
#[command(name = "vbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Benchmark models on a fixed input and write speed reports
    Speed(SpeedArgs),

    /// Measure end-to-end latency over a directory of frames
    Stream(StreamArgs),

    /// Show the host and available acceleration backends
    Probe {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a suite configuration file
    Validate {
        /// Path to the suite YAML file
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Speed(args) => commands::speed::execute(args).await,
        Commands::Stream(args) => commands::stream::execute(args).await,
        Commands::Probe { json } => commands::probe::execute(json).await,
        Commands::Validate { file } => commands::validate::execute(&file).await,
    }
}
