// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `vbench validate` command - Validate a suite configuration file.

use visionbench_core::SuiteConfigLoader;

pub async fn execute(file: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file, "Validating suite configuration");

    match SuiteConfigLoader::load_file(file) {
        Ok(suite) => {
            println!("✓ Suite configuration is valid");
            println!();
            println!("Run Settings:");
            println!("  Warmup:      {}", suite.run.warmup_count);
            println!("  Iterations:  {}", suite.run.iteration_count);
            println!("  Precision:   {}", suite.run.precision);
            println!("  Timing:      {}", suite.run.timing_mode);
            println!("  Input:       {}", suite.input);
            println!("  Output Dir:  {}", suite.output_dir.display());
            println!();
            println!("Models ({}):", suite.models.len());
            for model in &suite.models {
                match (&model.path, model.latency_ms) {
                    (Some(path), _) => {
                        println!("  - {} ({}, {})", model.id, model.format, path.display())
                    }
                    (None, Some(latency_ms)) => {
                        println!("  - {} ({}, {}ms per call)", model.id, model.format, latency_ms)
                    }
                    (None, None) => println!("  - {} ({})", model.id, model.format),
                }
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Suite configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
