// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Result sinks: JSON reports and Markdown tables.
//!
//! JSON files keep the full record for later analysis. Markdown output is the
//! human-readable table committed next to results.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::metrics::SuiteReport;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Anything that persists a suite report.
pub trait ResultSink {
    /// Persist `report`, returning the path written.
    fn write(&self, report: &SuiteReport) -> Result<PathBuf, ReporterError>;
}

/// Hex digits of the run id kept in report file names.
const RUN_ID_PREFIX_LEN: usize = 8;

/// JSON reporter for benchmark results.
pub struct JsonReporter {
    /// Output directory for benchmark data
    output_dir: PathBuf,
}

impl JsonReporter {
    /// Create a new JSON reporter with the specified output directory.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, ReporterError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Save a report to `<suite>_<timestamp>_<run id prefix>.json`.
    ///
    /// Returns the path to the created file. An existing file is never
    /// replaced.
    pub fn save(&self, report: &SuiteReport) -> Result<PathBuf, ReporterError> {
        let timestamp = report.timestamp.format("%Y-%m-%dT%H-%M-%SZ");
        let run_id = report.run_id.simple().to_string();
        let filename = format!(
            "{}_{}_{}.json",
            report.suite,
            timestamp,
            &run_id[..RUN_ID_PREFIX_LEN]
        );
        let filepath = self.output_dir.join(&filename);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&filepath)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, report)?;

        Ok(filepath)
    }

    /// List all existing report files in the output directory.
    pub fn list_reports(&self) -> Result<Vec<PathBuf>, ReporterError> {
        let mut reports = Vec::new();
        for entry in fs::read_dir(&self.output_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                reports.push(path);
            }
        }
        reports.sort();
        Ok(reports)
    }

    /// Load an existing report from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<SuiteReport, ReporterError> {
        let file = File::open(path)?;
        let report = serde_json::from_reader(file)?;
        Ok(report)
    }
}

impl ResultSink for JsonReporter {
    fn write(&self, report: &SuiteReport) -> Result<PathBuf, ReporterError> {
        self.save(report)
    }
}

/// Table layout written by a [`MarkdownReporter`].
#[derive(Debug, Clone)]
enum MarkdownLayout {
    /// Whole file rewritten: title, device line, FPS table, failures.
    SpeedTable { title: String },
    /// Rows appended to a running latency log.
    LatencyLog,
}

const LATENCY_LOG_HEADER: &str = "| Model | Resolution | Avg Latency (ms) | Min (ms) | Max (ms) |\n\
                                  |-------|------------|-----------------:|---------:|---------:|\n";

/// Markdown table writer.
pub struct MarkdownReporter {
    path: PathBuf,
    layout: MarkdownLayout,
}

impl MarkdownReporter {
    /// Overwrites `path` with an FPS / latency table on every write.
    pub fn speed_table(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            layout: MarkdownLayout::SpeedTable {
                title: title.into(),
            },
        }
    }

    /// Appends one row per record to `path`, adding the header to a new file.
    pub fn latency_log(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layout: MarkdownLayout::LatencyLog,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(&self) -> Result<(), ReporterError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn write_speed_table(&self, title: &str, report: &SuiteReport) -> Result<(), ReporterError> {
        let mut out = BufWriter::new(File::create(&self.path)?);

        writeln!(out, "# {}", title)?;
        writeln!(out)?;
        writeln!(out, "**Device:** {}", report.device_label())?;
        writeln!(out)?;
        writeln!(out, "| Model | Format | FPS | Latency (ms) |")?;
        writeln!(out, "|-------|--------|----:|--------------:|")?;
        for record in &report.records {
            writeln!(
                out,
                "| {} | {} | {:.2} | {:.2} |",
                record.model,
                record.format_label(),
                record.result.throughput_per_sec,
                record.result.mean_latency_ms
            )?;
        }

        if !report.failures.is_empty() {
            writeln!(out)?;
            writeln!(out, "## Failures")?;
            writeln!(out)?;
            for failure in &report.failures {
                writeln!(out, "- {} ({}): {}", failure.model, failure.format, failure.error)?;
            }
        }

        out.flush()?;
        Ok(())
    }

    fn append_latency_rows(&self, report: &SuiteReport) -> Result<(), ReporterError> {
        let is_new = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut out = BufWriter::new(file);

        if is_new {
            out.write_all(LATENCY_LOG_HEADER.as_bytes())?;
        }

        for record in &report.records {
            writeln!(
                out,
                "| {} | {} | {:.2} | {:.2} | {:.2} |",
                record.model,
                record.input,
                record.result.mean_latency_ms,
                record.result.min_latency_ms,
                record.result.max_latency_ms
            )?;
        }

        out.flush()?;
        Ok(())
    }
}

impl ResultSink for MarkdownReporter {
    fn write(&self, report: &SuiteReport) -> Result<PathBuf, ReporterError> {
        self.ensure_parent()?;
        match &self.layout {
            MarkdownLayout::SpeedTable { title } => self.write_speed_table(title, report)?,
            MarkdownLayout::LatencyLog => self.append_latency_rows(report)?,
        }
        Ok(self.path.clone())
    }
}
