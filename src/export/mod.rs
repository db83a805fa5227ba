//! Report Export
//!
//! Formats benchmark results and regression analyses for copy-out:
//!
//! - **JSON**: structure-preserving, parses back into an equal report
//! - **CSV**: fixed column order, one row per subject
//! - **Markdown**: summary, per-subject tables, comparisons, recommendations
//! - **Text**: plain-text rendition for terminals and logs
//!
//! Formatting is pure. Delivery goes through a [`ReportSink`].

mod markdown;
mod recommendations;
mod tabular;

pub use recommendations::{recommend, Recommendation, RecommendationTier};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::aggregator::AggregatedMetrics;
use crate::regression::{RegressionAnalysis, RegressionAnalyzer};
use crate::session::{BenchmarkResult, BenchmarkSession};

/// Output format of an exported report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
    Text,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => anyhow::bail!("Unknown export format: {}", other),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Text => "text",
        };
        f.write_str(name)
    }
}

/// Roll-up of every run of one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub runs: u32,
    pub latest_run: u64,
    pub mean_average_fps: f64,
    pub best_average_fps: f64,
    pub mean_score: f64,
    pub total_jank: u32,
    pub latest: AggregatedMetrics,
}

/// Aggregated report handed to the exporters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub summaries: BTreeMap<String, SubjectSummary>,
    pub results: Vec<BenchmarkResult>,
    #[serde(default)]
    pub comparisons: Vec<RegressionAnalysis>,
}

impl BenchmarkReport {
    /// Builds a report from every result in `session`
    pub fn from_session(title: &str, session: &BenchmarkSession, analyzer: &RegressionAnalyzer) -> Self {
        Self::from_results(title, session.results().to_vec(), analyzer)
    }

    pub fn from_results(title: &str, results: Vec<BenchmarkResult>, analyzer: &RegressionAnalyzer) -> Self {
        let mut session = BenchmarkSession::new();
        for result in results {
            session.import(result);
        }

        let mut summaries = BTreeMap::new();
        for subject in session.subjects() {
            let runs: Vec<&BenchmarkResult> = session.results_for(subject).collect();
            if let Some(summary) = summarize(&runs) {
                summaries.insert(subject.to_string(), summary);
            }
        }

        Self {
            title: title.to_string(),
            generated_at: Utc::now(),
            tags: BTreeSet::new(),
            summaries,
            comparisons: analyzer.analyze_session(&session),
            results: session.results().to_vec(),
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_string());
        self
    }

    pub fn latest_result(&self, subject: &str) -> Option<&BenchmarkResult> {
        self.results
            .iter()
            .filter(|r| r.subject == subject)
            .max_by_key(|r| r.run_index)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report to JSON")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse report JSON")
    }

    pub fn to_csv(&self) -> String {
        tabular::to_csv(self)
    }

    pub fn to_markdown(&self) -> String {
        markdown::to_markdown(self)
    }

    pub fn to_text(&self) -> String {
        tabular::to_text(self)
    }

    pub fn render(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => self.to_json(),
            ExportFormat::Csv => Ok(self.to_csv()),
            ExportFormat::Markdown => Ok(self.to_markdown()),
            ExportFormat::Text => Ok(self.to_text()),
        }
    }

    /// Suggested file name, e.g. `framescope-report-20240101-120000.md`
    pub fn suggested_filename(&self, prefix: &str, format: ExportFormat) -> String {
        format!(
            "{}-{}.{}",
            prefix,
            self.generated_at.format("%Y%m%d-%H%M%S"),
            format.extension()
        )
    }
}

fn summarize(runs: &[&BenchmarkResult]) -> Option<SubjectSummary> {
    let latest = runs.iter().max_by_key(|r| r.run_index)?;
    let count = runs.len() as f64;

    Some(SubjectSummary {
        runs: runs.len() as u32,
        latest_run: latest.run_index,
        mean_average_fps: runs.iter().map(|r| r.metrics.average_fps).sum::<f64>() / count,
        best_average_fps: runs
            .iter()
            .map(|r| r.metrics.average_fps)
            .fold(0.0, f64::max),
        mean_score: runs.iter().map(|r| r.metrics.performance_score).sum::<f64>() / count,
        total_jank: runs.iter().map(|r| r.metrics.jank_count).sum(),
        latest: latest.metrics.clone(),
    })
}

/// Destination of an exported report (clipboard, share sheet, file...)
pub trait ReportSink {
    fn deliver(&self, contents: &str, suggested_filename: &str) -> Result<()>;
}

/// Writes reports into a directory
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

impl ReportSink for FileSink {
    fn deliver(&self, contents: &str, suggested_filename: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create export directory: {}", self.dir.display()))?;
        let path = self.dir.join(suggested_filename);
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        info!("📄 Report written to {}", path.display());
        Ok(())
    }
}

/// Prints reports to standard output
#[derive(Debug, Clone, Default)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn deliver(&self, contents: &str, _suggested_filename: &str) -> Result<()> {
        println!("{}", contents);
        Ok(())
    }
}

/// Renders and hands a report to a sink. Delivery is fire-and-forget:
/// failures are logged, not returned.
pub fn export_to(report: &BenchmarkReport, format: ExportFormat, prefix: &str, sink: &dyn ReportSink) {
    let filename = report.suggested_filename(prefix, format);
    let delivered = report
        .render(format)
        .and_then(|contents| sink.deliver(&contents, &filename));

    if let Err(e) = delivered {
        warn!("⚠️ Report export failed ({}): {:#}", format, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::RunCapture;
    use tempfile::tempdir;

    fn metrics(fps: f64, jank: u32) -> AggregatedMetrics {
        AggregatedMetrics {
            average_fps: fps,
            min_fps: fps - 5.0,
            max_fps: fps + 1.0,
            percentile_95: fps - 4.0,
            percentile_99: fps - 5.0,
            jank_count: jank,
            performance_score: fps / 60.0 * 100.0,
            sample_count: 120,
            ..AggregatedMetrics::default()
        }
    }

    pub(super) fn sample_report() -> BenchmarkReport {
        let mut session = BenchmarkSession::new();
        session.record("bottom-sheet", metrics(52.0, 3), RunCapture::default());
        session.record(
            "modal, legacy",
            metrics(58.0, 0),
            RunCapture {
                mount_time_ms: Some(120.0),
                ..RunCapture::default()
            },
        );
        session.record("bottom-sheet", metrics(57.5, 1), RunCapture::default());

        BenchmarkReport::from_session("Modal comparison", &session, &RegressionAnalyzer::default())
            .with_tag("ci")
    }

    #[test]
    fn test_json_round_trip() {
        let report = sample_report();
        let json = report.to_json().unwrap();
        let parsed = BenchmarkReport::from_json(&json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_summaries_and_comparisons() {
        let report = sample_report();
        assert_eq!(report.summaries.len(), 2);

        let sheet = &report.summaries["bottom-sheet"];
        assert_eq!(sheet.runs, 2);
        assert_eq!(sheet.total_jank, 4);
        assert_eq!(sheet.best_average_fps, 57.5);

        assert_eq!(report.comparisons.len(), 1);
        assert_eq!(report.comparisons[0].subject, "bottom-sheet");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_file_sink_writes() {
        let dir = tempdir().unwrap();
        let report = sample_report();
        let sink = FileSink::new(dir.path());

        export_to(&report, ExportFormat::Csv, "bench", &sink);

        let filename = report.suggested_filename("bench", ExportFormat::Csv);
        let written = std::fs::read_to_string(dir.path().join(filename)).unwrap();
        assert_eq!(written, report.to_csv());
    }
}
