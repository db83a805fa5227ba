//! Benchmark sessions
//!
//! A session owns the ordered list of benchmark results produced by
//! start/stop test runs. Results are only removed by an explicit clear.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::aggregator::AggregatedMetrics;
use crate::capture::RunCapture;

/// Whether the subject had already been shown in this session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartKind {
    Cold,
    Warm,
}

/// One completed benchmark run of a UI subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Which UI variant was tested
    pub subject: String,
    /// Monotonically increasing within a session
    pub run_index: u64,
    pub start_kind: StartKind,
    pub recorded_at: DateTime<Utc>,
    pub metrics: AggregatedMetrics,
    pub capture: RunCapture,
}

/// In-memory result list owned by the calling harness
#[derive(Debug, Default)]
pub struct BenchmarkSession {
    results: Vec<BenchmarkResult>,
    next_run_index: u64,
    seen_subjects: HashSet<String>,
}

impl BenchmarkSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the result of a finished run
    pub fn record(
        &mut self,
        subject: &str,
        metrics: AggregatedMetrics,
        capture: RunCapture,
    ) -> &BenchmarkResult {
        let start_kind = if self.seen_subjects.insert(subject.to_string()) {
            StartKind::Cold
        } else {
            StartKind::Warm
        };

        self.next_run_index += 1;
        let result = BenchmarkResult {
            subject: subject.to_string(),
            run_index: self.next_run_index,
            start_kind,
            recorded_at: Utc::now(),
            metrics,
            capture,
        };

        info!(
            "🏁 Run #{} of '{}' ({:?}): {:.1} FPS, score {:.1}",
            result.run_index,
            result.subject,
            result.start_kind,
            result.metrics.average_fps,
            result.metrics.performance_score
        );

        self.results.push(result);
        &self.results[self.results.len() - 1]
    }

    /// Appends an already built result (e.g. loaded from a report)
    pub fn import(&mut self, result: BenchmarkResult) {
        self.next_run_index = self.next_run_index.max(result.run_index);
        self.seen_subjects.insert(result.subject.clone());
        self.results.push(result);
    }

    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    pub fn results_for<'a>(&'a self, subject: &'a str) -> impl Iterator<Item = &'a BenchmarkResult> {
        self.results.iter().filter(move |r| r.subject == subject)
    }

    /// Distinct subjects in first-seen order
    pub fn subjects(&self) -> Vec<&str> {
        let mut subjects: Vec<&str> = Vec::new();
        for result in &self.results {
            if !subjects.contains(&result.subject.as_str()) {
                subjects.push(&result.subject);
            }
        }
        subjects
    }

    pub fn latest(&self, subject: &str) -> Option<&BenchmarkResult> {
        self.results
            .iter()
            .filter(|r| r.subject == subject)
            .max_by_key(|r| r.run_index)
    }

    /// The two most recent runs of a subject as `(current, previous)`
    pub fn latest_pair(&self, subject: &str) -> Option<(&BenchmarkResult, &BenchmarkResult)> {
        let mut runs: Vec<&BenchmarkResult> =
            self.results.iter().filter(|r| r.subject == subject).collect();
        runs.sort_by_key(|r| r.run_index);
        let current = runs.pop()?;
        let previous = runs.pop()?;
        Some((current, previous))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Removes every result. Run indices keep increasing afterwards.
    pub fn clear(&mut self) {
        info!("🧹 Cleared {} benchmark results", self.results.len());
        self.results.clear();
        self.seen_subjects.clear();
    }

    /// Removes the results of one subject; its next run is cold again
    pub fn clear_subject(&mut self, subject: &str) {
        self.results.retain(|r| r.subject != subject);
        self.seen_subjects.remove(subject);
    }
}
