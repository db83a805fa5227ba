//! Regression Analysis
//!
//! Compares two benchmark results of the same subject metric by metric and
//! rolls the per-metric changes up into a weighted overall improvement.
//!
//! Two thresholds are used on purpose:
//! - changes below `unchanged_percent` (1 %) are bucketed as unchanged
//! - changes of at least `significance_percent` (5 %) are flagged significant

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{MetricWeights, RegressionConfig};
use crate::session::{BenchmarkResult, BenchmarkSession};

/// Metrics tracked across benchmark runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedMetric {
    Fps,
    TimeToInteractive,
    MountTime,
    DroppedFrames,
    JankScore,
    Memory,
    RenderPasses,
    TouchResponse,
}

impl TrackedMetric {
    pub const ALL: [TrackedMetric; 8] = [
        TrackedMetric::Fps,
        TrackedMetric::TimeToInteractive,
        TrackedMetric::MountTime,
        TrackedMetric::DroppedFrames,
        TrackedMetric::JankScore,
        TrackedMetric::Memory,
        TrackedMetric::RenderPasses,
        TrackedMetric::TouchResponse,
    ];

    pub fn higher_is_better(&self) -> bool {
        matches!(self, TrackedMetric::Fps)
    }

    pub fn weight(&self, weights: &MetricWeights) -> f64 {
        match self {
            TrackedMetric::Fps => weights.fps,
            TrackedMetric::TimeToInteractive => weights.time_to_interactive,
            TrackedMetric::MountTime => weights.mount_time,
            TrackedMetric::DroppedFrames => weights.dropped_frames,
            TrackedMetric::JankScore => weights.jank_score,
            TrackedMetric::Memory => weights.memory,
            TrackedMetric::RenderPasses => weights.render_passes,
            TrackedMetric::TouchResponse => weights.touch_response,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrackedMetric::Fps => "FPS",
            TrackedMetric::TimeToInteractive => "Time to interactive (ms)",
            TrackedMetric::MountTime => "Mount time (ms)",
            TrackedMetric::DroppedFrames => "Dropped frames",
            TrackedMetric::JankScore => "Jank events",
            TrackedMetric::Memory => "Memory (bytes)",
            TrackedMetric::RenderPasses => "Render passes",
            TrackedMetric::TouchResponse => "Touch response (ms)",
        }
    }
}

/// Normalized per-metric view of a benchmark result.
///
/// Native profiler values win over sampled or estimated ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackedMetrics {
    values: BTreeMap<TrackedMetric, f64>,
}

impl TrackedMetrics {
    pub fn from_result(result: &BenchmarkResult) -> Self {
        let metrics = &result.metrics;
        let capture = &result.capture;
        let native = capture.native.clone().unwrap_or_default();
        let sampled = metrics.sample_count > 0;

        let mut values = BTreeMap::new();
        let mut put = |metric: TrackedMetric, value: Option<f64>| {
            if let Some(value) = value.filter(|v| v.is_finite()) {
                values.insert(metric, value);
            }
        };

        put(
            TrackedMetric::Fps,
            native.fps.or(sampled.then_some(metrics.average_fps)),
        );
        put(
            TrackedMetric::TimeToInteractive,
            native.time_to_interactive_ms.or(capture.time_to_interactive_ms),
        );
        put(TrackedMetric::MountTime, capture.mount_time_ms);
        put(
            TrackedMetric::DroppedFrames,
            sampled.then_some(metrics.dropped_frame_count as f64),
        );
        put(
            TrackedMetric::JankScore,
            sampled.then_some(metrics.jank_count as f64),
        );
        put(
            TrackedMetric::Memory,
            native.memory_bytes.or(capture.memory_growth_bytes),
        );
        put(
            TrackedMetric::RenderPasses,
            capture.render_passes.map(|passes| passes as f64),
        );
        put(TrackedMetric::TouchResponse, capture.touch_response_ms);

        Self { values }
    }

    pub fn get(&self, metric: TrackedMetric) -> Option<f64> {
        self.values.get(&metric).copied()
    }
}

/// Display bucket of a metric change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Improved,
    Regressed,
    Unchanged,
}

/// Comparison of one metric between two runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub change_percent: f64,
    pub improved: bool,
    pub significant: bool,
    pub status: ChangeStatus,
}

impl MetricComparison {
    /// `|change %|` signed by direction: positive when improved
    pub fn signed_magnitude(&self) -> f64 {
        if self.improved {
            self.change_percent.abs()
        } else if self.change == 0.0 {
            0.0
        } else {
            -self.change_percent.abs()
        }
    }
}

/// Comparison of two runs of the same subject, recomputed on every call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionAnalysis {
    pub subject: String,
    pub current_run: u64,
    pub previous_run: u64,
    pub metrics: BTreeMap<TrackedMetric, MetricComparison>,
    /// Weighted mean of signed percent changes; negative means net regression
    pub overall_improvement: f64,
}

impl RegressionAnalysis {
    pub fn get(&self, metric: TrackedMetric) -> Option<&MetricComparison> {
        self.metrics.get(&metric)
    }

    pub fn with_status(&self, status: ChangeStatus) -> impl Iterator<Item = (&TrackedMetric, &MetricComparison)> {
        self.metrics.iter().filter(move |(_, c)| c.status == status)
    }

    pub fn significant(&self) -> impl Iterator<Item = (&TrackedMetric, &MetricComparison)> {
        self.metrics.iter().filter(|(_, c)| c.significant)
    }

    pub fn is_net_regression(&self) -> bool {
        self.overall_improvement < 0.0
    }
}

/// Compares benchmark results
#[derive(Debug, Clone, Default)]
pub struct RegressionAnalyzer {
    config: RegressionConfig,
}

impl RegressionAnalyzer {
    pub fn new(config: RegressionConfig) -> Self {
        Self { config }
    }

    /// Compares `current` against `previous`.
    ///
    /// Returns `None` when either run is missing or the subjects differ.
    pub fn analyze(
        &self,
        current: Option<&BenchmarkResult>,
        previous: Option<&BenchmarkResult>,
    ) -> Option<RegressionAnalysis> {
        let (current, previous) = (current?, previous?);
        if current.subject != previous.subject {
            debug!(
                "cross-subject comparison rejected: '{}' vs '{}'",
                current.subject, previous.subject
            );
            return None;
        }

        let now = TrackedMetrics::from_result(current);
        let before = TrackedMetrics::from_result(previous);

        let mut metrics = BTreeMap::new();
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;

        for metric in TrackedMetric::ALL {
            let (Some(cur), Some(prev)) = (now.get(metric), before.get(metric)) else {
                continue;
            };

            let comparison = self.compare(metric, cur, prev);
            let weight = metric.weight(&self.config.weights);
            weighted_sum += weight * comparison.signed_magnitude();
            weight_total += weight;
            metrics.insert(metric, comparison);
        }

        let overall_improvement = if weight_total > 0.0 {
            weighted_sum / weight_total
        } else {
            0.0
        };

        Some(RegressionAnalysis {
            subject: current.subject.clone(),
            current_run: current.run_index,
            previous_run: previous.run_index,
            metrics,
            overall_improvement,
        })
    }

    fn compare(&self, metric: TrackedMetric, current: f64, previous: f64) -> MetricComparison {
        let change = current - previous;
        let change_percent = if previous == 0.0 {
            0.0
        } else {
            change / previous * 100.0
        };
        let improved = if metric.higher_is_better() {
            change > 0.0
        } else {
            change < 0.0
        };
        let status = if change_percent.abs() < self.config.unchanged_percent {
            ChangeStatus::Unchanged
        } else if improved {
            ChangeStatus::Improved
        } else {
            ChangeStatus::Regressed
        };

        MetricComparison {
            current,
            previous,
            change,
            change_percent,
            improved,
            significant: change_percent.abs() >= self.config.significance_percent,
            status,
        }
    }

    /// Compares the two most recent runs of `subject`
    pub fn analyze_latest(&self, session: &BenchmarkSession, subject: &str) -> Option<RegressionAnalysis> {
        let (current, previous) = session.latest_pair(subject)?;
        self.analyze(Some(current), Some(previous))
    }

    /// Latest-pair analysis for every subject with at least two runs
    pub fn analyze_session(&self, session: &BenchmarkSession) -> Vec<RegressionAnalysis> {
        session
            .subjects()
            .into_iter()
            .filter_map(|subject| self.analyze_latest(session, subject))
            .collect()
    }
}
