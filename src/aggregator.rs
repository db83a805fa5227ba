//! Metrics Aggregation
//!
//! Turns a buffer of frame samples into an immutable [`AggregatedMetrics`]
//! snapshot: mean/min/max FPS, low-tail FPS percentiles, frame-time variance
//! and a weighted 0-100 performance score.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::sampler::FrameSample;

/// Snapshot of frame performance, never mutated after creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    /// Mean FPS over samples with FPS > 0
    pub average_fps: f64,
    pub min_fps: f64,
    pub max_fps: f64,
    /// `sorted_ascending[floor(n * 0.05)]`, i.e. the low tail of the FPS distribution
    pub percentile_95: f64,
    /// `sorted_ascending[floor(n * 0.01)]`
    pub percentile_99: f64,
    pub dropped_frame_count: u32,
    pub jank_count: u32,
    /// Population variance of frame durations (ms²)
    pub frame_time_variance: f64,
    /// Weighted 0-100 score
    pub performance_score: f64,
    /// Samples contributing to the FPS statistics
    pub sample_count: u32,
}

impl AggregatedMetrics {
    /// Share of valid frames that were dropped, in percent
    pub fn drop_rate_percent(&self) -> f64 {
        rate_percent(self.dropped_frame_count, self.sample_count)
    }

    /// Share of valid frames that were janky, in percent
    pub fn jank_rate_percent(&self) -> f64 {
        rate_percent(self.jank_count, self.sample_count)
    }
}

fn rate_percent(count: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Computes [`AggregatedMetrics`] from frame samples
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    target_fps: f64,
    scoring: ScoringConfig,
}

impl MetricsAggregator {
    pub fn new(target_fps: f64, scoring: ScoringConfig) -> Self {
        Self { target_fps, scoring }
    }

    pub fn aggregate<'a, I>(&self, samples: I) -> AggregatedMetrics
    where
        I: IntoIterator<Item = &'a FrameSample>,
    {
        let mut fps_values = Vec::new();
        let mut durations = Vec::new();
        let mut dropped = 0u32;
        let mut jank = 0u32;

        for sample in samples {
            if sample.fps > 0.0 {
                fps_values.push(sample.fps);
            }
            if sample.frame_duration_ms > 0.0 {
                durations.push(sample.frame_duration_ms);
            }
            if sample.is_dropped {
                dropped += 1;
            }
            if sample.is_jank {
                jank += 1;
            }
        }

        if fps_values.is_empty() {
            return AggregatedMetrics {
                dropped_frame_count: dropped,
                jank_count: jank,
                ..AggregatedMetrics::default()
            };
        }

        let n = fps_values.len();
        let average_fps = fps_values.iter().sum::<f64>() / n as f64;

        fps_values.sort_by(|a, b| a.total_cmp(b));
        let min_fps = fps_values[0];
        let max_fps = fps_values[n - 1];
        let percentile_95 = fps_values[low_tail_index(n, 0.05)];
        let percentile_99 = fps_values[low_tail_index(n, 0.01)];

        let mut metrics = AggregatedMetrics {
            average_fps,
            min_fps,
            max_fps,
            percentile_95,
            percentile_99,
            dropped_frame_count: dropped,
            jank_count: jank,
            frame_time_variance: population_variance(&durations),
            performance_score: 0.0,
            sample_count: n as u32,
        };
        metrics.performance_score = self.score(&metrics);

        debug!(
            "📊 Aggregated {} samples: avg {:.1} FPS, p95 {:.1}, score {:.1}",
            n, metrics.average_fps, metrics.percentile_95, metrics.performance_score
        );

        metrics
    }

    /// Weighted score: FPS ratio + drop-rate penalty + jank-rate penalty.
    ///
    /// Each sub-score is clamped to zero independently, the sum to 0..=100.
    pub fn score(&self, metrics: &AggregatedMetrics) -> f64 {
        let s = &self.scoring;

        let fps_ratio = if self.target_fps > 0.0 {
            (metrics.average_fps / self.target_fps).min(1.0)
        } else {
            0.0
        };
        let fps_score = (s.fps_weight * fps_ratio).max(0.0);

        let drop_score =
            (s.drop_weight - metrics.drop_rate_percent() * s.drop_penalty_per_percent).max(0.0);
        let jank_score =
            (s.jank_weight - metrics.jank_rate_percent() * s.jank_penalty_per_percent).max(0.0);

        (fps_score + drop_score + jank_score).clamp(0.0, 100.0)
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new(60.0, ScoringConfig::default())
    }
}

fn low_tail_index(n: usize, fraction: f64) -> usize {
    ((n as f64 * fraction).floor() as usize).min(n - 1)
}

/// Population (not sample) variance
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64
}
