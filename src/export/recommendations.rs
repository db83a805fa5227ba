//! Tiered recommendations derived from report data

use serde::{Deserialize, Serialize};

use super::BenchmarkReport;
use crate::regression::ChangeStatus;

/// FPS below this is critical
const CRITICAL_FPS: f64 = 30.0;
/// FPS below this deserves work
const TARGET_FPS: f64 = 55.0;
/// Jank rate (percent) above this is critical
const CRITICAL_JANK_PERCENT: f64 = 5.0;
/// Drop rate (percent) above this deserves work
const DROP_PERCENT: f64 = 10.0;
/// Scores below this are critical
const CRITICAL_SCORE: f64 = 50.0;
/// Mount time (ms) above this deserves work
const SLOW_MOUNT_MS: f64 = 300.0;
/// Render passes above this suggest missing memoization
const RENDER_PASS_BUDGET: u64 = 100;
/// Memory growth (bytes) above this suggests a leak
const MEMORY_GROWTH_BYTES: f64 = 5.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    Critical,
    Improvement,
    BestPractice,
}

impl RecommendationTier {
    pub fn heading(&self) -> &'static str {
        match self {
            RecommendationTier::Critical => "Critical",
            RecommendationTier::Improvement => "Improvements",
            RecommendationTier::BestPractice => "Best practices",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub tier: RecommendationTier,
    pub subject: String,
    pub message: String,
}

impl Recommendation {
    fn new(tier: RecommendationTier, subject: &str, message: String) -> Self {
        Self {
            tier,
            subject: subject.to_string(),
            message,
        }
    }
}

/// Buckets findings of the latest run of every subject, ordered by tier
pub fn recommend(report: &BenchmarkReport) -> Vec<Recommendation> {
    use RecommendationTier::*;

    let mut out = Vec::new();

    for subject in report.summaries.keys() {
        let Some(latest) = report.latest_result(subject) else {
            continue;
        };
        let m = &latest.metrics;
        if m.sample_count > 0 {
            if m.average_fps < CRITICAL_FPS {
                out.push(Recommendation::new(
                    Critical,
                    subject,
                    format!("Average FPS {:.1} is below {:.0}; the UI visibly stutters", m.average_fps, CRITICAL_FPS),
                ));
            } else if m.average_fps < TARGET_FPS {
                out.push(Recommendation::new(
                    Improvement,
                    subject,
                    format!("Average FPS {:.1} is below {:.0}; move work off the UI thread", m.average_fps, TARGET_FPS),
                ));
            }

            if m.jank_rate_percent() > CRITICAL_JANK_PERCENT {
                out.push(Recommendation::new(
                    Critical,
                    subject,
                    format!("{:.1}% of frames are janky", m.jank_rate_percent()),
                ));
            } else if m.jank_count > 0 {
                out.push(Recommendation::new(
                    Improvement,
                    subject,
                    format!("{} jank events recorded; profile the longest frames", m.jank_count),
                ));
            }

            if m.drop_rate_percent() > DROP_PERCENT {
                out.push(Recommendation::new(
                    Improvement,
                    subject,
                    format!("{:.1}% of frames dropped; reduce per-frame layout work", m.drop_rate_percent()),
                ));
            }

            if m.performance_score < CRITICAL_SCORE {
                out.push(Recommendation::new(
                    Critical,
                    subject,
                    format!("Performance score {:.0}/100", m.performance_score),
                ));
            }
        }

        let capture = &latest.capture;
        if let Some(mount) = capture.mount_time_ms.filter(|ms| *ms > SLOW_MOUNT_MS) {
            out.push(Recommendation::new(
                Improvement,
                subject,
                format!("Mount takes {:.0}ms; defer non-visible content", mount),
            ));
        }
        if let Some(passes) = capture.render_passes.filter(|p| *p > RENDER_PASS_BUDGET) {
            out.push(Recommendation::new(
                BestPractice,
                subject,
                format!("{} render passes; memoize stable children", passes),
            ));
        }
        if let Some(growth) = capture.memory_growth_bytes.filter(|b| *b > MEMORY_GROWTH_BYTES) {
            out.push(Recommendation::new(
                BestPractice,
                subject,
                format!("Memory grew by {:.1} MB; check listeners are released on unmount", growth / (1024.0 * 1024.0)),
            ));
        }
    }

    for analysis in &report.comparisons {
        for (metric, comparison) in analysis.with_status(ChangeStatus::Regressed) {
            if comparison.significant {
                out.push(Recommendation::new(
                    Critical,
                    &analysis.subject,
                    format!(
                        "{} regressed {:+.1}% since run #{}",
                        metric.label(),
                        comparison.change_percent,
                        analysis.previous_run
                    ),
                ));
            }
        }
    }

    out.sort_by(|a, b| a.tier.cmp(&b.tier));
    out
}
