//! Jank and Dropped-Frame Classification
//!
//! Frame durations are graded against the target frame budget
//! (`1000 / target_fps` milliseconds):
//!
//! - **Dropped**: `duration >= 1.5 × budget` but below the jank threshold
//! - **Jank**: `duration >= 3 × budget`
//! - **Severe jank**: `duration >= 6 × budget`
//!
//! Classification is a pure function of the duration and the thresholds.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::config::ThresholdConfig;

/// Number of preceding samples averaged for the "preceding FPS" context of a jank event
pub const CONTEXT_WINDOW: usize = 10;

/// Severity of a slow frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JankSeverity {
    /// Dropped frame band, never attached to a jank event by the classifier
    Minor,
    /// Jank below the severe threshold
    Moderate,
    /// At or above the severe threshold
    Severe,
}

impl JankSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            JankSeverity::Minor => "minor",
            JankSeverity::Moderate => "moderate",
            JankSeverity::Severe => "severe",
        }
    }
}

/// Result of classifying a single frame duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass {
    Smooth,
    Dropped,
    Jank(JankSeverity),
}

impl FrameClass {
    pub fn is_dropped(&self) -> bool {
        matches!(self, FrameClass::Dropped)
    }

    pub fn is_jank(&self) -> bool {
        matches!(self, FrameClass::Jank(_))
    }

    /// Severity on the shared scale, `None` for smooth frames
    pub fn severity(&self) -> Option<JankSeverity> {
        match self {
            FrameClass::Smooth => None,
            FrameClass::Dropped => Some(JankSeverity::Minor),
            FrameClass::Jank(severity) => Some(*severity),
        }
    }
}

/// Absolute duration thresholds in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JankThresholds {
    pub frame_budget_ms: f64,
    pub drop_ms: f64,
    pub jank_ms: f64,
    pub severe_ms: f64,
}

impl JankThresholds {
    /// Derives thresholds from a target frame rate and budget multipliers.
    ///
    /// Computed as `multiplier * 1000 / fps` so that 60 FPS yields exactly 25/50/100 ms.
    pub fn for_target_fps(target_fps: f64, multipliers: &ThresholdConfig) -> Self {
        let fps = if target_fps > 0.0 { target_fps } else { 60.0 };
        Self {
            frame_budget_ms: 1000.0 / fps,
            drop_ms: multipliers.drop_multiplier * 1000.0 / fps,
            jank_ms: multipliers.jank_multiplier * 1000.0 / fps,
            severe_ms: multipliers.severe_multiplier * 1000.0 / fps,
        }
    }

    /// Grades a frame duration. Negative and NaN durations clamp to zero.
    pub fn classify(&self, duration_ms: f64) -> FrameClass {
        let duration = clamp_duration(duration_ms);

        if duration >= self.severe_ms {
            FrameClass::Jank(JankSeverity::Severe)
        } else if duration >= self.jank_ms {
            FrameClass::Jank(JankSeverity::Moderate)
        } else if duration >= self.drop_ms {
            FrameClass::Dropped
        } else {
            FrameClass::Smooth
        }
    }
}

impl Default for JankThresholds {
    fn default() -> Self {
        Self::for_target_fps(60.0, &ThresholdConfig::default())
    }
}

/// Clamps malformed durations (negative, NaN) to zero
pub fn clamp_duration(duration_ms: f64) -> f64 {
    if duration_ms.is_nan() || duration_ms < 0.0 {
        0.0
    } else {
        duration_ms
    }
}

/// A discrete jank occurrence with surrounding FPS context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JankEvent {
    pub timestamp_ms: f64,
    pub duration_ms: f64,
    pub severity: JankSeverity,
    /// Mean FPS of the valid samples recorded before this frame
    pub preceding_fps: f64,
    /// Rolling mean FPS including this frame
    pub following_fps: f64,
}

/// Stateless classifier bound to a set of thresholds
#[derive(Debug, Clone)]
pub struct JankClassifier {
    thresholds: JankThresholds,
}

impl JankClassifier {
    pub fn new(thresholds: JankThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &JankThresholds {
        &self.thresholds
    }

    pub fn classify(&self, duration_ms: f64) -> FrameClass {
        self.thresholds.classify(duration_ms)
    }

    /// Builds a jank event if the frame crosses the jank threshold.
    ///
    /// `history_fps` holds the instantaneous FPS of previously retained samples,
    /// oldest first, not including the current frame.
    pub fn observe(
        &self,
        timestamp_ms: f64,
        duration_ms: f64,
        fps: f64,
        history_fps: &VecDeque<f64>,
    ) -> Option<JankEvent> {
        let FrameClass::Jank(severity) = self.classify(duration_ms) else {
            return None;
        };

        let preceding: Vec<f64> = history_fps
            .iter()
            .rev()
            .filter(|fps| **fps > 0.0)
            .take(CONTEXT_WINDOW)
            .copied()
            .collect();
        let preceding_fps = mean(&preceding);

        let mut rolling: Vec<f64> = preceding
            .iter()
            .take(CONTEXT_WINDOW - 1)
            .copied()
            .collect();
        if fps > 0.0 {
            rolling.push(fps);
        }
        let following_fps = mean(&rolling);

        Some(JankEvent {
            timestamp_ms,
            duration_ms: clamp_duration(duration_ms),
            severity,
            preceding_fps,
            following_fps,
        })
    }
}

impl Default for JankClassifier {
    fn default() -> Self {
        Self::new(JankThresholds::default())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
