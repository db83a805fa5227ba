//! Configuration management for Framescope
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files. It combines settings for frame sampling, jank
//! thresholds, performance scoring, regression analysis and export.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration struct containing all Framescope settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FramescopeConfig {
    /// Frame sampler settings
    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Jank/drop threshold multipliers
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Performance score weights
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Regression comparator settings
    #[serde(default)]
    pub regression: RegressionConfig,

    /// Report export settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// Frame sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SamplerConfig {
    /// Target frame rate used for the frame budget (FPS)
    pub target_fps: f64,

    /// Maximum number of retained frame samples (~5s at 60Hz)
    pub buffer_capacity: usize,

    /// Maximum number of retained jank events
    pub jank_event_capacity: usize,

    /// Length of the rolling min/max FPS window (milliseconds)
    #[serde(default = "SamplerConfig::default_rolling_window_ms")]
    pub rolling_window_ms: f64,

    /// Retain every n-th frame only (1 = every frame). Values above 1 give the
    /// lighter passive variant used for production telemetry.
    #[serde(default = "SamplerConfig::default_sample_every_n")]
    pub sample_every_n: u32,
}

/// Jank threshold multipliers of the target frame budget
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdConfig {
    /// Frames at or above this multiple of the budget are dropped
    pub drop_multiplier: f64,

    /// Frames at or above this multiple of the budget are jank
    pub jank_multiplier: f64,

    /// Frames at or above this multiple of the budget are severe jank
    pub severe_multiplier: f64,
}

/// Weights of the 0-100 performance score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringConfig {
    /// Points awarded for hitting the target FPS
    pub fps_weight: f64,

    /// Points available before dropped-frame penalties
    pub drop_weight: f64,

    /// Points available before jank penalties
    pub jank_weight: f64,

    /// Points lost per percent of dropped frames
    pub drop_penalty_per_percent: f64,

    /// Points lost per percent of janky frames
    pub jank_penalty_per_percent: f64,
}

/// Regression comparator configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionConfig {
    /// Minimum |change %| flagged as significant
    pub significance_percent: f64,

    /// Changes below this |change %| are bucketed as unchanged
    pub unchanged_percent: f64,

    /// Per-metric weights of the overall improvement score
    #[serde(default)]
    pub weights: MetricWeights,
}

/// Per-metric weights (percent) of the overall improvement score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricWeights {
    pub fps: f64,
    pub time_to_interactive: f64,
    pub mount_time: f64,
    pub dropped_frames: f64,
    pub jank_score: f64,
    pub memory: f64,
    pub render_passes: f64,
    pub touch_response: f64,
}

/// Report export configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    /// Default export format ("json", "csv", "markdown", "text")
    pub default_format: String,

    /// Prefix of suggested export file names
    pub filename_prefix: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            target_fps: 60.0,
            buffer_capacity: 300,
            jank_event_capacity: 50,
            rolling_window_ms: Self::default_rolling_window_ms(),
            sample_every_n: Self::default_sample_every_n(),
        }
    }
}

impl SamplerConfig {
    fn default_rolling_window_ms() -> f64 {
        1000.0
    }
    fn default_sample_every_n() -> u32 {
        1
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            drop_multiplier: 1.5,
            jank_multiplier: 3.0,
            severe_multiplier: 6.0,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            fps_weight: 40.0,
            drop_weight: 30.0,
            jank_weight: 30.0,
            drop_penalty_per_percent: 1.5,
            jank_penalty_per_percent: 3.0,
        }
    }
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            significance_percent: 5.0,
            unchanged_percent: 1.0,
            weights: MetricWeights::default(),
        }
    }
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            fps: 25.0,
            time_to_interactive: 20.0,
            mount_time: 15.0,
            dropped_frames: 15.0,
            jank_score: 10.0,
            memory: 10.0,
            render_passes: 5.0,
            touch_response: 5.0,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: "markdown".to_string(),
            filename_prefix: "framescope-report".to_string(),
        }
    }
}

impl FramescopeConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            let relative = path.strip_prefix("~").unwrap_or(path);
            Path::new(&home).join(relative)
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: FramescopeConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.sampler.target_fps <= 0.0 || self.sampler.target_fps > 1000.0 {
            anyhow::bail!("Invalid target_fps: must be between 0 and 1000");
        }

        if self.sampler.buffer_capacity == 0 {
            anyhow::bail!("Invalid buffer_capacity: must be at least 1");
        }

        if self.sampler.jank_event_capacity == 0 {
            anyhow::bail!("Invalid jank_event_capacity: must be at least 1");
        }

        if self.sampler.rolling_window_ms <= 0.0 {
            anyhow::bail!("Invalid rolling_window_ms: must be positive");
        }

        if self.sampler.sample_every_n == 0 {
            anyhow::bail!("Invalid sample_every_n: must be at least 1");
        }

        // Thresholds must be ordered drop < jank <= severe
        let t = &self.thresholds;
        if t.drop_multiplier <= 1.0 {
            anyhow::bail!("Invalid drop_multiplier: must be greater than 1.0");
        }
        if t.jank_multiplier <= t.drop_multiplier {
            anyhow::bail!("Invalid jank_multiplier: must exceed drop_multiplier");
        }
        if t.severe_multiplier < t.jank_multiplier {
            anyhow::bail!("Invalid severe_multiplier: must be at least jank_multiplier");
        }

        let s = &self.scoring;
        if s.fps_weight < 0.0 || s.drop_weight < 0.0 || s.jank_weight < 0.0 {
            anyhow::bail!("Invalid scoring weights: must be non-negative");
        }
        if s.fps_weight + s.drop_weight + s.jank_weight > 100.0 + f64::EPSILON {
            anyhow::bail!("Invalid scoring weights: must sum to at most 100");
        }

        let r = &self.regression;
        if r.unchanged_percent < 0.0 || r.significance_percent < r.unchanged_percent {
            anyhow::bail!("Invalid regression thresholds: need 0 <= unchanged_percent <= significance_percent");
        }

        let valid_formats = ["json", "csv", "markdown", "text"];
        if !valid_formats.contains(&self.export.default_format.as_str()) {
            anyhow::bail!("Invalid export format: {}", self.export.default_format);
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }

    /// Merge a partial configuration into this one
    /// Non-default sections from the partial config will override this config
    pub fn merge_partial(mut self, partial: FramescopeConfig) -> Self {
        let default_config = FramescopeConfig::default();

        if partial.sampler != default_config.sampler {
            self.sampler = partial.sampler;
        }
        if partial.thresholds != default_config.thresholds {
            self.thresholds = partial.thresholds;
        }
        if partial.scoring != default_config.scoring {
            self.scoring = partial.scoring;
        }
        if partial.regression != default_config.regression {
            self.regression = partial.regression;
        }
        if partial.export != default_config.export {
            self.export = partial.export;
        }

        self
    }
}

#[cfg(test)]
mod tests;
