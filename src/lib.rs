//! # Framescope
//!
//! Frame-timing instrumentation for UI performance testing: sample frame
//! callbacks, classify jank, aggregate per-run metrics, compare runs for
//! regressions and export reports.
//!
//! ## Architecture
//!
//! - `sampler`: Frame sampler driven by an injected frame scheduler
//! - `jank`: Frame budget thresholds and jank severity classification
//! - `aggregator`: Summary statistics and the 0..=100 performance score
//! - `capture`: Mount time, render count and memory measurements
//! - `session`: Benchmark results grouped by subject
//! - `regression`: Weighted run-over-run comparison
//! - `export`: JSON, CSV, Markdown and plain-text reports
//! - `plugin`: Plugin lifecycle, event bus and config persistence
//! - `config`: TOML configuration
//!
//! ## Usage
//!
//! ```rust
//! use framescope::{replay_durations, FrameSampler, FramescopeConfig};
//!
//! let config = FramescopeConfig::default();
//! let mut sampler = FrameSampler::from_config(&config);
//! let metrics = replay_durations(&mut sampler, &[16.7, 16.7, 50.0, 16.7]);
//! assert_eq!(metrics.jank_count, 1);
//! ```

pub mod aggregator;
pub mod capture;
pub mod config;
pub mod export;
pub mod jank;
pub mod plugin;
pub mod regression;
pub mod sampler;
pub mod session;

// Re-export main types for easy access
pub use aggregator::{AggregatedMetrics, MetricsAggregator};
pub use capture::{MemoryTracker, MountTimer, NativeMetrics, RenderTracker, RunCapture};
pub use config::FramescopeConfig;
pub use export::{export_to, BenchmarkReport, ExportFormat, FileSink, ReportSink, StdoutSink};
pub use jank::{FrameClass, JankClassifier, JankEvent, JankSeverity, JankThresholds};
pub use plugin::{Plugin, PluginError, PluginEvent, PluginRegistry, PluginState};
pub use regression::{ChangeStatus, MetricComparison, RegressionAnalysis, RegressionAnalyzer, TrackedMetric};
pub use sampler::{
    replay_durations, FrameHandle, FrameSample, FrameSampler, FrameScheduler, ManualScheduler, SamplerState,
};
pub use session::{BenchmarkResult, BenchmarkSession, StartKind};

// Re-export common error types
pub use anyhow::{Context, Error, Result};

/// Version information for Framescope
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
