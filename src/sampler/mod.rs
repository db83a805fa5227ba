//! Frame Sampler
//!
//! Per-refresh timestamp differencing producing instantaneous FPS samples.
//!
//! # Features
//!
//! - **Bounded ring buffers**: the most recent frame samples and jank events
//! - **Jank classification**: every retained frame is graded on arrival
//! - **Rolling windows**: min/max FPS over fixed-length windows
//! - **Sampled mode**: a lighter variant that keeps only every n-th frame
//! - **Cooperative cancellation**: `stop()` cancels the pending request and
//!   stale ticks are ignored, so nothing is appended after a snapshot
//!
//! # Usage
//!
//! ```
//! use framescope::sampler::{FrameSampler, ManualScheduler};
//!
//! let mut scheduler = ManualScheduler::new();
//! let mut sampler = FrameSampler::default();
//!
//! sampler.start(&mut scheduler);
//! for timestamp in [0.0, 16.0, 32.0, 48.0] {
//!     let handle = scheduler.take_pending().unwrap();
//!     sampler.on_tick(&mut scheduler, handle, timestamp);
//! }
//! let metrics = sampler.stop(&mut scheduler);
//! assert_eq!(metrics.sample_count, 3);
//! ```

mod scheduler;

pub use scheduler::{FrameHandle, FrameScheduler, ManualScheduler};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::aggregator::{AggregatedMetrics, MetricsAggregator};
use crate::config::FramescopeConfig;
use crate::jank::{clamp_duration, JankClassifier, JankEvent, JankThresholds, CONTEXT_WINDOW};

/// Completed rolling windows kept for inspection
const WINDOW_HISTORY_SIZE: usize = 60;

/// One display-refresh observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    pub timestamp_ms: f64,
    pub frame_duration_ms: f64,
    /// `1000 / duration`, or 0 when the duration is 0
    pub fps: f64,
    pub is_dropped: bool,
    pub is_jank: bool,
}

/// How many ticks are retained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Every tick becomes a sample (benchmark runs)
    Full,
    /// Only every n-th tick is retained (passive production telemetry)
    Sampled { every_n: u32 },
}

impl SamplingMode {
    pub fn from_every_n(every_n: u32) -> Self {
        if every_n <= 1 {
            SamplingMode::Full
        } else {
            SamplingMode::Sampled { every_n }
        }
    }

    fn retains(&self, tick_index: u64) -> bool {
        match self {
            SamplingMode::Full => true,
            SamplingMode::Sampled { every_n } => tick_index % u64::from(*every_n) == 0,
        }
    }
}

/// Min/max instantaneous FPS over one window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingWindow {
    pub start_ms: f64,
    pub min_fps: f64,
    pub max_fps: f64,
    pub frame_count: u32,
}

impl RollingWindow {
    fn new(start_ms: f64, fps: f64) -> Self {
        Self {
            start_ms,
            min_fps: fps,
            max_fps: fps,
            frame_count: 1,
        }
    }

    fn record(&mut self, fps: f64) {
        self.min_fps = self.min_fps.min(fps);
        self.max_fps = self.max_fps.max(fps);
        self.frame_count += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Running,
    Stopped,
}

/// Buffer sizes and retention mode of a sampler
pub struct FramePlan {
    pub buffer_capacity: usize,
    pub jank_event_capacity: usize,
    pub rolling_window_ms: f64,
    pub mode: SamplingMode,
}

impl Default for FramePlan {
    fn default() -> Self {
        Self {
            buffer_capacity: 300,
            jank_event_capacity: 50,
            rolling_window_ms: 1000.0,
            mode: SamplingMode::Full,
        }
    }
}

/// Samples frame timing on every display refresh, driven by an injected [`FrameScheduler`]
pub struct FrameSampler {
    plan: FramePlan,
    classifier: JankClassifier,
    aggregator: MetricsAggregator,
    samples: VecDeque<FrameSample>,
    jank_events: VecDeque<JankEvent>,
    /// FPS of the most recent valid samples, used as jank context
    recent_fps: VecDeque<f64>,
    pending: Option<FrameHandle>,
    last_tick_ms: Option<f64>,
    tick_count: u64,
    window: Option<RollingWindow>,
    completed_windows: VecDeque<RollingWindow>,
    state: SamplerState,
}

impl FrameSampler {
    /// Creates a sampler from explicit parts
    pub fn new(plan: FramePlan, classifier: JankClassifier, aggregator: MetricsAggregator) -> Self {
        Self {
            samples: VecDeque::with_capacity(plan.buffer_capacity),
            jank_events: VecDeque::with_capacity(plan.jank_event_capacity),
            recent_fps: VecDeque::with_capacity(CONTEXT_WINDOW),
            plan,
            classifier,
            aggregator,
            pending: None,
            last_tick_ms: None,
            tick_count: 0,
            window: None,
            completed_windows: VecDeque::with_capacity(WINDOW_HISTORY_SIZE),
            state: SamplerState::Idle,
        }
    }

    /// Creates a sampler from configuration
    pub fn from_config(config: &FramescopeConfig) -> Self {
        let sampler = &config.sampler;
        let plan = FramePlan {
            buffer_capacity: sampler.buffer_capacity,
            jank_event_capacity: sampler.jank_event_capacity,
            rolling_window_ms: sampler.rolling_window_ms,
            mode: SamplingMode::from_every_n(sampler.sample_every_n),
        };
        let thresholds = JankThresholds::for_target_fps(sampler.target_fps, &config.thresholds);
        let aggregator = MetricsAggregator::new(sampler.target_fps, config.scoring.clone());

        Self::new(plan, JankClassifier::new(thresholds), aggregator)
    }

    /// Clears buffers and schedules the first refresh callback
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }

        self.samples.clear();
        self.jank_events.clear();
        self.recent_fps.clear();
        self.completed_windows.clear();
        self.window = None;
        self.last_tick_ms = None;
        self.tick_count = 0;
        self.state = SamplerState::Running;
        self.pending = Some(scheduler.request_frame());

        info!("🎬 Frame sampler started: mode={:?}", self.plan.mode);
    }

    /// Handles one display refresh.
    ///
    /// Ticks answering anything but the pending request are ignored. Returns
    /// whether the tick was accepted.
    pub fn on_tick(
        &mut self,
        scheduler: &mut dyn FrameScheduler,
        handle: FrameHandle,
        timestamp_ms: f64,
    ) -> bool {
        self.advance(scheduler, handle, timestamp_ms, None)
    }

    /// Accepts a tick; `measured` replaces `timestamp - last_tick` when the
    /// caller already knows the exact frame duration
    fn advance(
        &mut self,
        scheduler: &mut dyn FrameScheduler,
        handle: FrameHandle,
        timestamp_ms: f64,
        measured: Option<f64>,
    ) -> bool {
        if self.state != SamplerState::Running || self.pending != Some(handle) {
            debug!("stale frame callback ignored: {:?}", handle);
            return false;
        }
        self.pending = None;

        let duration = match self.last_tick_ms {
            Some(last) => clamp_duration(measured.unwrap_or(timestamp_ms - last)),
            None => 0.0,
        };
        self.last_tick_ms = Some(timestamp_ms);

        if self.plan.mode.retains(self.tick_count) {
            self.record(timestamp_ms, duration);
        }
        self.tick_count += 1;

        self.pending = Some(scheduler.request_frame());
        true
    }

    fn record(&mut self, timestamp_ms: f64, duration_ms: f64) {
        let fps = if duration_ms > 0.0 { 1000.0 / duration_ms } else { 0.0 };
        let class = self.classifier.classify(duration_ms);

        if let Some(event) = self
            .classifier
            .observe(timestamp_ms, duration_ms, fps, &self.recent_fps)
        {
            debug!(
                "⚠️ {} jank: {:.1}ms at {:.1}ms ({:.1} → {:.1} FPS)",
                event.severity.as_str(),
                event.duration_ms,
                event.timestamp_ms,
                event.preceding_fps,
                event.following_fps
            );
            self.jank_events.push_back(event);
            while self.jank_events.len() > self.plan.jank_event_capacity {
                self.jank_events.pop_front();
            }
        }

        self.samples.push_back(FrameSample {
            timestamp_ms,
            frame_duration_ms: duration_ms,
            fps,
            is_dropped: class.is_dropped(),
            is_jank: class.is_jank(),
        });
        while self.samples.len() > self.plan.buffer_capacity {
            self.samples.pop_front();
        }

        if fps > 0.0 {
            self.recent_fps.push_back(fps);
            while self.recent_fps.len() > CONTEXT_WINDOW {
                self.recent_fps.pop_front();
            }
            self.update_window(timestamp_ms, fps);
        }
    }

    fn update_window(&mut self, timestamp_ms: f64, fps: f64) {
        if let Some(window) = self.window.as_mut() {
            if timestamp_ms - window.start_ms < self.plan.rolling_window_ms {
                window.record(fps);
                return;
            }
        }

        if let Some(done) = self.window.replace(RollingWindow::new(timestamp_ms, fps)) {
            self.completed_windows.push_back(done);
            while self.completed_windows.len() > WINDOW_HISTORY_SIZE {
                self.completed_windows.pop_front();
            }
        }
    }

    /// Cancels scheduling and returns the final snapshot
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) -> AggregatedMetrics {
        match self.pending.take() {
            Some(handle) => scheduler.cancel(handle),
            None if self.state == SamplerState::Running => {
                warn!("sampler stopped without a pending frame request");
            }
            None => {}
        }
        self.state = SamplerState::Stopped;

        let metrics = self.snapshot();
        info!(
            "📊 Frame sampler stopped: {} samples, {:.1} avg FPS, {} jank, score {:.1}",
            metrics.sample_count, metrics.average_fps, metrics.jank_count, metrics.performance_score
        );
        metrics
    }

    /// Aggregates the current buffers without stopping
    pub fn snapshot(&self) -> AggregatedMetrics {
        self.aggregator.aggregate(&self.samples)
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn samples(&self) -> impl Iterator<Item = &FrameSample> {
        self.samples.iter()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn jank_events(&self) -> impl Iterator<Item = &JankEvent> {
        self.jank_events.iter()
    }

    pub fn jank_event_count(&self) -> usize {
        self.jank_events.len()
    }

    /// The window currently being filled
    pub fn rolling_window(&self) -> Option<&RollingWindow> {
        self.window.as_ref()
    }

    pub fn completed_windows(&self) -> impl Iterator<Item = &RollingWindow> {
        self.completed_windows.iter()
    }

    pub fn thresholds(&self) -> &JankThresholds {
        self.classifier.thresholds()
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(FramePlan::default(), JankClassifier::default(), MetricsAggregator::default())
    }
}

/// Feeds recorded frame durations through a sampler.
///
/// Ticks land on the running sum of `durations`, so the first duration only
/// positions the initial tick, which has no predecessor. Later samples carry
/// their recorded duration rather than the difference of two accumulated
/// timestamps.
pub fn replay_durations(sampler: &mut FrameSampler, durations: &[f64]) -> AggregatedMetrics {
    let mut scheduler = ManualScheduler::new();
    sampler.start(&mut scheduler);

    let mut timestamp = 0.0;
    for (i, duration) in durations.iter().enumerate() {
        let duration = clamp_duration(*duration);
        timestamp += duration;
        let measured = (i > 0).then_some(duration);
        if let Some(handle) = scheduler.take_pending() {
            sampler.advance(&mut scheduler, handle, timestamp, measured);
        }
    }

    sampler.stop(&mut scheduler)
}
