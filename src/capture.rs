//! Auxiliary run capture: mount timing, render passes and memory growth
//!
//! These trackers complement the frame sampler. Each benchmark run collects
//! them into a [`RunCapture`] that travels with the run's aggregated metrics.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics reported by a native profiler, preferred over sampled values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeMetrics {
    pub fps: Option<f64>,
    pub memory_bytes: Option<f64>,
    pub time_to_interactive_ms: Option<f64>,
}

/// Auxiliary measurements of one benchmark run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunCapture {
    pub mount_time_ms: Option<f64>,
    pub time_to_interactive_ms: Option<f64>,
    /// Estimated memory growth over the run (bytes)
    pub memory_growth_bytes: Option<f64>,
    pub render_passes: Option<u64>,
    pub touch_response_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<NativeMetrics>,
}

impl RunCapture {
    pub fn with_mount(mut self, timer: &MountTimer) -> Self {
        self.mount_time_ms = timer.mount_time_ms();
        self.time_to_interactive_ms = timer.time_to_interactive_ms();
        self
    }

    pub fn with_renders(mut self, tracker: &RenderTracker) -> Self {
        self.render_passes = Some(tracker.total());
        self
    }

    pub fn with_memory(mut self, tracker: &MemoryTracker) -> Self {
        self.memory_growth_bytes = tracker.growth_bytes();
        self
    }
}

/// Measures mount and time-to-interactive from caller-supplied timestamps
#[derive(Debug, Clone, Default)]
pub struct MountTimer {
    started_ms: Option<f64>,
    mounted_ms: Option<f64>,
    interactive_ms: Option<f64>,
}

impl MountTimer {
    pub fn begin(at_ms: f64) -> Self {
        Self {
            started_ms: Some(at_ms),
            ..Self::default()
        }
    }

    pub fn mark_mounted(&mut self, at_ms: f64) {
        self.mounted_ms = Some(at_ms);
    }

    pub fn mark_interactive(&mut self, at_ms: f64) {
        self.interactive_ms = Some(at_ms);
    }

    pub fn mount_time_ms(&self) -> Option<f64> {
        elapsed(self.started_ms, self.mounted_ms)
    }

    pub fn time_to_interactive_ms(&self) -> Option<f64> {
        elapsed(self.started_ms, self.interactive_ms)
    }
}

fn elapsed(start: Option<f64>, end: Option<f64>) -> Option<f64> {
    match (start, end) {
        (Some(start), Some(end)) => Some((end - start).max(0.0)),
        _ => None,
    }
}

/// Counts render passes per component
#[derive(Debug, Clone, Default)]
pub struct RenderTracker {
    counts: BTreeMap<String, u64>,
}

impl RenderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_render(&mut self, component: &str) {
        *self.counts.entry(component.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, component: &str) -> u64 {
        self.counts.get(component).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Components ordered by render count, highest first
    pub fn hottest(&self, limit: usize) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .counts
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        ranked.truncate(limit);
        ranked
    }

    pub fn reset(&mut self) {
        self.counts.clear();
    }
}

/// Estimates memory growth from periodic heap readings
#[derive(Debug, Clone, Default)]
pub struct MemoryTracker {
    baseline_bytes: Option<f64>,
    last_bytes: Option<f64>,
    peak_bytes: f64,
    readings: u32,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a heap reading; the first becomes the baseline
    pub fn record(&mut self, bytes: f64) {
        if self.baseline_bytes.is_none() {
            self.baseline_bytes = Some(bytes);
        }
        self.last_bytes = Some(bytes);
        self.peak_bytes = self.peak_bytes.max(bytes);
        self.readings += 1;
        debug!("📊 Memory reading #{}: {:.0} bytes", self.readings, bytes);
    }

    /// Last reading minus baseline, `None` until two readings exist
    pub fn growth_bytes(&self) -> Option<f64> {
        if self.readings < 2 {
            return None;
        }
        Some(self.last_bytes? - self.baseline_bytes?)
    }

    pub fn peak_bytes(&self) -> f64 {
        self.peak_bytes
    }

    pub fn readings(&self) -> u32 {
        self.readings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_timer() {
        let mut timer = MountTimer::begin(100.0);
        assert_eq!(timer.mount_time_ms(), None);

        timer.mark_mounted(142.5);
        timer.mark_interactive(180.0);
        assert_eq!(timer.mount_time_ms(), Some(42.5));
        assert_eq!(timer.time_to_interactive_ms(), Some(80.0));
    }

    #[test]
    fn test_render_tracker_ranking() {
        let mut tracker = RenderTracker::new();
        for _ in 0..3 {
            tracker.record_render("Sheet");
        }
        tracker.record_render("Backdrop");

        assert_eq!(tracker.total(), 4);
        assert_eq!(tracker.count("Sheet"), 3);
        assert_eq!(tracker.hottest(1), vec![("Sheet", 3)]);
    }

    #[test]
    fn test_memory_growth() {
        let mut tracker = MemoryTracker::new();
        tracker.record(1_000.0);
        assert_eq!(tracker.growth_bytes(), None);

        tracker.record(4_000.0);
        tracker.record(2_500.0);
        assert_eq!(tracker.growth_bytes(), Some(1_500.0));
        assert_eq!(tracker.peak_bytes(), 4_000.0);
    }

    #[test]
    fn test_capture_builders() {
        let mut timer = MountTimer::begin(0.0);
        timer.mark_mounted(12.0);
        let mut renders = RenderTracker::new();
        renders.record_render("List");

        let capture = RunCapture::default().with_mount(&timer).with_renders(&renders);
        assert_eq!(capture.mount_time_ms, Some(12.0));
        assert_eq!(capture.time_to_interactive_ms, None);
        assert_eq!(capture.render_passes, Some(1));
    }
}
