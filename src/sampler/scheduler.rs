//! Display-refresh scheduling abstraction
//!
//! The sampler never talks to a real display driver. It asks a
//! [`FrameScheduler`] for the next refresh callback and receives ticks
//! through [`FrameSampler::on_tick`](super::FrameSampler::on_tick).

use log::trace;

/// Cancelled handles remembered by [`ManualScheduler`]
const CANCELLED_HISTORY: usize = 16;

/// Opaque handle identifying a pending frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Host display-refresh scheduler (`requestFrame` / `cancel`)
pub trait FrameScheduler {
    /// Requests a callback on the next display refresh
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancels a pending request. Cancelling an unknown handle is a no-op.
    fn cancel(&mut self, handle: FrameHandle);
}

/// Deterministic scheduler driven by explicit timestamps.
///
/// Used by tests and by the CLI replay path to feed recorded frame timings
/// through a sampler.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Option<FrameHandle>,
    cancelled: Vec<FrameHandle>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The request that the next tick will answer, if any
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Most recently cancelled handles, oldest first
    pub fn cancelled(&self) -> &[FrameHandle] {
        &self.cancelled
    }

    /// Takes the pending request so it can be delivered
    pub fn take_pending(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        trace!("frame requested: {:?}", handle);
        handle
    }

    fn cancel(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
        if self.cancelled.len() == CANCELLED_HISTORY {
            self.cancelled.remove(0);
        }
        self.cancelled.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_replaces_pending() {
        let mut scheduler = ManualScheduler::new();
        let first = scheduler.request_frame();
        let second = scheduler.request_frame();

        assert_ne!(first, second);
        assert_eq!(scheduler.pending(), Some(second));
    }

    #[test]
    fn test_cancel_clears_pending() {
        let mut scheduler = ManualScheduler::new();
        let handle = scheduler.request_frame();
        scheduler.cancel(handle);

        assert_eq!(scheduler.pending(), None);
        assert_eq!(scheduler.cancelled(), &[handle]);
    }

    #[test]
    fn test_cancelled_history_is_bounded() {
        let mut scheduler = ManualScheduler::new();
        let mut last = None;
        for _ in 0..1000 {
            let handle = scheduler.request_frame();
            scheduler.cancel(handle);
            last = Some(handle);
        }

        assert_eq!(scheduler.cancelled().len(), CANCELLED_HISTORY);
        assert_eq!(scheduler.cancelled().last().copied(), last);
    }
}
