//! Pause-aware elapsed-time tracking on explicit millisecond timestamps.

/// Accumulates running time across pause/resume windows.
///
/// Time is supplied by the caller (epoch milliseconds) so the stopwatch is
/// deterministic under test.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stopwatch {
    /// Time accumulated from earlier running windows.
    baseline_ms: u64,
    /// Start of the current running window; `None` while stopped or paused.
    anchor_ms: Option<i64>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear and start running at `now`.
    pub fn start(&mut self, now: i64) {
        self.baseline_ms = 0;
        self.anchor_ms = Some(now);
    }

    /// Fold the current window into the baseline and stop the clock.
    pub fn pause(&mut self, now: i64) {
        if let Some(anchor) = self.anchor_ms.take() {
            self.baseline_ms += now.saturating_sub(anchor).max(0) as u64;
        }
    }

    pub fn resume(&mut self, now: i64) {
        if self.anchor_ms.is_none() {
            self.anchor_ms = Some(now);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_running(&self) -> bool {
        self.anchor_ms.is_some()
    }

    pub fn elapsed_ms(&self, now: i64) -> u64 {
        let running = self
            .anchor_ms
            .map(|anchor| now.saturating_sub(anchor).max(0) as u64)
            .unwrap_or(0);
        self.baseline_ms + running
    }

    /// Whole elapsed seconds.
    pub fn elapsed_secs(&self, now: i64) -> u64 {
        self.elapsed_ms(now) / 1000
    }
}
