//! Location stream: position fixes from a [`LocationSource`], stamped and
//! filtered by the [`GeolocationSampler`].
//!
//! # Pipeline
//!
//! ```text
//! LocationSource::watch ─▶ RawLocation (mpsc) ─▶ GeolocationSampler
//!                                                  ├─ stamp missing timestamps
//!                                                  ├─ drop stale fixes (> max age)
//!                                                  ├─ report timeouts (non-fatal)
//!                                                  └─▶ LocationEvent (mpsc)
//! ```
//!
//! Errors never end a subscription; only dropping the [`Subscription`] (or the
//! source running dry) does.

pub mod replay;
pub mod sampler;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::geo::Coordinate;

pub use replay::{ReplayPoint, ReplaySource};
pub use sampler::{GeolocationSampler, Subscription};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A timestamped position, immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Horizontal accuracy radius in metres, when the source reports one.
    pub accuracy: Option<f64>,
    /// Device-reported ground speed in m/s, when known.
    pub speed: Option<f64>,
}

impl PositionSample {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A fix as delivered by a [`LocationSource`], before stamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    /// Source timestamp; `None` means "now".
    pub timestamp_ms: Option<i64>,
}

/// Raw messages a source pushes onto its channel.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLocation {
    Fix(LocationFix),
    /// Textual reason; the subscription stays alive.
    Error(String),
}

/// Sampler output consumed by the session runner.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    Position(PositionSample),
    /// Non-fatal problem with the position stream.
    Error(String),
}

/// Subscription parameters passed to [`LocationSource::watch`].
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// Longest wait for a fix before a timeout is reported.
    pub timeout: Duration,
    /// Oldest acceptable fix.
    pub max_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            max_age: Duration::from_secs(1),
        }
    }
}

impl From<&crate::config::TrackingConfig> for WatchOptions {
    fn from(cfg: &crate::config::TrackingConfig) -> Self {
        Self {
            high_accuracy: cfg.high_accuracy,
            timeout: Duration::from_secs(cfg.timeout_secs),
            max_age: Duration::from_millis(cfg.max_sample_age_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// LocationError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error)]
pub enum LocationError {
    /// No location provider is available on this platform.
    #[error("Geolocation not supported: {0}")]
    Unsupported(String),

    /// No fix arrived within the configured timeout.
    #[error("Timed out waiting for a position fix")]
    Timeout,

    /// A recorded track could not be read or parsed.
    #[error("Replay track unreadable: {0}")]
    Replay(String),
}

// ---------------------------------------------------------------------------
// LocationSource trait
// ---------------------------------------------------------------------------

/// Anything that can push position fixes: device GPS, a replayed track, a
/// test fake.
///
/// `watch` must return promptly; delivery happens on `tx` until the returned
/// [`WatchHandle`] is dropped.
pub trait LocationSource: Send + Sync {
    fn watch(
        &self,
        options: &WatchOptions,
        tx: mpsc::Sender<RawLocation>,
    ) -> Result<WatchHandle, LocationError>;

    /// Called when a new run starts. Sources with a playback position go
    /// back to the beginning; live sources ignore it.
    fn restart(&self) {}
}

/// Keeps a source's delivery task alive; dropping it unsubscribes.
#[derive(Debug, Default)]
pub struct WatchHandle {
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    pub fn new(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// A handle for sources that need no background task.
    pub fn detached() -> Self {
        Self { task: None }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Stand-in used when the platform offers no position provider.
#[derive(Debug, Clone, Default)]
pub struct UnavailableSource;

impl LocationSource for UnavailableSource {
    fn watch(
        &self,
        _options: &WatchOptions,
        _tx: mpsc::Sender<RawLocation>,
    ) -> Result<WatchHandle, LocationError> {
        Err(LocationError::Unsupported(
            "no position provider; start with a recorded track file".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_options_follow_tracking_config() {
        let cfg = crate::config::TrackingConfig {
            timeout_secs: 3,
            max_sample_age_ms: 250,
            ..Default::default()
        };
        let opts = WatchOptions::from(&cfg);
        assert!(opts.high_accuracy);
        assert_eq!(opts.timeout, Duration::from_secs(3));
        assert_eq!(opts.max_age, Duration::from_millis(250));
    }

    #[test]
    fn unavailable_source_reports_unsupported() {
        let (tx, _rx) = mpsc::channel(1);
        let err = UnavailableSource
            .watch(&WatchOptions::default(), tx)
            .unwrap_err();
        assert!(matches!(err, LocationError::Unsupported(_)));
        assert!(err.to_string().starts_with("Geolocation not supported"));
    }
}
