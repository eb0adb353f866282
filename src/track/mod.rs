//! Live run tracking: route accumulation, pause-aware timing, the session
//! state machine and the frozen run summary.
//!
//! ```rust
//! use stride_tracker::location::PositionSample;
//! use stride_tracker::track::{SessionState, TrackingSession, DEFAULT_MIN_STEP_KM};
//!
//! let mut session = TrackingSession::new(DEFAULT_MIN_STEP_KM);
//! session.start(0);
//! for (i, lat) in [40.7829, 40.7830, 40.7831].into_iter().enumerate() {
//!     session.on_sample(PositionSample {
//!         latitude: lat,
//!         longitude: -73.9654,
//!         timestamp_ms: i as i64 * 5_000,
//!         accuracy: None,
//!         speed: None,
//!     });
//! }
//! let summary = session.stop(10_000).unwrap();
//! assert_eq!(session.state(), SessionState::Idle);
//! assert_eq!(summary.route.len(), 3);
//! ```

pub mod accumulator;
pub mod session;
pub mod stopwatch;
pub mod summary;

pub use accumulator::{SampleOutcome, TrackAccumulator, DEFAULT_MIN_STEP_KM};
pub use session::{SessionState, TrackingSession};
pub use stopwatch::Stopwatch;
pub use summary::{
    format_elapsed, format_minutes, format_pace, pace_min_per_km, RunSummary, PACE_PLACEHOLDER,
};
