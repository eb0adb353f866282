//! Session state machine: `Idle → Tracking → Paused ⇄ Tracking → Idle`.
//!
//! [`TrackingSession`] owns the accumulator and the stopwatch and decides
//! which samples count. It performs no I/O; the pipeline runner feeds it
//! commands, samples and the current time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::location::PositionSample;

use super::accumulator::{SampleOutcome, TrackAccumulator};
use super::stopwatch::Stopwatch;
use super::summary::{pace_min_per_km, RunSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Tracking,
    Paused,
}

impl SessionState {
    /// Tracking or paused: a run exists that can be stopped.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Tracking | SessionState::Paused)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Ready",
            SessionState::Tracking => "Tracking",
            SessionState::Paused => "Paused",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackingSession {
    state: SessionState,
    stopwatch: Stopwatch,
    track: TrackAccumulator,
    gps_error: Option<String>,
    /// Bumped on every start/reset; async results tagged with an older value
    /// belong to a session that no longer exists.
    generation: u64,
}

impl TrackingSession {
    pub fn new(min_step_km: f64) -> Self {
        Self {
            track: TrackAccumulator::new(min_step_km),
            ..Self::default()
        }
    }

    /// Idle → Tracking, discarding any previous run. Returns `false` when a
    /// run is already active.
    pub fn start(&mut self, now: i64) -> bool {
        if self.state != SessionState::Idle {
            return false;
        }
        self.track.clear();
        self.gps_error = None;
        self.stopwatch.start(now);
        self.generation += 1;
        self.state = SessionState::Tracking;
        true
    }

    pub fn pause(&mut self, now: i64) -> bool {
        if self.state != SessionState::Tracking {
            return false;
        }
        self.stopwatch.pause(now);
        self.state = SessionState::Paused;
        true
    }

    pub fn resume(&mut self, now: i64) -> bool {
        if self.state != SessionState::Paused {
            return false;
        }
        self.stopwatch.resume(now);
        self.state = SessionState::Tracking;
        true
    }

    /// Tracking/Paused → Idle, freezing a [`RunSummary`]. The route stays
    /// visible until the next start or reset.
    pub fn stop(&mut self, now: i64) -> Option<RunSummary> {
        if !self.state.is_active() {
            return None;
        }
        self.stopwatch.pause(now);
        self.state = SessionState::Idle;

        let date: DateTime<Utc> = DateTime::from_timestamp_millis(now).unwrap_or_else(Utc::now);
        Some(RunSummary::new(
            self.stopwatch.elapsed_secs(now),
            self.track.distance_km(),
            self.track.max_speed_kmh(),
            self.track.route().to_vec(),
            date,
        ))
    }

    /// Back to a blank Idle session from any state.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.stopwatch.reset();
        self.track.clear();
        self.gps_error = None;
        self.generation += 1;
    }

    /// Feed a sample. Ignored (returns `None`) unless tracking.
    pub fn on_sample(&mut self, sample: PositionSample) -> Option<SampleOutcome> {
        if self.state != SessionState::Tracking {
            return None;
        }
        self.gps_error = None;
        Some(self.track.push(sample))
    }

    /// Record a non-fatal location problem; the session carries on.
    pub fn on_location_error(&mut self, reason: impl Into<String>) {
        self.gps_error = Some(reason.into());
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn track(&self) -> &TrackAccumulator {
        &self.track
    }

    pub fn gps_error(&self) -> Option<&str> {
        self.gps_error.as_deref()
    }

    pub fn elapsed_secs(&self, now: i64) -> u64 {
        self.stopwatch.elapsed_secs(now)
    }

    pub fn pace(&self, now: i64) -> Option<f64> {
        pace_min_per_km(self.elapsed_secs(now), self.track.distance_km())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::DEFAULT_MIN_STEP_KM;

    fn sample(lat: f64, t_ms: i64) -> PositionSample {
        PositionSample {
            latitude: lat,
            longitude: -73.9654,
            timestamp_ms: t_ms,
            accuracy: None,
            speed: None,
        }
    }

    fn session() -> TrackingSession {
        TrackingSession::new(DEFAULT_MIN_STEP_KM)
    }

    #[test]
    fn full_lifecycle() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Idle);

        assert!(s.start(0));
        assert_eq!(s.state(), SessionState::Tracking);
        assert!(s.pause(10_000));
        assert_eq!(s.state(), SessionState::Paused);
        assert!(s.resume(20_000));
        assert_eq!(s.state(), SessionState::Tracking);

        let summary = s.stop(30_000).expect("summary");
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(summary.duration_secs, 20);
    }

    #[test]
    fn invalid_transitions_are_refused() {
        let mut s = session();
        assert!(!s.pause(0));
        assert!(!s.resume(0));
        assert!(s.stop(0).is_none());

        s.start(0);
        assert!(!s.start(1));
        assert!(!s.resume(1));
    }

    #[test]
    fn stop_from_paused_freezes_summary() {
        let mut s = session();
        s.start(0);
        s.on_sample(sample(40.7829, 0));
        s.on_sample(sample(40.7830, 5_000));
        s.pause(6_000);

        let summary = s.stop(100_000).unwrap();
        assert_eq!(summary.duration_secs, 6);
        assert_eq!(summary.route.len(), 2);
        assert!((summary.distance_km - 0.0111).abs() < 0.0001);
        assert_eq!(summary.date.timestamp_millis(), 100_000);
    }

    #[test]
    fn samples_outside_tracking_are_ignored() {
        let mut s = session();
        assert!(s.on_sample(sample(40.7829, 0)).is_none());

        s.start(0);
        s.on_sample(sample(40.7829, 0));
        s.pause(1_000);
        assert!(s.on_sample(sample(40.7900, 2_000)).is_none());
        assert_eq!(s.track().route().len(), 1);
    }

    #[test]
    fn location_error_is_non_fatal() {
        let mut s = session();
        s.start(0);
        s.on_sample(sample(40.7829, 0));
        s.on_location_error("Timed out waiting for a position fix");

        assert_eq!(s.state(), SessionState::Tracking);
        assert!(s.gps_error().is_some());
        assert_eq!(s.track().last_known().unwrap().latitude, 40.7829);

        s.on_sample(sample(40.7830, 5_000));
        assert!(s.gps_error().is_none());
    }

    #[test]
    fn pace_tracks_distance() {
        let mut s = session();
        s.start(0);
        assert_eq!(s.pace(60_000), None);
        s.on_sample(sample(40.7829, 0));
        s.on_sample(sample(40.7929, 300_000)); // ~1.11 km
        let pace = s.pace(360_000).unwrap();
        assert!((pace - 6.0 / s.track().distance_km()).abs() < 1e-9);
    }

    #[test]
    fn start_and_reset_bump_generation() {
        let mut s = session();
        let g0 = s.generation();
        s.start(0);
        let g1 = s.generation();
        s.stop(1_000);
        assert_eq!(s.generation(), g1);
        s.reset();
        assert!(g1 > g0 && s.generation() > g1);
    }

    #[test]
    fn restart_clears_previous_route() {
        let mut s = session();
        s.start(0);
        s.on_sample(sample(40.7829, 0));
        s.stop(1_000);
        assert_eq!(s.track().route().len(), 1);

        s.start(2_000);
        assert!(s.track().route().is_empty());
        assert_eq!(s.elapsed_secs(2_000), 0);
    }
}
