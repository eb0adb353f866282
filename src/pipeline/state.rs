//! Tracker snapshot shared with the UI.
//!
//! [`TrackerState`] is the single source of truth for everything the window
//! shows: session phase, live stats, the route, coaching text and post-run
//! feedback. The session runner rewrites it after every event; the egui
//! update loop reads it each frame.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<TrackerState>>`.

use std::sync::{Arc, Mutex};

use crate::coach::Feedback;
use crate::geo::Coordinate;
use crate::track::{format_elapsed, format_pace, RunSummary, SessionState, TrackingSession};
use crate::track::summary::KCAL_PER_KM;

/// Snapshot of the tracker for rendering.
#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    pub session: SessionState,

    /// Pause-aware elapsed time of the current (or last stopped) run.
    pub elapsed_secs: u64,
    pub distance_km: f64,
    pub current_speed_kmh: f64,
    /// Average pace, `None` until some distance is covered.
    pub pace: Option<f64>,
    pub calories: u32,

    /// Accepted route points in order.
    pub route: Vec<Coordinate>,
    /// Latest fix, accepted or not.
    pub current: Option<Coordinate>,
    /// Accuracy radius of the latest fix in metres.
    pub accuracy: Option<f64>,
    pub gps_error: Option<String>,

    /// Latest realtime coaching message; cleared on pause, stop and reset.
    pub coaching: Option<String>,

    /// True while the post-run analysis is in flight.
    pub analyzing: bool,
    pub last_run: Option<RunSummary>,
    pub feedback: Option<Feedback>,
}

impl TrackerState {
    pub fn elapsed_label(&self) -> String {
        format_elapsed(self.elapsed_secs)
    }

    pub fn pace_label(&self) -> String {
        format_pace(self.pace)
    }

    /// Copy the live figures out of `session` at time `now`.
    pub fn refresh(&mut self, session: &TrackingSession, now: i64) {
        let track = session.track();
        self.session = session.state();
        self.elapsed_secs = session.elapsed_secs(now);
        self.distance_km = track.distance_km();
        self.current_speed_kmh = track.current_speed_kmh();
        self.pace = session.pace(now);
        self.calories = (self.distance_km * KCAL_PER_KM).round() as u32;
        self.gps_error = session.gps_error().map(str::to_string);

        self.route = track.route().iter().map(|s| s.coordinate()).collect();
        if let Some(last) = track.last_known() {
            self.current = Some(last.coordinate());
            self.accuracy = last.accuracy;
        }
    }

    /// Forget everything from the previous run.
    pub fn clear_run(&mut self) {
        *self = Self {
            session: self.session,
            ..Self::default()
        };
    }
}

/// Thread-safe handle to [`TrackerState`].
///
/// Lock for a short critical section; do **not** hold the lock across
/// `.await` points.
pub type SharedState = Arc<Mutex<TrackerState>>;

pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(TrackerState::default()))
}
