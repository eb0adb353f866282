//! Session runner - drives tracking, coaching and post-run analysis.
//!
//! [`SessionRunner`] owns the [`TrackingSession`] and reacts to
//! [`SessionCommand`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Event flow
//!
//! ```text
//! Start          ──▶ rewind source, then as Resume
//! Start / Resume ──▶ subscribe sampler, arm coaching + refresh timers
//! LocationEvent  ──▶ session.on_sample / on_location_error ──▶ publish
//! coaching tick  ──▶ realtime_feedback(current speed)       (Tracking only)
//! Pause / Reset  ──▶ drop subscription, disarm timers
//! Stop           ──▶ freeze RunSummary, spawn advisor.analyze
//!                      └─▶ AnalysisDone{generation} ──▶ feedback + narrator
//! UpdateSettings ──▶ new target pace, keys handed to advisor + narrator
//! ```
//!
//! Analysis results carry the session generation they were started for and
//! are dropped when the session has been reset or restarted since.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::coach::{local_feedback, realtime_feedback, Feedback, FeedbackAdvisor};
use crate::config::{CoachSettings, TrackingConfig};
use crate::location::{now_ms, GeolocationSampler, LocationEvent, Subscription};
use crate::track::{RunSummary, SampleOutcome, SessionState, TrackingSession};
use crate::voice::Narrator;

use super::state::{SharedState, TrackerState};

/// Snapshot refresh period while tracking, so the clock keeps moving
/// between fixes.
const REFRESH_PERIOD: Duration = Duration::from_secs(1);

/// User controls.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
    /// Hide the post-run feedback panel.
    DismissFeedback,
    /// Settings saved from the window; applies to the next cue and call.
    UpdateSettings(CoachSettings),
}

/// Completed analysis, tagged with the session generation it belongs to.
#[derive(Debug)]
struct AnalysisDone {
    generation: u64,
    feedback: Feedback,
}

pub struct SessionRunner {
    state: SharedState,
    session: TrackingSession,
    sampler: GeolocationSampler,
    advisor: Arc<dyn FeedbackAdvisor>,
    narrator: Option<Arc<Narrator>>,
    target_pace: f64,
    coaching_period: Duration,

    subscription: Option<Subscription>,
    coaching: Option<Interval>,
    refresh: Option<Interval>,
    location_tx: mpsc::Sender<LocationEvent>,
    location_rx: mpsc::Receiver<LocationEvent>,
    analysis_tx: mpsc::Sender<AnalysisDone>,
    analysis_rx: mpsc::Receiver<AnalysisDone>,
}

impl SessionRunner {
    /// Create a runner.
    ///
    /// * `state`   - snapshot shared with the UI.
    /// * `sampler` - position stream, subscribed only while tracking.
    /// * `advisor` - post-run analysis; wrap it in `FallbackAdvisor`.
    pub fn new(
        state: SharedState,
        sampler: GeolocationSampler,
        advisor: Arc<dyn FeedbackAdvisor>,
        config: &TrackingConfig,
    ) -> Self {
        let (location_tx, location_rx) = mpsc::channel(64);
        let (analysis_tx, analysis_rx) = mpsc::channel(4);
        Self {
            state,
            session: TrackingSession::new(config.min_step_m / 1000.0),
            sampler,
            advisor,
            narrator: None,
            target_pace: config.target_pace,
            coaching_period: Duration::from_secs(config.coaching_interval_secs.max(1)),
            subscription: None,
            coaching: None,
            refresh: None,
            location_tx,
            location_rx,
            analysis_tx,
            analysis_rx,
        }
    }

    /// Speak the feedback once analysis completes.
    pub fn with_narrator(mut self, narrator: Arc<Narrator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until `commands` is closed.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        log::info!("session: runner started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.location_rx.recv() => self.handle_location(event),
                _ = next_tick(self.coaching.as_mut()) => self.handle_coaching_tick(),
                _ = next_tick(self.refresh.as_mut()) => self.publish(),
                Some(done) = self.analysis_rx.recv() => self.handle_analysis(done),
            }
        }
        log::info!("session: command channel closed, runner shutting down");
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    fn handle_command(&mut self, command: SessionCommand) {
        let now = now_ms();
        log::debug!("session: {command:?} in {:?}", self.session.state());

        match command {
            SessionCommand::Start => {
                if !self.session.start(now) {
                    return;
                }
                self.update(TrackerState::clear_run);
                self.sampler.restart();
                self.open_stream();
            }
            SessionCommand::Pause => {
                if !self.session.pause(now) {
                    return;
                }
                self.close_stream();
                self.update(|st| st.coaching = None);
            }
            SessionCommand::Resume => {
                if !self.session.resume(now) {
                    return;
                }
                self.open_stream();
            }
            SessionCommand::Stop => {
                let Some(run) = self.session.stop(now) else {
                    return;
                };
                self.close_stream();
                log::info!(
                    "session: stopped after {}s, {:.2} km",
                    run.duration_secs,
                    run.distance_km
                );
                self.update(|st| {
                    st.coaching = None;
                    st.analyzing = true;
                    st.last_run = Some(run.clone());
                });
                self.spawn_analysis(run);
            }
            SessionCommand::Reset => {
                self.session.reset();
                self.close_stream();
                self.update(TrackerState::clear_run);
            }
            SessionCommand::DismissFeedback => {
                self.update(|st| st.feedback = None);
                return;
            }
            SessionCommand::UpdateSettings(settings) => {
                self.apply_settings(settings);
                return;
            }
        }
        self.publish();
    }

    fn handle_location(&mut self, event: LocationEvent) {
        match event {
            LocationEvent::Position(sample) => match self.session.on_sample(sample) {
                Some(SampleOutcome::Rejected { increment_km }) => {
                    log::debug!("session: jitter {:.1} m ignored", increment_km * 1000.0)
                }
                Some(_) => {}
                None => return,
            },
            LocationEvent::Error(reason) => {
                if self.session.state() != SessionState::Tracking {
                    return;
                }
                self.session.on_location_error(reason);
            }
        }
        self.publish();
    }

    fn handle_coaching_tick(&mut self) {
        let speed = self.session.track().current_speed_kmh();
        let message = realtime_feedback(speed, self.target_pace);
        log::info!("session: coach says {message:?} at {speed:.1} km/h");
        self.update(|st| st.coaching = Some(message.to_string()));
    }

    fn handle_analysis(&mut self, done: AnalysisDone) {
        if done.generation != self.session.generation() {
            log::info!("session: discarding analysis for a superseded run");
            return;
        }
        let feedback = done.feedback;
        self.update(|st| {
            st.analyzing = false;
            st.feedback = Some(feedback.clone());
        });

        if let Some(narrator) = &self.narrator {
            let narrator = Arc::clone(narrator);
            tokio::spawn(async move { narrator.speak(&feedback).await });
        }
    }

    fn apply_settings(&mut self, settings: CoachSettings) {
        log::info!("session: settings updated, target pace {:.2}", settings.target_pace);
        self.target_pace = settings.target_pace;
        self.advisor.set_api_key(settings.advisor_key);
        if let Some(narrator) = &self.narrator {
            narrator.set_api_key(settings.voice_key);
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn spawn_analysis(&self, run: RunSummary) {
        let generation = self.session.generation();
        let advisor = Arc::clone(&self.advisor);
        let tx = self.analysis_tx.clone();
        tokio::spawn(async move {
            let feedback = match advisor.analyze(&run).await {
                Ok(feedback) => feedback,
                Err(e) => {
                    log::warn!("session: analysis failed ({e}), using local feedback");
                    local_feedback(&run)
                }
            };
            let _ = tx.send(AnalysisDone { generation, feedback }).await;
        });
    }

    /// Subscribe to positions and arm the tracking timers.
    fn open_stream(&mut self) {
        // Events buffered from an earlier subscription are stale.
        while self.location_rx.try_recv().is_ok() {}

        match self.sampler.subscribe(self.location_tx.clone()) {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(e) => {
                log::warn!("session: location unavailable: {e}");
                self.session.on_location_error(e.to_string());
            }
        }

        let mut coaching = tokio::time::interval_at(
            Instant::now() + self.coaching_period,
            self.coaching_period,
        );
        coaching.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.coaching = Some(coaching);

        let mut refresh = tokio::time::interval(REFRESH_PERIOD);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.refresh = Some(refresh);
    }

    fn close_stream(&mut self) {
        self.subscription = None;
        self.coaching = None;
        self.refresh = None;
    }

    fn update(&self, f: impl FnOnce(&mut TrackerState)) {
        let mut st = self.state.lock().unwrap();
        f(&mut st);
    }

    fn publish(&self) {
        let now = now_ms();
        self.update(|st| st.refresh(&self.session, now));
    }
}

/// Next tick of an optional timer; never resolves when disarmed.
async fn next_tick(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
