//! Session pipeline for the tracker window.
//!
//! This module wires location → track → coach → voice and exposes the shared
//! state that the UI reads every frame.
//!
//! # Architecture
//!
//! ```text
//! SessionCommand (mpsc)          LocationSource
//!        │                             │
//!        ▼                             ▼
//! SessionRunner::run()  ◀── LocationEvent ── GeolocationSampler
//!        │
//!        ├─ coaching interval (Tracking only) → realtime_feedback
//!        └─ Stop → spawn FeedbackAdvisor::analyze → Narrator::speak
//!
//! SharedState (Arc<Mutex<TrackerState>>) ←─── read by egui update() each frame
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use stride_tracker::coach::{FallbackAdvisor, GeminiAdvisor};
//! use stride_tracker::config::AppConfig;
//! use stride_tracker::location::{GeolocationSampler, ReplaySource, WatchOptions};
//! use stride_tracker::pipeline::{new_shared_state, SessionCommand, SessionRunner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let state = new_shared_state();
//!     let source = ReplaySource::load("track.json".as_ref(), 1.0).unwrap();
//!     let sampler = GeolocationSampler::new(
//!         Arc::new(source),
//!         WatchOptions::from(&config.tracking),
//!     );
//!     let advisor = Arc::new(FallbackAdvisor::new(GeminiAdvisor::from_config(&config.advisor)));
//!
//!     let (tx, rx) = mpsc::channel(16);
//!     let runner = SessionRunner::new(state.clone(), sampler, advisor, &config.tracking);
//!     tokio::spawn(runner.run(rx));
//!
//!     tx.send(SessionCommand::Start).await.unwrap();
//! }
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{SessionCommand, SessionRunner};
pub use state::{new_shared_state, SharedState, TrackerState};
