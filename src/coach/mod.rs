//! Run coaching: post-run analysis and realtime pace cues.
//!
//! This module provides:
//! * [`FeedbackAdvisor`] - async trait implemented by all advisor backends.
//! * [`GeminiAdvisor`] - remote text-generation advisor.
//! * [`FallbackAdvisor`] - wraps any advisor; substitutes local feedback on failure.
//! * [`local_feedback`] - deterministic feedback from the run's own numbers.
//! * [`build_analysis_prompt`] / [`parse_feedback`] - prompt out, JSON back in.
//! * [`realtime_feedback`] - network-free pace cue used every coaching tick.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use stride_tracker::coach::{FallbackAdvisor, GeminiAdvisor};
//! use stride_tracker::config::AppConfig;
//! use stride_tracker::track::RunSummary;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let advisor = FallbackAdvisor::new(GeminiAdvisor::from_config(&config.advisor));
//!
//!     let run = RunSummary::new(1_800, 5.0, 13.4, Vec::new(), Utc::now());
//!     let feedback = advisor.feedback_for(&run).await;
//!     println!("{}", feedback.summary);
//! }
//! ```

pub mod advisor;
pub mod fallback;
pub mod feedback;
pub mod prompt;
pub mod realtime;
pub mod reply;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use advisor::{AdvisorError, FeedbackAdvisor, GeminiAdvisor};
pub use fallback::FallbackAdvisor;
pub use feedback::{local_feedback, Feedback};
pub use prompt::build_analysis_prompt;
pub use realtime::{pace_cue, realtime_feedback, PaceCue};
pub use reply::{extract_json_object, parse_feedback};
