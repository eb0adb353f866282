//! Feedback produced for a finished run, and its local fallback.

use serde::{Deserialize, Serialize};

use crate::track::{format_minutes, RunSummary};

/// Narrative feedback for one run. Field names match the JSON the
/// text-generation model is asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub summary: String,
    pub performance: String,
    pub suggestions: Vec<String>,
    pub motivation: String,
}

impl Feedback {
    /// All text fields non-blank and at least one non-blank suggestion.
    pub fn is_complete(&self) -> bool {
        let filled = |s: &str| !s.trim().is_empty();
        filled(&self.summary)
            && filled(&self.performance)
            && filled(&self.motivation)
            && !self.suggestions.is_empty()
            && self.suggestions.iter().all(|s| filled(s))
    }
}

/// Runs faster than this (min/km) earn the "excellent" performance line.
pub const PRAISE_PACE_MIN_PER_KM: f64 = 6.0;

/// Average speeds below this (km/h) get an interval-training suggestion.
pub const INTERVAL_SPEED_KMH: f64 = 8.0;

/// Deterministic feedback computed from the run's own numbers.
pub fn local_feedback(run: &RunSummary) -> Feedback {
    let pace = if run.distance_km > 0.0 {
        run.duration_secs as f64 / 60.0 / run.distance_km
    } else {
        0.0
    };

    let performance = if pace < PRAISE_PACE_MIN_PER_KM {
        "Excellent pace! You're running strong."
    } else {
        "Good steady pace, perfect for building endurance."
    };

    let speed_tip = if run.average_speed_kmh < INTERVAL_SPEED_KMH {
        "Try adding some speed intervals"
    } else {
        "Great speed! Focus on maintaining consistency"
    };

    Feedback {
        summary: format!(
            "Completed {:.1}km in {}",
            run.distance_km,
            format_minutes(run.duration_secs)
        ),
        performance: performance.into(),
        suggestions: vec![
            speed_tip.into(),
            "Consider tracking your heart rate zones".into(),
            "Plan recovery runs between intense sessions".into(),
        ],
        motivation: "Every step forward is progress. You're building strength and endurance!"
            .into(),
    }
}
