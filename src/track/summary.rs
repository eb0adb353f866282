//! Run summary, pace and display formatting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::location::PositionSample;

/// Rough energy cost of running, kcal per kilometre.
pub const KCAL_PER_KM: f64 = 65.0;

/// Placeholder shown when pace is undefined.
pub const PACE_PLACEHOLDER: &str = "--:--";

/// Pace in minutes per kilometre; `None` while no distance is covered.
pub fn pace_min_per_km(elapsed_secs: u64, distance_km: f64) -> Option<f64> {
    if distance_km > 0.0 {
        Some(elapsed_secs as f64 / 60.0 / distance_km)
    } else {
        None
    }
}

/// `m:ss`, or [`PACE_PLACEHOLDER`] when undefined.
pub fn format_pace(pace: Option<f64>) -> String {
    match pace {
        Some(p) if p.is_finite() && p >= 0.0 => {
            let total_secs = (p * 60.0).round() as u64;
            format!("{}:{:02}", total_secs / 60, total_secs % 60)
        }
        _ => PACE_PLACEHOLDER.to_string(),
    }
}

/// `mm:ss`, or `h:mm:ss` from one hour on.
pub fn format_elapsed(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let s = secs % 60;
    if hours > 0 {
        format!("{hours}:{mins:02}:{s:02}")
    } else {
        format!("{mins:02}:{s:02}")
    }
}

/// `m:ss` with unpadded minutes, as used in spoken/advisor text.
pub fn format_minutes(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Frozen statistics of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub duration_secs: u64,
    pub distance_km: f64,
    pub average_speed_kmh: f64,
    pub max_speed_kmh: f64,
    /// Minutes per kilometre; `None` when no distance was covered.
    pub average_pace: Option<f64>,
    pub calories: u32,
    pub route: Vec<PositionSample>,
    pub date: DateTime<Utc>,
}

impl RunSummary {
    pub fn new(
        duration_secs: u64,
        distance_km: f64,
        max_speed_kmh: f64,
        route: Vec<PositionSample>,
        date: DateTime<Utc>,
    ) -> Self {
        let average_speed_kmh = if duration_secs > 0 && distance_km > 0.0 {
            distance_km / (duration_secs as f64 / 3600.0)
        } else {
            0.0
        };
        Self {
            duration_secs,
            distance_km,
            average_speed_kmh,
            max_speed_kmh,
            average_pace: pace_min_per_km(duration_secs, distance_km),
            calories: (distance_km * KCAL_PER_KM).round() as u32,
            route,
            date,
        }
    }

    pub fn pace_label(&self) -> String {
        format_pace(self.average_pace)
    }
}
