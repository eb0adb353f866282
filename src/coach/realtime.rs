//! Local, network-free coaching cues during a run.

/// Pace window around the target, in minutes per kilometre.
pub const PACE_TOLERANCE: f64 = 0.5;

/// The four cues [`realtime_feedback`] can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceCue {
    Stationary,
    TooFast,
    TooSlow,
    OnTarget,
}

impl PaceCue {
    pub fn message(&self) -> &'static str {
        match self {
            PaceCue::Stationary => "Keep moving! Let's get that pace up.",
            PaceCue::TooFast => "You're flying! Maybe ease up a bit to maintain this pace.",
            PaceCue::TooSlow => "Pick up the pace! You've got this!",
            PaceCue::OnTarget => "Perfect pace! Keep it steady.",
        }
    }
}

/// Classify `current_speed_kmh` against `target_pace` (min/km).
pub fn pace_cue(current_speed_kmh: f64, target_pace: f64) -> PaceCue {
    if current_speed_kmh.is_nan() || current_speed_kmh <= 0.0 {
        return PaceCue::Stationary;
    }
    let pace = 60.0 / current_speed_kmh;
    if pace < target_pace - PACE_TOLERANCE {
        PaceCue::TooFast
    } else if pace > target_pace + PACE_TOLERANCE {
        PaceCue::TooSlow
    } else {
        PaceCue::OnTarget
    }
}

/// Coaching phrase for the current speed.
///
/// ```rust
/// use stride_tracker::coach::realtime_feedback;
///
/// // 10 km/h is a 6:00 min/km pace
/// assert_eq!(realtime_feedback(10.0, 6.0), "Perfect pace! Keep it steady.");
/// ```
pub fn realtime_feedback(current_speed_kmh: f64, target_pace: f64) -> &'static str {
    pace_cue(current_speed_kmh, target_pace).message()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speed_for_pace(pace: f64) -> f64 {
        60.0 / pace
    }

    #[test]
    fn faster_than_window_eases_up() {
        assert_eq!(pace_cue(speed_for_pace(5.4), 6.0), PaceCue::TooFast);
        assert_eq!(
            realtime_feedback(speed_for_pace(5.4), 6.0),
            "You're flying! Maybe ease up a bit to maintain this pace."
        );
    }

    #[test]
    fn slower_than_window_picks_up() {
        assert_eq!(
            realtime_feedback(speed_for_pace(6.6), 6.0),
            "Pick up the pace! You've got this!"
        );
    }

    #[test]
    fn on_target_is_perfect() {
        assert_eq!(
            realtime_feedback(speed_for_pace(6.0), 6.0),
            "Perfect pace! Keep it steady."
        );
        assert_eq!(pace_cue(speed_for_pace(6.3), 6.0), PaceCue::OnTarget);
        assert_eq!(pace_cue(speed_for_pace(5.7), 6.0), PaceCue::OnTarget);
    }

    #[test]
    fn zero_speed_is_stationary() {
        assert_eq!(
            realtime_feedback(0.0, 6.0),
            "Keep moving! Let's get that pace up."
        );
        assert_eq!(pace_cue(-1.0, 6.0), PaceCue::Stationary);
        assert_eq!(pace_cue(f64::NAN, 6.0), PaceCue::Stationary);
    }

    #[test]
    fn only_four_messages_exist() {
        let mut seen: Vec<&str> = (0..400)
            .map(|i| realtime_feedback(i as f64 * 0.1, 6.0))
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 4);
    }
}
