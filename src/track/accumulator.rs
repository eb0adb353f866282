//! Route and distance accumulation from position samples.
//!
//! Each sample is compared against the last *accepted* sample. Moves shorter
//! than the noise threshold are treated as GPS jitter: they update the last
//! known position and may update speed, but never touch the route or the
//! cumulative distance.

use crate::location::PositionSample;

/// Default jitter threshold: 5 metres.
pub const DEFAULT_MIN_STEP_KM: f64 = 0.005;

/// Conversion factor from m/s to km/h.
const MPS_TO_KMH: f64 = 3.6;

/// What [`TrackAccumulator::push`] did with a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// First sample of the session; starts the route.
    First,
    /// Appended to the route; `increment_km` added to the distance.
    Accepted { increment_km: f64 },
    /// Within the jitter threshold of the last accepted sample.
    Rejected { increment_km: f64 },
}

impl SampleOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, SampleOutcome::Rejected { .. })
    }
}

#[derive(Debug, Clone)]
pub struct TrackAccumulator {
    min_step_km: f64,
    route: Vec<PositionSample>,
    last_known: Option<PositionSample>,
    distance_km: f64,
    current_speed_kmh: f64,
    max_speed_kmh: f64,
}

impl Default for TrackAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_STEP_KM)
    }
}

impl TrackAccumulator {
    pub fn new(min_step_km: f64) -> Self {
        Self {
            min_step_km,
            route: Vec::new(),
            last_known: None,
            distance_km: 0.0,
            current_speed_kmh: 0.0,
            max_speed_kmh: 0.0,
        }
    }

    /// Consume one sample.
    ///
    /// Speed is decided per sample: a non-negative device speed always wins;
    /// otherwise an accepted sample derives speed from the increment and the
    /// time since the previous accepted sample.
    pub fn push(&mut self, sample: PositionSample) -> SampleOutcome {
        self.last_known = Some(sample);

        let device_speed = sample.speed.filter(|s| *s >= 0.0).map(|s| s * MPS_TO_KMH);
        if let Some(kmh) = device_speed {
            self.set_speed(kmh);
        }

        let Some(prev) = self.route.last().copied() else {
            self.route.push(sample);
            return SampleOutcome::First;
        };

        let increment_km = prev.coordinate().distance_km(&sample.coordinate());
        if increment_km <= self.min_step_km {
            return SampleOutcome::Rejected { increment_km };
        }

        self.route.push(sample);
        self.distance_km += increment_km;

        if device_speed.is_none() {
            let dt_secs = (sample.timestamp_ms - prev.timestamp_ms) as f64 / 1000.0;
            if dt_secs > 0.0 {
                self.set_speed(increment_km / dt_secs * 3600.0);
            }
        }

        SampleOutcome::Accepted { increment_km }
    }

    fn set_speed(&mut self, kmh: f64) {
        self.current_speed_kmh = kmh;
        self.max_speed_kmh = self.max_speed_kmh.max(kmh);
    }

    pub fn clear(&mut self) {
        *self = Self::new(self.min_step_km);
    }

    pub fn route(&self) -> &[PositionSample] {
        &self.route
    }

    pub fn last_known(&self) -> Option<&PositionSample> {
        self.last_known.as_ref()
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn current_speed_kmh(&self) -> f64 {
        self.current_speed_kmh
    }

    pub fn max_speed_kmh(&self) -> f64 {
        self.max_speed_kmh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(lat: f64, lng: f64, t_ms: i64) -> PositionSample {
        PositionSample {
            latitude: lat,
            longitude: lng,
            timestamp_ms: t_ms,
            accuracy: Some(5.0),
            speed: None,
        }
    }

    #[test]
    fn first_sample_starts_route() {
        let mut acc = TrackAccumulator::default();
        assert_eq!(acc.push(sample(40.7829, -73.9654, 0)), SampleOutcome::First);
        assert_eq!(acc.route().len(), 1);
        assert_eq!(acc.distance_km(), 0.0);
    }

    #[test]
    fn eleven_metre_step_is_accepted() {
        let mut acc = TrackAccumulator::default();
        acc.push(sample(40.7829, -73.9654, 0));
        let outcome = acc.push(sample(40.7830, -73.9654, 5_000));

        assert!(outcome.is_accepted());
        assert_eq!(acc.route().len(), 2);
        assert!((acc.distance_km() - 0.0111).abs() < 0.0001);
        // 0.0111 km in 5 s ≈ 8 km/h
        assert!((acc.current_speed_kmh() - 8.0).abs() < 0.1);
        assert_eq!(acc.max_speed_kmh(), acc.current_speed_kmh());
    }

    #[test]
    fn two_metre_jitter_is_rejected() {
        let mut acc = TrackAccumulator::default();
        acc.push(sample(40.7829, -73.9654, 0));
        // 0.000018° latitude ≈ 2 m
        let outcome = acc.push(sample(40.782918, -73.9654, 1_000));

        assert!(matches!(outcome, SampleOutcome::Rejected { .. }));
        assert_eq!(acc.route().len(), 1);
        assert_eq!(acc.distance_km(), 0.0);
        assert_eq!(acc.last_known().unwrap().latitude, 40.782918);
    }

    /// Many small steps that each stay under the threshold relative to the
    /// last *accepted* point eventually add up to an accepted step.
    #[test]
    fn jitter_is_measured_from_last_accepted_point() {
        let mut acc = TrackAccumulator::default();
        acc.push(sample(40.7829, -73.9654, 0));
        acc.push(sample(40.78292, -73.9654, 1_000)); // ~2.2 m
        acc.push(sample(40.78294, -73.9654, 2_000)); // ~4.4 m
        let outcome = acc.push(sample(40.78296, -73.9654, 3_000)); // ~6.7 m

        assert!(outcome.is_accepted());
        assert_eq!(acc.route().len(), 2);
    }

    #[test]
    fn distance_is_sum_of_accepted_increments() {
        let mut acc = TrackAccumulator::default();
        let mut expected = 0.0;
        acc.push(sample(40.7800, -73.9654, 0));
        for i in 1..=20 {
            match acc.push(sample(40.7800 + i as f64 * 0.0002, -73.9654, i * 4_000)) {
                SampleOutcome::Accepted { increment_km } => expected += increment_km,
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!((acc.distance_km() - expected).abs() < 1e-12);
    }

    #[test]
    fn sampling_rate_does_not_change_distance() {
        let mut coarse = TrackAccumulator::default();
        let mut fine = TrackAccumulator::default();
        for i in 0..=10 {
            coarse.push(sample(40.7800 + i as f64 * 0.0010, -73.9654, i * 10_000));
        }
        for i in 0..=100 {
            fine.push(sample(40.7800 + i as f64 * 0.0001, -73.9654, i * 1_000));
        }
        assert!((coarse.distance_km() - fine.distance_km()).abs() < 1e-6);
    }

    #[test]
    fn device_speed_takes_precedence() {
        let mut acc = TrackAccumulator::default();
        let mut first = sample(40.7829, -73.9654, 0);
        first.speed = Some(3.0);
        acc.push(first);
        assert!((acc.current_speed_kmh() - 10.8).abs() < 1e-9);

        let mut second = sample(40.7830, -73.9654, 5_000);
        second.speed = Some(2.0);
        acc.push(second);
        assert!((acc.current_speed_kmh() - 7.2).abs() < 1e-9);
        assert!((acc.max_speed_kmh() - 10.8).abs() < 1e-9);
    }

    #[test]
    fn negative_device_speed_falls_back_to_computed() {
        let mut acc = TrackAccumulator::default();
        acc.push(sample(40.7829, -73.9654, 0));
        let mut s = sample(40.7830, -73.9654, 5_000);
        s.speed = Some(-1.0);
        acc.push(s);
        assert!((acc.current_speed_kmh() - 8.0).abs() < 0.1);
    }

    /// Once the device stops reporting speed, computed speed resumes.
    #[test]
    fn computed_speed_resumes_after_device_speed_disappears() {
        let mut acc = TrackAccumulator::default();
        let mut a = sample(40.7829, -73.9654, 0);
        a.speed = Some(5.0);
        acc.push(a);
        acc.push(sample(40.7830, -73.9654, 5_000));
        assert!((acc.current_speed_kmh() - 8.0).abs() < 0.1);
        assert!((acc.max_speed_kmh() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn clear_keeps_threshold() {
        let mut acc = TrackAccumulator::new(0.010);
        acc.push(sample(40.7829, -73.9654, 0));
        acc.clear();
        assert!(acc.route().is_empty());
        assert!(acc.last_known().is_none());
        acc.push(sample(40.7829, -73.9654, 0));
        // 11 m clears a 10 m threshold
        assert!(acc.push(sample(40.7830, -73.9654, 5_000)).is_accepted());
        // 4.4 m step rejected
        assert!(!acc.push(sample(40.78304, -73.9654, 6_000)).is_accepted());
    }
}
