//! Replays a recorded track as a live [`LocationSource`].
//!
//! Track files are JSON arrays:
//!
//! ```json
//! [
//!   { "lat": 40.7829, "lng": -73.9654, "offset_ms": 0 },
//!   { "lat": 40.7830, "lng": -73.9654, "offset_ms": 5000, "speed": 2.4, "accuracy": 5.0 }
//! ]
//! ```
//!
//! Playback position survives unsubscribe/resubscribe, so pausing a session
//! and resuming continues from the next unsent point. [`LocationSource::restart`]
//! rewinds to the first point for a new run.
//!
//! Fixes carry no timestamp and are stamped on delivery, so a speed-up
//! factor above 1 compresses every time-derived figure with it.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{LocationError, LocationFix, LocationSource, RawLocation, WatchHandle, WatchOptions};

/// One point of a recorded track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayPoint {
    pub lat: f64,
    pub lng: f64,
    /// Offset from the start of the recording.
    pub offset_ms: u64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    /// Recorded device speed in m/s.
    #[serde(default)]
    pub speed: Option<f64>,
}

pub struct ReplaySource {
    points: Arc<Vec<ReplayPoint>>,
    cursor: Arc<AtomicUsize>,
    speed_up: f64,
}

impl ReplaySource {
    /// Build from in-memory points; `speed_up` > 1 plays faster than recorded.
    pub fn new(mut points: Vec<ReplayPoint>, speed_up: f64) -> Self {
        points.sort_by_key(|p| p.offset_ms);
        Self {
            points: Arc::new(points),
            cursor: Arc::new(AtomicUsize::new(0)),
            speed_up: if speed_up > 0.0 { speed_up } else { 1.0 },
        }
    }

    /// Load a JSON track file.
    pub fn load(path: &Path, speed_up: f64) -> Result<Self, LocationError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LocationError::Replay(format!("{}: {e}", path.display())))?;
        Self::from_json(&content, speed_up)
    }

    pub fn from_json(content: &str, speed_up: f64) -> Result<Self, LocationError> {
        let points: Vec<ReplayPoint> =
            serde_json::from_str(content).map_err(|e| LocationError::Replay(e.to_string()))?;
        if points.is_empty() {
            return Err(LocationError::Replay("track has no points".into()));
        }
        Ok(Self::new(points, speed_up))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the next point to be delivered.
    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Rewind playback to the first point.
    pub fn rewind(&self) {
        self.cursor.store(0, Ordering::SeqCst);
    }
}

impl LocationSource for ReplaySource {
    fn watch(
        &self,
        _options: &WatchOptions,
        tx: mpsc::Sender<RawLocation>,
    ) -> Result<WatchHandle, LocationError> {
        let points = Arc::clone(&self.points);
        let cursor = Arc::clone(&self.cursor);
        let speed_up = self.speed_up;

        let task = tokio::spawn(async move {
            let start = cursor.load(Ordering::SeqCst);
            let Some(base) = points.get(start).map(|p| p.offset_ms) else {
                log::info!("replay: track exhausted");
                // Hold `tx` so silence is reported as timeouts, not a closed source.
                std::future::pending::<()>().await;
                return;
            };
            let started = tokio::time::Instant::now();

            for (idx, point) in points.iter().enumerate().skip(start) {
                let due = Duration::from_secs_f64((point.offset_ms - base) as f64 / 1000.0 / speed_up);
                tokio::time::sleep_until(started + due).await;

                let fix = LocationFix {
                    latitude: point.lat,
                    longitude: point.lng,
                    accuracy: point.accuracy,
                    speed: point.speed,
                    timestamp_ms: None,
                };
                if tx.send(RawLocation::Fix(fix)).await.is_err() {
                    return;
                }
                cursor.store(idx + 1, Ordering::SeqCst);
            }
            log::info!("replay: delivered all {} points", points.len());
            // Keep the channel open so the sampler reports silence as timeouts.
            std::future::pending::<()>().await;
        });

        Ok(WatchHandle::new(task))
    }

    fn restart(&self) {
        self.rewind();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: &str = r#"[
        { "lat": 40.7829, "lng": -73.9654, "offset_ms": 0 },
        { "lat": 40.7830, "lng": -73.9654, "offset_ms": 5000, "speed": 2.2 },
        { "lat": 40.7831, "lng": -73.9654, "offset_ms": 10000, "accuracy": 3.5 }
    ]"#;

    async fn next_fix(rx: &mut mpsc::Receiver<RawLocation>) -> LocationFix {
        match rx.recv().await {
            Some(RawLocation::Fix(f)) => f,
            other => panic!("expected fix, got {other:?}"),
        }
    }

    #[test]
    fn parses_optional_fields() {
        let source = ReplaySource::from_json(TRACK, 1.0).unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(source.points[1].speed, Some(2.2));
        assert_eq!(source.points[2].accuracy, Some(3.5));
        assert_eq!(source.points[0].speed, None);
    }

    #[test]
    fn empty_or_garbage_track_is_rejected() {
        assert!(matches!(
            ReplaySource::from_json("[]", 1.0),
            Err(LocationError::Replay(_))
        ));
        assert!(matches!(
            ReplaySource::from_json("not json", 1.0),
            Err(LocationError::Replay(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_points_in_order() {
        let source = ReplaySource::from_json(TRACK, 5.0).unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let _handle = source.watch(&WatchOptions::default(), tx).unwrap();

        let lats: Vec<f64> = vec![
            next_fix(&mut rx).await.latitude,
            next_fix(&mut rx).await.latitude,
            next_fix(&mut rx).await.latitude,
        ];
        assert_eq!(lats, vec![40.7829, 40.7830, 40.7831]);
        assert_eq!(source.position(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn resubscribe_continues_from_cursor() {
        let source = ReplaySource::from_json(TRACK, 1.0).unwrap();

        {
            let (tx, mut rx) = mpsc::channel(8);
            let _handle = source.watch(&WatchOptions::default(), tx).unwrap();
            assert_eq!(next_fix(&mut rx).await.latitude, 40.7829);
            // Let the cursor update land before dropping the handle.
            tokio::task::yield_now().await;
        }
        assert_eq!(source.position(), 1);

        let (tx, mut rx) = mpsc::channel(8);
        let _handle = source.watch(&WatchOptions::default(), tx).unwrap();
        assert_eq!(next_fix(&mut rx).await.latitude, 40.7830);

        source.rewind();
        assert_eq!(source.position(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_track_stays_open_until_restart() {
        let source = ReplaySource::from_json(TRACK, 10.0).unwrap();
        {
            let (tx, mut rx) = mpsc::channel(8);
            let _handle = source.watch(&WatchOptions::default(), tx).unwrap();
            for _ in 0..3 {
                let fix = next_fix(&mut rx).await;
                assert_eq!(fix.timestamp_ms, None);
            }
        }
        assert_eq!(source.position(), 3);

        let (tx, mut rx) = mpsc::channel(8);
        let _handle = source.watch(&WatchOptions::default(), tx).unwrap();
        let waited = tokio::time::timeout(Duration::from_secs(60), rx.recv()).await;
        assert!(waited.is_err(), "exhausted source must not close its channel");

        source.restart();
        let (tx, mut rx) = mpsc::channel(8);
        let _handle = source.watch(&WatchOptions::default(), tx).unwrap();
        assert_eq!(next_fix(&mut rx).await.latitude, 40.7829);
    }
}
