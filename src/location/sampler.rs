//! Geolocation sampler: turns a [`LocationSource`] into a stream of
//! [`LocationEvent`]s.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{
    now_ms, LocationError, LocationEvent, LocationFix, LocationSource, PositionSample,
    RawLocation, WatchHandle, WatchOptions,
};

/// Wraps a [`LocationSource`] with stamping, staleness and timeout handling.
pub struct GeolocationSampler {
    source: Arc<dyn LocationSource>,
    options: WatchOptions,
}

/// An active subscription. Dropping it stops both the source and the pump.
pub struct Subscription {
    _source: WatchHandle,
    pump: JoinHandle<()>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

impl GeolocationSampler {
    pub fn new(source: Arc<dyn LocationSource>, options: WatchOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    /// Prepare the source for a fresh run.
    pub fn restart(&self) {
        self.source.restart();
    }

    /// Start watching. Events are delivered on `out` until the returned
    /// [`Subscription`] is dropped or the receiver closes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(
        &self,
        out: mpsc::Sender<LocationEvent>,
    ) -> Result<Subscription, LocationError> {
        let (raw_tx, mut raw_rx) = mpsc::channel::<RawLocation>(32);
        let handle = self.source.watch(&self.options, raw_tx)?;
        let options = self.options.clone();

        let pump = tokio::spawn(async move {
            loop {
                let event = match tokio::time::timeout(options.timeout, raw_rx.recv()).await {
                    Ok(Some(RawLocation::Fix(fix))) => match stamp(fix, &options, now_ms()) {
                        Some(sample) => LocationEvent::Position(sample),
                        None => {
                            log::debug!("location: dropped stale fix");
                            continue;
                        }
                    },
                    Ok(Some(RawLocation::Error(reason))) => {
                        log::warn!("location: source error: {reason}");
                        LocationEvent::Error(reason)
                    }
                    Ok(None) => {
                        log::info!("location: source closed");
                        break;
                    }
                    Err(_) => {
                        log::warn!("location: no fix within {:?}", options.timeout);
                        LocationEvent::Error(LocationError::Timeout.to_string())
                    }
                };

                if out.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(Subscription {
            _source: handle,
            pump,
        })
    }
}

/// Convert a raw fix into a sample, or `None` when it is older than
/// `options.max_age` relative to `now`.
pub fn stamp(fix: LocationFix, options: &WatchOptions, now: i64) -> Option<PositionSample> {
    let timestamp_ms = fix.timestamp_ms.unwrap_or(now);
    let age = now.saturating_sub(timestamp_ms);
    if age > options.max_age.as_millis() as i64 {
        return None;
    }
    Some(PositionSample {
        latitude: fix.latitude,
        longitude: fix.longitude,
        timestamp_ms,
        accuracy: fix.accuracy,
        speed: fix.speed,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
