//! stride-tracker - desktop run tracker.
//!
//! Startup sequence:
//! 1. Initialise logging.
//! 2. Load configuration (defaults when the file is missing).
//! 3. Build the tokio runtime.
//! 4. Pick a location source: a recorded track given as the first argument,
//!    otherwise none.
//! 5. Construct the advisor and narrator from config.
//! 6. Spawn the session runner.
//! 7. Run the eframe event loop (blocks until the window closes).

use std::sync::Arc;

use eframe::egui;
use tokio::sync::mpsc;

use stride_tracker::{
    app::TrackerApp,
    coach::{FallbackAdvisor, FeedbackAdvisor, GeminiAdvisor},
    config::{AppConfig, AppPaths},
    location::{GeolocationSampler, LocationSource, ReplaySource, UnavailableSource, WatchOptions},
    pipeline::{new_shared_state, SessionCommand, SessionRunner},
    voice::{LogSpeech, Narrator, SpeechSynthesizer, SystemSpeech},
};

// ---------------------------------------------------------------------------
// Location source selection
// ---------------------------------------------------------------------------

fn location_source(config: &AppConfig) -> Arc<dyn LocationSource> {
    let Some(arg) = std::env::args().nth(1) else {
        log::warn!("location: no track file given, position stream unavailable");
        return Arc::new(UnavailableSource);
    };

    let path = AppPaths::new().resolve_track(&arg);
    match ReplaySource::load(&path, config.tracking.replay_speed) {
        Ok(source) => {
            log::info!(
                "location: replaying {} ({} fixes, x{})",
                path.display(),
                source.len(),
                config.tracking.replay_speed
            );
            Arc::new(source)
        }
        Err(e) => {
            log::warn!("location: {e}");
            Arc::new(UnavailableSource)
        }
    }
}

// ---------------------------------------------------------------------------
// NativeOptions builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (w, h) = config.ui.window_size;
    let mut vp = egui::ViewportBuilder::default()
        .with_title("Stride Tracker")
        .with_inner_size([w, h])
        .with_min_inner_size([640.0, 420.0]);

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("stride-tracker starting up");

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    let advisor: Arc<dyn FeedbackAdvisor> =
        Arc::new(FallbackAdvisor::new(GeminiAdvisor::from_config(&config.advisor)));

    let speech: Arc<dyn SpeechSynthesizer> = if config.voice.enabled {
        Arc::new(SystemSpeech::new())
    } else {
        Arc::new(LogSpeech)
    };
    // Voice listing shells out; do it before the first narration needs it.
    rt.spawn_blocking({
        let speech = Arc::clone(&speech);
        move || speech.voices().len()
    });
    let narrator = Arc::new(Narrator::new(&config.voice, speech));

    let state = new_shared_state();
    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(16);

    let sampler = GeolocationSampler::new(
        location_source(&config),
        WatchOptions::from(&config.tracking),
    );
    let runner = SessionRunner::new(Arc::clone(&state), sampler, advisor, &config.tracking)
        .with_narrator(narrator);
    rt.spawn(runner.run(command_rx));

    let app = TrackerApp::new(state, command_tx, rt.handle().clone(), config.clone());
    let result = eframe::run_native(
        "Stride Tracker",
        native_options(&config),
        Box::new(move |_cc| Ok(Box::new(app))),
    );

    log::info!("stride-tracker shut down");
    result
}
