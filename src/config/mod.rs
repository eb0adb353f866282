//! Configuration module for the stride tracker.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for cross-platform data directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AdvisorConfig, AppConfig, CoachSettings, MapConfig, TrackingConfig, UiConfig, VoiceConfig,
    TARGET_PACE_RANGE,
};
