//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Credentials for the remote services live here and are handed to the
//! advisor / narrator at construction time.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// TrackingConfig
// ---------------------------------------------------------------------------

/// Settings for the position stream and the track accumulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Ask the location source for its most accurate fixes.
    pub high_accuracy: bool,
    /// Seconds without a fix before a non-fatal timeout is reported.
    pub timeout_secs: u64,
    /// Fixes older than this (milliseconds) are discarded as stale.
    pub max_sample_age_ms: u64,
    /// Minimum movement in metres before a fix is appended to the route.
    pub min_step_m: f64,
    /// Target pace in minutes per kilometre used by realtime coaching.
    pub target_pace: f64,
    /// Seconds between realtime coaching messages while tracking.
    pub coaching_interval_secs: u64,
    /// Playback speed-up applied when replaying a recorded track.
    ///
    /// Replayed fixes are stamped on delivery, so every time-derived figure
    /// (elapsed time, computed speed, pace, coaching cues) is scaled by this
    /// factor. Recorded device speeds are passed through unscaled.
    pub replay_speed: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_secs: 10,
            max_sample_age_ms: 1_000,
            min_step_m: 5.0,
            target_pace: 6.0,
            coaching_interval_secs: 30,
            replay_speed: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// AdvisorConfig
// ---------------------------------------------------------------------------

/// Settings for the post-run text-generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Base URL of the generative-language API.
    pub base_url: String,
    /// API key; `None` skips the remote call and uses local feedback.
    pub api_key: Option<String>,
    /// Model identifier (e.g. `"gemini-pro"`).
    pub model: String,
    /// Maximum seconds to wait for a reply.
    pub timeout_secs: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            model: "gemini-pro".into(),
            timeout_secs: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceConfig
// ---------------------------------------------------------------------------

/// Settings for spoken feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Speak the post-run feedback at all.
    pub enabled: bool,
    /// Base URL of the voice-call API.
    pub base_url: String,
    /// Bearer key for the voice-call API; `None` means on-device speech only.
    pub api_key: Option<String>,
    /// Voice provider name sent to the voice-call API.
    pub voice_provider: String,
    /// Provider-specific voice identifier.
    pub voice_id: String,
    /// Maximum seconds to wait for the voice-call API.
    pub timeout_secs: u64,
    /// Substrings matched against on-device voice names, in preference order.
    pub preferred_vendors: Vec<String>,
    /// Locale prefix accepted when no vendor matches (e.g. `"en"`).
    pub preferred_locale: String,
    /// On-device speech rate (1.0 = normal).
    pub rate: f32,
    /// On-device speech pitch (1.0 = normal).
    pub pitch: f32,
    /// On-device speech volume (0.0 – 1.0).
    pub volume: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.vapi.ai".into(),
            api_key: None,
            voice_provider: "elevenlabs".into(),
            voice_id: "pNInz6obpgDQGcFmaJgB".into(),
            timeout_secs: 10,
            preferred_vendors: vec!["Google".into(), "Microsoft".into()],
            preferred_locale: "en".into(),
            rate: 0.9,
            pitch: 1.1,
            volume: 0.8,
        }
    }
}

// ---------------------------------------------------------------------------
// MapConfig
// ---------------------------------------------------------------------------

/// Settings for the live map canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Fetch real map imagery; `false` starts directly in grid mode.
    pub online_tiles: bool,
    /// Tile URL template with `{z}`, `{x}` and `{y}` placeholders.
    pub tile_url: String,
    /// User-Agent sent with tile requests (required by OSM tile policy).
    pub user_agent: String,
    /// Fixed zoom level.
    pub zoom: u8,
    /// Map center `(lat, lng)` shown before the first fix.
    pub default_center: (f64, f64),
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            online_tiles: true,
            tile_url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".into(),
            user_agent: concat!("stride-tracker/", env!("CARGO_PKG_VERSION")).into(),
            zoom: 15,
            default_center: (40.7829, -73.9654),
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// eframe window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Initial window size in points.
    pub window_size: (f32, f32),
    /// Last saved window position `(x, y)`; `None` lets the OS decide.
    pub window_position: Option<(f32, f32)>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_size: (960.0, 640.0),
            window_position: None,
        }
    }
}

// ---------------------------------------------------------------------------
// CoachSettings
// ---------------------------------------------------------------------------

/// Slowest and fastest target pace accepted from the settings panel (min/km).
pub const TARGET_PACE_RANGE: std::ops::RangeInclusive<f64> = 3.0..=15.0;

/// The part of [`AppConfig`] the user edits from the tracker window.
#[derive(Clone, PartialEq)]
pub struct CoachSettings {
    pub target_pace: f64,
    pub advisor_key: Option<String>,
    pub voice_key: Option<String>,
}

impl CoachSettings {
    /// Trim keys (blank means none) and clamp the pace into
    /// [`TARGET_PACE_RANGE`].
    pub fn normalized(self) -> Self {
        let key = |k: Option<String>| {
            k.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
        };
        let pace = if self.target_pace.is_finite() {
            self.target_pace
        } else {
            *TARGET_PACE_RANGE.start()
        };
        Self {
            target_pace: pace.clamp(*TARGET_PACE_RANGE.start(), *TARGET_PACE_RANGE.end()),
            advisor_key: key(self.advisor_key),
            voice_key: key(self.voice_key),
        }
    }
}

// Keys stay out of logs.
impl std::fmt::Debug for CoachSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoachSettings")
            .field("target_pace", &self.target_pace)
            .field("advisor_key", &self.advisor_key.as_ref().map(|_| "***"))
            .field("voice_key", &self.voice_key.as_ref().map(|_| "***"))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use stride_tracker::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Position stream and accumulator settings.
    pub tracking: TrackingConfig,
    /// Post-run analysis settings.
    pub advisor: AdvisorConfig,
    /// Spoken feedback settings.
    pub voice: VoiceConfig,
    /// Map canvas settings.
    pub map: MapConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Current values of the user-editable settings.
    pub fn coach_settings(&self) -> CoachSettings {
        CoachSettings {
            target_pace: self.tracking.target_pace,
            advisor_key: self.advisor.api_key.clone(),
            voice_key: self.voice.api_key.clone(),
        }
    }

    /// Store `settings` (normalized) and return what was stored.
    pub fn apply_coach_settings(&mut self, settings: CoachSettings) -> CoachSettings {
        let settings = settings.normalized();
        self.tracking.target_pace = settings.target_pace;
        self.advisor.api_key = settings.advisor_key.clone();
        self.voice.api_key = settings.voice_key.clone();
        settings
    }

    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
