//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\stride-tracker\
//!   macOS:   ~/Library/Application Support/stride-tracker/
//!   Linux:   ~/.config/stride-tracker/
//!
//! Data dir (recorded tracks):
//!   Windows: %LOCALAPPDATA%\stride-tracker\
//!   macOS:   ~/Library/Application Support/stride-tracker/
//!   Linux:   ~/.local/share/stride-tracker/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory searched for replay track files given by bare name.
    pub tracks_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "stride-tracker";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let tracks_dir = data_dir.join("tracks");

        Self {
            config_dir,
            settings_file,
            tracks_dir,
        }
    }

    /// Resolve a replay track argument: existing paths are used as-is,
    /// anything else is looked up inside [`tracks_dir`](Self::tracks_dir).
    pub fn resolve_track(&self, arg: &str) -> PathBuf {
        let direct = PathBuf::from(arg);
        if direct.exists() {
            direct
        } else {
            self.tracks_dir.join(arg)
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths.tracks_dir.ends_with("tracks"));
    }

    #[test]
    fn unknown_track_resolves_into_tracks_dir() {
        let paths = AppPaths::new();
        let resolved = paths.resolve_track("no-such-run-7f3a.json");
        assert_eq!(resolved, paths.tracks_dir.join("no-such-run-7f3a.json"));
    }

    #[test]
    fn existing_track_path_is_kept() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let arg = file.path().to_str().expect("utf-8 path");
        assert_eq!(AppPaths::new().resolve_track(arg), file.path());
    }
}
