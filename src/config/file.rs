//! TOML configuration file loading
//!
//! Supports `~/.config/hearsee/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct HearSeeConfigFile {
    /// Processing server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Image capture configuration
    #[serde(default)]
    pub capture: CaptureFileConfig,

    /// Audio playback configuration
    #[serde(default)]
    pub playback: PlaybackFileConfig,

    /// Gesture configuration
    #[serde(default)]
    pub gesture: GestureFileConfig,
}

/// Processing server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Base URL the `process` endpoint is resolved against
    pub base_url: Option<String>,

    /// Request timeout in seconds (unset = HTTP client default)
    pub timeout_secs: Option<u64>,
}

/// Image capture configuration
#[derive(Debug, Default, Deserialize)]
pub struct CaptureFileConfig {
    /// JPEG file read on every capture event
    pub source: Option<PathBuf>,

    /// Directory receiving a timestamped copy of each capture
    pub archive_dir: Option<PathBuf>,
}

/// Audio playback configuration
#[derive(Debug, Default, Deserialize)]
pub struct PlaybackFileConfig {
    /// Play through the speakers (false = write audio files)
    pub enabled: Option<bool>,

    /// Directory for written audio files
    pub output_dir: Option<PathBuf>,

    /// MP3 cue played when a capture fires
    pub capture_cue: Option<PathBuf>,

    /// MP3 cue played after a response finishes
    pub end_cue: Option<PathBuf>,

    /// Pause before the end cue, in milliseconds
    pub end_cue_delay_ms: Option<u64>,
}

/// Gesture configuration
#[derive(Debug, Default, Deserialize)]
pub struct GestureFileConfig {
    /// Maximum gap between the two taps of a double-tap
    pub double_tap_timeout_ms: Option<u64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `HearSeeConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> HearSeeConfigFile {
    let Some(path) = config_file_path() else {
        return HearSeeConfigFile::default();
    };

    if !path.exists() {
        return HearSeeConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            HearSeeConfigFile::default()
        }
    }
}

/// Read and parse a config file at an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn read_config_file(path: &Path) -> Result<HearSeeConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Return the config file path: `~/.config/hearsee/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("hearsee").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let fc: HearSeeConfigFile = toml::from_str("").unwrap();
        assert!(fc.server.base_url.is_none());
        assert!(fc.playback.enabled.is_none());
        assert!(fc.gesture.double_tap_timeout_ms.is_none());
    }

    #[test]
    fn parses_all_sections() {
        let fc: HearSeeConfigFile = toml::from_str(
            r#"
            [server]
            base_url = "http://localhost:8080/api"
            timeout_secs = 12

            [capture]
            source = "/tmp/frame.jpg"

            [playback]
            enabled = false
            end_cue_delay_ms = 50

            [gesture]
            double_tap_timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(fc.server.base_url.as_deref(), Some("http://localhost:8080/api"));
        assert_eq!(fc.server.timeout_secs, Some(12));
        assert_eq!(fc.capture.source, Some(PathBuf::from("/tmp/frame.jpg")));
        assert_eq!(fc.playback.enabled, Some(false));
        assert_eq!(fc.playback.end_cue_delay_ms, Some(50));
        assert_eq!(fc.gesture.double_tap_timeout_ms, Some(250));
    }

    #[test]
    fn read_config_file_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nbase_url = ").unwrap();

        assert!(matches!(
            read_config_file(&path),
            Err(crate::Error::Toml(_))
        ));
    }
}
