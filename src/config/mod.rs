//! Configuration management for HearSee
//!
//! Values are layered env > TOML file > defaults.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::{Error, Result};

use file::HearSeeConfigFile;

/// Default processing server
pub const DEFAULT_BASE_URL: &str = "https://server-upnmifaofa-ew.a.run.app/";

/// Default maximum gap between the taps of a double-tap
pub const DEFAULT_DOUBLE_TAP_TIMEOUT: Duration = Duration::from_millis(300);

/// Default pause between response audio and the end cue
pub const DEFAULT_END_CUE_DELAY: Duration = Duration::from_millis(200);

/// HearSee configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Processing server
    pub server: ServerConfig,

    /// Image capture
    pub capture: CaptureConfig,

    /// Audio playback
    pub playback: PlaybackConfig,

    /// Double-tap gesture
    pub gesture: GestureConfig,
}

/// Processing server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL, always ending in `/`
    pub base_url: Url,

    /// Request timeout; `None` leaves the HTTP client default in place
    pub timeout: Option<Duration>,
}

/// Image capture configuration
#[derive(Debug, Clone, Default)]
pub struct CaptureConfig {
    /// JPEG file read on every capture event
    pub source: Option<PathBuf>,

    /// Directory receiving a timestamped copy of each capture
    pub archive_dir: Option<PathBuf>,
}

/// Audio playback configuration
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Play through the speakers; when false audio is written to `output_dir`
    pub enabled: bool,

    /// Directory for written audio files
    pub output_dir: PathBuf,

    /// MP3 cue played when a capture fires
    pub capture_cue: Option<PathBuf>,

    /// MP3 cue played after a response finishes
    pub end_cue: Option<PathBuf>,

    /// Pause before the end cue
    pub end_cue_delay: Duration,
}

/// Gesture configuration
#[derive(Debug, Clone)]
pub struct GestureConfig {
    /// Maximum gap between the two taps of a double-tap
    pub double_tap_timeout: Duration,
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid (e.g. a malformed URL)
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::resolve(fc, |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn resolve<F>(fc: HearSeeConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = env("HEARSEE_SERVER_URL")
            .or(fc.server.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = match env("HEARSEE_TIMEOUT_SECS") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("HEARSEE_TIMEOUT_SECS must be an integer: {e}"))
            })?),
            None => fc.server.timeout_secs,
        };

        let server = ServerConfig {
            base_url: parse_base_url(&base_url)?,
            timeout: timeout_secs.map(Duration::from_secs),
        };

        let capture = CaptureConfig {
            source: env("HEARSEE_CAPTURE_SOURCE")
                .map(PathBuf::from)
                .or(fc.capture.source),
            archive_dir: env("HEARSEE_ARCHIVE_DIR")
                .map(PathBuf::from)
                .or(fc.capture.archive_dir),
        };

        let playback = PlaybackConfig {
            enabled: fc.playback.enabled.unwrap_or(true),
            output_dir: env("HEARSEE_OUTPUT_DIR")
                .map(PathBuf::from)
                .or(fc.playback.output_dir)
                .unwrap_or_else(default_output_dir),
            capture_cue: fc.playback.capture_cue,
            end_cue: fc.playback.end_cue,
            end_cue_delay: fc
                .playback
                .end_cue_delay_ms
                .map_or(DEFAULT_END_CUE_DELAY, Duration::from_millis),
        };

        let gesture = GestureConfig {
            double_tap_timeout: fc
                .gesture
                .double_tap_timeout_ms
                .map_or(DEFAULT_DOUBLE_TAP_TIMEOUT, Duration::from_millis),
        };

        Ok(Self {
            server,
            capture,
            playback,
            gesture,
        })
    }

    /// Override the server base URL (e.g. from a CLI flag)
    ///
    /// # Errors
    ///
    /// Returns error if the URL is malformed
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.server.base_url = parse_base_url(base_url)?;
        Ok(self)
    }
}

/// Parse a base URL so that relative endpoint paths resolve beneath it
///
/// A trailing slash is appended when missing, so `http://host/api` resolves
/// `process` to `http://host/api/process` rather than `http://host/process`.
///
/// # Errors
///
/// Returns error if the URL is malformed or cannot carry a path
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| Error::Config(format!("invalid server URL {raw:?}: {e}")))?;

    if url.cannot_be_a_base() {
        return Err(Error::Config(format!("server URL {raw:?} cannot be a base")));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Default audio output directory: `~/.cache/hearsee/`
fn default_output_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".cache/hearsee"),
        |d| d.cache_dir().join("hearsee"),
    )
}
