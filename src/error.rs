//! Error types for HearSee

use thiserror::Error;

/// Result type alias for HearSee operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in HearSee
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The request never reached the server or no response came back
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("server error {status}: {body}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body, treated as opaque text
        body: String,
    },

    /// The response payload could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Image capture error
    #[error("capture error: {0}")]
    Capture(String),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error ended an upload cycle (as opposed to a local setup failure)
    #[must_use]
    pub const fn is_exchange_error(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Server { .. } | Self::Decode(_)
        )
    }
}
