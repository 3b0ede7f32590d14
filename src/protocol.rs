//! Wire shapes for the `/process` exchange
//!
//! ```text
//! POST <base-url>/process   {"image": "<base64-jpeg>"}
//! 200 OK                    {"audio": "<base64-audio>"}
//! ```

use serde::{Deserialize, Serialize};

/// Path of the processing endpoint, relative to the base URL
pub const PROCESS_PATH: &str = "process";

/// Upload body: one Base64-encoded JPEG
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub image: String,
}

impl ImageRequest {
    /// Wrap an already-encoded image, unchanged
    #[must_use]
    pub const fn new(image: String) -> Self {
        Self { image }
    }
}

/// Success body: Base64-encoded audio (MP3 in practice)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResponse {
    pub audio: String,
}
