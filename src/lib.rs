//! HearSee - capture a photo, upload it, hear the answer
//!
//! This library provides the client side of the photo-to-speech exchange:
//! - Capture sources producing Base64 JPEGs
//! - The `/process` upload and audio decode
//! - Playback sinks (speakers or files)
//! - Double-tap gesture detection
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  double-tap   ┌──────────────┐   POST /process   ┌────────┐
//! │ ImageSource  ├──────────────►│   Pipeline   ├──────────────────►│ server │
//! └──────────────┘  base64 jpeg  │ (tokio task) │◄──────────────────┤        │
//!                                └──────┬───────┘   {"audio": ...}  └────────┘
//!                                       │ decoded bytes
//!                                ┌──────▼───────┐
//!                                │  AudioSink   │
//!                                └──────────────┘
//! ```

pub mod capture;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod gesture;
pub mod pipeline;
pub mod playback;
pub mod protocol;

pub use capture::{FileSource, ImageSource};
pub use client::{ProcessClient, shared_http_client};
pub use codec::{decode_audio, encode_image};
pub use config::Config;
pub use error::{Error, Result};
pub use gesture::{DoubleTapDetector, GestureState};
pub use pipeline::{Completion, Completions, Outcome, Pipeline, run_tap_loop};
pub use playback::{AudioSink, FileSink, SpeakerSink};
pub use protocol::{ImageRequest, ImageResponse};
