//! Audio playback collaborators
//!
//! The pipeline hands decoded response audio to an [`AudioSink`]. Speakers
//! are the normal sink; writing files is the fallback for headless hosts.

mod file;
mod speaker;

pub use file::FileSink;
pub use speaker::{DecodedAudio, SpeakerSink, decode_mp3};

use async_trait::async_trait;

use crate::Result;

/// Trait for anything that can play a decoded audio buffer
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play one response buffer to completion
    ///
    /// # Errors
    ///
    /// Returns error if the audio cannot be played
    async fn play(&self, audio: Vec<u8>) -> Result<()>;

    /// Signal that a capture event fired
    ///
    /// # Errors
    ///
    /// Returns error if the cue cannot be played
    async fn capture_cue(&self) -> Result<()> {
        Ok(())
    }

    /// Sink name for logging
    fn name(&self) -> &'static str;
}
