//! Audio playback to speakers

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cpal::SampleRate;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::AudioSink;
use crate::config::PlaybackConfig;
use crate::{Error, Result};

/// Mono PCM decoded from an MP3 payload
#[derive(Debug, Clone, Default)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Plays response audio and cues on the default output device
pub struct SpeakerSink {
    capture_cue: Option<PathBuf>,
    end_cue: Option<PathBuf>,
    end_cue_delay: Duration,
}

impl SpeakerSink {
    /// Create a speaker sink
    ///
    /// # Errors
    ///
    /// Returns error if no output device is available
    pub fn new(config: &PlaybackConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            capture_cue = ?config.capture_cue,
            end_cue = ?config.end_cue,
            "audio playback initialized"
        );

        Ok(Self {
            capture_cue: config.capture_cue.clone(),
            end_cue: config.end_cue.clone(),
            end_cue_delay: config.end_cue_delay,
        })
    }

    /// Play audio from MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if decoding or playback fails
    pub async fn play_mp3(&self, mp3_data: Vec<u8>) -> Result<()> {
        run_blocking(move || {
            let decoded = decode_mp3(&mp3_data)?;
            play_blocking(&decoded)
        })
        .await
    }

    /// Play raw mono samples
    ///
    /// # Errors
    ///
    /// Returns error if playback fails
    pub async fn play_samples(&self, samples: Vec<f32>, sample_rate: u32) -> Result<()> {
        run_blocking(move || {
            play_blocking(&DecodedAudio {
                samples,
                sample_rate,
            })
        })
        .await
    }

    /// Play a cue file; failures are logged, never returned
    async fn play_cue(&self, path: &Path) {
        let result = match tokio::fs::read(path).await {
            Ok(data) => self.play_mp3(data).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "failed to play cue");
        }
    }
}

#[async_trait]
impl AudioSink for SpeakerSink {
    async fn play(&self, audio: Vec<u8>) -> Result<()> {
        self.play_mp3(audio).await?;

        if let Some(cue) = &self.end_cue {
            tokio::time::sleep(self.end_cue_delay).await;
            self.play_cue(cue).await;
        }

        Ok(())
    }

    async fn capture_cue(&self) -> Result<()> {
        if let Some(cue) = &self.capture_cue {
            self.play_cue(cue).await;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "speaker"
    }
}

/// Run audio device work off the async runtime
async fn run_blocking<F>(work: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
}

/// Play samples on the default output device, returning once they finish
fn play_blocking(audio: &DecodedAudio) -> Result<()> {
    if audio.samples.is_empty() || audio.sample_rate == 0 {
        return Ok(());
    }

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device".to_string()))?;

    let rate = SampleRate(audio.sample_rate);
    let supported_config = device
        .supported_output_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| c.channels() == 1 && c.min_sample_rate() <= rate && c.max_sample_rate() >= rate)
        .or_else(|| {
            // Fallback: try stereo
            device.supported_output_configs().ok()?.find(|c| {
                c.channels() == 2 && c.min_sample_rate() <= rate && c.max_sample_rate() >= rate
            })
        })
        .ok_or_else(|| {
            Error::Audio(format!(
                "no output config supports {} Hz",
                audio.sample_rate
            ))
        })?;

    let config = supported_config.with_sample_rate(rate).config();
    let channels = usize::from(config.channels);

    let samples = Arc::new(audio.samples.clone());
    let position = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicBool::new(false));

    let samples_cb = Arc::clone(&samples);
    let position_cb = Arc::clone(&position);
    let finished_cb = Arc::clone(&finished);

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut pos = position_cb.load(Ordering::Relaxed);

                for frame in data.chunks_mut(channels) {
                    let sample = if let Some(&s) = samples_cb.get(pos) {
                        pos += 1;
                        s
                    } else {
                        finished_cb.store(true, Ordering::Release);
                        0.0
                    };
                    frame.fill(sample);
                }

                position_cb.store(pos, Ordering::Relaxed);
            },
            |err| {
                tracing::error!(error = %err, "audio playback error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    let sample_count = samples.len() as u64;
    let duration_ms = sample_count * 1000 / u64::from(audio.sample_rate);

    // Poll for completion with timeout
    let start = Instant::now();
    let timeout = Duration::from_millis(duration_ms + 500);

    while !finished.load(Ordering::Acquire) {
        if start.elapsed() > timeout {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    // Small delay to ensure audio finishes
    std::thread::sleep(Duration::from_millis(100));

    drop(stream);
    tracing::debug!(samples = sample_count, "playback complete");

    Ok(())
}

/// Decode MP3 bytes to mono f32 samples
///
/// # Errors
///
/// Returns error if the data is not a decodable MP3 stream
pub fn decode_mp3(mp3_data: &[u8]) -> Result<DecodedAudio> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut decoded = DecodedAudio::default();
    let mut frames = 0usize;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                frames += 1;
                if decoded.sample_rate == 0 {
                    decoded.sample_rate = u32::try_from(frame.sample_rate).unwrap_or(0);
                }

                if frame.channels == 2 {
                    // Stereo: average channels
                    decoded.samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right =
                            f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    decoded
                        .samples
                        .extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    if frames == 0 && !mp3_data.is_empty() {
        return Err(Error::Audio("no MP3 frames in payload".to_string()));
    }

    Ok(decoded)
}
