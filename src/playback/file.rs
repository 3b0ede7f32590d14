//! Audio "playback" to disk for hosts without speakers

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

use super::AudioSink;
use crate::{Error, Result};

/// Where a [`FileSink`] writes
#[derive(Debug, Clone)]
enum Target {
    /// A fresh `audio-<timestamp>.mp3` per response inside this directory
    Directory(PathBuf),
    /// Always this exact file
    File(PathBuf),
}

/// Writes response audio to disk instead of playing it
#[derive(Debug, Clone)]
pub struct FileSink {
    target: Target,
}

impl FileSink {
    /// Write each response to a new file in `dir`
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::Directory(dir.into()),
        }
    }

    /// Write every response to `path`, replacing earlier content
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::File(path.into()),
        }
    }

    /// Persist one buffer, returning the written path
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created or written
    pub async fn write(&self, audio: Vec<u8>) -> Result<PathBuf> {
        let target = self.target.clone();
        tokio::task::spawn_blocking(move || match target {
            Target::Directory(dir) => write_fresh(&dir, &audio),
            Target::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, &audio)?;
                Ok(path)
            }
        })
        .await
        .map_err(|e| Error::Audio(format!("audio write task failed: {e}")))?
    }
}

const AUDIO_NAME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S-%3f";

/// File name for audio written at `at`, with a `-N` suffix after a clash
#[must_use]
pub fn audio_file_name(at: &NaiveDateTime, attempt: u32) -> String {
    let stamp = at.format(AUDIO_NAME_FORMAT);
    if attempt == 0 {
        format!("audio-{stamp}.mp3")
    } else {
        format!("audio-{stamp}-{attempt}.mp3")
    }
}

/// Create a new `audio-<timestamp>.mp3` in `dir`, never overwriting
fn write_fresh(dir: &Path, audio: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let now = Local::now().naive_local();
    let mut attempt = 0;
    loop {
        let path = dir.join(audio_file_name(&now, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(audio)?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(Error::Io(e)),
        }
    }
}

#[async_trait]
impl AudioSink for FileSink {
    async fn play(&self, audio: Vec<u8>) -> Result<()> {
        let bytes = audio.len();
        let path = self.write(audio).await?;
        tracing::info!(path = %path.display(), bytes, "wrote response audio");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn audio_name_uses_millisecond_timestamp() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_milli_opt(7, 5, 2, 42)
            .unwrap();

        assert_eq!(audio_file_name(&at, 0), "audio-2024-03-09-07-05-02-042.mp3");
        assert_eq!(audio_file_name(&at, 2), "audio-2024-03-09-07-05-02-042-2.mp3");
    }
}
