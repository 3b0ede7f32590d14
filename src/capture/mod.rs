//! Image capture collaborators
//!
//! A capture yields one Base64-encoded JPEG, ready to upload.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::codec::encode_image;
use crate::{Error, Result};

/// Timestamp layout for archived captures (`2024-03-09-14-05-33-042.jpg`)
const ARCHIVE_NAME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S-%3f";

/// Trait for anything that can produce one encoded JPEG per capture event
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Capture one image and return it Base64-encoded
    ///
    /// # Errors
    ///
    /// Returns error if no image could be obtained
    async fn capture(&self) -> Result<String>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// Reads a JPEG from disk on every capture
///
/// The file is re-read each time, so anything that keeps overwriting it
/// (a webcam grabber, a phone sync folder) acts as the camera.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    archive_dir: Option<PathBuf>,
}

impl FileSource {
    /// Create a source reading `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            archive_dir: None,
        }
    }

    /// Keep a timestamped copy of every capture in `dir`
    #[must_use]
    pub fn with_archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = Some(dir.into());
        self
    }

    /// Path read on each capture
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ImageSource for FileSource {
    async fn capture(&self) -> Result<String> {
        let jpeg = tokio::fs::read(&self.path).await.map_err(|e| {
            Error::Capture(format!("failed to read {}: {e}", self.path.display()))
        })?;

        if let Some(dir) = &self.archive_dir {
            let now = chrono::Local::now().naive_local();
            match archive(dir, &now, &jpeg).await {
                Ok(path) => tracing::debug!(path = %path.display(), "archived capture"),
                Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "failed to archive capture"),
            }
        }

        tracing::debug!(path = %self.path.display(), bytes = jpeg.len(), "captured image");
        Ok(encode_image(&jpeg))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// File name for a capture taken at `at`
#[must_use]
pub fn archive_file_name(at: &NaiveDateTime) -> String {
    format!("{}.jpg", at.format(ARCHIVE_NAME_FORMAT))
}

/// Write a capture into the archive directory
async fn archive(dir: &Path, at: &NaiveDateTime, jpeg: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(archive_file_name(at));
    tokio::fs::write(&path, jpeg).await?;
    Ok(path)
}
