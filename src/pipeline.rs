//! Capture → upload → playback orchestration
//!
//! Each submission runs on its own tokio task and reports exactly one
//! [`Completion`] on the pipeline's channel. Submissions are independent:
//! nothing is queued, de-duplicated or limited, and overlapping ones may
//! finish in any order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::capture::ImageSource;
use crate::client::ProcessClient;
use crate::gesture::DoubleTapDetector;
use crate::playback::AudioSink;
use crate::Result;

/// What a successful cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Response audio was handed to the sink
    Played {
        /// Decoded audio size
        bytes: usize,
    },
    /// The server answered 2xx without a body; nothing was played
    NoAudio,
}

/// Result of one submission, delivered once
#[derive(Debug)]
pub struct Completion {
    /// Sequence number returned by the submitting call
    pub id: u64,
    /// Success or the error that ended the cycle
    pub outcome: Result<Outcome>,
}

/// Receiving half of a pipeline's completion channel
pub type Completions = mpsc::UnboundedReceiver<Completion>;

/// Drives capture/upload/playback cycles
#[derive(Clone)]
pub struct Pipeline {
    client: Arc<ProcessClient>,
    sink: Arc<dyn AudioSink>,
    completions: mpsc::UnboundedSender<Completion>,
    next_id: Arc<AtomicU64>,
}

impl Pipeline {
    /// Create a pipeline and the channel its completions arrive on
    #[must_use]
    pub fn new(client: ProcessClient, sink: Arc<dyn AudioSink>) -> (Self, Completions) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pipeline = Self {
            client: Arc::new(client),
            sink,
            completions: tx,
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (pipeline, rx)
    }

    /// Upload an already-encoded image and play the reply, in the background
    ///
    /// Returns the submission's sequence number immediately. The request
    /// cannot be cancelled once issued. Must be called within a tokio runtime.
    pub fn submit_image(&self, image_base64: String) -> u64 {
        let id = self.next_id();
        let this = self.clone();

        tokio::spawn(async move {
            let outcome = this.exchange(id, image_base64).await;
            this.complete(id, outcome);
        });

        id
    }

    /// Handle a capture event: cue, capture, then upload and play
    ///
    /// The cue plays on its own task and never holds up the upload. A failed
    /// capture ends the cycle without a request. Must be called within a
    /// tokio runtime.
    pub fn capture_event(&self, source: Arc<dyn ImageSource>) -> u64 {
        let id = self.next_id();
        let this = self.clone();

        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.capture_cue().await {
                tracing::warn!(id, sink = sink.name(), error = %e, "capture cue failed");
            }
        });

        tokio::spawn(async move {
            let outcome = match source.capture().await {
                Ok(image) => this.exchange(id, image).await,
                Err(e) => {
                    tracing::error!(id, source = source.name(), error = %e, "capture failed");
                    Err(e)
                }
            };

            this.complete(id, outcome);
        });

        id
    }

    /// Run one exchange in the caller's task and return its outcome
    ///
    /// # Errors
    ///
    /// Returns the transport, server, decode or playback error that ended the cycle
    pub async fn process(&self, image_base64: String) -> Result<Outcome> {
        let id = self.next_id();
        self.exchange(id, image_base64).await
    }

    async fn exchange(&self, id: u64, image_base64: String) -> Result<Outcome> {
        let reply = match self.client.submit_image(image_base64).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(id, error = %e, "image upload failed");
                return Err(e);
            }
        };

        let Some(audio) = reply else {
            return Ok(Outcome::NoAudio);
        };

        let bytes = audio.len();
        if let Err(e) = self.sink.play(audio).await {
            tracing::error!(id, sink = self.sink.name(), error = %e, "playback failed");
            return Err(e);
        }

        tracing::info!(id, bytes, sink = self.sink.name(), "response played");
        Ok(Outcome::Played { bytes })
    }

    fn complete(&self, id: u64, outcome: Result<Outcome>) {
        if self.completions.send(Completion { id, outcome }).is_err() {
            tracing::debug!(id, "completion receiver dropped");
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Turn input lines into taps and run capture cycles until input ends
///
/// Each line is one tap; a double-tap fires [`Pipeline::capture_event`].
/// Once `input` reaches EOF no new cycles start, but cycles already in
/// flight are awaited and passed to `on_complete` before returning.
/// Returns the number of cycles that completed.
///
/// # Errors
///
/// Returns error if reading `input` fails
pub async fn run_tap_loop<R, F>(
    pipeline: &Pipeline,
    completions: &mut Completions,
    source: &Arc<dyn ImageSource>,
    detector: &mut DoubleTapDetector,
    input: R,
    mut on_complete: F,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(&Completion),
{
    let mut lines = input.lines();
    let mut input_open = true;
    let mut in_flight = 0usize;
    let mut completed = 0usize;

    while input_open || in_flight > 0 {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                if line?.is_none() {
                    input_open = false;
                    detector.reset();
                    if in_flight > 0 {
                        tracing::info!(in_flight, "input closed, waiting for cycles in flight");
                    }
                } else if detector.tap(Instant::now()) {
                    let id = pipeline.capture_event(Arc::clone(source));
                    in_flight += 1;
                    tracing::info!(id, "capture event");
                }
            }
            Some(completion) = completions.recv() => {
                in_flight = in_flight.saturating_sub(1);
                completed += 1;
                on_complete(&completion);
            }
            else => break,
        }
    }

    Ok(completed)
}
