//! Shared test utilities

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use hearsee::{AudioSink, Error, ImageSource, ProcessClient, Result};

/// Sink that records every buffer it is asked to play
#[derive(Default)]
pub struct RecordingSink {
    played: Mutex<Vec<Vec<u8>>>,
    cues: AtomicUsize,
}

impl RecordingSink {
    /// Buffers played so far, in completion order
    pub fn played(&self) -> Vec<Vec<u8>> {
        self.played.lock().expect("sink lock poisoned").clone()
    }

    /// Number of capture cues requested
    pub fn cue_count(&self) -> usize {
        self.cues.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn play(&self, audio: Vec<u8>) -> Result<()> {
        self.played.lock().expect("sink lock poisoned").push(audio);
        Ok(())
    }

    async fn capture_cue(&self) -> Result<()> {
        self.cues.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Sink whose playback always fails
pub struct BrokenSink;

#[async_trait]
impl AudioSink for BrokenSink {
    async fn play(&self, _audio: Vec<u8>) -> Result<()> {
        Err(Error::Audio("no output device".to_string()))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

/// Sink whose capture cue never finishes
#[derive(Default)]
pub struct StuckCueSink {
    played: Mutex<Vec<Vec<u8>>>,
}

impl StuckCueSink {
    pub fn played(&self) -> Vec<Vec<u8>> {
        self.played.lock().expect("sink lock poisoned").clone()
    }
}

#[async_trait]
impl AudioSink for StuckCueSink {
    async fn play(&self, audio: Vec<u8>) -> Result<()> {
        self.played.lock().expect("sink lock poisoned").push(audio);
        Ok(())
    }

    async fn capture_cue(&self) -> Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stuck-cue"
    }
}

/// Source returning a fixed encoded image
pub struct StaticSource(pub String);

#[async_trait]
impl ImageSource for StaticSource {
    async fn capture(&self) -> Result<String> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Source whose capture always fails
pub struct FailingSource;

#[async_trait]
impl ImageSource for FailingSource {
    async fn capture(&self) -> Result<String> {
        Err(Error::Capture("camera unavailable".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Client pointed at a mock server
pub fn client_for(server: &mockito::ServerGuard) -> ProcessClient {
    ProcessClient::from_base_url(&server.url()).expect("mock server URL is valid")
}

/// Base URL of a local port with nothing listening on it
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}/")
}
