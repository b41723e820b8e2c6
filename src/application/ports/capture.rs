//! Microphone capture port interface

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

use crate::application::events::ControllerEvent;
use crate::domain::audio::{AudioArtifact, AudioChunk, AudioSpec};

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("No audio input device available")]
    DeviceUnavailable,

    #[error("Failed to start capture: {0}")]
    StartFailed(String),

    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Failed to encode recording: {0}")]
    EncodeFailed(String),
}

/// A live subscription to the capture stream, used to feed the transcriber
/// from the same audio the recording is assembled from.
pub type AudioTap = broadcast::Receiver<AudioChunk>;

/// Port for live microphone capture.
///
/// Exactly one `stop` or `release` must follow every successful `open`.
/// `stop` finalizes the recording into an artifact; `release` discards it.
#[async_trait]
pub trait Capture: Send + Sync {
    /// Open the microphone and start streaming chunks into `events`.
    async fn open(&self, events: mpsc::Sender<ControllerEvent>) -> Result<(), CaptureError>;

    /// Subscribe to the live audio stream. Valid while the capture is open.
    fn tap(&self) -> AudioTap;

    /// Audio parameters of the emitted chunks
    fn spec(&self) -> AudioSpec;

    /// Stop the stream and finalize the recording into an artifact.
    /// The microphone handle is closed whether or not encoding succeeds.
    async fn stop(&self) -> Result<AudioArtifact, CaptureError>;

    /// Close the microphone and discard buffered audio.
    /// No-op when the capture is not open.
    async fn release(&self);
}
