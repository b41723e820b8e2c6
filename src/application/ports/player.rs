//! Audio playback port interface

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::application::events::ControllerEvent;
use crate::domain::audio::AudioArtifact;

/// Playback errors
#[derive(Debug, Clone, Error)]
pub enum PlayerError {
    #[error("Failed to decode recording: {0}")]
    DecodeFailed(String),

    #[error("No audio output device available: {0}")]
    DeviceUnavailable(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

/// Port for reviewing a finalized recording.
///
/// A successful `load` delivers exactly one `PlayerReady` notification,
/// then a bounded-rate sequence of `PlayerProgress` notifications while
/// playing, then one `PlayerEnded` at end of stream. Exactly one `release`
/// must follow every successful `load`.
#[async_trait]
pub trait Player: Send + Sync {
    /// Decode the artifact and begin delivering transport notifications
    /// into `events`. Playback starts paused at position zero.
    async fn load(
        &self,
        artifact: &AudioArtifact,
        events: mpsc::Sender<ControllerEvent>,
    ) -> Result<(), PlayerError>;

    /// Resume playback from the current position
    async fn play(&self) -> Result<(), PlayerError>;

    /// Pause playback, keeping the current position
    async fn pause(&self) -> Result<(), PlayerError>;

    /// Move the position, in seconds from the start of the audio
    async fn seek(&self, position_seconds: f64) -> Result<(), PlayerError>;

    /// Release the decoded audio. No-op when nothing is loaded.
    async fn release(&self);
}
