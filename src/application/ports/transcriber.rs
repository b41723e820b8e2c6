//! Live transcription port interface

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::application::events::ControllerEvent;
use crate::application::ports::capture::AudioTap;

/// Transcription errors
#[derive(Debug, Clone, Error)]
pub enum TranscriberError {
    #[error("Live transcription is not available: {0}")]
    Unsupported(String),

    #[error("Transcription stream failed: {0}")]
    StreamFailed(String),
}

/// Port for live speech-to-text.
///
/// After a successful `start`, fragments are delivered into the event
/// channel in receipt order until `stop` is called or the stream reports
/// an internal error. Fragments for one utterance arrive as zero-or-more
/// non-final hypotheses followed by exactly one final fragment.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Start consuming the audio tap and delivering fragments into `events`.
    async fn start(
        &self,
        audio: AudioTap,
        events: mpsc::Sender<ControllerEvent>,
    ) -> Result<(), TranscriberError>;

    /// Stop the stream. No-op when not started.
    async fn stop(&self);
}
