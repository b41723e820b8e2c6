//! Capability notifications
//!
//! Every callback the capabilities would otherwise deliver directly
//! (capture chunks, transcript fragments, player transport events, timer
//! ticks) is expressed as one [`ControllerEvent`] and funneled through a
//! single channel into the controller. State is therefore mutated one
//! notification at a time, in arrival order, without locking.

use crate::domain::audio::AudioChunk;

/// A text fragment from the live transcription stream.
///
/// Fragments for one utterance arrive as zero-or-more non-final hypotheses
/// followed by exactly one final fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptFragment {
    pub text: String,
    pub is_final: bool,
}

impl TranscriptFragment {
    /// Create an interim (unconfirmed) fragment
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    /// Create a final (committed) fragment
    pub fn fin(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Notification delivered to the controller's single processing entry point
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// A block of captured audio arrived
    CaptureChunk(AudioChunk),
    /// The transcriber produced a fragment
    Transcript(TranscriptFragment),
    /// The transcription stream shut down mid-recording
    TranscriberDown(String),
    /// One second of recording time elapsed
    Tick,
    /// The player finished decoding and knows the total duration
    PlayerReady { duration_seconds: f64 },
    /// Playback advanced; delivered at a bounded rate while playing
    PlayerProgress { position_seconds: f64 },
    /// Playback reached the end of the audio
    PlayerEnded,
}
