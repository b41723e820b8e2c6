//! Dictation controller
//!
//! The controller owns the active [`Session`] and drives the three
//! capabilities (capture, live transcription, playback) through a single
//! life cycle per recording attempt. User commands arrive as method calls;
//! capability callbacks arrive as [`ControllerEvent`]s through one channel
//! and are applied by [`DictationController::handle_event`]. Both paths go
//! through `&mut self`, so state mutates one step at a time, in arrival
//! order, and never needs a lock.
//!
//! Cleanup invariant: every exit path (stop, cancel, clear, or a failed
//! stop) leaves no capability handle open and no timer running.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::events::{ControllerEvent, TranscriptFragment};
use super::ports::{Capture, CaptureError, Player, PlayerError, Transcriber};
use crate::domain::audio::format_size;
use crate::domain::session::{DictationStatus, InvalidTransition, Session};

/// Errors from controller commands
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Recording failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Playback failed: {0}")]
    Playback(#[from] PlayerError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

/// Playback portion of the observable state
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub is_playing: bool,
    pub is_preparing: bool,
    pub completed: bool,
    pub progress_fraction: f64,
}

/// Observable state snapshot for the surrounding form
#[derive(Debug, Clone)]
pub struct ControllerSnapshot {
    pub status: DictationStatus,
    pub elapsed_seconds: u64,
    pub transcript_interim: String,
    pub notes_text: String,
    /// Human-readable size of the audio captured so far
    pub captured_size: String,
    /// True when recording proceeds without live transcription
    pub degraded: bool,
    pub playback: Option<PlaybackSnapshot>,
}

/// Orchestrates one dictation attempt over the three capability ports.
pub struct DictationController<C, T, P>
where
    C: Capture,
    T: Transcriber,
    P: Player,
{
    capture: C,
    transcriber: T,
    player: P,
    events: mpsc::Sender<ControllerEvent>,
    session: Session,
    /// The externally visible shift-notes buffer
    notes: String,
    capture_open: bool,
    transcriber_active: bool,
    degraded: bool,
    ticker: Option<JoinHandle<()>>,
}

impl<C, T, P> DictationController<C, T, P>
where
    C: Capture,
    T: Transcriber,
    P: Player,
{
    /// Create a controller around the given capabilities.
    /// `initial_notes` is whatever the operator has already typed.
    pub fn new(
        capture: C,
        transcriber: T,
        player: P,
        initial_notes: String,
        events: mpsc::Sender<ControllerEvent>,
    ) -> Self {
        Self {
            capture,
            transcriber,
            player,
            events,
            session: Session::new(),
            notes: initial_notes,
            capture_open: false,
            transcriber_active: false,
            degraded: false,
            ticker: None,
        }
    }

    /// Get the current status
    pub fn status(&self) -> DictationStatus {
        self.session.status()
    }

    /// Get the notes text as it currently stands
    pub fn notes_text(&self) -> &str {
        &self.notes
    }

    /// Replace the notes text. Only allowed while no recording is active,
    /// since the active session's snapshot would otherwise go stale.
    pub fn set_notes_text(&mut self, notes: String) -> Result<(), ControllerError> {
        self.require(
            self.session.status() == DictationStatus::Idle,
            "edit notes",
        )?;
        self.notes = notes;
        Ok(())
    }

    /// Produce the observable state snapshot
    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            status: self.session.status(),
            elapsed_seconds: self.session.elapsed_seconds,
            transcript_interim: self.session.transcript_interim.clone(),
            notes_text: self.notes.clone(),
            captured_size: format_size(self.session.captured_bytes),
            degraded: self.degraded,
            playback: self.session.playback().map(|p| PlaybackSnapshot {
                position_seconds: p.position_seconds,
                duration_seconds: p.duration_seconds,
                is_playing: p.is_playing,
                is_preparing: p.is_preparing,
                completed: p.completed,
                progress_fraction: p.progress_fraction(),
            }),
        }
    }

    /// Begin a recording attempt.
    ///
    /// Opens the microphone first: a `PermissionDenied` or
    /// `DeviceUnavailable` failure returns before any state changes.
    /// Transcriber failure is a degraded mode, not an error: recording
    /// proceeds without live text.
    pub async fn start_recording(&mut self) -> Result<(), ControllerError> {
        self.require(
            self.session.status() == DictationStatus::Idle,
            "start recording",
        )?;

        self.capture.open(self.events.clone()).await?;
        self.capture_open = true;
        self.session.start_recording(self.notes.clone())?;

        match self
            .transcriber
            .start(self.capture.tap(), self.events.clone())
            .await
        {
            Ok(()) => self.transcriber_active = true,
            Err(_) => self.degraded = true,
        }

        self.start_ticker();
        Ok(())
    }

    /// Stop recording: finalize the artifact, release the microphone and
    /// transcription stream, and enter review.
    pub async fn stop_recording(&mut self) -> Result<(), ControllerError> {
        self.require(
            self.session.status() == DictationStatus::Recording,
            "stop recording",
        )?;

        self.stop_ticker();
        if self.transcriber_active {
            self.transcriber.stop().await;
            self.transcriber_active = false;
        }

        // stop() closes the microphone handle whether or not it succeeds
        self.capture_open = false;
        match self.capture.stop().await {
            Ok(artifact) => {
                self.session.stop_recording(artifact)?;
                self.session.begin_review()?;
                Ok(())
            }
            Err(e) => {
                // The recording is unrecoverable; fall back to cancel
                // semantics so no partial state survives.
                self.reset_session().await;
                Err(e.into())
            }
        }
    }

    /// Abandon the attempt from any active state: release every open
    /// capability, discard the artifact, and restore the notes text to the
    /// pre-recording snapshot. Calling this again once idle is a no-op.
    pub async fn cancel_recording(&mut self) -> Result<(), ControllerError> {
        if self.session.status() == DictationStatus::Idle {
            return Ok(());
        }
        self.require(self.session.status().is_cancellable(), "cancel recording")?;
        self.reset_session().await;
        Ok(())
    }

    /// Start or resume playback of the finalized recording.
    /// The player is attached lazily on first use.
    pub async fn play(&mut self) -> Result<(), ControllerError> {
        self.require(
            matches!(
                self.session.status(),
                DictationStatus::Reviewing | DictationStatus::Paused
            ),
            "play",
        )?;

        if self.session.playback().is_none() {
            let status = self.session.status();
            let artifact = self.session.artifact().cloned().ok_or_else(|| {
                InvalidTransition {
                    current_state: status,
                    action: "play".to_string(),
                }
            })?;
            // A decode failure leaves review intact: confirm and clear
            // stay available.
            self.player.load(&artifact, self.events.clone()).await?;
            self.session.attach_playback()?;
        }

        self.player.play().await?;
        self.session.begin_playback()?;
        Ok(())
    }

    /// Pause playback
    pub async fn pause(&mut self) -> Result<(), ControllerError> {
        self.require(self.session.status() == DictationStatus::Playing, "pause")?;
        self.player.pause().await?;
        self.session.pause_playback()?;
        Ok(())
    }

    /// Toggle between playing and paused
    pub async fn toggle_play_pause(&mut self) -> Result<(), ControllerError> {
        if self.session.status() == DictationStatus::Playing {
            self.pause().await
        } else {
            self.play().await
        }
    }

    /// Seek to a fraction of the total duration. The fraction is clamped
    /// to `[0, 1]`; out-of-range requests land on the nearest end.
    pub async fn seek(&mut self, fraction: f64) -> Result<(), ControllerError> {
        let status = self.session.status();
        self.require(
            matches!(status, DictationStatus::Playing | DictationStatus::Paused),
            "seek",
        )?;
        let playback = self.session.playback_mut().ok_or(InvalidTransition {
            current_state: status,
            action: "seek".to_string(),
        })?;
        let position = playback.seek_to_fraction(fraction);
        self.player.seek(position).await?;
        Ok(())
    }

    /// Play the recording again from the start. Before the player was ever
    /// attached this is identical to `play`.
    pub async fn replay(&mut self) -> Result<(), ControllerError> {
        let status = self.session.status();
        self.require(
            matches!(status, DictationStatus::Reviewing | DictationStatus::Paused),
            "replay",
        )?;

        if self.session.playback().is_none() {
            return self.play().await;
        }

        if let Some(playback) = self.session.playback_mut() {
            playback.seek_to_fraction(0.0);
        }
        self.player.seek(0.0).await?;
        self.player.play().await?;
        self.session.begin_playback()?;
        Ok(())
    }

    /// Accept the dictated notes. Playback is paused if running; the notes
    /// text, already containing every committed fragment, becomes final.
    pub async fn confirm(&mut self) -> Result<(), ControllerError> {
        self.require(self.session.status().is_reviewing(), "confirm")?;
        if self.session.status() == DictationStatus::Playing {
            self.player.pause().await?;
            self.session.pause_playback()?;
        }
        self.session.confirm()?;
        Ok(())
    }

    /// Reset after review or confirmation, releasing the player and the
    /// artifact. Unlike cancel, the notes text keeps the committed
    /// transcript.
    pub async fn clear(&mut self) -> Result<(), ControllerError> {
        self.require(
            matches!(
                self.session.status(),
                DictationStatus::Confirmed | DictationStatus::Reviewing
            ),
            "clear",
        )?;
        self.release_all().await;
        self.session = Session::new();
        self.degraded = false;
        Ok(())
    }

    /// Apply one capability notification. Stale notifications (a fragment
    /// after stop, progress after pause) are dropped, never errors.
    pub fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::CaptureChunk(chunk) => {
                self.session.add_captured_bytes(chunk.byte_len());
            }
            ControllerEvent::Transcript(TranscriptFragment { text, is_final }) => {
                if is_final {
                    if let Some(committed) = self.session.commit_final(&text) {
                        self.notes.push_str(&committed);
                    }
                } else {
                    self.session.apply_interim(&text);
                }
            }
            ControllerEvent::TranscriberDown(_) => {
                if self.session.status() == DictationStatus::Recording {
                    self.degraded = true;
                }
                self.transcriber_active = false;
            }
            ControllerEvent::Tick => self.session.tick(),
            ControllerEvent::PlayerReady { duration_seconds } => {
                if let Some(playback) = self.session.playback_mut() {
                    playback.ready(duration_seconds);
                }
            }
            ControllerEvent::PlayerProgress { position_seconds } => {
                if self.session.status() == DictationStatus::Playing {
                    if let Some(playback) = self.session.playback_mut() {
                        playback.progress(position_seconds);
                    }
                }
            }
            ControllerEvent::PlayerEnded => {
                let _ = self.session.playback_ended();
            }
        }
    }

    fn require(&self, allowed: bool, action: &str) -> Result<(), ControllerError> {
        if allowed {
            Ok(())
        } else {
            Err(InvalidTransition {
                current_state: self.session.status(),
                action: action.to_string(),
            }
            .into())
        }
    }

    /// Release every open capability and stop the timer.
    /// Safe from any state; releasing something not open is a no-op.
    async fn release_all(&mut self) {
        self.stop_ticker();
        if self.transcriber_active {
            self.transcriber.stop().await;
            self.transcriber_active = false;
        }
        if self.capture_open {
            self.capture.release().await;
            self.capture_open = false;
        }
        if self.session.playback().is_some() {
            self.player.release().await;
        }
    }

    /// Tear down the session and restore the notes snapshot
    async fn reset_session(&mut self) {
        self.release_all().await;
        self.notes = std::mem::take(&mut self.session.notes_snapshot);
        self.session = Session::new();
        self.degraded = false;
    }

    /// Start the elapsed-seconds timer. A stale timer must never survive
    /// into a new one, so any running ticker is cancelled first.
    fn start_ticker(&mut self) {
        self.stop_ticker();
        let events = self.events.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // the first tick fires immediately; skip it
            interval.tick().await;
            loop {
                interval.tick().await;
                if events.send(ControllerEvent::Tick).await.is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl<C, T, P> Drop for DictationController<C, T, P>
where
    C: Capture,
    T: Transcriber,
    P: Player,
{
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
