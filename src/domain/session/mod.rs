//! Dictation session state machine
//!
//! One [`Session`] covers a single record-through-review-through-confirm
//! attempt and owns all per-attempt state: elapsed time, transcript text,
//! the finalized audio artifact, and playback transport state.
//!
//! State machine:
//!   IDLE -> RECORDING (start_recording)
//!   RECORDING -> STOPPED -> REVIEWING (stop_recording / begin_review)
//!   REVIEWING <-> PLAYING <-> PAUSED (begin_playback / pause_playback)
//!   REVIEWING | PLAYING | PAUSED -> CONFIRMED (confirm)
//!
//! Cancel and clear are modelled by dropping the session and starting a
//! fresh one; the owning controller enforces their preconditions.

use std::fmt;
use thiserror::Error;

use crate::domain::audio::AudioArtifact;

/// Dictation states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DictationStatus {
    #[default]
    Idle,
    Recording,
    Stopped,
    Reviewing,
    Playing,
    Paused,
    Confirmed,
}

impl DictationStatus {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopped => "stopped",
            Self::Reviewing => "reviewing",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Confirmed => "confirmed",
        }
    }

    /// Check if the recording is finalized and under review.
    /// The audio artifact exists exactly in these states (plus `Confirmed`).
    pub const fn is_reviewing(&self) -> bool {
        matches!(self, Self::Reviewing | Self::Playing | Self::Paused)
    }

    /// Check if a cancel is meaningful from this state
    pub const fn is_cancellable(&self) -> bool {
        matches!(
            self,
            Self::Recording | Self::Stopped | Self::Reviewing | Self::Playing | Self::Paused
        )
    }
}

impl fmt::Display for DictationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidTransition {
    pub current_state: DictationStatus,
    pub action: String,
}

impl InvalidTransition {
    fn new(current_state: DictationStatus, action: &str) -> Self {
        Self {
            current_state,
            action: action.to_string(),
        }
    }
}

/// Playback transport state, present once a player has been attached
/// to the finalized artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    /// Current position in seconds, always within `[0, duration_seconds]`
    pub position_seconds: f64,
    /// Total duration in seconds; 0 until the player reports readiness
    pub duration_seconds: f64,
    /// Whether playback is currently running
    pub is_playing: bool,
    /// True between the load request and the readiness notification
    pub is_preparing: bool,
    /// True once the end-of-audio notification fired; cleared by seek/replay
    pub completed: bool,
}

impl PlaybackState {
    /// Create playback state for a player that has just been asked to load
    pub fn preparing() -> Self {
        Self {
            is_preparing: true,
            ..Self::default()
        }
    }

    /// Apply the readiness notification
    pub fn ready(&mut self, duration_seconds: f64) {
        self.duration_seconds = duration_seconds.max(0.0);
        self.is_preparing = false;
    }

    /// Apply a progress notification, clamping into `[0, duration]`
    pub fn progress(&mut self, position_seconds: f64) {
        self.position_seconds = position_seconds.clamp(0.0, self.duration_seconds);
    }

    /// Apply the end-of-audio notification
    pub fn ended(&mut self) {
        self.completed = true;
        self.is_playing = false;
        self.position_seconds = self.duration_seconds;
    }

    /// Resolve a seek fraction to an absolute position.
    /// The fraction is clamped to `[0, 1]`; a seek always clears `completed`.
    pub fn seek_to_fraction(&mut self, fraction: f64) -> f64 {
        let fraction = fraction.clamp(0.0, 1.0);
        self.position_seconds = fraction * self.duration_seconds;
        self.completed = false;
        self.position_seconds
    }

    /// Playback progress as a fraction in `[0, 1]`
    pub fn progress_fraction(&self) -> f64 {
        if self.duration_seconds > 0.0 {
            self.position_seconds / self.duration_seconds
        } else {
            0.0
        }
    }
}

/// One dictation attempt: recording, live transcription, and review.
///
/// The session is the unit of ownership for everything produced during an
/// attempt. Dropping it releases the artifact and playback state; the
/// controller releases the capability handles.
#[derive(Debug, Default)]
pub struct Session {
    status: DictationStatus,
    /// Whole seconds elapsed while recording
    pub elapsed_seconds: u64,
    /// Transcript text committed so far (final fragments only)
    pub transcript_accumulated: String,
    /// Latest unconfirmed fragment, replaced wholesale on each update
    pub transcript_interim: String,
    /// Raw bytes seen from the capture stream, for display only
    pub captured_bytes: u64,
    /// Notes text as it stood before recording started, for cancel restore
    pub notes_snapshot: String,
    artifact: Option<AudioArtifact>,
    playback: Option<PlaybackState>,
}

impl Session {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current status
    pub fn status(&self) -> DictationStatus {
        self.status
    }

    /// Get the finalized artifact, if recording has stopped
    pub fn artifact(&self) -> Option<&AudioArtifact> {
        self.artifact.as_ref()
    }

    /// Get the playback state, if a player has been attached
    pub fn playback(&self) -> Option<&PlaybackState> {
        self.playback.as_ref()
    }

    /// Get the playback state mutably, if a player has been attached
    pub fn playback_mut(&mut self) -> Option<&mut PlaybackState> {
        self.playback.as_mut()
    }

    /// Transition from IDLE to RECORDING, snapshotting the notes text
    /// for a later cancel restore.
    pub fn start_recording(&mut self, notes_snapshot: String) -> Result<(), InvalidTransition> {
        if self.status != DictationStatus::Idle {
            return Err(InvalidTransition::new(self.status, "start recording"));
        }
        self.notes_snapshot = notes_snapshot;
        self.status = DictationStatus::Recording;
        Ok(())
    }

    /// Transition from RECORDING to STOPPED, taking ownership of the
    /// finalized artifact.
    pub fn stop_recording(&mut self, artifact: AudioArtifact) -> Result<(), InvalidTransition> {
        if self.status != DictationStatus::Recording {
            return Err(InvalidTransition::new(self.status, "stop recording"));
        }
        self.artifact = Some(artifact);
        self.transcript_interim.clear();
        self.status = DictationStatus::Stopped;
        Ok(())
    }

    /// Transition from STOPPED to REVIEWING
    pub fn begin_review(&mut self) -> Result<(), InvalidTransition> {
        if self.status != DictationStatus::Stopped {
            return Err(InvalidTransition::new(self.status, "begin review"));
        }
        self.status = DictationStatus::Reviewing;
        Ok(())
    }

    /// Attach playback state for a freshly loaded player.
    /// The player may be attached at most once per session.
    pub fn attach_playback(&mut self) -> Result<(), InvalidTransition> {
        if self.artifact.is_none() || self.playback.is_some() {
            return Err(InvalidTransition::new(self.status, "attach player"));
        }
        self.playback = Some(PlaybackState::preparing());
        Ok(())
    }

    /// Transition from REVIEWING or PAUSED to PLAYING
    pub fn begin_playback(&mut self) -> Result<(), InvalidTransition> {
        if !matches!(
            self.status,
            DictationStatus::Reviewing | DictationStatus::Paused
        ) {
            return Err(InvalidTransition::new(self.status, "play"));
        }
        let playback = self
            .playback
            .as_mut()
            .ok_or_else(|| InvalidTransition::new(self.status, "play"))?;
        playback.is_playing = true;
        self.status = DictationStatus::Playing;
        Ok(())
    }

    /// Transition from PLAYING to PAUSED
    pub fn pause_playback(&mut self) -> Result<(), InvalidTransition> {
        if self.status != DictationStatus::Playing {
            return Err(InvalidTransition::new(self.status, "pause"));
        }
        if let Some(playback) = self.playback.as_mut() {
            playback.is_playing = false;
        }
        self.status = DictationStatus::Paused;
        Ok(())
    }

    /// Apply the player's end-of-audio notification; lands in PAUSED.
    pub fn playback_ended(&mut self) -> Result<(), InvalidTransition> {
        if self.status != DictationStatus::Playing {
            return Err(InvalidTransition::new(self.status, "finish playback"));
        }
        if let Some(playback) = self.playback.as_mut() {
            playback.ended();
        }
        self.status = DictationStatus::Paused;
        Ok(())
    }

    /// Transition to CONFIRMED; no further transcript or audio mutation
    /// is permitted afterwards.
    pub fn confirm(&mut self) -> Result<(), InvalidTransition> {
        if !self.status.is_reviewing() {
            return Err(InvalidTransition::new(self.status, "confirm"));
        }
        if let Some(playback) = self.playback.as_mut() {
            playback.is_playing = false;
        }
        self.status = DictationStatus::Confirmed;
        Ok(())
    }

    /// Replace the interim transcript with the latest hypothesis.
    /// Interim text is replaced, never appended: the transcriber re-sends a
    /// growing hypothesis for the same utterance until it finalizes.
    pub fn apply_interim(&mut self, text: &str) {
        if self.status == DictationStatus::Recording {
            self.transcript_interim.clear();
            self.transcript_interim.push_str(text);
        }
    }

    /// Commit a final fragment: append it plus a single trailing space to the
    /// accumulated transcript and clear the interim text. Returns the exact
    /// text appended so the caller can mirror it into the notes buffer.
    /// Fragments arriving outside RECORDING are dropped.
    pub fn commit_final(&mut self, text: &str) -> Option<String> {
        if self.status != DictationStatus::Recording {
            return None;
        }
        let committed = format!("{} ", text);
        self.transcript_accumulated.push_str(&committed);
        self.transcript_interim.clear();
        Some(committed)
    }

    /// Advance the recording timer by one second
    pub fn tick(&mut self) {
        if self.status == DictationStatus::Recording {
            self.elapsed_seconds += 1;
        }
    }

    /// Account for a capture chunk
    pub fn add_captured_bytes(&mut self, bytes: u64) {
        if self.status == DictationStatus::Recording {
            self.captured_bytes += bytes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::{AudioArtifact, AudioMimeType};

    fn artifact() -> AudioArtifact {
        AudioArtifact::new(vec![0u8; 64], AudioMimeType::Flac)
    }

    fn recording_session() -> Session {
        let mut session = Session::new();
        session.start_recording(String::new()).unwrap();
        session
    }

    fn reviewing_session() -> Session {
        let mut session = recording_session();
        session.stop_recording(artifact()).unwrap();
        session.begin_review().unwrap();
        session
    }

    #[test]
    fn new_session_is_idle() {
        let session = Session::new();
        assert_eq!(session.status(), DictationStatus::Idle);
        assert!(session.artifact().is_none());
        assert!(session.playback().is_none());
    }

    #[test]
    fn start_recording_snapshots_notes() {
        let mut session = Session::new();
        session.start_recording("existing notes".to_string()).unwrap();
        assert_eq!(session.status(), DictationStatus::Recording);
        assert_eq!(session.notes_snapshot, "existing notes");
    }

    #[test]
    fn start_recording_twice_fails() {
        let mut session = recording_session();
        let err = session.start_recording(String::new()).unwrap_err();
        assert_eq!(err.current_state, DictationStatus::Recording);
        assert!(err.action.contains("start recording"));
    }

    #[test]
    fn stop_recording_holds_artifact() {
        let mut session = recording_session();
        session.stop_recording(artifact()).unwrap();
        assert_eq!(session.status(), DictationStatus::Stopped);
        assert!(session.artifact().is_some());
    }

    #[test]
    fn stop_recording_from_idle_fails() {
        let mut session = Session::new();
        let err = session.stop_recording(artifact()).unwrap_err();
        assert_eq!(err.current_state, DictationStatus::Idle);
    }

    #[test]
    fn stop_recording_clears_interim() {
        let mut session = recording_session();
        session.apply_interim("half an utter");
        session.stop_recording(artifact()).unwrap();
        assert!(session.transcript_interim.is_empty());
    }

    #[test]
    fn artifact_exists_only_after_stop() {
        let session = recording_session();
        assert!(session.artifact().is_none());

        let session = reviewing_session();
        assert!(session.artifact().is_some());
    }

    #[test]
    fn interim_is_replaced_not_appended() {
        let mut session = recording_session();
        session.apply_interim("hel");
        session.apply_interim("hello wor");
        assert_eq!(session.transcript_interim, "hello wor");
        assert!(session.transcript_accumulated.is_empty());
    }

    #[test]
    fn final_fragment_appends_with_trailing_space() {
        let mut session = recording_session();
        session.apply_interim("hello wor");
        let committed = session.commit_final("hello world.").unwrap();
        assert_eq!(committed, "hello world. ");
        assert_eq!(session.transcript_accumulated, "hello world. ");
        assert!(session.transcript_interim.is_empty());
    }

    #[test]
    fn final_fragments_accumulate_in_order() {
        let mut session = recording_session();
        session.commit_final("A").unwrap();
        session.commit_final("B").unwrap();
        session.commit_final("C").unwrap();
        assert_eq!(session.transcript_accumulated, "A B C ");
    }

    // The trailing space is unconditional, so fragments already ending in
    // whitespace produce double spaces. Deliberate: matches the upstream
    // transcription stream's commit behavior.
    #[test]
    fn trailing_space_is_unconditional() {
        let mut session = recording_session();
        session.commit_final("one ").unwrap();
        session.commit_final("two.").unwrap();
        assert_eq!(session.transcript_accumulated, "one  two. ");
    }

    #[test]
    fn fragments_after_stop_are_dropped() {
        let mut session = reviewing_session();
        assert!(session.commit_final("late").is_none());
        session.apply_interim("late interim");
        assert!(session.transcript_accumulated.is_empty());
        assert!(session.transcript_interim.is_empty());
    }

    #[test]
    fn tick_only_counts_while_recording() {
        let mut session = Session::new();
        session.tick();
        assert_eq!(session.elapsed_seconds, 0);

        session.start_recording(String::new()).unwrap();
        session.tick();
        session.tick();
        assert_eq!(session.elapsed_seconds, 2);

        session.stop_recording(artifact()).unwrap();
        session.tick();
        assert_eq!(session.elapsed_seconds, 2);
    }

    #[test]
    fn playback_requires_artifact() {
        let mut session = recording_session();
        assert!(session.attach_playback().is_err());
    }

    #[test]
    fn playback_attaches_once() {
        let mut session = reviewing_session();
        session.attach_playback().unwrap();
        assert!(session.playback().unwrap().is_preparing);
        assert!(session.attach_playback().is_err());
    }

    #[test]
    fn play_pause_cycle() {
        let mut session = reviewing_session();
        session.attach_playback().unwrap();
        session.begin_playback().unwrap();
        assert_eq!(session.status(), DictationStatus::Playing);
        assert!(session.playback().unwrap().is_playing);

        session.pause_playback().unwrap();
        assert_eq!(session.status(), DictationStatus::Paused);
        assert!(!session.playback().unwrap().is_playing);

        session.begin_playback().unwrap();
        assert_eq!(session.status(), DictationStatus::Playing);
    }

    #[test]
    fn play_without_player_fails() {
        let mut session = reviewing_session();
        assert!(session.begin_playback().is_err());
    }

    #[test]
    fn ended_lands_in_paused_with_completed() {
        let mut session = reviewing_session();
        session.attach_playback().unwrap();
        session.playback_mut().unwrap().ready(12.0);
        session.begin_playback().unwrap();
        session.playback_ended().unwrap();

        assert_eq!(session.status(), DictationStatus::Paused);
        let playback = session.playback().unwrap();
        assert!(playback.completed);
        assert!(!playback.is_playing);
        assert_eq!(playback.position_seconds, 12.0);
    }

    #[test]
    fn confirm_from_review_states() {
        for setup in [false, true] {
            let mut session = reviewing_session();
            if setup {
                session.attach_playback().unwrap();
                session.begin_playback().unwrap();
            }
            session.confirm().unwrap();
            assert_eq!(session.status(), DictationStatus::Confirmed);
        }
    }

    #[test]
    fn confirm_while_recording_fails() {
        let mut session = recording_session();
        let err = session.confirm().unwrap_err();
        assert_eq!(err.current_state, DictationStatus::Recording);
    }

    #[test]
    fn confirm_stops_playback_flag() {
        let mut session = reviewing_session();
        session.attach_playback().unwrap();
        session.begin_playback().unwrap();
        session.confirm().unwrap();
        assert!(!session.playback().unwrap().is_playing);
    }

    // ---- PlaybackState ---

    #[test]
    fn ready_sets_duration_and_clears_preparing() {
        let mut playback = PlaybackState::preparing();
        assert!(playback.is_preparing);
        playback.ready(12.0);
        assert!(!playback.is_preparing);
        assert_eq!(playback.duration_seconds, 12.0);
    }

    #[test]
    fn progress_is_clamped_to_duration() {
        let mut playback = PlaybackState::preparing();
        playback.ready(10.0);
        playback.progress(4.5);
        assert_eq!(playback.position_seconds, 4.5);
        playback.progress(99.0);
        assert_eq!(playback.position_seconds, 10.0);
        playback.progress(-3.0);
        assert_eq!(playback.position_seconds, 0.0);
    }

    #[test]
    fn seek_clamps_fraction() {
        let mut playback = PlaybackState::preparing();
        playback.ready(10.0);

        assert_eq!(playback.seek_to_fraction(0.5), 5.0);
        assert_eq!(playback.seek_to_fraction(2.0), 10.0);
        assert_eq!(playback.seek_to_fraction(-1.0), 0.0);
    }

    #[test]
    fn seek_clears_completed() {
        let mut playback = PlaybackState::preparing();
        playback.ready(10.0);
        playback.ended();
        assert!(playback.completed);

        playback.seek_to_fraction(0.25);
        assert!(!playback.completed);
        assert_eq!(playback.position_seconds, 2.5);
    }

    #[test]
    fn progress_fraction_handles_unknown_duration() {
        let playback = PlaybackState::preparing();
        assert_eq!(playback.progress_fraction(), 0.0);

        let mut playback = PlaybackState::preparing();
        playback.ready(8.0);
        playback.progress(2.0);
        assert_eq!(playback.progress_fraction(), 0.25);
    }

    #[test]
    fn status_display() {
        assert_eq!(DictationStatus::Idle.to_string(), "idle");
        assert_eq!(DictationStatus::Recording.to_string(), "recording");
        assert_eq!(DictationStatus::Reviewing.to_string(), "reviewing");
        assert_eq!(DictationStatus::Confirmed.to_string(), "confirmed");
    }

    #[test]
    fn cancellable_states() {
        assert!(!DictationStatus::Idle.is_cancellable());
        assert!(DictationStatus::Recording.is_cancellable());
        assert!(DictationStatus::Stopped.is_cancellable());
        assert!(DictationStatus::Playing.is_cancellable());
        assert!(DictationStatus::Paused.is_cancellable());
        assert!(!DictationStatus::Confirmed.is_cancellable());
    }
}
