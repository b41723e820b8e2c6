//! Rodio-based playback adapter
//!
//! Decodes the finalized artifact once, up front, and serves transport
//! commands from a dedicated thread: `rodio::OutputStream` is not Send,
//! so the sink lives on that thread and commands reach it over a channel
//! (the same constraint the capture stream has).
//!
//! Position is tracked with a simple transport clock (a base position
//! plus wall time while playing). Seeking rebuilds the sink's queue
//! from the target sample offset, which keeps the arithmetic exact and
//! independent of the decoder's own seek support.

use std::io::Cursor;
use std::sync::mpsc as std_mpsc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink, Source};
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::application::events::ControllerEvent;
use crate::application::ports::{Player, PlayerError};
use crate::domain::audio::AudioArtifact;

/// How often progress notifications are emitted while playing
const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

enum PlayerCmd {
    Play,
    Pause,
    Seek(f64),
    Release,
}

/// Playback adapter using rodio
pub struct RodioPlayer {
    commands: Mutex<Option<std_mpsc::Sender<PlayerCmd>>>,
}

impl RodioPlayer {
    /// Create a new rodio-based player
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(None),
        }
    }

    async fn send(&self, cmd: PlayerCmd) -> Result<(), PlayerError> {
        let commands = self.commands.lock().await;
        match commands.as_ref() {
            Some(tx) => tx
                .send(cmd)
                .map_err(|_| PlayerError::PlaybackFailed("Player thread gone".to_string())),
            None => Err(PlayerError::PlaybackFailed(
                "No audio loaded".to_string(),
            )),
        }
    }
}

impl Default for RodioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Player for RodioPlayer {
    async fn load(
        &self,
        artifact: &AudioArtifact,
        events: mpsc::Sender<ControllerEvent>,
    ) -> Result<(), PlayerError> {
        let mut commands = self.commands.lock().await;
        if commands.is_some() {
            return Err(PlayerError::PlaybackFailed(
                "Audio already loaded".to_string(),
            ));
        }

        let bytes = artifact.data().to_vec();
        let (cmd_tx, cmd_rx) = std_mpsc::channel();
        let (loaded_tx, loaded_rx) = oneshot::channel();

        std::thread::spawn(move || run_transport(bytes, events, cmd_rx, loaded_tx));

        match loaded_rx.await {
            Ok(Ok(())) => {
                *commands = Some(cmd_tx);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PlayerError::PlaybackFailed(
                "Player thread died during load".to_string(),
            )),
        }
    }

    async fn play(&self) -> Result<(), PlayerError> {
        self.send(PlayerCmd::Play).await
    }

    async fn pause(&self) -> Result<(), PlayerError> {
        self.send(PlayerCmd::Pause).await
    }

    async fn seek(&self, position_seconds: f64) -> Result<(), PlayerError> {
        self.send(PlayerCmd::Seek(position_seconds)).await
    }

    async fn release(&self) {
        let mut commands = self.commands.lock().await;
        if let Some(tx) = commands.take() {
            let _ = tx.send(PlayerCmd::Release);
        }
    }
}

/// Decoded audio plus the transport clock
struct Transport {
    sink: Sink,
    samples: Vec<i16>,
    channels: u16,
    sample_rate: u32,
    duration: f64,
    /// Position at the last play/pause/seek boundary
    base_position: f64,
    /// Set while playing
    started_at: Option<Instant>,
}

impl Transport {
    fn position(&self) -> f64 {
        let elapsed = self
            .started_at
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.base_position + elapsed).min(self.duration)
    }

    fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }

    /// Refill the sink's queue starting at `position` seconds
    fn queue_from(&mut self, position: f64) {
        let position = position.clamp(0.0, self.duration);
        let frame = (position * self.sample_rate as f64) as usize;
        let offset = (frame * self.channels as usize).min(self.samples.len());

        self.sink.stop();
        self.sink.pause();
        if offset < self.samples.len() {
            self.sink.append(SamplesBuffer::new(
                self.channels,
                self.sample_rate,
                self.samples[offset..].to_vec(),
            ));
        }
        self.base_position = position;
        self.started_at = None;
    }

    fn play(&mut self) {
        if self.started_at.is_none() {
            // Past the end, a play request restarts silence-free from the
            // tail; the controller handles replay-from-zero itself.
            if self.sink.empty() {
                self.queue_from(self.position());
            }
            self.sink.play();
            self.started_at = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.base_position = self.position();
        self.started_at = None;
        self.sink.pause();
    }
}

/// Thread body: decode, report readiness, serve transport commands, and
/// emit progress/ended notifications while playing.
fn run_transport(
    bytes: Vec<u8>,
    events: mpsc::Sender<ControllerEvent>,
    commands: std_mpsc::Receiver<PlayerCmd>,
    loaded: oneshot::Sender<Result<(), PlayerError>>,
) {
    let (mut transport, _stream) = match build_transport(bytes) {
        Ok(ok) => ok,
        Err(e) => {
            let _ = loaded.send(Err(e));
            return;
        }
    };

    let duration = transport.duration;
    let _ = loaded.send(Ok(()));
    let _ = events.blocking_send(ControllerEvent::PlayerReady {
        duration_seconds: duration,
    });

    loop {
        match commands.recv_timeout(PROGRESS_INTERVAL) {
            Ok(PlayerCmd::Play) => transport.play(),
            Ok(PlayerCmd::Pause) => transport.pause(),
            Ok(PlayerCmd::Seek(position)) => {
                let was_playing = transport.is_playing();
                transport.queue_from(position);
                if was_playing {
                    transport.play();
                }
            }
            Ok(PlayerCmd::Release) | Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
            Err(std_mpsc::RecvTimeoutError::Timeout) => {
                if !transport.is_playing() {
                    continue;
                }
                if transport.sink.empty() {
                    transport.base_position = duration;
                    transport.started_at = None;
                    let _ = events.blocking_send(ControllerEvent::PlayerEnded);
                } else {
                    // Bounded-rate progress: one notification per poll,
                    // never per sample
                    let _ = events.try_send(ControllerEvent::PlayerProgress {
                        position_seconds: transport.position(),
                    });
                }
            }
        }
    }
}

/// Decode the artifact bytes and prepare a paused sink
fn build_transport(bytes: Vec<u8>) -> Result<(Transport, OutputStream), PlayerError> {
    let decoder = rodio::Decoder::new(Cursor::new(bytes))
        .map_err(|e| PlayerError::DecodeFailed(e.to_string()))?;

    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<i16> = decoder.collect();

    if sample_rate == 0 || channels == 0 || samples.is_empty() {
        return Err(PlayerError::DecodeFailed("Empty audio stream".to_string()));
    }

    let duration = samples.len() as f64 / (sample_rate as f64 * channels as f64);

    let (stream, stream_handle) = OutputStream::try_default()
        .map_err(|e| PlayerError::DeviceUnavailable(e.to_string()))?;
    let sink =
        Sink::try_new(&stream_handle).map_err(|e| PlayerError::PlaybackFailed(e.to_string()))?;

    sink.pause();
    sink.append(SamplesBuffer::new(channels, sample_rate, samples.clone()));

    Ok((
        Transport {
            sink,
            samples,
            channels,
            sample_rate,
            duration,
            base_position: 0.0,
            started_at: None,
        },
        stream,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::AudioMimeType;

    #[tokio::test]
    async fn commands_before_load_fail() {
        let player = RodioPlayer::new();
        assert!(player.play().await.is_err());
        assert!(player.pause().await.is_err());
        assert!(player.seek(1.0).await.is_err());
    }

    #[tokio::test]
    async fn release_before_load_is_noop() {
        let player = RodioPlayer::new();
        player.release().await;
    }

    #[tokio::test]
    async fn load_rejects_undecodable_bytes() {
        let player = RodioPlayer::new();
        let artifact = AudioArtifact::new(vec![0u8; 16], AudioMimeType::Flac);
        let (events_tx, _events_rx) = mpsc::channel(4);

        let err = player.load(&artifact, events_tx).await.unwrap_err();
        assert!(matches!(err, PlayerError::DecodeFailed(_)));
    }
}
