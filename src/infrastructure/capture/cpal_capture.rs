//! Cross-platform microphone capture using cpal
//!
//! The stream runs on a dedicated thread because `cpal::Stream` is not
//! Send. While open, every callback buffer is mixed down to mono and
//! fanned out three ways: into the internal buffer the artifact is
//! finalized from, onto the broadcast tap the transcriber consumes, and
//! as a chunk notification to the controller.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Duration as TokioDuration;

use super::flac_encoder::{encode_to_flac, mix_to_mono, resample_to_16k, TARGET_SAMPLE_RATE};
use crate::application::events::ControllerEvent;
use crate::application::ports::{AudioTap, Capture, CaptureError};
use crate::domain::audio::{AudioArtifact, AudioChunk, AudioMimeType, AudioSpec};

/// Capacity of the transcriber tap; laggards drop old chunks rather
/// than stall the audio thread.
const TAP_CAPACITY: usize = 256;

/// Microphone capture adapter using cpal
pub struct CpalCapture {
    /// Recorded audio samples (mono, i16, at device sample rate)
    audio_buffer: Arc<StdMutex<Vec<i16>>>,
    /// Device sample rate (may differ from the 16kHz target)
    device_sample_rate: Arc<AtomicU32>,
    /// Whether the microphone is currently open
    is_open: Arc<AtomicBool>,
    /// Failure reported by the stream thread during open
    open_error: Arc<StdMutex<Option<CaptureError>>>,
    tap_tx: broadcast::Sender<AudioChunk>,
}

impl CpalCapture {
    /// Create a new cpal-based capture
    pub fn new() -> Self {
        let (tap_tx, _) = broadcast::channel(TAP_CAPACITY);
        Self {
            audio_buffer: Arc::new(StdMutex::new(Vec::new())),
            device_sample_rate: Arc::new(AtomicU32::new(0)),
            is_open: Arc::new(AtomicBool::new(false)),
            open_error: Arc::new(StdMutex::new(None)),
            tap_tx,
        }
    }

    /// Get the default input device
    fn get_input_device() -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        host.default_input_device()
            .ok_or(CaptureError::DeviceUnavailable)
    }

    /// Get a suitable input configuration
    fn get_input_config(
        device: &cpal::Device,
    ) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| map_device_error(&e.to_string()))?;

        // Prefer mono configs that include the 16kHz target rate
        let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;

        for config in supported_configs {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let includes_target = config.min_sample_rate().0 <= TARGET_SAMPLE_RATE
                && config.max_sample_rate().0 >= TARGET_SAMPLE_RATE;

            let is_better = match &best_config {
                None => true,
                Some(current) => {
                    let fewer_channels = config.channels() < current.channels();
                    let better_rate =
                        includes_target && current.min_sample_rate().0 > TARGET_SAMPLE_RATE;
                    fewer_channels || better_rate
                }
            };
            if is_better {
                best_config = Some(config);
            }
        }

        let config_range = best_config
            .ok_or_else(|| CaptureError::StartFailed("No suitable config found".into()))?;

        let sample_rate = if config_range.min_sample_rate().0 <= TARGET_SAMPLE_RATE
            && config_range.max_sample_rate().0 >= TARGET_SAMPLE_RATE
        {
            SampleRate(TARGET_SAMPLE_RATE)
        } else {
            config_range.min_sample_rate()
        };

        let sample_format = config_range.sample_format();
        let config = StreamConfig {
            channels: config_range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, sample_format))
    }

}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify a device error message into the capture error kinds
fn map_device_error(message: &str) -> CaptureError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("access denied") {
        CaptureError::PermissionDenied
    } else {
        CaptureError::StartFailed(message.to_string())
    }
}

/// Fan one callback buffer out to the artifact buffer, the tap, and
/// the controller.
fn deliver_chunk(
    mono: Vec<i16>,
    sample_rate: u32,
    buffer: &Arc<StdMutex<Vec<i16>>>,
    tap_tx: &broadcast::Sender<AudioChunk>,
    events: &mpsc::Sender<ControllerEvent>,
) {
    if let Ok(mut buffer) = buffer.lock() {
        buffer.extend_from_slice(&mono);
    }
    let chunk = AudioChunk::new(mono, sample_rate);
    let _ = tap_tx.send(chunk.clone());
    // Never block the audio thread; a full queue just drops the
    // notification, the buffered samples are already safe.
    let _ = events.try_send(ControllerEvent::CaptureChunk(chunk));
}

#[async_trait]
impl Capture for CpalCapture {
    async fn open(&self, events: mpsc::Sender<ControllerEvent>) -> Result<(), CaptureError> {
        if self.is_open.load(Ordering::SeqCst) {
            return Err(CaptureError::StartFailed(
                "Capture already in progress".to_string(),
            ));
        }

        {
            let mut buffer = self
                .audio_buffer
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            buffer.clear();
        }
        if let Ok(mut slot) = self.open_error.lock() {
            *slot = None;
        }
        self.is_open.store(true, Ordering::SeqCst);

        let audio_buffer = Arc::clone(&self.audio_buffer);
        let device_sample_rate = Arc::clone(&self.device_sample_rate);
        let is_open = Arc::clone(&self.is_open);
        let open_error = Arc::clone(&self.open_error);
        let tap_tx = self.tap_tx.clone();

        let this = CaptureThread {
            audio_buffer,
            device_sample_rate,
            is_open: Arc::clone(&is_open),
            open_error,
            tap_tx,
            events,
        };

        // cpal::Stream is not Send; keep it on its own thread for the
        // whole capture lifetime.
        std::thread::spawn(move || this.run());

        // Give the thread a moment to acquire the device
        tokio::time::sleep(TokioDuration::from_millis(75)).await;

        if !self.is_open.load(Ordering::SeqCst) {
            let err = self
                .open_error
                .lock()
                .ok()
                .and_then(|mut slot| slot.take())
                .unwrap_or_else(|| CaptureError::StartFailed("Failed to open microphone".into()));
            return Err(err);
        }

        Ok(())
    }

    fn tap(&self) -> AudioTap {
        self.tap_tx.subscribe()
    }

    fn spec(&self) -> AudioSpec {
        let rate = self.device_sample_rate.load(Ordering::SeqCst);
        AudioSpec {
            sample_rate: if rate == 0 { TARGET_SAMPLE_RATE } else { rate },
            channels: 1,
        }
    }

    async fn stop(&self) -> Result<AudioArtifact, CaptureError> {
        // Close the microphone handle first; encoding failures must not
        // leave it open.
        self.is_open.store(false, Ordering::SeqCst);
        tokio::time::sleep(TokioDuration::from_millis(100)).await;

        let sample_rate = self.device_sample_rate.load(Ordering::SeqCst);
        if sample_rate == 0 {
            return Err(CaptureError::CaptureFailed("Sample rate not set".into()));
        }

        let samples = {
            let mut buffer = self
                .audio_buffer
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *buffer)
        };

        if samples.is_empty() {
            return Err(CaptureError::CaptureFailed(
                "No audio data captured".to_string(),
            ));
        }

        let flac = tokio::task::spawn_blocking(move || {
            let resampled = resample_to_16k(&samples, sample_rate)
                .map_err(|e| CaptureError::EncodeFailed(e.to_string()))?;
            encode_to_flac(&resampled).map_err(|e| CaptureError::EncodeFailed(e.to_string()))
        })
        .await
        .map_err(|e| CaptureError::CaptureFailed(format!("Encode task error: {}", e)))??;

        Ok(AudioArtifact::new(flac, AudioMimeType::Flac))
    }

    async fn release(&self) {
        if !self.is_open.swap(false, Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(TokioDuration::from_millis(100)).await;
        let mut buffer = self
            .audio_buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        buffer.clear();
    }
}

/// State moved onto the capture thread
struct CaptureThread {
    audio_buffer: Arc<StdMutex<Vec<i16>>>,
    device_sample_rate: Arc<AtomicU32>,
    is_open: Arc<AtomicBool>,
    open_error: Arc<StdMutex<Option<CaptureError>>>,
    tap_tx: broadcast::Sender<AudioChunk>,
    events: mpsc::Sender<ControllerEvent>,
}

impl CaptureThread {
    fn fail(&self, err: CaptureError) {
        if let Ok(mut slot) = self.open_error.lock() {
            *slot = Some(err);
        }
        self.is_open.store(false, Ordering::SeqCst);
    }

    fn run(self) {
        let device = match CpalCapture::get_input_device() {
            Ok(d) => d,
            Err(e) => return self.fail(e),
        };

        let (config, sample_format) = match CpalCapture::get_input_config(&device) {
            Ok(c) => c,
            Err(e) => return self.fail(e),
        };

        let sample_rate = config.sample_rate.0;
        let channels = config.channels;
        self.device_sample_rate.store(sample_rate, Ordering::SeqCst);

        let buffer = Arc::clone(&self.audio_buffer);
        let is_open = Arc::clone(&self.is_open);
        let tap_tx = self.tap_tx.clone();
        let events = self.events.clone();

        let stream_result = match sample_format {
            SampleFormat::I16 => {
                let buffer = Arc::clone(&buffer);
                let is_open = Arc::clone(&is_open);
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        if is_open.load(Ordering::SeqCst) {
                            let mono = mix_to_mono(data, channels);
                            deliver_chunk(mono, sample_rate, &buffer, &tap_tx, &events);
                        }
                    },
                    |err| eprintln!("Audio stream error: {}", err),
                    None,
                )
            }

            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if is_open.load(Ordering::SeqCst) {
                        let i16_data: Vec<i16> =
                            data.iter().map(|&s| (s * 32767.0) as i16).collect();
                        let mono = mix_to_mono(&i16_data, channels);
                        deliver_chunk(mono, sample_rate, &buffer, &tap_tx, &events);
                    }
                },
                |err| eprintln!("Audio stream error: {}", err),
                None,
            ),

            _ => {
                return self.fail(CaptureError::StartFailed(
                    "Unsupported sample format".into(),
                ))
            }
        };

        let stream = match stream_result {
            Ok(s) => s,
            Err(e) => return self.fail(map_device_error(&e.to_string())),
        };

        if let Err(e) = stream.play() {
            return self.fail(map_device_error(&e.to_string()));
        }

        // Keep the stream alive until the capture is closed
        while self.is_open.load(Ordering::SeqCst) {
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        drop(stream);
    }
}
