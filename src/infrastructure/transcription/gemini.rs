//! Gemini API live transcriber adapter
//!
//! Gemini exposes no streaming speech endpoint, so live behavior is built
//! by windowing the capture tap: the current utterance window is
//! re-transcribed on an interval and emitted as a replacement interim
//! hypothesis each pass; the window is committed as a final fragment when
//! it reaches the utterance limit or the stream stops.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::application::events::{ControllerEvent, TranscriptFragment};
use crate::application::ports::{AudioTap, Transcriber, TranscriberError};
use crate::domain::audio::AudioMimeType;
use crate::infrastructure::capture::flac_encoder::{
    encode_to_flac, resample_to_16k, TARGET_SAMPLE_RATE,
};

/// Gemini API model to use
const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

/// Gemini API base URL
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// How often the current window is re-transcribed into an interim hypothesis
const INTERIM_INTERVAL: Duration = Duration::from_secs(2);

/// Window length at which an utterance is committed as final
const MAX_UTTERANCE_SECS: f64 = 8.0;

/// Windows shorter than this are not worth a request
const MIN_WINDOW_SECS: f64 = 1.0;

/// Consecutive request failures before the stream gives up
const MAX_CONSECUTIVE_FAILURES: u32 = 3;

// Request types for Gemini API

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Option<SystemInstruction>,
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: i32,
}

// Response types for Gemini API

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// The request side of the adapter; cheap to clone into the worker task.
#[derive(Clone)]
struct GeminiClient {
    api_key: String,
    model: String,
    language: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Build the API URL
    fn api_url(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    /// Build the request body for one window of audio
    fn build_request(&self, flac_base64: String) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: AudioMimeType::Flac.to_string(),
                        data: flac_base64,
                    }),
                }],
            }],
            system_instruction: Some(SystemInstruction {
                parts: vec![TextPart {
                    text: format!(
                        "You are a speech-to-text engine. Transcribe the spoken audio \
                         verbatim in {}. Respond with only the transcribed text, \
                         nothing else. Respond with an empty string if no speech is \
                         audible.",
                        self.language
                    ),
                }],
            }),
            generation_config: Some(GenerationConfig {
                thinking_config: Some(ThinkingConfig {
                    // Disable thinking for lowest latency
                    thinking_budget: 0,
                }),
            }),
        }
    }

    /// Extract text from response
    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let parts: Vec<&str> = response
            .candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_ref()?
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(""))
        }
    }

    /// Transcribe one window of mono samples
    async fn transcribe_window(
        &self,
        samples: Vec<i16>,
        sample_rate: u32,
    ) -> Result<String, TranscriberError> {
        let flac = tokio::task::spawn_blocking(move || {
            let resampled = resample_to_16k(&samples, sample_rate)?;
            encode_to_flac(&resampled)
        })
        .await
        .map_err(|e| TranscriberError::StreamFailed(format!("Encode task error: {}", e)))?
        .map_err(|e| TranscriberError::StreamFailed(e.to_string()))?;

        use base64::Engine;
        let body = self.build_request(base64::engine::general_purpose::STANDARD.encode(flac));

        let response = self
            .client
            .post(self.api_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| TranscriberError::StreamFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TranscriberError::StreamFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| TranscriberError::StreamFailed(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(TranscriberError::StreamFailed(error.message));
        }

        Ok(Self::extract_text(&response)
            .map(|t| t.trim().to_string())
            .unwrap_or_default())
    }
}

struct WorkerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Live transcriber backed by the Gemini API
pub struct GeminiTranscriber {
    client: GeminiClient,
    worker: Mutex<Option<WorkerHandle>>,
}

impl GeminiTranscriber {
    /// Create a new Gemini transcriber with the given API key
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            client: GeminiClient {
                api_key: api_key.into(),
                model: DEFAULT_MODEL.to_string(),
                language: language.into(),
                base_url: API_BASE_URL.to_string(),
                client: reqwest::Client::new(),
            },
            worker: Mutex::new(None),
        }
    }

    /// Create a transcriber with a custom model
    pub fn with_model(
        api_key: impl Into<String>,
        language: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let mut transcriber = Self::new(api_key, language);
        transcriber.client.model = model.into();
        transcriber
    }

    /// Override the API base URL (for tests against a local server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Transcriber for GeminiTranscriber {
    async fn start(
        &self,
        audio: AudioTap,
        events: mpsc::Sender<ControllerEvent>,
    ) -> Result<(), TranscriberError> {
        if self.client.api_key.is_empty() {
            return Err(TranscriberError::Unsupported(
                "No transcription API key configured".to_string(),
            ));
        }

        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            return Err(TranscriberError::StreamFailed(
                "Transcription already running".to_string(),
            ));
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let client = self.client.clone();
        let task = tokio::spawn(run_stream(client, audio, events, stop_rx));
        *worker = Some(WorkerHandle { stop_tx, task });
        Ok(())
    }

    async fn stop(&self) {
        let handle = self.worker.lock().await.take();
        if let Some(WorkerHandle { stop_tx, task }) = handle {
            let _ = stop_tx.send(true);
            let _ = task.await;
        }
    }
}

fn window_secs(samples: usize, rate: u32) -> f64 {
    if rate == 0 {
        0.0
    } else {
        samples as f64 / rate as f64
    }
}

/// Consume the audio tap until stopped, emitting interim hypotheses and
/// final fragments into the event channel.
async fn run_stream(
    client: GeminiClient,
    mut audio: AudioTap,
    events: mpsc::Sender<ControllerEvent>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut window: Vec<i16> = Vec::new();
    let mut window_rate: u32 = TARGET_SAMPLE_RATE;
    let mut failures: u32 = 0;
    let mut ticker = tokio::time::interval(INTERIM_INTERVAL);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,

            chunk = audio.recv() => match chunk {
                Ok(chunk) => {
                    window_rate = chunk.sample_rate();
                    window.extend_from_slice(chunk.samples());

                    if window_secs(window.len(), window_rate) >= MAX_UTTERANCE_SECS {
                        let samples = std::mem::take(&mut window);
                        match client.transcribe_window(samples, window_rate).await {
                            Ok(text) if !text.is_empty() => {
                                failures = 0;
                                let fragment = TranscriptFragment::fin(text);
                                if events
                                    .send(ControllerEvent::Transcript(fragment))
                                    .await
                                    .is_err()
                                {
                                    return;
                                }
                            }
                            Ok(_) => failures = 0,
                            Err(e) => {
                                failures += 1;
                                if failures >= MAX_CONSECUTIVE_FAILURES {
                                    let _ = events
                                        .send(ControllerEvent::TranscriberDown(e.to_string()))
                                        .await;
                                    return;
                                }
                            }
                        }
                    }
                }
                // A slow transcription pass may lag the tap; skip the gap
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },

            _ = ticker.tick() => {
                if window_secs(window.len(), window_rate) < MIN_WINDOW_SECS {
                    continue;
                }
                match client.transcribe_window(window.clone(), window_rate).await {
                    Ok(text) if !text.is_empty() => {
                        failures = 0;
                        let fragment = TranscriptFragment::interim(text);
                        if events
                            .send(ControllerEvent::Transcript(fragment))
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    Ok(_) => failures = 0,
                    Err(e) => {
                        failures += 1;
                        if failures >= MAX_CONSECUTIVE_FAILURES {
                            let _ = events
                                .send(ControllerEvent::TranscriberDown(e.to_string()))
                                .await;
                            return;
                        }
                    }
                }
            }
        }
    }

    // Commit whatever is left of the last utterance
    if window_secs(window.len(), window_rate) >= MIN_WINDOW_SECS {
        if let Ok(text) = client.transcribe_window(window, window_rate).await {
            if !text.is_empty() {
                let _ = events
                    .send(ControllerEvent::Transcript(TranscriptFragment::fin(text)))
                    .await;
            }
        }
    }
}
