//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems: the microphone, the Gemini API,
//! the audio output device, and the handover service.

pub mod capture;
pub mod clipboard;
pub mod config;
pub mod playback;
pub mod report;
pub mod transcription;

// Re-export adapters
pub use capture::CpalCapture;
pub use clipboard::ArboardClipboard;
pub use config::XdgConfigStore;
pub use playback::RodioPlayer;
pub use report::HttpReportGateway;
pub use transcription::GeminiTranscriber;
