//! Live transcription adapters

mod gemini;

pub use gemini::GeminiTranscriber;
