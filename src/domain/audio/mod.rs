//! Audio value objects

use std::fmt;

/// Supported audio MIME types for finalized artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioMimeType {
    Flac,
    Wav,
}

impl AudioMimeType {
    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Flac => "flac",
            Self::Wav => "wav",
        }
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for AudioMimeType {
    fn default() -> Self {
        Self::Flac
    }
}

/// Stream parameters for captured audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioSpec {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
        }
    }
}

/// One block of raw audio delivered while the microphone is open.
/// Samples are mono i16; each chunk carries the rate it was captured at.
#[derive(Debug, Clone, Default)]
pub struct AudioChunk {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl AudioChunk {
    /// Create a chunk from raw samples
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Get the samples
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Sample rate the chunk was captured at
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples in the chunk
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the chunk is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Size in bytes (i16 samples)
    pub fn byte_len(&self) -> u64 {
        (self.samples.len() * 2) as u64
    }
}

/// Value object representing a finalized, immutable recording.
/// Produced by the capture capability on stop and consumed by the player
/// and the transcription API.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    data: Vec<u8>,
    mime_type: AudioMimeType,
}

impl AudioArtifact {
    /// Create an artifact from encoded bytes
    pub fn new(data: Vec<u8>, mime_type: AudioMimeType) -> Self {
        Self { data, mime_type }
    }

    /// Get the encoded audio bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the MIME type
    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    /// Get the size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the artifact is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Encode the audio as base64 for inline API payloads
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Get a human-readable size string (e.g., "1.2 MB")
    pub fn human_readable_size(&self) -> String {
        format_size(self.data.len() as u64)
    }
}

/// Format a byte count as a human-readable string
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_strings() {
        assert_eq!(AudioMimeType::Flac.as_str(), "audio/flac");
        assert_eq!(AudioMimeType::Wav.as_str(), "audio/wav");
        assert_eq!(AudioMimeType::Flac.extension(), "flac");
        assert_eq!(AudioMimeType::default(), AudioMimeType::Flac);
    }

    #[test]
    fn chunk_byte_len_counts_i16() {
        let chunk = AudioChunk::new(vec![0i16; 100], 16_000);
        assert_eq!(chunk.len(), 100);
        assert_eq!(chunk.byte_len(), 200);
        assert_eq!(chunk.sample_rate(), 16_000);
        assert!(!chunk.is_empty());
    }

    #[test]
    fn artifact_base64_roundtrip() {
        use base64::Engine;

        let artifact = AudioArtifact::new(vec![1, 2, 3], AudioMimeType::Flac);
        let encoded = artifact.to_base64();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, vec![1, 2, 3]);
    }

    #[test]
    fn format_size_ranges() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
