//! PCM conditioning and FLAC encoding
//!
//! Recordings are normalized to speech-optimized parameters before
//! encoding:
//! - 16kHz sample rate (resampled from the device rate)
//! - Mono channel
//! - 16-bit samples
//!
//! FLAC keeps the artifact lossless while staying compressed (~40% of
//! WAV size), and both the playback decoder and the transcription API
//! accept it.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;

use rubato::{FftFixedIn, Resampler};

/// Target sample rate for speech-optimized encoding
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Bits per sample (16-bit audio)
const BITS_PER_SAMPLE: usize = 16;

/// Number of channels (mono)
const CHANNELS: usize = 1;

/// FLAC encoding errors
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("FLAC config error: {0}")]
    Config(String),

    #[error("FLAC encoding failed: {0}")]
    Encode(String),

    #[error("FLAC write failed: {0}")]
    Write(String),

    #[error("Resampling failed: {0}")]
    Resample(String),
}

/// Encode PCM samples to FLAC format
///
/// Input: mono i16 samples at 16kHz
/// Output: FLAC bytes
pub fn encode_to_flac(pcm_samples: &[i16]) -> Result<Vec<u8>, EncodingError> {
    // flacenc works on i32 internally
    let samples_i32: Vec<i32> = pcm_samples.iter().map(|&s| s as i32).collect();

    let config = config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| EncodingError::Config(format!("{:?}", e)))?;

    let source = MemSource::from_samples(
        &samples_i32,
        CHANNELS,
        BITS_PER_SAMPLE,
        TARGET_SAMPLE_RATE as usize,
    );

    let flac_stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| EncodingError::Encode(format!("{:?}", e)))?;

    let mut sink = ByteSink::new();
    flac_stream
        .write(&mut sink)
        .map_err(|e| EncodingError::Write(e.to_string()))?;

    Ok(sink.into_inner())
}

/// Resample mono audio from the device rate to 16kHz
pub fn resample_to_16k(samples: &[i16], source_rate: u32) -> Result<Vec<i16>, EncodingError> {
    if source_rate == TARGET_SAMPLE_RATE {
        return Ok(samples.to_vec());
    }

    let samples_f32: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

    let ratio = TARGET_SAMPLE_RATE as f64 / source_rate as f64;
    let output_len = (samples_f32.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        TARGET_SAMPLE_RATE as usize,
        1024, // chunk size
        2,    // sub-chunks
        1,    // mono
    )
    .map_err(|e| EncodingError::Resample(format!("Resampler init failed: {}", e)))?;

    let mut output = Vec::with_capacity(output_len);
    let mut input_pos = 0;

    while input_pos < samples_f32.len() {
        let frames_needed = resampler.input_frames_next();
        let end_pos = (input_pos + frames_needed).min(samples_f32.len());
        let mut frame = samples_f32[input_pos..end_pos].to_vec();
        frame.resize(frames_needed, 0.0);

        let resampled = resampler
            .process(&[frame], None)
            .map_err(|e| EncodingError::Resample(e.to_string()))?;

        output.extend(resampled[0].iter().map(|&s| (s * 32767.0) as i16));
        input_pos = end_pos;
    }

    output.truncate(output_len);
    Ok(output)
}

/// Mix interleaved multi-channel samples down to mono
pub fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_silence() {
        // 1 second of silence at 16kHz
        let silence = vec![0i16; TARGET_SAMPLE_RATE as usize];
        let flac = encode_to_flac(&silence).unwrap();

        assert!(!flac.is_empty());
        // FLAC stream marker
        assert_eq!(&flac[0..4], b"fLaC");
    }

    #[test]
    fn resample_identity_at_target_rate() {
        let samples = vec![100i16; 1600];
        let out = resample_to_16k(&samples, TARGET_SAMPLE_RATE).unwrap();
        assert_eq!(out, samples);
    }

    #[test]
    fn resample_halves_sample_count_from_32k() {
        let samples = vec![0i16; 32_000];
        let out = resample_to_16k(&samples, 32_000).unwrap();
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn mix_to_mono_averages_stereo_frames() {
        let stereo = vec![100i16, 300, -100, -300];
        let mono = mix_to_mono(&stereo, 2);
        assert_eq!(mono, vec![200, -200]);
    }

    #[test]
    fn mix_to_mono_passes_mono_through() {
        let mono = vec![1i16, 2, 3];
        assert_eq!(mix_to_mono(&mono, 1), mono);
    }
}
