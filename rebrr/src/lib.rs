//! rebrr - Audio converter library for the SNES BRR format
//!
//! This library converts ordinary audio files to BRR sample data and back.
//! Any format symphonia can read is accepted as input; decoded BRR is
//! written as 16-bit mono WAV.
//!

pub mod audio;

use anyhow::{Context, Result};

/// Re-export libbrr types
pub use libbrr::{EncodedSample, ErrorStats, UNITY_PITCH};

/// Information about a brr file
#[derive(Debug, Clone, serde::Serialize)]
pub struct BrrFileInfo {
    pub file_size: usize,
    pub blocks: usize,
    pub samples: usize,
    pub end_block: Option<usize>,
    pub looping: bool,
    pub pitch_step: u16,
    pub playback_rate: u32,
    pub duration_secs: f64,
    pub compression_ratio: f64,
    pub valid: bool,
}

/// Get information about a brr file played at `pitch_step`
pub fn get_brr_info(data: &[u8], pitch_step: u16) -> BrrFileInfo {
    let stream = libbrr::Reader::new().read(data);
    let info = stream.info();

    BrrFileInfo {
        file_size: data.len(),
        blocks: info.blocks,
        samples: info.samples,
        end_block: info.end_block,
        looping: info.looping,
        pitch_step,
        playback_rate: libbrr::codec::playback_rate(pitch_step),
        duration_secs: info.duration_secs(pitch_step),
        compression_ratio: info.compression_ratio(),
        valid: libbrr::validate_stream(data, None).is_ok(),
    }
}

/// Validate the end/loop structure of a brr file
///
/// `loop_offset` is the byte offset of the loop block, if the file loops.
pub fn validate_brr(data: &[u8], loop_offset: Option<usize>) -> Result<()> {
    libbrr::validate_stream(data, loop_offset)
        .map_err(|e| anyhow::anyhow!("Invalid brr file: {}", e))
}

/// Encoding options for converting audio to brr
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Loop start in samples of the mono mixdown
    pub loop_start: Option<usize>,
    /// Pitch step override; derived from the input rate when unset
    pub pitch_step: Option<u16>,
    /// Overflow correction attempts per block
    pub max_retries: Option<u32>,
}

impl EncodeOptions {
    /// Create options for a looping sample
    pub fn looping(loop_start: usize) -> Self {
        Self {
            loop_start: Some(loop_start),
            ..Default::default()
        }
    }

    /// Set the pitch step written to the encoded result
    pub fn with_pitch_step(mut self, pitch_step: u16) -> Self {
        self.pitch_step = Some(pitch_step);
        self
    }

    /// Set the per-block overflow correction cap
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    fn to_encoder(&self, sample_rate: u32) -> libbrr::Encoder {
        let mut encoder = libbrr::Encoder::new()
            .with_sample_rate(sample_rate)
            .with_loop(self.loop_start);
        if let Some(pitch) = self.pitch_step {
            encoder = encoder.with_pitch_step(pitch);
        }
        if let Some(retries) = self.max_retries {
            encoder = encoder.with_max_retries(retries);
        }
        encoder
    }
}

/// Information about a decoded audio file
#[derive(Debug, Clone)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: usize,
    pub duration_secs: f32,
    pub source_format: Option<String>,
}

/// Encode audio file bytes to brr
///
/// # Arguments
/// * `audio_bytes` - Raw bytes of an audio file (MP3, WAV, FLAC, OGG, etc.)
/// * `options` - Encoding options
///
/// # Returns
/// The encoded sample: brr bytes, loop offset, aligned pcm and error stats
pub fn encode_from_audio(audio_bytes: &[u8], options: &EncodeOptions) -> Result<EncodedSample> {
    let audio = audio::read_audio_from_bytes(audio_bytes).context("Failed to read audio file")?;

    encode_from_samples(&audio.samples, audio.sample_rate, audio.channels, options)
}

/// Encode raw audio samples to brr
///
/// # Arguments
/// * `samples` - Interleaved f32 samples in range [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz
/// * `channels` - Number of channels, mixed down to mono
/// * `options` - Encoding options
pub fn encode_from_samples(
    samples: &[f32],
    sample_rate: u32,
    channels: usize,
    options: &EncodeOptions,
) -> Result<EncodedSample> {
    let mono = audio::mixdown_to_i16(samples, channels);

    options
        .to_encoder(sample_rate)
        .encode(&mono)
        .map_err(|e| anyhow::anyhow!("Encoding failed: {}", e))
}

/// Decode brr to 16-bit mono samples
///
/// # Arguments
/// * `brr_bytes` - Raw brr bytes
/// * `gaussian` - Resample through the gaussian filter at 32 kHz
/// * `pitch_step` - Playback step, 0x1000 is unity
///
/// # Returns
/// Tuple of (samples, sample_rate)
pub fn decode_to_samples(brr_bytes: &[u8], gaussian: bool, pitch_step: u16) -> (Vec<i16>, u32) {
    let decoded = libbrr::Decoder::new()
        .with_gaussian(gaussian)
        .with_pitch_step(pitch_step)
        .decode(brr_bytes);

    (decoded.samples, decoded.sample_rate)
}

/// Decode brr to WAV format
///
/// # Returns
/// Raw bytes of a 16-bit mono WAV file
pub fn decode_to_wav(brr_bytes: &[u8], gaussian: bool, pitch_step: u16) -> Result<Vec<u8>> {
    let (samples, sample_rate) = decode_to_samples(brr_bytes, gaussian, pitch_step);

    audio::write_wav_to_bytes(&samples, sample_rate).context("Failed to write WAV data")
}

/// Get information about an audio file
///
/// # Arguments
/// * `audio_bytes` - Raw bytes of an audio file (MP3, WAV, FLAC, OGG, etc.)
///
/// # Returns
/// Audio information
pub fn get_audio_info(audio_bytes: &[u8]) -> Result<AudioInfo> {
    let audio = audio::read_audio_from_bytes(audio_bytes).context("Failed to read audio file")?;

    Ok(AudioInfo {
        sample_rate: audio.sample_rate,
        channels: audio.channels,
        duration_secs: audio.duration_secs(),
        source_format: audio.source_format,
    })
}
