//! Sample preparation and soundbank sources.
//!
//! Tracker samples arrive as 8 or 16-bit pcm with optional forward or
//! ping-pong loops. Before the codec sees them, the data after the loop end
//! is dropped, ping-pong loops are unrolled, and loops whose block
//! alignment would need too many repeats are resampled instead.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{EncodeOptions, Encoder};
use crate::core::{i8_to_i16, BrrError, BrrResult, SAMPLES_PER_BLOCK};

/// loop length (after unrolling) above which a loop is resampled to a
/// block multiple instead of repeated
pub const MAX_UNROLL_SAMPLES: usize = 2000;

/// raw sample data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleData {
    Pcm8(Vec<i8>),
    Pcm16(Vec<i16>),
}

impl SampleData {
    /// parse little-endian pcm of the given bit depth
    ///
    /// A trailing odd byte of 16-bit data is ignored.
    pub fn from_le_bytes(bits: u8, bytes: &[u8]) -> BrrResult<Self> {
        match bits {
            8 => Ok(SampleData::Pcm8(bytes.iter().map(|&b| b as i8).collect())),
            16 => Ok(SampleData::Pcm16(
                bytes
                    .chunks_exact(2)
                    .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                    .collect(),
            )),
            other => Err(BrrError::UnsupportedBitDepth(other)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SampleData::Pcm8(data) => data.len(),
            SampleData::Pcm16(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 16-bit view of the data
    pub fn to_pcm16(&self) -> Vec<i16> {
        match self {
            SampleData::Pcm8(data) => data.iter().map(|&s| i8_to_i16(s)).collect(),
            SampleData::Pcm16(data) => data.clone(),
        }
    }
}

/// tracker loop settings, `end` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopMode {
    Off,
    Forward { start: usize, end: usize },
    PingPong { start: usize, end: usize },
}

impl LoopMode {
    fn bounds(self) -> Option<(usize, usize)> {
        match self {
            LoopMode::Off => None,
            LoopMode::Forward { start, end } | LoopMode::PingPong { start, end } => {
                Some((start, end))
            }
        }
    }
}

/// pcm ready for the codec
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSample {
    pub pcm: Vec<i16>,
    /// loop start in samples
    pub loop_start: Option<usize>,
    /// playback rate multiplier that undoes any loop resampling
    pub tuning_factor: f64,
}

/// apply the loop mode to `sample`
pub fn prepare(sample: &SampleData, loop_mode: LoopMode) -> BrrResult<PreparedSample> {
    let mut pcm = sample.to_pcm16();

    let Some((start, end)) = loop_mode.bounds() else {
        return Ok(PreparedSample {
            pcm,
            loop_start: None,
            tuning_factor: 1.0,
        });
    };

    if start >= end || end > pcm.len() {
        return Err(BrrError::InvalidLoop {
            start,
            end,
            len: pcm.len(),
        });
    }

    pcm.truncate(end);
    if matches!(loop_mode, LoopMode::PingPong { .. }) {
        pcm.extend_from_within(start..end);
        pcm[end..].reverse();
    }

    let loop_len = pcm.len() - start;
    if loop_len % SAMPLES_PER_BLOCK == 0 || loop_len * unrolls_to_align(loop_len) < MAX_UNROLL_SAMPLES
    {
        // short loops are repeated by the codec
        return Ok(PreparedSample {
            pcm,
            loop_start: Some(start),
            tuning_factor: 1.0,
        });
    }

    let amount = SAMPLES_PER_BLOCK - loop_len % SAMPLES_PER_BLOCK;
    let (pcm, loop_start, tuning_factor) = resample_loop(&pcm, start, amount);
    debug!(
        loop_len,
        added = amount,
        tuning_factor,
        "resampled loop to block alignment"
    );

    Ok(PreparedSample {
        pcm,
        loop_start: Some(loop_start),
        tuning_factor,
    })
}

/// copies of the loop needed before its length is a block multiple
fn unrolls_to_align(loop_len: usize) -> usize {
    let mut copies = 1;
    while (loop_len * copies) % SAMPLES_PER_BLOCK != 0 {
        copies += 1;
    }
    copies
}

/// stretch the whole sample so the loop grows by `amount` samples
///
/// Linear interpolation; reads past the end wrap back into the loop.
/// Returns the new data, the new loop start and the tuning factor
/// (old length over new length of the loop).
pub fn resample_loop(data: &[i16], loop_start: usize, amount: usize) -> (Vec<i16>, usize, f64) {
    let old_len = data.len();
    let old_loop = old_len - loop_start;
    let new_loop = old_loop + amount;
    let factor = new_loop as f64 / old_loop as f64;
    let step = 1.0 / factor;
    let new_len = ((old_len as f64 * factor).round() as usize).max(new_loop);
    let new_start = new_len - new_loop;

    let wrap = |mut index: usize| {
        while index >= old_len {
            index -= old_loop;
        }
        index
    };

    let resampled = (0..new_len)
        .map(|x| {
            let pos = x as f64 * step;
            let i1 = pos.floor() as usize;
            let s1 = data[wrap(i1)] as f64;
            let s2 = data[wrap(i1 + 1)] as f64;
            let value = s1 + (s2 - s1) * (pos - i1 as f64);
            value.clamp(i16::MIN as f64, i16::MAX as f64) as i16
        })
        .collect();

    (resampled, new_start, step)
}

/// an encoded sample as stored in a soundbank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrrSource {
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
    /// loop point in bytes (0 when not looping)
    pub loop_offset: usize,
    pub tuning_factor: f64,
    /// hex blake3 of `data`, empty for an empty source
    pub hash: String,
}

impl BrrSource {
    /// prepare and encode a tracker sample with default settings
    pub fn from_sample(sample: &SampleData, loop_mode: LoopMode) -> BrrResult<Self> {
        Self::from_sample_with(sample, loop_mode, EncodeOptions::default())
    }

    /// same as [`from_sample`](Self::from_sample), with `options` for
    /// everything but the loop point
    pub fn from_sample_with(
        sample: &SampleData,
        loop_mode: LoopMode,
        options: EncodeOptions,
    ) -> BrrResult<Self> {
        if sample.is_empty() {
            return Ok(BrrSource {
                data: Vec::new(),
                loop_offset: 0,
                tuning_factor: 1.0,
                hash: String::new(),
            });
        }

        let prepared = prepare(sample, loop_mode)?;
        let encoded = Encoder::with_options(EncodeOptions {
            loop_start: prepared.loop_start,
            ..options
        })
        .encode(&prepared.pcm)?;

        let hash = blake3::hash(&encoded.brr).to_hex().to_string();
        Ok(BrrSource {
            data: encoded.brr,
            loop_offset: encoded.loop_offset.unwrap_or(0),
            tuning_factor: prepared.tuning_factor,
            hash,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Serialize to MessagePack bytes
    pub fn to_msgpack(&self) -> BrrResult<Vec<u8>> {
        rmp_serde::to_vec_named(self).map_err(|e| BrrError::Serialization(e.to_string()))
    }

    /// Deserialize from MessagePack bytes
    pub fn from_msgpack(data: &[u8]) -> BrrResult<Self> {
        rmp_serde::from_slice(data).map_err(|e| BrrError::Serialization(e.to_string()))
    }
}
