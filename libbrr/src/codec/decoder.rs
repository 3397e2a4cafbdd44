use serde::{Deserialize, Serialize};

use crate::core::{
    dequantize, BrrBlock, GaussianInterpolator, History, DSP_SAMPLE_RATE, SAMPLES_PER_BLOCK,
    UNITY_PITCH,
};
use crate::reader::BrrStream;

/// decode settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// resample through the gaussian filter at `pitch_step`
    pub gaussian: bool,
    /// 4.12 fixed-point playback step, 0x1000 = unity
    pub pitch_step: u16,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            gaussian: false,
            pitch_step: UNITY_PITCH,
        }
    }
}

/// decoded pcm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSample {
    /// 16-bit scaled samples
    pub samples: Vec<i16>,
    /// rate at which `samples` should be played
    pub sample_rate: u32,
}

/// block-by-block reconstruction with the decoder's prediction history
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockDecoder {
    history: History,
}

impl BlockDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// decoder that continues from an existing history
    pub fn with_history(history: History) -> Self {
        BlockDecoder { history }
    }

    pub fn history(&self) -> History {
        self.history
    }

    /// reconstruct the 15-bit samples of one block
    pub fn decode_block(&mut self, block: &BrrBlock) -> [i32; SAMPLES_PER_BLOCK] {
        let filter = block.header.filter;
        let range = block.header.range;
        let mut out = [0i32; SAMPLES_PER_BLOCK];
        for (sample, &nibble) in out.iter_mut().zip(block.nibbles.iter()) {
            *sample = self.history.step(filter, dequantize(nibble, range));
        }
        out
    }
}

/// brr decoder
pub struct Decoder {
    options: DecodeOptions,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            options: DecodeOptions::default(),
        }
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Decoder { options }
    }

    pub fn with_gaussian(mut self, enabled: bool) -> Self {
        self.options.gaussian = enabled;
        self
    }

    pub fn with_pitch_step(mut self, pitch_step: u16) -> Self {
        self.options.pitch_step = pitch_step;
        self
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    /// decode brr bytes (zero-padded to whole blocks first)
    pub fn decode(&self, data: &[u8]) -> DecodedSample {
        self.decode_stream(&BrrStream::from_bytes(data))
    }

    pub fn decode_stream(&self, stream: &BrrStream) -> DecodedSample {
        let reconstructed = reconstruct(stream);

        if self.options.gaussian {
            let mut interpolator = GaussianInterpolator::new(self.options.pitch_step);
            DecodedSample {
                samples: interpolator.process(reconstructed),
                sample_rate: DSP_SAMPLE_RATE,
            }
        } else {
            DecodedSample {
                samples: reconstructed.into_iter().map(|s| (s << 1) as i16).collect(),
                sample_rate: playback_rate(self.options.pitch_step),
            }
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// 15-bit samples of every block up to and including the end block
pub fn reconstruct(stream: &BrrStream) -> Vec<i32> {
    let mut decoder = BlockDecoder::new();
    let mut out = Vec::with_capacity(stream.block_count() * SAMPLES_PER_BLOCK);
    for block in stream.playable_blocks() {
        out.extend_from_slice(&decoder.decode_block(&block));
    }
    out
}

/// output rate the S-DSP plays raw samples at for `pitch_step`
pub fn playback_rate(pitch_step: u16) -> u32 {
    // 7.8125 = 32000 / 0x1000
    (pitch_step as f64 * 7.8125 + 0.5) as u32
}
