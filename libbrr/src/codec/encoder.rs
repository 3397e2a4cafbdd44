use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::align::align_for_encoding;
use super::overflow::{risky_positions, OverflowCorrector};
use super::progress::{NoProgress, Progress, ProgressTracker};
use super::search::search_block;
use super::stats::ErrorStats;
use crate::core::{
    BrrBlock, BrrError, BrrResult, History, BYTES_PER_BLOCK, DSP_SAMPLE_RATE, MAX_PITCH,
    SAMPLES_PER_BLOCK,
};
use crate::Writer;

/// default cap on overflow-correction retries per block
pub const DEFAULT_MAX_OVERFLOW_RETRIES: u32 = 64;

/// encode settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// loop start in samples, `None` for a one-shot sample
    pub loop_start: Option<usize>,
    /// nominal rate of the input pcm
    pub sample_rate: u32,
    /// playback step override, stored unchanged; derived from
    /// `sample_rate` when `None`
    pub pitch_step: Option<u16>,
    /// failed overflow corrections allowed per block
    pub max_overflow_retries: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            loop_start: None,
            sample_rate: DSP_SAMPLE_RATE,
            pitch_step: None,
            max_overflow_retries: DEFAULT_MAX_OVERFLOW_RETRIES,
        }
    }
}

impl EncodeOptions {
    /// the override as given, else the step derived from `sample_rate`
    ///
    /// Only the derived step is clamped to the voice register range.
    pub fn resolved_pitch_step(&self) -> u16 {
        self.pitch_step.unwrap_or_else(|| pitch_step_for_rate(self.sample_rate))
    }
}

/// result of an encode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedSample {
    /// the brr stream, always at least one block
    #[serde(with = "serde_bytes")]
    pub brr: Vec<u8>,
    /// loop point in bytes, `None` when not looping
    pub loop_offset: Option<usize>,
    /// the aligned, overflow-corrected pcm that was actually encoded
    pub pcm: Vec<i16>,
    pub stats: ErrorStats,
    pub pitch_step: u16,
}

impl EncodedSample {
    pub fn block_count(&self) -> usize {
        self.brr.len() / BYTES_PER_BLOCK
    }

    pub fn is_looping(&self) -> bool {
        self.loop_offset.is_some()
    }
}

/// brr encoder
pub struct Encoder {
    options: EncodeOptions,
}

impl Encoder {
    pub fn new() -> Self {
        Encoder {
            options: EncodeOptions::default(),
        }
    }

    pub fn with_options(options: EncodeOptions) -> Self {
        Encoder { options }
    }

    /// loop from sample `start` to the end
    pub fn with_loop(mut self, start: Option<usize>) -> Self {
        self.options.loop_start = start;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.options.sample_rate = sample_rate;
        self
    }

    pub fn with_pitch_step(mut self, pitch_step: u16) -> Self {
        self.options.pitch_step = Some(pitch_step);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.options.max_overflow_retries = retries;
        self
    }

    pub fn options(&self) -> EncodeOptions {
        self.options
    }

    /// encode 16-bit pcm to brr
    ///
    /// The input is copied; the corrected buffer comes back in
    /// [`EncodedSample::pcm`].
    pub fn encode(&self, pcm: &[i16]) -> BrrResult<EncodedSample> {
        self.encode_with_progress(pcm, &mut NoProgress)
    }

    /// encode with a progress observer
    pub fn encode_with_progress<P: Progress + ?Sized>(
        &self,
        pcm: &[i16],
        progress: &mut P,
    ) -> BrrResult<EncodedSample> {
        let mut tracker = ProgressTracker::start(progress);

        let mut pcm = pcm.to_vec();
        let loop_start = align_for_encoding(&mut pcm, self.options.loop_start);
        let loop_block = loop_start.map(|start| start / SAMPLES_PER_BLOCK);
        let total = pcm.len() / SAMPLES_PER_BLOCK;

        debug!(
            samples = pcm.len(),
            blocks = total,
            loop_block = ?loop_block,
            "encoding brr"
        );

        let mut blocks = Vec::with_capacity(total);
        let mut history = History::default();
        let mut stats = ErrorStats::new();
        let mut corrector = OverflowCorrector::new();

        for (index, window) in pcm.chunks_exact_mut(SAMPLES_PER_BLOCK).enumerate() {
            let allow_prediction = index != 0 && Some(index) != loop_block;

            let choice = loop {
                let choice = search_block(window, history, allow_prediction);
                let risky = risky_positions(history, &choice.decoded);
                if !risky.contains(&true) {
                    break choice;
                }
                if corrector.attempts() >= self.options.max_overflow_retries {
                    return Err(BrrError::OverflowCorrectionExhausted {
                        block: index,
                        attempts: corrector.attempts(),
                    });
                }
                debug!(
                    block = index,
                    attempt = corrector.attempts() + 1,
                    risky = risky.iter().filter(|&&r| r).count(),
                    "overflow risk, attenuating window"
                );
                corrector.correct(window, &risky);
            };
            corrector.reset();

            trace!(
                block = index,
                filter = choice.filter() as u8,
                range = choice.range(),
                error = choice.error,
                "block committed"
            );

            history = choice.history();
            stats.record(choice.error);
            blocks.push(choice.block);

            tracker.blocks_done(index + 1, total);
            if index + 1 < total && tracker.should_cancel() {
                return Err(BrrError::Cancelled { block: index + 1 });
            }
        }

        let brr = Writer::new().write(&blocks, loop_block.is_some());
        let stats = stats.finish();
        tracker.set(100);

        let loop_offset = loop_block.map(|block| block * BYTES_PER_BLOCK);
        info!(
            blocks = stats.blocks,
            bytes = brr.len(),
            average_error = stats.average,
            min_error = stats.min,
            max_error = stats.max,
            loop_offset = ?loop_offset,
            "brr encoded"
        );

        Ok(EncodedSample {
            brr,
            loop_offset,
            pcm,
            stats,
            pitch_step: self.options.resolved_pitch_step(),
        })
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// pitch step that plays `rate` hz material at its own speed
///
/// `round(rate * 0x1000 / 32000)`, clamped to what the voice registers hold.
pub fn pitch_step_for_rate(rate: u32) -> u16 {
    let step = (rate as f64 * 0.128 + 0.5) as u32;
    step.clamp(1, MAX_PITCH as u32) as u16
}

/// encode one block on its own, with the first-block rules
pub fn encode_block(window: &[i16; SAMPLES_PER_BLOCK]) -> BrrBlock {
    search_block(window, History::default(), false).block
}
