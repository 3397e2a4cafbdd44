//! Per-block rate-distortion search.
//!
//! Every (filter, range) pair is tried against the window by simulating
//! the decoder, and the pair with the lowest squared error wins. Filters
//! are tried in ascending order and ranges in descending order with a
//! strict `<`, so ties go to the simplest filter and then the largest
//! range.

use crate::core::{
    clamp_bits, dequantize, wrap15, BlockHeader, BrrBlock, Filter, History, MAX_RANGE,
    SAMPLES_PER_BLOCK,
};

/// one quantized sample
#[derive(Debug, Clone, Copy, PartialEq)]
struct Quantized {
    nibble: i8,
    decoded: i32,
    error: f64,
}

/// encoded candidate for one 16-sample window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockChoice {
    /// block with no end/loop flags set
    pub block: BrrBlock,
    /// reconstructed 15-bit samples, as the decoder will produce them
    pub decoded: [i32; SAMPLES_PER_BLOCK],
    /// sum of squared errors on the 15-bit scale
    pub error: f64,
}

impl BlockChoice {
    pub fn filter(&self) -> Filter {
        self.block.header.filter
    }

    pub fn range(&self) -> u8 {
        self.block.header.range
    }

    /// prediction history for the following block
    pub fn history(&self) -> History {
        History::new(
            self.decoded[SAMPLES_PER_BLOCK - 1],
            self.decoded[SAMPLES_PER_BLOCK - 2],
        )
    }
}

/// the two 16-bit accumulator values that wrap to `target`
#[inline]
fn unwrap_candidates(target: i32) -> [i32; 2] {
    [
        ((target & 0x7FFF) as i16) as i32,
        ((target | 0x8000) as i16) as i32,
    ]
}

/// quantize `target` against `predicted`
///
/// Both unwrapped candidates are quantized and decoded; on equal error the
/// second candidate wins.
fn quantize(target: i32, predicted: i32, filter: Filter, range: u8) -> Quantized {
    let rhalf = (1i32 << range) >> 1;

    let [first, second] = unwrap_candidates(target).map(|candidate| {
        // undo the filter, restore the low bit dropped by the range shift,
        // then round to the nearest step
        let residual = (candidate - predicted) << 1;
        let nibble = clamp_bits((residual + rhalf) >> range, 4) as i8;
        let decoded = filter.accumulate(dequantize(nibble, range), predicted);
        let diff = (target - decoded) as f64;
        Quantized {
            nibble,
            decoded,
            error: diff * diff,
        }
    });

    if first.error < second.error {
        first
    } else {
        second
    }
}

/// encode `window` with one fixed filter and range
///
/// `window` holds 16 samples on the 16-bit scale.
pub fn encode_with(window: &[i16], history: History, filter: Filter, range: u8) -> BlockChoice {
    debug_assert_eq!(window.len(), SAMPLES_PER_BLOCK);

    let mut history = history;
    let mut nibbles = [0i8; SAMPLES_PER_BLOCK];
    let mut decoded = [0i32; SAMPLES_PER_BLOCK];
    let mut error = 0.0;

    for (n, &sample) in window.iter().take(SAMPLES_PER_BLOCK).enumerate() {
        // the decoder doubles its 15-bit output, so compare at 15 bits
        let target = (sample as i32) >> 1;
        let predicted = filter.predict(history.prev1, history.prev2);
        let q = quantize(target, predicted, filter, range);

        nibbles[n] = q.nibble;
        decoded[n] = q.decoded;
        error += q.error;
        history.push(q.decoded);
    }

    BlockChoice {
        block: BrrBlock {
            header: BlockHeader::new(range, filter),
            nibbles,
        },
        decoded,
        error,
    }
}

/// search every filter and range 12..=1 for the best encoding of `window`
///
/// With `allow_prediction` false only filter 0 is tried; that is the case
/// for the first block and the loop block, where the decoder has no
/// meaningful history.
pub fn search_block(window: &[i16], history: History, allow_prediction: bool) -> BlockChoice {
    let mut best = encode_with(window, history, Filter::Zero, MAX_RANGE);

    for filter in Filter::ALL {
        if filter != Filter::Zero && !allow_prediction {
            continue;
        }

        // ranges 0 and 13-15 only reach values other pairs already cover
        for range in (1..=MAX_RANGE).rev() {
            if filter == Filter::Zero && range == MAX_RANGE {
                continue;
            }

            let candidate = encode_with(window, history, filter, range);
            if candidate.error < best.error {
                best = candidate;
            }
        }
    }

    best
}
