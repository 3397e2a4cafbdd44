//! Block alignment of the pcm buffer before encoding.

use tracing::warn;

use crate::core::SAMPLES_PER_BLOCK;

const BLOCK_MASK: usize = SAMPLES_PER_BLOCK - 1;

/// make `pcm` a whole number of blocks
///
/// Without a loop the buffer is zero-padded. With a loop the loop region is
/// repeated onto the end (doubling it as often as needed) until both the
/// loop start and the loop length fall on block boundaries, and the loop
/// start is moved forward to the next boundary. A loop start at or past the
/// end of the buffer disables looping.
///
/// Returns the aligned loop start in samples, or `None` when not looping.
pub fn align_for_encoding(pcm: &mut Vec<i16>, loop_start: Option<usize>) -> Option<usize> {
    let loop_start = match loop_start {
        Some(start) if start < pcm.len() => Some(start),
        Some(start) => {
            warn!(
                loop_start = start,
                len = pcm.len(),
                "loop start is past the end of the sample, disabling loop"
            );
            None
        }
        None => None,
    };

    match loop_start {
        Some(start) => Some(extend_loop(pcm, start)),
        None => {
            pad_to_block(pcm);
            None
        }
    }
}

/// zero-pad to a multiple of 16 samples
pub fn pad_to_block(pcm: &mut Vec<i16>) {
    let padded = (pcm.len() + BLOCK_MASK) & !BLOCK_MASK;
    pcm.resize(padded, 0);
}

/// repeat the loop region until it is block aligned; returns the new start
///
/// `start` must be inside `pcm`.
fn extend_loop(pcm: &mut Vec<i16>, start: usize) -> usize {
    let start_align = (SAMPLES_PER_BLOCK - (start & BLOCK_MASK)) & BLOCK_MASK;
    let loop_len = pcm.len() - start;

    let mut aligned_len = loop_len;
    while aligned_len & BLOCK_MASK != 0 {
        aligned_len <<= 1;
    }

    // samples to append: the doubled loop plus the shift of the loop start
    let extra = aligned_len - loop_len + start_align;
    if extra == 0 {
        return start;
    }

    pcm.reserve(extra);
    for src in start..start + extra {
        let sample = pcm[src];
        pcm.push(sample);
    }

    start + start_align
}
