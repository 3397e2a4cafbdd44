//! Property-based tests for the brr codec
//!
//! These tests use proptest to check stream invariants across random inputs.

use libbrr::{Decoder, Encoder, Reader, BYTES_PER_BLOCK, SAMPLES_PER_BLOCK};
use proptest::prelude::*;

// Helper: header bytes of every block
fn headers(brr: &[u8]) -> Vec<u8> {
    brr.chunks(BYTES_PER_BLOCK).map(|b| b[0]).collect()
}

// inputs stay under half scale, far from the overflow threshold
fn pcm_strategy() -> impl Strategy<Value = Vec<i16>> {
    prop::collection::vec(-16000i16..16000, 0..400)
}

proptest! {
    /// Property: every stream is whole blocks, and at least one
    #[test]
    fn stream_is_block_aligned(pcm in pcm_strategy()) {
        let out = Encoder::new().encode(&pcm).unwrap();
        prop_assert_eq!(out.brr.len() % BYTES_PER_BLOCK, 0);
        prop_assert!(!out.brr.is_empty());
        prop_assert_eq!(out.pcm.len() % SAMPLES_PER_BLOCK, 0);
    }

    /// Property: exactly one end flag, on the last block; loop flag with it
    #[test]
    fn terminator_invariant(pcm in pcm_strategy(), loop_frac in proptest::option::of(0.0f64..1.2)) {
        let loop_start = loop_frac.map(|f| (pcm.len() as f64 * f) as usize);
        let out = Encoder::new().with_loop(loop_start).encode(&pcm).unwrap();
        let headers = headers(&out.brr);
        let last = headers.len() - 1;

        let ends: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|&(_, &h)| h & 0x01 != 0)
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(ends, vec![last]);

        let looping = out.loop_offset.is_some();
        prop_assert_eq!(headers[last] & 0x02 != 0, looping);
        if let Some(offset) = out.loop_offset {
            prop_assert_eq!(offset % BYTES_PER_BLOCK, 0);
            prop_assert!(offset < out.brr.len());
        }
        prop_assert!(libbrr::validate_stream(&out.brr, out.loop_offset).is_ok());
    }

    /// Property: average error is total over searched blocks
    #[test]
    fn error_aggregation(pcm in pcm_strategy()) {
        let out = Encoder::new().encode(&pcm).unwrap();
        let stats = out.stats;
        prop_assert_eq!(stats.blocks, out.pcm.len() / SAMPLES_PER_BLOCK);
        if stats.blocks > 0 {
            prop_assert!((stats.average - stats.total / stats.blocks as f64).abs() < 1e-6);
            prop_assert!(stats.min <= stats.max);
        } else {
            prop_assert_eq!(stats.total, 0.0);
        }
    }

    /// Property: ragged input decodes like its zero-padded form
    #[test]
    fn ragged_decode_equals_padded(data in prop::collection::vec(any::<u8>(), 0..100)) {
        let mut padded = data.clone();
        padded.resize(data.len().div_ceil(BYTES_PER_BLOCK) * BYTES_PER_BLOCK, 0);
        prop_assert_eq!(Decoder::new().decode(&data), Decoder::new().decode(&padded));
        prop_assert_eq!(
            Decoder::new().with_gaussian(true).decode(&data),
            Decoder::new().with_gaussian(true).decode(&padded)
        );
    }

    /// Property: output stops at the end block
    #[test]
    fn decode_stops_at_end_block(data in prop::collection::vec(any::<u8>(), 0..200)) {
        let info = Reader::new().read(&data).info();
        let decoded = Decoder::new().decode(&data);
        prop_assert_eq!(decoded.samples.len(), info.samples);
        if let Some(end) = info.end_block {
            prop_assert_eq!(decoded.samples.len(), (end + 1) * SAMPLES_PER_BLOCK);
        }
    }

    /// Property: the decoder reproduces the samples the encoder scored
    #[test]
    fn decode_matches_encoder_error(pcm in pcm_strategy()) {
        let out = Encoder::new().encode(&pcm).unwrap();
        let decoded = Decoder::new().decode(&out.brr);
        let total: f64 = out
            .pcm
            .iter()
            .zip(&decoded.samples)
            .map(|(&x, &y)| {
                let d = (x >> 1) as f64 - (y >> 1) as f64;
                d * d
            })
            .sum();
        prop_assert!((total - out.stats.total).abs() < 1e-6);
    }
}
