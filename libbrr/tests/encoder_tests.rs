use libbrr::codec::{encode_with, risky_positions, search_block};
use libbrr::{
    BlockDecoder, BrrBlock, BrrError, Encoder, Filter, History, BYTES_PER_BLOCK,
    SAMPLES_PER_BLOCK,
};

fn header(brr: &[u8], block: usize) -> u8 {
    brr[block * BYTES_PER_BLOCK]
}

fn block_at(brr: &[u8], block: usize) -> BrrBlock {
    let mut bytes = [0u8; BYTES_PER_BLOCK];
    bytes.copy_from_slice(&brr[block * BYTES_PER_BLOCK..(block + 1) * BYTES_PER_BLOCK]);
    BrrBlock::from_bytes(&bytes)
}

fn sine(len: usize, freq: f64, amplitude: f64) -> Vec<i16> {
    (0..len)
        .map(|i| {
            let t = i as f64 / 32000.0;
            ((2.0 * std::f64::consts::PI * freq * t).sin() * amplitude) as i16
        })
        .collect()
}

// ============================================================================
// Silence and Terminator
// ============================================================================

#[test]
fn test_silence_two_blocks_plus_terminator() {
    let out = Encoder::new().encode(&[0i16; 32]).unwrap();

    assert_eq!(out.brr.len(), 27);
    assert_eq!(out.block_count(), 3);
    // content blocks pick filter 0 at the top range
    assert_eq!(header(&out.brr, 0), 0xC0);
    assert_eq!(header(&out.brr, 1), 0xC0);
    // terminator is silence with only the end flag
    assert_eq!(header(&out.brr, 2), 0x01);
    for block in 0..3 {
        let data = &out.brr[block * 9 + 1..block * 9 + 9];
        assert!(data.iter().all(|&b| b == 0));
    }

    assert_eq!(out.stats.blocks, 2);
    assert_eq!(out.stats.total, 0.0);
    assert_eq!(out.loop_offset, None);
}

#[test]
fn test_empty_input_single_block() {
    let out = Encoder::new().encode(&[]).unwrap();
    assert_eq!(out.brr.len(), 9);
    assert_eq!(out.brr[0], 0x01);
    assert!(out.pcm.is_empty());
}

#[test]
fn test_partial_block_is_padded() {
    let out = Encoder::new().encode(&[1000i16; 20]).unwrap();
    assert_eq!(out.pcm.len(), 32);
    assert_eq!(&out.pcm[20..], &[0i16; 12]);
    // two content blocks plus terminator
    assert_eq!(out.brr.len(), 27);
}

#[test]
fn test_only_last_block_ends() {
    let pcm = sine(1000, 440.0, 12000.0);
    let out = Encoder::new().encode(&pcm).unwrap();
    let last = out.block_count() - 1;

    for block in 0..out.block_count() {
        let h = header(&out.brr, block);
        assert_eq!(h & 0x01 != 0, block == last, "end flag on block {}", block);
        assert_eq!(h & 0x02, 0, "loop flag on one-shot block {}", block);
    }
    assert!(out.brr[last * 9 + 1..].iter().all(|&b| b == 0));
}

// ============================================================================
// Filter Selection
// ============================================================================

#[test]
fn test_first_block_uses_filter_zero() {
    let pcm: Vec<i16> = (0..64).map(|i| i * 200).collect();
    let out = Encoder::new().encode(&pcm).unwrap();
    let first = block_at(&out.brr, 0);
    assert_eq!(first.header.filter, Filter::Zero);
}

#[test]
fn test_loop_block_ignores_history() {
    // smooth ramp: every block but the forced ones would predict
    let pcm: Vec<i16> = (0..64).map(|i| 400 + i * 150).collect();
    let out = Encoder::new().with_loop(Some(32)).encode(&pcm).unwrap();
    assert_eq!(out.loop_offset, Some(2 * BYTES_PER_BLOCK));

    let mut decoder = BlockDecoder::new();
    let blocks: Vec<BrrBlock> = (0..out.block_count())
        .map(|b| block_at(&out.brr, b))
        .collect();
    for block in &blocks[..2] {
        decoder.decode_block(block);
    }
    let in_stream = decoder.decode_block(&blocks[2]);

    assert_eq!(blocks[2].header.filter, Filter::Zero);
    // the loop block decodes the same with no history at all
    let standalone = BlockDecoder::new().decode_block(&blocks[2]);
    assert_eq!(in_stream, standalone);
}

#[test]
fn test_forced_filter_zero_with_known_history() {
    let window: Vec<i16> = (0..16).map(|i| 3000 + i * 100).collect();
    let ignored = History::new(9000, 8500);
    let forced = search_block(&window, ignored, false);
    let fresh = search_block(&window, History::default(), false);
    assert_eq!(forced.filter(), Filter::Zero);
    assert_eq!(forced.block, fresh.block);
    assert_eq!(forced.decoded, fresh.decoded);
}

#[test]
fn test_tie_prefers_lowest_filter() {
    // target 1 is reached exactly by filter 0 and filter 1 at range 1
    let choice = search_block(&[2i16; 16], History::default(), true);
    assert_eq!(choice.error, 0.0);
    assert_eq!(choice.filter(), Filter::Zero);
    assert_eq!(choice.range(), 1);
}

#[test]
fn test_tie_prefers_highest_range() {
    // silence is exact at every range and filter
    let choice = search_block(&[0i16; 16], History::default(), true);
    assert_eq!(choice.filter(), Filter::Zero);
    assert_eq!(choice.range(), 12);
}

#[test]
fn test_tie_between_ranges_of_one_filter() {
    // filter 3 reaches error 2 at ranges 2 and 3; filters 0-2 never get there
    let window: Vec<i16> = (0..16).map(|i| 880 + 2 * i).collect();
    let history = History::new(439, 438);

    for filter in [Filter::Zero, Filter::One, Filter::Two] {
        for range in 1..=12 {
            assert!(encode_with(&window, history, filter, range).error > 2.0);
        }
    }
    assert_eq!(encode_with(&window, history, Filter::Three, 2).error, 2.0);
    assert_eq!(encode_with(&window, history, Filter::Three, 3).error, 2.0);

    let choice = search_block(&window, history, true);
    assert_eq!(choice.filter(), Filter::Three);
    assert_eq!(choice.range(), 3);
    assert_eq!(choice.error, 2.0);
}

#[test]
fn test_prediction_exact_on_full_scale_dc() {
    // 15/16 of 16383 plus range 11 nibble 1 lands exactly on 16383
    let choice = search_block(&[32767i16; 16], History::new(16383, 16383), true);
    assert_eq!(choice.error, 0.0);
    assert_eq!(choice.filter(), Filter::One);
    assert_eq!(choice.range(), 11);
}

// ============================================================================
// Error Statistics
// ============================================================================

#[test]
fn test_average_excludes_terminator() {
    let pcm = sine(800, 1000.0, 9000.0);
    let out = Encoder::new().encode(&pcm).unwrap();

    assert_eq!(out.stats.blocks, 50);
    assert_eq!(out.block_count(), 51);
    let expected = out.stats.total / out.stats.blocks as f64;
    assert!((out.stats.average - expected).abs() < 1e-9);
    assert!(out.stats.min <= out.stats.average);
    assert!(out.stats.average <= out.stats.max);
}

#[test]
fn test_looping_has_no_terminator() {
    let pcm = sine(64, 500.0, 8000.0);
    let out = Encoder::new().with_loop(Some(0)).encode(&pcm).unwrap();
    assert_eq!(out.stats.blocks, out.block_count());
    assert_eq!(header(&out.brr, 3) & 0x03, 0x03);
    assert_eq!(out.loop_offset, Some(0));
}

// ============================================================================
// Overflow Correction
// ============================================================================

#[test]
fn test_full_scale_blocks_are_safe_after_encode() {
    let pcm = vec![-32768i16; 256];
    let out = Encoder::new().encode(&pcm).unwrap();

    // replay the decoder and check every committed block
    let mut decoder = BlockDecoder::new();
    for b in 0..out.stats.blocks {
        let history = decoder.history();
        let decoded = decoder.decode_block(&block_at(&out.brr, b));
        let risky = risky_positions(history, &decoded);
        assert!(!risky.contains(&true), "block {} can overflow", b);
    }

    // the windows were attenuated, but only slightly
    assert_ne!(out.pcm, pcm);
    assert!(out.pcm.iter().all(|&s| s > -32768 && s < -30000));
}

#[test]
fn test_positive_full_scale_dc_settles_below_risk() {
    // filter 1 settles at 16369, just under the overflow threshold
    let pcm = vec![32767i16; 128];
    let out = Encoder::new().encode(&pcm).unwrap();
    assert_eq!(out.pcm, pcm);
}

#[test]
fn test_retry_cap_is_reported() {
    let pcm = vec![-32768i16; 256];
    let err = Encoder::new().with_max_retries(0).encode(&pcm).unwrap_err();
    assert_eq!(
        err,
        BrrError::OverflowCorrectionExhausted {
            block: 0,
            attempts: 0
        }
    );

    let err = Encoder::new().with_max_retries(16).encode(&pcm).unwrap_err();
    assert_eq!(
        err,
        BrrError::OverflowCorrectionExhausted {
            block: 0,
            attempts: 16
        }
    );
}

#[test]
fn test_input_is_not_modified() {
    let pcm = vec![-32768i16; 64];
    let copy = pcm.clone();
    let out = Encoder::new().encode(&pcm).unwrap();
    assert_eq!(pcm, copy);
    assert_ne!(out.pcm, copy);
}

// ============================================================================
// Progress
// ============================================================================

#[test]
fn test_progress_runs_zero_to_hundred() {
    let pcm = sine(SAMPLES_PER_BLOCK * 300, 440.0, 8000.0);
    let mut seen = Vec::new();
    Encoder::new()
        .encode_with_progress(&pcm, &mut |p: u8| seen.push(p))
        .unwrap();

    assert_eq!(seen.first(), Some(&0));
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(seen.len(), 101);
}

#[test]
fn test_progress_on_empty_input() {
    let mut seen = Vec::new();
    Encoder::new()
        .encode_with_progress(&[], &mut |p: u8| seen.push(p))
        .unwrap();
    assert_eq!(seen, vec![0, 100]);
}

// ============================================================================
// Pitch
// ============================================================================

#[test]
fn test_pitch_step_from_sample_rate() {
    let out = Encoder::new().with_sample_rate(16000).encode(&[0; 16]).unwrap();
    assert_eq!(out.pitch_step, 0x0800);

    let out = Encoder::new()
        .with_sample_rate(16000)
        .with_pitch_step(0x1234)
        .encode(&[0; 16])
        .unwrap();
    assert_eq!(out.pitch_step, 0x1234);
}
