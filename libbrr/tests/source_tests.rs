use libbrr::source::{prepare, resample_loop, MAX_UNROLL_SAMPLES};
use libbrr::{BrrError, BrrSource, LoopMode, SampleData};

fn ramp(len: usize) -> Vec<i16> {
    (0..len).map(|i| ((i * 37) % 4000) as i16 - 2000).collect()
}

// ============================================================================
// Sample Data
// ============================================================================

#[test]
fn test_8bit_upsample() {
    let sample = SampleData::from_le_bytes(8, &[0x7F, 0x80, 0x00]).unwrap();
    assert_eq!(sample, SampleData::Pcm8(vec![127, -128, 0]));
    assert_eq!(sample.to_pcm16(), vec![32511, -32767, 0]);
}

#[test]
fn test_16bit_little_endian() {
    let sample = SampleData::from_le_bytes(16, &[0x34, 0x12, 0xFF, 0x7F, 0x01]).unwrap();
    assert_eq!(sample, SampleData::Pcm16(vec![0x1234, 0x7FFF]));
    assert_eq!(sample.len(), 2);
}

#[test]
fn test_unsupported_depth() {
    assert_eq!(
        SampleData::from_le_bytes(24, &[0; 6]),
        Err(BrrError::UnsupportedBitDepth(24))
    );
}

// ============================================================================
// Loop Preparation
// ============================================================================

#[test]
fn test_no_loop_passes_through() {
    let pcm = ramp(100);
    let prepared = prepare(&SampleData::Pcm16(pcm.clone()), LoopMode::Off).unwrap();
    assert_eq!(prepared.pcm, pcm);
    assert_eq!(prepared.loop_start, None);
    assert_eq!(prepared.tuning_factor, 1.0);
}

#[test]
fn test_forward_loop_drops_tail() {
    let pcm = ramp(100);
    let prepared = prepare(
        &SampleData::Pcm16(pcm.clone()),
        LoopMode::Forward { start: 10, end: 50 },
    )
    .unwrap();
    assert_eq!(prepared.pcm, &pcm[..50]);
    assert_eq!(prepared.loop_start, Some(10));
    assert_eq!(prepared.tuning_factor, 1.0);
}

#[test]
fn test_ping_pong_unrolls_reversed() {
    let sample = SampleData::Pcm16(vec![1, 2, 3, 4, 5]);
    let prepared = prepare(&sample, LoopMode::PingPong { start: 1, end: 4 }).unwrap();
    assert_eq!(prepared.pcm, vec![1, 2, 3, 4, 4, 3, 2]);
    assert_eq!(prepared.loop_start, Some(1));
}

#[test]
fn test_invalid_loops() {
    let sample = SampleData::Pcm16(ramp(10));
    assert_eq!(
        prepare(&sample, LoopMode::Forward { start: 5, end: 5 }),
        Err(BrrError::InvalidLoop {
            start: 5,
            end: 5,
            len: 10
        })
    );
    assert!(prepare(&sample, LoopMode::PingPong { start: 2, end: 11 }).is_err());
}

#[test]
fn test_short_unaligned_loop_left_to_codec() {
    // 200 samples align after one repeat
    let sample = SampleData::Pcm16(ramp(300));
    let prepared = prepare(&sample, LoopMode::Forward { start: 100, end: 300 }).unwrap();
    assert_eq!(prepared.pcm.len(), 300);
    assert_eq!(prepared.tuning_factor, 1.0);
}

#[test]
fn test_long_unaligned_loop_is_resampled() {
    // 1000 samples would need 2000 to align, which hits the limit
    assert_eq!(MAX_UNROLL_SAMPLES, 2000);
    let sample = SampleData::Pcm16(ramp(1000));
    let prepared = prepare(&sample, LoopMode::Forward { start: 0, end: 1000 }).unwrap();

    assert_eq!(prepared.pcm.len(), 1008);
    assert_eq!(prepared.loop_start, Some(0));
    assert!((prepared.tuning_factor - 1000.0 / 1008.0).abs() < 1e-12);
}

#[test]
fn test_resample_loop_aligns_loop() {
    let data = ramp(2999);
    let (out, start, tuning) = resample_loop(&data, 1000, 1);

    assert_eq!(out.len(), 3001);
    assert_eq!(start, 1001);
    assert_eq!((out.len() - start) % 16, 0);
    assert!((tuning - 1999.0 / 2000.0).abs() < 1e-12);
    // the first sample is never interpolated
    assert_eq!(out[0], data[0]);
}

// ============================================================================
// Sources
// ============================================================================

#[test]
fn test_one_shot_source() {
    let source = BrrSource::from_sample(&SampleData::Pcm16(ramp(100)), LoopMode::Off).unwrap();

    // 7 content blocks and the silent terminator
    assert_eq!(source.data.len(), 72);
    assert_eq!(source.loop_offset, 0);
    assert_eq!(source.tuning_factor, 1.0);
    assert_eq!(source.hash, blake3::hash(&source.data).to_hex().to_string());
    assert_eq!(source.hash.len(), 64);
}

#[test]
fn test_looping_source_offset() {
    let sample = SampleData::Pcm16(ramp(64));
    let source = BrrSource::from_sample(&sample, LoopMode::Forward { start: 16, end: 48 }).unwrap();

    assert_eq!(source.data.len(), 27);
    assert_eq!(source.loop_offset, 9);
    assert_eq!(source.data[18] & 0x03, 0x03);
}

#[test]
fn test_identical_samples_share_hash() {
    let a = BrrSource::from_sample(&SampleData::Pcm16(ramp(64)), LoopMode::Off).unwrap();
    let b = BrrSource::from_sample(&SampleData::Pcm16(ramp(64)), LoopMode::Off).unwrap();
    let c = BrrSource::from_sample(&SampleData::Pcm16(ramp(80)), LoopMode::Off).unwrap();
    assert_eq!(a.hash, b.hash);
    assert_ne!(a.hash, c.hash);
}

#[test]
fn test_empty_sample_gives_empty_source() {
    let source = BrrSource::from_sample(&SampleData::Pcm8(Vec::new()), LoopMode::Off).unwrap();
    assert!(source.is_empty());
    assert!(source.hash.is_empty());
}

#[test]
fn test_source_msgpack() {
    let sample = SampleData::Pcm8(vec![10, -20, 30, -40, 50]);
    let source = BrrSource::from_sample(&sample, LoopMode::Forward { start: 0, end: 5 }).unwrap();
    let bytes = source.to_msgpack().unwrap();
    assert_eq!(BrrSource::from_msgpack(&bytes).unwrap(), source);

    assert!(matches!(
        BrrSource::from_msgpack(&[0xC1]),
        Err(BrrError::Serialization(_))
    ));
}
