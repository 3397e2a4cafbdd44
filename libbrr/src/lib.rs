#![allow(clippy::needless_range_loop)]

use wasm_bindgen::prelude::*;

pub mod codec;
pub mod core;
pub mod source;

mod reader;
mod writer;

pub use codec::{
    BlockDecoder, DecodeOptions, DecodedSample, Decoder, EncodeOptions, EncodedSample, Encoder,
    ErrorStats, NoProgress, Progress,
};
pub use core::{
    BlockHeader, BrrBlock, BrrError, BrrResult, Filter, GaussianInterpolator, History,
    BYTES_PER_BLOCK, DSP_SAMPLE_RATE, SAMPLES_PER_BLOCK, UNITY_PITCH,
};
pub use reader::{validate as validate_stream, BrrStream, Reader, StreamInfo};
pub use source::{BrrSource, LoopMode, SampleData};
pub use writer::Writer;

// info for the info() function

/// info about a brr stream
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct BrrInfo {
    /// Stream size in bytes (after padding)
    pub size: usize,
    /// Number of 9-byte blocks
    pub blocks: usize,
    /// Samples decoded up to the end block
    pub samples: usize,
    /// Index of the end block, -1 if missing
    pub end_block: i64,
    /// End block also has the loop flag
    pub looping: bool,
    /// Duration in seconds at the given pitch step
    pub duration_secs: f64,
    /// Compression ratio against 16-bit pcm
    pub compression_ratio: f64,
}

// result helpers

/// turn an error into js
fn to_js_err(e: BrrError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// api functions

/// install a panic hook that logs to the browser console
#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// encode 16-bit mono pcm to brr
///
/// # Arguments
/// * `samples` - Mono 16-bit pcm
/// * `sample_rate` - Input sample rate in Hz (sets the pitch step)
/// * `loop_start` - Optional loop start in samples
///
/// # Returns
/// brr bytes, always at least one 9-byte block
#[wasm_bindgen]
pub fn encode(
    samples: &[i16],
    sample_rate: u32,
    loop_start: Option<u32>,
) -> Result<Vec<u8>, JsValue> {
    let encoder = Encoder::new()
        .with_sample_rate(sample_rate)
        .with_loop(loop_start.map(|s| s as usize));
    encoder
        .encode(samples)
        .map(|encoded| encoded.brr)
        .map_err(to_js_err)
}

/// encode and return the full result as a js object
///
/// The object has `brr`, `loop_offset`, `pcm`, `stats` and `pitch_step`.
#[wasm_bindgen]
pub fn encode_sample(
    samples: &[i16],
    sample_rate: u32,
    loop_start: Option<u32>,
) -> Result<JsValue, JsValue> {
    let encoded = Encoder::new()
        .with_sample_rate(sample_rate)
        .with_loop(loop_start.map(|s| s as usize))
        .encode(samples)
        .map_err(to_js_err)?;
    serde_wasm_bindgen::to_value(&encoded)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// decode brr to 16-bit pcm
///
/// # Arguments
/// * `data` - brr bytes (zero-padded to whole blocks)
/// * `gaussian` - resample through the S-DSP gaussian filter
/// * `pitch_step` - 4.12 playback step, 0x1000 = unity
///
/// # Returns
/// 16-bit pcm. Without gaussian it plays at `pitch_step * 32000 / 0x1000`
/// Hz, with gaussian at 32000 Hz.
#[wasm_bindgen]
pub fn decode(data: &[u8], gaussian: bool, pitch_step: Option<u16>) -> Vec<i16> {
    Decoder::new()
        .with_gaussian(gaussian)
        .with_pitch_step(pitch_step.unwrap_or(UNITY_PITCH))
        .decode(data)
        .samples
}

/// check the end/loop structure of a brr stream
///
/// # Returns
/// true if the stream is block aligned and only its last block ends it
#[wasm_bindgen]
pub fn validate(data: &[u8], loop_offset: Option<u32>) -> bool {
    validate_stream(data, loop_offset.map(|o| o as usize)).is_ok()
}

/// Get information about a brr stream
///
/// # Arguments
/// * `data` - brr bytes
/// * `pitch_step` - playback step used for the duration, default unity
#[wasm_bindgen]
pub fn info(data: &[u8], pitch_step: Option<u16>) -> BrrInfo {
    let stream = Reader::new().read(data);
    let info = stream.info();

    BrrInfo {
        size: info.size,
        blocks: info.blocks,
        samples: info.samples,
        end_block: info.end_block.map_or(-1, |b| b as i64),
        looping: info.looping,
        duration_secs: info.duration_secs(pitch_step.unwrap_or(UNITY_PITCH)),
        compression_ratio: info.compression_ratio(),
    }
}

/// build a soundbank source from raw tracker sample bytes
///
/// # Arguments
/// * `bytes` - little-endian pcm
/// * `bits` - 8 or 16
/// * `loop_start`, `loop_end` - loop region in samples, both or neither
/// * `ping_pong` - unroll the loop as a ping-pong loop
///
/// # Returns
/// the source as MessagePack bytes
#[wasm_bindgen]
pub fn create_source(
    bytes: &[u8],
    bits: u8,
    loop_start: Option<u32>,
    loop_end: Option<u32>,
    ping_pong: bool,
) -> Result<Vec<u8>, JsValue> {
    let sample = SampleData::from_le_bytes(bits, bytes).map_err(to_js_err)?;
    let loop_mode = match (loop_start, loop_end) {
        (Some(start), Some(end)) => {
            let (start, end) = (start as usize, end as usize);
            if ping_pong {
                LoopMode::PingPong { start, end }
            } else {
                LoopMode::Forward { start, end }
            }
        }
        _ => LoopMode::Off,
    };

    BrrSource::from_sample(&sample, loop_mode)
        .and_then(|source| source.to_msgpack())
        .map_err(to_js_err)
}

/// get lib version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
