pub mod align;
pub mod decoder;
pub mod encoder;
pub mod overflow;
pub mod progress;
pub mod search;
pub mod stats;

pub use align::{align_for_encoding, pad_to_block};
pub use decoder::{playback_rate, reconstruct, BlockDecoder, DecodeOptions, DecodedSample, Decoder};
pub use encoder::{
    encode_block, pitch_step_for_rate, EncodeOptions, EncodedSample, Encoder,
    DEFAULT_MAX_OVERFLOW_RETRIES,
};
pub use overflow::{risky_positions, OverflowCorrector};
pub use progress::{NoProgress, Progress};
pub use search::{encode_with, search_block, BlockChoice};
pub use stats::ErrorStats;
