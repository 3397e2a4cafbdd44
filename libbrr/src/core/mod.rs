pub mod audio_constants;
pub mod filter;
pub mod gauss;
pub mod types;

pub use audio_constants::*;
pub use filter::{clamp_bits, dequantize, wrap15, History};
pub use gauss::{overflow_risk, GaussianInterpolator, GAUSS_TABLE, OVERFLOW_PHASES};
pub use types::*;
