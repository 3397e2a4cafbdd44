//! Guard against gaussian sign inversion on playback.
//!
//! Three interpolation phases weight their first three taps by 2049/2048.
//! A block whose reconstructed samples sit close enough to full scale can
//! then overflow the 15-bit accumulator and click. Such a block is not
//! committed; the source window is attenuated a little around the risky
//! positions and searched again.

use crate::core::{gauss, History, SAMPLES_PER_BLOCK};

/// attenuation applied to every sample on the first retry
pub const BASE_ADJUST_RATE: f64 = 0.0004;

/// growth of the base rate after each failed attempt
const RATE_GROWTH: f64 = 1.1;

/// extra attenuation injected at a risky position
const PEAK_CORRECTION: f64 = 0.05;

/// falloff of the injected attenuation per position
const CORRECTION_DECAY: f64 = 0.1;

/// positions of `decoded` whose taps could overflow the interpolator
///
/// Position `n` is tested with the samples at `n - 2`, `n - 1` and `n` as
/// the three oldest taps, so the first two positions reach back into the
/// previous block through `history`.
pub fn risky_positions(
    history: History,
    decoded: &[i32; SAMPLES_PER_BLOCK],
) -> [bool; SAMPLES_PER_BLOCK] {
    let mut samples = [0i32; SAMPLES_PER_BLOCK + 2];
    samples[0] = history.prev2;
    samples[1] = history.prev1;
    samples[2..].copy_from_slice(decoded);

    let mut risky = [false; SAMPLES_PER_BLOCK];
    for (n, flag) in risky.iter_mut().enumerate() {
        *flag = gauss::overflow_risk(&[samples[n], samples[n + 1], samples[n + 2]]);
    }
    risky
}

/// per-sample attenuation for one retry
///
/// Every position starts at `rate`. Each risky position multiplies itself
/// by 1.05 and its neighbours by a factor decaying tenfold per step.
pub fn attenuation_factors(
    risky: &[bool; SAMPLES_PER_BLOCK],
    rate: f64,
) -> [f64; SAMPLES_PER_BLOCK] {
    let mut factors = [rate; SAMPLES_PER_BLOCK];

    for n in (0..SAMPLES_PER_BLOCK).filter(|&n| risky[n]) {
        let mut t = PEAK_CORRECTION;
        for f in factors[..=n].iter_mut().rev() {
            *f *= 1.0 + t;
            t *= CORRECTION_DECAY;
        }

        let mut t = PEAK_CORRECTION * CORRECTION_DECAY;
        for f in factors[n + 1..].iter_mut() {
            *f *= 1.0 + t;
            t *= CORRECTION_DECAY;
        }
    }

    factors
}

/// retry state for the window currently being encoded
#[derive(Debug, Clone)]
pub struct OverflowCorrector {
    rate: f64,
    attempts: u32,
}

impl OverflowCorrector {
    pub fn new() -> Self {
        OverflowCorrector {
            rate: BASE_ADJUST_RATE,
            attempts: 0,
        }
    }

    /// failed attempts on the current window
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// quiet `window` around the risky positions before the next search
    pub fn correct(&mut self, window: &mut [i16], risky: &[bool; SAMPLES_PER_BLOCK]) {
        let factors = attenuation_factors(risky, self.rate);
        for (sample, f) in window.iter_mut().zip(factors) {
            *sample = (*sample as f64 * (1.0 - f)) as i16;
        }
        self.rate *= RATE_GROWTH;
        self.attempts += 1;
    }

    /// window committed; start over for the next one
    pub fn reset(&mut self) {
        self.rate = BASE_ADJUST_RATE;
        self.attempts = 0;
    }
}

impl Default for OverflowCorrector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_block_is_safe() {
        let decoded = [8000; SAMPLES_PER_BLOCK];
        let risky = risky_positions(History::new(8000, 8000), &decoded);
        assert!(risky.iter().all(|&r| !r));
    }

    #[test]
    fn history_feeds_first_positions() {
        let mut decoded = [0; SAMPLES_PER_BLOCK];
        decoded[0] = 0x3FFF;
        let hot = risky_positions(History::new(0x3FFF, 0x3FFF), &decoded);
        assert!(hot[0]);
        assert!(!hot[1]);
        let cold = risky_positions(History::default(), &decoded);
        assert!(!cold[0]);
    }

    #[test]
    fn factors_decay_around_risky_position() {
        let mut risky = [false; SAMPLES_PER_BLOCK];
        risky[4] = true;
        let f = attenuation_factors(&risky, 1.0);
        assert!((f[4] - 1.05).abs() < 1e-12);
        assert!((f[3] - 1.005).abs() < 1e-12);
        assert!((f[5] - 1.005).abs() < 1e-12);
        assert!((f[2] - 1.0005).abs() < 1e-12);
        assert!(f[15] > 1.0 && f[15] < 1.0 + 1e-12);
        assert_eq!(f.iter().cloned().fold(0.0, f64::max), f[4]);
    }

    #[test]
    fn rate_grows_then_resets() {
        let mut corrector = OverflowCorrector::new();
        let mut window = [20000i16; SAMPLES_PER_BLOCK];
        let risky = [true; SAMPLES_PER_BLOCK];
        corrector.correct(&mut window, &risky);
        corrector.correct(&mut window, &risky);
        assert_eq!(corrector.attempts(), 2);
        assert!((corrector.rate() - BASE_ADJUST_RATE * 1.21).abs() < 1e-12);
        assert!(window.iter().all(|&s| s < 20000));
        corrector.reset();
        assert_eq!(corrector.attempts(), 0);
        assert_eq!(corrector.rate(), BASE_ADJUST_RATE);
    }
}
