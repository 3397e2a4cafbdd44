//! Fixed-point prediction filters shared by the decoder and the encoder's
//! decode simulation.
//!
//! The S-DSP accumulates `residual + prediction` in 17 bits, saturates
//! filters 2 and 3 to 16 bits, then drops bit 15 and sign-extends the
//! remaining 15 bits. That last wrap is what produces the characteristic
//! "BRR noise" on clipped material, so every step here must match the
//! hardware exactly.

use super::types::Filter;

/// clamp `value` to a signed `bits`-wide range
#[inline]
pub fn clamp_bits(value: i32, bits: u32) -> i32 {
    let low = -1i32 << (bits - 1);
    let high = (1i32 << (bits - 1)) - 1;
    value.clamp(low, high)
}

/// 16-bit value to 15 bits, sign-extended back to full width
#[inline]
pub fn wrap15(value: i32) -> i32 {
    (((value << 1) as i16) >> 1) as i32
}

impl Filter {
    /// predicted contribution from the two previous 15-bit samples
    ///
    /// `prev1` is the most recent sample, `prev2` the one before it.
    #[inline]
    pub fn predict(self, prev1: i32, prev2: i32) -> i32 {
        match self {
            Filter::Zero => 0,
            // 16/16 - 1/16
            Filter::One => prev1 + ((-prev1) >> 4),
            // 64/32 - 3/32 - 16/16 + 1/16
            Filter::Two => {
                (prev1 << 1) + ((-(prev1 + (prev1 << 1))) >> 5) - prev2 + (prev2 >> 4)
            }
            // 128/64 - 13/64 - 16/16 + 3/16
            Filter::Three => {
                (prev1 << 1) + ((-(prev1 + (prev1 << 2) + (prev1 << 3))) >> 6) - prev2
                    + ((prev2 + (prev2 << 1)) >> 4)
            }
        }
    }

    /// add a dequantized residual to `predicted` and apply clamp + wrap
    #[inline]
    pub fn accumulate(self, residual: i32, predicted: i32) -> i32 {
        let sum = residual + predicted;
        // filters 0 and 1 cannot leave 16 bits
        let sum = if self.saturates() {
            clamp_bits(sum, 16)
        } else {
            sum
        };
        wrap15(sum)
    }

    /// full reconstruction step used by both decode paths
    #[inline]
    pub fn reconstruct(self, residual: i32, prev1: i32, prev2: i32) -> i32 {
        self.accumulate(residual, self.predict(prev1, prev2))
    }
}

/// the two most recent reconstructed samples of a decode or encode pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct History {
    /// most recent sample
    pub prev1: i32,
    /// sample before `prev1`
    pub prev2: i32,
}

impl History {
    pub fn new(prev1: i32, prev2: i32) -> Self {
        History { prev1, prev2 }
    }

    #[inline]
    pub fn push(&mut self, sample: i32) {
        self.prev2 = self.prev1;
        self.prev1 = sample;
    }

    /// reconstruct one sample with `filter` and shift it into the history
    #[inline]
    pub fn step(&mut self, filter: Filter, residual: i32) -> i32 {
        let sample = filter.reconstruct(residual, self.prev1, self.prev2);
        self.push(sample);
        sample
    }
}

/// nibble to its dequantized residual for `range`
///
/// ranges 13-15 keep only the sign: the result is 0 or -2048.
#[inline]
pub fn dequantize(nibble: i8, range: u8) -> i32 {
    let s = nibble as i32;
    if range > 12 {
        s & !0x07FF
    } else {
        (s << range) >> 1
    }
}
