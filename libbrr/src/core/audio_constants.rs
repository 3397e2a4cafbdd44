/// Maximum positive value for 16-bit signed integer (2^15 - 1)
pub const I16_MAX_F32: f32 = 32767.0;

/// Minimum value for 16-bit signed integer (-2^15)
pub const I16_MIN_F32: f32 = -32768.0;

/// Inverse of I16_MIN_F32 absolute value, used for int→float (1/32768)
pub const I16_TO_F32_SCALE: f32 = 1.0 / 32768.0;

/// Convert f32 sample (-1.0 to 1.0) to i16
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample * I16_MAX_F32).clamp(I16_MIN_F32, I16_MAX_F32) as i16
}

/// Convert i16 sample to f32
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 * I16_TO_F32_SCALE
}

/// Upsample a signed 8-bit sample to 16 bits (127 maps to 32511, -128 to -32767)
#[inline]
pub fn i8_to_i16(sample: i8) -> i16 {
    ((sample as i32 * 32767) / 128) as i16
}
