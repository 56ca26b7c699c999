//! Scalar quantization of floats in `[-1, 1]` to a single byte.

/// Quantize a float (clamped to `[-1, 1]`) to a byte:
/// `round((clamp(x, -1, 1) + 1) * 127.5)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quantize(x: f32) -> u8 {
    let clamped = x.clamp(-1.0, 1.0);
    ((clamped + 1.0) * 127.5).round() as u8
}

/// Inverse of [`quantize`]: map a byte back into `[-1, 1]`.
#[must_use]
pub fn dequantize(b: u8) -> f32 {
    (f32::from(b) / 127.5) - 1.0
}

/// Quantize a whole vector.
#[must_use]
pub fn quantize_vec(v: &[f32]) -> Vec<u8> {
    v.iter().copied().map(quantize).collect()
}

/// Dequantize a whole vector.
#[must_use]
pub fn dequantize_vec(v: &[u8]) -> Vec<f32> {
    v.iter().copied().map(dequantize).collect()
}
