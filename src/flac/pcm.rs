//! Float to 16-bit PCM conversion

use crate::engine::buffer::StereoSignal;

/// Full scale of a signed 16-bit sample
pub const PCM16_SCALE: f64 = 32767.0;

/// Quantize one sample in `[-1.0, 1.0]` to signed 16-bit, clamping overshoot
#[inline]
pub fn quantize_sample(sample: f64) -> i16 {
    (sample.clamp(-1.0, 1.0) * PCM16_SCALE).round() as i16
}

/// Quantize both channels of a signal
pub fn quantize_stereo(signal: &StereoSignal) -> (Vec<i16>, Vec<i16>) {
    let left = signal.left.iter().map(|&s| quantize_sample(s)).collect();
    let right = signal.right.iter().map(|&s| quantize_sample(s)).collect();
    (left, right)
}

/// Interleaved little-endian bytes `[L0, R0, L1, R1, ...]`
pub fn interleaved_le_bytes(left: &[i16], right: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((left.len() + right.len()) * 2);
    for (l, r) in left.iter().zip(right.iter()) {
        bytes.extend_from_slice(&l.to_le_bytes());
        bytes.extend_from_slice(&r.to_le_bytes());
    }
    bytes
}
