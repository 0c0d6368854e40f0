//! ABC stereo mixer
//!
//! Channel A sits on the left, B in the centre and C on the right, with a
//! fixed amount of crosstalk to the opposite side.

use log::debug;

use crate::engine::buffer::{Channel, StereoSignal};

/// Per-channel `(left, right)` gains, indexed by [`Channel::index`]
pub const PAN_MATRIX: [(f64, f64); 3] = [
    (1.0, 0.333),   // A
    (0.666, 0.666), // B
    (0.333, 1.0),   // C
];

/// Left and right gain of one channel
pub fn pan_gains(channel: Channel) -> (f64, f64) {
    PAN_MATRIX[channel.index()]
}

/// Mix three resampled channels into a stereo signal
///
/// The result is as long as the shortest input. No normalization is
/// applied, so peaks can exceed the input range.
pub fn mix(channels: &[Vec<f64>; 3]) -> StereoSignal {
    let lengths = [channels[0].len(), channels[1].len(), channels[2].len()];
    let frames = lengths.iter().copied().min().unwrap_or(0);

    if lengths.iter().any(|&len| len != frames) {
        debug!(
            "Resampled channel lengths differ (A={}, B={}, C={}), truncating to {}",
            lengths[0], lengths[1], lengths[2], frames
        );
    }

    let (a_l, a_r) = pan_gains(Channel::A);
    let (b_l, b_r) = pan_gains(Channel::B);
    let (c_l, c_r) = pan_gains(Channel::C);

    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);

    for ((&a, &b), &c) in channels[0]
        .iter()
        .zip(channels[1].iter())
        .zip(channels[2].iter())
    {
        left.push(a * a_l + b * b_l + c * c_l);
        right.push(a * a_r + b * b_r + c * c_r);
    }

    StereoSignal { left, right }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_channel_a_is_panned_left() {
        let signal = mix(&[vec![1.0], vec![0.0], vec![0.0]]);
        assert_eq!(signal.left, vec![1.0]);
        assert_eq!(signal.right, vec![0.333]);
    }

    #[test]
    fn test_channel_b_is_centred() {
        let signal = mix(&[vec![0.0, 0.0], vec![2.0, -1.0], vec![0.0, 0.0]]);
        assert_eq!(signal.left, signal.right);
        assert_relative_eq!(signal.left[0], 1.332, max_relative = 1e-12);
        assert_relative_eq!(signal.left[1], -0.666);
    }

    #[test]
    fn test_channel_c_is_panned_right() {
        let signal = mix(&[vec![0.0], vec![0.0], vec![3.0]]);
        assert_relative_eq!(signal.left[0], 0.999, max_relative = 1e-12);
        assert_relative_eq!(signal.right[0], 3.0);
    }

    #[test]
    fn test_mix_is_linear_sum() {
        let signal = mix(&[vec![100.0], vec![200.0], vec![300.0]]);
        assert_relative_eq!(signal.left[0], 100.0 + 133.2 + 99.9, max_relative = 1e-12);
        assert_relative_eq!(signal.right[0], 33.3 + 133.2 + 300.0, max_relative = 1e-12);
    }

    #[test]
    fn test_truncates_to_shortest() {
        let signal = mix(&[vec![1.0; 10], vec![1.0; 7], vec![1.0; 12]]);
        assert_eq!(signal.num_frames(), 7);
        assert_eq!(signal.right.len(), 7);
    }

    #[test]
    fn test_empty_channel_gives_empty_mix() {
        let signal = mix(&[vec![1.0; 4], Vec::new(), vec![1.0; 4]]);
        assert!(signal.is_empty());
    }

    #[test]
    fn test_pan_matrix_symmetry() {
        let (a_l, a_r) = pan_gains(Channel::A);
        let (c_l, c_r) = pan_gains(Channel::C);
        assert_eq!((a_l, a_r), (c_r, c_l));
    }
}
