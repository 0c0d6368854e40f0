//! Peak normalization

use crate::engine::buffer::StereoSignal;

/// Largest magnitude over both channels, from the extreme values
fn abs_max(signal: &StereoSignal) -> f64 {
    let (min, max) = signal
        .left
        .iter()
        .chain(signal.right.iter())
        .fold((0.0_f64, 0.0_f64), |(lo, hi), &s| (lo.min(s), hi.max(s)));

    max.abs().max(min.abs())
}

/// Scale the signal so its largest magnitude becomes exactly 1.0
///
/// Both channels share one gain, preserving the stereo balance. A silent
/// signal is left unchanged.
///
/// # Returns
/// The peak magnitude found before scaling
pub fn normalize_peak(signal: &mut StereoSignal) -> f64 {
    let peak = abs_max(signal);
    if peak == 0.0 {
        return peak;
    }

    let gain = 1.0 / peak;
    for sample in signal.left.iter_mut().chain(signal.right.iter_mut()) {
        *sample *= gain;
    }

    peak
}
